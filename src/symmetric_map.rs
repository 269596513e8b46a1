use fnv::FnvHashMap;

/// A map keyed by unordered index pairs: `(i, j)` and `(j, i)` address the same value.
#[derive(Clone, Debug)]
pub struct SymmetricMap<T> {
    map: FnvHashMap<(usize, usize), T>,
}

impl<T> Default for SymmetricMap<T> {
    fn default() -> Self {
        SymmetricMap::new()
    }
}

impl<T> SymmetricMap<T> {
    pub fn new() -> Self {
        SymmetricMap {
            map: FnvHashMap::default(),
        }
    }

    fn order_indices(i1: usize, i2: usize) -> (usize, usize) {
        if i1 > i2 {
            (i2, i1)
        } else {
            (i1, i2)
        }
    }

    pub fn get(&self, i1: usize, i2: usize) -> Option<&T> {
        self.map.get(&Self::order_indices(i1, i2))
    }

    pub fn contains(&self, i1: usize, i2: usize) -> bool {
        self.map.contains_key(&Self::order_indices(i1, i2))
    }

    pub fn insert(&mut self, i1: usize, i2: usize, value: T) -> Option<T> {
        self.map.insert(Self::order_indices(i1, i2), value)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_order_is_irrelevant() {
        let mut map = SymmetricMap::new();
        assert_eq!(map.insert(3, 1, "a"), None);
        assert_eq!(map.get(1, 3), Some(&"a"));
        assert!(map.contains(3, 1));
        assert_eq!(map.insert(1, 3, "b"), Some("a"));
        assert_eq!(map.len(), 1);
    }
}
