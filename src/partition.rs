//! Recursive and uniform subdivision of the map into candidate room areas.

use crate::{
    error::{invalid_config, Result},
    extent::Extent,
    sampling::sample_inclusive,
};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A leaf rectangle of the partition; immutable once created.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Area {
    pub id: usize,
    pub extent: Extent,
}

/// Aspect ratio beyond which a BSP node is always split across its longer side.
pub const SPLIT_ASPECT_RATIO: f32 = 1.25;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BspSpec {
    pub min_leaf_size: i32,
    pub max_depth: u32,
}

impl Default for BspSpec {
    fn default() -> Self {
        BspSpec {
            min_leaf_size: 10,
            max_depth: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GridSpec {
    pub columns: i32,
    pub rows: i32,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec {
            columns: 4,
            rows: 4,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum PartitionStrategy {
    Bsp(BspSpec),
    Grid(GridSpec),
}

impl Default for PartitionStrategy {
    fn default() -> Self {
        PartitionStrategy::Bsp(BspSpec::default())
    }
}

impl PartitionStrategy {
    pub fn validate(&self) -> Result<()> {
        match self {
            PartitionStrategy::Bsp(spec) => {
                if spec.min_leaf_size < 1 {
                    return Err(invalid_config(format!(
                        "BSP min_leaf_size must be positive, got {}",
                        spec.min_leaf_size
                    )));
                }
            }
            PartitionStrategy::Grid(spec) => {
                if spec.columns < 1 || spec.rows < 1 {
                    return Err(invalid_config(format!(
                        "grid partition needs at least one row and column, got {}x{}",
                        spec.columns, spec.rows
                    )));
                }
            }
        }

        Ok(())
    }

    /// Splits `root` into leaf areas that exactly tile it.
    pub fn partition(&self, root: Extent, rng: &mut impl Rng) -> Result<Vec<Area>> {
        self.validate()?;
        if root.is_empty() {
            return Err(invalid_config(format!(
                "cannot partition an empty region {:?}",
                root
            )));
        }

        let areas = match self {
            PartitionStrategy::Bsp(spec) => {
                let mut bsp = BspPartitioner {
                    spec,
                    next_id: 1,
                    leaves: Vec::new(),
                };
                bsp.split(0, root, 0, rng);
                bsp.leaves
            }
            PartitionStrategy::Grid(spec) => grid_partition(spec, root)?,
        };
        log::debug!("Partitioned {:?} into {} areas", root, areas.len());

        Ok(areas)
    }
}

struct BspPartitioner<'a> {
    spec: &'a BspSpec,
    next_id: usize,
    leaves: Vec<Area>,
}

impl<'a> BspPartitioner<'a> {
    fn split(&mut self, id: usize, node: Extent, depth: u32, rng: &mut impl Rng) {
        let min = self.spec.min_leaf_size;
        if depth >= self.spec.max_depth || node.width() <= min || node.height() <= min {
            self.leaves.push(Area { id, extent: node });
            return;
        }

        let vertical = choose_split_axis(node.width(), node.height(), rng);
        let dimension = if vertical { node.width() } else { node.height() };
        let (min_split, max_split) = (min, dimension - min);
        if max_split <= min_split {
            // No room for two legal children.
            self.leaves.push(Area { id, extent: node });
            return;
        }

        let split = sample_inclusive(rng, min_split, max_split);
        let (x, y) = (node.min_x(), node.min_y());
        let (first, second) = if vertical {
            (
                Extent::new(x, y, split, node.height()),
                Extent::new(x + split, y, node.width() - split, node.height()),
            )
        } else {
            (
                Extent::new(x, y, node.width(), split),
                Extent::new(x, y + split, node.width(), node.height() - split),
            )
        };

        let first_id = self.next_id;
        let second_id = self.next_id + 1;
        self.next_id += 2;
        self.split(first_id, first, depth + 1, rng);
        self.split(second_id, second, depth + 1, rng);
    }
}

/// True for a vertical cut (splitting the width).
fn choose_split_axis(width: i32, height: i32, rng: &mut impl Rng) -> bool {
    let (w, h) = (width as f32, height as f32);
    if w / h >= SPLIT_ASPECT_RATIO {
        true
    } else if h / w >= SPLIT_ASPECT_RATIO {
        false
    } else {
        rng.gen_bool(0.5)
    }
}

fn grid_partition(spec: &GridSpec, root: Extent) -> Result<Vec<Area>> {
    let cell_width = root.width() / spec.columns;
    let cell_height = root.height() / spec.rows;
    if cell_width == 0 || cell_height == 0 {
        return Err(invalid_config(format!(
            "{}x{} grid does not fit in {}x{} region",
            spec.columns,
            spec.rows,
            root.width(),
            root.height()
        )));
    }
    let remainder_width = root.width() % spec.columns;
    let remainder_height = root.height() % spec.rows;

    let mut areas = Vec::with_capacity((spec.columns * spec.rows) as usize);
    for row in 0..spec.rows {
        for column in 0..spec.columns {
            let mut width = cell_width;
            let mut height = cell_height;
            if column == spec.columns - 1 {
                width += remainder_width;
            }
            if row == spec.rows - 1 {
                height += remainder_height;
            }
            areas.push(Area {
                id: areas.len(),
                extent: Extent::new(
                    root.min_x() + column * cell_width,
                    root.min_y() + row * cell_height,
                    width,
                    height,
                ),
            });
        }
    }

    Ok(areas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::small_rng;

    use proptest::prelude::*;

    /// Every cell of `root` is covered by exactly one area.
    fn assert_exact_tiling(root: Extent, areas: &[Area]) {
        let mut coverage = vec![0u8; root.area() as usize];
        for area in areas {
            assert!(area.extent.is_subset(&root), "{:?} escapes {:?}", area, root);
            for p in area.extent.points() {
                let i = ((p.y - root.min_y()) * root.width() + (p.x - root.min_x())) as usize;
                coverage[i] += 1;
            }
        }
        assert!(coverage.iter().all(|c| *c == 1));
        assert_eq!(
            areas.iter().map(|a| a.extent.area()).sum::<i64>(),
            root.area()
        );
    }

    #[test]
    fn test_bsp_20x20_min_5_depth_3() {
        let strategy = PartitionStrategy::Bsp(BspSpec {
            min_leaf_size: 5,
            max_depth: 3,
        });
        let root = Extent::new(0, 0, 20, 20);
        for seed in 0..20 {
            let areas = strategy.partition(root, &mut small_rng(seed)).unwrap();

            assert!(areas.len() >= 2 && areas.len() <= 8, "{} leaves", areas.len());
            assert_exact_tiling(root, &areas);
            for a in areas.iter() {
                assert!(a.extent.width() >= 5 && a.extent.height() >= 5);
            }
        }
    }

    #[test]
    fn test_bsp_ids_are_unique() {
        let strategy = PartitionStrategy::Bsp(BspSpec {
            min_leaf_size: 3,
            max_depth: 6,
        });
        let areas = strategy
            .partition(Extent::new(0, 0, 64, 48), &mut small_rng(9))
            .unwrap();
        let mut ids: Vec<usize> = areas.iter().map(|a| a.id).collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), areas.len());
    }

    #[test]
    fn test_grid_folds_remainder_into_last_row_and_column() {
        let strategy = PartitionStrategy::Grid(GridSpec {
            columns: 3,
            rows: 2,
        });
        let root = Extent::new(5, 7, 11, 9);
        let areas = strategy.partition(root, &mut small_rng(0)).unwrap();

        assert_eq!(areas.len(), 6);
        assert_exact_tiling(root, &areas);
        assert_eq!(areas[0].extent, Extent::new(5, 7, 3, 4));
        assert_eq!(areas[2].extent, Extent::new(11, 7, 5, 4));
        assert_eq!(areas[5].extent, Extent::new(11, 11, 5, 5));
    }

    #[test]
    fn test_grid_too_fine_is_config_error() {
        let strategy = PartitionStrategy::Grid(GridSpec {
            columns: 20,
            rows: 1,
        });
        assert!(strategy
            .partition(Extent::new(0, 0, 10, 10), &mut small_rng(0))
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_bsp_leaves_tile_root(
            width in 1i32..80,
            height in 1i32..80,
            min_leaf_size in 1i32..12,
            max_depth in 0u32..7,
            seed in any::<u64>(),
        ) {
            let strategy = PartitionStrategy::Bsp(BspSpec { min_leaf_size, max_depth });
            let root = Extent::new(3, -2, width, height);
            let areas = strategy.partition(root, &mut small_rng(seed)).unwrap();
            assert_exact_tiling(root, &areas);
        }
    }
}
