use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// An integer grid cell.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;

        (dx * dx + dy * dy).sqrt()
    }

    /// Orthogonal neighbors in up, down, left, right order.
    pub fn neighbors4(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y + 1),
            Point::new(self.x, self.y - 1),
            Point::new(self.x - 1, self.y),
            Point::new(self.x + 1, self.y),
        ]
    }
}

impl From<[i32; 2]> for Point {
    fn from(p: [i32; 2]) -> Self {
        Point::new(p[0], p[1])
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An axis-aligned rectangle of grid cells, `[minimum, minimum + local_supremum)`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Extent {
    minimum: Point,
    local_supremum: Point,
}

impl Extent {
    pub fn from_min_and_local_supremum(minimum: Point, local_supremum: Point) -> Self {
        Extent {
            minimum,
            local_supremum,
        }
    }

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::from_min_and_local_supremum([x, y].into(), [width, height].into())
    }

    /// The smallest extent containing all of `extents`.
    pub fn bounding<'a>(extents: impl IntoIterator<Item = &'a Extent>) -> Option<Extent> {
        let mut iter = extents.into_iter();
        let first = *iter.next()?;
        let (mut min_x, mut min_y) = (first.min_x(), first.min_y());
        let (mut max_x, mut max_y) = (first.max_x(), first.max_y());
        for e in iter {
            min_x = min_x.min(e.min_x());
            min_y = min_y.min(e.min_y());
            max_x = max_x.max(e.max_x());
            max_y = max_y.max(e.max_y());
        }

        Some(Extent::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn get_minimum(&self) -> &Point {
        &self.minimum
    }

    pub fn min_x(&self) -> i32 {
        self.minimum.x
    }

    pub fn min_y(&self) -> i32 {
        self.minimum.y
    }

    /// Exclusive.
    pub fn max_x(&self) -> i32 {
        self.minimum.x + self.local_supremum.x
    }

    /// Exclusive.
    pub fn max_y(&self) -> i32 {
        self.minimum.y + self.local_supremum.y
    }

    pub fn width(&self) -> i32 {
        self.local_supremum.x
    }

    pub fn height(&self) -> i32 {
        self.local_supremum.y
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width() as i64 * self.height() as i64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.local_supremum.x <= 0 || self.local_supremum.y <= 0
    }

    /// Integer center, rounding toward the minimum corner.
    pub fn center(&self) -> Point {
        Point::new(
            self.minimum.x + self.width() / 2,
            self.minimum.y + self.height() / 2,
        )
    }

    pub fn center_f32(&self) -> (f32, f32) {
        (
            self.minimum.x as f32 + self.width() as f32 / 2.0,
            self.minimum.y as f32 + self.height() as f32 / 2.0,
        )
    }

    /// Euclidean distance between the continuous centers of two extents.
    pub fn center_distance(&self, other: &Extent) -> f32 {
        let (ax, ay) = self.center_f32();
        let (bx, by) = other.center_f32();

        ((ax - bx) * (ax - bx) + (ay - by) * (ay - by)).sqrt()
    }

    pub fn contains_world(&self, p: &Point) -> bool {
        p.x >= self.min_x() && p.x < self.max_x() && p.y >= self.min_y() && p.y < self.max_y()
    }

    pub fn is_subset(&self, other: &Extent) -> bool {
        self.min_x() >= other.min_x()
            && self.min_y() >= other.min_y()
            && self.max_x() <= other.max_x()
            && self.max_y() <= other.max_y()
    }

    /// May be empty.
    pub fn intersection(&self, other: &Extent) -> Extent {
        let min_x = self.min_x().max(other.min_x());
        let min_y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());

        Extent::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn overlaps(&self, other: &Extent) -> bool {
        !self.intersection(other).is_empty()
    }

    /// True when the extents share a boundary with overlapping perpendicular extent.
    pub fn is_adjacent(&self, other: &Extent) -> bool {
        let touch_x = self.max_x() == other.min_x() || self.min_x() == other.max_x();
        let touch_y = self.max_y() == other.min_y() || self.min_y() == other.max_y();
        let span_x = self.min_x() < other.max_x() && self.max_x() > other.min_x();
        let span_y = self.min_y() < other.max_y() && self.max_y() > other.min_y();

        (touch_x && span_y) || (touch_y && span_x)
    }

    /// The cell where two touching or overlapping extents meet: the midpoint of the shared
    /// span on each overlapping axis, and the last cell before the boundary on a touching one.
    pub fn contact_point(&self, other: &Extent) -> Option<Point> {
        if !self.overlaps(other) && !self.is_adjacent(other) {
            return None;
        }

        fn axis(lo: i32, hi: i32) -> i32 {
            if hi > lo {
                lo + (hi - lo - 1) / 2
            } else {
                hi - 1
            }
        }

        let x = axis(
            self.min_x().max(other.min_x()),
            self.max_x().min(other.max_x()),
        );
        let y = axis(
            self.min_y().max(other.min_y()),
            self.max_y().min(other.max_y()),
        );

        Some(Point::new(x, y))
    }

    /// Row-major iteration over every cell.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let (min_x, max_x) = (self.min_x(), self.max_x());
        let (min_y, max_y) = (self.min_y(), self.max_y());

        (min_y..max_y).flat_map(move |y| (min_x..max_x).map(move |x| Point::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_extents_meet_on_shared_edge() {
        let a = Extent::new(0, 0, 5, 6);
        let b = Extent::new(5, 2, 4, 8);

        assert!(a.is_adjacent(&b));
        assert!(!a.overlaps(&b));
        assert_eq!(a.contact_point(&b), Some(Point::new(4, 3)));
    }

    #[test]
    fn test_corner_touch_is_not_adjacent() {
        let a = Extent::new(0, 0, 5, 5);
        let b = Extent::new(5, 5, 5, 5);

        assert!(!a.is_adjacent(&b));
        assert_eq!(a.contact_point(&b), None);
    }

    #[test]
    fn test_overlapping_contact_is_center_of_intersection() {
        let a = Extent::new(0, 0, 10, 10);
        let b = Extent::new(4, 4, 10, 10);

        assert_eq!(a.intersection(&b), Extent::new(4, 4, 6, 6));
        assert_eq!(a.contact_point(&b), Some(Point::new(6, 6)));
    }

    #[test]
    fn test_bounding_and_points() {
        let extents = [Extent::new(2, 3, 2, 2), Extent::new(-1, 0, 1, 1)];
        let bounds = Extent::bounding(extents.iter()).unwrap();

        assert_eq!(bounds, Extent::new(-1, 0, 5, 5));
        assert_eq!(Extent::new(0, 0, 3, 2).points().count(), 6);
        assert_eq!(
            Extent::new(1, 1, 2, 1).points().collect::<Vec<_>>(),
            vec![Point::new(1, 1), Point::new(2, 1)]
        );
    }
}
