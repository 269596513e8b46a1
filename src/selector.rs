//! Choosing which partition areas become rooms.

use crate::{
    extent::Extent,
    partition::Area,
    room::Room,
    sampling::take_by_rank,
};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AreaSelectionMethod {
    /// Prefer areas close to the centroid of all areas.
    CenterFocused,
    /// Prefer areas close to the border of the partitioned region.
    EdgeFocused,
    Random,
    /// Prefer areas lying on a ring at the mean centroid distance.
    Circular,
    /// Prefer areas with an even x coordinate, in their original order.
    Linear,
}

impl Default for AreaSelectionMethod {
    fn default() -> Self {
        AreaSelectionMethod::Random
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SelectionSpec {
    pub method: AreaSelectionMethod,
    /// `None` selects every area.
    pub room_count: Option<usize>,
}

impl SelectionSpec {
    pub fn select(&self, areas: &[Area], rng: &mut impl Rng) -> Vec<Area> {
        select(areas, self.method, self.room_count, rng)
    }
}

/// Orders `areas` by the preference of `method` and draws `count` of them with rank weights
/// `1 / (r + 1)`, without replacement.
pub fn select(
    areas: &[Area],
    method: AreaSelectionMethod,
    count: Option<usize>,
    rng: &mut impl Rng,
) -> Vec<Area> {
    let count = count.unwrap_or_else(|| areas.len());
    if count > areas.len() {
        log::warn!(
            "Requested {} rooms but only {} areas exist",
            count,
            areas.len()
        );
    }

    let ordered = order_candidates(areas, method, rng);
    let selected = take_by_rank(ordered, count, rng);
    log::debug!("Selected {} of {} areas", selected.len(), areas.len());

    selected
}

fn order_candidates(areas: &[Area], method: AreaSelectionMethod, rng: &mut impl Rng) -> Vec<Area> {
    let mut ordered = areas.to_vec();
    if ordered.is_empty() {
        return ordered;
    }

    match method {
        AreaSelectionMethod::Random => ordered.shuffle(rng),
        AreaSelectionMethod::CenterFocused => {
            let centroid = centroid(areas);
            sort_by_key_f32(&mut ordered, |a| distance(a, centroid));
        }
        AreaSelectionMethod::EdgeFocused => {
            if let Some(bounds) = Extent::bounding(areas.iter().map(|a| &a.extent)) {
                sort_by_key_f32(&mut ordered, |a| border_distance(&a.extent, &bounds));
            }
        }
        AreaSelectionMethod::Circular => {
            let centroid = centroid(areas);
            let total: f32 = areas.iter().map(|a| distance(a, centroid)).sum();
            let mean = total / areas.len() as f32;
            sort_by_key_f32(&mut ordered, |a| (distance(a, centroid) - mean).abs());
        }
        AreaSelectionMethod::Linear => {
            // Stable, so ties keep partition order.
            ordered.sort_by_key(|a| a.extent.min_x().rem_euclid(2));
        }
    }

    ordered
}

fn sort_by_key_f32(areas: &mut [Area], key: impl Fn(&Area) -> f32) {
    areas.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal));
}

fn centroid(areas: &[Area]) -> (f32, f32) {
    let n = areas.len() as f32;
    let (sx, sy) = areas.iter().fold((0.0, 0.0), |(sx, sy), a| {
        let (x, y) = a.extent.center_f32();
        (sx + x, sy + y)
    });

    (sx / n, sy / n)
}

fn distance(area: &Area, (cx, cy): (f32, f32)) -> f32 {
    let (x, y) = area.extent.center_f32();

    ((x - cx) * (x - cx) + (y - cy) * (y - cy)).sqrt()
}

/// Distance from the area's center to the nearest side of `bounds`.
fn border_distance(extent: &Extent, bounds: &Extent) -> f32 {
    let (x, y) = extent.center_f32();
    let left = x - bounds.min_x() as f32;
    let right = bounds.max_x() as f32 - x;
    let bottom = y - bounds.min_y() as f32;
    let top = bounds.max_y() as f32 - y;

    left.min(right).min(bottom).min(top)
}

/// Creates bounds-only rooms with sequential ids.
pub fn to_rooms(selected: &[Area]) -> Vec<Room> {
    selected
        .iter()
        .enumerate()
        .map(|(id, area)| Room::new(id, area))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::small_rng;

    fn grid_areas(n: i32) -> Vec<Area> {
        let mut areas = Vec::new();
        for y in 0..n {
            for x in 0..n {
                areas.push(Area {
                    id: areas.len(),
                    extent: Extent::new(x * 10, y * 10, 10, 10),
                });
            }
        }

        areas
    }

    #[test]
    fn test_select_all_when_count_is_unset() {
        let areas = grid_areas(3);
        let mut rng = small_rng(1);
        let selected = select(&areas, AreaSelectionMethod::Random, None, &mut rng);

        let mut ids: Vec<usize> = selected.iter().map(|a| a.id).collect();
        ids.sort();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_select_never_exceeds_pool() {
        let areas = grid_areas(2);
        let mut rng = small_rng(2);
        let selected = select(&areas, AreaSelectionMethod::EdgeFocused, Some(10), &mut rng);

        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn test_center_focused_prefers_center() {
        let areas = grid_areas(5);
        let mut rng = small_rng(3);
        let trials = 2000;
        let mut center_hits = 0;
        for _ in 0..trials {
            let first = select(&areas, AreaSelectionMethod::CenterFocused, Some(1), &mut rng);
            if first[0].id == 12 {
                center_hits += 1;
            }
        }

        // Rank 0 of 25 draws with weight 1 / H(25) ~ 0.26, far above uniform 0.04.
        assert!(center_hits > trials / 6, "{} center hits", center_hits);
    }

    #[test]
    fn test_edge_focused_ranks_border_first() {
        let areas = grid_areas(3);
        let mut rng = small_rng(4);
        let ordered = order_candidates(&areas, AreaSelectionMethod::EdgeFocused, &mut rng);

        assert_eq!(ordered.last().map(|a| a.id), Some(4));
    }

    #[test]
    fn test_linear_puts_even_columns_first() {
        let areas: Vec<Area> = (0..4)
            .map(|i| Area {
                id: i,
                extent: Extent::new(i as i32 * 3, 0, 3, 3),
            })
            .collect();
        let mut rng = small_rng(5);
        let ordered = order_candidates(&areas, AreaSelectionMethod::Linear, &mut rng);

        // x = 0, 3, 6, 9
        let ids: Vec<usize> = ordered.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_to_rooms_assigns_sequential_ids() {
        let areas = grid_areas(2);
        let rooms = to_rooms(&areas[1..]);

        assert_eq!(rooms.iter().map(|r| r.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(rooms[0].area_id, 1);
        assert_eq!(rooms[0].extent, areas[1].extent);
    }
}
