//! Assigning semantic roles to selected rooms.

use crate::{
    error::{invalid_config, Result},
    room::{Room, RoomType},
    spawn::SpawnRule,
};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RoomTypeSetting {
    pub room_type: RoomType,
    pub weight: f32,
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
    pub is_mandatory: bool,
    /// Chance that a room of this type uses a fixed template.
    pub is_fixed_probability: f64,
    pub enemies: Option<SpawnRule>,
    pub npcs: Option<SpawnRule>,
    pub special_objects: Option<SpawnRule>,
}

impl Default for RoomTypeSetting {
    fn default() -> Self {
        RoomTypeSetting {
            room_type: RoomType::Standard,
            weight: 1.0,
            min_count: None,
            max_count: None,
            is_mandatory: false,
            is_fixed_probability: 0.0,
            enemies: None,
            npcs: None,
            special_objects: None,
        }
    }
}

impl RoomTypeSetting {
    pub fn new(room_type: RoomType, weight: f32) -> Self {
        RoomTypeSetting {
            room_type,
            weight,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.weight >= 0.0) {
            return Err(invalid_config(format!(
                "{:?} weight must be non-negative, got {}",
                self.room_type, self.weight
            )));
        }
        if !(0.0..=1.0).contains(&self.is_fixed_probability) {
            return Err(invalid_config(format!(
                "{:?} is_fixed_probability must lie in [0, 1], got {}",
                self.room_type, self.is_fixed_probability
            )));
        }
        if let (Some(min), Some(max)) = (self.min_count, self.max_count) {
            if min > max {
                return Err(invalid_config(format!(
                    "{:?} min_count {} exceeds max_count {}",
                    self.room_type, min, max
                )));
            }
        }

        Ok(())
    }
}

pub fn setting_for(settings: &[RoomTypeSetting], room_type: RoomType) -> Option<&RoomTypeSetting> {
    settings.iter().find(|s| s.room_type == room_type)
}

/// Labels every room, in this order: mandatory types, then the farthest pair of rooms as
/// Entrance and Exit, then the weighted types, then `default_type` for the rest. Finally each
/// room rolls its `is_fixed` flag from its type's setting.
///
/// Running short of rooms is not an error; the assignment proceeds with what is left.
pub fn assign(
    rooms: &mut [Room],
    settings: &[RoomTypeSetting],
    default_type: RoomType,
    rng: &mut impl Rng,
) {
    // Entrance and Exit are always placed by the farthest-pair rule.
    let is_door_type = |t: RoomType| t == RoomType::Entrance || t == RoomType::Exit;

    for setting in settings
        .iter()
        .filter(|s| s.is_mandatory && !is_door_type(s.room_type))
    {
        let wanted = setting.min_count.unwrap_or(1);
        let assigned = assign_random_empty(rooms, setting.room_type, wanted, rng);
        if assigned < wanted {
            log::warn!(
                "Mandatory {:?} wanted {} rooms, only {} available",
                setting.room_type,
                wanted,
                assigned
            );
        }
    }

    assign_entrance_and_exit(rooms);

    let weighted: Vec<&RoomTypeSetting> = settings
        .iter()
        .filter(|s| !s.is_mandatory && !is_door_type(s.room_type))
        .collect();
    let total_weight: f32 = weighted.iter().map(|s| s.weight).sum();
    let available = count_empty(rooms);
    if total_weight > 0.0 {
        for setting in weighted.iter() {
            let mut target = (setting.weight / total_weight * available as f32).round() as usize;
            if let Some(min) = setting.min_count {
                target = target.max(min);
            }
            if let Some(max) = setting.max_count {
                target = target.min(max);
            }
            let target = target.min(count_empty(rooms));
            assign_random_empty(rooms, setting.room_type, target, rng);
        }
    }

    for room in rooms.iter_mut().filter(|r| r.room_type == RoomType::Empty) {
        room.room_type = default_type;
    }

    for room in rooms.iter_mut() {
        let p = setting_for(settings, room.room_type)
            .map_or(0.0, |s| s.is_fixed_probability)
            .max(0.0)
            .min(1.0);
        room.is_fixed = rng.gen_bool(p);
    }

    log::debug!(
        "Assigned room types {:?}",
        rooms.iter().map(|r| r.room_type).collect::<Vec<_>>()
    );
}

fn count_empty(rooms: &[Room]) -> usize {
    rooms
        .iter()
        .filter(|r| r.room_type == RoomType::Empty)
        .count()
}

/// Returns how many rooms were labeled.
fn assign_random_empty(
    rooms: &mut [Room],
    room_type: RoomType,
    count: usize,
    rng: &mut impl Rng,
) -> usize {
    let mut empty: Vec<usize> = rooms
        .iter()
        .enumerate()
        .filter(|(_, r)| r.room_type == RoomType::Empty)
        .map(|(i, _)| i)
        .collect();
    empty.shuffle(rng);

    let n = count.min(empty.len());
    for i in empty.into_iter().take(n) {
        rooms[i].room_type = room_type;
    }

    n
}

/// Exhaustive search over pairs of empty rooms; the first pair found at the maximum distance
/// wins.
fn assign_entrance_and_exit(rooms: &mut [Room]) {
    let empty: Vec<usize> = rooms
        .iter()
        .enumerate()
        .filter(|(_, r)| r.room_type == RoomType::Empty)
        .map(|(i, _)| i)
        .collect();

    match empty.len() {
        0 => log::warn!("No room left for Entrance and Exit"),
        1 => {
            log::warn!("Only one room left; it becomes the Entrance and there is no Exit");
            rooms[empty[0]].room_type = RoomType::Entrance;
        }
        _ => {
            let mut best = (empty[0], empty[1]);
            let mut best_distance = -1.0;
            for (k, &i) in empty.iter().enumerate() {
                for &j in empty[k + 1..].iter() {
                    let d = rooms[i].center_distance(&rooms[j]);
                    if d > best_distance {
                        best_distance = d;
                        best = (i, j);
                    }
                }
            }
            rooms[best.0].room_type = RoomType::Entrance;
            rooms[best.1].room_type = RoomType::Exit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extent::Extent, partition::Area, sampling::small_rng};

    fn row_of_rooms(n: usize) -> Vec<Room> {
        (0..n)
            .map(|i| {
                Room::new(
                    i,
                    &Area {
                        id: i,
                        extent: Extent::new(i as i32 * 10, 0, 10, 10),
                    },
                )
            })
            .collect()
    }

    fn count(rooms: &[Room], t: RoomType) -> usize {
        rooms.iter().filter(|r| r.room_type == t).count()
    }

    #[test]
    fn test_farthest_pair_become_entrance_and_exit() {
        let mut rooms = row_of_rooms(5);
        let mut rng = small_rng(1);
        assign(&mut rooms, &[], RoomType::Standard, &mut rng);

        assert_eq!(rooms[0].room_type, RoomType::Entrance);
        assert_eq!(rooms[4].room_type, RoomType::Exit);
        assert_eq!(count(&rooms, RoomType::Standard), 3);
    }

    #[test]
    fn test_mandatory_types_come_first() {
        let mut rooms = row_of_rooms(4);
        let mut boss = RoomTypeSetting::new(RoomType::Boss, 0.0);
        boss.is_mandatory = true;
        boss.min_count = Some(2);
        let mut rng = small_rng(2);
        assign(&mut rooms, &[boss], RoomType::Standard, &mut rng);

        assert_eq!(count(&rooms, RoomType::Boss), 2);
        assert_eq!(count(&rooms, RoomType::Entrance), 1);
        assert_eq!(count(&rooms, RoomType::Exit), 1);
    }

    #[test]
    fn test_mandatory_zero_count_assigns_nothing() {
        let mut rooms = row_of_rooms(4);
        let mut boss = RoomTypeSetting::new(RoomType::Boss, 0.0);
        boss.is_mandatory = true;
        boss.min_count = Some(0);
        let mut rng = small_rng(4);
        assign(&mut rooms, &[boss.clone()], RoomType::Standard, &mut rng);
        assert_eq!(count(&rooms, RoomType::Boss), 0);

        boss.min_count = None;
        let mut rooms = row_of_rooms(4);
        assign(&mut rooms, &[boss], RoomType::Standard, &mut rng);
        assert_eq!(count(&rooms, RoomType::Boss), 1);
    }

    #[test]
    fn test_mandatory_shortage_is_not_fatal() {
        let mut rooms = row_of_rooms(2);
        let mut secret = RoomTypeSetting::new(RoomType::Secret, 0.0);
        secret.is_mandatory = true;
        secret.min_count = Some(5);
        let mut rng = small_rng(3);
        assign(&mut rooms, &[secret], RoomType::Standard, &mut rng);

        assert_eq!(count(&rooms, RoomType::Secret), 2);
        assert_eq!(count(&rooms, RoomType::Entrance), 0);
    }

    #[test]
    fn test_weighted_targets_are_clamped() {
        let mut rooms = row_of_rooms(12);
        let mut treasure = RoomTypeSetting::new(RoomType::Treasure, 3.0);
        treasure.max_count = Some(1);
        let standard = RoomTypeSetting::new(RoomType::Standard, 1.0);
        let mut rng = small_rng(4);
        assign(&mut rooms, &[treasure, standard], RoomType::Empty, &mut rng);

        // 10 rooms remain after Entrance/Exit: Treasure would take 8 but is capped at 1, then
        // Standard rounds 1/4 of 10 to 3.
        assert_eq!(count(&rooms, RoomType::Treasure), 1);
        assert_eq!(count(&rooms, RoomType::Standard), 3);
        assert_eq!(count(&rooms, RoomType::Empty), 6);
    }

    #[test]
    fn test_fixed_probability_one_marks_every_room() {
        let mut rooms = row_of_rooms(3);
        let mut standard = RoomTypeSetting::new(RoomType::Standard, 1.0);
        standard.is_fixed_probability = 1.0;
        let mut rng = small_rng(5);
        assign(&mut rooms, &[standard], RoomType::Standard, &mut rng);

        for room in rooms.iter() {
            assert_eq!(room.is_fixed, room.room_type == RoomType::Standard);
        }
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let mut setting = RoomTypeSetting::new(RoomType::Boss, 1.0);
        setting.is_fixed_probability = 1.5;
        assert!(setting.validate().is_err());
        setting.is_fixed_probability = 0.5;
        setting.weight = -1.0;
        assert!(setting.validate().is_err());
    }
}
