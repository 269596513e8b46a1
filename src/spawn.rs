use crate::{
    extent::Point,
    room::{Room, SpawnDescriptor, SpawnKind, TileGrid},
    room_type::RoomTypeSetting,
};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Shuffled sweeps over the candidate tiles before giving up on a rule.
pub const MAX_SPAWN_PASSES: usize = 8;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SpawnRule {
    pub descriptor: SpawnDescriptor,
    pub count: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SpawnPlacementSpec {
    /// Acceptance chance for a tile touching a wall.
    pub near_wall_weight: f64,
    pub central_weight: f64,
}

impl Default for SpawnPlacementSpec {
    fn default() -> Self {
        SpawnPlacementSpec {
            near_wall_weight: 0.7,
            central_weight: 0.3,
        }
    }
}

impl SpawnPlacementSpec {
    /// Places the spawn descriptors of `setting` inside `room`.
    pub fn assign_spawns(&self, room: &mut Room, setting: &RoomTypeSetting, rng: &mut impl Rng) {
        let rules = [
            (SpawnKind::Enemy, setting.enemies.as_ref()),
            (SpawnKind::Npc, setting.npcs.as_ref()),
            (SpawnKind::SpecialObject, setting.special_objects.as_ref()),
        ];
        for (kind, rule) in rules.iter() {
            if let Some(rule) = rule {
                let placed = self.place(&mut room.tiles, *kind, rule, rng);
                if placed < rule.count {
                    log::warn!(
                        "Room {} fit only {} of {} {:?} spawns",
                        room.id,
                        placed,
                        rule.count,
                        kind
                    );
                }
            }
        }
    }

    fn place(
        &self,
        tiles: &mut TileGrid,
        kind: SpawnKind,
        rule: &SpawnRule,
        rng: &mut impl Rng,
    ) -> usize {
        let near_wall = self.near_wall_weight.max(0.0).min(1.0);
        let central = self.central_weight.max(0.0).min(1.0);

        let mut placed = 0;
        for _ in 0..MAX_SPAWN_PASSES {
            let mut candidates: Vec<Point> = tiles
                .iter()
                .filter(|(_, t)| t.walkable && !t.is_door() && t.spawns.is_empty())
                .map(|(p, _)| p)
                .collect();
            if candidates.is_empty() {
                break;
            }
            candidates.shuffle(rng);

            for p in candidates {
                if placed >= rule.count {
                    return placed;
                }
                let p_accept = if is_near_wall(tiles, p) {
                    near_wall
                } else {
                    central
                };
                if !rng.gen_bool(p_accept) {
                    continue;
                }
                if let Some(tile) = tiles.get_mut(p) {
                    *tile.spawns.slot_mut(kind) = Some(rule.descriptor.clone());
                    placed += 1;
                }
            }
            if placed >= rule.count {
                break;
            }
        }

        placed
    }
}

fn is_near_wall(tiles: &TileGrid, p: Point) -> bool {
    p.neighbors4().iter().any(|n| !tiles.is_walkable(*n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extent::Extent,
        partition::Area,
        room::{RoomType, Tile},
        sampling::small_rng,
    };

    fn open_room(rng: &mut impl Rng) -> Room {
        let area = Area {
            id: 0,
            extent: Extent::new(0, 0, 8, 6),
        };
        let mut room = Room::new(0, &area);
        let mut tiles = TileGrid::new(8, 6, |_| Tile::floor(rng));
        tiles.outline_with_walls(rng);
        room.set_footprint(area.extent, tiles);

        room
    }

    fn spawned(room: &Room) -> (usize, usize) {
        let enemies = room.tiles.iter().filter(|(_, t)| t.spawns.enemy.is_some()).count();
        let objects = room
            .tiles
            .iter()
            .filter(|(_, t)| t.spawns.special_object.is_some())
            .count();

        (enemies, objects)
    }

    #[test]
    fn test_spawns_fill_requested_counts_on_walkable_tiles() {
        let mut rng = small_rng(1);
        let mut room = open_room(&mut rng);
        let mut setting = RoomTypeSetting::new(RoomType::Standard, 1.0);
        setting.enemies = Some(SpawnRule {
            descriptor: "goblin".into(),
            count: 3,
        });
        setting.special_objects = Some(SpawnRule {
            descriptor: "chest".into(),
            count: 1,
        });
        SpawnPlacementSpec::default().assign_spawns(&mut room, &setting, &mut rng);

        assert_eq!(spawned(&room), (3, 1));
        for (_, tile) in room.tiles.iter() {
            if !tile.spawns.is_empty() {
                assert!(tile.walkable);
                assert!(tile.spawns.enemy.is_none() || tile.spawns.special_object.is_none());
            }
        }
    }

    #[test]
    fn test_spawns_stop_when_room_is_full() {
        let mut rng = small_rng(2);
        let mut room = open_room(&mut rng);
        let mut setting = RoomTypeSetting::new(RoomType::Standard, 1.0);
        setting.enemies = Some(SpawnRule {
            descriptor: "rat".into(),
            count: 100,
        });
        let spec = SpawnPlacementSpec {
            near_wall_weight: 1.0,
            central_weight: 1.0,
        };
        spec.assign_spawns(&mut room, &setting, &mut rng);

        // 6x4 interior.
        assert_eq!(spawned(&room).0, 24);
    }
}
