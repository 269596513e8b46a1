//! Placing entrance and exit doorways on a room's wall ring.

use crate::{
    extent::Point,
    room::{DesignCategory, Doorway, Room, TileGrid},
    sampling::take_weighted,
};

use rand::Rng;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DoorKind {
    Entrance,
    Exit,
}

/// Draws `entrance_count` entrances and `exit_count` exits from the weighted candidate wall
/// tiles. Every drawn position leaves the pool, and positions that are off the perimeter or
/// already a doorway are skipped. Without candidates, every perimeter tile is equally likely.
pub fn assign_entrances_and_exits(
    room: &mut Room,
    entrance_weights: Vec<(Point, f32)>,
    exit_weights: Vec<(Point, f32)>,
    entrance_count: usize,
    exit_count: usize,
    rng: &mut impl Rng,
) {
    place(room, DoorKind::Entrance, entrance_weights, entrance_count, rng);
    place(room, DoorKind::Exit, exit_weights, exit_count, rng);
}

fn place(
    room: &mut Room,
    kind: DoorKind,
    weights: Vec<(Point, f32)>,
    count: usize,
    rng: &mut impl Rng,
) {
    if count == 0 {
        return;
    }

    let mut pool = if weights.is_empty() {
        room.tiles.perimeter().map(|p| (p, 1.0)).collect()
    } else {
        weights
    };

    let mut placed = 0;
    while placed < count {
        let p = match take_weighted(&mut pool, rng) {
            Some(p) => p,
            None => break,
        };
        if !is_valid_position(&room.tiles, p) {
            continue;
        }

        let priority = placed as i32;
        if let Some(tile) = room.tiles.get_mut(p) {
            tile.walkable = true;
            tile.priority = priority;
            tile.set_category(DesignCategory::Gate, rng);
            match kind {
                DoorKind::Entrance => tile.is_entrance = true,
                DoorKind::Exit => tile.is_exit = true,
            }
        }
        let doorway = Doorway {
            position: p,
            priority,
        };
        match kind {
            DoorKind::Entrance => room.entrances.push(doorway),
            DoorKind::Exit => room.exits.push(doorway),
        }
        placed += 1;
    }

    if placed < count {
        log::warn!(
            "Room {} got {} of {} {:?} doorways",
            room.id,
            placed,
            count,
            kind
        );
    }
}

fn is_valid_position(tiles: &TileGrid, p: Point) -> bool {
    tiles.is_perimeter(p) && tiles.get(p).map_or(false, |t| !t.is_door())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extent::Extent,
        partition::Area,
        room::{DesignType, Tile},
        sampling::small_rng,
    };

    fn walled_room(rng: &mut impl Rng) -> Room {
        let area = Area {
            id: 0,
            extent: Extent::new(10, 20, 6, 5),
        };
        let mut room = Room::new(3, &area);
        let mut tiles = TileGrid::new(6, 5, |_| Tile::floor(rng));
        tiles.outline_with_walls(rng);
        room.set_footprint(area.extent, tiles);

        room
    }

    #[test]
    fn test_doorways_are_distinct_perimeter_gates() {
        let mut rng = small_rng(1);
        let mut room = walled_room(&mut rng);
        assign_entrances_and_exits(&mut room, Vec::new(), Vec::new(), 2, 2, &mut rng);

        assert_eq!(room.entrances.len(), 2);
        assert_eq!(room.exits.len(), 2);
        let mut positions: Vec<Point> = room
            .entrances
            .iter()
            .chain(room.exits.iter())
            .map(|d| d.position)
            .collect();
        positions.sort_by_key(|p| (p.x, p.y));
        positions.dedup();
        assert_eq!(positions.len(), 4);

        for p in positions {
            let tile = room.tiles.get(p).unwrap();
            assert!(room.tiles.is_perimeter(p));
            assert!(tile.walkable);
            assert_eq!(tile.design_type, DesignType::Gate);
        }
        assert!(room.tiles.get(room.entrances[0].position).unwrap().is_entrance);
        assert!(room.tiles.get(room.exits[0].position).unwrap().is_exit);
    }

    #[test]
    fn test_weighted_candidates_are_respected() {
        let mut rng = small_rng(2);
        let mut room = walled_room(&mut rng);
        let only = Point::new(0, 2);
        assign_entrances_and_exits(
            &mut room,
            vec![(only, 1.0), (Point::new(2, 2), 5.0)],
            Vec::new(),
            2,
            0,
            &mut rng,
        );

        // The interior candidate is drawn and rejected, so only one entrance fits.
        assert_eq!(room.entrances.len(), 1);
        assert_eq!(room.entrances[0].position, only);
        assert_eq!(room.doorway_positions(), vec![Point::new(10, 22)]);
    }
}
