//! Carving random room footprints inside their areas.

use crate::{
    entrance::assign_entrances_and_exits,
    error::{invalid_config, Result},
    extent::{Extent, Point},
    room::{Room, RoomType, Tile, TileGrid},
    sampling::sample_inclusive,
};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

pub const CORNER_WEIGHT: f32 = 0.1;
pub const PROTRUSION_WEIGHT: f32 = 2.0;
pub const RECESSED_WEIGHT: f32 = 0.2;
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// Rooms are never carved narrower than this unless the area itself is.
pub const MIN_ROOM_DIM: i32 = 3;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum RoomShape {
    Basic,
    LShape,
    UShape,
    Checkerboard {
        block_width: i32,
        block_height: i32,
        corridor_width: i32,
    },
}

impl Default for RoomShape {
    fn default() -> Self {
        RoomShape::Basic
    }
}

/// Room dimensions as fractions of the owning area.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SizeRatios {
    pub min_width_ratio: f32,
    pub max_width_ratio: f32,
    pub min_height_ratio: f32,
    pub max_height_ratio: f32,
}

impl Default for SizeRatios {
    fn default() -> Self {
        SizeRatios {
            min_width_ratio: 0.3,
            max_width_ratio: 0.8,
            min_height_ratio: 0.3,
            max_height_ratio: 0.8,
        }
    }
}

impl SizeRatios {
    pub fn validate(&self) -> Result<()> {
        let ok = |min: f32, max: f32| 0.0 <= min && min <= max && max <= 1.0;
        if !ok(self.min_width_ratio, self.max_width_ratio)
            || !ok(self.min_height_ratio, self.max_height_ratio)
        {
            return Err(invalid_config(format!(
                "room size ratios must satisfy 0 <= min <= max <= 1, got {:?}",
                self
            )));
        }

        Ok(())
    }

    /// A rectangle inside `area` sized by the ratios and placed uniformly at random.
    pub fn sample_footprint(&self, area: &Extent, rng: &mut impl Rng) -> Extent {
        let width = sample_dim(area.width(), self.min_width_ratio, self.max_width_ratio, rng);
        let height = sample_dim(
            area.height(),
            self.min_height_ratio,
            self.max_height_ratio,
            rng,
        );
        let x = area.min_x() + sample_inclusive(rng, 0, area.width() - width);
        let y = area.min_y() + sample_inclusive(rng, 0, area.height() - height);

        Extent::new(x, y, width, height)
    }
}

fn sample_dim(dim: i32, min_ratio: f32, max_ratio: f32, rng: &mut impl Rng) -> i32 {
    let lo = (dim as f32 * min_ratio).round() as i32;
    let hi = (dim as f32 * max_ratio).round() as i32;

    sample_inclusive(rng, lo, hi).max(MIN_ROOM_DIM.min(dim)).min(dim)
}

/// Binds a shape and door counts to a room type. `Free` and `Empty` bindings serve every type.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RoomGeneratorSpec {
    pub room_type: RoomType,
    pub shape: RoomShape,
    pub size: SizeRatios,
    pub entrance_count: usize,
    pub exit_count: usize,
}

impl Default for RoomGeneratorSpec {
    fn default() -> Self {
        RoomGeneratorSpec {
            room_type: RoomType::Free,
            shape: RoomShape::Basic,
            size: SizeRatios::default(),
            entrance_count: 1,
            exit_count: 1,
        }
    }
}

impl RoomGeneratorSpec {
    pub fn validate(&self) -> Result<()> {
        self.size.validate()?;
        if let RoomShape::Checkerboard {
            block_width,
            block_height,
            corridor_width,
        } = self.shape
        {
            if block_width < 1 || block_height < 1 || corridor_width < 1 {
                return Err(invalid_config(format!(
                    "checkerboard blocks and corridors must be positive, got {:?}",
                    self.shape
                )));
            }
        }

        Ok(())
    }

    pub fn serves(&self, room_type: RoomType) -> bool {
        self.room_type == room_type
            || self.room_type == RoomType::Free
            || self.room_type == RoomType::Empty
    }

    /// Carves a fresh footprint for `room` and places its doorways.
    pub fn generate(&self, room: &mut Room, rng: &mut impl Rng) {
        let extent = self.size.sample_footprint(&room.area, rng);
        let mut tiles = self.shape.carve(extent.width(), extent.height(), rng);
        tiles.outline_with_walls(rng);
        let weights = self.shape.wall_weights(&tiles);
        room.set_footprint(extent, tiles);
        assign_entrances_and_exits(
            room,
            weights.clone(),
            weights,
            self.entrance_count,
            self.exit_count,
            rng,
        );
    }
}

/// Uniform pick among the generators serving `room_type`.
pub fn pick_generator<'a>(
    generators: &'a [RoomGeneratorSpec],
    room_type: RoomType,
    rng: &mut impl Rng,
) -> Option<&'a RoomGeneratorSpec> {
    let candidates: Vec<&RoomGeneratorSpec> =
        generators.iter().filter(|g| g.serves(room_type)).collect();

    candidates.choose(rng).copied()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Opening {
    Up,
    Down,
    Left,
    Right,
}

const ALL_OPENINGS: [Opening; 4] = [Opening::Up, Opening::Down, Opening::Left, Opening::Right];

impl RoomShape {
    /// Carves a `width x height` grid. The outer ring is not walled here.
    pub fn carve(&self, width: i32, height: i32, rng: &mut impl Rng) -> TileGrid {
        match self {
            RoomShape::Basic => TileGrid::new(width, height, |_| Tile::floor(rng)),
            RoomShape::LShape => {
                if width < 4 || height < 4 {
                    return RoomShape::Basic.carve(width, height, rng);
                }
                TileGrid::new(width, height, |p| {
                    if is_l_notch(p, width, height) {
                        Tile::default()
                    } else {
                        Tile::floor(rng)
                    }
                })
            }
            RoomShape::UShape => {
                if width < 5 || height < 5 {
                    return RoomShape::Basic.carve(width, height, rng);
                }
                let opening = ALL_OPENINGS.choose(rng).copied().unwrap_or(Opening::Up);
                TileGrid::new(width, height, |p| {
                    if is_u_notch(p, width, height, opening) {
                        Tile::default()
                    } else {
                        Tile::floor(rng)
                    }
                })
            }
            RoomShape::Checkerboard {
                block_width,
                block_height,
                corridor_width,
            } => carve_checkerboard(
                width,
                height,
                (*block_width).max(1),
                (*block_height).max(1),
                (*corridor_width).max(1),
                rng,
            ),
        }
    }

    /// Door candidate weights for the wall ring. Corners always qualify at a low weight; other
    /// ring tiles with no walkable neighbour are left out since a door there opens onto nothing.
    pub fn wall_weights(&self, tiles: &TileGrid) -> Vec<(Point, f32)> {
        let (w, h) = (tiles.width(), tiles.height());
        tiles
            .perimeter()
            .filter_map(|p| {
                if is_corner(p, w, h) {
                    return Some((p, CORNER_WEIGHT));
                }
                if !p.neighbors4().iter().any(|n| tiles.is_walkable(*n)) {
                    return None;
                }

                let weight = match self {
                    RoomShape::LShape
                        if w >= 4
                            && h >= 4
                            && p
                                .neighbors4()
                                .iter()
                                .any(|n| tiles.contains(*n) && is_l_notch(*n, w, h)) =>
                    {
                        PROTRUSION_WEIGHT
                    }
                    RoomShape::UShape
                        if p
                            .neighbors4()
                            .iter()
                            .any(|n| tiles.contains(*n) && opens_onto_notch(tiles, *n)) =>
                    {
                        RECESSED_WEIGHT
                    }
                    _ => DEFAULT_WEIGHT,
                };

                Some((p, weight))
            })
            .collect()
    }
}

/// The upper right quadrant is cut away.
fn is_l_notch(p: Point, width: i32, height: i32) -> bool {
    p.y >= height / 2 && p.x >= width / 2
}

/// A centered slot a third of the room wide, reaching half way in from the open side.
fn is_u_notch(p: Point, width: i32, height: i32, opening: Opening) -> bool {
    let across = |v: i32, dim: i32| v >= dim / 3 && v < dim - dim / 3;
    match opening {
        Opening::Up => across(p.x, width) && p.y >= height / 2,
        Opening::Down => across(p.x, width) && p.y < height - height / 2,
        Opening::Right => across(p.y, height) && p.x >= width / 2,
        Opening::Left => across(p.y, height) && p.x < width - width / 2,
    }
}

fn is_corner(p: Point, width: i32, height: i32) -> bool {
    (p.x == 0 || p.x == width - 1) && (p.y == 0 || p.y == height - 1)
}

/// A non-corner ring tile backed by the U's notch rather than by floor.
fn opens_onto_notch(tiles: &TileGrid, p: Point) -> bool {
    let (w, h) = (tiles.width(), tiles.height());

    tiles.is_perimeter(p) && !is_corner(p, w, h) && !tiles.is_walkable(inward(p, w, h))
}

/// The neighbour of a non-corner ring tile that points into the room.
fn inward(p: Point, width: i32, height: i32) -> Point {
    if p.y == 0 {
        Point::new(p.x, 1)
    } else if p.y == height - 1 {
        Point::new(p.x, height - 2)
    } else if p.x == 0 {
        Point::new(1, p.y)
    } else {
        Point::new(width - 2, p.y)
    }
}

/// Alternating open and solid blocks, then a recursive-backtracker maze over the blocks that
/// joins neighbours with a strip `corridor_width` wide.
fn carve_checkerboard(
    width: i32,
    height: i32,
    block_width: i32,
    block_height: i32,
    corridor_width: i32,
    rng: &mut impl Rng,
) -> TileGrid {
    let blocks_x = width / block_width;
    let blocks_y = height / block_height;
    let has_blocks = blocks_x > 0 && blocks_y > 0;

    // Cells past the last whole block stay solid.
    let mut tiles = TileGrid::new(width, height, |p| {
        let remainder = p.x >= blocks_x * block_width || p.y >= blocks_y * block_height;
        if (has_blocks && remainder) || ((p.x / block_width) + (p.y / block_height)) % 2 != 0 {
            Tile::wall(rng)
        } else {
            Tile::floor(rng)
        }
    });
    if !has_blocks {
        return tiles;
    }

    let block_center = |b: Point| {
        Point::new(
            b.x * block_width + block_width / 2,
            b.y * block_height + block_height / 2,
        )
    };

    let mut visited = vec![false; (blocks_x * blocks_y) as usize];
    let index = |b: Point| (b.y * blocks_x + b.x) as usize;
    let start = maze_start(blocks_x, blocks_y, rng);
    visited[index(start)] = true;
    let mut stack = vec![start];
    while let Some(&current) = stack.last() {
        let unvisited: Vec<Point> = current
            .neighbors4()
            .iter()
            .copied()
            .filter(|b| b.x >= 0 && b.x < blocks_x && b.y >= 0 && b.y < blocks_y)
            .filter(|b| !visited[index(*b)])
            .collect();
        match unvisited.choose(rng) {
            Some(&next) => {
                carve_strip(
                    &mut tiles,
                    block_center(current),
                    block_center(next),
                    corridor_width,
                    rng,
                );
                visited[index(next)] = true;
                stack.push(next);
            }
            None => {
                stack.pop();
            }
        }
    }

    tiles
}

fn maze_start(blocks_x: i32, blocks_y: i32, rng: &mut impl Rng) -> Point {
    Point::new(rng.gen_range(0, blocks_x), rng.gen_range(0, blocks_y))
}

/// Opens an axis-aligned band between two block centers.
fn carve_strip(tiles: &mut TileGrid, a: Point, b: Point, width: i32, rng: &mut impl Rng) {
    let offset = width / 2;
    let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
    let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
    let band = if a.y == b.y {
        Extent::new(min_x, min_y - offset, max_x - min_x + 1, width)
    } else {
        Extent::new(min_x - offset, min_y, width, max_y - min_y + 1)
    };
    for p in band.points() {
        if let Some(tile) = tiles.get_mut(p) {
            if !tile.walkable {
                *tile = Tile::floor(rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{partition::Area, room::DesignCategory, sampling::small_rng};

    use std::collections::VecDeque;

    fn generated_room(shape: RoomShape, size: i32, seed: u64) -> Room {
        let mut rng = small_rng(seed);
        let area = Area {
            id: 0,
            extent: Extent::new(5, 5, size, size),
        };
        let mut room = Room::new(0, &area);
        let spec = RoomGeneratorSpec {
            shape,
            ..Default::default()
        };
        spec.generate(&mut room, &mut rng);

        room
    }

    fn walkable_count(tiles: &TileGrid) -> usize {
        tiles.iter().filter(|(_, t)| t.walkable).count()
    }

    /// Walkable interior tiles reachable from the first one.
    fn reachable_count(tiles: &TileGrid) -> usize {
        let start = tiles
            .iter()
            .find(|(p, t)| t.walkable && !tiles.is_perimeter(*p))
            .map(|(p, _)| p);
        let start = match start {
            Some(s) => s,
            None => return 0,
        };
        let mut seen = vec![start];
        let mut queue = VecDeque::from(vec![start]);
        while let Some(p) = queue.pop_front() {
            for n in p.neighbors4().iter() {
                if tiles.is_walkable(*n) && !tiles.is_perimeter(*n) && !seen.contains(n) {
                    seen.push(*n);
                    queue.push_back(*n);
                }
            }
        }

        seen.len()
    }

    #[test]
    fn test_footprint_stays_inside_area() {
        for seed in 0..30 {
            let room = generated_room(RoomShape::Basic, 12, seed);

            assert!(room.extent.is_subset(&room.area));
            assert_eq!(room.tiles.width(), room.extent.width());
            assert_eq!(room.tiles.height(), room.extent.height());
            assert!(room.extent.width() >= 4 && room.extent.width() <= 10);
        }
    }

    #[test]
    fn test_tiny_area_clamps_to_area() {
        let mut rng = small_rng(1);
        let area = Extent::new(0, 0, 2, 7);
        let footprint = SizeRatios::default().sample_footprint(&area, &mut rng);

        assert_eq!(footprint.width(), 2);
        assert!(footprint.height() >= 3);
        assert!(footprint.is_subset(&area));
    }

    #[test]
    fn test_outline_is_wall_except_doors() {
        let room = generated_room(RoomShape::UShape, 14, 3);
        for p in room.tiles.perimeter() {
            let tile = room.tiles.get(p).unwrap();
            if tile.is_door() {
                assert_eq!(tile.design_category, DesignCategory::Gate);
            } else {
                assert!(!tile.walkable);
                assert_eq!(tile.design_category, DesignCategory::Wall);
            }
        }
        assert_eq!(room.entrances.len(), 1);
        assert_eq!(room.exits.len(), 1);
    }

    #[test]
    fn test_l_shape_cuts_quadrant() {
        let mut rng = small_rng(4);
        let tiles = RoomShape::LShape.carve(8, 6, &mut rng);

        assert!(!tiles.is_walkable(Point::new(5, 4)));
        assert!(tiles.is_walkable(Point::new(2, 4)));
        assert!(tiles.is_walkable(Point::new(6, 1)));
        assert_eq!(walkable_count(&tiles), 48 - 12);
    }

    #[test]
    fn test_l_shape_weights_favor_arm_tips() {
        let mut rng = small_rng(5);
        let mut tiles = RoomShape::LShape.carve(8, 6, &mut rng);
        tiles.outline_with_walls(&mut rng);
        let weights = RoomShape::LShape.wall_weights(&tiles);

        let weight_of = |p: Point| weights.iter().find(|(q, _)| *q == p).map(|(_, w)| *w);
        // Top edge of the left arm ends where the notch begins.
        assert_eq!(weight_of(Point::new(3, 5)), Some(PROTRUSION_WEIGHT));
        assert_eq!(weight_of(Point::new(7, 2)), Some(PROTRUSION_WEIGHT));
        assert_eq!(weight_of(Point::new(0, 0)), Some(CORNER_WEIGHT));
        assert_eq!(weight_of(Point::new(1, 0)), Some(DEFAULT_WEIGHT));
        // Notch ring tiles face no floor.
        assert_eq!(weight_of(Point::new(6, 5)), None);
    }

    #[test]
    fn test_u_shape_has_every_orientation() {
        let mut seen = Vec::new();
        let mut rng = small_rng(6);
        for _ in 0..64 {
            let tiles = RoomShape::UShape.carve(9, 9, &mut rng);
            let open_side = [
                Point::new(4, 8),
                Point::new(4, 0),
                Point::new(0, 4),
                Point::new(8, 4),
            ]
            .iter()
            .position(|p| !tiles.is_walkable(*p));
            if let Some(side) = open_side {
                if !seen.contains(&side) {
                    seen.push(side);
                }
            }
            assert_eq!(walkable_count(&tiles), 81 - 3 * 5);
        }

        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_u_shape_recesses_flank_the_notch() {
        let mut rng = small_rng(12);
        for _ in 0..16 {
            let mut tiles = RoomShape::UShape.carve(9, 9, &mut rng);
            tiles.outline_with_walls(&mut rng);
            let weights = RoomShape::UShape.wall_weights(&tiles);

            let recessed: Vec<Point> = weights
                .iter()
                .filter(|(_, w)| *w == RECESSED_WEIGHT)
                .map(|(p, _)| *p)
                .collect();
            assert_eq!(recessed.len(), 2);
            for p in recessed.iter() {
                assert!(tiles.is_walkable(inward(*p, 9, 9)));
            }
            assert!(weights.iter().any(|(_, w)| *w == DEFAULT_WEIGHT));
        }
    }

    #[test]
    fn test_maze_start_varies() {
        let mut rng = small_rng(21);
        let mut starts = Vec::new();
        for _ in 0..40 {
            let start = maze_start(3, 2, &mut rng);
            assert!(start.x >= 0 && start.x < 3 && start.y >= 0 && start.y < 2);
            if !starts.contains(&start) {
                starts.push(start);
            }
        }

        assert!(starts.len() > 1);
    }

    #[test]
    fn test_checkerboard_maze_connects_blocks() {
        let shape = RoomShape::Checkerboard {
            block_width: 3,
            block_height: 3,
            corridor_width: 1,
        };
        let mut rng = small_rng(7);
        let mut tiles = shape.carve(17, 17, &mut rng);
        tiles.outline_with_walls(&mut rng);

        let interior_walkable = tiles
            .iter()
            .filter(|(p, t)| t.walkable && !tiles.is_perimeter(*p))
            .count();
        assert!(interior_walkable > 0);
        assert_eq!(reachable_count(&tiles), interior_walkable);
    }

    #[test]
    fn test_pick_generator_honors_free_bindings() {
        let mut rng = small_rng(8);
        let generators = vec![
            RoomGeneratorSpec {
                room_type: RoomType::Boss,
                shape: RoomShape::UShape,
                ..Default::default()
            },
            RoomGeneratorSpec {
                room_type: RoomType::Treasure,
                ..Default::default()
            },
        ];

        for _ in 0..20 {
            let g = pick_generator(&generators, RoomType::Boss, &mut rng).unwrap();
            assert_eq!(g.room_type, RoomType::Boss);
        }
        assert!(pick_generator(&generators, RoomType::Standard, &mut rng).is_none());
    }
}
