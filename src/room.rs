use crate::{
    extent::{Extent, Point},
    partition::Area,
};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Semantic role of a room.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RoomType {
    Empty,
    Entrance,
    Exit,
    Standard,
    Treasure,
    Boss,
    Secret,
    /// Matches any room type when binding generators and fixed templates.
    Free,
}

impl Default for RoomType {
    fn default() -> Self {
        RoomType::Empty
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum DesignCategory {
    None,
    Floor,
    Wall,
    Corridor,
    SecretCorridor,
    Gate,
}

impl Default for DesignCategory {
    fn default() -> Self {
        DesignCategory::None
    }
}

/// Concrete visual variant of a design category.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum DesignType {
    None,
    StoneWall,
    CrackedStoneWall,
    OuterWall,
    StoneFloor,
    CrackedStoneFloor,
    GrassFloor,
    StonePillars,
    StoneCorridor,
    CrackedStoneCorridor,
    SecretPassage,
    Gate,
}

impl Default for DesignType {
    fn default() -> Self {
        DesignType::None
    }
}

impl DesignType {
    pub const CRACKED_PROBABILITY: f64 = 0.1;

    /// Picks the visual variant for `category`; plain stone most of the time, cracked stone
    /// otherwise.
    pub fn roll<R: Rng + ?Sized>(category: DesignCategory, rng: &mut R) -> DesignType {
        let cracked = rng.gen_bool(Self::CRACKED_PROBABILITY);
        match category {
            DesignCategory::Floor => {
                if cracked {
                    DesignType::CrackedStoneFloor
                } else {
                    DesignType::StoneFloor
                }
            }
            DesignCategory::Wall => {
                if cracked {
                    DesignType::CrackedStoneWall
                } else {
                    DesignType::StoneWall
                }
            }
            DesignCategory::Corridor => {
                if cracked {
                    DesignType::CrackedStoneCorridor
                } else {
                    DesignType::StoneCorridor
                }
            }
            DesignCategory::SecretCorridor => DesignType::SecretPassage,
            DesignCategory::Gate => DesignType::Gate,
            DesignCategory::None => DesignType::None,
        }
    }
}

/// Opaque key of a spawn table owned by the entity layer.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SpawnDescriptor(pub String);

impl From<&str> for SpawnDescriptor {
    fn from(s: &str) -> Self {
        SpawnDescriptor(s.to_owned())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SpawnSlots {
    pub enemy: Option<SpawnDescriptor>,
    pub npc: Option<SpawnDescriptor>,
    pub special_object: Option<SpawnDescriptor>,
}

impl SpawnSlots {
    pub fn is_empty(&self) -> bool {
        self.enemy.is_none() && self.npc.is_none() && self.special_object.is_none()
    }

    pub fn slot_mut(&mut self, kind: SpawnKind) -> &mut Option<SpawnDescriptor> {
        match kind {
            SpawnKind::Enemy => &mut self.enemy,
            SpawnKind::Npc => &mut self.npc,
            SpawnKind::SpecialObject => &mut self.special_object,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum SpawnKind {
    Enemy,
    Npc,
    SpecialObject,
}

/// A room- or corridor-local cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tile {
    pub walkable: bool,
    pub design_category: DesignCategory,
    pub design_type: DesignType,
    pub is_entrance: bool,
    pub is_exit: bool,
    pub spawns: SpawnSlots,
    pub priority: i32,
}

impl Tile {
    pub fn floor<R: Rng + ?Sized>(rng: &mut R) -> Tile {
        let mut tile = Tile::default();
        tile.walkable = true;
        tile.set_category(DesignCategory::Floor, rng);

        tile
    }

    pub fn wall<R: Rng + ?Sized>(rng: &mut R) -> Tile {
        let mut tile = Tile::default();
        tile.set_category(DesignCategory::Wall, rng);

        tile
    }

    pub fn set_category<R: Rng + ?Sized>(&mut self, category: DesignCategory, rng: &mut R) {
        self.design_category = category;
        self.design_type = DesignType::roll(category, rng);
    }

    pub fn is_door(&self) -> bool {
        self.is_entrance || self.is_exit
    }
}

/// Row-major `height x width` grid of room-local tiles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new(width: i32, height: i32, mut fill: impl FnMut(Point) -> Tile) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        let tiles = Extent::new(0, 0, width, height).points().map(|p| fill(p)).collect();

        TileGrid {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    pub fn is_perimeter(&self, p: Point) -> bool {
        self.contains(p)
            && (p.x == 0 || p.y == 0 || p.x == self.width - 1 || p.y == self.height - 1)
    }

    fn index(&self, p: Point) -> Option<usize> {
        if self.contains(p) {
            Some((p.y * self.width + p.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, p: Point) -> Option<&Tile> {
        self.index(p).map(move |i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, p: Point) -> Option<&mut Tile> {
        match self.index(p) {
            Some(i) => Some(&mut self.tiles[i]),
            None => None,
        }
    }

    pub fn is_walkable(&self, p: Point) -> bool {
        self.get(p).map_or(false, |t| t.walkable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Point, &Tile)> + '_ {
        Extent::new(0, 0, self.width, self.height)
            .points()
            .zip(self.tiles.iter())
    }

    pub fn perimeter(&self) -> impl Iterator<Item = Point> + '_ {
        Extent::new(0, 0, self.width, self.height)
            .points()
            .filter(move |p| self.is_perimeter(*p))
    }

    /// Forces the outer ring to non-walkable wall.
    pub fn outline_with_walls<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let ring: Vec<Point> = self.perimeter().collect();
        for p in ring {
            if let Some(tile) = self.get_mut(p) {
                tile.walkable = false;
                tile.set_category(DesignCategory::Wall, rng);
            }
        }
    }
}

/// An entrance or exit cell, room-local.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Doorway {
    pub position: Point,
    pub priority: i32,
}

#[derive(Clone, Debug)]
pub struct Room {
    pub id: usize,
    pub area_id: usize,
    /// The area the room was carved from; `extent` always lies inside it.
    pub area: Extent,
    pub extent: Extent,
    pub room_type: RoomType,
    pub is_fixed: bool,
    pub tiles: TileGrid,
    pub entrances: Vec<Doorway>,
    pub exits: Vec<Doorway>,
}

impl Room {
    /// A room covering its whole area, with no tiles carved yet.
    pub fn new(id: usize, area: &Area) -> Self {
        Room {
            id,
            area_id: area.id,
            area: area.extent,
            extent: area.extent,
            room_type: RoomType::Empty,
            is_fixed: false,
            tiles: TileGrid::new(area.extent.width(), area.extent.height(), |_| {
                Tile::default()
            }),
            entrances: Vec::new(),
            exits: Vec::new(),
        }
    }

    pub fn center(&self) -> Point {
        self.extent.center()
    }

    pub fn center_distance(&self, other: &Room) -> f32 {
        self.extent.center_distance(&other.extent)
    }

    /// Replaces the footprint. Doorways are cleared since they index the old grid.
    pub fn set_footprint(&mut self, extent: Extent, tiles: TileGrid) {
        debug_assert_eq!(extent.width(), tiles.width());
        debug_assert_eq!(extent.height(), tiles.height());
        debug_assert!(extent.is_subset(&self.area));
        self.extent = extent;
        self.tiles = tiles;
        self.entrances.clear();
        self.exits.clear();
    }

    pub fn to_world(&self, local: Point) -> Point {
        *self.extent.get_minimum() + local
    }

    /// World positions of every entrance and exit.
    pub fn doorway_positions(&self) -> Vec<Point> {
        self.entrances
            .iter()
            .chain(self.exits.iter())
            .map(|d| self.to_world(d.position))
            .collect()
    }
}
