//! The global tile grid: merging rooms and corridors, classifying walls, and handing the
//! result to a renderer.

use crate::{
    corridor::Corridor,
    error::{GenerationError, Result},
    extent::Point,
    lighting::{BrightnessLevel, Color},
    room::{DesignCategory, DesignType, Room, SpawnSlots},
    TileEncoder,
};

use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TileType {
    Empty,
    Wall,
    Floor,
    Corridor,
    SecretCorridor,
}

impl Default for TileType {
    fn default() -> Self {
        TileType::Empty
    }
}

impl TileType {
    /// Fraction of light that passes through one cell of this type.
    pub fn transparency(self) -> f32 {
        match self {
            TileType::Empty => 0.2,
            TileType::Wall => 0.3,
            _ => 0.8,
        }
    }

    /// Unlit color.
    pub fn base_color(self) -> Color {
        match self {
            TileType::Empty => Color::rgb(0.0, 0.0, 0.0),
            TileType::Wall => Color::rgb(0.35, 0.3, 0.3),
            TileType::Floor => Color::rgb(0.6, 0.6, 0.55),
            TileType::Corridor => Color::rgb(0.5, 0.5, 0.45),
            TileType::SecretCorridor => Color::rgb(0.4, 0.4, 0.4),
        }
    }
}

impl From<DesignCategory> for TileType {
    fn from(category: DesignCategory) -> Self {
        match category {
            DesignCategory::None => TileType::Empty,
            DesignCategory::Floor | DesignCategory::Gate => TileType::Floor,
            DesignCategory::Wall => TileType::Wall,
            DesignCategory::Corridor => TileType::Corridor,
            DesignCategory::SecretCorridor => TileType::SecretCorridor,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DungeonTile {
    pub position: Point,
    pub walkable: bool,
    pub tile_type: TileType,
    pub design_category: DesignCategory,
    pub design_type: DesignType,
    /// Owning room id; `None` for corridors and bare rock.
    pub room: Option<usize>,
    pub is_entrance: bool,
    pub is_exit: bool,
    pub spawns: SpawnSlots,
    pub priority: i32,
    pub initial_color: Color,
    /// Light accumulated by the last lighting pass.
    pub light: Color,
    pub display_color: Color,
    pub brightness: BrightnessLevel,
}

impl DungeonTile {
    fn empty(position: Point) -> Self {
        DungeonTile {
            position,
            initial_color: TileType::Empty.base_color(),
            display_color: TileType::Empty.base_color(),
            ..Default::default()
        }
    }

    pub fn transparency(&self) -> f32 {
        self.tile_type.transparency()
    }

    fn set_tile_type(&mut self, tile_type: TileType) {
        self.tile_type = tile_type;
        self.initial_color = tile_type.base_color();
        self.display_color = self.initial_color;
    }
}

/// Row-major grid covering `[0, width) x [0, height)`.
#[derive(Clone, Debug)]
pub struct DungeonMap {
    width: i32,
    height: i32,
    tiles: Vec<DungeonTile>,
    /// Unique per map, renewed whenever tiles are handed out for editing.
    revision: u64,
}

impl DungeonMap {
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(DungeonTile::empty(Point::new(x, y)));
            }
        }

        DungeonMap {
            width,
            height,
            tiles,
            revision: next_revision(),
        }
    }

    /// Merges rooms, then corridors, then classifies the leftover rock.
    pub fn assemble(rooms: &[Room], corridors: &[Corridor], width: i32, height: i32) -> Self {
        let mut map = DungeonMap::new(width, height);
        for room in rooms.iter() {
            map.apply_room(room);
        }
        for corridor in corridors.iter() {
            map.apply_corridor(corridor);
        }
        map.classify_walls();
        log::debug!(
            "Assembled {}x{} map from {} rooms and {} corridors",
            width,
            height,
            rooms.len(),
            corridors.len()
        );

        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    pub fn index(&self, p: &Point) -> Option<usize> {
        if self.contains(p) {
            Some((p.y * self.width + p.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, p: &Point) -> Option<&DungeonTile> {
        self.index(p).map(move |i| &self.tiles[i])
    }

    /// Counts as an edit: lighting caches built for this map are dropped on the next pass.
    pub fn get_mut(&mut self, p: &Point) -> Option<&mut DungeonTile> {
        self.revision = next_revision();
        self.cell_mut(p)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn cell_mut(&mut self, p: &Point) -> Option<&mut DungeonTile> {
        match self.index(p) {
            Some(i) => Some(&mut self.tiles[i]),
            None => None,
        }
    }

    pub fn tiles(&self) -> &[DungeonTile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [DungeonTile] {
        &mut self.tiles
    }

    /// Room tiles never collide, so this only skips cells that fall off the map and the empty
    /// cells outside a room's shape.
    fn apply_room(&mut self, room: &Room) {
        for (local, tile) in room.tiles.iter() {
            if tile.design_category == DesignCategory::None {
                continue;
            }
            let p = room.to_world(local);
            let target = match self.cell_mut(&p) {
                Some(t) => t,
                None => {
                    log::warn!("Room {} tile {:?} lies outside the map", room.id, p);
                    continue;
                }
            };
            target.walkable = tile.walkable;
            target.design_category = tile.design_category;
            target.design_type = tile.design_type;
            target.is_entrance = tile.is_entrance;
            target.is_exit = tile.is_exit;
            target.priority = tile.priority;
            target.spawns = tile.spawns.clone();
            target.room = Some(room.id);
            target.set_tile_type(tile.design_category.into());
        }
    }

    /// Corridors never overwrite a room's floor.
    fn apply_corridor(&mut self, corridor: &Corridor) {
        for (p, tile) in corridor.tiles.iter() {
            let target = match self.cell_mut(p) {
                Some(t) => t,
                None => {
                    log::warn!("Corridor tile {:?} lies outside the map", p);
                    continue;
                }
            };
            if target.tile_type == TileType::Floor && target.room.is_some() {
                continue;
            }
            target.walkable = tile.walkable;
            target.design_category = tile.design_category;
            target.design_type = tile.design_type;
            target.is_entrance = false;
            target.is_exit = false;
            target.priority = tile.priority;
            target.spawns = SpawnSlots::default();
            target.room = None;
            target.set_tile_type(tile.design_category.into());
        }
    }

    /// Every wall or empty cell becomes wall: an outer wall when it sits directly above a
    /// floor, plain stone otherwise. Existing wall variants are kept for the latter.
    pub fn classify_walls(&mut self) {
        for i in 0..self.tiles.len() {
            if !matches!(self.tiles[i].tile_type, TileType::Wall | TileType::Empty) {
                continue;
            }
            let p = self.tiles[i].position;
            let below = Point::new(p.x, p.y - 1);
            let above_floor = self
                .get(&below)
                .map_or(false, |t| t.tile_type == TileType::Floor);

            let tile = &mut self.tiles[i];
            if above_floor {
                tile.design_type = DesignType::OuterWall;
            } else if tile.design_category != DesignCategory::Wall {
                tile.design_type = DesignType::StoneWall;
            }
            tile.design_category = DesignCategory::Wall;
            tile.walkable = false;
            tile.set_tile_type(TileType::Wall);
        }
    }

    /// Hands every tile to `encoder` with its visual key from `tile_set`.
    pub fn encode(&self, tile_set: &TileSet, encoder: &mut impl TileEncoder) -> Result<()> {
        let fallback = tile_set.fallback()?;
        let mut unmapped = FnvHashSet::default();
        for tile in self.tiles.iter() {
            let visual = match tile_set.visuals.get(&tile.design_type) {
                Some(v) => v.as_str(),
                None => {
                    if unmapped.insert(tile.design_type) {
                        log::warn!(
                            "Tile set {:?} has no visual for {:?}; using the fallback",
                            tile_set.name,
                            tile.design_type
                        );
                    }
                    fallback
                }
            };
            encoder.encode_tile(&tile.position, tile, visual);
        }

        Ok(())
    }
}

/// Maps design types to renderer asset keys. `DesignType::None` is the mandatory fallback.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TileSet {
    pub name: String,
    pub visuals: FnvHashMap<DesignType, String>,
}

impl TileSet {
    pub fn fallback(&self) -> Result<&str> {
        match self.visuals.get(&DesignType::None) {
            Some(v) => Ok(v.as_str()),
            None => {
                log::error!("Tile set {:?} has no fallback visual", self.name);
                Err(GenerationError::MissingFallbackVisual {
                    tile_set: self.name.clone(),
                })
            }
        }
    }
}
