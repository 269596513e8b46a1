//! Hand-authored room templates.
//!
//! A template is a block of ASCII rows, row index = y:
//!
//! ```text
//! #####
//! E...#
//! #.g.X
//! #####
//! ```
//!
//! `#` is wall, `.` floor, `E` entrance, `X` exit and a space is empty. Any other glyph must be
//! declared in `spawn_glyphs` and marks a floor tile carrying that spawn.

use crate::{
    error::{GenerationError, Result},
    extent::{Extent, Point},
    room::{
        DesignCategory, DesignType, Doorway, Room, RoomType, SpawnDescriptor, SpawnKind, Tile,
        TileGrid,
    },
    sampling::sample_inclusive,
};

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SpawnGlyph {
    pub glyph: char,
    pub kind: SpawnKind,
    pub descriptor: SpawnDescriptor,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FixedRoomTemplate {
    pub name: String,
    pub room_type: RoomType,
    pub rows: Vec<String>,
    #[serde(default)]
    pub spawn_glyphs: Vec<SpawnGlyph>,
    #[serde(default)]
    pub door_priority: i32,
    #[serde(skip)]
    extracted: Option<ExtractedLayout>,
}

/// Tiles and doorways read out of a template, room-local.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedLayout {
    pub tiles: TileGrid,
    pub entrances: Vec<Doorway>,
    pub exits: Vec<Doorway>,
}

impl FixedRoomTemplate {
    pub fn new(name: &str, room_type: RoomType, rows: &[&str]) -> Self {
        FixedRoomTemplate {
            name: name.to_owned(),
            room_type,
            rows: rows.iter().map(|r| (*r).to_owned()).collect(),
            ..Default::default()
        }
    }

    pub fn width(&self) -> i32 {
        self.rows.first().map_or(0, |r| r.chars().count() as i32)
    }

    pub fn height(&self) -> i32 {
        self.rows.len() as i32
    }

    pub fn serves(&self, room_type: RoomType) -> bool {
        self.room_type == room_type
            || self.room_type == RoomType::Free
            || self.room_type == RoomType::Empty
    }

    pub fn fits(&self, area: &Extent) -> bool {
        self.width() <= area.width() && self.height() <= area.height()
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted.is_some()
    }

    /// Parses the rows once; later calls return the cached layout.
    pub fn extract(&mut self) -> Result<&ExtractedLayout> {
        if self.extracted.is_none() {
            let layout = self.parse()?;
            log::debug!(
                "Extracted fixed room {:?}: {} entrances, {} exits",
                self.name,
                layout.entrances.len(),
                layout.exits.len()
            );
            self.extracted = Some(layout);
        }

        match self.extracted.as_ref() {
            Some(layout) => Ok(layout),
            None => Err(self.malformed("extraction produced no layout")),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> GenerationError {
        GenerationError::MalformedLayout {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn parse(&self) -> Result<ExtractedLayout> {
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 {
            return Err(self.malformed("layout has no tiles"));
        }

        let mut tiles = TileGrid::new(width, height, |_| Tile::default());
        let mut entrances = Vec::new();
        let mut exits = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            if row.chars().count() as i32 != width {
                return Err(self.malformed(format!(
                    "row {} has {} glyphs, expected {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }

            for (x, glyph) in row.chars().enumerate() {
                let p = Point::new(x as i32, y as i32);
                let tile = self.glyph_tile(glyph).ok_or_else(|| {
                    self.malformed(format!("unknown glyph {:?} at {:?}", glyph, p))
                })?;
                let doorway = Doorway {
                    position: p,
                    priority: self.door_priority,
                };
                if tile.is_entrance {
                    entrances.push(doorway);
                }
                if tile.is_exit {
                    exits.push(doorway);
                }
                if let Some(t) = tiles.get_mut(p) {
                    *t = tile;
                }
            }
        }

        Ok(ExtractedLayout {
            tiles,
            entrances,
            exits,
        })
    }

    /// Authored tiles use the plain variant of every category.
    fn glyph_tile(&self, glyph: char) -> Option<Tile> {
        let mut tile = Tile::default();
        let (category, design_type, walkable) = match glyph {
            '#' => (DesignCategory::Wall, DesignType::StoneWall, false),
            '.' => (DesignCategory::Floor, DesignType::StoneFloor, true),
            ' ' => (DesignCategory::None, DesignType::None, false),
            'E' | 'X' => {
                tile.is_entrance = glyph == 'E';
                tile.is_exit = glyph == 'X';
                tile.priority = self.door_priority;
                (DesignCategory::Gate, DesignType::Gate, true)
            }
            _ => {
                let spawn = self.spawn_glyphs.iter().find(|s| s.glyph == glyph)?;
                *tile.spawns.slot_mut(spawn.kind) = Some(spawn.descriptor.clone());
                (DesignCategory::Floor, DesignType::StoneFloor, true)
            }
        };
        tile.design_category = category;
        tile.design_type = design_type;
        tile.walkable = walkable;

        Some(tile)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FixedRoomLibrary {
    pub templates: Vec<FixedRoomTemplate>,
}

impl FixedRoomLibrary {
    pub fn new(templates: Vec<FixedRoomTemplate>) -> Self {
        FixedRoomLibrary { templates }
    }

    pub fn from_ron_str(s: &str) -> Result<Self> {
        ron::de::from_str(s).map_err(|e| GenerationError::SpecParse(e.to_string()))
    }

    /// Index of the template serving `room_type` that wastes the least of `area`.
    pub fn best_fit(&self, room_type: RoomType, area: &Extent) -> Option<usize> {
        self.templates
            .iter()
            .enumerate()
            .filter(|(_, t)| t.serves(room_type) && t.fits(area))
            .min_by_key(|(_, t)| (area.width() - t.width()) + (area.height() - t.height()))
            .map(|(i, _)| i)
    }

    /// Stamps the best fitting template into `room` at a random offset inside its area.
    /// Returns `Ok(false)` when nothing fits, leaving the room untouched.
    pub fn place(&mut self, room: &mut Room, rng: &mut impl Rng) -> Result<bool> {
        let index = match self.best_fit(room.room_type, &room.area) {
            Some(i) => i,
            None => {
                log::warn!(
                    "No fixed room fits {:?} room {} in {:?}",
                    room.room_type,
                    room.id,
                    room.area
                );
                return Ok(false);
            }
        };

        let layout = self.templates[index].extract()?;
        let (width, height) = (layout.tiles.width(), layout.tiles.height());
        let x = room.area.min_x() + sample_inclusive(rng, 0, room.area.width() - width);
        let y = room.area.min_y() + sample_inclusive(rng, 0, room.area.height() - height);
        room.set_footprint(Extent::new(x, y, width, height), layout.tiles.clone());
        room.entrances = layout.entrances.clone();
        room.exits = layout.exits.clone();
        room.is_fixed = true;

        Ok(true)
    }
}
