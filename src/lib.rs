pub mod corridor;
pub mod entrance;
pub mod error;
pub mod extent;
pub mod fixed_room;
pub mod graph;
pub mod lighting;
pub mod map;
pub mod map_types;
pub mod partition;
pub mod room;
pub mod room_type;
pub mod sampling;
pub mod selector;
pub mod shape;
pub mod spawn;

mod symmetric_map;

pub use error::{GenerationError, Result};
pub use extent::{Extent, Point};
pub use map::{DungeonMap, DungeonTile, TileSet, TileType};
pub use map_types::dungeon::{Dungeon, DungeonMapSpec};

/// Implement this to receive the finished tiles, e.g. to instantiate their visuals.
pub trait TileEncoder {
    /// `visual` is the asset key the tile set maps the tile's design type to.
    fn encode_tile(&mut self, point: &Point, tile: &DungeonTile, visual: &str);
}
