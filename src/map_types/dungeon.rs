use crate::{
    corridor::{Corridor, CorridorGraphBuilder, CorridorSpec},
    error::{invalid_config, GenerationError, Result},
    extent::Extent,
    fixed_room::FixedRoomLibrary,
    graph::{adjacency_graph, is_reachable},
    lighting::{LightingEngine, OcclusionPolicy},
    map::DungeonMap,
    partition::{Area, PartitionStrategy},
    room::{Room, RoomType},
    room_type::{assign, setting_for, RoomTypeSetting},
    sampling::small_rng,
    selector::{to_rooms, AreaSelectionMethod, SelectionSpec},
    shape::{pick_generator, RoomGeneratorSpec},
    spawn::SpawnPlacementSpec,
    symmetric_map::SymmetricMap,
};

use rand::prelude::*;
use serde::{Deserialize, Serialize};

pub const MAX_GENERATE_TRIES: usize = 20;

/// Everything that shapes one dungeon. Missing RON fields take their defaults.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DungeonMapSpec {
    pub seed: u64,
    pub width: i32,
    pub height: i32,
    pub partition: PartitionStrategy,
    pub selection: SelectionSpec,
    pub room_types: Vec<RoomTypeSetting>,
    /// Given to every room the weighted assignment leaves over.
    pub default_room_type: RoomType,
    pub generators: Vec<RoomGeneratorSpec>,
    pub corridors: CorridorSpec,
    pub spawn: SpawnPlacementSpec,
    pub occlusion: OcclusionPolicy,
}

impl Default for DungeonMapSpec {
    fn default() -> Self {
        DungeonMapSpec {
            seed: 0,
            width: 64,
            height: 64,
            partition: PartitionStrategy::default(),
            selection: SelectionSpec {
                method: AreaSelectionMethod::Random,
                room_count: Some(10),
            },
            room_types: vec![RoomTypeSetting::new(RoomType::Standard, 1.0)],
            default_room_type: RoomType::Standard,
            generators: vec![RoomGeneratorSpec::default()],
            corridors: CorridorSpec::default(),
            spawn: SpawnPlacementSpec::default(),
            occlusion: OcclusionPolicy::default(),
        }
    }
}

impl DungeonMapSpec {
    pub fn from_ron_str(s: &str) -> Result<Self> {
        let spec: Self =
            ron::de::from_str(s).map_err(|e| GenerationError::SpecParse(e.to_string()))?;
        spec.validate()?;

        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(invalid_config(format!(
                "map must have positive size, got {}x{}",
                self.width, self.height
            )));
        }
        self.partition.validate()?;
        for setting in self.room_types.iter() {
            setting.validate()?;
        }
        if self.generators.is_empty() && self.selection.room_count != Some(0) {
            return Err(invalid_config("no room generator is registered"));
        }
        for generator in self.generators.iter() {
            generator.validate()?;
        }
        self.corridors.validate()?;

        Ok(())
    }

    pub fn lighting_engine(&self) -> LightingEngine {
        LightingEngine::new(self.occlusion)
    }

    /// Runs every stage once, in order. Each stage finishes before the next starts.
    pub fn try_generate(
        &self,
        fixed_rooms: &mut FixedRoomLibrary,
        rng: &mut impl Rng,
    ) -> Result<Dungeon> {
        self.validate()?;
        log::debug!("Generating {}x{} dungeon", self.width, self.height);

        let areas = self
            .partition
            .partition(Extent::new(0, 0, self.width, self.height), rng)?;
        log::debug!("Generated {} areas", areas.len());

        let selected = self.selection.select(&areas, rng);
        let mut rooms = to_rooms(&selected);
        assign(&mut rooms, &self.room_types, self.default_room_type, rng);

        for room in rooms.iter_mut() {
            self.generate_room(room, fixed_rooms, rng)?;
            if let Some(setting) = setting_for(&self.room_types, room.room_type) {
                self.spawn.assign_spawns(room, setting, rng);
            }
        }
        log::debug!(
            "Generated {} rooms, {} fixed",
            rooms.len(),
            rooms.iter().filter(|r| r.is_fixed).count()
        );

        let corridors = CorridorGraphBuilder::new(&self.corridors).connect(&rooms, rng);
        let map = DungeonMap::assemble(&rooms, &corridors, self.width, self.height);

        Ok(Dungeon::new(areas, rooms, corridors, map))
    }

    /// Fixed template first when the room rolled one, a random generator otherwise.
    fn generate_room(
        &self,
        room: &mut Room,
        fixed_rooms: &mut FixedRoomLibrary,
        rng: &mut impl Rng,
    ) -> Result<()> {
        if room.is_fixed {
            if fixed_rooms.place(room, rng)? {
                return Ok(());
            }
            room.is_fixed = false;
        }

        match pick_generator(&self.generators, room.room_type, rng) {
            Some(generator) => generator.generate(room, rng),
            None => log::warn!(
                "No generator serves {:?} room {}; leaving it uncarved",
                room.room_type,
                room.id
            ),
        }

        Ok(())
    }

    /// Seeds from `self.seed` and regenerates until the entrance reaches the exit.
    pub fn generate(&self, fixed_rooms: &mut FixedRoomLibrary) -> Result<Dungeon> {
        let mut rng = small_rng(self.seed);
        let mut dungeon = self.try_generate(fixed_rooms, &mut rng)?;
        for _ in 1..MAX_GENERATE_TRIES {
            if dungeon.is_traversable() {
                return Ok(dungeon);
            }
            dungeon = self.try_generate(fixed_rooms, &mut rng)?;
        }
        if !dungeon.is_traversable() {
            log::warn!(
                "Entrance still cannot reach the exit after {} tries",
                MAX_GENERATE_TRIES
            );
        }

        Ok(dungeon)
    }
}

pub struct Dungeon {
    pub areas: Vec<Area>,
    pub rooms: Vec<Room>,
    pub corridors: Vec<Corridor>,
    pub map: DungeonMap,
    /// Room index pair to corridor index.
    connections: SymmetricMap<usize>,
}

impl Dungeon {
    fn new(areas: Vec<Area>, rooms: Vec<Room>, corridors: Vec<Corridor>, map: DungeonMap) -> Self {
        let mut connections = SymmetricMap::new();
        for (i, corridor) in corridors.iter().enumerate() {
            let (a, b) = corridor.rooms;
            connections.insert(a, b, i);
        }

        Dungeon {
            areas,
            rooms,
            corridors,
            map,
            connections,
        }
    }

    pub fn corridor_between(&self, a: usize, b: usize) -> Option<&Corridor> {
        self.connections.get(a, b).map(|i| &self.corridors[*i])
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_of_type(&self, room_type: RoomType) -> Option<&Room> {
        self.rooms.iter().find(|r| r.room_type == room_type)
    }

    /// True when there is no Entrance/Exit pair or the corridors join them.
    pub fn is_traversable(&self) -> bool {
        let (entrance, exit) = match (
            self.room_of_type(RoomType::Entrance),
            self.room_of_type(RoomType::Exit),
        ) {
            (Some(entrance), Some(exit)) => (entrance.id, exit.id),
            _ => return true,
        };
        let graph = adjacency_graph(self.rooms.len(), self.corridors.iter().map(|c| c.rooms));

        is_reachable(&graph, entrance, exit)
    }

    pub fn light(&mut self, engine: &mut LightingEngine) {
        engine.recompute(&mut self.map);
    }
}
