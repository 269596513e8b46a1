//! Corridors between rooms: which pairs get one, and the tiles each one covers.

use crate::{
    error::{invalid_config, Result},
    extent::{Extent, Point},
    graph::{
        adjacency_graph, bypasses_constraints, candidate_edges, is_reachable,
        minimum_spanning_tree, Edge,
    },
    room::{DesignCategory, Room, RoomType, Tile},
    sampling::sample_inclusive,
    symmetric_map::SymmetricMap,
};

use fnv::FnvHashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CorridorSpec {
    pub width: i32,
    pub max_bend_count: u32,
    /// Chance to keep each candidate edge that the spanning tree left out.
    pub extra_connection_probability: f64,
    pub max_connection_distance: f32,
    /// Chance to route an L-shaped corridor through extra random waypoints instead.
    #[serde(default)]
    pub winding_probability: f64,
}

impl Default for CorridorSpec {
    fn default() -> Self {
        CorridorSpec {
            width: 1,
            max_bend_count: 2,
            extra_connection_probability: 0.1,
            max_connection_distance: 50.0,
            winding_probability: 0.0,
        }
    }
}

impl CorridorSpec {
    pub fn validate(&self) -> Result<()> {
        if self.width < 1 {
            return Err(invalid_config(format!(
                "corridor width must be positive, got {}",
                self.width
            )));
        }
        for (name, p) in [
            ("extra_connection_probability", self.extra_connection_probability),
            ("winding_probability", self.winding_probability),
        ]
        .iter()
        {
            if !(0.0..=1.0).contains(p) {
                return Err(invalid_config(format!(
                    "{} must lie in [0, 1], got {}",
                    name, p
                )));
            }
        }
        if !(self.max_connection_distance >= 0.0) {
            return Err(invalid_config(format!(
                "max_connection_distance must be non-negative, got {}",
                self.max_connection_distance
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Corridor {
    pub start: Point,
    pub end: Point,
    pub width: i32,
    pub bend_count: u32,
    pub is_secret: bool,
    /// Centerline cells from `start` to `end`, each a 4-neighbour of the last.
    pub path: Vec<Point>,
    pub tiles: Vec<(Point, Tile)>,
    /// Indices of the two connected rooms.
    pub rooms: (usize, usize),
}

impl Corridor {
    pub fn new(
        start: Point,
        end: Point,
        width: i32,
        bend_count: u32,
        is_secret: bool,
        rooms: (usize, usize),
        rng: &mut impl Rng,
    ) -> Self {
        let path = route(&waypoints(start, end, bend_count, rng));
        let tiles = stamp_tiles(&path, width, is_secret, rng);

        Corridor {
            start,
            end,
            width,
            bend_count,
            is_secret,
            path,
            tiles,
            rooms,
        }
    }

    /// Joins two touching or overlapping rooms through the cells where they meet.
    fn through_contact(
        a: &Room,
        b: &Room,
        width: i32,
        is_secret: bool,
        rooms: (usize, usize),
        rng: &mut impl Rng,
    ) -> Option<Self> {
        let contact = a.extent.contact_point(&b.extent)?;
        let mut path = vec![contact];
        for (inside, other) in [(&a.extent, &b.extent), (&b.extent, &a.extent)].iter() {
            if inside.contains_world(&contact) && !other.contains_world(&contact) {
                if let Some(across) = contact
                    .neighbors4()
                    .iter()
                    .find(|n| other.contains_world(n))
                {
                    path.push(*across);
                }
            }
        }
        let tiles = stamp_tiles(&path, width, is_secret, rng);

        Some(Corridor {
            start: contact,
            end: path[path.len() - 1],
            width,
            bend_count: 0,
            is_secret,
            path,
            tiles,
            rooms,
        })
    }
}

/// The corners a corridor passes through, `start` and `end` included.
fn waypoints(start: Point, end: Point, bend_count: u32, rng: &mut impl Rng) -> Vec<Point> {
    match bend_count {
        0 => vec![start, end],
        1 => {
            let corner = if rng.gen_bool(0.5) {
                Point::new(end.x, start.y)
            } else {
                Point::new(start.x, end.y)
            };
            vec![start, corner, end]
        }
        n => {
            let bounds = Extent::new(
                start.x.min(end.x),
                start.y.min(end.y),
                (start.x - end.x).abs() + 1,
                (start.y - end.y).abs() + 1,
            );
            let mut points = vec![start];
            for _ in 1..n {
                points.push(Point::new(
                    sample_inclusive(rng, bounds.min_x(), bounds.max_x() - 1),
                    sample_inclusive(rng, bounds.min_y(), bounds.max_y() - 1),
                ));
            }
            points.push(end);
            points
        }
    }
}

/// Axis-aligned stepping through `waypoints`: x first, then y, on every leg.
fn route(waypoints: &[Point]) -> Vec<Point> {
    let mut path: Vec<Point> = waypoints.first().copied().into_iter().collect();
    for target in waypoints.iter().skip(1) {
        let mut current = match path.last() {
            Some(p) => *p,
            None => break,
        };
        while current.x != target.x {
            current.x += (target.x - current.x).signum();
            path.push(current);
        }
        while current.y != target.y {
            current.y += (target.y - current.y).signum();
            path.push(current);
        }
    }

    path
}

/// A square of side `2 * (width / 2) + 1` around each path cell, each cell stamped once.
fn stamp_tiles(
    path: &[Point],
    width: i32,
    is_secret: bool,
    rng: &mut impl Rng,
) -> Vec<(Point, Tile)> {
    let (category, walkable) = if is_secret {
        (DesignCategory::SecretCorridor, false)
    } else {
        (DesignCategory::Corridor, true)
    };
    let half = width / 2;

    let mut seen = FnvHashSet::default();
    let mut tiles = Vec::new();
    for p in path.iter() {
        for dy in -half..=half {
            for dx in -half..=half {
                let q = Point::new(p.x + dx, p.y + dy);
                if seen.insert(q) {
                    let mut tile = Tile::default();
                    tile.walkable = walkable;
                    tile.set_category(category, rng);
                    tiles.push((q, tile));
                }
            }
        }
    }

    tiles
}

pub struct CorridorGraphBuilder<'a> {
    spec: &'a CorridorSpec,
}

impl<'a> CorridorGraphBuilder<'a> {
    pub fn new(spec: &'a CorridorSpec) -> Self {
        CorridorGraphBuilder { spec }
    }

    /// Spanning tree over the room centers, extra edges by chance, then a guaranteed path from
    /// the Entrance to the Exit.
    pub fn connect(&self, rooms: &[Room], rng: &mut impl Rng) -> Vec<Corridor> {
        let edges = candidate_edges(rooms, self.spec.max_connection_distance);
        let tree = minimum_spanning_tree(rooms.len(), &edges);
        log::debug!(
            "{} candidate edges, {} in spanning tree",
            edges.len(),
            tree.len()
        );

        let mut in_tree = vec![false; edges.len()];
        for i in tree.iter() {
            in_tree[*i] = true;
        }
        let extra = self
            .spec
            .extra_connection_probability
            .max(0.0)
            .min(1.0);
        let mut accepted = tree;
        for (i, _) in edges.iter().enumerate().filter(|(i, _)| !in_tree[*i]) {
            if rng.gen_bool(extra) {
                accepted.push(i);
            }
        }

        let mut connected = SymmetricMap::new();
        let mut corridors = Vec::new();
        for i in accepted {
            let Edge { a, b, .. } = edges[i];
            if connected.contains(a, b) {
                continue;
            }
            let ignore = bypasses_constraints(&rooms[a], &rooms[b]);
            if let Some(corridor) = self.create_corridor(rooms, a, b, ignore, rng) {
                connected.insert(a, b, corridors.len());
                corridors.push(corridor);
            }
        }
        log::debug!("Built {} corridors", corridors.len());

        self.ensure_entrance_exit_connection(rooms, &mut corridors, rng);
        log::debug!("{} corridors after repair", corridors.len());

        corridors
    }

    /// `None` when the pair breaks the distance or bend limits and `ignore_constraints` is off.
    pub fn create_corridor(
        &self,
        rooms: &[Room],
        a: usize,
        b: usize,
        ignore_constraints: bool,
        rng: &mut impl Rng,
    ) -> Option<Corridor> {
        let (ra, rb) = (&rooms[a], &rooms[b]);
        let is_secret = ra.room_type == RoomType::Secret || rb.room_type == RoomType::Secret;

        if ra.extent.overlaps(&rb.extent) || ra.extent.is_adjacent(&rb.extent) {
            let width = self.spec.width;
            return Corridor::through_contact(ra, rb, width, is_secret, (a, b), rng);
        }

        if !ignore_constraints && ra.center_distance(rb) > self.spec.max_connection_distance {
            return None;
        }

        let (start, end) = closest_doorways(ra, rb);
        let mut bend_count = if start.x == end.x || start.y == end.y {
            0
        } else {
            1
        };
        let winding = self.spec.winding_probability.max(0.0).min(1.0);
        if bend_count == 1 && self.spec.max_bend_count >= 2 && rng.gen_bool(winding) {
            bend_count = rng.gen_range(2, self.spec.max_bend_count + 1);
        }
        if !ignore_constraints && bend_count > self.spec.max_bend_count {
            return None;
        }

        Some(Corridor::new(
            start,
            end,
            self.spec.width,
            bend_count,
            is_secret,
            (a, b),
            rng,
        ))
    }

    /// Adds a corridor between the first Entrance and first Exit room when no chain of
    /// corridors joins them. Returns true if one was added.
    pub fn ensure_entrance_exit_connection(
        &self,
        rooms: &[Room],
        corridors: &mut Vec<Corridor>,
        rng: &mut impl Rng,
    ) -> bool {
        let find = |t: RoomType| rooms.iter().position(|r| r.room_type == t);
        let (entrance, exit) = match (find(RoomType::Entrance), find(RoomType::Exit)) {
            (Some(entrance), Some(exit)) => (entrance, exit),
            _ => return false,
        };

        let graph = adjacency_graph(rooms.len(), corridors.iter().map(|c| c.rooms));
        if is_reachable(&graph, entrance, exit) {
            return false;
        }

        log::warn!(
            "Entrance room {} cannot reach exit room {}; forcing a corridor",
            entrance,
            exit
        );
        match self.create_corridor(rooms, entrance, exit, true, rng) {
            Some(corridor) => {
                corridors.push(corridor);
                true
            }
            None => false,
        }
    }
}

/// The nearest pair of doorways across the two rooms; centers stand in for rooms without any.
fn closest_doorways(a: &Room, b: &Room) -> (Point, Point) {
    let or_center = |r: &Room| {
        let doors = r.doorway_positions();
        if doors.is_empty() {
            vec![r.center()]
        } else {
            doors
        }
    };
    let (from, to) = (or_center(a), or_center(b));

    let mut best = (from[0], to[0]);
    let mut best_distance = std::f32::MAX;
    for p in from.iter() {
        for q in to.iter() {
            let d = p.distance(q);
            if d < best_distance {
                best_distance = d;
                best = (*p, *q);
            }
        }
    }

    best
}
