//! Per-tile illumination by discrete ray marching.
//!
//! Every light reaches the tiles within its radius along a Bresenham line. The cells strictly
//! between source and target attenuate the ray by their transparency, and depending on the
//! [`OcclusionPolicy`] a wall in between blocks it outright. A tile's contribution from one
//! light is `color * intensity * attenuation * (1 - distance / radius)`.

use crate::{
    extent::Point,
    map::{DungeonMap, TileType},
};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul};

/// Below this a ray counts as fully blocked.
pub const BLOCKED_ATTENUATION: f32 = 0.01;
pub const DARK_THRESHOLD: f32 = 0.3;
pub const OVERBRIGHT_THRESHOLD: f32 = 1.0;
/// Share of the unlit color kept by a dark tile.
pub const DARK_FACTOR: f32 = 0.2;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color::new(r, g, b, 1.0)
    }

    pub fn max_channel(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    /// Moves the RGB channels toward `other` by `t`; alpha stays.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a,
        )
    }

    pub fn clamped(self) -> Color {
        let c = |v: f32| v.max(0.0).min(1.0);

        Color::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }
}

/// RGB only.
impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        *self = *self + rhs;
    }
}

/// RGB only.
impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, s: f32) -> Color {
        Color::new(self.r * s, self.g * s, self.b * s, self.a)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BrightnessLevel {
    Dark,
    Normal,
    Overbright,
}

impl Default for BrightnessLevel {
    fn default() -> Self {
        BrightnessLevel::Normal
    }
}

/// Tier of `accumulated` and the color a tile with unlit color `initial` shows under it.
pub fn shade(
    accumulated: Color,
    initial: Color,
    allow_overbright: bool,
) -> (BrightnessLevel, Color) {
    let level = accumulated.max_channel();
    let (tier, color) = if level < DARK_THRESHOLD {
        (BrightnessLevel::Dark, initial * DARK_FACTOR)
    } else if level < OVERBRIGHT_THRESHOLD || !allow_overbright {
        (BrightnessLevel::Normal, initial.lerp(accumulated, 0.5))
    } else {
        (
            BrightnessLevel::Overbright,
            initial.lerp(accumulated, 1.0).lerp(Color::WHITE, 0.5),
        )
    };

    (tier, color.clamped())
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OcclusionPolicy {
    /// Transparency attenuates and any wall in between blocks.
    Combined,
    TransparencyOnly,
    HardWalls,
}

impl Default for OcclusionPolicy {
    fn default() -> Self {
        OcclusionPolicy::Combined
    }
}

impl OcclusionPolicy {
    fn attenuates(self) -> bool {
        self != OcclusionPolicy::HardWalls
    }

    fn walls_block(self) -> bool {
        self != OcclusionPolicy::TransparencyOnly
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LightSource {
    pub position: Point,
    pub color: Color,
    pub intensity: f32,
    pub radius: f32,
    /// Static lights have their reach cached after the first pass.
    pub is_static: bool,
    pub can_overbright: bool,
}

impl Default for LightSource {
    fn default() -> Self {
        LightSource {
            position: Point::default(),
            color: Color::WHITE,
            intensity: 1.0,
            radius: 5.0,
            is_static: true,
            can_overbright: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LightId(usize);

/// Tile index and the color-independent factor one light delivers there.
pub type Influence = Vec<(usize, f32)>;

#[derive(Default)]
pub struct LightingEngine {
    policy: OcclusionPolicy,
    lights: Vec<(LightId, LightSource)>,
    next_id: usize,
    static_cache: FnvHashMap<LightId, Influence>,
    /// Revision of the map the cache was built for.
    cache_revision: u64,
}

impl LightingEngine {
    pub fn new(policy: OcclusionPolicy) -> Self {
        LightingEngine {
            policy,
            ..Default::default()
        }
    }

    pub fn policy(&self) -> OcclusionPolicy {
        self.policy
    }

    pub fn add_light(&mut self, source: LightSource) -> LightId {
        let id = LightId(self.next_id);
        self.next_id += 1;
        self.lights.push((id, source));

        id
    }

    pub fn light(&self, id: LightId) -> Option<&LightSource> {
        self.lights.iter().find(|(i, _)| *i == id).map(|(_, l)| l)
    }

    /// Returns false for an unknown light.
    pub fn move_light(&mut self, id: LightId, position: Point) -> bool {
        match self.lights.iter_mut().find(|(i, _)| *i == id) {
            Some((_, light)) => {
                light.position = position;
                self.static_cache.remove(&id);
                true
            }
            None => false,
        }
    }

    pub fn remove_light(&mut self, id: LightId) -> Option<LightSource> {
        let i = self.lights.iter().position(|(l, _)| *l == id)?;
        self.static_cache.remove(&id);

        Some(self.lights.remove(i).1)
    }

    /// True while any light moves, i.e. the map needs a pass every tick.
    pub fn needs_update(&self) -> bool {
        self.lights.iter().any(|(_, l)| !l.is_static)
    }

    /// Drops every cached static reach; call after the map's tiles change.
    pub fn invalidate_cache(&mut self) {
        self.static_cache.clear();
    }

    /// Relights `map` from scratch: every tile's accumulated light is reset, every source is
    /// reapplied, and the tiers and display colors are written back in one final sweep.
    pub fn recompute(&mut self, map: &mut DungeonMap) {
        if map.revision() != self.cache_revision {
            self.static_cache.clear();
            self.cache_revision = map.revision();
        }

        let n = map.tiles().len();
        let mut accumulated = vec![Color::new(0.0, 0.0, 0.0, 1.0); n];
        let mut overbright = vec![false; n];
        let policy = self.policy;
        for (id, light) in self.lights.iter() {
            let fresh;
            let influence: &Influence = if light.is_static {
                self.static_cache
                    .entry(*id)
                    .or_insert_with(|| compute_influence(map, light, policy))
            } else {
                fresh = compute_influence(map, light, policy);
                &fresh
            };

            let tint = light.color * light.intensity;
            for (i, factor) in influence.iter() {
                accumulated[*i] += tint * *factor;
                if light.can_overbright {
                    overbright[*i] = true;
                }
            }
        }

        for (i, tile) in map.tiles_mut().iter_mut().enumerate() {
            let (brightness, display) = shade(accumulated[i], tile.initial_color, overbright[i]);
            tile.light = accumulated[i];
            tile.brightness = brightness;
            tile.display_color = display;
        }
        log::debug!("Lit map with {} lights", self.lights.len());
    }
}

/// Every tile `light` reaches, with its attenuation and radial falloff folded together.
pub fn compute_influence(
    map: &DungeonMap,
    light: &LightSource,
    policy: OcclusionPolicy,
) -> Influence {
    let mut influence = Vec::new();
    if !(light.radius > 0.0) || !map.contains(&light.position) {
        return influence;
    }

    // No tile lies farther than the map's own extent.
    let reach = (light.radius.ceil() as i32).min(map.width().max(map.height()));
    let origin = light.position;
    let (min_x, max_x) = ((origin.x - reach).max(0), (origin.x + reach).min(map.width() - 1));
    let (min_y, max_y) = ((origin.y - reach).max(0), (origin.y + reach).min(map.height() - 1));
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let target = Point::new(x, y);
            let index = match map.index(&target) {
                Some(i) => i,
                None => continue,
            };
            let distance = origin.distance(&target);
            if distance > light.radius {
                continue;
            }
            let falloff = 1.0 - distance / light.radius;
            let factor = ray_attenuation(map, origin, target, policy) * falloff;
            if factor > 0.0 {
                influence.push((index, factor));
            }
        }
    }

    influence
}

/// Product of the transparencies strictly between `from` and `to`, or zero once blocked.
pub fn ray_attenuation(map: &DungeonMap, from: Point, to: Point, policy: OcclusionPolicy) -> f32 {
    let line = bresenham_line(from, to);
    let mut attenuation = 1.0;
    for p in line.iter().skip(1).take(line.len().saturating_sub(2)) {
        let tile = match map.get(p) {
            Some(t) => t,
            None => return 0.0,
        };
        if policy.walls_block() && tile.tile_type == TileType::Wall {
            return 0.0;
        }
        if policy.attenuates() {
            attenuation *= tile.transparency();
            if attenuation < BLOCKED_ATTENUATION {
                return 0.0;
            }
        }
    }

    attenuation
}

/// Integer line from `from` to `to`, both ends included.
pub fn bresenham_line(from: Point, to: Point) -> Vec<Point> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = (to.x - from.x).signum();
    let sy = (to.y - from.y).signum();

    let mut points = Vec::with_capacity((dx - dy + 1) as usize);
    let mut current = from;
    let mut error = dx + dy;
    loop {
        points.push(current);
        if current == to {
            break;
        }
        let e2 = 2 * error;
        if e2 >= dy {
            error += dy;
            current.x += sx;
        }
        if e2 <= dx {
            error += dx;
            current.y += sy;
        }
    }

    points
}
