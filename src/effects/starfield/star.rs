use crate::color::Rgba;
use glam::Vec2;
use std::collections::HashMap;

/// Most outgoing links a single star may carry.
pub const MAX_LINKS_PER_STAR: usize = 3;

/// Opaque star identity. Links refer to ids, never to vector positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StarId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstellationId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarKind {
    MilkyWay,
    Background,
    Constellation,
    Spark,
}

#[derive(Debug, Clone)]
pub struct Star {
    pub id: StarId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub brightness: f32,
    pub intensity: f32,
    pub color: Rgba,
    /// Halo colour; the core colour is used when absent.
    pub glow: Option<Rgba>,
    pub kind: StarKind,
    pub is_main: bool,
    pub links: Vec<StarId>,
    pub has_incoming_link: bool,
    pub name: Option<String>,
    pub constellation: Option<ConstellationId>,
    /// Remaining ticks for short-lived stars.
    pub life: Option<u32>,
    pub twinkle_phase: f32,
}

impl Star {
    /// Star with no links or membership yet. The id is assigned on insertion.
    pub fn new(kind: StarKind, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id: StarId(0),
            position,
            velocity,
            size: 1.0,
            brightness: 1.0,
            intensity: 1.0,
            color: Rgba::WHITE,
            glow: None,
            kind,
            is_main: false,
            links: Vec::new(),
            has_incoming_link: false,
            name: None,
            constellation: None,
            life: None,
            twinkle_phase: 0.0,
        }
    }

    /// Constellation members and main stars get a halo.
    pub fn glows(&self) -> bool {
        self.is_main || self.kind == StarKind::Constellation
    }
}

/// A named group of linked stars.
#[derive(Debug, Clone)]
pub struct Constellation {
    pub id: ConstellationId,
    pub name: Option<String>,
    pub members: Vec<StarId>,
    /// Member centroid recorded when the group was built.
    pub centroid: Vec2,
    pub created_tick: u64,
    /// Spawned while running; only these may be evicted.
    pub procedural: bool,
}

/// Toroidal world bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct World {
    pub width: f32,
    pub height: f32,
}

impl World {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Wrap a point into `[0, width) x [0, height)`.
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(wrap_axis(p.x, self.width), wrap_axis(p.y, self.height))
    }

    /// Shortest displacement from `from` to `to` across the wrap.
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            shortest_axis(to.x - from.x, self.width),
            shortest_axis(to.y - from.y, self.height),
        )
    }

    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length()
    }
}

pub(crate) fn wrap_axis(v: f32, size: f32) -> f32 {
    let w = v.rem_euclid(size);
    // rem_euclid can round up to `size` for tiny negative inputs
    if w >= size || !w.is_finite() { 0.0 } else { w }
}

fn shortest_axis(d: f32, size: f32) -> f32 {
    let d = d.rem_euclid(size);
    if d > size / 2.0 { d - size } else { d }
}

/// Every star of a scene plus the constellation records that group them.
#[derive(Debug, Clone)]
pub struct StarField {
    stars: Vec<Star>,
    index: HashMap<StarId, usize>,
    constellations: Vec<Constellation>,
    next_star: u64,
    next_constellation: u64,
}

impl Default for StarField {
    fn default() -> Self {
        Self::new()
    }
}

impl StarField {
    pub fn new() -> Self {
        Self {
            stars: Vec::new(),
            index: HashMap::new(),
            constellations: Vec::new(),
            next_star: 1,
            next_constellation: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn stars_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }

    pub fn get(&self, id: StarId) -> Option<&Star> {
        self.index.get(&id).map(|&i| &self.stars[i])
    }

    pub fn get_mut(&mut self, id: StarId) -> Option<&mut Star> {
        self.index.get(&id).map(|&i| &mut self.stars[i])
    }

    pub fn contains(&self, id: StarId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn insert(&mut self, mut star: Star) -> StarId {
        let id = StarId(self.next_star);
        self.next_star += 1;
        star.id = id;
        self.index.insert(id, self.stars.len());
        self.stars.push(star);
        id
    }

    pub fn extend(&mut self, stars: impl IntoIterator<Item = Star>) -> Vec<StarId> {
        stars.into_iter().map(|s| self.insert(s)).collect()
    }

    /// Directed link `from -> to`, refused when the target already has an
    /// incoming link, `from` is full, either id is unknown, or it is a self link.
    pub fn link(&mut self, from: StarId, to: StarId) -> bool {
        if from == to {
            return false;
        }
        match (self.get(from), self.get(to)) {
            (Some(src), Some(dst))
                if src.links.len() < MAX_LINKS_PER_STAR && !dst.has_incoming_link => {}
            _ => return false,
        }
        self.attach(from, to);
        true
    }

    /// Authored link for fixed templates; only identity and capacity are checked.
    pub fn link_unchecked(&mut self, from: StarId, to: StarId) -> bool {
        if from == to || !self.contains(to) {
            return false;
        }
        match self.get(from) {
            Some(src) if src.links.len() < MAX_LINKS_PER_STAR => {}
            _ => return false,
        }
        self.attach(from, to);
        true
    }

    fn attach(&mut self, from: StarId, to: StarId) {
        if let Some(src) = self.get_mut(from) {
            src.links.push(to);
        }
        if let Some(dst) = self.get_mut(to) {
            dst.has_incoming_link = true;
        }
    }

    pub fn constellations(&self) -> &[Constellation] {
        &self.constellations
    }

    pub fn constellation(&self, id: ConstellationId) -> Option<&Constellation> {
        self.constellations.iter().find(|c| c.id == id)
    }

    /// Record a group over existing stars and tag its members.
    pub fn add_constellation(
        &mut self,
        name: Option<String>,
        members: Vec<StarId>,
        world: &World,
        created_tick: u64,
        procedural: bool,
    ) -> ConstellationId {
        let id = ConstellationId(self.next_constellation);
        self.next_constellation += 1;

        let centroid = self.centroid(&members, world);
        for &member in &members {
            if let Some(star) = self.get_mut(member) {
                star.constellation = Some(id);
            }
        }
        self.constellations.push(Constellation {
            id,
            name,
            members,
            centroid,
            created_tick,
            procedural,
        });
        id
    }

    /// Wrap-aware mean position, measured from the first member.
    fn centroid(&self, members: &[StarId], world: &World) -> Vec2 {
        let mut points = members.iter().filter_map(|&m| self.get(m)).map(|s| s.position);
        let Some(origin) = points.next() else {
            return Vec2::ZERO;
        };
        let (sum, count) = points.fold((Vec2::ZERO, 1.0), |(sum, n), p| {
            (sum + world.delta(origin, p), n + 1.0)
        });
        world.wrap(origin + sum / count)
    }

    /// Drop a constellation and its member stars. Returns the freed name.
    pub fn remove_constellation(&mut self, id: ConstellationId) -> Option<String> {
        let pos = self.constellations.iter().position(|c| c.id == id)?;
        let constellation = self.constellations.remove(pos);
        self.stars.retain(|s| s.constellation != Some(id));
        self.reindex();
        constellation.name
    }

    /// Keep only stars matching `keep`; returns how many were removed.
    pub fn retain(&mut self, keep: impl FnMut(&Star) -> bool) -> usize {
        let before = self.stars.len();
        self.stars.retain(keep);
        let removed = before - self.stars.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, star) in self.stars.iter().enumerate() {
            self.index.insert(star.id, i);
        }
    }

    /// Count of incoming links per star id, for consistency checks.
    pub fn incoming_counts(&self) -> HashMap<StarId, usize> {
        let mut counts = HashMap::new();
        for star in &self.stars {
            for &target in &star.links {
                *counts.entry(target).or_insert(0) += 1;
            }
        }
        counts
    }
}
