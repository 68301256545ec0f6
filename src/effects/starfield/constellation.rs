//! Linking stars into constellations.
//!
//! Three policies share one rule set: a link target never already has an
//! incoming link, and no star carries more than [`MAX_LINKS_PER_STAR`] links, so
//! every constellation is a forest of chains and small trees.

use super::generator::{self, ZodiacTemplate};
use super::star::{ConstellationId, Star, StarField, StarId, World, MAX_LINKS_PER_STAR};
use crate::config::LinkPolicy;
use fastrand::Rng;
use glam::Vec2;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

pub const CONSTELLATION_NAMES: [&str; 15] = [
    "Rasputin",
    "Alexa",
    "Pictures",
    "Dictionary",
    "Sound",
    "Bokononism",
    "Demiurge",
    "Who's the Jerk?",
    "Lemniscate",
    "I'll do your homework",
    "let's talk about death",
    "NFTs",
    "let's talk about love",
    "Alexa's cat",
    "Rasputin's dog",
];

/// Accepted link lengths, both ends inclusive. An empty band (`min >= max`)
/// accepts nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceBand {
    pub min: f32,
    pub max: f32,
}

impl DistanceBand {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }

    pub fn contains(&self, distance: f32) -> bool {
        !self.is_empty() && distance >= self.min && distance <= self.max
    }

    /// 0 at `min`, 1 at `max`.
    pub fn normalized(&self, distance: f32) -> f32 {
        if self.is_empty() {
            return 1.0;
        }
        ((distance - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BranchingParams {
    /// Nearest candidates considered per star.
    pub neighbors: usize,
    pub bonus: f32,
}

impl Default for BranchingParams {
    fn default() -> Self {
        Self {
            neighbors: 3,
            bonus: 1.2,
        }
    }
}

/// How a freshly generated group of stars gets linked and named.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub policy: LinkPolicy,
    pub band: DistanceBand,
    pub chain_cap: usize,
    pub branching: BranchingParams,
}

fn is_free(star: &Star) -> bool {
    star.links.is_empty() && !star.has_incoming_link
}

/// Grow a chain from `start`, always stepping to the nearest free star of
/// `pool` inside `band`. Stops when nothing qualifies or the chain holds `cap`
/// stars. Returns the chain including `start`.
pub fn nearest_chain(
    field: &mut StarField,
    world: &World,
    pool: &[StarId],
    start: StarId,
    band: DistanceBand,
    cap: usize,
) -> Vec<StarId> {
    let mut chain = vec![start];
    let mut current = start;

    while chain.len() < cap {
        let Some(from) = field.get(current).map(|s| s.position) else {
            break;
        };

        let next = pool
            .iter()
            .filter(|&&id| id != current && !chain.contains(&id))
            .filter_map(|&id| {
                let star = field.get(id)?;
                if !is_free(star) {
                    return None;
                }
                let d = world.distance(from, star.position);
                band.contains(d).then_some((id, d))
            })
            // min_by keeps the first of equal distances, i.e. pool order
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((next, _)) = next else {
            break;
        };
        if !field.link(current, next) {
            break;
        }
        chain.push(next);
        current = next;
    }

    chain
}

/// Cover `pool` with nearest-neighbour chains, each started from the first
/// still-free star.
pub fn link_chains(
    field: &mut StarField,
    world: &World,
    pool: &[StarId],
    band: DistanceBand,
    cap: usize,
) -> Vec<Vec<StarId>> {
    let mut chains = Vec::new();
    let mut used: HashSet<StarId> = HashSet::new();

    for &start in pool {
        if used.contains(&start) || !field.get(start).is_some_and(is_free) {
            continue;
        }
        let chain = nearest_chain(field, world, pool, start, band, cap.max(1));
        used.extend(chain.iter().copied());
        chains.push(chain);
    }

    chains
}

/// Weighted random links: each star of `sources` considers its `neighbors`
/// nearest `candidates` in `band` and links to each with probability
/// `(1 - normalized distance) * bonus`. Returns the number of links made.
pub fn probabilistic_branching(
    field: &mut StarField,
    world: &World,
    sources: &[StarId],
    candidates: &[StarId],
    band: DistanceBand,
    params: BranchingParams,
    rng: &mut Rng,
) -> usize {
    if band.is_empty() || params.neighbors == 0 {
        return 0;
    }

    // child -> parent, for cycle checks
    let mut parent: HashMap<StarId, StarId> = HashMap::new();
    for &id in sources.iter().chain(candidates) {
        if let Some(star) = field.get(id) {
            for &target in &star.links {
                parent.insert(target, id);
            }
        }
    }

    let mut created = 0;
    for &from in sources {
        let Some(origin) = field.get(from) else {
            continue;
        };
        if origin.links.len() >= MAX_LINKS_PER_STAR {
            continue;
        }
        let from_pos = origin.position;

        let mut nearest: Vec<(StarId, f32)> = candidates
            .iter()
            .filter(|&&id| id != from)
            .filter_map(|&id| {
                let star = field.get(id)?;
                if star.has_incoming_link {
                    return None;
                }
                let d = world.distance(from_pos, star.position);
                band.contains(d).then_some((id, d))
            })
            .collect();
        nearest.sort_by(|a, b| a.1.total_cmp(&b.1));
        nearest.truncate(params.neighbors);

        for (to, d) in nearest {
            if is_ancestor(&parent, from, to) {
                continue;
            }
            let weight = (1.0 - band.normalized(d)) * params.bonus;
            if rng.f32() < weight && field.link(from, to) {
                parent.insert(to, from);
                created += 1;
            }
        }
    }

    created
}

/// Whether `candidate` sits on the parent path above `node`.
fn is_ancestor(parent: &HashMap<StarId, StarId>, node: StarId, candidate: StarId) -> bool {
    let mut cursor = node;
    let mut steps = 0;
    while let Some(&up) = parent.get(&cursor) {
        if up == candidate {
            return true;
        }
        cursor = up;
        steps += 1;
        if steps > parent.len() {
            return true;
        }
    }
    false
}

/// Link `ids` in order: first -> second -> ... -> last.
pub fn strict_chain(field: &mut StarField, ids: &[StarId]) -> usize {
    ids.windows(2).filter(|pair| field.link(pair[0], pair[1])).count()
}

/// Insert freshly generated stars, link them with `options.policy`, name the
/// first root star and record the group.
#[allow(clippy::too_many_arguments)]
pub fn insert_constellation(
    field: &mut StarField,
    world: &World,
    stars: Vec<Star>,
    name: Option<String>,
    options: &BuildOptions,
    rng: &mut Rng,
    tick: u64,
    procedural: bool,
) -> ConstellationId {
    let stars = stars.into_iter().map(|mut s| {
        s.position = world.wrap(s.position);
        s
    });
    let ids = field.extend(stars);

    let links = match options.policy {
        LinkPolicy::Strict => strict_chain(field, &ids),
        LinkPolicy::Chain => link_chains(field, world, &ids, options.band, options.chain_cap)
            .iter()
            .map(|c| c.len() - 1)
            .sum(),
        LinkPolicy::Branching => {
            probabilistic_branching(field, world, &ids, &ids, options.band, options.branching, rng)
        }
    };

    let anchor = ids
        .iter()
        .copied()
        .find(|&id| field.get(id).is_some_and(|s| !s.has_incoming_link));
    if let (Some(anchor), Some(name)) = (anchor, name.as_ref()) {
        if let Some(star) = field.get_mut(anchor) {
            star.name = Some(name.clone());
        }
    }

    debug!(?name, stars = ids.len(), links, policy = ?options.policy, "constellation built");
    field.add_constellation(name, ids, world, tick, procedural)
}

/// A strict 5-10 star chain around `anchor`, named from the pool.
pub fn spawn_named_chain(
    field: &mut StarField,
    world: &World,
    anchor: Vec2,
    spread: f32,
    names: &mut NamePool,
    rng: &mut Rng,
    tick: u64,
) -> ConstellationId {
    let count = generator::constellation_size(rng);
    let stars = generator::constellation_walk(rng, anchor, count, spread);
    let name = names.take(rng);
    let options = BuildOptions {
        policy: LinkPolicy::Strict,
        band: DistanceBand::new(0.0, f32::INFINITY),
        chain_cap: count,
        branching: BranchingParams::default(),
    };
    insert_constellation(field, world, stars, Some(name), &options, rng, tick, true)
}

/// Insert a fixed template with its authored links.
pub fn insert_template(
    field: &mut StarField,
    world: &World,
    template: &ZodiacTemplate,
    canvas: Vec2,
    rng: &mut Rng,
) -> ConstellationId {
    let mut stars = generator::template_stars(rng, template, canvas);
    for star in &mut stars {
        star.position = world.wrap(star.position);
    }
    if let Some(first) = stars.first_mut() {
        first.name = Some(template.name.to_string());
    }
    let ids = field.extend(stars);

    for (i, &(_, _, targets)) in template.points.iter().enumerate() {
        for &t in targets {
            if let Some(&to) = ids.get(t) {
                field.link_unchecked(ids[i], to);
            }
        }
    }

    field.add_constellation(Some(template.name.to_string()), ids, world, 0, false)
}

/// Constellation names handed out in order, without repeats while any remain.
#[derive(Debug, Clone)]
pub struct NamePool {
    names: VecDeque<String>,
}

impl Default for NamePool {
    fn default() -> Self {
        Self::new(CONSTELLATION_NAMES.iter().map(|s| s.to_string()))
    }
}

impl NamePool {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.names.len()
    }

    /// Next pooled name, or a made-up one once the pool is dry.
    pub fn take(&mut self, rng: &mut Rng) -> String {
        self.names.pop_front().unwrap_or_else(|| generate_name(rng))
    }

    /// Return a freed name to the back of the queue.
    pub fn give_back(&mut self, name: String) {
        if !self.names.contains(&name) {
            self.names.push_back(name);
        }
    }
}

/// Syllable-built name such as "Threxion".
pub fn generate_name(rng: &mut Rng) -> String {
    const CONSONANTS: &[&str] = &[
        "b", "c", "d", "f", "g", "h", "j", "k", "l", "m", "n", "p", "r", "s", "t", "v", "w", "x",
        "z", "th", "ch", "sh", "ph", "kr", "tr", "dr", "br", "gr",
    ];
    const VOWELS: &[&str] = &["a", "e", "i", "o", "u", "ae", "ei", "ou", "ia", "eo"];
    const ENDINGS: &[&str] = &[
        "or", "an", "en", "on", "ar", "is", "us", "os", "as", "ax", "ix", "ex", "yx", "ion", "ius",
        "ara", "iel", "ath", "oth", "eth",
    ];

    let mut name = String::new();
    let syllables = if rng.f32() < 0.7 { 2 } else { 3 };

    for i in 0..syllables {
        if i == 0 || rng.f32() > 0.3 {
            name.push_str(CONSONANTS[rng.usize(..CONSONANTS.len())]);
        }
        name.push_str(VOWELS[rng.usize(..VOWELS.len())]);
        if i < syllables - 1 && rng.f32() > 0.6 {
            name.push_str(CONSONANTS[rng.usize(..CONSONANTS.len())]);
        }
    }
    if rng.f32() > 0.7 {
        name.push_str(ENDINGS[rng.usize(..ENDINGS.len())]);
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

/// Route segment for a constellation name: lowercase, alphanumerics only.
pub fn slugify(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
