//! The explorer scene: a toroidal world larger than the screen, panned by
//! drag or arrow keys, with named constellations that navigate when clicked.

pub mod constellation;
pub mod generator;
pub mod motion;
pub mod render;
pub mod star;
pub mod viewport;

use super::{Effect, scene_rng, usable_canvas};
use crate::config::{Config, SceneConfig};
use crate::surface::Surface;
use constellation::{BranchingParams, BuildOptions, DistanceBand, NamePool};
use fastrand::Rng;
use glam::Vec2;
use motion::Motion;
use render::{RenderStats, Renderer};
use star::{ConstellationId, StarField, World};
use tracing::{debug, info};
use viewport::{InputEvent, Navigator, Projection, Viewport};

/// Frames between periodic render stat logs.
const STATS_LOG_INTERVAL: u64 = 600;

pub struct StarfieldEffect {
    scene: SceneConfig,
    edge_buffer: f32,
    cull_margin: f32,
    rng: Rng,
    field: StarField,
    world: World,
    canvas: Vec2,
    viewport: Viewport,
    motion: Motion,
    renderer: Renderer,
    names: NamePool,
    options: BuildOptions,
    tick: u64,
    frames: u64,
    last_stats: RenderStats,
}

impl StarfieldEffect {
    fn world_for(scene: &SceneConfig, edge_buffer: f32, canvas: Vec2) -> World {
        let size = canvas * scene.world_scale + Vec2::splat(edge_buffer);
        World::new(size.x, size.y)
    }

    fn populate(&mut self) {
        let (w, h) = (self.world.width, self.world.height);
        self.field
            .extend(generator::milky_way(&mut self.rng, self.scene.milky_way_stars, w, h));
        self.field
            .extend(generator::background(&mut self.rng, self.scene.background_stars, w, h));

        if self.scene.zodiac {
            for template in &generator::ZODIAC {
                constellation::insert_template(
                    &mut self.field,
                    &self.world,
                    template,
                    self.canvas,
                    &mut self.rng,
                );
            }
        }

        for _ in 0..self.scene.initial_constellations {
            let anchor = Vec2::new(self.rng.f32() * w, self.rng.f32() * h);
            let count = generator::constellation_size(&mut self.rng);
            let stars = generator::constellation_walk(
                &mut self.rng,
                anchor,
                count,
                self.scene.constellation_spread,
            );
            let name = self.names.take(&mut self.rng);
            constellation::insert_constellation(
                &mut self.field,
                &self.world,
                stars,
                Some(name),
                &self.options,
                &mut self.rng,
                self.tick,
                false,
            );
        }

        info!(
            stars = self.field.len(),
            constellations = self.field.constellations().len(),
            world_width = w,
            world_height = h,
            policy = ?self.options.policy,
            "starfield populated"
        );
    }

    pub fn projection(&self) -> Projection {
        Projection {
            world: self.world,
            camera: self.viewport.offset(),
            canvas: self.canvas,
            margin: self.cull_margin,
        }
    }

    fn constellation_visible(&self, id: ConstellationId, projection: &Projection) -> bool {
        self.field.constellation(id).is_some_and(|c| {
            c.members
                .iter()
                .filter_map(|&m| self.field.get(m))
                .any(|s| projection.visible(projection.screen(s.position)))
        })
    }

    /// Oldest procedural constellation, off-screen ones first.
    fn eviction_candidate(&self) -> Option<ConstellationId> {
        let projection = self.projection();
        self.field
            .constellations()
            .iter()
            .filter(|c| c.procedural)
            .map(|c| (self.constellation_visible(c.id, &projection), c.created_tick, c.id))
            .min_by_key(|&(visible, tick, _)| (visible, tick))
            .map(|(_, _, id)| id)
    }

    /// Evict until `needed` more stars fit under the live cap.
    fn make_room(&mut self, needed: usize) -> bool {
        while self.field.len() + needed > self.scene.max_live_stars {
            let Some(victim) = self.eviction_candidate() else {
                return false;
            };
            let before = self.field.len();
            if let Some(name) = self.field.remove_constellation(victim) {
                debug!(%name, freed = before - self.field.len(), "constellation evicted");
                self.names.give_back(name);
            }
        }
        true
    }

    /// Spawn a named chain somewhere around the current view.
    pub fn spawn_near_view(&mut self) -> Option<ConstellationId> {
        if !self.make_room(generator::MAX_CONSTELLATION_STARS) {
            debug!(live = self.field.len(), "spawn skipped: nothing to evict");
            return None;
        }
        let jitter = Vec2::new(self.rng.f32() * 3.0 - 1.0, self.rng.f32() * 3.0 - 1.0);
        let anchor = self.viewport.offset() + jitter * self.canvas;
        let id = constellation::spawn_named_chain(
            &mut self.field,
            &self.world,
            anchor,
            self.scene.constellation_spread,
            &mut self.names,
            &mut self.rng,
            self.tick,
        );
        debug!(
            name = ?self.field.constellation(id).and_then(|c| c.name.as_deref()),
            live = self.field.len(),
            "constellation spawned"
        );
        Some(id)
    }

    pub fn field(&self) -> &StarField {
        &self.field
    }

    pub fn world(&self) -> World {
        self.world
    }

    pub fn canvas(&self) -> Vec2 {
        self.canvas
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }
}

impl Effect for StarfieldEffect {
    fn new(config: &Config, width: f32, height: f32) -> Option<Self> {
        if !usable_canvas(width, height) {
            debug!(width, height, "no canvas, explorer idle");
            return None;
        }
        let scene = config.scene.clone();
        let canvas = Vec2::new(width, height);
        let world = Self::world_for(&scene, config.motion.edge_buffer, canvas);
        let mut rng = scene_rng(config);
        let renderer = Renderer::new(
            config.render.clear,
            config.render.background,
            rng.u32(..),
        );
        let options = BuildOptions {
            policy: scene.link_policy,
            band: DistanceBand::new(scene.min_link_distance, scene.max_link_distance),
            chain_cap: scene.chain_cap,
            branching: BranchingParams {
                neighbors: scene.branching_neighbors,
                bonus: scene.constellation_bonus,
            },
        };

        let mut effect = Self {
            scene,
            edge_buffer: config.motion.edge_buffer,
            cull_margin: config.render.cull_margin,
            rng,
            field: StarField::new(),
            world,
            canvas,
            viewport: Viewport::new(&config.viewport),
            motion: Motion::from(&config.motion),
            renderer,
            names: NamePool::default(),
            options,
            tick: 0,
            frames: 0,
            last_stats: RenderStats::default(),
        };
        effect.populate();
        Some(effect)
    }

    fn update(&mut self, dt: f32) {
        self.tick += 1;
        self.viewport.tick(&self.world);
        self.motion.integrate(&mut self.field, &self.world);
        self.renderer.advance(dt);

        if self.rng.f32() < self.scene.spawn_chance {
            self.spawn_near_view();
        }
    }

    fn render(&mut self, surface: &mut dyn Surface) {
        let projection = self.projection();
        self.last_stats = self.renderer.draw(surface, &self.field, &projection);
        self.frames += 1;
        if self.frames % STATS_LOG_INTERVAL == 0 {
            debug!(
                drawn = self.last_stats.stars,
                links = self.last_stats.links,
                labels = self.last_stats.labels,
                culled = self.last_stats.culled,
                "frame stats"
            );
        }
    }

    fn handle_input(&mut self, event: &InputEvent, navigator: &mut dyn Navigator) {
        let projection = self.projection();
        self.viewport.handle(event, &self.field, &projection, navigator);
    }

    fn resize(&mut self, width: f32, height: f32) {
        if !usable_canvas(width, height) {
            return;
        }
        self.canvas = Vec2::new(width, height);
        // The world only grows, so every position stays inside it.
        let wanted = Self::world_for(&self.scene, self.edge_buffer, self.canvas);
        if wanted.width > self.world.width || wanted.height > self.world.height {
            self.world = World::new(
                wanted.width.max(self.world.width),
                wanted.height.max(self.world.height),
            );
            debug!(width = self.world.width, height = self.world.height, "world grown");
        }
    }

    fn star_count(&self) -> usize {
        self.field.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkPolicy;
    use super::star::StarKind;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.seed = Some(42);
        config.scene.milky_way_stars = 300;
        config.scene.background_stars = 100;
        config
    }

    #[test]
    fn test_empty_canvas_is_idle() {
        assert!(StarfieldEffect::new(&small_config(), 0.0, 600.0).is_none());
        assert!(StarfieldEffect::new(&small_config(), 800.0, f32::NAN).is_none());
    }

    #[test]
    fn test_initial_scene() {
        let effect = StarfieldEffect::new(&small_config(), 800.0, 600.0).unwrap();
        let field = effect.field();
        assert_eq!(field.stars().iter().filter(|s| s.kind == StarKind::MilkyWay).count(), 300);
        // three zodiac templates plus fifteen named constellations
        assert_eq!(field.constellations().len(), 18);
        assert!(field.constellations().iter().all(|c| !c.procedural));
        let world = effect.world();
        assert_eq!(world.width, 800.0 * 2.0 + 40.0);
        assert_eq!(world.height, 600.0 * 2.0 + 40.0);
    }

    #[test]
    fn test_every_policy_keeps_single_incoming() {
        for policy in [LinkPolicy::Chain, LinkPolicy::Branching, LinkPolicy::Strict] {
            let mut config = small_config();
            config.scene.link_policy = policy;
            config.scene.zodiac = false;
            let effect = StarfieldEffect::new(&config, 800.0, 600.0).unwrap();
            assert!(effect.field().incoming_counts().values().all(|&n| n <= 1));
        }
    }

    #[test]
    fn test_spawn_is_procedural_and_named() {
        let mut effect = StarfieldEffect::new(&small_config(), 800.0, 600.0).unwrap();
        let id = effect.spawn_near_view().unwrap();
        let spawned = effect.field().constellation(id).unwrap();
        assert!(spawned.procedural);
        assert!(spawned.name.is_some());
        assert!((5..=10).contains(&spawned.members.len()));
    }

    #[test]
    fn test_live_cap_evicts_oldest() {
        let mut config = small_config();
        config.scene.max_live_stars = 600;
        let mut effect = StarfieldEffect::new(&config, 800.0, 600.0).unwrap();
        for _ in 0..50 {
            effect.tick += 1;
            assert!(effect.spawn_near_view().is_some());
            assert!(effect.star_count() <= 600);
        }
        let procedural = effect.field().constellations().iter().filter(|c| c.procedural).count();
        assert!(procedural < 50);
        // evicted names come back to the pool
        assert!(effect.names.remaining() > 0);
    }

    #[test]
    fn test_spawn_skipped_when_nothing_evictable() {
        let mut config = small_config();
        config.scene.max_live_stars = 10;
        let mut effect = StarfieldEffect::new(&config, 800.0, 600.0).unwrap();
        let before = effect.star_count();
        assert!(effect.spawn_near_view().is_none());
        assert_eq!(effect.star_count(), before);
    }

    #[test]
    fn test_resize_keeps_stars() {
        let mut effect = StarfieldEffect::new(&small_config(), 800.0, 600.0).unwrap();
        let before = effect.star_count();
        effect.resize(1600.0, 1200.0);
        assert_eq!(effect.star_count(), before);
        assert_eq!(effect.canvas(), Vec2::new(1600.0, 1200.0));
        effect.resize(0.0, 0.0);
        assert_eq!(effect.canvas(), Vec2::new(1600.0, 1200.0));
    }
}
