//! The landing page ambience: clustered stars loosely linked around bright
//! centres, drawn with trails, with short-lived sparks drifting through.

use super::starfield::constellation::{self, BranchingParams, DistanceBand};
use super::starfield::generator;
use super::starfield::motion::{Motion, reap_expired};
use super::starfield::render::Renderer;
use super::starfield::star::{StarField, StarKind, World};
use super::starfield::viewport::Projection;
use super::{Effect, scene_rng, usable_canvas};
use crate::config::{Config, LandingConfig};
use crate::surface::Surface;
use fastrand::Rng;
use glam::Vec2;
use tracing::{debug, info};

pub struct LandingEffect {
    settings: LandingConfig,
    cull_margin: f32,
    rng: Rng,
    field: StarField,
    world: World,
    motion: Motion,
    renderer: Renderer,
}

impl LandingEffect {
    fn populate(&mut self, band: DistanceBand, params: BranchingParams) {
        let (w, h) = (self.world.width, self.world.height);
        let centers = generator::cluster_centers(&mut self.rng, self.settings.cluster_centers, w, h);
        let anchors: Vec<Vec2> = centers.iter().map(|s| s.position).collect();
        let mut dust = generator::cluster_dust(&mut self.rng, self.settings.cluster_stars, &anchors, w, h);
        for star in &mut dust {
            star.position = self.world.wrap(star.position);
        }

        let mut all = self.field.extend(centers);
        let sources = all.clone();
        all.extend(self.field.extend(dust));

        let links = constellation::probabilistic_branching(
            &mut self.field,
            &self.world,
            &sources,
            &all,
            band,
            params,
            &mut self.rng,
        );
        info!(stars = self.field.len(), links, "landing scene populated");
    }

    pub fn field(&self) -> &StarField {
        &self.field
    }

    pub fn spark_count(&self) -> usize {
        self.field
            .stars()
            .iter()
            .filter(|s| s.kind == StarKind::Spark)
            .count()
    }

    fn projection(&self) -> Projection {
        Projection {
            world: self.world,
            camera: Vec2::ZERO,
            canvas: Vec2::new(self.world.width, self.world.height),
            margin: self.cull_margin,
        }
    }
}

impl Effect for LandingEffect {
    fn new(config: &Config, width: f32, height: f32) -> Option<Self> {
        if !usable_canvas(width, height) {
            debug!(width, height, "no canvas, landing idle");
            return None;
        }
        let mut rng = scene_rng(config);
        let renderer = Renderer::new(config.landing.clear, config.render.background, rng.u32(..));
        let mut effect = Self {
            settings: config.landing.clone(),
            cull_margin: config.render.cull_margin,
            rng,
            field: StarField::new(),
            world: World::new(width, height),
            motion: Motion::from(&config.motion),
            renderer,
        };
        effect.populate(
            DistanceBand::new(config.scene.min_link_distance, config.scene.max_link_distance),
            BranchingParams {
                neighbors: config.scene.branching_neighbors,
                bonus: config.scene.constellation_bonus,
            },
        );
        Some(effect)
    }

    fn update(&mut self, dt: f32) {
        self.motion.integrate(&mut self.field, &self.world);
        let expired = reap_expired(&mut self.field);
        if expired > 0 {
            debug!(expired, "sparks faded");
        }
        if self.spark_count() < self.settings.spark_cap && self.rng.f32() < self.settings.spark_chance {
            let spark = generator::spark(&mut self.rng, self.world.width, self.world.height);
            self.field.insert(spark);
        }
        self.renderer.advance(dt);
    }

    fn render(&mut self, surface: &mut dyn Surface) {
        let projection = self.projection();
        self.renderer.draw(surface, &self.field, &projection);
    }

    fn resize(&mut self, width: f32, height: f32) {
        if !usable_canvas(width, height) {
            return;
        }
        // The world tracks the canvas; stars are folded in, never dropped.
        self.world = World::new(width, height);
        let world = self.world;
        for star in self.field.stars_mut() {
            star.position = world.wrap(star.position);
        }
    }

    fn star_count(&self) -> usize {
        self.field.len()
    }
}
