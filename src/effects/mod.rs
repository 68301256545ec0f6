use crate::config::Config;
use crate::surface::Surface;

pub mod landing;
pub mod starfield;

pub use starfield::viewport::{Direction, InputEvent, Navigator};

pub trait Effect {
    /// Build the scene for a `width` x `height` canvas. An empty canvas has
    /// nothing to draw on and yields `None`; callers treat that as idle.
    fn new(config: &Config, width: f32, height: f32) -> Option<Self>
    where
        Self: Sized;
    fn update(&mut self, dt: f32);
    fn render(&mut self, surface: &mut dyn Surface);
    fn handle_input(&mut self, _event: &InputEvent, _navigator: &mut dyn Navigator) {}
    /// Adopt a new canvas size. Never creates or destroys stars.
    fn resize(&mut self, width: f32, height: f32);
    fn star_count(&self) -> usize;
}

/// Seeded generator for a scene; a random seed when the config has none.
pub(crate) fn scene_rng(config: &Config) -> fastrand::Rng {
    match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    }
}

pub(crate) fn usable_canvas(width: f32, height: f32) -> bool {
    width.is_finite() && height.is_finite() && width >= 1.0 && height >= 1.0
}
