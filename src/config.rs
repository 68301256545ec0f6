//! Scene configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) yields the
//! stock explorer scene. CLI flags are applied on top in `main.rs`.

use crate::color::Rgba;
use crate::error::{Result, StarchartError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed RNG seed; a fresh random seed is used when absent.
    pub seed: Option<u64>,
    pub scene: SceneConfig,
    pub motion: MotionConfig,
    pub render: RenderConfig,
    pub viewport: ViewportConfig,
    pub landing: LandingConfig,
}

/// How the initial scattered constellations get their links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
    /// Nearest unlinked neighbour, one after another.
    Chain,
    /// Weighted random links to the K nearest neighbours.
    Branching,
    /// Generation order: first -> second -> ... -> last.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub milky_way_stars: usize,
    pub background_stars: usize,
    pub initial_constellations: usize,
    /// Include the anchored Aries/Taurus/Gemini templates.
    pub zodiac: bool,
    /// World size as a multiple of the canvas size.
    pub world_scale: f32,
    /// Per-tick probability of spawning a named constellation near the view.
    pub spawn_chance: f32,
    /// Hard cap on live stars; spawns evict old procedural constellations.
    pub max_live_stars: usize,
    pub link_policy: LinkPolicy,
    pub min_link_distance: f32,
    pub max_link_distance: f32,
    /// Upper bound on stars per nearest-neighbour chain.
    pub chain_cap: usize,
    /// Candidates considered per star by the branching policy.
    pub branching_neighbors: usize,
    /// Weight multiplier for the branching policy.
    pub constellation_bonus: f32,
    /// Maximum jitter of a constellation's first star around its anchor.
    pub constellation_spread: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            milky_way_stars: 3000,
            background_stars: 1000,
            initial_constellations: 15,
            zodiac: true,
            world_scale: 2.0,
            spawn_chance: 0.002,
            max_live_stars: 6000,
            link_policy: LinkPolicy::Chain,
            min_link_distance: 30.0,
            max_link_distance: 150.0,
            chain_cap: 8,
            branching_neighbors: 3,
            constellation_bonus: 1.2,
            constellation_spread: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Velocity multiplier per tick; 1.0 disables drag.
    pub drag: f32,
    /// Acceleration toward the constellation centroid per tick.
    pub cluster_pull: f32,
    /// Extra world size beyond the visible area so wrapping happens off screen.
    pub edge_buffer: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            drag: 1.0,
            cluster_pull: 0.0,
            edge_buffer: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClearMode {
    /// Opaque background every frame.
    Solid,
    /// Low-alpha gradient wash that leaves motion trails.
    Trail { alpha: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear: ClearMode,
    pub background: Rgba,
    /// Stars this far outside the canvas are still drawn.
    pub cull_margin: f32,
    /// Canvas units per terminal pixel.
    pub pixel_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear: ClearMode::Solid,
            background: Rgba::rgb(0, 20, 40),
            cull_margin: 20.0,
            pixel_scale: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputBinding {
    Drag,
    Keys,
    Both,
}

impl InputBinding {
    pub fn drag(self) -> bool {
        matches!(self, InputBinding::Drag | InputBinding::Both)
    }

    pub fn keys(self) -> bool {
        matches!(self, InputBinding::Keys | InputBinding::Both)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub input: InputBinding,
    /// Camera movement per tick while an arrow key is held.
    pub key_speed: f32,
    /// Half extents of the label hit box.
    pub hit_box: (f32, f32),
    /// Pointer travel below which a press/release pair is a click.
    pub click_slop: f32,
    /// Ticks a key press stays held when the terminal sends no release.
    pub key_hold_ticks: u32,
    pub route_prefix: String,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            input: InputBinding::Both,
            key_speed: 2.0,
            hit_box: (50.0, 20.0),
            click_slop: 6.0,
            key_hold_ticks: 8,
            route_prefix: "/agents".to_string(),
        }
    }
}

/// The ambient landing scene: clustered stars, no camera, no labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub cluster_centers: usize,
    pub cluster_stars: usize,
    /// Live sparks at most.
    pub spark_cap: usize,
    /// Per-tick probability of a new spark while under the cap.
    pub spark_chance: f32,
    pub clear: ClearMode,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            cluster_centers: 12,
            cluster_stars: 300,
            spark_cap: 60,
            spark_chance: 0.3,
            clear: ClearMode::Trail { alpha: 0.1 },
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StarchartError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.render.pixel_scale > 0.0) {
            return Err(StarchartError::invalid_config("render.pixel_scale must be positive"));
        }
        if !(self.scene.world_scale >= 1.0) {
            return Err(StarchartError::invalid_config("scene.world_scale must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.scene.spawn_chance) {
            return Err(StarchartError::invalid_config("scene.spawn_chance must be within 0..=1"));
        }
        if self.scene.chain_cap < 2 {
            return Err(StarchartError::invalid_config("scene.chain_cap must be at least 2"));
        }
        if self.viewport.hit_box.0 <= 0.0 || self.viewport.hit_box.1 <= 0.0 {
            return Err(StarchartError::invalid_config("viewport.hit_box must be positive"));
        }
        for clear in [self.render.clear, self.landing.clear] {
            if let ClearMode::Trail { alpha } = clear {
                if !(alpha > 0.0 && alpha <= 1.0) {
                    return Err(StarchartError::invalid_config("clear.alpha must be within (0, 1]"));
                }
            }
        }
        if !(0.0..=1.0).contains(&self.landing.spark_chance) {
            return Err(StarchartError::invalid_config("landing.spark_chance must be within 0..=1"));
        }
        if self.scene.min_link_distance >= self.scene.max_link_distance {
            // Valid, just produces no links at all.
            warn!(
                min = self.scene.min_link_distance,
                max = self.scene.max_link_distance,
                "link distance band is empty; constellations will have no links"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.scene.milky_way_stars, 3000);
        assert_eq!(config.scene.link_policy, LinkPolicy::Chain);
        assert_eq!(config.render.clear, ClearMode::Solid);
        assert_eq!(config.viewport.route_prefix, "/agents");
        assert!(config.seed.is_none());
        assert_eq!(config.landing.clear, ClearMode::Trail { alpha: 0.1 });
    }

    #[test]
    fn test_partial_toml_overrides() {
        let text = r#"
            seed = 7

            [scene]
            link_policy = "branching"
            initial_constellations = 3

            [render]
            background = "1a1b26"
            clear = { mode = "trail", alpha = 0.1 }

            [viewport]
            input = "keys"
        "#;
        let config = Config::from_toml(text).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.scene.link_policy, LinkPolicy::Branching);
        assert_eq!(config.scene.initial_constellations, 3);
        assert_eq!(config.scene.background_stars, 1000);
        assert_eq!(config.render.background, Rgba::rgb(26, 27, 38));
        assert_eq!(config.render.clear, ClearMode::Trail { alpha: 0.1 });
        assert!(config.viewport.input.keys());
        assert!(!config.viewport.input.drag());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_toml("[render]\npixel_scale = 0.0").is_err());
        assert!(Config::from_toml("[scene]\nworld_scale = 0.5").is_err());
        assert!(Config::from_toml("[render]\nbackground = \"nothex\"").is_err());
        assert!(Config::from_toml("[render]\nclear = { mode = \"trail\", alpha = 0.0 }").is_err());
    }

    #[test]
    fn test_chain_cap_needs_room_for_a_link() {
        assert!(Config::from_toml("[scene]\nchain_cap = 0").is_err());
        assert!(Config::from_toml("[scene]\nchain_cap = 1").is_err());
        assert!(Config::from_toml("[scene]\nchain_cap = 2").is_ok());
    }

    #[test]
    fn test_empty_band_is_accepted() {
        let config = Config::from_toml("[scene]\nmin_link_distance = 200.0\nmax_link_distance = 100.0");
        assert!(config.is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scene]\nmax_live_stars = 1234").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.scene.max_live_stars, 1234);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/starchart.toml")).unwrap_err();
        assert!(matches!(err, StarchartError::ConfigRead { .. }));
    }
}
