use super::star::{ConstellationId, StarField, World};
use crate::config::MotionConfig;
use glam::Vec2;
use std::collections::HashMap;

/// Per-tick integration parameters.
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    /// Velocity multiplier per tick; 1.0 means no drag.
    pub drag: f32,
    /// Acceleration toward the recorded constellation centroid.
    pub cluster_pull: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            drag: 1.0,
            cluster_pull: 0.0,
        }
    }
}

impl From<&MotionConfig> for Motion {
    fn from(config: &MotionConfig) -> Self {
        Self {
            drag: config.drag,
            cluster_pull: config.cluster_pull,
        }
    }
}

impl Motion {
    /// Advance every star one tick and wrap it into `world`.
    pub fn integrate(&self, field: &mut StarField, world: &World) {
        let centroids: HashMap<ConstellationId, Vec2> = if self.cluster_pull != 0.0 {
            field.constellations().iter().map(|c| (c.id, c.centroid)).collect()
        } else {
            HashMap::new()
        };

        for star in field.stars_mut() {
            if self.drag != 1.0 {
                star.velocity *= self.drag;
            }
            if let Some(centroid) = star.constellation.and_then(|c| centroids.get(&c)) {
                let toward = world.delta(star.position, *centroid).normalize_or_zero();
                star.velocity += toward * self.cluster_pull;
            }
            star.position = world.wrap(star.position + star.velocity);
        }
    }
}

/// Count down lifespans and drop stars whose life ran out. Returns how many
/// were removed.
pub fn reap_expired(field: &mut StarField) -> usize {
    for star in field.stars_mut() {
        if let Some(life) = star.life.as_mut() {
            *life = life.saturating_sub(1);
        }
    }
    field.retain(|s| s.life != Some(0))
}
