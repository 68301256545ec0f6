use super::star::{Star, StarField, StarKind};
use super::viewport::Projection;
use crate::color::Rgba;
use crate::config::ClearMode;
use crate::surface::{GradientStop, Paint, Surface};
use glam::Vec2;
use noise::{NoiseFn, Perlin};

const CONSTELLATION_LINK: Rgba = Rgba::new(180, 80, 20, 0.3);
const AMBIENT_LINK: Rgba = Rgba::new(255, 255, 255, 0.1);
const LINK_WIDTH: f32 = 0.5;
const LABEL_COLOR: Rgba = Rgba::new(255, 255, 255, 0.6);
const LABEL_LIFT: f32 = 15.0;
const CONSTELLATION_GLOW: f32 = 8.0;
const ANCHOR_GLOW: f32 = 14.0;
const TRAIL_END: Rgba = Rgba::rgb(40, 40, 20);
/// Ticks over which a dying spark fades out.
const SPARK_FADE: f32 = 60.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub stars: usize,
    pub links: usize,
    pub labels: usize,
    pub culled: usize,
}

pub struct Renderer {
    clear: ClearMode,
    background: Rgba,
    noise: Perlin,
    time: f32,
}

impl Renderer {
    pub fn new(clear: ClearMode, background: Rgba, seed: u32) -> Self {
        Self {
            clear,
            background,
            noise: Perlin::new(seed),
            time: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
        if self.time > 10000.0 {
            self.time -= 10000.0;
        }
    }

    /// Ambient brightness modulation in 0.5..=1.0.
    fn twinkle(&self, star: &Star) -> f32 {
        let n = self
            .noise
            .get([star.twinkle_phase as f64, self.time as f64 * 0.8]) as f32;
        (0.75 + 0.25 * n).clamp(0.5, 1.0)
    }

    fn alpha(&self, star: &Star) -> f32 {
        match star.kind {
            StarKind::Constellation => star.brightness,
            StarKind::Spark => {
                let fade = star.life.map_or(1.0, |life| (life as f32 / SPARK_FADE).min(1.0));
                star.brightness * fade
            }
            StarKind::MilkyWay | StarKind::Background => star.brightness * self.twinkle(star),
        }
    }

    fn clear(&self, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        let size = Vec2::new(w, h);
        let paint = match self.clear {
            ClearMode::Solid => Paint::Solid(self.background.with_alpha(1.0)),
            ClearMode::Trail { alpha } => Paint::Linear {
                start: Vec2::ZERO,
                end: size,
                from: self.background.with_alpha(alpha),
                to: TRAIL_END.with_alpha(alpha),
            },
        };
        surface.fill_rect(Vec2::ZERO, size, &paint);
    }

    /// Draw one frame: background, links, then glow, core and label per star.
    pub fn draw(&self, surface: &mut dyn Surface, field: &StarField, projection: &Projection) -> RenderStats {
        let mut stats = RenderStats::default();
        self.clear(surface);

        for star in field.stars() {
            if star.links.is_empty() {
                continue;
            }
            let from = projection.screen(star.position);
            let color = if star.kind == StarKind::Constellation {
                CONSTELLATION_LINK
            } else {
                AMBIENT_LINK
            };
            for &target in &star.links {
                // Evicted targets leave dangling ids behind.
                let Some(target) = field.get(target) else {
                    continue;
                };
                let to = from + projection.world.delta(star.position, target.position);
                if !projection.visible(from) && !projection.visible(to) {
                    continue;
                }
                surface.stroke_line(from, to, color, LINK_WIDTH);
                stats.links += 1;
            }
        }

        for star in field.stars() {
            let at = projection.screen(star.position);
            if !projection.visible(at) {
                stats.culled += 1;
                continue;
            }
            let alpha = self.alpha(star);

            if star.glows() {
                let radius = if star.name.is_some() {
                    ANCHOR_GLOW
                } else if star.kind == StarKind::Constellation {
                    CONSTELLATION_GLOW
                } else {
                    star.size * 4.0
                };
                let hue = star.glow.unwrap_or(star.color);
                let stops = [
                    GradientStop::new(0.0, hue.with_alpha(hue.a * alpha)),
                    GradientStop::new(0.4, hue.with_alpha(0.1 * alpha)),
                    GradientStop::new(1.0, hue.with_alpha(0.0)),
                ];
                surface.fill_radial_gradient(at, radius, &stops);
            }

            surface.fill_circle(at, star.size, star.color.with_alpha(alpha));
            stats.stars += 1;

            if let Some(name) = &star.name {
                surface.fill_text(name, at - Vec2::new(0.0, LABEL_LIFT), LABEL_COLOR);
                stats.labels += 1;
            }
        }

        stats
    }
}
