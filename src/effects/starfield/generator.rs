use super::star::{Star, StarKind};
use crate::color::Rgba;
use fastrand::Rng;
use glam::Vec2;
use std::f32::consts::PI;

pub const ZODIAC_DRIFT_SPEED: f32 = 0.04;
pub const STAR_DRIFT_SPEED: f32 = 0.08;
/// Largest offset between consecutive stars of a constellation walk.
pub const CONSTELLATION_STEP: f32 = 150.0;
pub const MIN_CONSTELLATION_STARS: usize = 5;
pub const MAX_CONSTELLATION_STARS: usize = 10;

pub const STAR_COLORS: [Rgba; 5] = [
    Rgba::new(14, 165, 233, 0.8),  // Sapphire
    Rgba::new(52, 211, 153, 0.8),  // Jade
    Rgba::new(155, 135, 245, 0.8), // Purple
    Rgba::new(139, 92, 246, 0.8),  // Deeper purple
    Rgba::new(167, 243, 208, 0.8), // Light jade
];

const MAIN_STAR_COLORS: [Rgba; 3] = [
    Rgba::new(0, 255, 255, 0.8), // Cyan
    Rgba::new(255, 215, 0, 0.8), // Gold
    Rgba::new(50, 205, 50, 0.8), // Green
];

const SMALL_STAR_COLORS: [Rgba; 3] = [
    Rgba::new(255, 255, 255, 0.7), // White
    Rgba::new(173, 216, 230, 0.7), // Light blue
    Rgba::new(240, 230, 140, 0.7), // Light yellow
];

/// A constellation drawn at a fixed place on the canvas.
pub struct ZodiacTemplate {
    pub name: &'static str,
    /// Canvas fractions plus indices of later points to link to.
    pub points: &'static [(f32, f32, &'static [usize])],
}

pub const ZODIAC: [ZodiacTemplate; 3] = [
    ZodiacTemplate {
        name: "Aries",
        points: &[(0.0, 0.0, &[1, 2]), (0.1, 0.05, &[2]), (0.2, 0.1, &[])],
    },
    ZodiacTemplate {
        name: "Taurus",
        points: &[
            (0.5, 0.2, &[1, 2, 3]),
            (0.6, 0.25, &[2]),
            (0.55, 0.3, &[3]),
            (0.45, 0.25, &[]),
        ],
    },
    ZodiacTemplate {
        name: "Gemini",
        points: &[
            (0.8, 0.4, &[1, 2]),
            (0.85, 0.5, &[3]),
            (0.75, 0.45, &[3]),
            (0.8, 0.6, &[]),
        ],
    },
];

fn drift(rng: &mut Rng, speed: f32) -> Vec2 {
    Vec2::new((rng.f32() - 0.5) * speed, (rng.f32() - 0.5) * speed)
}

fn pick(rng: &mut Rng, palette: &[Rgba]) -> Rgba {
    palette[rng.usize(..palette.len())]
}

/// Stars packed into a wavy horizontal band, brightest along its middle.
pub fn milky_way(rng: &mut Rng, count: usize, width: f32, height: f32) -> Vec<Star> {
    let band_center = height * 0.5;
    let band_width = height * 0.6;

    (0..count)
        .map(|_| {
            let x = rng.f32() * width;
            let offset = rng.f32() * band_width - band_width / 2.0;
            let y = band_center + offset + (x / width * PI * 2.0).sin() * band_width / 4.0;

            let distance = (y - band_center).abs() / (band_width / 2.0);
            let falloff = (1.0 - distance).max(0.0);
            let brightness = rng.f32() * 0.5 * falloff + 0.2;

            let mut star = Star::new(StarKind::MilkyWay, Vec2::new(x, y), drift(rng, STAR_DRIFT_SPEED));
            star.size = rng.f32() * 1.5 + 0.5;
            star.brightness = brightness;
            star.intensity = brightness;
            star.color = Rgba::WHITE.with_alpha(brightness);
            star.twinkle_phase = rng.f32() * 1000.0;
            star
        })
        .collect()
}

/// Faint stars spread evenly over the whole area.
pub fn background(rng: &mut Rng, count: usize, width: f32, height: f32) -> Vec<Star> {
    (0..count)
        .map(|_| {
            let brightness = rng.f32() * 0.3 + 0.1;
            let position = Vec2::new(rng.f32() * width, rng.f32() * height);
            let mut star = Star::new(StarKind::Background, position, drift(rng, STAR_DRIFT_SPEED * 0.5));
            star.size = rng.f32() + 0.5;
            star.brightness = brightness;
            star.intensity = brightness;
            star.color = Rgba::WHITE.with_alpha(brightness);
            star.twinkle_phase = rng.f32() * 1000.0;
            star
        })
        .collect()
}

fn constellation_star(rng: &mut Rng, position: Vec2, glow: Rgba) -> Star {
    let mut star = Star::new(StarKind::Constellation, position, drift(rng, ZODIAC_DRIFT_SPEED));
    star.size = 1.2;
    star.brightness = 1.0;
    star.intensity = 1.2;
    star.is_main = true;
    star.glow = Some(glow);
    star
}

/// Unlinked constellation stars: the first within `spread / 2` of `anchor`,
/// each following one within `CONSTELLATION_STEP / 2` of its predecessor.
/// Positions are not wrapped; callers wrap into their world.
pub fn constellation_walk(rng: &mut Rng, anchor: Vec2, count: usize, spread: f32) -> Vec<Star> {
    let glow = pick(rng, &STAR_COLORS);
    let mut stars: Vec<Star> = Vec::with_capacity(count);
    let mut previous = anchor;
    for i in 0..count {
        let reach = if i == 0 { spread } else { CONSTELLATION_STEP };
        let position = previous + Vec2::new((rng.f32() - 0.5) * reach, (rng.f32() - 0.5) * reach);
        stars.push(constellation_star(rng, position, glow));
        previous = position;
    }
    stars
}

/// Stars of a fixed template, positioned by canvas fractions.
pub fn template_stars(rng: &mut Rng, template: &ZodiacTemplate, canvas: Vec2) -> Vec<Star> {
    let glow = pick(rng, &STAR_COLORS);
    template
        .points
        .iter()
        .map(|&(fx, fy, _)| constellation_star(rng, Vec2::new(fx, fy) * canvas, glow))
        .collect()
}

/// Star count for a new constellation. Stops after 5, 6, 7 or 8 stars with
/// probabilities 0.15, 0.15, 0.35 and 0.20; otherwise runs on to 9 or 10.
pub fn constellation_size(rng: &mut Rng) -> usize {
    const STOPS: [(usize, f32); 4] = [(5, 0.15), (6, 0.15), (7, 0.35), (8, 0.20)];

    let roll = rng.f32();
    let mut cumulative = 0.0;
    for (size, p) in STOPS {
        cumulative += p;
        if roll < cumulative {
            return size;
        }
    }
    rng.usize(9..=MAX_CONSTELLATION_STARS)
}

/// Bright coloured stars the landing scene clusters around.
pub fn cluster_centers(rng: &mut Rng, count: usize, width: f32, height: f32) -> Vec<Star> {
    (0..count)
        .map(|_| {
            let position = Vec2::new(rng.f32() * width, rng.f32() * height);
            let mut star = Star::new(StarKind::Background, position, drift(rng, 0.02));
            star.size = rng.f32() * 3.0 + 2.0;
            star.brightness = rng.f32() * 0.3 + 0.7;
            star.intensity = rng.f32() * 0.5 + 0.5;
            star.color = pick(rng, &MAIN_STAR_COLORS);
            star.is_main = true;
            star.twinkle_phase = rng.f32() * 1000.0;
            star
        })
        .collect()
}

/// Small stars, 70 % of them placed 20-120 units from a random centre.
pub fn cluster_dust(rng: &mut Rng, count: usize, centers: &[Vec2], width: f32, height: f32) -> Vec<Star> {
    (0..count)
        .map(|_| {
            let position = if !centers.is_empty() && rng.f32() < 0.7 {
                let center = centers[rng.usize(..centers.len())];
                let angle = rng.f32() * PI * 2.0;
                let distance = rng.f32() * 100.0 + 20.0;
                center + Vec2::new(angle.cos(), angle.sin()) * distance
            } else {
                Vec2::new(rng.f32() * width, rng.f32() * height)
            };
            let mut star = Star::new(StarKind::Background, position, drift(rng, 0.02));
            star.size = rng.f32() + 0.5;
            star.brightness = rng.f32() * 0.5 + 0.3;
            star.intensity = rng.f32() * 0.3 + 0.2;
            star.color = pick(rng, &SMALL_STAR_COLORS);
            star.twinkle_phase = rng.f32() * 1000.0;
            star
        })
        .collect()
}

/// A short-lived drifting mote.
pub fn spark(rng: &mut Rng, width: f32, height: f32) -> Star {
    let position = Vec2::new(rng.f32() * width, rng.f32() * height);
    let mut star = Star::new(StarKind::Spark, position, drift(rng, 0.2));
    star.size = rng.f32() * 0.8 + 0.4;
    star.brightness = rng.f32() * 0.4 + 0.4;
    star.intensity = star.brightness;
    star.color = pick(rng, &SMALL_STAR_COLORS);
    star.life = Some(rng.u32(120..=360));
    star
}
