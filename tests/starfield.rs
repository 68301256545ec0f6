//! Scene-level behaviour of the explorer and landing effects, driven the way
//! the binary drives them: canvas sizes, input events and fixed ticks.

use glam::Vec2;
use starchart::config::Config;
use starchart::effects::landing::LandingEffect;
use starchart::effects::starfield::StarfieldEffect;
use starchart::effects::{Direction, Effect, InputEvent};
use starchart::surface::FrameBuffer;
use std::io::Cursor;

const DT: f32 = 1.0 / 60.0;

fn seeded(seed: u64) -> Config {
    let mut config = Config::default();
    config.seed = Some(seed);
    config
}

/// Only named constellations, no ambient stars.
fn sparse(constellations: usize) -> Config {
    let mut config = seeded(11);
    config.scene.milky_way_stars = 0;
    config.scene.background_stars = 0;
    config.scene.zodiac = false;
    config.scene.initial_constellations = constellations;
    config.scene.spawn_chance = 0.0;
    config
}

fn click(effect: &mut StarfieldEffect, at: Vec2) -> Vec<String> {
    let mut routes = Vec::new();
    let mut record = |route: &str| routes.push(route.to_string());
    effect.handle_input(&InputEvent::PointerDown(at), &mut record);
    effect.handle_input(&InputEvent::PointerUp(at), &mut record);
    routes
}

fn screen_of(effect: &StarfieldEffect, name: &str) -> Vec2 {
    let star = effect
        .field()
        .stars()
        .iter()
        .find(|s| s.name.as_deref() == Some(name))
        .unwrap();
    effect.projection().screen(star.position)
}

// =============================================================================
// Resize
// =============================================================================

#[test]
fn test_resize_leaves_star_count_unchanged() {
    let mut effect = StarfieldEffect::new(&seeded(1), 800.0, 600.0).unwrap();
    let before = effect.star_count();
    effect.resize(1600.0, 1200.0);
    assert_eq!(effect.star_count(), before);
    effect.update(DT);
    effect.resize(800.0, 600.0);
    assert_eq!(effect.star_count(), before);
}

#[test]
fn test_landing_resize_leaves_star_count_unchanged() {
    let mut config = seeded(1);
    config.landing.spark_chance = 0.0;
    let mut effect = LandingEffect::new(&config, 800.0, 600.0).unwrap();
    let before = effect.star_count();
    effect.resize(1600.0, 1200.0);
    assert_eq!(effect.star_count(), before);
}

// =============================================================================
// Motion
// =============================================================================

#[test]
fn test_positions_stay_inside_world() {
    let mut config = seeded(5);
    config.scene.milky_way_stars = 500;
    config.scene.background_stars = 200;
    let mut effect = StarfieldEffect::new(&config, 400.0, 300.0).unwrap();
    for _ in 0..3000 {
        effect.update(DT);
    }
    let world = effect.world();
    for star in effect.field().stars() {
        assert!(star.position.x >= 0.0 && star.position.x < world.width);
        assert!(star.position.y >= 0.0 && star.position.y < world.height);
    }
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_click_on_label_navigates_once_with_slug() {
    // The eighth pooled name is "Who's the Jerk?".
    let mut effect = StarfieldEffect::new(&sparse(8), 800.0, 600.0).unwrap();
    let at = screen_of(&effect, "Who's the Jerk?");
    let routes = click(&mut effect, at);
    assert_eq!(routes, vec!["/agents/whosthejerk".to_string()]);
}

#[test]
fn test_click_tolerance_box() {
    let mut effect = StarfieldEffect::new(&sparse(1), 800.0, 600.0).unwrap();
    let at = screen_of(&effect, "Rasputin");

    assert_eq!(click(&mut effect, at + Vec2::new(45.0, -15.0)), vec!["/agents/rasputin"]);
    assert!(click(&mut effect, at + Vec2::new(55.0, 0.0)).is_empty());
    assert!(click(&mut effect, at + Vec2::new(0.0, 25.0)).is_empty());
}

#[test]
fn test_drag_is_not_a_click() {
    let mut effect = StarfieldEffect::new(&sparse(1), 800.0, 600.0).unwrap();
    let at = screen_of(&effect, "Rasputin");
    let mut routes = Vec::new();
    let mut record = |route: &str| routes.push(route.to_string());
    effect.handle_input(&InputEvent::PointerDown(at), &mut record);
    effect.handle_input(&InputEvent::PointerMove(at + Vec2::new(40.0, 0.0)), &mut record);
    effect.handle_input(&InputEvent::PointerUp(at), &mut record);
    assert!(routes.is_empty());
}

#[test]
fn test_drag_moves_camera_by_negative_delta() {
    let mut effect = StarfieldEffect::new(&sparse(1), 800.0, 600.0).unwrap();
    let mut ignore = |_: &str| {};
    let start = effect.viewport().offset();
    let world = effect.world();

    effect.handle_input(&InputEvent::PointerDown(Vec2::new(100.0, 100.0)), &mut ignore);
    effect.handle_input(&InputEvent::PointerMove(Vec2::new(130.0, 90.0)), &mut ignore);
    assert_eq!(effect.viewport().offset(), world.wrap(start + Vec2::new(-30.0, 10.0)));

    effect.handle_input(&InputEvent::PointerUp(Vec2::new(130.0, 90.0)), &mut ignore);
    effect.handle_input(&InputEvent::PointerMove(Vec2::new(300.0, 300.0)), &mut ignore);
    assert_eq!(effect.viewport().offset(), world.wrap(start + Vec2::new(-30.0, 10.0)));
}

#[test]
fn test_focus_loss_stops_key_pan() {
    let mut effect = StarfieldEffect::new(&sparse(1), 800.0, 600.0).unwrap();
    let mut ignore = |_: &str| {};
    effect.handle_input(&InputEvent::KeyUp(Direction::Left), &mut ignore);
    effect.handle_input(&InputEvent::KeyDown(Direction::Right), &mut ignore);
    effect.update(DT);
    let held = effect.viewport().offset();

    effect.handle_input(&InputEvent::PointerLeave, &mut ignore);
    for _ in 0..600 {
        effect.update(DT);
    }
    assert_eq!(effect.viewport().offset(), held);
}

#[test]
fn test_camera_offset_stays_inside_world() {
    let mut effect = StarfieldEffect::new(&sparse(1), 800.0, 600.0).unwrap();
    let mut ignore = |_: &str| {};
    effect.handle_input(&InputEvent::KeyUp(Direction::Up), &mut ignore);
    effect.handle_input(&InputEvent::KeyDown(Direction::Up), &mut ignore);
    effect.handle_input(&InputEvent::KeyDown(Direction::Left), &mut ignore);
    let world = effect.world();
    for _ in 0..3000 {
        effect.update(DT);
        let offset = effect.viewport().offset();
        assert!(offset.x >= 0.0 && offset.x < world.width);
        assert!(offset.y >= 0.0 && offset.y < world.height);
    }
}

// =============================================================================
// Long runs
// =============================================================================

#[test]
fn test_spawning_respects_live_cap() {
    let mut config = seeded(9);
    config.scene.milky_way_stars = 200;
    config.scene.background_stars = 100;
    config.scene.spawn_chance = 1.0;
    config.scene.max_live_stars = 700;
    let mut effect = StarfieldEffect::new(&config, 800.0, 600.0).unwrap();
    for _ in 0..600 {
        effect.update(DT);
        assert!(effect.star_count() <= 700);
    }
    assert!(effect.field().incoming_counts().values().all(|&n| n <= 1));
}

#[test]
fn test_renders_into_frame_buffer() {
    // 200 x 75 cells at 4 units per pixel is an 800 x 600 canvas.
    let mut frame = FrameBuffer::new(200, 75, 4.0).unwrap();
    let mut effect = StarfieldEffect::new(&seeded(2), 800.0, 600.0).unwrap();
    effect.update(DT);
    effect.render(&mut frame);
    assert!(effect.last_stats().stars > 0);
    assert!(effect.last_stats().culled > 0);

    let mut out = Cursor::new(Vec::new());
    frame.present(&mut out).unwrap();
    let text = String::from_utf8(out.into_inner()).unwrap();
    assert!(text.starts_with("\x1b[H"));
    assert!(text.contains('▄'));
}
