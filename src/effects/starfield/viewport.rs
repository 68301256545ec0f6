//! Camera offset, pointer/keyboard bindings and label hit-testing.

use super::constellation::slugify;
use super::star::{StarField, StarId, World};
use crate::config::{InputBinding, ViewportConfig};
use glam::Vec2;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Input already translated to canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
    PointerLeave,
    KeyDown(Direction),
    KeyUp(Direction),
}

/// Receives the route of a clicked constellation. Routing is the caller's job.
pub trait Navigator {
    fn navigate_to(&mut self, path: &str);
}

impl<F: FnMut(&str)> Navigator for F {
    fn navigate_to(&mut self, path: &str) {
        self(path)
    }
}

/// World to screen mapping for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub world: World,
    pub camera: Vec2,
    pub canvas: Vec2,
    pub margin: f32,
}

impl Projection {
    /// Screen position of a world point. Points just left of or above the
    /// canvas come back negative instead of wrapping to the far side.
    pub fn screen(&self, position: Vec2) -> Vec2 {
        let rel = self.world.wrap(position - self.camera);
        let unfold = |v: f32, extent: f32, size: f32| {
            if v > extent + self.margin { v - size } else { v }
        };
        Vec2::new(
            unfold(rel.x, self.canvas.x, self.world.width),
            unfold(rel.y, self.canvas.y, self.world.height),
        )
    }

    pub fn visible(&self, screen: Vec2) -> bool {
        screen.x >= -self.margin
            && screen.y >= -self.margin
            && screen.x <= self.canvas.x + self.margin
            && screen.y <= self.canvas.y + self.margin
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        self.world.wrap(screen + self.camera)
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    last: Vec2,
    travelled: f32,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    offset: Vec2,
    binding: InputBinding,
    key_speed: f32,
    hit_box: Vec2,
    click_slop: f32,
    key_hold_ticks: u32,
    route_prefix: String,
    press: Option<Press>,
    held: HashMap<Direction, u32>,
    releases_reported: bool,
}

impl Viewport {
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            offset: Vec2::ZERO,
            binding: config.input,
            key_speed: config.key_speed,
            hit_box: Vec2::new(config.hit_box.0, config.hit_box.1),
            click_slop: config.click_slop,
            key_hold_ticks: config.key_hold_ticks.max(1),
            route_prefix: config.route_prefix.trim_end_matches('/').to_string(),
            press: None,
            held: HashMap::new(),
            releases_reported: false,
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some()
    }

    pub fn route_for(&self, name: &str) -> String {
        format!("{}/{}", self.route_prefix, slugify(name))
    }

    /// Apply held keys for one tick. The offset stays wrapped into `world`.
    pub fn tick(&mut self, world: &World) {
        if self.held.is_empty() {
            return;
        }
        let mut step = Vec2::ZERO;
        for (direction, remaining) in self.held.iter_mut() {
            step += direction.vector();
            if !self.releases_reported {
                *remaining = remaining.saturating_sub(1);
            }
        }
        self.held.retain(|_, remaining| *remaining > 0);
        self.offset = world.wrap(self.offset + step * self.key_speed);
    }

    /// Feed one input event. Returns true when it triggered navigation.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        field: &StarField,
        projection: &Projection,
        navigator: &mut dyn Navigator,
    ) -> bool {
        match *event {
            InputEvent::PointerDown(p) => {
                self.press = Some(Press {
                    last: p,
                    travelled: 0.0,
                });
            }
            InputEvent::PointerMove(p) => self.pointer_moved(p, &projection.world),
            InputEvent::PointerUp(p) => {
                self.pointer_moved(p, &projection.world);
                if let Some(press) = self.press.take() {
                    if press.travelled < self.click_slop {
                        return self.click(p, field, projection, navigator);
                    }
                }
            }
            // Releases that happen elsewhere never reach us.
            InputEvent::PointerLeave => {
                self.press = None;
                self.held.clear();
            }
            InputEvent::KeyDown(direction) => {
                if self.binding.keys() {
                    let hold = if self.releases_reported {
                        u32::MAX
                    } else {
                        self.key_hold_ticks
                    };
                    self.held.insert(direction, hold);
                }
            }
            InputEvent::KeyUp(direction) => {
                self.releases_reported = true;
                self.held.remove(&direction);
            }
        }
        false
    }

    fn pointer_moved(&mut self, p: Vec2, world: &World) {
        let Some(press) = self.press.as_mut() else {
            return;
        };
        let delta = p - press.last;
        press.travelled += delta.length();
        press.last = p;
        if self.binding.drag() {
            self.offset = world.wrap(self.offset - delta);
        }
    }

    /// Nearest labelled star whose hit box contains the clicked point.
    pub fn hit_test(&self, screen: Vec2, field: &StarField, projection: &Projection) -> Option<StarId> {
        let target = projection.to_world(screen);
        field
            .stars()
            .iter()
            .filter(|s| s.name.is_some())
            .filter_map(|s| {
                let d = projection.world.delta(s.position, target);
                (d.x.abs() <= self.hit_box.x && d.y.abs() <= self.hit_box.y)
                    .then_some((s.id, d.length_squared()))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Hit-test a click and navigate to the hit constellation, if any.
    pub fn click(
        &self,
        screen: Vec2,
        field: &StarField,
        projection: &Projection,
        navigator: &mut dyn Navigator,
    ) -> bool {
        let Some(name) = self
            .hit_test(screen, field, projection)
            .and_then(|id| field.get(id))
            .and_then(|s| s.name.as_deref())
        else {
            return false;
        };
        let route = self.route_for(name);
        info!(%route, name, "constellation selected");
        navigator.navigate_to(&route);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::starfield::star::{Star, StarKind};

    fn projection(camera: Vec2) -> Projection {
        Projection {
            world: World::new(2000.0, 1000.0),
            camera,
            canvas: Vec2::new(800.0, 600.0),
            margin: 20.0,
        }
    }

    fn named_field(name: &str, at: Vec2) -> StarField {
        let mut field = StarField::new();
        let mut star = Star::new(StarKind::Constellation, at, Vec2::ZERO);
        star.name = Some(name.to_string());
        field.insert(star);
        field.insert(Star::new(StarKind::Background, at, Vec2::ZERO));
        field
    }

    #[test]
    fn test_drag_moves_camera_against_pointer() {
        let mut viewport = Viewport::new(&ViewportConfig::default());
        let field = StarField::new();
        let proj = projection(Vec2::ZERO);
        let mut nav = |_: &str| {};

        viewport.handle(&InputEvent::PointerDown(Vec2::new(100.0, 100.0)), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::PointerMove(Vec2::new(130.0, 90.0)), &field, &proj, &mut nav);
        assert_eq!(viewport.offset(), Vec2::new(1970.0, 10.0));

        viewport.handle(&InputEvent::PointerUp(Vec2::new(130.0, 90.0)), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::PointerMove(Vec2::new(400.0, 400.0)), &field, &proj, &mut nav);
        assert_eq!(viewport.offset(), Vec2::new(1970.0, 10.0));
        assert!(!viewport.is_dragging());
    }

    #[test]
    fn test_leave_ends_drag() {
        let mut viewport = Viewport::new(&ViewportConfig::default());
        let field = StarField::new();
        let proj = projection(Vec2::ZERO);
        let mut nav = |_: &str| {};
        viewport.handle(&InputEvent::PointerDown(Vec2::ZERO), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::PointerLeave, &field, &proj, &mut nav);
        viewport.handle(&InputEvent::PointerMove(Vec2::new(50.0, 50.0)), &field, &proj, &mut nav);
        assert_eq!(viewport.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_focus_loss_drops_held_keys() {
        let mut viewport = Viewport::new(&ViewportConfig::default());
        let field = StarField::new();
        let proj = projection(Vec2::ZERO);
        let mut nav = |_: &str| {};
        viewport.handle(&InputEvent::KeyUp(Direction::Left), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::KeyDown(Direction::Right), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::PointerLeave, &field, &proj, &mut nav);
        for _ in 0..6000 {
            viewport.tick(&proj.world);
        }
        assert_eq!(viewport.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_long_pan_stays_inside_world() {
        let mut viewport = Viewport::new(&ViewportConfig::default());
        let field = StarField::new();
        let proj = projection(Vec2::ZERO);
        let mut nav = |_: &str| {};
        viewport.handle(&InputEvent::KeyUp(Direction::Left), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::KeyDown(Direction::Left), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::KeyDown(Direction::Down), &field, &proj, &mut nav);
        for _ in 0..5000 {
            viewport.tick(&proj.world);
            let offset = viewport.offset();
            assert!(offset.x >= 0.0 && offset.x < 2000.0);
            assert!(offset.y >= 0.0 && offset.y < 1000.0);
        }

        viewport.handle(&InputEvent::PointerDown(Vec2::ZERO), &field, &proj, &mut nav);
        for step in 1..50 {
            let p = Vec2::splat(step as f32 * 100.0);
            viewport.handle(&InputEvent::PointerMove(p), &field, &proj, &mut nav);
            let offset = viewport.offset();
            assert!(offset.x >= 0.0 && offset.x < 2000.0);
            assert!(offset.y >= 0.0 && offset.y < 1000.0);
        }
    }

    #[test]
    fn test_keys_only_binding_ignores_drag() {
        let config = ViewportConfig {
            input: InputBinding::Keys,
            ..ViewportConfig::default()
        };
        let mut viewport = Viewport::new(&config);
        let field = StarField::new();
        let proj = projection(Vec2::ZERO);
        let mut nav = |_: &str| {};
        viewport.handle(&InputEvent::PointerDown(Vec2::ZERO), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::PointerMove(Vec2::new(50.0, 50.0)), &field, &proj, &mut nav);
        assert_eq!(viewport.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_key_hold_times_out_without_release() {
        let config = ViewportConfig {
            key_speed: 2.0,
            key_hold_ticks: 3,
            ..ViewportConfig::default()
        };
        let mut viewport = Viewport::new(&config);
        let proj = projection(Vec2::ZERO);
        let mut nav = |_: &str| {};
        viewport.handle(&InputEvent::KeyDown(Direction::Right), &StarField::new(), &proj, &mut nav);
        for _ in 0..10 {
            viewport.tick(&proj.world);
        }
        assert_eq!(viewport.offset(), Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_key_hold_until_release_once_releases_seen() {
        let mut viewport = Viewport::new(&ViewportConfig::default());
        let field = StarField::new();
        let proj = projection(Vec2::ZERO);
        let mut nav = |_: &str| {};
        viewport.handle(&InputEvent::KeyUp(Direction::Up), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::KeyDown(Direction::Up), &field, &proj, &mut nav);
        for _ in 0..100 {
            viewport.tick(&proj.world);
        }
        assert_eq!(viewport.offset(), Vec2::new(0.0, 800.0));
        viewport.handle(&InputEvent::KeyUp(Direction::Up), &field, &proj, &mut nav);
        viewport.tick(&proj.world);
        assert_eq!(viewport.offset(), Vec2::new(0.0, 800.0));
    }

    #[test]
    fn test_click_navigates_once_with_slug() {
        let mut viewport = Viewport::new(&ViewportConfig::default());
        let field = named_field("Who's the Jerk?", Vec2::new(400.0, 300.0));
        let proj = projection(Vec2::ZERO);
        let mut routes = Vec::new();
        let mut nav = |path: &str| routes.push(path.to_string());

        viewport.handle(&InputEvent::PointerDown(Vec2::new(445.0, 285.0)), &field, &proj, &mut nav);
        let navigated = viewport.handle(&InputEvent::PointerUp(Vec2::new(445.0, 285.0)), &field, &proj, &mut nav);
        assert!(navigated);
        assert_eq!(routes, vec!["/agents/whosthejerk".to_string()]);
    }

    #[test]
    fn test_click_outside_box_misses() {
        let viewport = Viewport::new(&ViewportConfig::default());
        let field = named_field("Sound", Vec2::new(400.0, 300.0));
        let proj = projection(Vec2::ZERO);
        assert!(viewport.hit_test(Vec2::new(451.0, 300.0), &field, &proj).is_none());
        assert!(viewport.hit_test(Vec2::new(400.0, 321.0), &field, &proj).is_none());
        assert!(viewport.hit_test(Vec2::new(350.0, 280.0), &field, &proj).is_some());
    }

    #[test]
    fn test_click_uses_camera_offset() {
        let viewport = Viewport::new(&ViewportConfig::default());
        let field = named_field("Sound", Vec2::new(1500.0, 700.0));
        let proj = projection(Vec2::new(1200.0, 500.0));
        assert!(viewport.hit_test(Vec2::new(300.0, 200.0), &field, &proj).is_some());
        assert!(viewport.hit_test(Vec2::new(300.0, 200.0), &field, &projection(Vec2::ZERO)).is_none());
    }

    #[test]
    fn test_drag_release_is_not_a_click() {
        let mut viewport = Viewport::new(&ViewportConfig::default());
        let field = named_field("Sound", Vec2::new(400.0, 300.0));
        let proj = projection(Vec2::ZERO);
        let mut count = 0;
        let mut nav = |_: &str| count += 1;
        viewport.handle(&InputEvent::PointerDown(Vec2::new(300.0, 300.0)), &field, &proj, &mut nav);
        viewport.handle(&InputEvent::PointerUp(Vec2::new(400.0, 300.0)), &field, &proj, &mut nav);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_projection_unfolds_and_culls() {
        let proj = projection(Vec2::new(100.0, 0.0));
        assert_eq!(proj.screen(Vec2::new(150.0, 10.0)), Vec2::new(50.0, 10.0));
        assert_eq!(proj.screen(Vec2::new(90.0, 10.0)), Vec2::new(-10.0, 10.0));
        assert!(proj.visible(proj.screen(Vec2::new(90.0, 10.0))));
        assert!(!proj.visible(proj.screen(Vec2::new(1500.0, 10.0))));
    }
}
