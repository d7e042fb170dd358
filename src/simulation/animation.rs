//! The per-frame driver
//!
//! Each tick measures the frame delta, turns the main group, advances every
//! entity and hands the scene to a [`SceneRenderer`]. All of it happens on
//! the thread that owns the scene; entities never read each other, so the
//! update order does not matter.

use std::time::Instant;

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::config::{FocusConfig, RotationConfig};
use crate::gfx::scene::{NodeId, Scene};

use super::entity::{FocusFrame, FrameContext};
use super::particles::ParticleSystem;
use super::state::{Mode, SceneState};

/// Surface width in logical pixels, the unit [`FocusConfig::compact_width`] uses
pub fn logical_width(physical_width: u32, scale_factor: f64) -> u32 {
    if !scale_factor.is_finite() || scale_factor <= 0.0 {
        return physical_width;
    }
    (f64::from(physical_width) / scale_factor).round() as u32
}

/// Anything that can draw the composed scene
pub trait SceneRenderer {
    fn render(&mut self, scene: &Scene);
}

/// Frame timing: seconds since the previous tick and since the start
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self { start: now, last: now }
    }

    /// Returns `(dt, elapsed)` in seconds and moves the clock to `now`
    pub fn tick(&mut self, now: Instant) -> (f32, f32) {
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        (dt, now.saturating_duration_since(self.start).as_secs_f32())
    }
}

/// Per-frame timings reported back to the caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub dt: f32,
    pub elapsed: f32,
    pub entities_updated: usize,
}

pub struct AnimationLoop {
    clock: FrameClock,
    rotation: RotationConfig,
    focus: FocusConfig,
    running: bool,
}

impl AnimationLoop {
    pub fn new(rotation: RotationConfig, focus: FocusConfig, now: Instant) -> Self {
        Self {
            clock: FrameClock::new(now),
            rotation,
            focus,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stops the loop; later ticks do nothing
    pub fn stop(&mut self) {
        if self.running {
            log::info!("Animation loop stopped");
        }
        self.running = false;
    }

    /// Runs one frame and renders it
    ///
    /// Returns `None` once the loop has been stopped.
    pub fn frame(
        &mut self,
        now: Instant,
        state: &mut SceneState,
        scene: &mut Scene,
        particles: &ParticleSystem,
        logical_width: u32,
        renderer: &mut dyn SceneRenderer,
    ) -> Option<FrameStats> {
        let stats = self.tick(now, state, scene, particles, logical_width)?;
        renderer.render(scene);
        Some(stats)
    }

    /// Advances the simulation to `now` without rendering
    pub fn tick(
        &mut self,
        now: Instant,
        state: &mut SceneState,
        scene: &mut Scene,
        particles: &ParticleSystem,
        logical_width: u32,
    ) -> Option<FrameStats> {
        if !self.running {
            return None;
        }
        let (dt, elapsed) = self.clock.tick(now);
        let dt = dt.min(self.rotation.max_frame_delta);
        Some(self.step(dt, elapsed, state, scene, particles, logical_width))
    }

    /// Advances the simulation by an explicit `dt`
    pub fn step(
        &mut self,
        dt: f32,
        elapsed: f32,
        state: &mut SceneState,
        scene: &mut Scene,
        particles: &ParticleSystem,
        logical_width: u32,
    ) -> FrameStats {
        self.rotate(dt, state);
        if let Some(group) = scene.graph.transform_mut(scene.main_group) {
            group.rotation = Vector3::new(state.rotation.x, state.rotation.y, 0.0);
        }
        scene.update();

        state.validate_focus(|id| particles.is_photo(id));
        let focus_target = state.focus_target();

        let focus_frame = focus_target
            .and_then(|id| particles.get(id))
            .and_then(|entity| scene.graph.parent(entity.node()))
            .map(|parent| self.focus_frame(scene, parent_inverse(scene, parent)));

        let viewport_limit = (logical_width < self.focus.compact_width).then(|| {
            let (width, height) = scene.camera.visible_extent(self.focus.distance);
            (width * self.focus.viewport_fill, height * self.focus.viewport_fill)
        });

        let ctx = FrameContext {
            dt,
            elapsed,
            mode: state.mode(),
            focus_target,
            focus_frame,
            viewport_limit,
            focus: &self.focus,
        };

        for entity in particles.entities() {
            if let Some(transform) = scene.graph.transform_mut(entity.node()) {
                entity.update(transform, &ctx);
            }
        }

        FrameStats {
            dt,
            elapsed,
            entities_updated: particles.len(),
        }
    }

    fn rotate(&self, dt: f32, state: &mut SceneState) {
        let cfg = &self.rotation;
        let mode = state.mode();
        let hand = state.hand;
        let rotation = &mut state.rotation;

        match mode {
            Mode::Scatter if hand.detected => {
                let target_y = hand.x * cfg.hand_yaw_range;
                let target_x = hand.y * cfg.hand_pitch_range;
                let rate = (cfg.hand_tracking_rate * dt).min(1.0);
                rotation.y += (target_y - rotation.y) * rate;
                rotation.x += (target_x - rotation.x) * rate;
            }
            Mode::Tree => {
                rotation.y += cfg.tree_yaw_rate * dt;
                rotation.x += (0.0 - rotation.x) * (cfg.tree_pitch_decay * dt).min(1.0);
            }
            _ => rotation.y += cfg.idle_yaw_rate * dt,
        }
    }

    /// Focus point and camera eye in the space of a focused entity's parent
    fn focus_frame(&self, scene: &Scene, parent_inverse: Matrix4<f32>) -> FocusFrame {
        let camera = &scene.camera;
        let world_point = camera.eye + camera.forward() * self.focus.distance;

        let to_local = |p: Vector3<f32>| (parent_inverse * p.extend(1.0)).truncate();
        FocusFrame {
            point: to_local(world_point),
            eye: to_local(camera.eye),
        }
    }
}

fn parent_inverse(scene: &Scene, parent: NodeId) -> Matrix4<f32> {
    scene
        .graph
        .world_matrix(parent)
        .invert()
        .unwrap_or_else(Matrix4::identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use cgmath::InnerSpace;
    use crate::gfx::material::TextureId;
    use crate::simulation::entity::EntityId;
    use float_cmp::approx_eq;
    use std::f32::consts::PI;
    use std::time::Duration;

    struct CountingRenderer(usize);

    impl SceneRenderer for CountingRenderer {
        fn render(&mut self, _scene: &Scene) {
            self.0 += 1;
        }
    }

    fn setup() -> (AnimationLoop, SceneState, Scene, ParticleSystem, Instant) {
        let config = SceneConfig::default().with_seed(3).with_ornament_count(20).with_dust_count(20);
        let mut scene = Scene::from_camera_config(&config.camera, 1.0);
        let mut particles = ParticleSystem::new(&config);
        particles.populate(&mut scene, &config.particles);
        let now = Instant::now();
        let animation = AnimationLoop::new(config.rotation.clone(), config.focus.clone(), now);
        (animation, SceneState::new(), scene, particles, now)
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let (mut animation, mut state, mut scene, particles, start) = setup();
        let stats = animation
            .tick(start + Duration::from_secs(3), &mut state, &mut scene, &particles, 1920)
            .unwrap();
        assert_eq!(stats.dt, 0.1);
        assert!(approx_eq!(f32, stats.elapsed, 3.0, epsilon = 1e-4));
        assert_eq!(stats.entities_updated, 40);
    }

    #[test]
    fn test_rotation_rules() {
        let (mut animation, mut state, mut scene, particles, _) = setup();

        state.rotation.x = 0.5;
        animation.step(0.1, 0.0, &mut state, &mut scene, &particles, 1920);
        assert!(approx_eq!(f32, state.rotation.y, 0.03, epsilon = 1e-6));
        assert!(approx_eq!(f32, state.rotation.x, 0.4, epsilon = 1e-6));

        state.enter_scatter();
        animation.step(0.1, 0.1, &mut state, &mut scene, &particles, 1920);
        assert!(approx_eq!(f32, state.rotation.y, 0.04, epsilon = 1e-6));

        state.hand.detected = true;
        state.hand.x = 1.0;
        state.hand.y = 0.0;
        for _ in 0..200 {
            animation.step(0.05, 0.0, &mut state, &mut scene, &particles, 1920);
        }
        assert!(approx_eq!(f32, state.rotation.y, 0.9 * PI, epsilon = 1e-3));
        assert!(state.rotation.x.abs() < 1e-3);

        let group = scene.graph.transform(scene.main_group).unwrap();
        assert_eq!(group.rotation, Vector3::new(state.rotation.x, state.rotation.y, 0.0));
    }

    #[test]
    fn test_focused_photo_settles_in_front_of_camera() {
        let (_, mut state, mut scene, mut particles, now) = setup();
        // Without idle spin the focus point stops moving and the photo can settle
        let rotation = RotationConfig {
            idle_yaw_rate: 0.0,
            ..RotationConfig::default()
        };
        let mut animation = AnimationLoop::new(rotation, FocusConfig::default(), now);
        let photo = particles.add_photo(&mut scene, TextureId(0), (64, 64));
        state.focus_on(photo);

        for _ in 0..300 {
            animation.step(0.05, 0.0, &mut state, &mut scene, &particles, 1920);
        }

        let node = particles.get(photo).unwrap().node();
        let world = scene.graph.world_matrix(node) * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let expected = Vector3::new(0.0, 2.0, 35.0);
        assert!((world.truncate() - expected).magnitude() < 1e-2, "{world:?}");

        let scale = scene.graph.transform(node).unwrap().scale;
        assert!(approx_eq!(f32, scale, 4.5, epsilon = 1e-3));
    }

    #[test]
    fn test_compact_viewport_clamps_focused_scale() {
        let (mut animation, mut state, mut scene, mut particles, _) = setup();
        let photo = particles.add_photo(&mut scene, TextureId(0), (64, 64));
        state.focus_on(photo);
        scene.camera.resize_projection(400, 900);

        for _ in 0..300 {
            animation.step(0.05, 0.0, &mut state, &mut scene, &particles, 400);
        }

        let (w, h) = scene.camera.visible_extent(15.0);
        let limit = (w * 0.85 / 1.4).min(h * 0.85 / 1.4);
        let scale = scene.graph.transform(particles.get(photo).unwrap().node()).unwrap().scale;
        assert!(limit < 4.5);
        assert!(approx_eq!(f32, scale, limit, epsilon = 1e-3));
    }

    #[test]
    fn test_logical_width() {
        assert_eq!(logical_width(1170, 3.0), 390);
        assert_eq!(logical_width(1536, 2.0), 768);
        assert_eq!(logical_width(1000, 1.25), 800);
        assert_eq!(logical_width(900, 0.0), 900);
        assert_eq!(logical_width(900, f64::NAN), 900);
    }

    #[test]
    fn test_hidpi_narrow_screen_is_compact() {
        let (mut animation, mut state, mut scene, mut particles, _) = setup();
        let photo = particles.add_photo(&mut scene, TextureId(0), (64, 64));
        state.focus_on(photo);
        scene.camera.resize_projection(1170, 2532);
        let node = particles.get(photo).unwrap().node();

        // 1170 physical pixels at 3x is a 390 pixel wide phone
        for _ in 0..300 {
            animation.step(0.05, 0.0, &mut state, &mut scene, &particles, logical_width(1170, 3.0));
        }
        let (w, h) = scene.camera.visible_extent(15.0);
        let limit = (w * 0.85 / 1.4).min(h * 0.85 / 1.4);
        let scale = scene.graph.transform(node).unwrap().scale;
        assert!(limit < 4.5);
        assert!(approx_eq!(f32, scale, limit, epsilon = 1e-3));

        // The physical width alone would have skipped the clamp
        for _ in 0..300 {
            animation.step(0.05, 0.0, &mut state, &mut scene, &particles, 1170);
        }
        let scale = scene.graph.transform(node).unwrap().scale;
        assert!(approx_eq!(f32, scale, 4.5, epsilon = 1e-3));
    }

    #[test]
    fn test_invalid_focus_target_is_dropped() {
        let (mut animation, mut state, mut scene, particles, _) = setup();
        // Entity 0 is an ornament, never a valid focus target
        state.focus_on(EntityId::new(0));
        animation.step(0.016, 0.0, &mut state, &mut scene, &particles, 1920);
        assert_eq!(state.focus_target(), None);
        assert_eq!(state.mode(), Mode::Focus);
    }

    #[test]
    fn test_stopped_loop_does_not_render() {
        let (mut animation, mut state, mut scene, particles, start) = setup();
        let mut renderer = CountingRenderer(0);

        let frame = animation.frame(start, &mut state, &mut scene, &particles, 800, &mut renderer);
        assert!(frame.is_some());
        assert_eq!(renderer.0, 1);

        animation.stop();
        assert!(!animation.is_running());
        let frame = animation.frame(start, &mut state, &mut scene, &particles, 800, &mut renderer);
        assert!(frame.is_none());
        assert_eq!(renderer.0, 1);
    }
}
