//! The assembled tree scene
//!
//! [`ChristmasTree`] owns the scene, its state and every component that reads
//! or writes them, and exposes one method per external stimulus: a video
//! detection, a pointer event, a new photo or a display refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::config::SceneConfig;
use crate::gfx::picking::ScreenRect;
use crate::gfx::scene::Scene;

use super::animation::{AnimationLoop, FrameStats, SceneRenderer};
use super::entity::EntityId;
use super::gesture::{Detection, GestureError, GestureInput, GestureOutcome, GestureProcessor};
use super::particles::ParticleSystem;
use super::pointer::{PointerEvent, PointerHandler, PointerOutcome};
use super::state::SceneState;

pub struct ChristmasTree {
    config: SceneConfig,
    scene: Scene,
    state: SceneState,
    particles: ParticleSystem,
    gestures: GestureProcessor,
    pointer: PointerHandler,
    animation: AnimationLoop,
    gesture_input: Option<GestureInput>,
    started: Instant,
}

impl ChristmasTree {
    /// Builds and populates a scene for a surface with the given aspect ratio
    pub fn new(config: SceneConfig, aspect: f32, now: Instant) -> Self {
        let mut scene = Scene::from_camera_config(&config.camera, aspect);
        let mut particles = ParticleSystem::new(&config);
        particles.populate(&mut scene, &config.particles);

        // Offset the gesture seed so pinch choices differ from the layout stream
        let gesture_seed = config.particles.seed.map(|seed| seed.wrapping_add(1));

        Self {
            gestures: GestureProcessor::new(config.gestures.clone(), gesture_seed),
            pointer: PointerHandler::new(&config.pointer),
            animation: AnimationLoop::new(config.rotation.clone(), config.focus.clone(), now),
            state: SceneState::new(),
            gesture_input: None,
            started: now,
            config,
            scene,
            particles,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn photo_count(&self) -> usize {
        self.particles.photo_count()
    }

    /// Adds a decoded photo as a new entity
    pub fn add_photo(&mut self, label: impl Into<String>, image: Arc<RgbaImage>) -> EntityId {
        let size = image.dimensions();
        let texture = self.scene.add_texture(label, image);
        self.particles.add_photo(&mut self.scene, texture, size)
    }

    /// Connects hand tracking, or records that it is unavailable
    ///
    /// Pointer control keeps working either way.
    pub fn attach_gesture_input(&mut self, input: Result<GestureInput, GestureError>) {
        match input {
            Ok(input) => {
                log::info!("Hand tracking enabled");
                self.gesture_input = Some(input);
            }
            Err(e) => {
                log::warn!("Hand tracking unavailable, continuing with pointer control: {e}");
                self.gesture_input = None;
            }
        }
    }

    pub fn has_hand_tracking(&self) -> bool {
        self.gesture_input.is_some()
    }

    /// Runs the detector on the newest video frame, if there is one
    pub fn poll_gestures(&mut self, now: Instant) -> Option<GestureOutcome> {
        let clock: Duration = now.saturating_duration_since(self.started);
        let detection = self.gesture_input.as_mut()?.poll(clock)?;
        Some(self.apply_detection(&detection, now))
    }

    /// Applies one detection result to the scene state
    pub fn apply_detection(&mut self, detection: &Detection, now: Instant) -> GestureOutcome {
        let photos = self.particles.photos();
        self.gestures.process(detection, &mut self.state, &photos, now)
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent, rect: &ScreenRect) -> PointerOutcome {
        self.pointer
            .handle(event, rect, &self.scene, &self.particles, &mut self.state)
    }

    /// Advances the animation to `now` without rendering
    pub fn tick(&mut self, now: Instant, logical_width: u32) -> Option<FrameStats> {
        self.animation.tick(
            now,
            &mut self.state,
            &mut self.scene,
            &self.particles,
            logical_width,
        )
    }

    /// Advances the animation to `now` and renders the result
    pub fn frame(
        &mut self,
        now: Instant,
        logical_width: u32,
        renderer: &mut dyn SceneRenderer,
    ) -> Option<FrameStats> {
        self.animation.frame(
            now,
            &mut self.state,
            &mut self.scene,
            &self.particles,
            logical_width,
            renderer,
        )
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.scene.camera.resize_projection(width, height);
        }
    }

    pub fn is_running(&self) -> bool {
        self.animation.is_running()
    }

    /// Stops the animation loop and releases the camera feed
    pub fn stop(&mut self) {
        self.animation.stop();
        self.gesture_input = None;
    }
}
