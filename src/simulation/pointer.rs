//! Mouse and touch selection of photos
//!
//! A click or tap casts a ray through the camera and toggles focus on the
//! nearest photo it hits. Touch screens tend to deliver a synthetic click
//! right after the touch end, so events arriving within the dedup window of
//! the last accepted one are dropped.

use std::time::{Duration, Instant};

use crate::config::PointerConfig;
use crate::gfx::picking::{ObjectPicker, ScreenRect};
use crate::gfx::scene::Scene;

use super::entity::EntityId;
use super::particles::ParticleSystem;
use super::state::{Mode, SceneState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Click,
    TouchEnd,
}

/// A click or touch end, in window coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: (f32, f32),
    pub kind: PointerKind,
    pub timestamp: Instant,
}

impl PointerEvent {
    pub fn click(x: f32, y: f32, timestamp: Instant) -> Self {
        Self {
            position: (x, y),
            kind: PointerKind::Click,
            timestamp,
        }
    }

    pub fn touch_end(x: f32, y: f32, timestamp: Instant) -> Self {
        Self {
            position: (x, y),
            kind: PointerKind::TouchEnd,
            timestamp,
        }
    }
}

/// What handling a pointer event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Too close to the previous accepted event; not consumed
    Deduplicated,
    /// A photo was hit and is now focused
    Focused(EntityId),
    /// The focused photo was hit again, or empty space was hit while focused
    Unfocused,
    /// Nothing was hit and nothing was focused
    Missed,
}

impl PointerOutcome {
    /// Whether the event was accepted and must not propagate further
    pub fn consumed(&self) -> bool {
        !matches!(self, PointerOutcome::Deduplicated)
    }
}

pub struct PointerHandler {
    dedup_window: Duration,
}

impl PointerHandler {
    pub fn new(config: &PointerConfig) -> Self {
        Self {
            dedup_window: config.dedup_window,
        }
    }

    /// The photo entity under a window position, if any
    pub fn pick_photo(
        position: (f32, f32),
        rect: &ScreenRect,
        scene: &Scene,
        particles: &ParticleSystem,
    ) -> Option<EntityId> {
        let ray = ObjectPicker::screen_to_ray(position, rect, &scene.camera);
        let roots = particles.photo_nodes();
        let hit = ObjectPicker::pick_subtrees(&ray, &scene.graph, &roots)?;

        particles
            .owning_entity(&scene.graph, hit.node)
            .filter(|id| particles.is_photo(*id))
    }

    pub fn handle(
        &mut self,
        event: &PointerEvent,
        rect: &ScreenRect,
        scene: &Scene,
        particles: &ParticleSystem,
        state: &mut SceneState,
    ) -> PointerOutcome {
        if let Some(last) = state.last_pointer_event() {
            let since = event.timestamp.saturating_duration_since(last);
            if since < self.dedup_window {
                log::debug!("Dropping {:?} {}ms after the previous event", event.kind, since.as_millis());
                return PointerOutcome::Deduplicated;
            }
        }
        state.record_pointer_event(event.timestamp);

        let picked = Self::pick_photo(event.position, rect, scene, particles);
        log::debug!("{:?} at {:?} picked {:?}", event.kind, event.position, picked);

        match picked {
            Some(photo) if state.focus_target() == Some(photo) => {
                state.enter_tree();
                PointerOutcome::Unfocused
            }
            Some(photo) => {
                state.focus_on(photo);
                PointerOutcome::Focused(photo)
            }
            None if state.mode() == Mode::Focus => {
                state.enter_tree();
                PointerOutcome::Unfocused
            }
            None => PointerOutcome::Missed,
        }
    }
}
