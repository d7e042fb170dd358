//! Shared scene state
//!
//! [`SceneState`] is the single record the input handlers write and the
//! animation loop reads. Mode and focus target are private so the pairing
//! between them can only change through the transition methods below.

use std::time::{Duration, Instant};

use super::entity::EntityId;

/// Global layout of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Entities sit on the spiral tree formation
    #[default]
    Tree,
    /// Entities drift out to a sphere around the tree
    Scatter,
    /// One photo is pulled in front of the camera
    Focus,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Tree => "TREE",
            Mode::Scatter => "SCATTER",
            Mode::Focus => "FOCUS",
        };
        f.write_str(name)
    }
}

/// Latest hand-tracking sample, `x` and `y` remapped to -1..1
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandSample {
    pub detected: bool,
    pub x: f32,
    pub y: f32,
}

/// Accumulated rotation of the main group, in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SceneState {
    mode: Mode,
    focus_target: Option<EntityId>,
    pub hand: HandSample,
    pub rotation: Rotation,
    last_pointer_event: Option<Instant>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The focused entity; always `None` outside [`Mode::Focus`]
    pub fn focus_target(&self) -> Option<EntityId> {
        self.focus_target
    }

    pub fn enter_tree(&mut self) {
        self.transition(Mode::Tree, None);
    }

    pub fn enter_scatter(&mut self) {
        self.transition(Mode::Scatter, None);
    }

    /// Enters focus mode on `target`, switching directly if another entity
    /// is already focused
    pub fn focus_on(&mut self, target: EntityId) {
        self.transition(Mode::Focus, Some(target));
    }

    /// Enters focus mode with nothing to show, used when no photos exist yet
    pub fn enter_focus_without_target(&mut self) {
        self.transition(Mode::Focus, None);
    }

    /// Drops the focus target if `is_valid` rejects it
    ///
    /// The mode is left untouched; a focus without a target behaves like a
    /// scatter with every entity receding.
    pub fn validate_focus(&mut self, is_valid: impl Fn(EntityId) -> bool) {
        if let Some(target) = self.focus_target {
            if !is_valid(target) {
                log::warn!("Focus target {target:?} is not a live photo, clearing it");
                self.focus_target = None;
            }
        }
    }

    /// Records an accepted pointer selection
    pub fn record_pointer_event(&mut self, at: Instant) {
        self.last_pointer_event = Some(at);
    }

    pub fn last_pointer_event(&self) -> Option<Instant> {
        self.last_pointer_event
    }

    /// Whether a pointer selection was accepted less than `window` before `now`
    pub fn pointer_event_within(&self, now: Instant, window: Duration) -> bool {
        self.last_pointer_event
            .is_some_and(|at| now.saturating_duration_since(at) < window)
    }

    fn transition(&mut self, mode: Mode, focus_target: Option<EntityId>) {
        if self.mode != mode || self.focus_target != focus_target {
            log::debug!(
                "Mode {} -> {} (focus {:?} -> {:?})",
                self.mode,
                mode,
                self.focus_target,
                focus_target
            );
        }
        self.mode = mode;
        self.focus_target = focus_target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaving_focus_clears_target() {
        let mut state = SceneState::new();
        state.focus_on(EntityId::new(3));
        assert_eq!(state.mode(), Mode::Focus);
        assert_eq!(state.focus_target(), Some(EntityId::new(3)));

        state.enter_scatter();
        assert_eq!(state.focus_target(), None);

        state.focus_on(EntityId::new(4));
        state.enter_tree();
        assert_eq!(state.mode(), Mode::Tree);
        assert_eq!(state.focus_target(), None);
    }

    #[test]
    fn test_validate_focus_drops_dead_target() {
        let mut state = SceneState::new();
        state.focus_on(EntityId::new(7));

        state.validate_focus(|id| id == EntityId::new(7));
        assert_eq!(state.focus_target(), Some(EntityId::new(7)));

        state.validate_focus(|_| false);
        assert_eq!(state.focus_target(), None);
        assert_eq!(state.mode(), Mode::Focus);
    }

    #[test]
    fn test_pointer_window() {
        let mut state = SceneState::new();
        let start = Instant::now();
        let window = Duration::from_millis(2000);
        assert!(!state.pointer_event_within(start, window));

        state.record_pointer_event(start);
        assert!(state.pointer_event_within(start + Duration::from_millis(1999), window));
        assert!(!state.pointer_event_within(start + Duration::from_millis(2000), window));
    }
}
