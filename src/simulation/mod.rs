//! # Tree Simulation
//!
//! The animation core of the scene. Nothing in here touches the GPU; the
//! renderer only ever sees the [`Scene`](crate::gfx::scene::Scene) these
//! modules keep up to date.
//!
//! ## Components
//!
//! - [`layout`] - procedural tree and scatter positions
//! - [`entity`] - per-object blending toward the active layout
//! - [`state`] - mode, focus target, hand sample and rotation
//! - [`gesture`] - hand landmarks to mode transitions
//! - [`pointer`] - click and tap selection of photos
//! - [`animation`] - the per-frame driver
//! - [`particles`] - scene population and the entity collection
//! - [`tree`] - all of the above assembled into one scene

pub mod animation;
pub mod entity;
pub mod gesture;
pub mod layout;
pub mod particles;
pub mod pointer;
pub mod state;
pub mod tree;

pub use animation::{logical_width, AnimationLoop, FrameStats, SceneRenderer};
pub use entity::{Entity, EntityId, EntityKind};
pub use gesture::{
    Detection, FrameSource, Gesture, GestureError, GestureInput, GestureOutcome, GestureProcessor,
    HandLandmarker, HandLandmarks, Landmark, VideoFrame,
};
pub use layout::{LayoutGenerator, LayoutTargets};
pub use particles::ParticleSystem;
pub use pointer::{PointerEvent, PointerHandler, PointerKind, PointerOutcome};
pub use state::{HandSample, Mode, Rotation, SceneState};
pub use tree::ChristmasTree;
