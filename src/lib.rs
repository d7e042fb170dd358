// src/lib.rs
//! Tinsel
//!
//! An interactive particle Christmas tree built on wgpu and winit. Ornaments,
//! dust and photos morph between a spiral tree, a scattered starfield and a
//! single focused photo, driven by pointer input or hand gestures.
//!
//! The scene logic in [`simulation`] never touches the GPU; [`app`] wires it
//! to a window, the renderer in [`gfx`] and the photo loader in [`photos`].

pub mod app;
pub mod config;
pub mod gfx;
pub mod photos;
pub mod simulation;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::TinselApp;
pub use config::SceneConfig;
pub use simulation::ChristmasTree;
