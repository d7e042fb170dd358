//! # Graphics Module
//!
//! This module contains the graphics side of the tree: the camera, the
//! procedural unit meshes, materials, the scene graph, ray picking and the
//! wgpu renderer that draws it all.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - Fixed perspective camera and its GPU uniform
//! - **Geometry** ([`geometry`]) - Unit meshes generated at startup
//! - **Materials** ([`material`]) - Palette of the tree's ornament materials
//! - **Scene Management** ([`scene`]) - Node arena with per-node transforms
//! - **Picking** ([`picking`]) - Screen rays against node bounds
//! - **Rendering** ([`rendering`]) - Instanced solid and photo pipelines
//!
//! ## Usage
//!
//! The renderer consumes a [`Scene`] once per frame:
//!
//! ```no_run
//! use tinsel::gfx::{RenderEngine, scene::Scene};
//!
//! // The render engine is created by TinselApp once a window exists
//! // let render_engine = RenderEngine::new(window, width, height).await?;
//! ```
//!
//! [`Scene`]: scene::Scene

pub mod camera;
pub mod geometry;
pub mod material;
pub mod picking;
pub mod rendering;
pub mod scene;

// Re-export commonly used types
pub use camera::PerspectiveCamera;
pub use rendering::render_engine::RenderEngine;
