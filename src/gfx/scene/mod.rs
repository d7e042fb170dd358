//! # Scene Management Module
//!
//! This module provides the scene graph the tree is built from: an arena of
//! transform nodes, the drawables attached to them, and the [`Scene`] that
//! ties the graph to the camera and the uploaded photo textures.
//!
//! ## Key Components
//!
//! - [`Scene`] - Scene container holding camera, node graph and photo textures
//! - [`SceneGraph`] - Arena of nodes addressed by [`NodeId`]
//! - [`Transform`] - Position, Euler rotation and uniform scale of a node
//! - [`Drawable`] - Unit mesh, extent and material rendered by a node
//! - [`Vertex3D`] - GPU vertex layout
//!
//! ## Usage
//!
//! ```no_run
//! use tinsel::config::CameraConfig;
//! use tinsel::gfx::scene::{Scene, Transform};
//!
//! let mut scene = Scene::from_camera_config(&CameraConfig::default(), 16.0 / 9.0);
//! let node = scene.graph.add_node(scene.main_group, Transform::default(), None);
//! ```

pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use node::{Drawable, MeshKind, Node, NodeId, SceneGraph, Transform};
pub use scene::{PhotoTexture, Scene, SceneStatistics};
pub use vertex::Vertex3D;
