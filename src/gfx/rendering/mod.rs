//! Core rendering functionality
//!
//! Handles render pipelines, GPU resource management, and frame rendering.

pub mod instances;
pub mod mesh_library;
pub mod pipeline_manager;
pub mod render_engine;
pub mod texture;

// Re-export main types
pub use instances::{FrameBatches, InstanceRaw};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
