//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the tree.
//!
//! ## Key Components
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu
//! - [`OverlayPanel`] - Title, gesture hints and live status
//!
//! ## Input Handling
//!
//! Window events pass through [`UiManager::handle_input`] first. Clicks the
//! overlay captures never reach the tree's pointer handling.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{OverlayPanel, OverlayStatus};
