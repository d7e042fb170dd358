//! # Photo Ingestion
//!
//! Photos reach the tree from three places:
//!
//! - **Uploads**: image files handed to the application, read fully into
//!   memory before decoding
//! - **Remote listing**: a photo service that lists image URLs, each
//!   downloaded in full before decoding
//! - **Fallback cards**: procedurally drawn cards that pad the tree to a
//!   minimum photo count and stand in for remote photos that fail to load
//!
//! Every load runs as its own abortable task on a thread pool. The frame loop
//! collects finished photos with [`PhotoLoader::poll_completed`], which never
//! blocks, and turns each one into a photo entity.

pub mod fallback;
pub mod listing;
pub mod loader;

use std::path::PathBuf;

use image::RgbaImage;
use thiserror::Error;

pub use fallback::fallback_card;
pub use listing::{EmptyListing, HttpPhotoListing, PhotoListing, PhotoRecord};
pub use loader::PhotoLoader;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("request failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("invalid photo listing: {0}")]
    Listing(String),
    #[error("photo load cancelled")]
    Cancelled,
    #[error("photo load panicked: {0}")]
    Panicked(String),
    #[error("failed to start photo loader threads: {0}")]
    Pool(#[source] std::io::Error),
}

/// Where a photo came from
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoOrigin {
    Upload(PathBuf),
    Remote { id: String, url: String },
    Fallback,
}

/// A decoded photo ready to become an entity
#[derive(Debug, Clone)]
pub struct LoadedPhoto {
    pub label: String,
    pub origin: PhotoOrigin,
    pub image: RgbaImage,
}

/// Decodes an in-memory image file of any supported format
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PhotoError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}
