//! # Scene Configuration
//!
//! Tunable constants for the tree scene, grouped by the subsystem that reads
//! them. Every group implements [`Default`] with the reference values, and
//! [`SceneConfig`] exposes builder-style `with_*` methods for the values
//! applications usually change.
//!
//! ```no_run
//! use tinsel::config::SceneConfig;
//!
//! let config = SceneConfig::default()
//!     .with_ornament_count(800)
//!     .with_seed(7)
//!     .with_photo_api("https://photos.example.com");
//! ```

use std::f32::consts::PI;
use std::ops::Range;
use std::time::Duration;

use cgmath::{Deg, Rad, Vector3};

/// Complete configuration for a tree scene
#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
    pub particles: ParticleConfig,
    pub layout: LayoutConfig,
    pub camera: CameraConfig,
    pub focus: FocusConfig,
    pub gestures: GestureThresholds,
    pub pointer: PointerConfig,
    pub rotation: RotationConfig,
    pub photos: PhotoConfig,
}

/// Population sizes and tree dimensions
#[derive(Debug, Clone)]
pub struct ParticleConfig {
    /// Number of ornament entities created at startup
    pub ornament_count: usize,
    /// Number of dust motes created at startup
    pub dust_count: usize,
    /// Tree height `H`; the tree spans `-H/2..=H/2` on the Y axis
    pub tree_height: f32,
    /// Base radius `R` of the tree at its lowest point
    pub tree_radius: f32,
    /// Seed for the scene's random source, `None` for entropy
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            ornament_count: 1500,
            dust_count: 2500,
            tree_height: 24.0,
            tree_radius: 8.0,
            seed: None,
        }
    }
}

/// Procedural layout tuning
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Exponent applied to the height parameter, biases samples toward the base
    pub height_bias: f32,
    /// Angular advance over the full height of the tree, controls spiral tightness
    pub spiral: f32,
    /// Smallest radius allowed near the tip
    pub min_radius: f32,
    /// Radial jitter multiplier range
    pub jitter: Range<f32>,
    /// Scatter radius range for ornaments and photos
    pub scatter_radius: Range<f32>,
    /// Scatter radius range for dust motes
    pub dust_scatter_radius: Range<f32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            height_bias: 0.8,
            spiral: 50.0 * PI,
            min_radius: 0.5,
            jitter: 0.8..1.2,
            scatter_radius: 8.0..20.0,
            dust_scatter_radius: 12.0..32.0,
        }
    }
}

/// Perspective camera placement
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 2.0, 50.0),
            target: Vector3::new(0.0, 2.0, 0.0),
            fovy: Deg(42.0).into(),
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

/// Close-up photo presentation
#[derive(Debug, Clone)]
pub struct FocusConfig {
    /// Distance in front of the camera where the focused photo settles
    pub distance: f32,
    /// Target scale of the focused photo
    pub scale: f32,
    /// Fraction of the visible viewport the focused photo may cover
    pub viewport_fill: f32,
    /// Surface widths below this (in logical pixels) clamp the focused photo to the viewport
    pub compact_width: u32,
    /// Position lerp speed of the focused entity
    pub focused_lerp_speed: f32,
    /// Position lerp speed of every other entity
    pub lerp_speed: f32,
    /// Scale lerp rate shared by all entities
    pub scale_lerp_rate: f32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            distance: 15.0,
            scale: 4.5,
            viewport_fill: 0.85,
            compact_width: 768,
            focused_lerp_speed: 5.0,
            lerp_speed: 2.0,
            scale_lerp_rate: 4.0,
        }
    }
}

/// Hand-gesture classification thresholds, in normalized image units
#[derive(Debug, Clone)]
pub struct GestureThresholds {
    /// Thumb-tip to index-tip distance under which the hand is pinching
    pub pinch: f32,
    /// Average fingertip-to-wrist distance under which the hand is closed
    pub closed: f32,
    /// Average fingertip-to-wrist distance over which the hand is open
    pub open: f32,
    /// Gesture input is ignored for this long after a pointer selection
    pub manual_suppression: Duration,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            pinch: 0.05,
            closed: 0.25,
            open: 0.4,
            manual_suppression: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointerConfig {
    /// Events arriving within this window of the last accepted one are dropped
    pub dedup_window: Duration,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            dedup_window: Duration::from_millis(300),
        }
    }
}

/// Rotation of the main group
#[derive(Debug, Clone)]
pub struct RotationConfig {
    pub hand_yaw_range: f32,
    pub hand_pitch_range: f32,
    pub hand_tracking_rate: f32,
    pub tree_yaw_rate: f32,
    pub tree_pitch_decay: f32,
    pub idle_yaw_rate: f32,
    /// Upper bound for a single frame delta, in seconds
    pub max_frame_delta: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            hand_yaw_range: 0.9 * PI,
            hand_pitch_range: 0.25 * PI,
            hand_tracking_rate: 3.0,
            tree_yaw_rate: 0.3,
            tree_pitch_decay: 2.0,
            idle_yaw_rate: 0.1,
            max_frame_delta: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhotoConfig {
    /// Base URL of the remote photo listing service
    pub listing_url: Option<String>,
    pub folder: String,
    /// Remote photos are padded with fallback cards up to this count
    pub min_photos: usize,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            listing_url: None,
            folder: "christmas-tree".to_string(),
            min_photos: 5,
        }
    }
}

impl SceneConfig {
    /// Default configuration overlaid with `TINSEL_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TINSEL_PHOTO_API") {
            if !url.trim().is_empty() {
                config.photos.listing_url = Some(url);
            }
        }
        if let Ok(folder) = std::env::var("TINSEL_PHOTO_FOLDER") {
            config.photos.folder = folder;
        }
        if let Ok(seed) = std::env::var("TINSEL_SEED") {
            match seed.parse() {
                Ok(seed) => config.particles.seed = Some(seed),
                Err(_) => log::warn!("Ignoring TINSEL_SEED={seed:?}: not an unsigned integer"),
            }
        }

        config
    }

    pub fn with_ornament_count(mut self, count: usize) -> Self {
        self.particles.ornament_count = count;
        self
    }

    pub fn with_dust_count(mut self, count: usize) -> Self {
        self.particles.dust_count = count;
        self
    }

    pub fn with_tree_size(mut self, height: f32, radius: f32) -> Self {
        self.particles.tree_height = height;
        self.particles.tree_radius = radius;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.particles.seed = Some(seed);
        self
    }

    pub fn with_photo_api(mut self, url: impl Into<String>) -> Self {
        self.photos.listing_url = Some(url.into());
        self
    }

    pub fn with_min_photos(mut self, count: usize) -> Self {
        self.photos.min_photos = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = SceneConfig::default()
            .with_ornament_count(10)
            .with_dust_count(3)
            .with_tree_size(12.0, 4.0)
            .with_seed(99)
            .with_min_photos(2);

        assert_eq!(config.particles.ornament_count, 10);
        assert_eq!(config.particles.dust_count, 3);
        assert_eq!(config.particles.tree_height, 12.0);
        assert_eq!(config.particles.tree_radius, 4.0);
        assert_eq!(config.particles.seed, Some(99));
        assert_eq!(config.photos.min_photos, 2);
    }

    #[test]
    fn test_reference_values() {
        let config = SceneConfig::default();
        assert_eq!(config.gestures.manual_suppression, Duration::from_millis(2000));
        assert_eq!(config.pointer.dedup_window, Duration::from_millis(300));
        assert_eq!(config.layout.dust_scatter_radius, 12.0..32.0);
        assert_eq!(config.photos.min_photos, 5);
    }
}
