//! Hand-gesture input
//!
//! The hand detector itself is an external capability: anything that turns a
//! [`VideoFrame`] into landmarks implements [`HandLandmarker`]. This module
//! validates what the detector reports and maps it onto mode transitions.
//!
//! ## Gestures
//!
//! - **Pinch** (thumb tip close to index tip): focus a random photo
//! - **Closed fist** (fingertips near the wrist): form the tree
//! - **Open hand** (fingertips far from the wrist): scatter
//!
//! Anything between the closed and open thresholds is a dead zone, so a hand
//! hovering near a threshold does not flicker between modes.

use std::time::{Duration, Instant};

use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};
use thiserror::Error;

use crate::config::GestureThresholds;

use super::entity::EntityId;
use super::state::{Mode, SceneState};

/// Landmarks reported per hand
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
/// Base of the middle finger, used as the palm center
pub const PALM: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

const FINGERTIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GestureError {
    #[error("hand tracking unavailable: {0}")]
    Unavailable(String),
    #[error("hand detection failed: {0}")]
    Inference(String),
    #[error("expected {expected} landmarks per hand, got {found}")]
    MalformedDetection { expected: usize, found: usize },
    #[error("landmark {index} is not a finite point")]
    NonFiniteLandmark { index: usize },
}

/// A landmark in normalized image coordinates (0..1 on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One hand's full landmark set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks([Landmark; LANDMARK_COUNT]);

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self(points)
    }

    pub fn get(&self, index: usize) -> Landmark {
        self.0[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.0
    }

    /// Distance between the thumb tip and the index tip
    pub fn pinch_distance(&self) -> f32 {
        self.0[THUMB_TIP].distance(&self.0[INDEX_TIP])
    }

    /// Average distance from the four fingertips to the wrist
    pub fn openness(&self) -> f32 {
        let wrist = self.0[WRIST];
        FINGERTIPS
            .iter()
            .map(|&tip| self.0[tip].distance(&wrist))
            .sum::<f32>()
            / FINGERTIPS.len() as f32
    }

    /// Palm center remapped from 0..1 to -1..1
    pub fn palm_position(&self) -> (f32, f32) {
        let palm = self.0[PALM];
        ((palm.x - 0.5) * 2.0, (palm.y - 0.5) * 2.0)
    }
}

/// What the detector saw in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    NoHand,
    Hand(HandLandmarks),
}

impl Detection {
    /// Validates raw detector output: one list of `(x, y)` points per hand
    ///
    /// Only the first hand is used. Each hand must carry exactly
    /// [`LANDMARK_COUNT`] finite points.
    pub fn from_points(hands: &[Vec<(f32, f32)>]) -> Result<Self, GestureError> {
        let Some(points) = hands.first() else {
            return Ok(Detection::NoHand);
        };

        if points.len() != LANDMARK_COUNT {
            return Err(GestureError::MalformedDetection {
                expected: LANDMARK_COUNT,
                found: points.len(),
            });
        }

        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (index, &(x, y)) in points.iter().enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(GestureError::NonFiniteLandmark { index });
            }
            landmarks[index] = Landmark::new(x, y);
        }

        Ok(Detection::Hand(HandLandmarks(landmarks)))
    }
}

/// A captured camera frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels
    pub pixels: Vec<u8>,
    /// Presentation time of the frame within the video stream
    pub timestamp: Duration,
}

/// External hand-landmark detector
pub trait HandLandmarker {
    /// Runs detection on one frame
    ///
    /// `timestamp` is the caller's monotonic clock, which video-mode
    /// detectors use to track hands between frames.
    fn detect(&mut self, frame: &VideoFrame, timestamp: Duration) -> Result<Detection, GestureError>;
}

/// External camera feed
pub trait FrameSource {
    /// The most recent frame, or `None` if the camera has not produced one yet
    fn latest_frame(&mut self) -> Option<VideoFrame>;
}

/// A connected camera and detector
pub struct GestureInput {
    source: Box<dyn FrameSource>,
    landmarker: Box<dyn HandLandmarker>,
    last_frame_time: Option<Duration>,
}

impl GestureInput {
    pub fn new(source: Box<dyn FrameSource>, landmarker: Box<dyn HandLandmarker>) -> Self {
        Self {
            source,
            landmarker,
            last_frame_time: None,
        }
    }

    /// Detects on the newest frame if the video has advanced
    ///
    /// Returns `None` when there is no new frame or detection failed; failures
    /// are logged and never escape.
    pub fn poll(&mut self, clock: Duration) -> Option<Detection> {
        let frame = self.source.latest_frame()?;
        if self.last_frame_time == Some(frame.timestamp) {
            return None;
        }
        self.last_frame_time = Some(frame.timestamp);

        match self.landmarker.detect(&frame, clock) {
            Ok(detection) => Some(detection),
            Err(e) => {
                log::warn!("Hand detection error: {e}");
                None
            }
        }
    }
}

/// Classification of a detected hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Pinch,
    Closed,
    Open,
    /// Between the closed and open thresholds
    Hover,
}

impl Gesture {
    /// Classifies a hand, checking the pinch first
    pub fn classify(hand: &HandLandmarks, thresholds: &GestureThresholds) -> Self {
        if hand.pinch_distance() < thresholds.pinch {
            return Gesture::Pinch;
        }

        let openness = hand.openness();
        if openness < thresholds.closed {
            Gesture::Closed
        } else if openness > thresholds.open {
            Gesture::Open
        } else {
            Gesture::Hover
        }
    }
}

/// What processing a detection did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// A recent pointer selection takes priority; nothing changed
    Suppressed,
    NoHand,
    Hand(Gesture),
}

/// Maps detections onto scene state
pub struct GestureProcessor {
    thresholds: GestureThresholds,
    rng: StdRng,
}

impl GestureProcessor {
    pub fn new(thresholds: GestureThresholds, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { thresholds, rng }
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    /// Applies one detection to `state`
    ///
    /// `photos` are the entities a pinch may focus.
    pub fn process(
        &mut self,
        detection: &Detection,
        state: &mut SceneState,
        photos: &[EntityId],
        now: Instant,
    ) -> GestureOutcome {
        if state.pointer_event_within(now, self.thresholds.manual_suppression) {
            return GestureOutcome::Suppressed;
        }

        let hand = match detection {
            Detection::NoHand => {
                state.hand.detected = false;
                return GestureOutcome::NoHand;
            }
            Detection::Hand(hand) => hand,
        };

        let (x, y) = hand.palm_position();
        state.hand.detected = true;
        state.hand.x = x;
        state.hand.y = y;

        let gesture = Gesture::classify(hand, &self.thresholds);
        match gesture {
            Gesture::Pinch => {
                if state.mode() != Mode::Focus {
                    match photos.choose(&mut self.rng) {
                        Some(&photo) => state.focus_on(photo),
                        None => state.enter_focus_without_target(),
                    }
                }
            }
            Gesture::Closed => state.enter_tree(),
            Gesture::Open => state.enter_scatter(),
            Gesture::Hover => {}
        }

        GestureOutcome::Hand(gesture)
    }
}
