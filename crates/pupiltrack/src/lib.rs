//! pupiltrack — pupil localization and drift alerting for live eye video.
//!
//! Per frame, the pipeline stages are:
//!
//! 1. **Seed** – darkest sparse-sampled block gives a coarse pupil location.
//! 2. **Threshold** – strict/medium/relaxed inverted thresholds around the
//!    seed intensity, restricted to a square window.
//! 3. **Contour** – dilation, external contour tracing, area/aspect filtering.
//! 4. **Scoring** – ellipse-goodness score per level.
//! 5. **Hysteresis** – level selection that resists frame-to-frame flicker.
//! 6. **Refine** – angle-based removal of non-convex contour points.
//! 7. **Fit** – direct least-squares ellipse on the refined points.
//!
//! Lock mode anchors the seed and reports drift; drift transitions are sent
//! to an actuator as single command bytes.
//!
//! # Public API
//! - [`TrackerSession`] runs frames in order and owns all cross-frame state.
//! - [`TrackerConfig`] holds every tunable, loadable from JSON.
//! - Each stage is also exposed as a free function for offline analysis.

pub mod actuator;
pub mod conic;
pub mod config;
pub mod contour;
pub mod error;
pub mod hysteresis;
pub mod lock;
pub mod pipeline;
pub mod preprocess;
pub mod pupil;
pub mod refine;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod threshold;

#[cfg(test)]
mod test_utils;

pub use actuator::{ActuatorLink, ActuatorPort};
pub use conic::Ellipse;
pub use config::TrackerConfig;
pub use error::{ActuatorError, ConfigError, SessionError, TrackError};
pub use lock::{DriftState, LockOutput, LockTracker};
pub use pipeline::LevelReport;
pub use pupil::PupilEstimate;
pub use seed::SeedPoint;
pub use session::{FrameResult, TrackerSession};
pub use threshold::ThresholdLevel;

#[cfg(feature = "serial")]
pub use actuator::open_serial;
