//! Typed tracker configuration.
//!
//! Every section deserializes with `#[serde(default)]`, so a JSON file only
//! needs the keys it overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Coarse dark-block search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Pixels skipped on every frame edge.
    pub ignore_bounds: u32,
    /// Spacing between scanned block corners.
    pub block_stride: u32,
    /// Side length of a scanned block.
    pub block_size: u32,
    /// Spacing of the sparse samples inside a block.
    pub sample_stride: u32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            ignore_bounds: 20,
            block_stride: 10,
            block_size: 20,
            sample_stride: 5,
        }
    }
}

/// Multi-level inverted thresholding around the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Intensity margins added to the darkest sample, in strict/medium/relaxed order.
    pub margins: [u8; 3],
    /// Side of the square kept around the seed.
    pub mask_size: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            margins: [5, 15, 25],
            mask_size: 250,
        }
    }
}

/// Candidate contour filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Minimum enclosed area (px²).
    pub min_area: f64,
    /// Maximum bounding-box aspect ratio `max(w, h) / min(w, h)`.
    pub max_aspect_ratio: f64,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            min_area: 1000.0,
            max_aspect_ratio: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Relative improvement a competing level needs before the selection switches.
    pub switch_margin: f64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self { switch_margin: 2.0 }
    }
}

/// Angle-based contour refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Keep-test threshold angle in degrees.
    pub angle_threshold_deg: f64,
    /// Neighbor spacing as a fraction of the contour length.
    pub sample_fraction: f64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            angle_threshold_deg: 60.0,
            sample_fraction: 1.0 / 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Seed displacement from the anchor (px) above which an alert is raised.
    pub lock_threshold_px: f64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_threshold_px: 5.0,
        }
    }
}

/// Serial command/acknowledgment protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Longest wait for an acknowledgment byte.
    pub ack_timeout_ms: u64,
    /// Byte the actuator answers with on success.
    pub ack_byte: u8,
    /// Byte the actuator sends to request session shutdown.
    pub terminate_byte: u8,
    /// Retry a command whose acknowledgment failed on the next frame, even
    /// if the drift state did not change.
    pub resend_on_failure: bool,
}

impl ActuatorConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 500,
            ack_byte: b'A',
            terminate_byte: b'E',
            resend_on_failure: false,
        }
    }
}

/// Frame normalization applied before detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Session frame width after crop/resize.
    pub frame_width: u32,
    /// Session frame height after crop/resize.
    pub frame_height: u32,
    /// Digital zoom factor; values `<= 1` disable zoom.
    pub zoom_factor: f32,
    /// Zoom center in session-frame pixels; frame center when absent.
    pub zoom_center: Option<[u32; 2]>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            zoom_factor: 1.0,
            zoom_center: None,
        }
    }
}

/// Complete tracker configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub seed: SeedConfig,
    pub threshold: ThresholdConfig,
    pub contour: ContourConfig,
    pub hysteresis: HysteresisConfig,
    pub refine: RefineConfig,
    pub lock: LockConfig,
    pub actuator: ActuatorConfig,
    pub preprocess: PreprocessConfig,
}

impl TrackerConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError(msg.to_string()));

        let s = &self.seed;
        if s.block_stride == 0 || s.block_size == 0 || s.sample_stride == 0 {
            return fail("seed strides and block size must be positive");
        }
        let [strict, medium, relaxed] = self.threshold.margins;
        if !(strict <= medium && medium <= relaxed) {
            return fail("threshold margins must be non-decreasing (strict <= medium <= relaxed)");
        }
        if self.threshold.mask_size == 0 {
            return fail("threshold.mask_size must be positive");
        }
        if !(self.contour.min_area >= 0.0) {
            return fail("contour.min_area must be non-negative");
        }
        if !(self.contour.max_aspect_ratio >= 1.0) {
            return fail("contour.max_aspect_ratio must be at least 1");
        }
        if !(self.hysteresis.switch_margin >= 0.0) {
            return fail("hysteresis.switch_margin must be non-negative");
        }
        if !(self.refine.sample_fraction > 0.0 && self.refine.sample_fraction <= 1.0) {
            return fail("refine.sample_fraction must lie in (0, 1]");
        }
        if !self.refine.angle_threshold_deg.is_finite() {
            return fail("refine.angle_threshold_deg must be finite");
        }
        if !(self.lock.lock_threshold_px >= 0.0) {
            return fail("lock.lock_threshold_px must be non-negative");
        }
        let a = &self.actuator;
        if a.ack_timeout_ms == 0 {
            return fail("actuator.ack_timeout_ms must be positive");
        }
        if a.ack_byte == a.terminate_byte {
            return fail("actuator ack and terminate bytes must differ");
        }
        let p = &self.preprocess;
        if p.frame_width == 0 || p.frame_height == 0 {
            return fail("preprocess frame size must be positive");
        }
        if !p.zoom_factor.is_finite() {
            return fail("preprocess.zoom_factor must be finite");
        }
        Ok(())
    }
}
