//! Live tracking session: per-frame pipeline plus all cross-frame state.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::actuator::{ActuatorLink, ActuatorPort};
use crate::config::TrackerConfig;
use crate::error::{ActuatorError, ConfigError, SessionError};
use crate::hysteresis::HysteresisState;
use crate::lock::{LockOutput, LockTracker};
use crate::pipeline::{estimate_pupil, evaluate_levels, LevelReport};
use crate::pupil::PupilEstimate;
use crate::seed::{locate_seed, SeedPoint};
use crate::threshold::ThresholdLevel;

/// Everything produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Zero-based index within the session.
    pub frame_index: u64,
    /// `None` when the frame was skipped for lack of a seed.
    pub seed: Option<SeedPoint>,
    /// Per-level diagnostics in scan order; empty for skipped frames.
    pub levels: Vec<LevelReport>,
    /// Highest-scoring level this frame.
    pub candidate_level: Option<ThresholdLevel>,
    /// Level kept by hysteresis.
    pub chosen_level: Option<ThresholdLevel>,
    pub switched: bool,
    pub pupil: PupilEstimate,
    /// Present only while lock mode is engaged.
    pub lock: Option<LockOutput>,
    /// Command acknowledged by the actuator on this frame.
    pub command_sent: Option<char>,
}

impl FrameResult {
    fn skipped(frame_index: u64) -> Self {
        Self {
            frame_index,
            seed: None,
            levels: Vec::new(),
            candidate_level: None,
            chosen_level: None,
            switched: false,
            pupil: PupilEstimate::invalid(),
            lock: None,
            command_sent: None,
        }
    }
}

/// Owns the configuration and the hysteresis, lock and actuator state.
/// Frames must be fed strictly in order.
#[derive(Debug)]
pub struct TrackerSession {
    config: TrackerConfig,
    hysteresis: HysteresisState,
    lock: LockTracker,
    link: ActuatorLink,
    last_seed: Option<SeedPoint>,
    frames: u64,
}

impl TrackerSession {
    /// Session without an actuator. Fails if `config` does not validate.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let link = ActuatorLink::disconnected(config.actuator.clone());
        Ok(Self::with_link(config, link))
    }

    /// Session driving an actuator over `port`. Fails if `config` does not
    /// validate; nothing is sent in that case.
    pub fn with_actuator(
        config: TrackerConfig,
        port: Box<dyn ActuatorPort>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let link = ActuatorLink::new(port, config.actuator.clone());
        Ok(Self::with_link(config, link))
    }

    fn with_link(config: TrackerConfig, link: ActuatorLink) -> Self {
        Self {
            config,
            hysteresis: HysteresisState::default(),
            lock: LockTracker::new(),
            link,
            last_seed: None,
            frames: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn hysteresis(&self) -> &HysteresisState {
        &self.hysteresis
    }

    pub fn lock(&self) -> &LockTracker {
        &self.lock
    }

    pub fn link(&self) -> &ActuatorLink {
        &self.link
    }

    /// Run the full pipeline on one frame.
    ///
    /// A frame without a seed is skipped and leaves all state untouched.
    /// Only a remote terminate from the actuator is returned as an error.
    pub fn process_frame(&mut self, gray: &GrayImage) -> Result<FrameResult, SessionError> {
        let frame_index = self.frames;
        self.frames += 1;

        let seed = match locate_seed(gray, &self.config.seed) {
            Ok(seed) => seed,
            Err(e) => {
                tracing::debug!("frame {} skipped: {}", frame_index, e);
                return Ok(FrameResult::skipped(frame_index));
            }
        };
        self.last_seed = Some(seed);

        let eval = evaluate_levels(gray, seed, &self.config);
        let selection = self.hysteresis.select(&eval.scores(), &self.config.hysteresis);

        let pupil = match selection.chosen.and_then(|level| eval.contour(level)) {
            Some(contour) if selection.score > 0.0 => {
                match estimate_pupil(contour, &self.config.refine) {
                    Ok(pupil) => pupil,
                    Err(e) => {
                        tracing::debug!("frame {}: {}", frame_index, e);
                        PupilEstimate::invalid()
                    }
                }
            }
            _ => PupilEstimate::invalid(),
        };

        let lock = self.lock.update(seed, &self.config.lock);
        let command_sent = match lock {
            Some(out) => self.forward_to_actuator(out)?,
            None => None,
        };

        Ok(FrameResult {
            frame_index,
            seed: Some(seed),
            levels: eval.reports.to_vec(),
            candidate_level: Some(selection.candidate),
            chosen_level: selection.chosen,
            switched: selection.switched,
            pupil,
            lock,
            command_sent,
        })
    }

    fn forward_to_actuator(&mut self, out: LockOutput) -> Result<Option<char>, SessionError> {
        match self.link.apply(out.state) {
            Ok(sent) => Ok(sent.map(char::from)),
            Err(ActuatorError::RemoteTerminate) => Err(SessionError::RemoteTerminate),
            Err(e) => {
                tracing::warn!("{}", e);
                Ok(None)
            }
        }
    }

    /// Engage lock mode at the last seen seed, or disengage it.
    ///
    /// Engaging before any frame produced a seed is refused. Returns whether
    /// lock mode is engaged afterwards.
    pub fn toggle_lock(&mut self) -> bool {
        if self.lock.is_engaged() {
            self.lock.disengage();
            return false;
        }
        match self.last_seed {
            Some(seed) => {
                self.lock.engage(seed);
                true
            }
            None => {
                tracing::warn!("cannot engage lock before a seed has been found");
                false
            }
        }
    }

    /// Return the actuator to the safe command and close the link.
    ///
    /// A missing or unexpected acknowledgment is logged; only transport
    /// failures are reported.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        match self.link.shutdown() {
            Ok(()) => Ok(()),
            Err(ActuatorError::Io(e)) => Err(SessionError::Io(e)),
            Err(e) => {
                tracing::warn!("actuator did not confirm the safe state: {}", e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::testing::ScriptedPort;
    use crate::lock::DriftState;
    use crate::test_utils::{draw_disk_image, uniform_image};

    fn disk_frame(cx: f32, cy: f32) -> GrayImage {
        draw_disk_image(640, 480, [cx, cy], 30.0, 15, 210)
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = TrackerConfig::default();
        config.seed.block_stride = 0;
        assert!(TrackerSession::new(config.clone()).is_err());

        let port = ScriptedPort::acking(b'A', 1);
        assert!(TrackerSession::with_actuator(config, Box::new(port.clone())).is_err());
        assert!(port.sent().is_empty());

        let mut config = TrackerConfig::default();
        config.seed.sample_stride = 0;
        let err = TrackerSession::new(config).unwrap_err();
        assert!(err.to_string().contains("strides"));
    }

    #[test]
    fn dark_disk_is_located() {
        let mut session = TrackerSession::new(TrackerConfig::default()).expect("session");
        let res = session.process_frame(&disk_frame(320.0, 240.0)).expect("frame");

        let seed = res.seed.expect("seed");
        assert!(seed.distance(&SeedPoint::new(320, 240)) < 30.0);
        assert!(res.pupil.valid);
        assert!((res.pupil.center.0 - 320.0).abs() < 2.0, "{:?}", res.pupil);
        assert!((res.pupil.center.1 - 240.0).abs() < 2.0, "{:?}", res.pupil);
        // Dilation grows the traced border by a few pixels.
        let (major, minor) = res.pupil.axes;
        assert!((major - 60.0).abs() < 12.0, "major {}", major);
        assert!((minor - 60.0).abs() < 12.0, "minor {}", minor);
        assert!(major - minor < 3.0);
        assert_eq!(res.chosen_level, Some(ThresholdLevel::Strict));
        assert_eq!(res.levels.len(), 3);
        assert!(res.lock.is_none());
    }

    #[test]
    fn uniform_frame_is_invalid() {
        let mut session = TrackerSession::new(TrackerConfig::default()).expect("session");
        let res = session.process_frame(&uniform_image(640, 480, 128)).expect("frame");
        assert!(res.seed.is_some());
        assert!(!res.pupil.valid);
        assert_eq!(res.pupil, PupilEstimate::invalid());
        assert_eq!(res.chosen_level, None);
    }

    #[test]
    fn undersized_frame_is_skipped_without_state_change() {
        let mut session = TrackerSession::new(TrackerConfig::default()).expect("session");
        session.process_frame(&disk_frame(320.0, 240.0)).expect("frame");
        let before = *session.hysteresis();

        let res = session.process_frame(&uniform_image(40, 40, 0)).expect("frame");
        assert_eq!(res.frame_index, 1);
        assert!(res.seed.is_none());
        assert!(!res.pupil.valid);
        assert_eq!(*session.hysteresis(), before);
    }

    #[test]
    fn lock_requires_a_seed() {
        let mut session = TrackerSession::new(TrackerConfig::default()).expect("session");
        assert!(!session.toggle_lock());
        session.process_frame(&disk_frame(320.0, 240.0)).expect("frame");
        assert!(session.toggle_lock());
        assert!(!session.toggle_lock());
    }

    #[test]
    fn drift_alert_is_sent_once() {
        let port = ScriptedPort::acking(b'A', 4);
        let mut session =
            TrackerSession::with_actuator(TrackerConfig::default(), Box::new(port.clone()))
                .expect("session");

        session.process_frame(&disk_frame(320.0, 240.0)).expect("frame");
        assert!(session.toggle_lock());
        let anchor = session.lock().anchor().expect("anchor");

        // Engaging frame: no drift, 'L' already assumed.
        let res = session.process_frame(&disk_frame(320.0, 240.0)).expect("frame");
        assert_eq!(res.lock.map(|l| l.state), Some(DriftState::Safe));
        assert_eq!(res.command_sent, None);

        // Move the disk far enough for the seed to leave the threshold.
        for _ in 0..3 {
            let res = session.process_frame(&disk_frame(380.0, 240.0)).expect("frame");
            let lock = res.lock.expect("engaged");
            assert_eq!(lock.state, DriftState::Alert);
            assert!(res.seed.expect("seed").distance(&anchor) > 5.0);
        }
        assert_eq!(port.sent(), vec![b'H']);

        session.shutdown().expect("shutdown");
        assert_eq!(port.sent(), vec![b'H', b'L']);
    }

    #[test]
    fn remote_terminate_ends_the_session() {
        let port = ScriptedPort::default();
        port.push_reply(Some(b'E'));
        let mut session =
            TrackerSession::with_actuator(TrackerConfig::default(), Box::new(port.clone()))
                .expect("session");
        session.process_frame(&disk_frame(320.0, 240.0)).expect("frame");
        session.toggle_lock();

        let err = session.process_frame(&disk_frame(400.0, 240.0)).unwrap_err();
        assert!(matches!(err, SessionError::RemoteTerminate));
    }

    #[test]
    fn ack_timeout_does_not_stop_tracking() {
        let port = ScriptedPort::default();
        let mut session =
            TrackerSession::with_actuator(TrackerConfig::default(), Box::new(port.clone()))
                .expect("session");
        session.process_frame(&disk_frame(320.0, 240.0)).expect("frame");
        session.toggle_lock();

        let res = session.process_frame(&disk_frame(400.0, 240.0)).expect("frame");
        assert_eq!(res.command_sent, None);
        assert!(res.pupil.valid);
        assert_eq!(session.link().last_sent(), b'H');
    }
}
