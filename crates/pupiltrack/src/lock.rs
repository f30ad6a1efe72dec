//! Lock mode: alert when the seed drifts away from an anchored position.

use serde::{Deserialize, Serialize};

use crate::config::LockConfig;
use crate::seed::SeedPoint;

/// Per-frame drift classification while lock mode is engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftState {
    Safe,
    Alert,
}

/// Lock output for one frame; only produced while engaged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockOutput {
    pub engaged: bool,
    pub state: DriftState,
    /// Seed distance from the anchor (px).
    pub distance_px: f64,
}

/// Two-state tracker: disabled, or engaged with an anchor point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockTracker {
    anchor: Option<SeedPoint>,
    last_emitted: Option<DriftState>,
}

impl LockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<SeedPoint> {
        self.anchor
    }

    /// Most recent state emitted while engaged; cleared on disengage.
    pub fn last_emitted(&self) -> Option<DriftState> {
        self.last_emitted
    }

    /// Capture `seed` as the anchor.
    pub fn engage(&mut self, seed: SeedPoint) {
        self.anchor = Some(seed);
        self.last_emitted = None;
        tracing::info!("lock engaged at ({}, {})", seed.x, seed.y);
    }

    /// Clear the anchor and stop emitting.
    pub fn disengage(&mut self) {
        if self.anchor.take().is_some() {
            tracing::info!("lock disengaged");
        }
        self.last_emitted = None;
    }

    /// Engage with `seed` as the anchor, or disengage if already engaged.
    /// Returns the new engaged flag.
    pub fn toggle(&mut self, seed: SeedPoint) -> bool {
        if self.is_engaged() {
            self.disengage();
        } else {
            self.engage(seed);
        }
        self.is_engaged()
    }

    /// Classify this frame's seed. `None` while disabled.
    pub fn update(&mut self, seed: SeedPoint, config: &LockConfig) -> Option<LockOutput> {
        let anchor = self.anchor?;
        let distance_px = seed.distance(&anchor);
        let state = if distance_px > config.lock_threshold_px {
            DriftState::Alert
        } else {
            DriftState::Safe
        };
        if self.last_emitted != Some(state) {
            tracing::debug!("lock state {:?} (drift {:.1} px)", state, distance_px);
        }
        self.last_emitted = Some(state);
        Some(LockOutput {
            engaged: true,
            state,
            distance_px,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracker_emits_nothing() {
        let mut lock = LockTracker::new();
        assert!(!lock.is_engaged());
        assert!(lock.update(SeedPoint::new(10, 10), &LockConfig::default()).is_none());
        assert_eq!(lock.last_emitted(), None);
    }

    #[test]
    fn drift_beyond_threshold_alerts() {
        let cfg = LockConfig::default();
        let mut lock = LockTracker::new();
        assert!(lock.toggle(SeedPoint::new(100, 100)));

        let out = lock.update(SeedPoint::new(100, 104), &cfg).expect("engaged");
        assert_eq!(out.state, DriftState::Safe);
        assert_eq!(out.distance_px, 4.0);

        let out = lock.update(SeedPoint::new(100, 110), &cfg).expect("engaged");
        assert_eq!(out.state, DriftState::Alert);
        assert!(out.engaged);
        assert_eq!(lock.last_emitted(), Some(DriftState::Alert));
    }

    #[test]
    fn distance_equal_to_threshold_is_safe() {
        let cfg = LockConfig {
            lock_threshold_px: 5.0,
        };
        let mut lock = LockTracker::new();
        lock.toggle(SeedPoint::new(0, 0));
        let out = lock.update(SeedPoint::new(3, 4), &cfg).expect("engaged");
        assert_eq!(out.state, DriftState::Safe);
    }

    #[test]
    fn toggle_twice_clears_the_anchor() {
        let mut lock = LockTracker::new();
        lock.toggle(SeedPoint::new(50, 60));
        assert_eq!(lock.anchor(), Some(SeedPoint::new(50, 60)));
        lock.update(SeedPoint::new(90, 60), &LockConfig::default());
        assert!(!lock.toggle(SeedPoint::new(0, 0)));
        assert_eq!(lock.anchor(), None);
        assert_eq!(lock.last_emitted(), None);

        // Re-engaging takes the new seed as anchor.
        lock.toggle(SeedPoint::new(10, 10));
        assert_eq!(lock.anchor(), Some(SeedPoint::new(10, 10)));
    }
}
