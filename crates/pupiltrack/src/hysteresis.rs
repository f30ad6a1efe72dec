//! Threshold-level selection with switching hysteresis.
//!
//! Each frame the level with the highest composite score is the candidate.
//! The selection only moves to it when its score beats the score retained
//! from the previous frame by the configured relative margin; otherwise the
//! previous level is kept and its current-frame score becomes the retained one.
//!
//! The baseline is the retained `previous_score`, not the previous level's
//! score in the current frame. The two differ when the kept level's score
//! rises within one frame: with `{Strict, 10}` retained, scores
//! `[40, 50, 0]` and margin 1, medium is adopted (50 > 20) although it does
//! not beat strict's current 40 by the margin. Switching is at most one frame
//! earlier than a current-frame baseline would allow; after that the retained
//! score equals the current one and both agree.

use serde::{Deserialize, Serialize};

use crate::config::HysteresisConfig;
use crate::threshold::ThresholdLevel;

/// Cross-frame selection state. Starts with no level selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HysteresisState {
    pub previous_level: Option<ThresholdLevel>,
    pub previous_score: f64,
}

/// Result of one selection step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSelection {
    /// Highest-scoring level this frame (earliest in scan order on ties).
    pub candidate: ThresholdLevel,
    /// Level in use after hysteresis; `None` until some level has won once.
    pub chosen: Option<ThresholdLevel>,
    /// Current-frame score of `chosen` (0 when none).
    pub score: f64,
    /// `true` when `chosen` differs from the previous frame's level.
    pub switched: bool,
}

/// Highest score, earliest level in [`ThresholdLevel::ALL`] on ties.
pub fn best_level(scores: &[f64; 3]) -> ThresholdLevel {
    let mut best = ThresholdLevel::Strict;
    for level in ThresholdLevel::ALL {
        if scores[level.index()] > scores[best.index()] {
            best = level;
        }
    }
    best
}

impl HysteresisState {
    /// Choose this frame's level from per-level scores (strict, medium, relaxed)
    /// and update the state. Called exactly once per processed frame.
    pub fn select(&mut self, scores: &[f64; 3], config: &HysteresisConfig) -> LevelSelection {
        let candidate = best_level(scores);
        let previous = self.previous_level;

        let chosen = if previous == Some(candidate) {
            previous
        } else if scores[candidate.index()] > self.previous_score * (1.0 + config.switch_margin) {
            Some(candidate)
        } else {
            previous
        };
        let score = chosen.map_or(0.0, |level| scores[level.index()]);

        if chosen != previous {
            tracing::debug!(
                "threshold level {} -> {} (score {:.1}, retained {:.1})",
                previous.map_or("none", ThresholdLevel::name),
                candidate,
                score,
                self.previous_score
            );
        }

        self.previous_level = chosen;
        self.previous_score = score;

        LevelSelection {
            candidate,
            chosen,
            score,
            switched: chosen != previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ThresholdLevel::*;

    fn cfg(margin: f64) -> HysteresisConfig {
        HysteresisConfig {
            switch_margin: margin,
        }
    }

    #[test]
    fn ties_resolve_in_scan_order() {
        assert_eq!(best_level(&[0.0, 0.0, 0.0]), Strict);
        assert_eq!(best_level(&[1.0, 5.0, 5.0]), Medium);
        assert_eq!(best_level(&[1.0, 2.0, 3.0]), Relaxed);
    }

    #[test]
    fn first_positive_score_is_adopted() {
        let mut state = HysteresisState::default();
        let sel = state.select(&[0.0, 10.0, 4.0], &cfg(2.0));
        assert_eq!(sel.chosen, Some(Medium));
        assert!(sel.switched);
        assert_eq!(state.previous_level, Some(Medium));
        assert_eq!(state.previous_score, 10.0);
    }

    #[test]
    fn all_zero_scores_keep_nothing_selected() {
        let mut state = HysteresisState::default();
        let sel = state.select(&[0.0, 0.0, 0.0], &cfg(1.0));
        assert_eq!(sel.candidate, Strict);
        assert_eq!(sel.chosen, None);
        assert_eq!(sel.score, 0.0);
        assert!(!sel.switched);
    }

    #[test]
    fn close_competitor_does_not_switch() {
        let mut state = HysteresisState {
            previous_level: Some(Strict),
            previous_score: 100.0,
        };
        // Medium wins the frame but not by the 100% margin.
        let sel = state.select(&[90.0, 150.0, 0.0], &cfg(1.0));
        assert_eq!(sel.candidate, Medium);
        assert_eq!(sel.chosen, Some(Strict));
        assert_eq!(sel.score, 90.0);
        assert_eq!(state.previous_score, 90.0);
    }

    #[test]
    fn clear_winner_switches() {
        let mut state = HysteresisState {
            previous_level: Some(Strict),
            previous_score: 100.0,
        };
        let sel = state.select(&[90.0, 201.0, 0.0], &cfg(1.0));
        assert_eq!(sel.chosen, Some(Medium));
        assert!(sel.switched);
        assert_eq!(state.previous_score, 201.0);
    }

    #[test]
    fn stable_scores_never_flicker() {
        let mut state = HysteresisState::default();
        let scores = [50.0, 60.0, 55.0];
        let first = state.select(&scores, &cfg(0.5));
        assert_eq!(first.chosen, Some(Medium));
        for _ in 0..20 {
            let sel = state.select(&scores, &cfg(0.5));
            assert_eq!(sel.chosen, Some(Medium));
            assert!(!sel.switched);
        }
    }

    #[test]
    fn settled_level_survives_small_fluctuations() {
        let mut state = HysteresisState::default();
        state.select(&[100.0, 0.0, 0.0], &cfg(2.0));
        for frame in 0..10 {
            let wobble = if frame % 2 == 0 { 110.0 } else { 95.0 };
            let sel = state.select(&[100.0, wobble, 0.0], &cfg(2.0));
            assert_eq!(sel.chosen, Some(Strict), "frame {}", frame);
        }
    }

    #[test]
    fn baseline_is_the_retained_score() {
        let mut state = HysteresisState {
            previous_level: Some(Strict),
            previous_score: 10.0,
        };
        // 50 > 10 * 2 although 50 <= 40 * 2.
        let sel = state.select(&[40.0, 50.0, 0.0], &cfg(1.0));
        assert_eq!(sel.chosen, Some(Medium));
        assert!(sel.switched);

        // Once the retained score is current, the margin holds against it.
        let mut state = HysteresisState {
            previous_level: Some(Strict),
            previous_score: 40.0,
        };
        let sel = state.select(&[40.0, 50.0, 0.0], &cfg(1.0));
        assert_eq!(sel.chosen, Some(Strict));
        assert!(!sel.switched);
    }

    #[test]
    fn lost_level_is_replaced_after_its_score_drops() {
        let mut state = HysteresisState {
            previous_level: Some(Relaxed),
            previous_score: 100.0,
        };
        // Relaxed loses its candidate; medium is not yet 3x the retained score.
        let sel = state.select(&[0.0, 120.0, 0.0], &cfg(2.0));
        assert_eq!(sel.chosen, Some(Relaxed));
        assert_eq!(sel.score, 0.0);
        // With the retained score now zero, any positive competitor wins.
        let sel = state.select(&[0.0, 120.0, 0.0], &cfg(2.0));
        assert_eq!(sel.chosen, Some(Medium));
    }
}
