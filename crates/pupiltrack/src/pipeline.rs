//! Stateless per-frame stages between the seed and the final fit.
//!
//! [`evaluate_levels`] thresholds the frame at every level, selects one
//! candidate contour per level and scores it. [`estimate_pupil`] refines the
//! winning contour and fits the final ellipse. Cross-frame state lives in
//! [`crate::session::TrackerSession`].

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::{RefineConfig, TrackerConfig};
use crate::contour::{select_candidate, Contour};
use crate::error::TrackError;
use crate::pupil::{fit_pupil_ellipse, PupilEstimate};
use crate::refine::refine_contour;
use crate::scoring::{score_candidate, CandidateScore};
use crate::seed::SeedPoint;
use crate::threshold::{threshold_levels, ThresholdLevel};

/// Diagnostics for one threshold level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub level: ThresholdLevel,
    /// A contour survived the area/aspect filters.
    pub has_candidate: bool,
    /// Points in the (chain-compressed) candidate contour.
    pub n_points: usize,
    pub score: CandidateScore,
}

/// Candidates and scores of all three levels for one frame.
#[derive(Debug, Clone)]
pub struct LevelEvaluation {
    pub reports: [LevelReport; 3],
    pub contours: [Option<Contour>; 3],
}

impl LevelEvaluation {
    /// Composite scores in scan order.
    pub fn scores(&self) -> [f64; 3] {
        self.reports.map(|r| r.score.composite)
    }

    pub fn contour(&self, level: ThresholdLevel) -> Option<&Contour> {
        self.contours[level.index()].as_ref()
    }
}

/// Threshold, select and score every level around `seed`.
pub fn evaluate_levels(gray: &GrayImage, seed: SeedPoint, config: &TrackerConfig) -> LevelEvaluation {
    let masks = threshold_levels(gray, seed, &config.threshold);

    let mut contours: [Option<Contour>; 3] = [None, None, None];
    let reports = ThresholdLevel::ALL.map(|level| {
        let candidate = select_candidate(&masks[level.index()], &config.contour);
        let (score, n_points) = match &candidate.contour {
            Some(contour) => (score_candidate(&candidate.dilated, contour).score, contour.len()),
            None => (CandidateScore::default(), 0),
        };
        let has_candidate = candidate.contour.is_some();
        contours[level.index()] = candidate.contour;

        tracing::trace!(
            "level {}: candidate={} points={} score={:.1}",
            level,
            has_candidate,
            n_points,
            score.composite
        );
        LevelReport {
            level,
            has_candidate,
            n_points,
            score,
        }
    });

    LevelEvaluation { reports, contours }
}

/// Refine `contour` and fit the pupil ellipse to the surviving points.
pub fn estimate_pupil(contour: &Contour, config: &RefineConfig) -> Result<PupilEstimate, TrackError> {
    let refined = refine_contour(contour, config);
    let ellipse = fit_pupil_ellipse(&refined)?;
    Ok(PupilEstimate::from_fit(&ellipse, &refined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::locate_seed;
    use crate::test_utils::{draw_disk_image, uniform_image};

    #[test]
    fn dark_disk_scores_at_every_level() {
        let img = draw_disk_image(640, 480, [320.0, 240.0], 30.0, 10, 220);
        let cfg = TrackerConfig::default();
        let seed = locate_seed(&img, &cfg.seed).expect("seed");
        let eval = evaluate_levels(&img, seed, &cfg);

        for report in &eval.reports {
            assert!(report.has_candidate, "{}", report.level);
            assert!(report.n_points >= 5);
            assert!(report.score.composite > 0.0);
        }
        // Same disk at every level: identical masks, identical scores.
        let s = eval.scores();
        assert_eq!(s[0], s[1]);
        assert_eq!(s[1], s[2]);
    }

    #[test]
    fn uniform_frame_scores_zero() {
        let img = uniform_image(640, 480, 128);
        let cfg = TrackerConfig::default();
        let seed = locate_seed(&img, &cfg.seed).expect("seed");
        let eval = evaluate_levels(&img, seed, &cfg);
        assert_eq!(eval.scores(), [0.0; 3]);
    }

    #[test]
    fn pupil_estimate_from_disk_contour() {
        let img = draw_disk_image(640, 480, [320.0, 240.0], 30.0, 10, 220);
        let cfg = TrackerConfig::default();
        let seed = locate_seed(&img, &cfg.seed).expect("seed");
        let eval = evaluate_levels(&img, seed, &cfg);
        let contour = eval.contour(ThresholdLevel::Strict).expect("contour");
        let est = estimate_pupil(contour, &cfg.refine).expect("fit");
        assert!(est.valid);
        assert!((est.center.0 - 320.0).abs() < 2.0);
        assert!((est.center.1 - 240.0).abs() < 2.0);
    }

    #[test]
    fn square_contour_cannot_be_fitted() {
        let contour = Contour::new(vec![[0, 0], [50, 0], [50, 50], [0, 50]]);
        let err = estimate_pupil(&contour, &RefineConfig::default()).unwrap_err();
        assert!(matches!(err, TrackError::InsufficientPoints { .. }));
    }
}
