//! Liveness Aggregation
//!
//! Quorum vote over per-frame realness scores. A single spoofed frame in an
//! otherwise sparse batch fails the vote, while one blurred or occluded frame
//! does not sink an otherwise live subject.
//!
//! Pure function of the samples and two thresholds. No side effects.

use serde::{Deserialize, Serialize};

use crate::error::LivenessError;
use crate::logic::face::FrameSample;

// ============================================================================
// CONFIG
// ============================================================================

/// Liveness vote configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// Per-frame score at or above this counts as a live vote.
    pub pass_threshold: f32,
    /// Votes required for the batch to pass.
    pub quorum: usize,
    /// Minimum usable samples for the vote to be meaningful at all. Below
    /// this the aggregator refuses to guess.
    pub min_samples: usize,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 0.7,
            quorum: 3,
            min_samples: 3,
        }
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Outcome of one liveness vote, with the raw scores for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessVerdict {
    pub passed: bool,
    pub scores: Vec<f32>,
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Run the quorum vote over usable samples.
///
/// Samples that failed to score never reach this function; the caller has
/// already excluded them. Fewer than `min_samples` usable samples is a
/// precondition failure, not a fail verdict.
pub fn evaluate(
    samples: &[FrameSample],
    config: &LivenessConfig,
) -> Result<LivenessVerdict, LivenessError> {
    if samples.len() < config.min_samples {
        return Err(LivenessError::InsufficientSamples {
            got: samples.len(),
            need: config.min_samples,
        });
    }

    let scores: Vec<f32> = samples.iter().map(|s| s.realness_score).collect();
    let votes = scores
        .iter()
        .filter(|s| **s >= config.pass_threshold)
        .count();

    Ok(LivenessVerdict {
        passed: votes >= config.quorum,
        scores,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn samples(scores: &[f32]) -> Vec<FrameSample> {
        scores
            .iter()
            .map(|s| FrameSample {
                realness_score: *s,
                captured_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_quorum_pass() {
        // 3 of 5 at or above 0.7
        let verdict = evaluate(&samples(&[0.9, 0.8, 0.75, 0.2, 0.1]), &LivenessConfig::default())
            .unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.scores.len(), 5);
    }

    #[test]
    fn test_quorum_fail() {
        // only 2 of 5 reach the threshold
        let verdict = evaluate(&samples(&[0.9, 0.8, 0.6, 0.2, 0.1]), &LivenessConfig::default())
            .unwrap();
        assert!(!verdict.passed);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let verdict = evaluate(&samples(&[0.7, 0.7, 0.7]), &LivenessConfig::default()).unwrap();
        assert!(verdict.passed);
    }

    #[test]
    fn test_single_live_frame_rejected() {
        // one perfect frame slipped into a sparse batch must not pass
        let verdict = evaluate(
            &samples(&[0.95, 0.1, 0.1, 0.1, 0.1]),
            &LivenessConfig::default(),
        )
        .unwrap();
        assert!(!verdict.passed);
    }

    #[test]
    fn test_insufficient_samples() {
        let err = evaluate(&samples(&[0.9, 0.9]), &LivenessConfig::default()).unwrap_err();
        assert_eq!(err, LivenessError::InsufficientSamples { got: 2, need: 3 });
    }

    #[test]
    fn test_custom_quorum() {
        let config = LivenessConfig {
            pass_threshold: 0.5,
            quorum: 2,
            min_samples: 2,
        };
        let verdict = evaluate(&samples(&[0.6, 0.55]), &config).unwrap();
        assert!(verdict.passed);
    }
}
