//! Concurrent Frame Scoring
//!
//! Each frame is scored independently, so scoring fans out over a bounded
//! task pool. A stuck classifier call must not stall the whole scan: every
//! task carries its own timeout, and a timed-out sample is excluded exactly
//! like a scorer error.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::error::ScorerError;
use crate::logic::face::{Frame, FrameSample, LivenessScorer};

// ============================================================================
// CONFIG
// ============================================================================

/// Scoring pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Max classifier calls in flight at once.
    pub concurrency: usize,
    /// Per-frame scoring deadline.
    pub timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_ms: 1500,
        }
    }
}

// ============================================================================
// SCORED FRAME
// ============================================================================

/// A frame that scored successfully, paired with its sample. The frame is
/// kept because the most recent usable one feeds embedding extraction.
#[derive(Debug, Clone)]
pub struct ScoredFrame {
    pub frame: Frame,
    pub sample: FrameSample,
}

// ============================================================================
// SCORING
// ============================================================================

/// Score every frame, excluding failures and timeouts.
///
/// Waits for all dispatched tasks. The returned frames preserve capture
/// order, so `.last()` is the most recent usable frame.
pub async fn score_frames(
    scorer: Arc<dyn LivenessScorer>,
    frames: Vec<Frame>,
    config: &ScoringConfig,
) -> Vec<ScoredFrame> {
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let deadline = Duration::from_millis(config.timeout_ms);

    let mut tasks: JoinSet<(usize, Frame, Result<f32, ScorerError>)> = JoinSet::new();

    for (idx, frame) in frames.into_iter().enumerate() {
        let scorer = Arc::clone(&scorer);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            // Closed semaphore cannot happen here; treat it as a timeout.
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return (idx, frame, Err(ScorerError::Timeout)),
            };
            let result = match timeout(deadline, scorer.score(&frame)).await {
                Ok(scored) => scored,
                Err(_) => Err(ScorerError::Timeout),
            };
            (idx, frame, result)
        });
    }

    let mut scored: Vec<(usize, ScoredFrame)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, frame, Ok(score))) => {
                let sample = FrameSample {
                    realness_score: score,
                    captured_at: frame.captured_at,
                };
                scored.push((idx, ScoredFrame { frame, sample }));
            }
            Ok((idx, _, Err(e))) => {
                log::debug!("frame {} excluded from liveness vote: {}", idx, e);
            }
            Err(e) => {
                log::error!("scoring task panicked: {}", e);
            }
        }
    }

    scored.sort_by_key(|(idx, _)| *idx);
    scored.into_iter().map(|(_, frame)| frame).collect()
}

// ============================================================================
// TESTS
// ============================================================================
