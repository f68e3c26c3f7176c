//! Identity Matching
//!
//! Threshold gate over the similarity search result. A top-1 hit below the
//! decision threshold is an unknown person, never a weak match.
//!
//! Two independent thresholds: `identify_threshold` gates access decisions,
//! `duplicate_threshold` gates enrollment. They share the index but must not
//! share a knob - a false positive at enrollment means two people end up
//! sharing one identity, so that one is stricter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIG
// ============================================================================

/// Matcher thresholds, cosine space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Minimum similarity for an access-time identification.
    pub identify_threshold: f32,
    /// Minimum similarity for flagging a duplicate during enrollment.
    pub duplicate_threshold: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            identify_threshold: 0.75,
            duplicate_threshold: 0.80,
        }
    }
}

// ============================================================================
// CANDIDATE
// ============================================================================

/// One search hit: an enrolled identity and how close it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub identity_id: String,
    /// Cosine similarity in [-1, 1].
    pub similarity: f32,
    /// Payload stored at enrollment (e.g. resource binding).
    pub metadata: BTreeMap<String, String>,
}

// ============================================================================
// GATE
// ============================================================================

/// Apply the decision threshold to an ordered result list.
///
/// Only the top-1 candidate is ever considered; lower-ranked hits cannot
/// rescue a weak best match.
pub fn gate_top_candidate(
    candidates: Vec<MatchCandidate>,
    threshold: f32,
) -> Option<MatchCandidate> {
    let top = candidates.into_iter().next()?;
    if top.similarity >= threshold {
        Some(top)
    } else {
        log::debug!(
            "top candidate {} below threshold ({:.3} < {:.3})",
            top.identity_id,
            top.similarity,
            threshold
        );
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, similarity: f32) -> MatchCandidate {
        MatchCandidate {
            identity_id: id.to_string(),
            similarity,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_top_candidate_above_threshold() {
        let found = gate_top_candidate(vec![candidate("user_001", 0.82)], 0.75);
        assert_eq!(found.unwrap().identity_id, "user_001");
    }

    #[test]
    fn test_below_threshold_is_unknown() {
        assert!(gate_top_candidate(vec![candidate("user_001", 0.74)], 0.75).is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(gate_top_candidate(vec![candidate("user_001", 0.75)], 0.75).is_some());
    }

    #[test]
    fn test_lower_ranked_hits_never_rescue() {
        // second hit above threshold must not be promoted
        let found = gate_top_candidate(
            vec![candidate("user_001", 0.5), candidate("user_002", 0.9)],
            0.75,
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_empty_results() {
        assert!(gate_top_candidate(vec![], 0.75).is_none());
    }

    #[test]
    fn test_duplicate_threshold_stricter_by_default() {
        let config = MatcherConfig::default();
        assert!(config.duplicate_threshold > config.identify_threshold);
    }
}
