//! Access pipeline configuration
//!
//! One composed config for the whole pipeline. Per-stage configs live next to
//! the engines that consume them; this module just assembles them so a single
//! struct can be deserialized from a config file and handed to the
//! orchestrator at startup.

use serde::{Deserialize, Serialize};

use crate::logic::identity::index::SearchConfig;
use crate::logic::identity::matcher::MatcherConfig;
use crate::logic::liveness::aggregator::LivenessConfig;
use crate::logic::liveness::scoring::ScoringConfig;

// ============================================================================
// CAPTURE CONFIG
// ============================================================================

/// Frame capture parameters for one scan session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Frames requested from the source per scan. The source may yield fewer.
    pub frames_per_scan: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { frames_per_scan: 5 }
    }
}

// ============================================================================
// ACCESS CONFIG
// ============================================================================

/// Full configuration for the access decision pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub capture: CaptureConfig,
    pub scoring: ScoringConfig,
    pub liveness: LivenessConfig,
    pub matcher: MatcherConfig,
    pub search: SearchConfig,
}

impl AccessConfig {
    /// High-security preset: stricter liveness quorum and match threshold.
    pub fn high_security() -> Self {
        Self {
            liveness: LivenessConfig {
                pass_threshold: 0.8,
                quorum: 4,
                ..Default::default()
            },
            matcher: MatcherConfig {
                identify_threshold: 0.85,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AccessConfig::default();
        assert_eq!(config.capture.frames_per_scan, 5);
        assert_eq!(config.liveness.quorum, 3);
    }

    #[test]
    fn test_high_security_preset() {
        let config = AccessConfig::high_security();
        assert_eq!(config.liveness.quorum, 4);
        assert!(config.matcher.identify_threshold > AccessConfig::default().matcher.identify_threshold);
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: AccessConfig =
            serde_json::from_str(r#"{"liveness": {"pass_threshold": 0.9, "quorum": 2, "min_samples": 2}}"#)
                .unwrap();
        assert_eq!(config.liveness.pass_threshold, 0.9);
        assert_eq!(config.capture.frames_per_scan, 5);
    }
}
