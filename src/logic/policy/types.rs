//! Policy Types
//!
//! Data structures only - no decision logic here.

use std::collections::BTreeSet;

use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

// ============================================================================
// ACCESS REASON
// ============================================================================

/// Machine-readable reason code attached to every decision. The serialized
/// names are the wire strings clients and the audit log see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    AccessGranted,
    NoFace,
    SpoofDetected,
    Unknown,
    NoPolicy,
    ResourceDisabled,
    IdentityNotAllowed,
    OutsideAllowedTime,
}

impl AccessReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessReason::AccessGranted => "access_granted",
            AccessReason::NoFace => "no_face",
            AccessReason::SpoofDetected => "spoof_detected",
            AccessReason::Unknown => "unknown",
            AccessReason::NoPolicy => "no_policy",
            AccessReason::ResourceDisabled => "resource_disabled",
            AccessReason::IdentityNotAllowed => "identity_not_allowed",
            AccessReason::OutsideAllowedTime => "outside_allowed_time",
        }
    }
}

impl std::fmt::Display for AccessReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DECISION
// ============================================================================

/// Allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Allow,
    Deny,
}

/// Diagnostic scores carried alongside the verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionScores {
    /// Per-frame realness scores that fed the liveness vote.
    pub liveness: Vec<f32>,
    /// Top-1 similarity, when the search stage ran.
    pub similarity: Option<f32>,
}

/// Terminal verdict for one access request. Produced exactly once per
/// request; an `Allow` always names who and what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub reason: AccessReason,
    pub identity_id: Option<String>,
    pub resource_id: Option<String>,
    #[serde(default)]
    pub scores: DecisionScores,
}

impl Decision {
    pub fn allow(identity_id: &str, resource_id: &str) -> Self {
        Self {
            outcome: Outcome::Allow,
            reason: AccessReason::AccessGranted,
            identity_id: Some(identity_id.to_string()),
            resource_id: Some(resource_id.to_string()),
            scores: DecisionScores::default(),
        }
    }

    pub fn deny(reason: AccessReason) -> Self {
        Self {
            outcome: Outcome::Deny,
            reason,
            identity_id: None,
            resource_id: None,
            scores: DecisionScores::default(),
        }
    }

    pub fn with_identity(mut self, identity_id: &str) -> Self {
        self.identity_id = Some(identity_id.to_string());
        self
    }

    pub fn with_resource(mut self, resource_id: &str) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn with_scores(mut self, scores: DecisionScores) -> Self {
        self.scores = scores;
        self
    }

    pub fn is_allow(&self) -> bool {
        self.outcome == Outcome::Allow
    }
}

// ============================================================================
// TIME WINDOW
// ============================================================================

/// Daily access window in the resource's local time.
///
/// `start > end` is an overnight window and wraps past midnight: 22:00-06:00
/// admits 23:30 and 05:00 but not 12:00. Both bounds are inclusive. Equal
/// bounds are rejected at construction - an always-open policy simply omits
/// the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
    /// Site-local UTC offset. Validated to +/- 24h.
    utc_offset_minutes: i32,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    start: NaiveTime,
    end: NaiveTime,
    #[serde(default)]
    utc_offset_minutes: i32,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = PolicyError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end, raw.utc_offset_minutes)
    }
}

impl TimeWindow {
    pub fn new(
        start: NaiveTime,
        end: NaiveTime,
        utc_offset_minutes: i32,
    ) -> Result<Self, PolicyError> {
        if start == end {
            return Err(PolicyError::EmptyTimeWindow);
        }
        if utc_offset_minutes.abs() >= 24 * 60 {
            return Err(PolicyError::InvalidOffset(utc_offset_minutes));
        }
        Ok(Self {
            start,
            end,
            utc_offset_minutes,
        })
    }

    pub fn offset(&self) -> FixedOffset {
        // validated range, cannot fail
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset"))
    }

    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }

    /// Inclusive membership test with midnight wraparound.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.is_overnight() {
            t >= self.start || t <= self.end
        } else {
            t >= self.start && t <= self.end
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Per-resource authorization rule set. Read-mostly; the evaluator only ever
/// sees a cloned snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub resource_id: String,
    pub enabled: bool,
    pub allowed_identities: BTreeSet<String>,
    pub time_window: Option<TimeWindow>,
}

impl Policy {
    pub fn new(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            enabled: true,
            allowed_identities: BTreeSet::new(),
            time_window: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn allow_identity(mut self, identity_id: &str) -> Self {
        self.allowed_identities.insert(identity_id.to_string());
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_reason_wire_strings() {
        assert_eq!(AccessReason::SpoofDetected.as_str(), "spoof_detected");
        let json = serde_json::to_string(&AccessReason::ResourceDisabled).unwrap();
        assert_eq!(json, "\"resource_disabled\"");
    }

    #[test]
    fn test_daytime_window() {
        let window = TimeWindow::new(t(8, 0), t(18, 0), 0).unwrap();
        assert!(window.contains(t(8, 0)));
        assert!(window.contains(t(18, 0)));
        assert!(window.contains(t(12, 30)));
        assert!(!window.contains(t(7, 59)));
        assert!(!window.contains(t(18, 1)));
    }

    #[test]
    fn test_overnight_window_wraps() {
        let window = TimeWindow::new(t(22, 0), t(6, 0), 0).unwrap();
        assert!(window.is_overnight());
        assert!(window.contains(t(23, 30)));
        assert!(window.contains(t(5, 0)));
        assert!(window.contains(t(22, 0)));
        assert!(window.contains(t(6, 0)));
        assert!(!window.contains(t(12, 0)));
    }

    #[test]
    fn test_equal_bounds_rejected() {
        let err = TimeWindow::new(t(9, 0), t(9, 0), 0).unwrap_err();
        assert_eq!(err, PolicyError::EmptyTimeWindow);
    }

    #[test]
    fn test_offset_validated() {
        assert!(TimeWindow::new(t(8, 0), t(18, 0), 7 * 60).is_ok());
        let err = TimeWindow::new(t(8, 0), t(18, 0), 25 * 60).unwrap_err();
        assert_eq!(err, PolicyError::InvalidOffset(1500));
    }

    #[test]
    fn test_deserialization_rejects_malformed_window() {
        let result: Result<TimeWindow, _> =
            serde_json::from_str(r#"{"start": "09:00:00", "end": "09:00:00"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_builder() {
        let policy = Policy::new("locker_01")
            .allow_identity("user_001")
            .allow_identity("user_002");
        assert!(policy.enabled);
        assert!(policy.allowed_identities.contains("user_001"));
        assert!(policy.time_window.is_none());
    }

    #[test]
    fn test_allow_decision_carries_ids() {
        let decision = Decision::allow("user_001", "locker_01");
        assert!(decision.is_allow());
        assert_eq!(decision.identity_id.as_deref(), Some("user_001"));
        assert_eq!(decision.resource_id.as_deref(), Some("locker_01"));
    }
}
