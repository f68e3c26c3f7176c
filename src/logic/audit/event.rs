//! Audit Event Types
//!
//! Immutable, timestamped events documenting every decision the pipeline
//! makes. Append-only; never modified after creation. Ordering only matters
//! causally relative to the decision an event documents.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::logic::policy::types::Decision;

// ============================================================================
// EVENT KINDS
// ============================================================================

/// Categories of audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An access request was granted.
    AccessGranted,
    /// An access request was denied (any non-liveness reason).
    AccessDenied,
    /// The liveness vote failed; carries the per-frame scores.
    LivenessFail,
    /// An identity was enrolled.
    EnrollCompleted,
    /// Enrollment flagged a near-identical face under another identity.
    DuplicateFace,
    /// An unexpected failure inside the pipeline.
    InternalError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AccessGranted => "access_granted",
            EventKind::AccessDenied => "access_denied",
            EventKind::LivenessFail => "liveness_fail",
            EventKind::EnrollCompleted => "enroll_completed",
            EventKind::DuplicateFace => "duplicate_face",
            EventKind::InternalError => "internal_error",
        }
    }
}

// ============================================================================
// AUDIT EVENT
// ============================================================================

/// One audit record. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub identity_id: Option<String>,
    /// Structured detail bag (reason codes, scores, resource ids).
    #[serde(default)]
    pub detail: BTreeMap<String, Value>,
}

impl AuditEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            identity_id: None,
            detail: BTreeMap::new(),
        }
    }

    // Builder pattern methods
    pub fn with_identity(mut self, identity_id: &str) -> Self {
        self.identity_id = Some(identity_id.to_string());
        self
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.detail.insert(key.to_string(), value);
        self
    }

    /// Single-line JSON for the append-only log.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// CONVENIENCE CONSTRUCTORS
// ============================================================================

impl AuditEvent {
    /// The one event documenting a decided access request.
    pub fn for_decision(decision: &Decision) -> Self {
        let kind = if decision.is_allow() {
            EventKind::AccessGranted
        } else {
            EventKind::AccessDenied
        };

        let mut event = Self::new(kind)
            .with_detail("reason", json!(decision.reason.as_str()))
            .with_detail("liveness_scores", json!(decision.scores.liveness));
        if let Some(identity_id) = &decision.identity_id {
            event = event.with_identity(identity_id);
        }
        if let Some(resource_id) = &decision.resource_id {
            event = event.with_detail("resource_id", json!(resource_id));
        }
        if let Some(similarity) = decision.scores.similarity {
            event = event.with_detail("similarity", json!(similarity));
        }
        event
    }

    /// Liveness vote failed; the per-frame scores are the evidence.
    pub fn liveness_fail(decision: &Decision) -> Self {
        let mut event = Self::new(EventKind::LivenessFail)
            .with_detail("reason", json!(decision.reason.as_str()))
            .with_detail("scores", json!(decision.scores.liveness));
        if let Some(resource_id) = &decision.resource_id {
            event = event.with_detail("resource_id", json!(resource_id));
        }
        event
    }

    /// Best-effort marker for an unexpected pipeline failure. Carries the
    /// stage name only - internals stay in the server log.
    pub fn internal_error(stage: &str) -> Self {
        Self::new(EventKind::InternalError).with_detail("stage", json!(stage))
    }
}

// ============================================================================
// TESTS
// ============================================================================
