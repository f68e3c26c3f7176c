//! Face Locker Access Control - Core Decision Pipeline
//!
//! Turns a burst of camera frames into an allow/deny verdict:
//! liveness quorum vote, nearest-neighbor identity match with calibrated
//! thresholds, and time/allowlist policy evaluation, with an audit event for
//! every decision.
//!
//! Everything device- or model-shaped (camera, anti-spoof classifier,
//! embedding extractor, vector index) sits behind a trait; this crate only
//! combines their outputs.

pub mod config;
pub mod error;
pub mod logic;

pub use config::AccessConfig;
pub use error::{AccessError, AccessResult};
pub use logic::audit::{AuditEvent, AuditSink, EventKind, JsonlAuditSink, MemoryAuditSink};
pub use logic::face::{Embedding, EmbeddingExtractor, Frame, FrameSample, FrameSource, LivenessScorer};
pub use logic::identity::{
    EnrollOutcome, EnrollmentService, FaceIndex, FacePoint, IndexClient, MatchCandidate,
    MemoryFaceIndex,
};
pub use logic::orchestrator::AccessOrchestrator;
pub use logic::policy::{
    AccessReason, Decision, DecisionScores, MemoryPolicyStore, Outcome, Policy, PolicyStore,
    TimeWindow,
};
