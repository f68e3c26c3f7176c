//! Error handling
//!
//! Expected negative outcomes (deny reasons) are data, carried by `Decision`.
//! The types here cover everything else: per-sample failures that are
//! recovered locally, validation failures at construction time, and
//! infrastructure failures surfaced to the caller.

use thiserror::Error;

/// Per-frame liveness scorer failure.
///
/// Recovered locally: the sample is excluded from the quorum vote. Only
/// becomes visible to the caller when exclusions drop the batch below the
/// minimum usable count.
#[derive(Debug, Clone, Error)]
pub enum ScorerError {
    #[error("liveness classifier failed: {0}")]
    Classifier(String),
    #[error("liveness scoring timed out")]
    Timeout,
}

/// Embedding extraction failure.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// No face in the frame. An expected outcome, mapped to a deny.
    #[error("no face found in frame")]
    NoFace,
    /// The embedding model itself failed. Infrastructure, not a deny.
    #[error("embedding model failed: {0}")]
    Model(String),
}

/// Similarity-search collaborator failure. Both variants are transient and
/// eligible for the single retry.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("vector index transport failure: {0}")]
    Transport(String),
    #[error("vector index call timed out")]
    Timeout,
}

/// Policy store lookup failure. A missing policy is `Ok(None)`, not this.
#[derive(Debug, Clone, Error)]
pub enum PolicyStoreError {
    #[error("policy store unavailable: {0}")]
    Unavailable(String),
}

/// Rejected at policy construction / load time, never at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("time window start and end are equal")]
    EmptyTimeWindow,
    #[error("utc offset out of range: {0} minutes")]
    InvalidOffset(i32),
}

/// Liveness aggregation precondition failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LivenessError {
    /// Fewer usable samples than the minimum quorum basis. Not a fail
    /// verdict; the caller decides how to surface it.
    #[error("insufficient usable samples: got {got}, need {need}")]
    InsufficientSamples { got: usize, need: usize },
}

/// Infrastructure failure surfaced by the orchestrator.
///
/// Display strings stay generic; the underlying cause is logged and kept as
/// `source()` for operators, never shown to the person at the locker.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("identity search unavailable")]
    Search(#[source] SearchError),
    #[error("policy store unavailable")]
    PolicyStore(#[source] PolicyStoreError),
    #[error("internal error")]
    Internal(String),
}

pub type AccessResult<T> = Result<T, AccessError>;
