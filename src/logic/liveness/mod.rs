//! Liveness Module
//!
//! Turns a burst of frames into a pass/fail liveness verdict.
//!
//! ## Structure
//! - `scoring`: bounded concurrent per-frame scoring with timeouts
//! - `aggregator`: quorum vote over the completed scores (pure)

pub mod aggregator;
pub mod scoring;

pub use aggregator::{evaluate, LivenessConfig, LivenessVerdict};
pub use scoring::{score_frames, ScoredFrame, ScoringConfig};
