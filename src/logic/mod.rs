//! Logic Module - Decision Pipeline Engines
//!
//! ## Structure
//! - `face` - frames, embeddings, collaborator seams
//! - `liveness/` - per-frame scoring + quorum aggregation
//! - `identity/` - similarity search, matching, enrollment
//! - `policy/` - authorization rules and evaluation
//! - `audit/` - append-only decision trail
//! - `orchestrator` - the request lifecycle state machine

pub mod audit;
pub mod face;
pub mod identity;
pub mod liveness;
pub mod orchestrator;
pub mod policy;
