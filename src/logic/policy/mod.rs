//! Policy Module
//!
//! Per-resource authorization rules and their evaluation. This is where
//! access control happens - not the camera, not the model.
//!
//! ## Structure
//! - `types`: Policy, TimeWindow, Decision, AccessReason (no logic)
//! - `engine`: ordered fail-fast evaluation (pure)
//! - `store`: the PolicyStore seam + in-memory snapshot store

pub mod engine;
pub mod store;
pub mod types;

pub use engine::evaluate;
pub use store::{MemoryPolicyStore, PolicyStore};
pub use types::{AccessReason, Decision, DecisionScores, Outcome, Policy, TimeWindow};
