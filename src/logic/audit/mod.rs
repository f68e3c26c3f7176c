//! Audit Module
//!
//! Append-only audit trail for access decisions and enrollment.
//!
//! ## Structure
//! - `event`: AuditEvent and EventKind
//! - `sink`: the AuditSink seam, rotating JSONL sink, in-memory sink

pub mod event;
pub mod sink;

pub use event::{AuditEvent, EventKind};
pub use sink::{AuditSink, JsonlAuditSink, MemoryAuditSink};
