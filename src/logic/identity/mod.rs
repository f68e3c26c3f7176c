//! Identity Module
//!
//! Nearest-neighbor identity matching over enrolled face embeddings.
//!
//! ## Structure
//! - `index`: the `FaceIndex` seam, retrying client, in-memory index
//! - `matcher`: threshold gate over the top-1 search result
//! - `enroll`: enrollment with duplicate detection

pub mod enroll;
pub mod index;
pub mod matcher;

pub use enroll::{EnrollOutcome, EnrollmentService};
pub use index::{FaceIndex, FacePoint, IndexClient, MemoryFaceIndex, SearchConfig};
pub use matcher::{gate_top_candidate, MatchCandidate, MatcherConfig};
