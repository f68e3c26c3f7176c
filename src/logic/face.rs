//! Face Data Types & Collaborator Seams
//!
//! Frames, per-frame liveness samples, embeddings, and the traits the
//! pipeline consumes them through. The camera, the face detector and the
//! embedding model all live behind these traits; the core never touches a
//! device or a model file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ScorerError};

/// Reference embedding dimensionality (buffalo_l produces 512-d vectors).
/// The extractor fixes the actual dimension; the core only requires that all
/// embeddings in one deployment agree.
pub const EMBEDDING_DIM: usize = 512;

// ============================================================================
// FRAME
// ============================================================================

/// One captured face crop. Opaque to the pipeline; only collaborators look
/// inside the bytes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            captured_at: Utc::now(),
        }
    }
}

/// One liveness observation: the realness score the classifier assigned to a
/// single frame. Immutable once produced, discarded after aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Probability the frame shows a live subject, in [0, 1].
    pub realness_score: f32,
    pub captured_at: DateTime<Utc>,
}

// ============================================================================
// EMBEDDING
// ============================================================================

/// Fixed-length face vector, compared by cosine similarity.
///
/// Owned by the caller for the duration of one request; the core never
/// persists it (persistence belongs to the enrollment index).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// L2-normalize on construction. Extractors normalize at the source, so
    /// cosine similarity reduces to a dot product at search time.
    pub fn normalized(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            Self(values.iter().map(|v| v / norm).collect())
        } else {
            Self(values)
        }
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Cosine similarity in [-1, 1]. Zero-norm vectors compare as 0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        let dot: f32 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        let norm_a: f32 = self.0.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm_b: f32 = other.0.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Source of face crops for one scan session.
///
/// Lazy and finite; a pull may yield nothing (camera miss, no face in view).
/// The orchestrator tolerates gaps.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Per-frame anti-spoof classifier.
#[async_trait]
pub trait LivenessScorer: Send + Sync {
    /// Realness score in [0, 1] for one frame.
    async fn score(&self, frame: &Frame) -> Result<f32, ScorerError>;
}

/// Face embedding model.
pub trait EmbeddingExtractor: Send + Sync {
    fn extract(&self, frame: &Frame) -> Result<Embedding, ExtractError>;
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_has_unit_norm() {
        let emb = Embedding::normalized(vec![3.0, 4.0]);
        let norm: f32 = emb.as_slice().iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_identity() {
        let emb = Embedding::normalized(vec![0.2, 0.5, 0.8]);
        assert!((emb.cosine_similarity(&emb) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        assert!(a.cosine_similarity(&b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }
}
