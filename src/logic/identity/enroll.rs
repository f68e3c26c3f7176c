//! Enrollment
//!
//! Registers a face for an identity. Before anything is stored, the new
//! embedding is probed against the index with the duplicate threshold: a
//! near-identical face already enrolled under a different identity is flagged
//! instead of silently creating a second identity for the same person.

use std::sync::Arc;

use serde_json::json;

use crate::error::{AccessError, ExtractError};
use crate::logic::audit::{AuditEvent, AuditSink, EventKind};
use crate::logic::face::{EmbeddingExtractor, Frame};
use crate::logic::identity::index::{FacePoint, IndexClient};
use crate::logic::identity::matcher::MatcherConfig;
use uuid::Uuid;

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of one enrollment attempt. All variants are expected outcomes;
/// infrastructure failures surface as `AccessError`.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollOutcome {
    /// Stored under a fresh point id.
    Enrolled { point_id: Uuid },
    /// A different identity already owns a near-identical face.
    Duplicate {
        existing_id: String,
        similarity: f32,
    },
    /// No usable face in the supplied frame.
    NoFace,
}

// ============================================================================
// SERVICE
// ============================================================================

/// Enrollment service. Constructed once at startup and shared.
pub struct EnrollmentService {
    extractor: Arc<dyn EmbeddingExtractor>,
    index: IndexClient,
    audit: Arc<dyn AuditSink>,
    config: MatcherConfig,
}

impl EnrollmentService {
    pub fn new(
        extractor: Arc<dyn EmbeddingExtractor>,
        index: IndexClient,
        audit: Arc<dyn AuditSink>,
        config: MatcherConfig,
    ) -> Self {
        Self {
            extractor,
            index,
            audit,
            config,
        }
    }

    /// Enroll one face frame for `identity_id`, optionally bound to a
    /// resource.
    pub async fn enroll(
        &self,
        frame: &Frame,
        identity_id: &str,
        resource_id: Option<&str>,
    ) -> Result<EnrollOutcome, AccessError> {
        let embedding = match self.extractor.extract(frame) {
            Ok(embedding) => embedding,
            Err(ExtractError::NoFace) => {
                log::info!("enrollment rejected for {}: no face", identity_id);
                return Ok(EnrollOutcome::NoFace);
            }
            Err(ExtractError::Model(e)) => {
                return Err(AccessError::Internal(format!("embedding model: {}", e)))
            }
        };

        // Duplicate probe against the stricter enrollment threshold.
        let hits = self.index.search(&embedding, 1).await?;
        if let Some(top) = hits.first() {
            if top.similarity >= self.config.duplicate_threshold && top.identity_id != identity_id
            {
                log::warn!(
                    "duplicate face: {} matches enrolled {} at {:.3}",
                    identity_id,
                    top.identity_id,
                    top.similarity
                );
                self.emit(
                    AuditEvent::new(EventKind::DuplicateFace)
                        .with_identity(identity_id)
                        .with_detail("existing_identity", json!(top.identity_id))
                        .with_detail("similarity", json!(top.similarity)),
                );
                return Ok(EnrollOutcome::Duplicate {
                    existing_id: top.identity_id.clone(),
                    similarity: top.similarity,
                });
            }
        }

        let mut point = FacePoint::new(embedding, identity_id);
        if let Some(resource_id) = resource_id {
            point = point.with_resource(resource_id);
        }
        let point_id = point.id;
        self.index.upsert(point).await?;

        log::info!("enrolled {} as point {}", identity_id, point_id);
        self.emit(
            AuditEvent::new(EventKind::EnrollCompleted)
                .with_identity(identity_id)
                .with_detail("point_id", json!(point_id.to_string())),
        );
        Ok(EnrollOutcome::Enrolled { point_id })
    }

    fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.emit(&event) {
            log::error!("audit emit failed: {}", e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::audit::MemoryAuditSink;
    use crate::logic::face::Embedding;
    use crate::logic::identity::index::{MemoryFaceIndex, SearchConfig};

    /// Extractor that maps the first frame byte onto a fixed direction.
    struct ByteExtractor;

    impl EmbeddingExtractor for ByteExtractor {
        fn extract(&self, frame: &Frame) -> Result<Embedding, ExtractError> {
            match frame.bytes.first() {
                None => Err(ExtractError::NoFace),
                Some(b) => Ok(Embedding::normalized(vec![*b as f32, 1.0])),
            }
        }
    }

    fn service() -> (EnrollmentService, Arc<MemoryFaceIndex>, Arc<MemoryAuditSink>) {
        let index = Arc::new(MemoryFaceIndex::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let service = EnrollmentService::new(
            Arc::new(ByteExtractor),
            IndexClient::new(index.clone(), &SearchConfig::default()),
            audit.clone(),
            MatcherConfig::default(),
        );
        (service, index, audit)
    }

    #[tokio::test]
    async fn test_enroll_stores_point() {
        let (service, index, audit) = service();
        let outcome = service
            .enroll(&Frame::new(vec![10]), "user_001", Some("locker_01"))
            .await
            .unwrap();

        assert!(matches!(outcome, EnrollOutcome::Enrolled { .. }));
        assert_eq!(index.len(), 1);
        assert_eq!(audit.events()[0].kind, EventKind::EnrollCompleted);
    }

    #[tokio::test]
    async fn test_duplicate_face_flagged() {
        let (service, index, audit) = service();
        service
            .enroll(&Frame::new(vec![10]), "user_001", None)
            .await
            .unwrap();

        // same face bytes, different identity
        let outcome = service
            .enroll(&Frame::new(vec![10]), "user_002", None)
            .await
            .unwrap();

        match outcome {
            EnrollOutcome::Duplicate { existing_id, .. } => assert_eq!(existing_id, "user_001"),
            other => panic!("expected duplicate, got {:?}", other),
        }
        assert_eq!(index.len(), 1);
        assert_eq!(audit.events().last().unwrap().kind, EventKind::DuplicateFace);
    }

    #[tokio::test]
    async fn test_re_enroll_same_identity_allowed() {
        let (service, index, _) = service();
        service
            .enroll(&Frame::new(vec![10]), "user_001", None)
            .await
            .unwrap();

        // a second capture of the same person is not a duplicate
        let outcome = service
            .enroll(&Frame::new(vec![10]), "user_001", None)
            .await
            .unwrap();
        assert!(matches!(outcome, EnrollOutcome::Enrolled { .. }));
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_no_face_rejected_without_store() {
        let (service, index, _) = service();
        let outcome = service
            .enroll(&Frame::new(vec![]), "user_001", None)
            .await
            .unwrap();
        assert_eq!(outcome, EnrollOutcome::NoFace);
        assert!(index.is_empty());
    }
}
