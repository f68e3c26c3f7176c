//! Face Index Seam
//!
//! `FaceIndex` is the similarity-search collaborator: an ANN store that
//! returns enrolled candidates by descending cosine similarity. The real
//! deployment fronts a vector database; `MemoryFaceIndex` is a full in-memory
//! implementation for tests, demos and single-locker installs.
//!
//! `IndexClient` wraps any index with the call policy the pipeline requires:
//! a per-call timeout and at most one retry on transport failure. An empty
//! result list is a valid terminal outcome and is never retried.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::{AccessError, SearchError};
use crate::logic::face::Embedding;
use crate::logic::identity::matcher::MatchCandidate;

/// Metadata key carrying the enrolled identity.
pub const META_IDENTITY_ID: &str = "identity_id";
/// Metadata key carrying an optional resource binding.
pub const META_RESOURCE_ID: &str = "resource_id";

// ============================================================================
// CONFIG
// ============================================================================

/// Search call policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Deadline for one index call.
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

// ============================================================================
// FACE INDEX TRAIT
// ============================================================================

/// One enrolled embedding with its payload.
#[derive(Debug, Clone)]
pub struct FacePoint {
    pub id: Uuid,
    pub embedding: Embedding,
    pub metadata: BTreeMap<String, String>,
}

impl FacePoint {
    pub fn new(embedding: Embedding, identity_id: &str) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_IDENTITY_ID.to_string(), identity_id.to_string());
        Self {
            id: Uuid::new_v4(),
            embedding,
            metadata,
        }
    }

    pub fn with_resource(mut self, resource_id: &str) -> Self {
        self.metadata
            .insert(META_RESOURCE_ID.to_string(), resource_id.to_string());
        self
    }

    pub fn identity_id(&self) -> &str {
        self.metadata
            .get(META_IDENTITY_ID)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// The similarity-search collaborator.
#[async_trait]
pub trait FaceIndex: Send + Sync {
    /// Top-k candidates, highest similarity first.
    async fn search(
        &self,
        embedding: &Embedding,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, SearchError>;

    /// Store one enrolled embedding.
    async fn upsert(&self, point: FacePoint) -> Result<(), SearchError>;
}

// ============================================================================
// INDEX CLIENT (timeout + single retry)
// ============================================================================

/// Call-policy wrapper around a `FaceIndex`.
#[derive(Clone)]
pub struct IndexClient {
    inner: Arc<dyn FaceIndex>,
    deadline: Duration,
}

impl IndexClient {
    pub fn new(inner: Arc<dyn FaceIndex>, config: &SearchConfig) -> Self {
        Self {
            inner,
            deadline: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Search with one retry on transport failure.
    pub async fn search(
        &self,
        embedding: &Embedding,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, AccessError> {
        match self.try_search(embedding, limit).await {
            Ok(candidates) => Ok(candidates),
            Err(first) => {
                log::warn!("index search failed, retrying once: {}", first);
                self.try_search(embedding, limit)
                    .await
                    .map_err(AccessError::Search)
            }
        }
    }

    /// Upsert with one retry on transport failure.
    pub async fn upsert(&self, point: FacePoint) -> Result<(), AccessError> {
        match self.try_upsert(point.clone()).await {
            Ok(()) => Ok(()),
            Err(first) => {
                log::warn!("index upsert failed, retrying once: {}", first);
                self.try_upsert(point).await.map_err(AccessError::Search)
            }
        }
    }

    async fn try_search(
        &self,
        embedding: &Embedding,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, SearchError> {
        timeout(self.deadline, self.inner.search(embedding, limit))
            .await
            .unwrap_or(Err(SearchError::Timeout))
    }

    async fn try_upsert(&self, point: FacePoint) -> Result<(), SearchError> {
        timeout(self.deadline, self.inner.upsert(point))
            .await
            .unwrap_or(Err(SearchError::Timeout))
    }
}

// ============================================================================
// MEMORY FACE INDEX
// ============================================================================

/// Brute-force cosine scan over an in-memory point set.
#[derive(Default)]
pub struct MemoryFaceIndex {
    points: RwLock<Vec<FacePoint>>,
}

impl MemoryFaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }
}

#[async_trait]
impl FaceIndex for MemoryFaceIndex {
    async fn search(
        &self,
        embedding: &Embedding,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, SearchError> {
        let mut candidates: Vec<MatchCandidate> = {
            let points = self.points.read();
            points
                .iter()
                .map(|p| MatchCandidate {
                    identity_id: p.identity_id().to_string(),
                    similarity: embedding.cosine_similarity(&p.embedding),
                    metadata: p.metadata.clone(),
                })
                .collect()
        };

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn upsert(&self, point: FacePoint) -> Result<(), SearchError> {
        let mut points = self.points.write();
        if let Some(existing) = points.iter_mut().find(|p| p.id == point.id) {
            *existing = point;
        } else {
            points.push(point);
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unit(x: f32, y: f32) -> Embedding {
        Embedding::normalized(vec![x, y])
    }

    #[tokio::test]
    async fn test_memory_index_orders_by_similarity() {
        let index = MemoryFaceIndex::new();
        index
            .upsert(FacePoint::new(unit(1.0, 0.0), "user_001"))
            .await
            .unwrap();
        index
            .upsert(FacePoint::new(unit(0.0, 1.0), "user_002"))
            .await
            .unwrap();

        let hits = index.search(&unit(0.9, 0.1), 2).await.unwrap();
        assert_eq!(hits[0].identity_id, "user_001");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[tokio::test]
    async fn test_memory_index_limit() {
        let index = MemoryFaceIndex::new();
        for i in 0..5 {
            index
                .upsert(FacePoint::new(unit(1.0, i as f32), &format!("user_{:03}", i)))
                .await
                .unwrap();
        }
        let hits = index.search(&unit(1.0, 0.0), 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_point() {
        let index = MemoryFaceIndex::new();
        let point = FacePoint::new(unit(1.0, 0.0), "user_001");
        let id = point.id;
        index.upsert(point).await.unwrap();

        let mut updated = FacePoint::new(unit(0.0, 1.0), "user_001");
        updated.id = id;
        index.upsert(updated).await.unwrap();

        assert_eq!(index.len(), 1);
    }

    /// Index that fails with a transport error the first N calls.
    struct FlakyIndex {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FlakyIndex {
        fn new(failures: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FaceIndex for FlakyIndex {
        async fn search(
            &self,
            _embedding: &Embedding,
            _limit: usize,
        ) -> Result<Vec<MatchCandidate>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                Err(SearchError::Transport("connection reset".into()))
            } else {
                Ok(vec![])
            }
        }

        async fn upsert(&self, _point: FacePoint) -> Result<(), SearchError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_client_retries_once_then_succeeds() {
        let flaky = Arc::new(FlakyIndex::new(1));
        let client = IndexClient::new(flaky.clone(), &SearchConfig::default());

        let hits = client.search(&unit(1.0, 0.0), 1).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_gives_up_after_one_retry() {
        let flaky = Arc::new(FlakyIndex::new(5));
        let client = IndexClient::new(flaky.clone(), &SearchConfig::default());

        let err = client.search(&unit(1.0, 0.0), 1).await.unwrap_err();
        assert!(matches!(err, AccessError::Search(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_retried() {
        let flaky = Arc::new(FlakyIndex::new(0));
        let client = IndexClient::new(flaky.clone(), &SearchConfig::default());

        let hits = client.search(&unit(1.0, 0.0), 1).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }
}
