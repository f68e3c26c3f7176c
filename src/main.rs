//! Face Locker Access Control - Demo Entry Point
//!
//! Wires the pipeline against simulated collaborators: a canned camera, a
//! jittery anti-spoof scorer and a byte-fold embedding extractor. Enrolls one
//! user, then runs a live scan and a replay-attack scan against locker_01.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use rand::Rng;

use face_access_core::error::{ExtractError, ScorerError};
use face_access_core::logic::identity::index::SearchConfig;
use face_access_core::{
    AccessConfig, AccessOrchestrator, Embedding, EmbeddingExtractor, EnrollmentService, Frame,
    FrameSource, IndexClient, JsonlAuditSink, LivenessScorer, MemoryFaceIndex, MemoryPolicyStore,
    Policy, TimeWindow,
};

// ============================================================================
// SIMULATED COLLABORATORS
// ============================================================================

/// Canned frame source: yields its frames once, then dries up.
struct CannedCamera(Vec<Frame>);

impl FrameSource for CannedCamera {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.remove(0))
        }
    }
}

/// Scorer that jitters around a base realness score.
struct SimulatedScorer {
    base: f32,
}

#[async_trait]
impl LivenessScorer for SimulatedScorer {
    async fn score(&self, _frame: &Frame) -> Result<f32, ScorerError> {
        let jitter: f32 = rand::thread_rng().gen_range(-0.05..0.05);
        Ok((self.base + jitter).clamp(0.0, 1.0))
    }
}

/// Deterministic stand-in for the embedding model: folds the frame bytes
/// into a fixed-length vector, so identical faces produce identical
/// embeddings.
struct ByteFoldExtractor;

impl EmbeddingExtractor for ByteFoldExtractor {
    fn extract(&self, frame: &Frame) -> Result<Embedding, ExtractError> {
        if frame.bytes.is_empty() {
            return Err(ExtractError::NoFace);
        }
        let mut values = vec![0.0f32; 64];
        for (i, byte) in frame.bytes.iter().enumerate() {
            values[i % 64] += *byte as f32;
        }
        Ok(Embedding::normalized(values))
    }
}

fn face_frames(seed: u8, count: usize) -> Vec<Frame> {
    (0..count)
        .map(|_| Frame::new((0..32u8).map(|i| i.wrapping_mul(seed)).collect()))
        .collect()
}

// ============================================================================
// MAIN
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Face Locker demo...");

    let config = AccessConfig::default();

    // Constructed once at process start, then injected.
    let index = Arc::new(MemoryFaceIndex::new());
    let client = IndexClient::new(index.clone(), &SearchConfig::default());
    let audit = Arc::new(JsonlAuditSink::new(JsonlAuditSink::default_dir())?);
    let policies = Arc::new(MemoryPolicyStore::new());
    let extractor = Arc::new(ByteFoldExtractor);

    policies.upsert(
        Policy::new("locker_01")
            .allow_identity("user_001")
            .with_time_window(TimeWindow::new(
                NaiveTime::from_hms_opt(0, 1, 0).expect("valid time"),
                NaiveTime::from_hms_opt(23, 59, 0).expect("valid time"),
                0,
            )?),
    );

    let enrollment = EnrollmentService::new(
        extractor.clone(),
        client.clone(),
        audit.clone(),
        config.matcher.clone(),
    );
    let outcome = enrollment
        .enroll(&face_frames(7, 1).remove(0), "user_001", Some("locker_01"))
        .await?;
    log::info!("enrollment outcome: {:?}", outcome);

    let orchestrator = AccessOrchestrator::new(
        Arc::new(SimulatedScorer { base: 0.9 }),
        extractor,
        client,
        policies,
        audit.clone(),
        config,
    );

    // Live subject, enrolled face.
    let mut camera = CannedCamera(face_frames(7, 5));
    let decision = orchestrator.request_access(&mut camera, "locker_01").await?;
    println!(
        "live scan     -> {:?} ({})",
        decision.outcome, decision.reason
    );

    // Photo replay: frames score low on liveness.
    let spoof_orchestrator = AccessOrchestrator::new(
        Arc::new(SimulatedScorer { base: 0.3 }),
        Arc::new(ByteFoldExtractor),
        IndexClient::new(index, &SearchConfig::default()),
        Arc::new(MemoryPolicyStore::new()),
        audit.clone(),
        AccessConfig::default(),
    );
    let mut replay = CannedCamera(face_frames(7, 5));
    let decision = spoof_orchestrator
        .request_access(&mut replay, "locker_01")
        .await?;
    println!(
        "replay attack -> {:?} ({})",
        decision.outcome, decision.reason
    );

    log::info!(
        "audit events written: {} ({:?})",
        audit.events_emitted(),
        audit.current_file()
    );
    Ok(())
}
