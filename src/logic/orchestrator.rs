//! Access Orchestrator
//!
//! Sequences one access request through its lifecycle:
//! CAPTURING -> LIVENESS_CHECK -> IDENTIFY -> POLICY_CHECK -> DECIDED,
//! short-circuiting on the first failing stage. Every decided request emits
//! exactly one audit event before it returns; emission is best-effort and
//! never changes the decision.
//!
//! Requests are independent: the orchestrator holds no per-request state, so
//! any number of scans can run in parallel against the same instance.
//! Cancellation is dropping the returned future at an await point - a
//! cancelled request is never decided and emits no event.

use std::sync::Arc;

use chrono::Utc;

use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult, ExtractError, LivenessError};
use crate::logic::audit::{AuditEvent, AuditSink};
use crate::logic::face::{EmbeddingExtractor, Frame, FrameSource, LivenessScorer};
use crate::logic::identity::index::IndexClient;
use crate::logic::identity::matcher::gate_top_candidate;
use crate::logic::liveness::{self, scoring, ScoredFrame};
use crate::logic::policy::types::{AccessReason, Decision, DecisionScores};
use crate::logic::policy::{self, PolicyStore};

// ============================================================================
// STAGES
// ============================================================================

/// Lifecycle stages, for logging and internal-error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Capturing,
    LivenessCheck,
    Identify,
    PolicyCheck,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Capturing => "capturing",
            Stage::LivenessCheck => "liveness_check",
            Stage::Identify => "identify",
            Stage::PolicyCheck => "policy_check",
        }
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Runs the full decision pipeline. Constructed once at process start with
/// its collaborators; no ambient global state.
pub struct AccessOrchestrator {
    scorer: Arc<dyn LivenessScorer>,
    extractor: Arc<dyn EmbeddingExtractor>,
    index: IndexClient,
    policies: Arc<dyn PolicyStore>,
    audit: Arc<dyn AuditSink>,
    config: AccessConfig,
}

impl AccessOrchestrator {
    pub fn new(
        scorer: Arc<dyn LivenessScorer>,
        extractor: Arc<dyn EmbeddingExtractor>,
        index: IndexClient,
        policies: Arc<dyn PolicyStore>,
        audit: Arc<dyn AuditSink>,
        config: AccessConfig,
    ) -> Self {
        Self {
            scorer,
            extractor,
            index,
            policies,
            audit,
            config,
        }
    }

    /// Decide one access request for `resource_id`.
    ///
    /// Expected negative outcomes come back as `Ok(Decision)` with a deny
    /// reason; `Err` is reserved for infrastructure failures and carries no
    /// internals in its display text.
    pub async fn request_access(
        &self,
        source: &mut dyn FrameSource,
        resource_id: &str,
    ) -> AccessResult<Decision> {
        // --- CAPTURING ---
        let mut frames: Vec<Frame> = Vec::new();
        for _ in 0..self.config.capture.frames_per_scan {
            // a miss (camera gap, no face in view) is tolerated
            if let Some(frame) = source.next_frame() {
                frames.push(frame);
            }
        }
        log::debug!(
            "[{}] captured {} of {} frames",
            Stage::Capturing.as_str(),
            frames.len(),
            self.config.capture.frames_per_scan
        );

        if frames.len() < self.config.liveness.min_samples {
            // cannot reach quorum; skip scoring entirely
            return Ok(self.decide(
                Decision::deny(AccessReason::NoFace).with_resource(resource_id),
            ));
        }

        // --- LIVENESS_CHECK ---
        let scored =
            scoring::score_frames(Arc::clone(&self.scorer), frames, &self.config.scoring).await;
        let samples: Vec<_> = scored.iter().map(|s| s.sample).collect();

        let verdict = match liveness::evaluate(&samples, &self.config.liveness) {
            Ok(verdict) => verdict,
            Err(LivenessError::InsufficientSamples { got, need }) => {
                log::info!(
                    "[{}] only {} usable samples of {} required",
                    Stage::LivenessCheck.as_str(),
                    got,
                    need
                );
                let scores = DecisionScores {
                    liveness: samples.iter().map(|s| s.realness_score).collect(),
                    similarity: None,
                };
                return Ok(self.decide(
                    Decision::deny(AccessReason::NoFace)
                        .with_resource(resource_id)
                        .with_scores(scores),
                ));
            }
        };

        let scores = DecisionScores {
            liveness: verdict.scores.clone(),
            similarity: None,
        };

        if !verdict.passed {
            let decision = Decision::deny(AccessReason::SpoofDetected)
                .with_resource(resource_id)
                .with_scores(scores);
            self.emit(AuditEvent::liveness_fail(&decision));
            log::warn!("liveness vote failed for {}: {:?}", resource_id, verdict.scores);
            return Ok(decision);
        }

        // --- IDENTIFY ---
        // embed the most recent frame that scored successfully
        let last_frame = match scored.last() {
            Some(ScoredFrame { frame, .. }) => frame,
            // only reachable with a degenerate zero-minimum config
            None => {
                return Ok(self.decide(
                    Decision::deny(AccessReason::NoFace)
                        .with_resource(resource_id)
                        .with_scores(scores),
                ));
            }
        };

        let embedding = match self.extractor.extract(last_frame) {
            Ok(embedding) => embedding,
            Err(ExtractError::NoFace) => {
                return Ok(self.decide(
                    Decision::deny(AccessReason::NoFace)
                        .with_resource(resource_id)
                        .with_scores(scores),
                ));
            }
            Err(ExtractError::Model(e)) => {
                return Err(self.fail(
                    Stage::Identify,
                    AccessError::Internal(format!("embedding model: {}", e)),
                ));
            }
        };

        let candidates = match self.index.search(&embedding, 1).await {
            Ok(candidates) => candidates,
            Err(e) => return Err(self.fail(Stage::Identify, e)),
        };
        let top_similarity = candidates.first().map(|c| c.similarity);
        let scores = DecisionScores {
            similarity: top_similarity,
            ..scores
        };

        let candidate =
            match gate_top_candidate(candidates, self.config.matcher.identify_threshold) {
                Some(candidate) => candidate,
                None => {
                    return Ok(self.decide(
                        Decision::deny(AccessReason::Unknown)
                            .with_resource(resource_id)
                            .with_scores(scores),
                    ));
                }
            };
        log::debug!(
            "[{}] matched {} at {:.3}",
            Stage::Identify.as_str(),
            candidate.identity_id,
            candidate.similarity
        );

        // --- POLICY_CHECK ---
        let policy = match self.get_policy_with_retry(resource_id) {
            Ok(policy) => policy,
            Err(e) => return Err(self.fail(Stage::PolicyCheck, e)),
        };

        let policy = match policy {
            Some(policy) => policy,
            None => {
                return Ok(self.decide(
                    Decision::deny(AccessReason::NoPolicy)
                        .with_identity(&candidate.identity_id)
                        .with_resource(resource_id)
                        .with_scores(scores),
                ));
            }
        };

        // --- DECIDED ---
        let decision =
            policy::evaluate(&candidate.identity_id, resource_id, &policy, Utc::now())
                .with_scores(scores);
        Ok(self.decide(decision))
    }

    /// Policy lookups are the one transient-infrastructure class that
    /// warrants a limited retry.
    fn get_policy_with_retry(
        &self,
        resource_id: &str,
    ) -> Result<Option<crate::logic::policy::Policy>, AccessError> {
        match self.policies.get(resource_id) {
            Ok(policy) => Ok(policy),
            Err(first) => {
                log::warn!("policy lookup failed, retrying once: {}", first);
                self.policies
                    .get(resource_id)
                    .map_err(AccessError::PolicyStore)
            }
        }
    }

    /// Audit the decision, then hand it back unchanged.
    fn decide(&self, decision: Decision) -> Decision {
        self.emit(AuditEvent::for_decision(&decision));
        log::info!(
            "decision for {}: {:?} ({})",
            decision.resource_id.as_deref().unwrap_or("?"),
            decision.outcome,
            decision.reason
        );
        decision
    }

    /// Best-effort emit; a sink failure never alters the decision.
    fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.emit(&event) {
            log::error!("audit emit failed: {}", e);
        }
    }

    /// Tag the failure stage in the audit trail before surfacing a generic
    /// error.
    fn fail(&self, stage: Stage, err: AccessError) -> AccessError {
        log::error!("[{}] pipeline failure: {:?}", stage.as_str(), err);
        self.emit(AuditEvent::internal_error(stage.as_str()));
        err
    }
}

// ============================================================================
// TESTS
// ============================================================================
