//! Request orchestration.
//!
//! [`Orchestrator::handle`] is the single entry point the application
//! calls. It composes the task registry, fingerprinting, dedup
//! coordination, the cache, the context builder, the inference client,
//! fallback, and usage metering into one state machine:
//!
//! ```text
//! Validating → Deduping → CacheCheck → CacheHit ───────────────┐
//!                  │           │                               │
//!                  │           └→ Inferring → Success → Caching┤
//!                  │                   │                       ├→ Metering → Done
//!                  │                   └→ Failure → Fallback ──┤
//!                  └→ (follower) await leader's outcome ───────┘
//! ```
//!
//! Every path passes through metering before `Done` — cache hits too,
//! just with zero token cost. The dedup entry created on join is released
//! on every path, including panics and cancellation (guard `Drop`).
//! Authentication and validation failures return before the dedup join
//! and produce no usage record.

mod builder;

pub use builder::OrchestratorBuilder;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::auth::Authenticator;
use crate::cache::CacheStore;
use crate::client::{complete_bounded, CompletionRequest, InferenceClient};
use crate::context::ContextBuilder;
use crate::dedup::{DedupCoordinator, DedupGuard, DedupSlot, SharedFailure, SharedOutcome};
use crate::fallback;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::meter::{Outcome, UsageMeter};
use crate::registry::{TaskProfile, TaskRegistry};
use crate::types::{Completion, TaskRequest, TaskResponse, UsageSummary};
use crate::HermodError;

/// Composes the orchestration components behind a single entry point.
///
/// Construct via [`OrchestratorBuilder`]; share via `Arc` across request
/// handlers. The only in-process shared mutable state is the dedup map.
pub struct Orchestrator {
    registry: TaskRegistry,
    dedup: DedupCoordinator,
    cache: Arc<dyn CacheStore>,
    contexts: ContextBuilder,
    client: Arc<dyn InferenceClient>,
    meter: UsageMeter,
    auth: Arc<dyn Authenticator>,
}

impl Orchestrator {
    /// Create a builder for configuring an orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub(crate) fn new(
        registry: TaskRegistry,
        dedup: DedupCoordinator,
        cache: Arc<dyn CacheStore>,
        contexts: ContextBuilder,
        client: Arc<dyn InferenceClient>,
        meter: UsageMeter,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            registry,
            dedup,
            cache,
            contexts,
            client,
            meter,
            auth,
        }
    }

    /// Handle one AI request end to end.
    ///
    /// Always returns a response shaped as success-or-error; callers never
    /// see raw provider payloads, stack traces, or cache/metering failures.
    #[instrument(skip_all, fields(task = %request.task_kind))]
    pub async fn handle(&self, credential: &str, request: TaskRequest) -> TaskResponse {
        let caller_id = match self.auth.authenticate(credential).await {
            Ok(id) => id,
            Err(_) => return TaskResponse::failure(HermodError::Authentication.to_string()),
        };

        // Validation failures return before the dedup join: no entry, no record
        let Some(profile) = self.registry.resolve(request.task_kind) else {
            return TaskResponse::failure(format!(
                "invalid request: task kind '{}' is not enabled",
                request.task_kind
            ));
        };
        let profile = profile.clone();
        if let Err(e) = request.validate() {
            return TaskResponse::failure(e.to_string());
        }

        let fp = fingerprint(
            request.task_kind,
            &request.prompt,
            request.context.as_ref(),
            request.explicit_cache_key.as_deref(),
        );
        let start = Instant::now();

        match self.dedup.join(&fp) {
            DedupSlot::Leader(guard) => {
                self.lead(&caller_id, &profile, &request, &fp, guard, start)
                    .await
            }
            DedupSlot::Follower(rx) => self.follow(&caller_id, &profile, rx, start).await,
        }
    }

    /// Leader path: cache check, then the real upstream call.
    async fn lead(
        &self,
        caller_id: &str,
        profile: &TaskProfile,
        request: &TaskRequest,
        fp: &Fingerprint,
        guard: DedupGuard,
        start: Instant,
    ) -> TaskResponse {
        match self.cache.get(fp, profile.kind).await {
            Ok(Some(text)) => {
                debug!(fingerprint = %fp, "cache hit");
                // Followers that joined during the lookup share the hit
                guard.complete(Ok(Completion {
                    text: text.clone(),
                    tokens_used: 0,
                }));
                return self
                    .succeed(caller_id, profile, Outcome::CacheHit, text, 0, start)
                    .await;
            }
            Ok(None) => {}
            Err(e) => {
                // Non-fatal by contract; treated as a miss
                warn!(fingerprint = %fp, error = %e, "cache read failed");
            }
        }

        let caller_profile = self.contexts.resolve(caller_id).await;
        let completion_request = CompletionRequest::for_profile(
            profile,
            &request.prompt,
            Some(caller_profile.system_preamble(profile.kind)),
        );

        match complete_bounded(self.client.as_ref(), profile.deadline, &completion_request).await {
            Ok(completion) => {
                guard.complete(Ok(completion.clone()));
                // Write-through, fire-and-forget; fallback output never lands here
                if let Err(e) = self.cache.put(fp, profile.kind, &completion.text).await {
                    warn!(fingerprint = %fp, error = %e, "cache write failed");
                }
                self.succeed(
                    caller_id,
                    profile,
                    Outcome::Upstream,
                    completion.text,
                    completion.tokens_used,
                    start,
                )
                .await
            }
            Err(e) => {
                guard.complete(Err(SharedFailure::classify(&e)));
                self.recover(caller_id, profile, e, start).await
            }
        }
    }

    /// Follower path: await the leader's outcome; zero upstream calls.
    async fn follow(
        &self,
        caller_id: &str,
        profile: &TaskProfile,
        mut rx: broadcast::Receiver<SharedOutcome>,
        start: Instant,
    ) -> TaskResponse {
        match rx.recv().await {
            Ok(Ok(completion)) => {
                // Cost was accounted to the leader; followers record zero
                self.succeed(
                    caller_id,
                    profile,
                    Outcome::DedupJoin,
                    completion.text,
                    0,
                    start,
                )
                .await
            }
            Ok(Err(shared)) => {
                self.recover(caller_id, profile, shared.into_error(), start)
                    .await
            }
            Err(_closed) => {
                // Leader aborted without publishing; same policy as a failure
                let err = HermodError::Provider {
                    message: "inference aborted before completing".into(),
                };
                self.recover(caller_id, profile, err, start).await
            }
        }
    }

    async fn succeed(
        &self,
        caller_id: &str,
        profile: &TaskProfile,
        outcome: Outcome,
        text: String,
        tokens_used: u32,
        start: Instant,
    ) -> TaskResponse {
        let latency = start.elapsed();
        self.meter
            .record(caller_id, profile.kind, outcome, tokens_used, latency, None)
            .await;
        TaskResponse::ok(
            text,
            UsageSummary {
                tokens_used,
                latency_ms: latency.as_millis() as u64,
                estimated_cost: self.meter.estimate_cost(tokens_used),
            },
        )
    }

    /// Failure path: consult the task's fallback, meter as a failure either
    /// way, and never leak the internal error to the caller.
    async fn recover(
        &self,
        caller_id: &str,
        profile: &TaskProfile,
        err: HermodError,
        start: Instant,
    ) -> TaskResponse {
        let latency = start.elapsed();
        match fallback::respond(profile) {
            Some(text) => {
                debug!(task = %profile.kind, error = %err, "serving fallback");
                self.meter
                    .record(
                        caller_id,
                        profile.kind,
                        Outcome::Fallback,
                        0,
                        latency,
                        Some(err.to_string()),
                    )
                    .await;
                TaskResponse::ok(
                    text,
                    UsageSummary {
                        tokens_used: 0,
                        latency_ms: latency.as_millis() as u64,
                        estimated_cost: 0.0,
                    },
                )
            }
            None => {
                self.meter
                    .record(
                        caller_id,
                        profile.kind,
                        Outcome::Failure,
                        0,
                        latency,
                        Some(err.to_string()),
                    )
                    .await;
                TaskResponse::failure(fallback::sanitized_error(profile.kind))
            }
        }
    }
}
