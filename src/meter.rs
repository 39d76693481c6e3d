//! Usage metering and cost accounting.
//!
//! Every logical request produces exactly one [`UsageRecord`], appended to
//! a [`UsageSink`] — whichever path produced the result. Pure cache hits
//! and dedup joins are recorded as zero-cost successes; fallbacks and hard
//! failures as failures with the internal error message preserved for the
//! audit trail.
//!
//! Metering is best-effort by contract: a sink failure is logged and
//! swallowed, never surfaced to the caller. `metrics` counters are emitted
//! alongside the durable record.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::telemetry;
use crate::types::TaskKind;
use crate::Result;

/// Terminal path a request took through the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    CacheHit,
    DedupJoin,
    Upstream,
    Fallback,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::CacheHit => "cache_hit",
            Outcome::DedupJoin => "dedup_join",
            Outcome::Upstream => "upstream",
            Outcome::Fallback => "fallback",
            Outcome::Failure => "failure",
        }
    }
}

/// One terminal request outcome. Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
    pub caller_id: String,
    pub task_kind: TaskKind,
    pub outcome: Outcome,
    pub tokens_used: u32,
    pub estimated_cost: f64,
    pub latency_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Append-only sink for usage records.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, record: UsageRecord) -> Result<()>;
}

/// In-memory usage log with a snapshot accessor for tests and dashboards.
#[derive(Default)]
pub struct MemoryUsageLog {
    records: RwLock<Vec<UsageRecord>>,
}

impl MemoryUsageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records in append order.
    pub async fn snapshot(&self) -> Vec<UsageRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl UsageSink for MemoryUsageLog {
    async fn record(&self, record: UsageRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }
}

/// Per-token pricing used for cost estimates.
#[derive(Debug, Clone)]
pub struct Pricing {
    /// USD per 1M tokens. Default: 3.0 (mid-tier model, blended).
    pub usd_per_1m_tokens: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            usd_per_1m_tokens: 3.0,
        }
    }
}

impl Pricing {
    pub fn new(usd_per_1m_tokens: f64) -> Self {
        Self { usd_per_1m_tokens }
    }

    /// Estimated cost for a token count.
    pub fn estimate(&self, tokens: u32) -> f64 {
        (f64::from(tokens) / 1_000_000.0) * self.usd_per_1m_tokens
    }
}

/// Records one terminal outcome per logical request.
#[derive(Clone)]
pub struct UsageMeter {
    sink: std::sync::Arc<dyn UsageSink>,
    pricing: Pricing,
}

impl UsageMeter {
    pub fn new(sink: std::sync::Arc<dyn UsageSink>, pricing: Pricing) -> Self {
        Self { sink, pricing }
    }

    /// Estimated cost for a token count under the configured pricing.
    pub fn estimate_cost(&self, tokens: u32) -> f64 {
        self.pricing.estimate(tokens)
    }

    /// Record a terminal outcome. Best-effort: sink failures are logged
    /// and swallowed so metering never causes a request failure.
    pub async fn record(
        &self,
        caller_id: &str,
        kind: TaskKind,
        outcome: Outcome,
        tokens_used: u32,
        latency: Duration,
        error_message: Option<String>,
    ) {
        let success = error_message.is_none();
        let estimated_cost = self.pricing.estimate(tokens_used);
        let latency_ms = latency.as_millis() as u64;

        let status = if success { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "task" => kind.as_str(),
            "outcome" => outcome.as_str(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "task" => kind.as_str(),
            "outcome" => outcome.as_str(),
        )
        .record(latency.as_secs_f64());
        if tokens_used > 0 {
            metrics::counter!(telemetry::TOKENS_TOTAL, "task" => kind.as_str())
                .increment(u64::from(tokens_used));
            metrics::histogram!(telemetry::REQUEST_COST_USD, "task" => kind.as_str())
                .record(estimated_cost);
        }

        let record = UsageRecord {
            caller_id: caller_id.to_string(),
            task_kind: kind,
            outcome,
            tokens_used,
            estimated_cost,
            latency_ms,
            success,
            error_message,
        };
        if let Err(e) = self.sink.record(record).await {
            warn!(task = %kind, error = %e, "usage record dropped");
        }
    }
}
