//! Telemetry metric name constants.
//!
//! Centralised metric names for hermod operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hermod_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `task` — task kind (e.g. "chat", "analysis")
//! - `outcome` — terminal path: "cache_hit", "dedup_join", "upstream",
//!   "fallback", "failure"
//! - `status` — "ok" or "error"
//! - `role` — dedup role: "leader" or "follower"

/// Total requests handled by the orchestrator.
///
/// Labels: `task`, `outcome`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "hermod_requests_total";

/// Request duration in seconds, measured from dedup join to terminal state.
///
/// Labels: `task`, `outcome`.
pub const REQUEST_DURATION_SECONDS: &str = "hermod_request_duration_seconds";

/// Total cache hits.
///
/// Labels: `task`.
pub const CACHE_HITS_TOTAL: &str = "hermod_cache_hits_total";

/// Total cache misses (includes validity-window expiries).
///
/// Labels: `task`.
pub const CACHE_MISSES_TOTAL: &str = "hermod_cache_misses_total";

/// Total dedup joins.
///
/// Labels: `role` ("leader" | "follower").
pub const DEDUP_JOINS_TOTAL: &str = "hermod_dedup_joins_total";

/// Total retry attempts against the inference provider (not counting the
/// initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "hermod_retries_total";

/// Total tokens consumed upstream.
///
/// Labels: `task`.
pub const TOKENS_TOTAL: &str = "hermod_tokens_total";

/// Estimated cost per request in USD.
///
/// Labels: `task`.
pub const REQUEST_COST_USD: &str = "hermod_request_cost_usd";
