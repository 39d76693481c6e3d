//! Hermod - AI request orchestration
//!
//! This crate mediates between an application and an external LLM
//! inference provider. It avoids duplicate expensive calls for identical
//! concurrent requests (single-flight dedup), reuses previously computed
//! results within a validity window (read-through cache), bounds every
//! call with a per-task deadline, degrades gracefully via per-task
//! fallback text, and meters every outcome for cost and latency
//! accounting.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hermod::{HttpInferenceClient, Orchestrator, TaskKind, TaskRequest};
//!
//! #[tokio::main]
//! async fn main() -> hermod::Result<()> {
//!     let client = HttpInferenceClient::new(
//!         "https://inference.example.com",
//!         "sk-your-key",
//!         "mid-tier-model",
//!     );
//!     let orchestrator = Orchestrator::builder()
//!         .client(Arc::new(client))
//!         .build()?;
//!
//!     let response = orchestrator
//!         .handle(
//!             "caller-42",
//!             TaskRequest::new(TaskKind::Chat, "Summarize this week's referrals."),
//!         )
//!         .await;
//!
//!     if let Some(text) = response.data {
//!         println!("{text}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod context;
pub mod dedup;
pub mod error;
pub mod fallback;
pub mod fingerprint;
pub mod meter;
pub mod orchestrator;
pub mod registry;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use auth::{Authenticator, PassthroughAuthenticator, TokenAuthenticator};
pub use cache::{CacheConfig, CacheStore, MemoryCacheStore};
pub use client::{CompletionRequest, HttpInferenceClient, InferenceClient, RetryConfig};
pub use context::{CallerProfile, ContextBuilder, MemoryProfileStore, ProfileStore, Tone};
pub use dedup::{DedupCoordinator, DedupSlot};
pub use error::{HermodError, Result};
pub use fingerprint::{fingerprint, Fingerprint};
pub use meter::{MemoryUsageLog, Outcome, Pricing, UsageRecord, UsageSink};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use registry::{TaskProfile, TaskRegistry};
pub use types::{Completion, TaskContext, TaskKind, TaskRequest, TaskResponse, UsageSummary};
