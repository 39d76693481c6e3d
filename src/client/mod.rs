//! Inference provider clients.
//!
//! [`InferenceClient`] is the seam to the external provider. The bundled
//! [`HttpInferenceClient`] talks to an HTTP completions endpoint; tests
//! and embedders can supply their own implementation.
//!
//! Deadline enforcement lives in [`complete_bounded`]: every upstream call
//! is wrapped in `tokio::time::timeout` with the task profile's deadline.
//! Expiry drops the in-flight future — cancellation leaves no partial
//! state visible to the rest of the system — and surfaces
//! [`HermodError::DeadlineExceeded`], distinct from provider failures so
//! the two are logged separately.

mod http;
mod retry;

pub use http::HttpInferenceClient;
pub use retry::{RetryConfig, RetryingClient};

use std::time::Duration;

use async_trait::async_trait;

use crate::registry::TaskProfile;
use crate::types::Completion;
use crate::{HermodError, Result};

/// Payload sent to the inference provider.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Build the payload for a prompt under a task profile's limits.
    pub fn for_profile(profile: &TaskProfile, prompt: &str, system: Option<String>) -> Self {
        Self {
            prompt: prompt.to_string(),
            system,
            max_tokens: profile.max_output_tokens,
            temperature: profile.temperature,
        }
    }
}

/// Client for the external inference provider.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Provider name, used in logs and metrics.
    fn name(&self) -> &str;

    /// Issue one completion call. Implementations must be cancel-safe:
    /// dropping the returned future abandons the call cleanly.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Run a completion under a hard deadline.
///
/// On expiry the in-flight call is cancelled (the future is dropped) and
/// `DeadlineExceeded` is returned.
pub async fn complete_bounded(
    client: &dyn InferenceClient,
    deadline: Duration,
    request: &CompletionRequest,
) -> Result<Completion> {
    match tokio::time::timeout(deadline, client.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(HermodError::DeadlineExceeded { deadline }),
    }
}
