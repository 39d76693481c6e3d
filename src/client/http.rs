//! HTTP inference provider client.
//!
//! Speaks a simple completions protocol: POST `/v1/completions` with the
//! serialized [`CompletionRequest`](super::CompletionRequest) plus the
//! configured model, expecting `{ "text": ..., "tokens_used": ... }` back.
//! Provider error payloads are folded into the error taxonomy and never
//! passed through to callers verbatim.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{CompletionRequest, InferenceClient};
use crate::types::Completion;
use crate::{HermodError, Result};

/// Maximum bytes of an upstream error body kept in the error message.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct CompletionBody {
    text: String,
    tokens_used: u32,
}

/// Reqwest-based client for an HTTP completions endpoint.
pub struct HttpInferenceClient {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl HttpInferenceClient {
    /// Create a client for the given endpoint and model.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Use an existing `reqwest::Client` (shared connection pool).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let payload = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "system": request.system,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(HermodError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                // Truncate on a char boundary; provider error pages may
                // contain multibyte text
                let mut end = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(HermodError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: CompletionBody = response.json().await.map_err(|e| HermodError::Provider {
            message: format!("malformed provider response: {e}"),
        })?;

        if body.text.is_empty() {
            return Err(HermodError::Provider {
                message: "empty completion from provider".into(),
            });
        }

        Ok(Completion {
            text: body.text,
            tokens_used: body.tokens_used,
        })
    }
}
