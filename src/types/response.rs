//! Response types

use serde::{Deserialize, Serialize};

/// Generated text plus the token count the provider billed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub tokens_used: u32,
}

/// Per-request usage summary returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub tokens_used: u32,
    pub latency_ms: u64,
    pub estimated_cost: f64,
}

/// The orchestrator's response envelope.
///
/// Callers always receive this shape — success or a sanitized error,
/// never raw provider payloads or internal persistence failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSummary>,
}

impl TaskResponse {
    /// A successful response carrying generated (or cached, or fallback) text.
    pub fn ok(data: impl Into<String>, usage: UsageSummary) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
            usage: Some(usage),
        }
    }

    /// A hard failure with a caller-safe message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_shape() {
        let response = TaskResponse::ok(
            "generated",
            UsageSummary {
                tokens_used: 42,
                latency_ms: 120,
                estimated_cost: 0.000126,
            },
        );
        assert!(response.success);
        assert_eq!(response.data.as_deref(), Some("generated"));
        assert!(response.error.is_none());
    }

    #[test]
    fn failure_response_shape() {
        let response = TaskResponse::failure("invalid request: empty prompt");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert!(response.usage.is_none());
    }

    #[test]
    fn serialized_failure_omits_empty_fields() {
        let json = serde_json::to_value(TaskResponse::failure("nope")).unwrap();
        assert!(json.get("data").is_none());
        assert!(json.get("usage").is_none());
    }
}
