//! HTTP client tests against a mock provider endpoint.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hermod::client::{CompletionRequest, RetryingClient};
use hermod::{HermodError, HttpInferenceClient, InferenceClient, RetryConfig};

fn request() -> CompletionRequest {
    CompletionRequest {
        prompt: "write a short greeting".into(),
        system: Some("You are a helpful assistant.".into()),
        max_tokens: 256,
        temperature: 0.7,
    }
}

fn client_for(server: &MockServer) -> HttpInferenceClient {
    HttpInferenceClient::new(server.uri(), "test-key", "test-model")
}

#[tokio::test]
async fn successful_completion_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "prompt": "write a short greeting",
            "max_tokens": 256,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "Hello there!",
            "tokens_used": 12,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let completion = client.complete(&request()).await.expect("completion");
    assert_eq!(completion.text, "Hello there!");
    assert_eq!(completion.tokens_used, 12);
}

#[tokio::test]
async fn rate_limit_response_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete(&request()).await.unwrap_err();
    match err {
        HermodError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_becomes_api_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete(&request()).await.unwrap_err();
    assert!(err.is_transient(), "a 5xx should be retryable");
    match err {
        HermodError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream overloaded");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn multibyte_error_body_is_truncated_on_a_char_boundary() {
    let server = MockServer::start().await;
    // A euro sign straddles the truncation limit
    let body = format!("{}€ overloaded", "x".repeat(199));
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete(&request()).await.unwrap_err();
    match err {
        HermodError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "x".repeat(199));
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete(&request()).await.unwrap_err();
    assert!(matches!(err, HermodError::Provider { .. }));
}

#[tokio::test]
async fn empty_completion_text_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "",
            "tokens_used": 0,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete(&request()).await.unwrap_err();
    assert!(matches!(err, HermodError::Provider { .. }));
}

#[tokio::test]
async fn retrying_client_recovers_from_a_transient_failure() {
    let server = MockServer::start().await;
    // First call fails with 503, the mock then expires and the retry
    // falls through to the success mock below.
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "recovered",
            "tokens_used": 5,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let inner = Arc::new(client_for(&server));
    let config = RetryConfig::new()
        .max_attempts(3)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5));
    let client = RetryingClient::new(inner, config);

    let completion = client.complete(&request()).await.expect("completion");
    assert_eq!(completion.text, "recovered");
}

#[tokio::test]
async fn retrying_client_does_not_retry_auth_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let inner = Arc::new(client_for(&server));
    let config = RetryConfig::new()
        .max_attempts(3)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5));
    let client = RetryingClient::new(inner, config);

    let err = client.complete(&request()).await.unwrap_err();
    assert!(matches!(err, HermodError::Api { status: 401, .. }));
}
