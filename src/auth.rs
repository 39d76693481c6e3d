//! Caller authentication seam.
//!
//! The identity provider is an external collaborator consumed as a black
//! box: given a bearer credential it returns a caller id or rejects the
//! request. Two embeddable implementations are bundled — a passthrough
//! for hosts that have already authenticated the session, and a static
//! token map for tests and simple deployments.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{HermodError, Result};

/// Maps a bearer credential to a caller identity.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<String>;
}

/// Trusts any non-empty credential as the caller id.
///
/// Appropriate when the embedding application has already authenticated
/// the session and passes its own caller identifier through.
#[derive(Default)]
pub struct PassthroughAuthenticator;

#[async_trait]
impl Authenticator for PassthroughAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<String> {
        if credential.is_empty() {
            return Err(HermodError::Authentication);
        }
        Ok(credential.to_string())
    }
}

/// Static token-to-caller mapping.
#[derive(Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl TokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a caller.
    pub fn token(mut self, token: impl Into<String>, caller_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), caller_id.into());
        self
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<String> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or(HermodError::Authentication)
    }
}
