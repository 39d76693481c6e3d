//! Builder for configuring orchestrator instances

use std::sync::Arc;

use super::Orchestrator;
use crate::auth::{Authenticator, PassthroughAuthenticator};
use crate::cache::{CacheConfig, CacheStore, MemoryCacheStore};
use crate::client::{InferenceClient, RetryConfig, RetryingClient};
use crate::context::{ContextBuilder, MemoryProfileStore, ProfileStore};
use crate::dedup::DedupCoordinator;
use crate::meter::{MemoryUsageLog, Pricing, UsageMeter, UsageSink};
use crate::registry::TaskRegistry;
use crate::{HermodError, Result};

/// Builder for configuring orchestrator instances.
///
/// The inference client is required; everything else has an in-memory
/// default suitable for embedding and tests. Real deployments inject
/// persistent cache, profile, and usage backends.
pub struct OrchestratorBuilder {
    client: Option<Arc<dyn InferenceClient>>,
    registry: TaskRegistry,
    cache: Option<Arc<dyn CacheStore>>,
    cache_config: CacheConfig,
    profiles: Option<Arc<dyn ProfileStore>>,
    usage: Option<Arc<dyn UsageSink>>,
    auth: Option<Arc<dyn Authenticator>>,
    coordinator: Option<DedupCoordinator>,
    pricing: Pricing,
    retry: Option<RetryConfig>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            registry: TaskRegistry::default(),
            cache: None,
            cache_config: CacheConfig::default(),
            profiles: None,
            usage: None,
            auth: None,
            coordinator: None,
            pricing: Pricing::default(),
            retry: None,
        }
    }

    /// Set the inference client (required).
    pub fn client(mut self, client: Arc<dyn InferenceClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replace the default task registry.
    pub fn registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Inject a cache backend (default: in-memory).
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Configure the default in-memory cache. Ignored when a backend is
    /// injected via [`cache`](Self::cache).
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Inject a caller profile store (default: in-memory).
    pub fn profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(store);
        self
    }

    /// Inject a usage sink (default: in-memory log).
    pub fn usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage = Some(sink);
        self
    }

    /// Inject an authenticator (default: passthrough).
    pub fn authenticator(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Inject a dedup coordinator, e.g. to observe in-flight state from
    /// tests. Default: a fresh coordinator per orchestrator.
    pub fn coordinator(mut self, coordinator: DedupCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Set token pricing for cost estimates.
    pub fn pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Enable retries on transient provider errors. The client is wrapped
    /// in a [`RetryingClient`] at build time.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<Orchestrator> {
        let client = self
            .client
            .ok_or_else(|| HermodError::Configuration("no inference client configured".into()))?;
        let client: Arc<dyn InferenceClient> = match self.retry {
            Some(config) => Arc::new(RetryingClient::new(client, config)),
            None => client,
        };

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCacheStore::new(&self.cache_config)));
        let profiles = self
            .profiles
            .unwrap_or_else(|| Arc::new(MemoryProfileStore::new()));
        let usage = self.usage.unwrap_or_else(|| Arc::new(MemoryUsageLog::new()));
        let auth = self
            .auth
            .unwrap_or_else(|| Arc::new(PassthroughAuthenticator));

        Ok(Orchestrator::new(
            self.registry,
            self.coordinator.unwrap_or_default(),
            cache,
            ContextBuilder::new(profiles),
            client,
            UsageMeter::new(usage, self.pricing),
            auth,
        ))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_client_fails() {
        let result = OrchestratorBuilder::new().build();
        assert!(matches!(result, Err(HermodError::Configuration(_))));
    }
}
