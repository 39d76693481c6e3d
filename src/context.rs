//! Caller profile resolution.
//!
//! The context builder resolves a caller's stored profile, provisioning a
//! minimal default on first contact. The profile personalizes the payload
//! sent upstream (a system preamble); it has no correctness impact on
//! inference, only on personalization quality, so provisioning races are
//! tolerated — concurrent first-time calls may both upsert, and either
//! write winning is benign. Persistence failures are logged and swallowed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use crate::types::TaskKind;
use crate::Result;

/// Preferred voice for generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Concise,
}

impl Tone {
    fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Concise => "concise",
        }
    }
}

/// Persona attributes for one caller.
///
/// Created lazily on first request; may be edited by administrative flows
/// outside the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallerProfile {
    pub caller_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_name: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    /// Free-form persona attributes (specialty, locale, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CallerProfile {
    /// Minimal default profile synthesized on first contact.
    pub fn minimal(caller_id: &str) -> Self {
        Self {
            caller_id: caller_id.to_string(),
            display_name: caller_id.to_string(),
            practice_name: None,
            tone: Tone::default(),
            attributes: BTreeMap::new(),
        }
    }

    /// System preamble used to personalize the upstream payload.
    pub fn system_preamble(&self, kind: TaskKind) -> String {
        let mut preamble = format!(
            "You are assisting {} with a {} task. Keep the tone {}.",
            self.display_name,
            kind,
            self.tone.as_str()
        );
        if let Some(ref practice) = self.practice_name {
            preamble.push_str(&format!(" The practice is {practice}."));
        }
        preamble
    }
}

/// Pluggable profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, caller_id: &str) -> Result<Option<CallerProfile>>;

    /// Insert or overwrite. Concurrent upserts for the same caller may
    /// race; either write winning is acceptable.
    async fn upsert(&self, profile: CallerProfile) -> Result<()>;
}

/// In-memory profile store.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, CallerProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, caller_id: &str) -> Result<Option<CallerProfile>> {
        Ok(self.profiles.read().await.get(caller_id).cloned())
    }

    async fn upsert(&self, profile: CallerProfile) -> Result<()> {
        self.profiles
            .write()
            .await
            .insert(profile.caller_id.clone(), profile);
        Ok(())
    }
}

/// Resolves or lazily provisions caller profiles.
#[derive(Clone)]
pub struct ContextBuilder {
    store: Arc<dyn ProfileStore>,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Resolve the profile for `caller_id`, provisioning a minimal default
    /// if none exists. Never fails: a store error degrades to the default
    /// profile with a warning, since personalization is non-critical.
    pub async fn resolve(&self, caller_id: &str) -> CallerProfile {
        match self.store.get(caller_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                let profile = CallerProfile::minimal(caller_id);
                if let Err(e) = self.store.upsert(profile.clone()).await {
                    warn!(caller_id, error = %e, "failed to provision caller profile");
                }
                profile
            }
            Err(e) => {
                warn!(caller_id, error = %e, "profile lookup failed, using default");
                CallerProfile::minimal(caller_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HermodError;

    #[tokio::test]
    async fn first_contact_provisions_default() {
        let store = Arc::new(MemoryProfileStore::new());
        let builder = ContextBuilder::new(store.clone());

        let profile = builder.resolve("caller-1").await;
        assert_eq!(profile.display_name, "caller-1");

        // Provisioned profile was persisted
        let stored = store.get("caller-1").await.unwrap();
        assert_eq!(stored, Some(profile));
    }

    #[tokio::test]
    async fn existing_profile_is_returned_unchanged() {
        let store = Arc::new(MemoryProfileStore::new());
        let mut profile = CallerProfile::minimal("caller-1");
        profile.display_name = "Dr. Chen".into();
        profile.practice_name = Some("Lakeside Dental".into());
        store.upsert(profile.clone()).await.unwrap();

        let builder = ContextBuilder::new(store);
        let resolved = builder.resolve("caller-1").await;
        assert_eq!(resolved.display_name, "Dr. Chen");
    }

    #[tokio::test]
    async fn repeated_resolution_is_idempotent() {
        let store = Arc::new(MemoryProfileStore::new());
        let builder = ContextBuilder::new(store);
        let first = builder.resolve("caller-1").await;
        let second = builder.resolve("caller-1").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_default() {
        struct FailingStore;

        #[async_trait]
        impl ProfileStore for FailingStore {
            async fn get(&self, _caller_id: &str) -> Result<Option<CallerProfile>> {
                Err(HermodError::Cache("store offline".into()))
            }
            async fn upsert(&self, _profile: CallerProfile) -> Result<()> {
                Err(HermodError::Cache("store offline".into()))
            }
        }

        let builder = ContextBuilder::new(Arc::new(FailingStore));
        let profile = builder.resolve("caller-1").await;
        assert_eq!(profile, CallerProfile::minimal("caller-1"));
    }

    #[test]
    fn preamble_mentions_practice_when_known() {
        let mut profile = CallerProfile::minimal("caller-1");
        profile.practice_name = Some("Lakeside Dental".into());
        let preamble = profile.system_preamble(TaskKind::Email);
        assert!(preamble.contains("Lakeside Dental"));
        assert!(preamble.contains("email"));
    }
}
