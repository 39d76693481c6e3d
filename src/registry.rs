//! Static task profile registry.
//!
//! Maps each [`TaskKind`] to its execution limits: maximum output size,
//! sampling temperature, per-call deadline, and an optional canned fallback.
//! Read-only after construction; lookups are O(1). Unknown kinds are a
//! caller error, not a system fault.

use std::collections::HashMap;
use std::time::Duration;

use crate::types::TaskKind;

/// Execution limits for one task kind. Immutable once registered.
#[derive(Debug, Clone)]
pub struct TaskProfile {
    pub kind: TaskKind,
    /// Upper bound on generated output, in tokens.
    pub max_output_tokens: u32,
    /// Sampling temperature passed to the provider.
    pub temperature: f32,
    /// Hard deadline for the upstream call.
    pub deadline: Duration,
    /// Canned response returned when the upstream call fails and no cached
    /// value exists. `None` means failures surface as sanitized errors.
    pub fallback_text: Option<String>,
}

impl TaskProfile {
    /// Default profile for a task kind.
    pub fn new(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Chat => Self {
                kind,
                max_output_tokens: 1024,
                temperature: 0.7,
                deadline: Duration::from_secs(15),
                fallback_text: Some(
                    "I'm unable to respond right now. Please try again in a moment.".into(),
                ),
            },
            TaskKind::Analysis => Self {
                kind,
                max_output_tokens: 2048,
                temperature: 0.2,
                deadline: Duration::from_secs(30),
                fallback_text: None,
            },
            TaskKind::Content => Self {
                kind,
                max_output_tokens: 1024,
                temperature: 0.9,
                deadline: Duration::from_secs(20),
                fallback_text: Some("Content suggestions are temporarily unavailable.".into()),
            },
            TaskKind::Email => Self {
                kind,
                max_output_tokens: 512,
                temperature: 0.6,
                deadline: Duration::from_secs(10),
                fallback_text: Some(
                    "Email drafting is temporarily unavailable. Please compose manually.".into(),
                ),
            },
        }
    }

    /// Set the maximum output size in tokens.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the hard deadline for the upstream call.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the canned fallback text.
    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback_text = Some(text.into());
        self
    }

    /// Remove the canned fallback; failures surface as sanitized errors.
    pub fn no_fallback(mut self) -> Self {
        self.fallback_text = None;
        self
    }
}

/// Registry of task profiles, loaded at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    profiles: HashMap<TaskKind, TaskProfile>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        let mut profiles = HashMap::with_capacity(TaskKind::ALL.len());
        for kind in TaskKind::ALL {
            profiles.insert(kind, TaskProfile::new(kind));
        }
        Self { profiles }
    }
}

impl TaskRegistry {
    /// Registry with default profiles for every known kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no profiles; every lookup misses until `register` is
    /// called. Useful when a deployment enables only a subset of tasks.
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Register or replace a profile.
    pub fn register(mut self, profile: TaskProfile) -> Self {
        self.profiles.insert(profile.kind, profile);
        self
    }

    /// Look up the profile for a task kind.
    pub fn resolve(&self, kind: TaskKind) -> Option<&TaskProfile> {
        self.profiles.get(&kind)
    }
}
