//! Task request types and per-kind context payloads

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{HermodError, Result};

/// The kind of AI task being requested.
///
/// Each kind carries its own execution limits (output size, sampling
/// temperature, deadline, fallback) in the [`TaskRegistry`](crate::TaskRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Chat,
    Analysis,
    Content,
    Email,
}

impl TaskKind {
    /// All known task kinds.
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Chat,
        TaskKind::Analysis,
        TaskKind::Content,
        TaskKind::Email,
    ];

    /// Stable wire name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Chat => "chat",
            TaskKind::Analysis => "analysis",
            TaskKind::Content => "content",
            TaskKind::Email => "email",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = HermodError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chat" => Ok(TaskKind::Chat),
            "analysis" => Ok(TaskKind::Analysis),
            "content" => Ok(TaskKind::Content),
            "email" => Ok(TaskKind::Email),
            other => Err(HermodError::Validation(format!(
                "unknown task kind: {other}"
            ))),
        }
    }
}

/// Structured per-kind request context.
///
/// A closed set of payload shapes keyed by task kind, rather than an
/// untyped bag of fields — the fingerprint function and context builder
/// operate on a known structure. Free-form extras go in the `BTreeMap`
/// fields, whose key order is stable under serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskContext {
    /// Prior turns of an assistant conversation, oldest first.
    Chat { history: Vec<String> },
    /// Aggregated referral figures for a reporting period.
    Analysis {
        period: String,
        referral_totals: BTreeMap<String, u32>,
    },
    /// Marketing content brief.
    Content {
        topic: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
    },
    /// Outreach email parameters.
    Email {
        recipient: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        campaign: Option<String>,
    },
}

impl TaskContext {
    /// The task kind this payload shape belongs to.
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskContext::Chat { .. } => TaskKind::Chat,
            TaskContext::Analysis { .. } => TaskKind::Analysis,
            TaskContext::Content { .. } => TaskKind::Content,
            TaskContext::Email { .. } => TaskKind::Email,
        }
    }
}

/// A single AI request as submitted by a caller.
///
/// Immutable after construction. The caller identity is established
/// separately by the [`Authenticator`](crate::Authenticator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task_kind: TaskKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<TaskContext>,
    /// Overrides the derived cache key (still namespaced by task kind).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_cache_key: Option<String>,
}

impl TaskRequest {
    /// Create a request with no context and no explicit cache key.
    pub fn new(task_kind: TaskKind, prompt: impl Into<String>) -> Self {
        Self {
            task_kind,
            prompt: prompt.into(),
            context: None,
            explicit_cache_key: None,
        }
    }

    /// Attach a structured context payload.
    pub fn context(mut self, context: TaskContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Override the derived cache key.
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.explicit_cache_key = Some(key.into());
        self
    }

    /// Check that the context payload shape matches the task kind.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref context) = self.context
            && context.kind() != self.task_kind
        {
            return Err(HermodError::Validation(format!(
                "context payload is for task kind '{}', request is '{}'",
                context.kind(),
                self.task_kind
            )));
        }
        if self.prompt.trim().is_empty() {
            return Err(HermodError::Validation("empty prompt".into()));
        }
        Ok(())
    }
}
