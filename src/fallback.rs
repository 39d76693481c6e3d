//! Fallback responses for failed or timed-out inference.
//!
//! A pure lookup against the task profile's canned text. When a task has
//! no fallback, the orchestrator surfaces a sanitized, task-agnostic
//! message instead — internal provider error text never reaches callers.

use crate::registry::TaskProfile;
use crate::types::TaskKind;

/// The task's canned fallback text, if one is defined.
pub fn respond(profile: &TaskProfile) -> Option<&str> {
    profile.fallback_text.as_deref()
}

/// Caller-safe message for a task with no fallback.
pub fn sanitized_error(kind: TaskKind) -> String {
    format!("The {kind} service is temporarily unavailable. Please try again later.")
}
