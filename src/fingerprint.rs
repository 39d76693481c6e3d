//! Deterministic request fingerprints.
//!
//! A fingerprint identifies a request by `(task kind, prompt, context)` and
//! serves as both the cache key and the dedup key. Two requests with the
//! same fingerprint are identical by contract.
//!
//! Determinism matters more than collision resistance here: the context is
//! serialized through `serde_json`, whose object maps are `BTreeMap`-backed,
//! so key order is stable regardless of construction order. The serialized
//! form is SHA-256 hashed and truncated to 16 hex chars — the truncation
//! keeps keys short at an accepted (documented) collision risk.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{TaskContext, TaskKind};

/// Number of hex chars kept from the digest.
const FINGERPRINT_LEN: usize = 16;

/// Opaque request identifier used as cache key and dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint for a request.
///
/// Pure and deterministic: structurally equal inputs always produce the
/// same output. An explicit cache key replaces the prompt+context
/// derivation but remains namespaced by task kind.
pub fn fingerprint(
    kind: TaskKind,
    prompt: &str,
    context: Option<&TaskContext>,
    explicit_key: Option<&str>,
) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0u8]);
    match explicit_key {
        Some(key) => {
            hasher.update(b"explicit");
            hasher.update([0u8]);
            hasher.update(key.as_bytes());
        }
        None => {
            hasher.update(prompt.as_bytes());
            hasher.update([0u8]);
            if let Some(context) = context {
                // serde_json object keys are sorted, so this is canonical
                let canonical = serde_json::to_string(context)
                    .unwrap_or_else(|_| String::from("unserializable"));
                hasher.update(canonical.as_bytes());
            }
        }
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(FINGERPRINT_LEN);
    for byte in digest.iter().take(FINGERPRINT_LEN / 2) {
        use std::fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }
    Fingerprint(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn analysis_context(pairs: &[(&str, u32)]) -> TaskContext {
        TaskContext::Analysis {
            period: "2026-08".into(),
            referral_totals: pairs
                .iter()
                .map(|(name, count)| (name.to_string(), *count))
                .collect(),
        }
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let ctx = analysis_context(&[("ortho", 12), ("endo", 3)]);
        let a = fingerprint(TaskKind::Analysis, "summarize", Some(&ctx), None);
        let b = fingerprint(TaskKind::Analysis, "summarize", Some(&ctx), None);
        assert_eq!(a, b);
    }

    #[test]
    fn stable_under_map_insertion_order() {
        // Structurally equal contexts built in different orders
        let forward = analysis_context(&[("ortho", 12), ("endo", 3)]);
        let reversed = analysis_context(&[("endo", 3), ("ortho", 12)]);
        let a = fingerprint(TaskKind::Analysis, "summarize", Some(&forward), None);
        let b = fingerprint(TaskKind::Analysis, "summarize", Some(&reversed), None);
        assert_eq!(a, b);
    }

    #[test]
    fn differs_on_task_kind() {
        let a = fingerprint(TaskKind::Chat, "hello", None, None);
        let b = fingerprint(TaskKind::Content, "hello", None, None);
        assert_ne!(a, b);
    }

    #[test]
    fn differs_on_prompt() {
        let a = fingerprint(TaskKind::Chat, "hello", None, None);
        let b = fingerprint(TaskKind::Chat, "goodbye", None, None);
        assert_ne!(a, b);
    }

    #[test]
    fn differs_on_context() {
        let with_ctx = analysis_context(&[("ortho", 12)]);
        let a = fingerprint(TaskKind::Analysis, "summarize", None, None);
        let b = fingerprint(TaskKind::Analysis, "summarize", Some(&with_ctx), None);
        assert_ne!(a, b);
    }

    #[test]
    fn differs_on_context_values() {
        let twelve = analysis_context(&[("ortho", 12)]);
        let thirteen = analysis_context(&[("ortho", 13)]);
        let a = fingerprint(TaskKind::Analysis, "summarize", Some(&twelve), None);
        let b = fingerprint(TaskKind::Analysis, "summarize", Some(&thirteen), None);
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_key_overrides_derivation() {
        let a = fingerprint(TaskKind::Chat, "hello", None, Some("welcome-v2"));
        let b = fingerprint(TaskKind::Chat, "a different prompt", None, Some("welcome-v2"));
        assert_eq!(a, b);
    }

    #[test]
    fn explicit_key_is_namespaced_by_kind() {
        let a = fingerprint(TaskKind::Chat, "hello", None, Some("welcome-v2"));
        let b = fingerprint(TaskKind::Email, "hello", None, Some("welcome-v2"));
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_length_hex() {
        let fp = fingerprint(TaskKind::Chat, "hello", None, None);
        assert_eq!(fp.as_str().len(), 16);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn free_form_map_key_order_is_canonical() {
        let mut totals = BTreeMap::new();
        totals.insert("b".to_string(), 2u32);
        totals.insert("a".to_string(), 1u32);
        let ctx = TaskContext::Analysis {
            period: "2026-08".into(),
            referral_totals: totals,
        };
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.find("\"a\"").unwrap() < json.find("\"b\"").unwrap());
    }
}
