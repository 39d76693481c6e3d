//! In-process request deduplication.
//!
//! The coordinator maps in-flight fingerprints to a shared outcome channel
//! so that at most one upstream call runs per fingerprint at a time. The
//! first joiner becomes the **leader** and owns a [`DedupGuard`]; later
//! joiners are **followers** and receive the leader's outcome without
//! making any upstream call.
//!
//! Entry removal is the safety-critical invariant: the guard removes its
//! entry on [`DedupGuard::complete`] and again on `Drop` if the leader
//! never completed (panic, cancellation), so a failed leader can never
//! permanently block future requests with the same fingerprint. A dropped
//! guard closes the channel, which followers observe as an aborted leader.
//!
//! The coordinator is an explicitly constructed, cheaply cloneable object
//! with one instance per process — injectable, so tests get a fresh map.
//! It is process-local by design: replicas each run their own coordinator,
//! which is an accepted limitation for this workload, not a correctness bug.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::fingerprint::Fingerprint;
use crate::telemetry;
use crate::types::Completion;
use crate::HermodError;

/// Channel capacity: one terminal outcome per entry.
const OUTCOME_CAPACITY: usize = 1;

/// Failure classification shared between leader and followers.
///
/// `HermodError` is not `Clone`, so the leader publishes this reduced form
/// and each joiner maps it back into the error taxonomy.
#[derive(Debug, Clone)]
pub enum SharedFailure {
    DeadlineExceeded { deadline: Duration },
    Provider { message: String },
}

impl SharedFailure {
    /// Classify an upstream error for publication to followers.
    pub fn classify(err: &HermodError) -> Self {
        match err {
            HermodError::DeadlineExceeded { deadline } => SharedFailure::DeadlineExceeded {
                deadline: *deadline,
            },
            other => SharedFailure::Provider {
                message: other.to_string(),
            },
        }
    }

    /// Map back into the error taxonomy.
    pub fn into_error(self) -> HermodError {
        match self {
            SharedFailure::DeadlineExceeded { deadline } => {
                HermodError::DeadlineExceeded { deadline }
            }
            SharedFailure::Provider { message } => HermodError::Provider { message },
        }
    }
}

/// The outcome a leader publishes to its followers.
pub type SharedOutcome = std::result::Result<Completion, SharedFailure>;

type InflightMap = Arc<Mutex<HashMap<String, broadcast::Sender<SharedOutcome>>>>;

/// Role assigned by [`DedupCoordinator::join`].
pub enum DedupSlot {
    /// First joiner for this fingerprint; responsible for the upstream call
    /// and for resolving the guard.
    Leader(DedupGuard),
    /// A call for this fingerprint is already in flight; await its outcome.
    Follower(broadcast::Receiver<SharedOutcome>),
}

/// Registry of in-flight fingerprints.
#[derive(Clone, Default)]
pub struct DedupCoordinator {
    inflight: InflightMap,
}

impl DedupCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-or-create the entry for `fingerprint`.
    ///
    /// Exactly one concurrent joiner per fingerprint becomes the leader;
    /// everyone else subscribes to the leader's outcome.
    pub fn join(&self, fingerprint: &Fingerprint) -> DedupSlot {
        let mut map = lock(&self.inflight);
        if let Some(tx) = map.get(fingerprint.as_str()) {
            metrics::counter!(telemetry::DEDUP_JOINS_TOTAL, "role" => "follower").increment(1);
            return DedupSlot::Follower(tx.subscribe());
        }
        let (tx, _rx) = broadcast::channel(OUTCOME_CAPACITY);
        map.insert(fingerprint.to_string(), tx.clone());
        metrics::counter!(telemetry::DEDUP_JOINS_TOTAL, "role" => "leader").increment(1);
        DedupSlot::Leader(DedupGuard {
            inflight: Arc::clone(&self.inflight),
            key: fingerprint.to_string(),
            tx: Some(tx),
        })
    }

    /// Number of fingerprints currently in flight.
    pub fn inflight_len(&self) -> usize {
        lock(&self.inflight).len()
    }
}

/// Leader-side handle for an in-flight fingerprint.
///
/// Must be resolved via [`complete`](Self::complete); dropping it
/// unresolved removes the entry and signals followers that the leader
/// aborted. Either way the entry is gone before any follower resolves,
/// so a subsequent identical request can become leader again.
pub struct DedupGuard {
    inflight: InflightMap,
    key: String,
    tx: Option<broadcast::Sender<SharedOutcome>>,
}

impl DedupGuard {
    /// Publish the terminal outcome and release the entry.
    pub fn complete(mut self, outcome: SharedOutcome) {
        if let Some(tx) = self.tx.take() {
            self.remove_entry();
            // No followers joined — nothing to notify
            let _ = tx.send(outcome);
        }
    }

    fn remove_entry(&self) {
        lock(&self.inflight).remove(&self.key);
    }
}

impl Drop for DedupGuard {
    fn drop(&mut self) {
        // Leader exited without completing; release the entry so the
        // fingerprint is not blocked forever. Dropping the sender closes
        // the channel, which followers observe as an aborted leader.
        if self.tx.is_some() {
            self.remove_entry();
        }
    }
}

/// Lock the in-flight map, recovering from poisoning.
///
/// A panicking leader must not permanently wedge the map; the stored
/// senders are valid regardless of the panic.
fn lock(map: &InflightMap) -> std::sync::MutexGuard<'_, HashMap<String, broadcast::Sender<SharedOutcome>>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::types::TaskKind;

    fn fp(prompt: &str) -> Fingerprint {
        fingerprint(TaskKind::Chat, prompt, None, None)
    }

    fn completion(text: &str) -> Completion {
        Completion {
            text: text.into(),
            tokens_used: 7,
        }
    }

    #[test]
    fn first_joiner_is_leader() {
        let coordinator = DedupCoordinator::new();
        assert!(matches!(coordinator.join(&fp("a")), DedupSlot::Leader(_)));
    }

    #[test]
    fn second_joiner_is_follower() {
        let coordinator = DedupCoordinator::new();
        let _leader = coordinator.join(&fp("a"));
        assert!(matches!(coordinator.join(&fp("a")), DedupSlot::Follower(_)));
    }

    #[test]
    fn distinct_fingerprints_get_distinct_leaders() {
        let coordinator = DedupCoordinator::new();
        let _a = coordinator.join(&fp("a"));
        let _b = coordinator.join(&fp("b"));
        assert!(matches!(_b, DedupSlot::Leader(_)));
        assert_eq!(coordinator.inflight_len(), 2);
    }

    #[tokio::test]
    async fn followers_receive_leader_outcome() {
        let coordinator = DedupCoordinator::new();
        let DedupSlot::Leader(guard) = coordinator.join(&fp("a")) else {
            panic!("expected leader");
        };
        let DedupSlot::Follower(mut rx1) = coordinator.join(&fp("a")) else {
            panic!("expected follower");
        };
        let DedupSlot::Follower(mut rx2) = coordinator.join(&fp("a")) else {
            panic!("expected follower");
        };

        guard.complete(Ok(completion("shared")));

        let a = rx1.recv().await.unwrap().unwrap();
        let b = rx2.recv().await.unwrap().unwrap();
        assert_eq!(a.text, "shared");
        assert_eq!(b.text, "shared");
    }

    #[tokio::test]
    async fn followers_receive_leader_failure() {
        let coordinator = DedupCoordinator::new();
        let DedupSlot::Leader(guard) = coordinator.join(&fp("a")) else {
            panic!("expected leader");
        };
        let DedupSlot::Follower(mut rx) = coordinator.join(&fp("a")) else {
            panic!("expected follower");
        };

        guard.complete(Err(SharedFailure::Provider {
            message: "upstream refused".into(),
        }));

        let outcome = rx.recv().await.unwrap();
        assert!(matches!(outcome, Err(SharedFailure::Provider { .. })));
    }

    #[test]
    fn complete_releases_entry() {
        let coordinator = DedupCoordinator::new();
        let DedupSlot::Leader(guard) = coordinator.join(&fp("a")) else {
            panic!("expected leader");
        };
        guard.complete(Ok(completion("done")));
        assert_eq!(coordinator.inflight_len(), 0);
        // A new request with the same fingerprint can lead again
        assert!(matches!(coordinator.join(&fp("a")), DedupSlot::Leader(_)));
    }

    #[tokio::test]
    async fn dropped_guard_releases_entry_and_closes_channel() {
        let coordinator = DedupCoordinator::new();
        let DedupSlot::Leader(guard) = coordinator.join(&fp("a")) else {
            panic!("expected leader");
        };
        let DedupSlot::Follower(mut rx) = coordinator.join(&fp("a")) else {
            panic!("expected follower");
        };

        drop(guard);

        assert_eq!(coordinator.inflight_len(), 0);
        assert!(rx.recv().await.is_err());
    }

    #[test]
    fn clones_share_the_map() {
        let coordinator = DedupCoordinator::new();
        let clone = coordinator.clone();
        let _leader = coordinator.join(&fp("a"));
        assert!(matches!(clone.join(&fp("a")), DedupSlot::Follower(_)));
    }

    #[test]
    fn shared_failure_round_trips_deadline() {
        let err = HermodError::DeadlineExceeded {
            deadline: Duration::from_millis(100),
        };
        let restored = SharedFailure::classify(&err).into_error();
        assert!(matches!(
            restored,
            HermodError::DeadlineExceeded { deadline } if deadline == Duration::from_millis(100)
        ));
    }
}
