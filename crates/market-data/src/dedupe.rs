//! Concurrent call deduplication.
//!
//! Collapses calls that are issued while an identical call is still pending
//! into a single in-flight job. Every caller receives a clone of the same
//! outcome. Nothing is remembered once the call settles: the next identical
//! call after settlement always runs again.
//!
//! Jobs run on their own tokio task. A caller that stops waiting does not
//! cancel the job; it runs to completion and clears its pending entry.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use thiserror::Error;

/// The background task of a job panicked or was cancelled by runtime shutdown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("in-flight call {key} aborted: {message}")]
pub struct JobAborted {
    pub key: String,
    pub message: String,
}

type JobOutcome<T> = Result<T, JobAborted>;
type PendingJobs<K, T> = Mutex<HashMap<K, Shared<BoxFuture<'static, JobOutcome<T>>>>>;

/// Shares one in-flight call between concurrent callers with equal keys.
///
/// The key plays the role of "function identity plus argument list": two
/// calls are merged when their keys compare equal, so keys should encode the
/// operation as well as every argument.
pub struct CallDeduplicator<K, T> {
    pending: Arc<PendingJobs<K, T>>,
}

impl<K, T> Default for CallDeduplicator<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> CallDeduplicator<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lock the pending map, recovering from poison if necessary.
    fn lock(
        pending: &PendingJobs<K, T>,
    ) -> MutexGuard<'_, HashMap<K, Shared<BoxFuture<'static, JobOutcome<T>>>>> {
        pending.lock().unwrap_or_else(|poisoned| {
            warn!("Deduplicator pending-jobs mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Run `call` unless an equal job is already pending, in which case wait
    /// for that job's outcome instead.
    ///
    /// `call` is only invoked to build the future, which is spawned onto the
    /// current tokio runtime. Must be called from within a runtime.
    pub async fn dedupe<F, Fut>(&self, key: K, call: F) -> JobOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let job = {
            let mut pending = Self::lock(&self.pending);

            if let Some(existing) = pending.get(&key) {
                debug!("Joining in-flight call {:?}", key);
                existing.clone()
            } else {
                let registry = Arc::clone(&self.pending);
                let settled_key = key.clone();
                let future = call();

                // The entry is dropped before any caller sees the outcome.
                let handle = tokio::spawn(async move {
                    let outcome = future.await;
                    Self::lock(&registry).remove(&settled_key);
                    outcome
                });

                let registry = Arc::clone(&self.pending);
                let aborted_key = key.clone();
                let job = async move {
                    handle.await.map_err(|e| {
                        // A panicking task never reached its own cleanup.
                        Self::lock(&registry).remove(&aborted_key);
                        warn!("In-flight call {:?} aborted: {}", aborted_key, e);
                        JobAborted {
                            key: format!("{:?}", aborted_key),
                            message: e.to_string(),
                        }
                    })
                }
                .boxed()
                .shared();

                pending.insert(key, job.clone());
                job
            }
        };

        job.await
    }

    /// Number of calls currently in flight.
    pub fn in_flight(&self) -> usize {
        Self::lock(&self.pending).len()
    }
}
