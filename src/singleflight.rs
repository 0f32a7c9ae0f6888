//! Request De-duplication
//!
//! Collapses concurrent loads of the same key into one computation whose
//! result is shared by every caller that asked while it was in flight.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{CacheError, Result};

type Notifier<T> = oneshot::Sender<Result<T>>;

// == Flight Group ==
/// At most one computation per key is in flight at any time.
///
/// The computation runs on its own tokio task, so a caller that times out or
/// drops its future never cancels the work the other waiters depend on.
pub struct FlightGroup<T> {
    calls: Arc<Mutex<HashMap<String, Vec<Notifier<T>>>>>,
}

impl<T> Default for FlightGroup<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> FlightGroup<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    // == Work ==
    /// Runs `computation` for `key` unless a run is already in flight, in
    /// which case this waits for that run and returns its result.
    pub async fn work<F, Fut>(&self, key: &str, computation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.work_with_deadline(key, None, computation).await
    }

    /// Like `work`, but gives up waiting after `deadline`.
    ///
    /// Giving up only affects this caller: the computation keeps running and
    /// its result still reaches everyone else waiting on the key.
    pub async fn work_with_deadline<F, Fut>(
        &self,
        key: &str,
        deadline: Option<Duration>,
        computation: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let leader = {
            let mut calls = self.calls.lock();
            match calls.entry(key.to_string()) {
                Entry::Occupied(mut waiting) => {
                    waiting.get_mut().push(tx);
                    false
                }
                Entry::Vacant(slot) => {
                    slot.insert(vec![tx]);
                    true
                }
            }
        };

        if leader {
            self.spawn(key.to_string(), computation());
        } else {
            debug!(key, "joined in-flight load");
        }

        let received = match deadline {
            Some(limit) => tokio::time::timeout(limit, rx)
                .await
                .map_err(|_| CacheError::Timeout(format!("waiting for key {key}")))?,
            None => rx.await,
        };

        received.unwrap_or_else(|_| {
            Err(CacheError::Internal(format!(
                "in-flight load for key {key} was dropped"
            )))
        })
    }

    /// Number of keys with a computation in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    fn spawn<Fut>(&self, key: String, future: Fut)
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let calls = self.calls.clone();

        tokio::spawn(async move {
            // A nested task turns a panic into a JoinError instead of leaving
            // the record behind forever.
            let result = match tokio::spawn(future).await {
                Ok(result) => result,
                Err(err) => Err(CacheError::Internal(format!(
                    "load for key {key} failed: {err}"
                ))),
            };

            let waiters = calls.lock().remove(&key).unwrap_or_default();
            for waiter in waiters {
                let _ = waiter.send(result.clone());
            }
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_work_returns_value() {
        let group = FlightGroup::new();
        let value = group.work("key", || async { Ok("bar".to_string()) }).await;
        assert_eq!(value, Ok("bar".to_string()));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_work_returns_error() {
        let group: FlightGroup<String> = FlightGroup::new();
        let err = group
            .work("key", || async { Err(CacheError::Load("boom".into())) })
            .await;
        assert_eq!(err, Err(CacheError::Load("boom".into())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_share_one_computation() {
        let group = Arc::new(FlightGroup::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let group = group.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    group
                        .work("k", move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok(42u64)
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_shared_by_waiters() {
        let group: Arc<FlightGroup<u64>> = Arc::new(FlightGroup::new());

        let first = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .work("k", || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(CacheError::Load("db down".into()))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = group.work("k", || async { Ok(7) }).await;

        assert_eq!(first.await.unwrap(), Err(CacheError::Load("db down".into())));
        assert_eq!(second, Err(CacheError::Load("db down".into())));
    }

    #[tokio::test]
    async fn test_completed_key_runs_again() {
        let group = FlightGroup::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for expected in 1..=3 {
            let calls = calls.clone();
            let value = group
                .work("k", move || async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
                .await;
            assert_eq!(value, Ok(expected));
        }
    }

    #[tokio::test]
    async fn test_deadline_does_not_cancel_computation() {
        let group = Arc::new(FlightGroup::new());

        let patient = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .work("slow", || async {
                        tokio::time::sleep(Duration::from_millis(150)).await;
                        Ok("done")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let impatient = group
            .work_with_deadline("slow", Some(Duration::from_millis(20)), || async {
                Ok("never runs")
            })
            .await;

        assert!(matches!(impatient, Err(CacheError::Timeout(_))));
        assert_eq!(patient.await.unwrap(), Ok("done"));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_leader_dropping_future_still_delivers() {
        let group = Arc::new(FlightGroup::new());

        let leader = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .work("k", || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(5)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let follower = {
            let group = group.clone();
            tokio::spawn(async move { group.work("k", || async { Ok(0) }).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        leader.abort();

        assert_eq!(follower.await.unwrap(), Ok(5));
    }

    #[tokio::test]
    async fn test_panicking_computation_reports_error() {
        let group: FlightGroup<u64> = FlightGroup::new();

        let result = group
            .work("k", || async {
                if true {
                    panic!("loader exploded");
                }
                Ok(1)
            })
            .await;

        assert!(matches!(result, Err(CacheError::Internal(_))));
        assert_eq!(group.in_flight(), 0);
    }
}
