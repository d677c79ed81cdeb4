//! Keyed, deduplicated, revalidatable cache over envelope-returning
//! operations.
//!
//! One [`ResponseCache`] is constructed per application instance and passed
//! by reference to every consumer; there is no process-global state. Each
//! key owns a watch channel broadcasting [`CacheSnapshot`]s, so any number
//! of subscribers observe loading, optimistic, and resolved states in order.
//!
//! Concurrency rules:
//! - concurrent [`read`](ResponseCache::read)s of one key share exactly one
//!   in-flight operation;
//! - [`update_data`](ResponseCache::update_data) is not deduplicated, the
//!   last resolved write for a key wins;
//! - a `None` key deactivates fetching without aborting anything in flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::envelope::{ApiError, ApiResponse};

/// Error code written into the cache when a manual update operation itself
/// fails.
pub const UNHANDLED_ERROR_CODE: &str = "UNHANDLED_ERROR";

/// Full per-key state broadcast to subscribers.
#[derive(Debug, Clone)]
pub struct CacheSnapshot<T> {
    /// Last resolved envelope, `None` until the first resolution
    pub response: Option<ApiResponse<T>>,
    /// An initial fetch is in flight
    pub is_loading: bool,
    /// A revalidation of an existing value is in flight
    pub is_validating: bool,
    /// A manual update is in flight
    pub is_submitting: bool,
}

impl<T> Default for CacheSnapshot<T> {
    fn default() -> Self {
        Self {
            response: None,
            is_loading: false,
            is_validating: false,
            is_submitting: false,
        }
    }
}

impl<T> CacheSnapshot<T> {
    fn settled(&self) -> bool {
        !self.is_loading && !self.is_validating
    }
}

/// What a reader gets back: the envelope's parts plus fetch-state flags.
#[derive(Debug, Clone)]
pub struct ReadState<T> {
    /// Payload of the last resolved envelope, if it succeeded
    pub data: Option<T>,
    /// Error of the last resolved envelope; transport failures arrive here
    /// already normalized by the request client
    pub error: Option<ApiError>,
    /// A fetch for this key is in flight
    pub is_loading: bool,
    /// A revalidation for this key is in flight
    pub is_validating: bool,
}

impl<T: Clone> ReadState<T> {
    /// State for an inactive (null-key) read: nothing is fetched, nothing
    /// is pending.
    #[must_use]
    pub const fn inactive() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_validating: false,
        }
    }

    fn from_snapshot(snapshot: &CacheSnapshot<T>) -> Self {
        Self {
            data: snapshot
                .response
                .as_ref()
                .and_then(|response| response.data.clone()),
            error: snapshot
                .response
                .as_ref()
                .and_then(|response| response.error.clone()),
            is_loading: snapshot.is_loading,
            is_validating: snapshot.is_validating,
        }
    }
}

/// Optimistic values applied to the cache before a manual update operation
/// runs.
#[derive(Debug, Clone)]
pub struct MutateOptions<T> {
    /// Value written optimistically as a success envelope
    pub data: Option<T>,
    /// Error written optimistically as a failure envelope
    pub error: Option<ApiError>,
}

impl<T> Default for MutateOptions<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
        }
    }
}

struct CacheEntry<T> {
    tx: watch::Sender<CacheSnapshot<T>>,
}

/// In-memory response cache, deduplicating concurrent reads per key.
pub struct ResponseCache<T> {
    entries: Mutex<HashMap<String, Arc<CacheEntry<T>>>>,
}

impl<T: Clone> Default for ResponseCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ResponseCache<T> {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn entry(&self, key: &str) -> Arc<CacheEntry<T>> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(key.to_owned())
            .or_insert_with(|| {
                let (tx, _) = watch::channel(CacheSnapshot::default());
                Arc::new(CacheEntry { tx })
            })
            .clone()
    }

    /// Subscribe to every state change for a key.
    pub async fn subscribe(&self, key: &str) -> watch::Receiver<CacheSnapshot<T>> {
        self.entry(key).await.tx.subscribe()
    }

    /// Current state for a key without triggering a fetch.
    pub async fn snapshot(&self, key: &str) -> CacheSnapshot<T> {
        self.entry(key).await.tx.borrow().clone()
    }

    /// Read a key through the cache, resolving it with `operation` on a
    /// miss.
    ///
    /// A `None` key is the cancellation mechanism: the read is inactive and
    /// `operation` is never invoked. Concurrent reads of the same key share
    /// one in-flight operation; late readers wait for the broadcast result
    /// instead of fetching again.
    pub async fn read<F, Fut>(&self, key: Option<&str>, operation: F) -> ReadState<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResponse<T>>,
    {
        let Some(key) = key else {
            return ReadState::inactive();
        };
        let entry = self.entry(key).await;

        // Claim the in-flight slot. Exactly one concurrent reader wins and
        // runs the operation; the rest observe.
        let mut claimed = false;
        entry.tx.send_if_modified(|snapshot| {
            if snapshot.response.is_some() || !snapshot.settled() {
                return false;
            }
            snapshot.is_loading = true;
            claimed = true;
            true
        });

        if claimed {
            let response = operation().await;
            let state = ReadState::from_snapshot(&CacheSnapshot {
                response: Some(response.clone()),
                ..CacheSnapshot::default()
            });
            entry.tx.send_modify(|snapshot| {
                snapshot.response = Some(response);
                snapshot.is_loading = false;
                snapshot.is_validating = false;
            });
            return state;
        }

        let mut rx = entry.tx.subscribe();
        let state = match rx
            .wait_for(|snapshot| snapshot.settled() && snapshot.response.is_some())
            .await
        {
            Ok(snapshot) => ReadState::from_snapshot(&snapshot),
            // The sender cannot drop while we hold the entry, but never
            // panic on a reader path.
            Err(_) => ReadState::inactive(),
        };
        state
    }

    /// Drop the cached value for a key and force a new resolution.
    ///
    /// Not deduplicated: an explicit refresh always runs its operation.
    /// Concurrent readers see `is_validating` and wait for the result.
    pub async fn refresh<F, Fut>(&self, key: &str, operation: F) -> ReadState<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResponse<T>>,
    {
        let entry = self.entry(key).await;
        entry.tx.send_modify(|snapshot| {
            snapshot.response = None;
            snapshot.is_validating = true;
        });

        let response = operation().await;
        entry.tx.send_modify(|snapshot| {
            snapshot.response = Some(response.clone());
            snapshot.is_loading = false;
            snapshot.is_validating = false;
        });

        ReadState::from_snapshot(&CacheSnapshot {
            response: Some(response),
            ..CacheSnapshot::default()
        })
    }

    /// Forget a key entirely. Subscribers holding a receiver observe the
    /// cleared state; new readers start from scratch.
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.remove(key) {
            entry.tx.send_modify(|snapshot| {
                snapshot.response = None;
            });
        }
    }

    /// Phase one of a manual update: write a value into the cache before
    /// the authoritative operation completes.
    pub async fn apply_optimistic(&self, key: &str, response: ApiResponse<T>) {
        let entry = self.entry(key).await;
        entry.tx.send_modify(|snapshot| {
            snapshot.is_submitting = true;
            snapshot.response = Some(response);
        });
    }

    /// Phase two of a manual update: replace whatever is cached with the
    /// authoritative result and clear the submitting flag.
    pub async fn commit(&self, key: &str, response: ApiResponse<T>) {
        let entry = self.entry(key).await;
        entry.tx.send_modify(|snapshot| {
            snapshot.response = Some(response);
            snapshot.is_submitting = false;
            snapshot.is_loading = false;
            snapshot.is_validating = false;
        });
    }

    /// Run a manual update against a key.
    ///
    /// When `options` carries data or an error, the cache is updated
    /// optimistically before `operation` runs; the operation's result then
    /// replaces the optimistic value, success or failure. A failure of the
    /// operation itself is forced into a well-formed envelope under
    /// [`UNHANDLED_ERROR_CODE`] instead of propagating.
    pub async fn update_data<F, Fut>(
        &self,
        key: &str,
        operation: F,
        options: MutateOptions<T>,
    ) -> ApiResponse<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<ApiResponse<T>>>,
    {
        let optimistic = match (options.data, options.error) {
            (_, Some(error)) => Some(ApiResponse::err(error, 400)),
            (Some(data), None) => Some(ApiResponse::ok(data, 200)),
            (None, None) => None,
        };
        match optimistic {
            Some(response) => self.apply_optimistic(key, response).await,
            None => {
                let entry = self.entry(key).await;
                entry.tx.send_modify(|snapshot| snapshot.is_submitting = true);
            }
        }

        let result = match operation().await {
            Ok(response) => response,
            Err(err) => ApiResponse::err(
                ApiError::new(UNHANDLED_ERROR_CODE, err.to_string()),
                500,
            ),
        };

        // Commit runs on both branches so is_submitting always clears.
        self.commit(key, result.clone()).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    fn ok(value: &str) -> ApiResponse<String> {
        ApiResponse::ok(value.to_string(), 200)
    }

    #[tokio::test]
    async fn null_key_is_inactive_and_never_fetches() {
        let cache: ResponseCache<String> = ResponseCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let op_calls = Arc::clone(&calls);
        let state = cache
            .read(None, move || async move {
                op_calls.fetch_add(1, Ordering::SeqCst);
                ok("never")
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(state.data.is_none() && state.error.is_none());
        assert!(!state.is_loading && !state.is_validating);
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_operation() {
        let cache: ResponseCache<String> = ResponseCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(20)).await;
            ok("shared")
        };

        let (a, b) = tokio::join!(
            cache.read(Some("word"), || slow_fetch(calls.clone())),
            cache.read(Some("word"), || slow_fetch(calls.clone())),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.data.as_deref(), Some("shared"));
        assert_eq!(b.data.as_deref(), Some("shared"));
    }

    #[tokio::test]
    async fn resolved_value_is_served_from_cache() {
        let cache: ResponseCache<String> = ResponseCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let op_calls = Arc::clone(&calls);
            let state = cache
                .read(Some("word"), move || async move {
                    op_calls.fetch_add(1, Ordering::SeqCst);
                    ok("cached")
                })
                .await;
            assert_eq!(state.data.as_deref(), Some("cached"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_envelopes_are_cached_not_raised() {
        let cache: ResponseCache<String> = ResponseCache::new();

        let state = cache
            .read(Some("word"), || async {
                ApiResponse::err(ApiError::new("GENERATION_ERROR", "timed out"), 500)
            })
            .await;

        assert!(state.data.is_none());
        let error = state.error.expect("error must surface through the state");
        assert_eq!(error.code, "GENERATION_ERROR");
    }

    #[tokio::test]
    async fn refresh_forces_a_new_resolution() {
        let cache: ResponseCache<String> = ResponseCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let op_calls = Arc::clone(&calls);
        let first = cache
            .read(Some("word"), move || async move {
                op_calls.fetch_add(1, Ordering::SeqCst);
                ok("stale")
            })
            .await;
        assert_eq!(first.data.as_deref(), Some("stale"));

        let op_calls = Arc::clone(&calls);
        let refreshed = cache
            .refresh("word", move || async move {
                op_calls.fetch_add(1, Ordering::SeqCst);
                ok("fresh")
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.data.as_deref(), Some("fresh"));

        // The refreshed value is what later readers see.
        let after = cache.read(Some("word"), || async { ok("unused") }).await;
        assert_eq!(after.data.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn invalidate_clears_state_for_new_readers() {
        let cache: ResponseCache<String> = ResponseCache::new();

        cache.read(Some("word"), || async { ok("old") }).await;
        cache.invalidate("word").await;

        let state = cache.read(Some("word"), || async { ok("new") }).await;
        assert_eq!(state.data.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn optimistic_value_is_visible_then_replaced_by_authoritative() {
        let cache: Arc<ResponseCache<String>> = Arc::new(ResponseCache::new());
        let mut rx = cache.subscribe("word").await;
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let update = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move {
                cache
                    .update_data(
                        "word",
                        move || async move {
                            release_rx.await.ok();
                            Ok(ok("authoritative"))
                        },
                        MutateOptions {
                            data: Some("optimistic".to_string()),
                            error: None,
                        },
                    )
                    .await
            }
        });

        // Subscriber sees the optimistic value while the update is in
        // flight.
        let seen = rx
            .wait_for(|snapshot| {
                snapshot.is_submitting
                    && snapshot
                        .response
                        .as_ref()
                        .and_then(|r| r.data.as_deref())
                        == Some("optimistic")
            })
            .await
            .expect("optimistic state must be observable");
        assert!(seen.is_submitting);
        drop(seen);

        release_tx.send(()).ok();
        let result = update.await.expect("update task must not panic");
        assert_eq!(result.data.as_deref(), Some("authoritative"));

        let settled = rx
            .wait_for(|snapshot| {
                !snapshot.is_submitting
                    && snapshot
                        .response
                        .as_ref()
                        .and_then(|r| r.data.as_deref())
                        == Some("authoritative")
            })
            .await
            .expect("authoritative state must be observable");
        assert!(!settled.is_submitting);
    }

    #[tokio::test]
    async fn optimistic_error_uses_a_400_envelope() {
        let cache: ResponseCache<String> = ResponseCache::new();

        cache
            .apply_optimistic(
                "word",
                ApiResponse::err(ApiError::new("VALIDATION", "bad input"), 400),
            )
            .await;

        let snapshot = cache.snapshot("word").await;
        assert!(snapshot.is_submitting);
        let response = snapshot.response.expect("optimistic error is cached");
        assert_eq!(response.status, 400);
        assert!(!response.success);
    }

    #[tokio::test]
    async fn failing_update_operation_becomes_unhandled_error_envelope() {
        let cache: ResponseCache<String> = ResponseCache::new();

        let result = cache
            .update_data(
                "word",
                || async { Err(anyhow::anyhow!("database exploded")) },
                MutateOptions::default(),
            )
            .await;

        assert!(!result.success);
        assert_eq!(result.status, 500);
        let error = result.error.expect("failure must carry an error");
        assert_eq!(error.code, UNHANDLED_ERROR_CODE);
        assert_eq!(error.message, "database exploded");

        // The submitting flag is cleared even on the failure path.
        let snapshot = cache.snapshot("word").await;
        assert!(!snapshot.is_submitting);
    }

    #[tokio::test]
    async fn last_resolved_update_wins() {
        let cache: ResponseCache<String> = ResponseCache::new();

        cache
            .update_data("word", || async { Ok(ok("first")) }, MutateOptions::default())
            .await;
        cache
            .update_data("word", || async { Ok(ok("second")) }, MutateOptions::default())
            .await;

        let snapshot = cache.snapshot("word").await;
        assert_eq!(
            snapshot.response.and_then(|r| r.data),
            Some("second".to_string())
        );
    }
}
