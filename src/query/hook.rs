//! Observer of one cached read, polled from the UI tick.
//!
//! A `Query<T>` binds a [`QueryKey`] to a fetcher and a [`QueryPolicy`]. It
//! serves whatever the shared cache already holds, fetches when that data is
//! missing or stale, and follows cache events so a mutation elsewhere
//! refreshes it.
//!
//! # Example
//!
//! ```ignore
//! let api = api.clone();
//! let mut query = Query::new(client, QueryKey::new("students"), QueryPolicy::DEFAULT, move || {
//!     let api = api.clone();
//!     async move { api.list_students().await }
//! });
//!
//! // On mount
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! if query.is_loading() {
//!     render_spinner()
//! } else if let Some(students) = query.data() {
//!     render_table(students)
//! }
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use super::cache::{CacheEvent, CacheEventKind, FetchStatus};
use super::client::QueryClient;
use super::key::QueryKey;
use super::policy::QueryPolicy;
use crate::api::ApiError;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Where the data on screen came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
  /// Nothing to show yet
  Empty,
  /// Served from cache; may be stale or being refetched
  Cached,
  /// Written by a request that completed after this query mounted
  Fresh,
}

pub struct Query<T> {
  key: QueryKey,
  client: QueryClient,
  fetcher: FetcherFn<T>,
  policy: QueryPolicy,
  status: FetchStatus,
  data: Option<Arc<T>>,
  error: Option<ApiError>,
  fresh: bool,
  /// Cache version of `data`, to skip re-adopting our own writes
  version: u64,
  receiver: Option<mpsc::UnboundedReceiver<Result<Arc<T>, ApiError>>>,
  /// Invalidated while a result was still waiting to be picked up
  pending_refetch: bool,
  events: broadcast::Receiver<CacheEvent>,
  fetched_at: Option<Instant>,
}

impl<T: Any + Send + Sync> Query<T> {
  /// Create a query for `key`. Nothing is fetched until [`Query::fetch`].
  pub fn new<F, Fut>(client: QueryClient, key: QueryKey, policy: QueryPolicy, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    client.observe(&key);
    let events = client.cache().subscribe();

    Self {
      key,
      client,
      fetcher: Arc::new(move || fetcher().boxed()),
      policy,
      status: FetchStatus::Idle,
      data: None,
      error: None,
      fresh: false,
      version: 0,
      receiver: None,
      pending_refetch: false,
      events,
      fetched_at: None,
    }
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn status(&self) -> FetchStatus {
    self.status
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  /// First load only: fetching with nothing to show.
  pub fn is_loading(&self) -> bool {
    self.is_fetching() && self.data.is_none()
  }

  /// Any request in flight, including background refetches.
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  pub fn is_success(&self) -> bool {
    self.status == FetchStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == FetchStatus::Error
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  pub fn freshness(&self) -> Freshness {
    match (&self.data, self.fresh && !self.is_fetching()) {
      (None, _) => Freshness::Empty,
      (Some(_), true) => Freshness::Fresh,
      (Some(_), false) => Freshness::Cached,
    }
  }

  /// Mount: show cached data at once and fetch if it is missing or stale.
  pub fn fetch(&mut self) {
    if !self.policy.enabled || self.is_fetching() {
      return;
    }

    if let Some(entry) = self.client.cache().get(&self.key) {
      if let Some(data) = entry.downcast::<T>() {
        self.data = Some(data);
        self.version = entry.version;
        self.status = FetchStatus::Success;
        self.fetched_at = entry.updated_at;
      }
      if self.data.is_some() && !entry.is_stale(self.policy.stale_time) {
        return;
      }
    }

    self.start(false);
  }

  /// Force a new request, even if one is in flight or the data is fresh.
  pub fn refetch(&mut self) {
    if !self.policy.enabled {
      return;
    }
    self.start(true);
  }

  /// Apply finished fetches, cache events and interval refetches.
  ///
  /// Returns `true` if the state changed. Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let mut changed = self.poll_result();
    changed |= self.poll_events();

    if self.pending_refetch && !self.is_fetching() {
      debug!(key = %self.key, "invalidated while fetching, refetching");
      self.start(false);
      changed = true;
    }

    if let (Some(interval), Some(at)) = (self.policy.refetch_interval, self.fetched_at) {
      if self.policy.enabled && !self.is_fetching() && at.elapsed() >= interval {
        debug!(key = %self.key, "interval refetch");
        self.start(false);
        changed = true;
      }
    }

    changed
  }

  fn poll_result(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.adopt(data);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        // Previous data stays on screen
        self.status = FetchStatus::Error;
        self.error = Some(error);
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.status = FetchStatus::Error;
        self.error = Some(ApiError::Transport("request was cancelled".to_string()));
        self.receiver = None;
        true
      }
    }
  }

  fn poll_events(&mut self) -> bool {
    let mut changed = false;
    let mut refetch = false;

    loop {
      match self.events.try_recv() {
        Ok(event) if event.key == self.key => match event.kind {
          CacheEventKind::Updated => changed |= self.adopt_from_cache(),
          CacheEventKind::Invalidated => {
            self.fresh = false;
            refetch = true;
            changed = true;
          }
          CacheEventKind::Loading | CacheEventKind::Failed | CacheEventKind::Removed => {}
        },
        Ok(_) => {}
        Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
          debug!(key = %self.key, skipped, "cache events lagged, resyncing");
          changed |= self.adopt_from_cache();
          refetch |= self
            .client
            .cache()
            .get(&self.key)
            .map(|e| e.invalidated)
            .unwrap_or(false);
        }
        Err(_) => break,
      }
    }

    if refetch && self.policy.enabled {
      if self.is_fetching() {
        // The request may already have landed with data from before the
        // invalidation; refetch once its result is taken
        self.pending_refetch = true;
      } else {
        debug!(key = %self.key, "invalidated, refetching");
        self.start(false);
      }
    }

    changed
  }

  /// Take newer data another observer wrote for this key.
  fn adopt_from_cache(&mut self) -> bool {
    let entry = match self.client.cache().get(&self.key) {
      Some(entry) if entry.version > self.version => entry,
      _ => return false,
    };
    match entry.downcast::<T>() {
      Some(data) => {
        self.version = entry.version;
        self.adopt(data);
        true
      }
      None => false,
    }
  }

  fn adopt(&mut self, data: Arc<T>) {
    if let Some(entry) = self.client.cache().get(&self.key) {
      self.version = self.version.max(entry.version);
    }
    self.data = Some(data);
    self.status = FetchStatus::Success;
    self.error = None;
    self.fresh = true;
    self.fetched_at = Some(Instant::now());
  }

  fn start(&mut self, force: bool) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.pending_refetch = false;
    self.status = FetchStatus::Loading;

    let client = self.client.clone();
    let key = self.key.clone();
    let fetcher = self.fetcher.clone();
    tokio::spawn(async move {
      let result = if force {
        client.refetch(&key, move || fetcher()).await
      } else {
        client.fetch(&key, move || fetcher()).await
      };
      // Ignore send errors - the query may have been dropped
      let _ = tx.send(result);
    });
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    self.client.unobserve(&self.key);
  }
}

impl<T> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("status", &self.status)
      .field("has_data", &self.data.is_some())
      .field("fetched_at", &self.fetched_at)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::cache::MemoryCache;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  fn client() -> QueryClient {
    QueryClient::new(Arc::new(MemoryCache::new()), Duration::from_secs(300))
  }

  fn counting(
    client: &QueryClient,
    policy: QueryPolicy,
    calls: Arc<AtomicU32>,
  ) -> Query<u32> {
    Query::new(client.clone(), QueryKey::new("numbers"), policy, move || {
      let calls = calls.clone();
      async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }
    })
  }

  async fn settle<T: Any + Send + Sync>(query: &mut Query<T>) {
    for _ in 0..100 {
      query.poll();
      if !query.is_fetching() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
  }

  #[tokio::test]
  async fn test_query_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting(&client(), QueryPolicy::DEFAULT, calls);

    assert_eq!(query.status(), FetchStatus::Idle);
    assert_eq!(query.freshness(), Freshness::Empty);

    query.fetch();
    assert!(query.is_loading());

    settle(&mut query).await;
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&1));
    assert_eq!(query.freshness(), Freshness::Fresh);
  }

  #[tokio::test]
  async fn test_query_error_keeps_data() {
    let client = client();
    let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = fail.clone();
    let mut query = Query::new(
      client,
      QueryKey::new("numbers"),
      QueryPolicy::DEFAULT,
      move || {
        let fail = flag.load(Ordering::SeqCst);
        async move {
          if fail {
            Err(ApiError::Transport("offline".to_string()))
          } else {
            Ok(7u32)
          }
        }
      },
    );

    query.fetch();
    settle(&mut query).await;
    assert_eq!(query.data(), Some(&7));

    fail.store(true, Ordering::SeqCst);
    query.refetch();
    assert!(!query.is_loading());
    assert!(query.is_fetching());
    settle(&mut query).await;

    assert!(query.is_error());
    assert_eq!(query.data(), Some(&7));
    assert!(matches!(query.error(), Some(ApiError::Transport(_))));
  }

  #[tokio::test]
  async fn test_mount_serves_fresh_cache_without_request() {
    let client = client();
    let calls = Arc::new(AtomicU32::new(0));

    let mut first = counting(&client, QueryPolicy::PAYMENTS, calls.clone());
    first.fetch();
    settle(&mut first).await;

    let mut second = counting(&client, QueryPolicy::PAYMENTS, calls.clone());
    second.fetch();
    assert!(!second.is_fetching());
    assert_eq!(second.data(), Some(&1));
    assert_eq!(second.freshness(), Freshness::Cached);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_mount_with_stale_cache_shows_data_and_refetches() {
    let client = client();
    let calls = Arc::new(AtomicU32::new(0));

    let mut first = counting(&client, QueryPolicy::DEFAULT, calls.clone());
    first.fetch();
    settle(&mut first).await;

    let mut second = counting(&client, QueryPolicy::DEFAULT, calls.clone());
    second.fetch();
    assert_eq!(second.data(), Some(&1));
    assert!(second.is_fetching());
    assert!(!second.is_loading());
    assert_eq!(second.freshness(), Freshness::Cached);

    settle(&mut second).await;
    assert_eq!(second.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_invalidation_triggers_refetch() {
    let client = client();
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting(&client, QueryPolicy::PAYMENTS, calls.clone());
    query.fetch();
    settle(&mut query).await;

    client.invalidate(&QueryKey::new("numbers"));
    assert!(query.poll());
    assert!(query.is_fetching());
    settle(&mut query).await;

    assert_eq!(query.data(), Some(&2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidation_before_result_is_taken_still_refetches() {
    let client = client();
    let key = QueryKey::new("numbers");
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting(&client, QueryPolicy::PAYMENTS, calls.clone());
    query.fetch();

    // The request lands in the cache before the query picks up its result
    for _ in 0..100 {
      if client.get_data::<u32>(&key).is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    client.invalidate(&key);
    query.poll_events();
    assert!(query.is_fetching());

    settle(&mut query).await;
    assert_eq!(query.data(), Some(&2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_observers_share_updates() {
    let client = client();
    let calls = Arc::new(AtomicU32::new(0));
    let mut a = counting(&client, QueryPolicy::DEFAULT, calls.clone());
    let mut b = counting(&client, QueryPolicy::DEFAULT, calls.clone());

    a.fetch();
    settle(&mut a).await;
    b.poll();
    assert_eq!(b.data(), Some(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_disabled_never_fetches() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting(&client(), QueryPolicy::DEFAULT.enabled(false), calls.clone());
    query.fetch();
    query.refetch();
    assert!(!query.is_fetching());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_interval_refetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = QueryPolicy {
      stale_time: Duration::ZERO,
      refetch_interval: Some(Duration::from_millis(20)),
      enabled: true,
    };
    let mut query = counting(&client(), policy, calls.clone());
    query.fetch();
    settle(&mut query).await;

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(query.poll());
    settle(&mut query).await;
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_drop_unobserves() {
    let client = client();
    let key = QueryKey::new("numbers");
    let query = counting(&client, QueryPolicy::DEFAULT, Arc::new(AtomicU32::new(0)));
    assert_eq!(client.observer_count(&key), 1);
    drop(query);
    assert_eq!(client.observer_count(&key), 0);
  }
}
