//! Request coordination on top of a [`QueryCache`].
//!
//! Every request for a key gets a generation number. Only the response to
//! the latest generation is written to the cache; anything older that lands
//! afterwards is dropped. Identical reads issued while one is in flight
//! share that request instead of starting another.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use super::cache::{CacheEntry, CacheWrite, CachedValue, FetchStatus, QueryCache};
use super::key::QueryKey;
use crate::api::ApiError;

type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, ApiError>>>;

struct InFlight {
  generation: u64,
  future: SharedFetch,
  /// Invalidated while running: mark stale as soon as it is written
  stale_on_arrival: bool,
}

/// Where a caller's generation stands once its request has finished.
enum Latest {
  Current,
  /// A newer request is still running
  Pending(u64, SharedFetch),
  /// A newer request finished, or the key was dropped
  Settled,
}

struct Observers {
  count: usize,
  last_seen: Instant,
}

#[derive(Default)]
struct State {
  /// Shared by every key and never reset, so a request started before a
  /// clear or a collection can't match one started after it
  next_generation: u64,
  generations: HashMap<QueryKey, u64>,
  in_flight: HashMap<QueryKey, InFlight>,
  observers: HashMap<QueryKey, Observers>,
}

struct Inner {
  cache: Arc<dyn QueryCache>,
  state: Mutex<State>,
  gc_time: Duration,
}

/// Handle to the shared query cache. Cheap to clone.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<Inner>,
}

impl QueryClient {
  pub fn new(cache: Arc<dyn QueryCache>, gc_time: Duration) -> Self {
    Self {
      inner: Arc::new(Inner {
        cache,
        state: Mutex::new(State::default()),
        gc_time,
      }),
    }
  }

  pub fn cache(&self) -> &Arc<dyn QueryCache> {
    &self.inner.cache
  }

  fn state(&self) -> MutexGuard<'_, State> {
    self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Cached data for `key`, if any, regardless of staleness.
  pub fn get_data<T: Any + Send + Sync>(&self, key: &QueryKey) -> Option<Arc<T>> {
    self.inner.cache.get(key)?.downcast::<T>()
  }

  /// Join the in-flight request for `key`, or start one with `fetcher`.
  pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, ApiError>
  where
    T: Any + Send + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let (generation, future) = self.join_or_start(key, false, fetcher);
    self.await_latest(key, generation, future).await
  }

  /// Serve cached data when it is younger than `stale_time`, else fetch.
  pub async fn ensure<T, F, Fut>(
    &self,
    key: &QueryKey,
    stale_time: Duration,
    fetcher: F,
  ) -> Result<Arc<T>, ApiError>
  where
    T: Any + Send + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    if let Some(entry) = self.inner.cache.get(key) {
      if !entry.is_stale(stale_time) {
        if let Some(data) = entry.downcast::<T>() {
          return Ok(data);
        }
      }
    }
    self.fetch(key, fetcher).await
  }

  /// Start a new request generation even if one is already in flight.
  ///
  /// The older request still completes but its response is discarded.
  pub async fn refetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, ApiError>
  where
    T: Any + Send + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let (generation, future) = self.join_or_start(key, true, fetcher);
    self.await_latest(key, generation, future).await
  }

  fn join_or_start<T, F, Fut>(&self, key: &QueryKey, force: bool, fetcher: F) -> (u64, SharedFetch)
  where
    T: Any + Send + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let mut state = self.state();

    if !force {
      if let Some(in_flight) = state.in_flight.get(key) {
        debug!(key = %key, generation = in_flight.generation, "joining in-flight request");
        return (in_flight.generation, in_flight.future.clone());
      }
    }

    state.next_generation += 1;
    let generation = state.next_generation;
    state.generations.insert(key.clone(), generation);
    state
      .observers
      .entry(key.clone())
      .or_insert_with(|| Observers {
        count: 0,
        last_seen: Instant::now(),
      });

    let request = fetcher();
    let client = self.clone();
    let request_key = key.clone();
    let future = async move {
      let result = request.await.map(|data| Arc::new(data) as CachedValue);
      client.complete(&request_key, generation, &result);
      result
    }
    .boxed()
    .shared();

    state.in_flight.insert(
      key.clone(),
      InFlight {
        generation,
        future: future.clone(),
        stale_on_arrival: false,
      },
    );
    drop(state);

    debug!(key = %key, hash = %key.cache_hash(), generation, "request started");
    self.inner.cache.set(key, CacheWrite::Loading);
    (generation, future)
  }

  /// Wait for `future`; if a newer generation was started meanwhile, wait
  /// for that one instead so callers never see superseded data. When the
  /// newer one already landed, its outcome is read back from the cache.
  async fn await_latest<T: Any + Send + Sync>(
    &self,
    key: &QueryKey,
    mut generation: u64,
    mut future: SharedFetch,
  ) -> Result<Arc<T>, ApiError> {
    loop {
      let result = future.await;
      let value = match self.latest(key, generation) {
        Latest::Pending(newer, next) => {
          generation = newer;
          future = next;
          continue;
        }
        Latest::Settled => match self.inner.cache.get(key) {
          Some(CacheEntry {
            status: FetchStatus::Error,
            error: Some(error),
            ..
          }) => return Err(error),
          Some(CacheEntry { data: Some(data), .. }) => data,
          _ => result?,
        },
        Latest::Current => result?,
      };
      return value.downcast::<T>().map_err(|_| {
        ApiError::Decode(format!("cached value for {} has an unexpected type", key))
      });
    }
  }

  fn latest(&self, key: &QueryKey, generation: u64) -> Latest {
    let state = self.state();
    match state.generations.get(key) {
      Some(&latest) if latest == generation => Latest::Current,
      Some(&latest) => match state.in_flight.get(key) {
        Some(in_flight) if in_flight.generation == latest => {
          Latest::Pending(latest, in_flight.future.clone())
        }
        _ => Latest::Settled,
      },
      // Cleared or collected while running
      None => Latest::Settled,
    }
  }

  /// Record a finished request. Runs exactly once per generation.
  fn complete(&self, key: &QueryKey, generation: u64, result: &Result<CachedValue, ApiError>) {
    let stale_on_arrival = {
      let mut state = self.state();
      let latest = state.generations.get(key).copied();
      if latest != Some(generation) {
        debug!(key = %key, generation, ?latest, "discarding superseded response");
        return;
      }
      state
        .in_flight
        .remove(key)
        .map(|f| f.stale_on_arrival)
        .unwrap_or(false)
    };

    match result {
      Ok(data) => {
        self.inner.cache.set(key, CacheWrite::Data(data.clone()));
        if stale_on_arrival {
          debug!(key = %key, "response arrived after invalidation");
          self.inner.cache.set(key, CacheWrite::Stale);
        }
      }
      Err(e) => {
        warn!(key = %key, error = %e, "fetch failed");
        self.inner.cache.set(key, CacheWrite::Error(e.clone()));
      }
    }
  }

  /// Mark every key selected by `prefix` stale.
  ///
  /// Observers refetch on the resulting events. Requests already in flight
  /// are written when they land and then immediately marked stale.
  pub fn invalidate(&self, prefix: &QueryKey) -> Vec<QueryKey> {
    {
      let mut state = self.state();
      for (key, in_flight) in state.in_flight.iter_mut() {
        if prefix.matches(key) {
          in_flight.stale_on_arrival = true;
        }
      }
    }

    let keys = self.inner.cache.invalidate(prefix);
    debug!(prefix = %prefix, count = keys.len(), "invalidated");
    keys
  }

  pub fn observe(&self, key: &QueryKey) {
    let mut state = self.state();
    let observers = state.observers.entry(key.clone()).or_insert_with(|| Observers {
      count: 0,
      last_seen: Instant::now(),
    });
    observers.count += 1;
  }

  pub fn unobserve(&self, key: &QueryKey) {
    let mut state = self.state();
    if let Some(observers) = state.observers.get_mut(key) {
      observers.count = observers.count.saturating_sub(1);
      observers.last_seen = Instant::now();
    }
  }

  pub fn observer_count(&self, key: &QueryKey) -> usize {
    self
      .state()
      .observers
      .get(key)
      .map(|o| o.count)
      .unwrap_or(0)
  }

  /// Drop entries nobody has observed for `gc_time`. Returns how many.
  ///
  /// The key's generation is forgotten too, so a response still in flight
  /// for a collected key is discarded when it lands.
  pub fn collect_garbage(&self) -> usize {
    let expired: Vec<QueryKey> = {
      let mut state = self.state();
      let gc_time = self.inner.gc_time;
      let expired: Vec<QueryKey> = self
        .inner
        .cache
        .keys()
        .into_iter()
        .filter(|key| match state.observers.get(key) {
          Some(o) => o.count == 0 && o.last_seen.elapsed() >= gc_time,
          None => true,
        })
        .collect();

      for key in &expired {
        state.observers.remove(key);
        state.generations.remove(key);
        state.in_flight.remove(key);
      }
      expired
    };

    for key in &expired {
      self.inner.cache.remove(key);
    }
    if !expired.is_empty() {
      debug!(count = expired.len(), "collected unobserved cache entries");
    }
    expired.len()
  }

  /// Forget everything (logout).
  pub fn clear(&self) {
    {
      let mut state = self.state();
      state.generations.clear();
      state.in_flight.clear();
    }
    self.inner.cache.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::cache::MemoryCache;
  use std::sync::atomic::{AtomicU32, Ordering};
  use tokio::sync::oneshot;

  fn client(gc_time: Duration) -> QueryClient {
    QueryClient::new(Arc::new(MemoryCache::new()), gc_time)
  }

  #[tokio::test]
  async fn test_fetch_populates_cache() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("students");

    let data = client
      .fetch(&key, || async { Ok::<_, ApiError>(vec!["Ana".to_string()]) })
      .await
      .unwrap();

    assert_eq!(*data, vec!["Ana".to_string()]);
    let entry = client.cache().get(&key).unwrap();
    assert_eq!(entry.status, FetchStatus::Success);
    assert_eq!(
      *client.get_data::<Vec<String>>(&key).unwrap(),
      vec!["Ana".to_string()]
    );
  }

  #[tokio::test]
  async fn test_concurrent_reads_share_one_request() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("students");
    let calls = Arc::new(AtomicU32::new(0));

    let fetcher = |calls: Arc<AtomicU32>| {
      move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, ApiError>(42u32)
      }
    };

    let (a, b) = tokio::join!(
      client.fetch(&key, fetcher(calls.clone())),
      client.fetch(&key, fetcher(calls.clone()))
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
  }

  #[tokio::test]
  async fn test_ensure_serves_fresh_cache() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("payments");
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..3 {
      let calls = calls.clone();
      client
        .ensure(&key, Duration::from_secs(300), move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok::<_, ApiError>(1u8)
        })
        .await
        .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Zero stale time always refetches
    let calls_zero = calls.clone();
    client
      .ensure(&key, Duration::ZERO, move || async move {
        calls_zero.fetch_add(1, Ordering::SeqCst);
        Ok::<_, ApiError>(1u8)
      })
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_out_of_order_response_is_discarded() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("appointments");
    let (slow_tx, slow_rx) = oneshot::channel::<()>();

    let first = {
      let client = client.clone();
      let key = key.clone();
      tokio::spawn(async move {
        client
          .fetch(&key, move || async move {
            let _ = slow_rx.await;
            Ok::<_, ApiError>("old")
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = client
      .refetch(&key, || async { Ok::<_, ApiError>("new") })
      .await
      .unwrap();
    assert_eq!(*second, "new");

    // The first request lands last
    slow_tx.send(()).unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(*first, "new");
    assert_eq!(*client.get_data::<&str>(&key).unwrap(), "new");
  }

  #[tokio::test]
  async fn test_request_from_before_clear_never_overwrites() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("students");
    let (slow_tx, slow_rx) = oneshot::channel::<()>();

    let old = {
      let client = client.clone();
      let key = key.clone();
      tokio::spawn(async move {
        client
          .fetch(&key, move || async move {
            let _ = slow_rx.await;
            Ok::<_, ApiError>("old-session")
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    client.clear();
    let new = client
      .fetch(&key, || async { Ok::<_, ApiError>("new-session") })
      .await
      .unwrap();
    assert_eq!(*new, "new-session");

    slow_tx.send(()).unwrap();
    let old = old.await.unwrap().unwrap();

    assert_eq!(*old, "new-session");
    assert_eq!(*client.get_data::<&str>(&key).unwrap(), "new-session");
  }

  #[tokio::test]
  async fn test_request_from_before_collection_never_overwrites() {
    let client = client(Duration::ZERO);
    let key = QueryKey::new("payments");
    let (slow_tx, slow_rx) = oneshot::channel::<()>();

    let old = {
      let client = client.clone();
      let key = key.clone();
      tokio::spawn(async move {
        client
          .fetch(&key, move || async move {
            let _ = slow_rx.await;
            Ok::<_, ApiError>("old")
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(client.collect_garbage(), 1);
    client
      .fetch(&key, || async { Ok::<_, ApiError>("new") })
      .await
      .unwrap();

    slow_tx.send(()).unwrap();
    let _ = old.await.unwrap();

    assert_eq!(*client.get_data::<&str>(&key).unwrap(), "new");
  }

  #[tokio::test]
  async fn test_superseded_caller_gets_newer_failure() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("instructors");
    let (slow_tx, slow_rx) = oneshot::channel::<()>();

    let first = {
      let client = client.clone();
      let key = key.clone();
      tokio::spawn(async move {
        client
          .fetch(&key, move || async move {
            let _ = slow_rx.await;
            Ok::<_, ApiError>(1u8)
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = client
      .refetch::<u8, _, _>(&key, || async {
        Err(ApiError::Http {
          status: 503,
          message: None,
        })
      })
      .await
      .unwrap_err();
    assert_eq!(err.status(), Some(503));

    slow_tx.send(()).unwrap();
    let first = first.await.unwrap();
    assert_eq!(first.unwrap_err().status(), Some(503));
    assert!(client.get_data::<u8>(&key).is_none());
  }

  #[tokio::test]
  async fn test_failed_fetch_keeps_previous_data() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("students");

    client
      .fetch(&key, || async { Ok::<_, ApiError>(5u32) })
      .await
      .unwrap();
    let err = client
      .fetch::<u32, _, _>(&key, || async {
        Err(ApiError::Http {
          status: 500,
          message: None,
        })
      })
      .await
      .unwrap_err();

    assert_eq!(err.status(), Some(500));
    let entry = client.cache().get(&key).unwrap();
    assert_eq!(entry.status, FetchStatus::Error);
    assert_eq!(*entry.downcast::<u32>().unwrap(), 5);
  }

  #[tokio::test]
  async fn test_invalidate_during_flight_marks_stale_on_arrival() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("payments").with("status", "PAID");
    let (tx, rx) = oneshot::channel::<()>();

    let pending = {
      let client = client.clone();
      let key = key.clone();
      tokio::spawn(async move {
        client
          .fetch(&key, move || async move {
            let _ = rx.await;
            Ok::<_, ApiError>(1u8)
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    client.invalidate(&QueryKey::new("payments"));
    tx.send(()).unwrap();
    pending.await.unwrap().unwrap();

    let entry = client.cache().get(&key).unwrap();
    assert!(entry.data.is_some());
    assert!(entry.invalidated);
  }

  #[tokio::test]
  async fn test_ensure_refetches_on_type_mismatch() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("students");
    client
      .fetch(&key, || async { Ok::<_, ApiError>(1u8) })
      .await
      .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let counted = calls.clone();
    let result = client
      .ensure::<String, _, _>(&key, Duration::from_secs(300), move || async move {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(String::new())
      })
      .await;
    // Fresh entry of another type is refetched rather than served
    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_garbage_collection() {
    let client = client(Duration::ZERO);
    let observed = QueryKey::new("students");
    let orphan = QueryKey::new("payments");

    client.observe(&observed);
    client
      .fetch(&observed, || async { Ok::<_, ApiError>(1u8) })
      .await
      .unwrap();
    client
      .fetch(&orphan, || async { Ok::<_, ApiError>(2u8) })
      .await
      .unwrap();

    assert_eq!(client.collect_garbage(), 1);
    assert!(client.cache().get(&observed).is_some());
    assert!(client.cache().get(&orphan).is_none());

    client.unobserve(&observed);
    assert_eq!(client.collect_garbage(), 1);
    assert!(client.cache().get(&observed).is_none());
  }

  #[tokio::test]
  async fn test_gc_time_keeps_recent_entries() {
    let client = client(Duration::from_secs(300));
    let key = QueryKey::new("students");
    client.observe(&key);
    client
      .fetch(&key, || async { Ok::<_, ApiError>(1u8) })
      .await
      .unwrap();
    client.unobserve(&key);

    assert_eq!(client.collect_garbage(), 0);
    assert!(client.cache().get(&key).is_some());
  }

  #[tokio::test]
  async fn test_response_for_collected_key_is_discarded() {
    let client = client(Duration::ZERO);
    let key = QueryKey::new("students");
    let (tx, rx) = oneshot::channel::<()>();

    let pending = {
      let client = client.clone();
      let key = key.clone();
      tokio::spawn(async move {
        client
          .fetch(&key, move || async move {
            let _ = rx.await;
            Ok::<_, ApiError>(1u8)
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(client.collect_garbage(), 1);
    tx.send(()).unwrap();
    let _ = pending.await.unwrap();

    assert!(client.cache().get(&key).is_none());
  }
}
