//! Shared in-memory store of fetched data, keyed by [`QueryKey`].
//!
//! Values are type-erased so one cache serves every resource; readers
//! downcast to the type their fetcher produced.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use super::key::QueryKey;
use crate::api::ApiError;

/// A fetched value as stored in the cache
pub type CachedValue = Arc<dyn Any + Send + Sync>;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
  Idle,
  Loading,
  Success,
  Error,
}

/// Cache slot for one key.
#[derive(Clone)]
pub struct CacheEntry {
  pub data: Option<CachedValue>,
  pub status: FetchStatus,
  /// Last failure; previous data is kept alongside it
  pub error: Option<ApiError>,
  pub updated_at: Option<Instant>,
  pub invalidated: bool,
  /// Bumped on every data replacement
  pub version: u64,
}

impl CacheEntry {
  fn new() -> Self {
    Self {
      data: None,
      status: FetchStatus::Idle,
      error: None,
      updated_at: None,
      invalidated: false,
      version: 0,
    }
  }

  /// Stale when invalidated, never fetched, or older than `stale_time`.
  ///
  /// A zero stale time makes every entry stale.
  pub fn is_stale(&self, stale_time: Duration) -> bool {
    if self.invalidated {
      return true;
    }
    match self.updated_at {
      Some(at) => at.elapsed() >= stale_time,
      None => true,
    }
  }

  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.data.clone()?.downcast::<T>().ok()
  }
}

impl fmt::Debug for CacheEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheEntry")
      .field("has_data", &self.data.is_some())
      .field("status", &self.status)
      .field("error", &self.error)
      .field("updated_at", &self.updated_at)
      .field("invalidated", &self.invalidated)
      .field("version", &self.version)
      .finish()
  }
}

/// What to record for a key.
pub enum CacheWrite {
  /// A request for the key started
  Loading,
  /// A request completed; replaces the data wholesale
  Data(CachedValue),
  /// A request failed; previous data stays
  Error(ApiError),
  /// Mark this exact key stale
  Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
  Loading,
  Updated,
  Failed,
  Invalidated,
  Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
  pub key: QueryKey,
  pub kind: CacheEventKind,
}

/// Storage for query results, injected into the [`QueryClient`](super::QueryClient).
pub trait QueryCache: Send + Sync {
  fn get(&self, key: &QueryKey) -> Option<CacheEntry>;

  fn set(&self, key: &QueryKey, write: CacheWrite);

  /// Mark every entry selected by `prefix` stale; returns the keys marked.
  fn invalidate(&self, prefix: &QueryKey) -> Vec<QueryKey>;

  fn remove(&self, key: &QueryKey);

  fn keys(&self) -> Vec<QueryKey>;

  fn clear(&self);

  /// Receive every change made after this call.
  fn subscribe(&self) -> broadcast::Receiver<CacheEvent>;
}

/// Process-local cache. Nothing survives a restart.
pub struct MemoryCache {
  entries: Mutex<HashMap<QueryKey, CacheEntry>>,
  events: broadcast::Sender<CacheEvent>,
}

impl MemoryCache {
  pub fn new() -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      entries: Mutex::new(HashMap::new()),
      events,
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn emit(&self, key: QueryKey, kind: CacheEventKind) {
    // No subscribers is fine
    let _ = self.events.send(CacheEvent { key, kind });
  }
}

impl Default for MemoryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryCache for MemoryCache {
  fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
    self.entries().get(key).cloned()
  }

  fn set(&self, key: &QueryKey, write: CacheWrite) {
    let kind = {
      let mut entries = self.entries();
      let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
      match write {
        CacheWrite::Loading => {
          entry.status = FetchStatus::Loading;
          CacheEventKind::Loading
        }
        CacheWrite::Data(data) => {
          entry.data = Some(data);
          entry.status = FetchStatus::Success;
          entry.error = None;
          entry.updated_at = Some(Instant::now());
          entry.invalidated = false;
          entry.version += 1;
          CacheEventKind::Updated
        }
        CacheWrite::Error(error) => {
          entry.status = FetchStatus::Error;
          entry.error = Some(error);
          CacheEventKind::Failed
        }
        CacheWrite::Stale => {
          entry.invalidated = true;
          CacheEventKind::Invalidated
        }
      }
    };
    self.emit(key.clone(), kind);
  }

  fn invalidate(&self, prefix: &QueryKey) -> Vec<QueryKey> {
    let marked: Vec<QueryKey> = {
      let mut entries = self.entries();
      entries
        .iter_mut()
        .filter(|(key, _)| prefix.matches(key))
        .map(|(key, entry)| {
          entry.invalidated = true;
          key.clone()
        })
        .collect()
    };

    for key in &marked {
      self.emit(key.clone(), CacheEventKind::Invalidated);
    }
    marked
  }

  fn remove(&self, key: &QueryKey) {
    let removed = self.entries().remove(key).is_some();
    if removed {
      self.emit(key.clone(), CacheEventKind::Removed);
    }
  }

  fn keys(&self) -> Vec<QueryKey> {
    self.entries().keys().cloned().collect()
  }

  fn clear(&self) {
    let keys: Vec<QueryKey> = self.entries().drain().map(|(key, _)| key).collect();
    for key in keys {
      self.emit(key, CacheEventKind::Removed);
    }
  }

  fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
    self.events.subscribe()
  }
}
