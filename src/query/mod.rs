//! Cached reads and invalidating writes against the backend.
//!
//! Inspired by TanStack Query: a [`QueryClient`] owns the shared cache,
//! [`Query`] observes one key from a view, and [`Mutation`] performs a write
//! and invalidates the keys its descriptor declares.

pub mod cache;
pub mod client;
pub mod hook;
pub mod key;
pub mod mutation;
pub mod policy;

pub use cache::{CacheEntry, CacheEvent, CacheEventKind, FetchStatus, MemoryCache, QueryCache};
pub use client::QueryClient;
pub use hook::{Freshness, Query};
pub use key::QueryKey;
pub use mutation::{Mutation, MutationDescriptor};
pub use policy::QueryPolicy;
