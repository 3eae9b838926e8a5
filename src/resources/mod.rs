//! Per-resource reads and writes, bound to cache keys.
//!
//! Each submodule adds endpoint methods to [`ApiClient`] and query/mutation
//! constructors to [`Gym`], which bundles everything a view needs.

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod instructors;
pub mod notifications;
pub mod payments;
pub mod progress;
pub mod students;
pub mod uploads;
pub mod workout_plans;

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::query::{Mutation, MutationDescriptor, Query, QueryClient, QueryKey, QueryPolicy};
use crate::storage::CredentialStore;
use crate::toast::Toasts;

/// Backend access for views: HTTP client, shared cache and toast sender.
#[derive(Clone)]
pub struct Gym {
  pub api: ApiClient,
  pub queries: QueryClient,
  pub toasts: Toasts,
}

impl Gym {
  pub fn new(api: ApiClient, queries: QueryClient, toasts: Toasts) -> Self {
    Self {
      api,
      queries,
      toasts,
    }
  }

  pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
    self.api.credentials()
  }

  /// Bind a read to `key`; the fetcher gets its own client handle per call.
  fn query<T, F, Fut>(&self, key: QueryKey, policy: QueryPolicy, fetch: F) -> Query<T>
  where
    T: Any + Send + Sync,
    F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let api = self.api.clone();
    Query::new(self.queries.clone(), key, policy, move || fetch(api.clone()))
  }

  fn mutation<I, O, F, Fut>(&self, descriptor: MutationDescriptor, write: F) -> Mutation<I, O>
  where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(ApiClient, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
  {
    let api = self.api.clone();
    Mutation::new(
      self.queries.clone(),
      self.toasts.clone(),
      descriptor,
      move |input| write(api.clone(), input),
    )
  }
}

/// Cache key resource names, shared by reads and the invalidation lists
pub mod keys {
  pub const STUDENTS: &str = "students";
  pub const STUDENT: &str = "student";
  pub const INSTRUCTORS: &str = "instructors";
  pub const INSTRUCTOR: &str = "instructor";
  pub const INSTRUCTOR_STATS: &str = "instructor-stats";
  pub const APPOINTMENTS: &str = "appointments";
  pub const INSTRUCTOR_AVAILABILITY: &str = "instructor-availability";
  pub const PAYMENTS: &str = "payments";
  pub const PAYMENT: &str = "payment";
  pub const PAYMENT_STATS: &str = "payment-stats";
  pub const PROGRESS_RECORDS: &str = "progress-records";
  pub const PROGRESS_RECORD: &str = "progress-record";
  pub const STUDENT_HISTORY: &str = "student-history";
  pub const WORKOUT_PLANS: &str = "workout-plans";
  pub const WORKOUT_PLAN: &str = "workout-plan";
  pub const NOTIFICATIONS: &str = "notifications";
  pub const NOTIFICATION_STATS: &str = "notification-stats";
  pub const DASHBOARD_OVERVIEW: &str = "dashboard-overview";
  pub const RECENT_ACTIVITIES: &str = "recent-activities";
  pub const UPCOMING_PAYMENTS: &str = "upcoming-payments";
}

/// Push `name=value` when the value is present.
pub(crate) fn push_opt<V: ToString>(
  params: &mut crate::api::Params,
  name: &'static str,
  value: Option<V>,
) {
  if let Some(value) = value {
    params.push((name, value.to_string()));
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use super::*;
  use crate::query::MemoryCache;
  use crate::storage::MemoryCredentials;
  use crate::toast::ToastQueue;
  use std::time::Duration;

  /// A `Gym` pointed at `url` with a valid-looking token
  pub fn gym(url: &str) -> (Gym, ToastQueue) {
    let creds = Arc::new(MemoryCredentials::new(Some("token".to_string())));
    let api = ApiClient::new(url, creds).unwrap();
    let queries = QueryClient::new(Arc::new(MemoryCache::new()), Duration::from_secs(300));
    let (toasts, queue) = Toasts::channel();
    (Gym::new(api, queries, toasts), queue)
  }
}
