//! Freshness policies per resource.

use std::time::Duration;

/// How long fetched data counts as fresh, and whether it is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
  /// Data older than this is refetched on mount; zero means always
  pub stale_time: Duration,
  /// Refetch in the background at this period while observed
  pub refetch_interval: Option<Duration>,
  /// Disabled queries never fetch (e.g. detail views without an id)
  pub enabled: bool,
}

impl QueryPolicy {
  pub const DEFAULT: QueryPolicy = QueryPolicy {
    stale_time: Duration::ZERO,
    refetch_interval: None,
    enabled: true,
  };

  // Payments change only through this console
  pub const PAYMENTS: QueryPolicy = QueryPolicy {
    stale_time: Duration::from_secs(5 * 60), // 5 min
    ..Self::DEFAULT
  };

  pub const WORKOUT_PLANS: QueryPolicy = QueryPolicy {
    stale_time: Duration::from_secs(5 * 60), // 5 min
    ..Self::DEFAULT
  };

  // Other staff book classes concurrently
  pub const APPOINTMENTS: QueryPolicy = QueryPolicy {
    stale_time: Duration::from_secs(5),
    refetch_interval: Some(Duration::from_secs(30)),
    enabled: true,
  };

  // Generated server-side at any time
  pub const NOTIFICATIONS: QueryPolicy = QueryPolicy {
    stale_time: Duration::ZERO,
    refetch_interval: Some(Duration::from_secs(30)),
    enabled: true,
  };

  pub const fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }
}

impl Default for QueryPolicy {
  fn default() -> Self {
    Self::DEFAULT
  }
}
