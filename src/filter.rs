//! Client-side search and status filtering over already-fetched lists.
//!
//! Nothing here issues requests; the views narrow whatever the query hook
//! currently holds.

use crate::api::types::{
  Appointment, AppointmentStatus, Instructor, Notification, Payment, PaymentStatus, PlanStatus,
  ProgressRecord, Role, Student, StudentStatus, WorkoutPlan,
};

/// Text fields a record can be found by.
pub trait Searchable {
  fn search_fields(&self) -> Vec<&str>;
}

/// Records with a status the `s` key can cycle through.
pub trait HasStatus {
  type Status: Copy + PartialEq + 'static;

  const STATUSES: &'static [Self::Status];

  fn status(&self) -> Self::Status;

  fn status_label(status: Self::Status) -> &'static str;
}

/// Case-insensitive substring match on any search field.
pub fn matches_search<T: Searchable>(item: &T, query: &str) -> bool {
  let query = query.trim().to_lowercase();
  if query.is_empty() {
    return true;
  }
  item
    .search_fields()
    .iter()
    .any(|field| field.to_lowercase().contains(&query))
}

/// Search text plus an optional status, as typed on a list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter<S> {
  pub search: String,
  pub status: Option<S>,
}

impl<S> Default for ListFilter<S> {
  fn default() -> Self {
    Self {
      search: String::new(),
      status: None,
    }
  }
}

impl<S: Copy + PartialEq + 'static> ListFilter<S> {
  /// All, then each status in order, then back to all.
  pub fn cycle_status(&mut self, statuses: &[S]) {
    self.status = match self.status {
      None => statuses.first().copied(),
      Some(current) => statuses
        .iter()
        .position(|s| *s == current)
        .and_then(|i| statuses.get(i + 1))
        .copied(),
    };
  }

  pub fn is_active(&self) -> bool {
    !self.search.trim().is_empty() || self.status.is_some()
  }

  pub fn clear(&mut self) {
    self.search.clear();
    self.status = None;
  }
}

impl<S: Copy + PartialEq + 'static> ListFilter<S> {
  pub fn apply<'a, T>(&self, items: &'a [T]) -> Vec<&'a T>
  where
    T: Searchable + HasStatus<Status = S>,
  {
    items
      .iter()
      .filter(|item| self.status.map_or(true, |s| item.status() == s))
      .filter(|item| matches_search(*item, &self.search))
      .collect()
  }
}

/// Search only, for records without a status.
pub fn search<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
  items.iter().filter(|item| matches_search(*item, query)).collect()
}

impl Searchable for Student {
  fn search_fields(&self) -> Vec<&str> {
    let mut fields = vec![self.name.as_str(), self.email.as_str()];
    fields.extend(self.phone.as_deref());
    fields
  }
}

impl HasStatus for Student {
  type Status = StudentStatus;
  const STATUSES: &'static [StudentStatus] = &StudentStatus::ALL;

  fn status(&self) -> StudentStatus {
    self.status
  }
  fn status_label(status: StudentStatus) -> &'static str {
    status.label()
  }

}

impl Searchable for Instructor {
  fn search_fields(&self) -> Vec<&str> {
    vec![self.name.as_str(), self.email.as_str()]
  }
}

impl HasStatus for Instructor {
  type Status = Role;
  const STATUSES: &'static [Role] = &Role::ALL;

  fn status(&self) -> Role {
    self.role
  }
  fn status_label(status: Role) -> &'static str {
    status.label()
  }

}

impl Searchable for Appointment {
  fn search_fields(&self) -> Vec<&str> {
    vec![
      self.title.as_str(),
      self.student.name.as_str(),
      self.instructor.name.as_str(),
    ]
  }
}

impl HasStatus for Appointment {
  type Status = AppointmentStatus;
  const STATUSES: &'static [AppointmentStatus] = &AppointmentStatus::ALL;

  fn status(&self) -> AppointmentStatus {
    self.status
  }
  fn status_label(status: AppointmentStatus) -> &'static str {
    status.label()
  }

}

impl Searchable for Payment {
  fn search_fields(&self) -> Vec<&str> {
    let mut fields = vec![self.student.name.as_str()];
    fields.extend(self.description.as_deref());
    fields
  }
}

impl HasStatus for Payment {
  type Status = PaymentStatus;
  const STATUSES: &'static [PaymentStatus] = &PaymentStatus::ALL;

  fn status(&self) -> PaymentStatus {
    self.status
  }
  fn status_label(status: PaymentStatus) -> &'static str {
    status.label()
  }

}

impl Searchable for WorkoutPlan {
  fn search_fields(&self) -> Vec<&str> {
    vec![
      self.name.as_str(),
      self.student.name.as_str(),
      self.instructor.name.as_str(),
    ]
  }
}

impl HasStatus for WorkoutPlan {
  type Status = PlanStatus;
  const STATUSES: &'static [PlanStatus] = &PlanStatus::ALL;

  fn status(&self) -> PlanStatus {
    self.status
  }
  fn status_label(status: PlanStatus) -> &'static str {
    status.label()
  }

}

impl Searchable for ProgressRecord {
  fn search_fields(&self) -> Vec<&str> {
    let mut fields = vec![self.record_date.as_str()];
    fields.extend(self.student.as_ref().map(|s| s.name.as_str()));
    fields.extend(self.notes.as_deref());
    fields
  }
}

/// Progress records carry no status; `s` leaves the list unfiltered.
impl HasStatus for ProgressRecord {
  type Status = ();
  const STATUSES: &'static [()] = &[];

  fn status(&self) {}

  fn status_label(_: ()) -> &'static str {
    ""
  }
}

/// Read state stands in for a status on notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
  Unread,
  Read,
}

impl ReadState {
  pub fn label(self) -> &'static str {
    match self {
      ReadState::Unread => "Não lidas",
      ReadState::Read => "Lidas",
    }
  }
}

impl Searchable for Notification {
  fn search_fields(&self) -> Vec<&str> {
    let mut fields = vec![self.title.as_str(), self.message.as_str()];
    fields.extend(self.student.as_ref().map(|s| s.name.as_str()));
    fields
  }
}

impl HasStatus for Notification {
  type Status = ReadState;
  const STATUSES: &'static [ReadState] = &[ReadState::Unread, ReadState::Read];

  fn status(&self) -> ReadState {
    if self.is_read {
      ReadState::Read
    } else {
      ReadState::Unread
    }
  }
  fn status_label(status: ReadState) -> &'static str {
    status.label()
  }

}
