mod dashboard;
mod instructor_detail;
mod instructors;
mod list;
mod login;
mod notifications;
mod payments;
mod progress;
mod schedule;
mod student_detail;
mod students;
mod workout_plans;

pub use dashboard::DashboardView;
pub use instructor_detail::InstructorDetailView;
pub use instructors::InstructorsView;
pub use list::ListPanel;
pub use login::LoginView;
pub use notifications::NotificationsView;
pub use payments::PaymentsView;
pub use progress::ProgressView;
pub use schedule::ScheduleView;
pub use student_detail::StudentDetailView;
pub use students::StudentsView;
pub use workout_plans::WorkoutPlansView;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::components::Choice;
use super::view::View;
use crate::api::types::{Instructor, Student};
use crate::resources::Gym;

/// Top-level screens, reachable from `:` commands and `--screen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Screen {
  #[default]
  Dashboard,
  Students,
  Instructors,
  Schedule,
  Payments,
  Progress,
  WorkoutPlans,
  Notifications,
}

/// Anything the app can navigate to. Every route needs a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Screen(Screen),
  Student(String),
  Instructor(String),
}

impl From<Screen> for Route {
  fn from(screen: Screen) -> Self {
    Route::Screen(screen)
  }
}

impl Route {
  /// Build the view; it starts fetching immediately.
  pub fn build(&self, gym: &Gym) -> Box<dyn View> {
    match self {
      Route::Screen(Screen::Dashboard) => Box::new(DashboardView::new(gym.clone())),
      Route::Screen(Screen::Students) => Box::new(StudentsView::new(gym.clone())),
      Route::Screen(Screen::Instructors) => Box::new(InstructorsView::new(gym.clone())),
      Route::Screen(Screen::Schedule) => Box::new(ScheduleView::new(gym.clone())),
      Route::Screen(Screen::Payments) => Box::new(PaymentsView::new(gym.clone())),
      Route::Screen(Screen::Progress) => Box::new(ProgressView::new(gym.clone())),
      Route::Screen(Screen::WorkoutPlans) => Box::new(WorkoutPlansView::new(gym.clone())),
      Route::Screen(Screen::Notifications) => Box::new(NotificationsView::new(gym.clone())),
      Route::Student(id) => Box::new(StudentDetailView::new(gym.clone(), id)),
      Route::Instructor(id) => Box::new(InstructorDetailView::new(gym.clone(), id)),
    }
  }
}

/// Wire name of a unit enum variant ("PERSONAL_TRAINING")
pub(crate) fn wire_name<E: Serialize>(value: E) -> String {
  serde_json::to_value(value)
    .ok()
    .and_then(|v| v.as_str().map(str::to_string))
    .unwrap_or_default()
}

/// Parse a wire name back; blank or unknown is `None`
pub(crate) fn parse_wire<E: DeserializeOwned>(value: &str) -> Option<E> {
  if value.trim().is_empty() {
    return None;
  }
  serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
}

/// Select choices for an enum, optionally led by a blank "none" entry
pub(crate) fn enum_choices<E: Serialize + Copy>(
  values: &[E],
  label: fn(E) -> &'static str,
  blank: Option<&str>,
) -> Vec<Choice> {
  blank
    .map(|text| Choice::new("", text))
    .into_iter()
    .chain(values.iter().map(|v| Choice::new(wire_name(*v), label(*v))))
    .collect()
}

pub(crate) fn student_choices(students: Option<&Vec<Student>>) -> Vec<Choice> {
  students
    .map(|list| list.iter().map(|s| Choice::new(&s.id, &s.name)).collect())
    .unwrap_or_default()
}

pub(crate) fn instructor_choices(instructors: Option<&Vec<Instructor>>) -> Vec<Choice> {
  instructors
    .map(|list| list.iter().map(|i| Choice::new(&i.id, &i.name)).collect())
    .unwrap_or_default()
}

/// "1.234,50" style currency, as the gym staff reads it
pub(crate) fn money(amount: f64) -> String {
  let cents = (amount * 100.0).round() as i64;
  let (units, cents) = (cents.abs() / 100, cents.abs() % 100);
  let digits = units.to_string();
  let mut grouped = String::new();
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push('.');
    }
    grouped.push(c);
  }
  let sign = if amount < 0.0 && (units > 0 || cents > 0) { "-" } else { "" };
  format!("{}R$ {},{:02}", sign, grouped, cents)
}

/// Date part of an ISO timestamp, as DD/MM/YYYY
pub(crate) fn short_date(iso: &str) -> String {
  let date = iso.get(..10).unwrap_or(iso);
  match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
    Ok(d) => d.format("%d/%m/%Y").to_string(),
    Err(_) => iso.to_string(),
  }
}

/// Local date and wall-clock time of an RFC 3339 timestamp
pub(crate) fn local_date_time(rfc3339: &str) -> Option<(String, String)> {
  let parsed = chrono::DateTime::parse_from_rfc3339(rfc3339).ok()?;
  let local = parsed.with_timezone(&chrono::Local);
  Some((
    local.format("%Y-%m-%d").to_string(),
    local.format("%H:%M").to_string(),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{AppointmentType, Role};

  #[test]
  fn test_wire_names_round_trip() {
    assert_eq!(wire_name(AppointmentType::GroupClass), "GROUP_CLASS");
    assert_eq!(parse_wire::<Role>("MANAGER"), Some(Role::Manager));
    assert_eq!(parse_wire::<Role>(""), None);
  }

  #[test]
  fn test_enum_choices_with_blank() {
    let choices = enum_choices(&Role::ALL, Role::label, Some("(nenhuma)"));
    assert_eq!(choices.len(), Role::ALL.len() + 1);
    assert_eq!(choices[0].value, "");
    assert_eq!(choices[1].value, "ADMIN");
  }

  #[test]
  fn test_money() {
    assert_eq!(money(149.9), "R$ 149,90");
    assert_eq!(money(1234567.5), "R$ 1.234.567,50");
    assert_eq!(money(0.0), "R$ 0,00");
  }

  #[test]
  fn test_short_date() {
    assert_eq!(short_date("2025-03-10T12:00:00.000Z"), "10/03/2025");
    assert_eq!(short_date("amanhã"), "amanhã");
  }
}
