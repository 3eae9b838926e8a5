use crate::api::types::{AppointmentStatus, PaymentStatus, PlanStatus, StudentStatus};
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn student_status_color(status: StudentStatus) -> Color {
  match status {
    StudentStatus::Active => Color::Green,
    StudentStatus::Pending => Color::Yellow,
    StudentStatus::Suspended => Color::Red,
    StudentStatus::Inactive | StudentStatus::Unknown => Color::DarkGray,
  }
}

pub fn payment_status_color(status: PaymentStatus) -> Color {
  match status {
    PaymentStatus::Paid => Color::Green,
    PaymentStatus::Pending => Color::Yellow,
    PaymentStatus::Overdue => Color::Red,
  }
}

pub fn plan_status_color(status: PlanStatus) -> Color {
  match status {
    PlanStatus::Active => Color::Green,
    PlanStatus::Paused => Color::Yellow,
    PlanStatus::Completed => Color::Blue,
    PlanStatus::Cancelled => Color::DarkGray,
  }
}

pub fn appointment_status_color(status: AppointmentStatus) -> Color {
  match status {
    AppointmentStatus::Scheduled => Color::Cyan,
    AppointmentStatus::Completed => Color::Green,
    AppointmentStatus::Cancelled => Color::DarkGray,
    AppointmentStatus::NoShow => Color::Red,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("Ana", 10), "Ana");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_counts_chars() {
    assert_eq!(truncate("Avaliação física", 8), "Avali...");
    assert_eq!(truncate("ççççççç", 6), "ççç...");
  }

  #[test]
  fn test_payment_colors() {
    assert_eq!(payment_status_color(PaymentStatus::Paid), Color::Green);
    assert_eq!(payment_status_color(PaymentStatus::Overdue), Color::Red);
  }

  #[test]
  fn test_plan_colors() {
    assert_eq!(plan_status_color(PlanStatus::Active), Color::Green);
    assert_eq!(plan_status_color(PlanStatus::Paused), Color::Yellow);
  }
}
