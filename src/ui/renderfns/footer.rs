use crate::toast::{Toast, ToastLevel};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar with view breadcrumb on the left and the latest toast
/// on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], toast: Option<&Toast>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  frame.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    area,
  );

  if let Some(toast) = toast {
    let color = match toast.level {
      ToastLevel::Success => Color::Green,
      ToastLevel::Error => Color::Red,
      ToastLevel::Info => Color::Cyan,
    };
    let line = Line::styled(format!("{} ", toast.message), Style::default().fg(color).bold());
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Right), area);
  }
}
