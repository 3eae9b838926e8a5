use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// y/n dialog guarding destructive actions. `T` is what gets confirmed,
/// usually the id of the record.
#[derive(Debug, Clone)]
pub struct Confirm<T> {
  pending: Option<(String, T)>,
}

impl<T> Default for Confirm<T> {
  fn default() -> Self {
    Self { pending: None }
  }
}

impl<T> Confirm<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.pending.is_some()
  }

  pub fn ask(&mut self, question: impl Into<String>, subject: T) {
    self.pending = Some((question.into(), subject));
  }

  /// `Event(subject)` on yes; any other key cancels
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<T> {
    if self.pending.is_none() {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('s') | KeyCode::Char('S') => {
        match self.pending.take() {
          Some((_, subject)) => KeyResult::Event(subject),
          None => KeyResult::Handled,
        }
      }
      _ => {
        self.pending = None;
        KeyResult::Handled
      }
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some((question, _)) = &self.pending else {
      return;
    };

    let width = (question.chars().count() as u16 + 6).clamp(30, 70).min(area.width);
    let height = 5.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirmar ");

    let lines = vec![
      Line::raw(question.as_str()),
      Line::from(vec![
        Span::styled("y", Style::default().fg(Color::Cyan)),
        Span::styled(" sim   ", Style::default().fg(Color::DarkGray)),
        Span::styled("n", Style::default().fg(Color::Cyan)),
        Span::styled(" não", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, overlay_area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_yes_returns_subject() {
    let mut confirm = Confirm::new();
    confirm.ask("Excluir pagamento?", "p1".to_string());
    assert_eq!(
      confirm.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event("p1".to_string())
    );
    assert!(!confirm.is_active());
  }

  #[test]
  fn test_other_key_cancels() {
    let mut confirm = Confirm::new();
    confirm.ask("Excluir instrutor?", 7);
    assert_eq!(confirm.handle_key(key(KeyCode::Char('n'))), KeyResult::Handled);
    assert!(!confirm.is_active());
    assert_eq!(confirm.handle_key(key(KeyCode::Char('y'))), KeyResult::NotHandled);
  }
}
