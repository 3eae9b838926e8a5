use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// One pickable entry: the value handed back and the text shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
  pub value: String,
  pub label: String,
}

impl Choice {
  pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
    Self {
      value: value.into(),
      label: label.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
  Selected(String),
  Cancelled,
}

/// Centered pick-one list (payment method, copy target, notification job)
#[derive(Debug, Clone, Default)]
pub struct Picker {
  active: bool,
  choices: Vec<Choice>,
  selected: usize,
  title: String,
}

impl Picker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self, title: impl Into<String>, choices: Vec<Choice>) {
    self.active = true;
    self.choices = choices;
    self.selected = 0;
    self.title = title.into();
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.choices.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(PickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let picked = self.choices.get(self.selected).map(|c| c.value.clone());
        self.hide();
        match picked {
          Some(value) => KeyResult::Event(PickerEvent::Selected(value)),
          None => KeyResult::Event(PickerEvent::Cancelled),
        }
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.choices.is_empty() {
          self.selected = (self.selected + 1) % self.choices.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.choices.is_empty() {
          self.selected = self.selected.checked_sub(1).unwrap_or(self.choices.len() - 1);
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let longest = self
      .choices
      .iter()
      .map(|c| c.label.chars().count())
      .chain(std::iter::once(self.title.chars().count()))
      .max()
      .unwrap_or(10);
    let width = (longest as u16 + 6).clamp(20, area.width.saturating_sub(4).max(20)).min(area.width);
    let height = (self.choices.len() as u16 + 2).clamp(3, area.height.max(3)).min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = self
      .choices
      .iter()
      .map(|choice| ListItem::new(Span::styled(choice.label.as_str(), Style::default().fg(Color::Cyan))))
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
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
  fn test_wraps_and_selects() {
    let mut picker = Picker::new();
    picker.show(
      "Forma de pagamento",
      vec![Choice::new("PIX", "PIX"), Choice::new("CASH", "Dinheiro")],
    );
    picker.handle_key(key(KeyCode::Up));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected("CASH".to_string()))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_inactive_passes_keys() {
    let mut picker = Picker::new();
    assert_eq!(picker.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);
  }
}
