use super::input::{InputResult, TextInput};
use super::picker::Choice;
use super::KeyResult;
use crate::forms::ValidationError;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone)]
enum FieldKind {
  Text,
  Secret,
  /// Cycled with Left/Right; an empty `choices` list means nothing to pick
  Select { choices: Vec<Choice>, selected: usize },
}

/// One labelled field of a [`Form`].
#[derive(Debug, Clone)]
pub struct Field {
  pub name: &'static str,
  pub label: &'static str,
  kind: FieldKind,
  input: TextInput,
}

impl Field {
  pub fn text(name: &'static str, label: &'static str) -> Self {
    Self {
      name,
      label,
      kind: FieldKind::Text,
      input: TextInput::new(),
    }
  }

  pub fn secret(name: &'static str, label: &'static str) -> Self {
    Self {
      kind: FieldKind::Secret,
      ..Self::text(name, label)
    }
  }

  pub fn select(name: &'static str, label: &'static str, choices: Vec<Choice>) -> Self {
    Self {
      kind: FieldKind::Select {
        choices,
        selected: 0,
      },
      ..Self::text(name, label)
    }
  }

  /// Prefill; for selects, picks the choice with this value
  pub fn with_value(mut self, value: &str) -> Self {
    match &mut self.kind {
      FieldKind::Select { choices, selected } => {
        if let Some(i) = choices.iter().position(|c| c.value == value) {
          *selected = i;
        }
      }
      _ => self.input.set_value(value),
    }
    self
  }

  pub fn value(&self) -> String {
    match &self.kind {
      FieldKind::Select { choices, selected } => choices
        .get(*selected)
        .map(|c| c.value.clone())
        .unwrap_or_default(),
      _ => self.input.value().to_string(),
    }
  }

  fn display(&self, focused: bool) -> Vec<Span<'_>> {
    let caret = Span::styled("_", Style::default().fg(Color::Yellow));
    match &self.kind {
      FieldKind::Text if focused => {
        let (before, after) = self.input.split_at_cursor();
        vec![Span::raw(before), caret, Span::raw(after)]
      }
      FieldKind::Text => vec![Span::raw(self.input.value())],
      FieldKind::Secret => {
        let mut spans = vec![Span::raw("*".repeat(self.input.value().chars().count()))];
        if focused {
          spans.push(caret);
        }
        spans
      }
      FieldKind::Select { choices, selected } => {
        let label = choices
          .get(*selected)
          .map(|c| c.label.as_str())
          .unwrap_or("(nenhum)");
        vec![
          Span::styled("< ", Style::default().fg(Color::DarkGray)),
          Span::styled(label, Style::default().fg(Color::Cyan)),
          Span::styled(" >", Style::default().fg(Color::DarkGray)),
        ]
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) -> bool {
    match &mut self.kind {
      FieldKind::Select { choices, selected } => {
        if choices.is_empty() {
          return false;
        }
        match key.code {
          KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('l') => {
            *selected = (*selected + 1) % choices.len();
            true
          }
          KeyCode::Left | KeyCode::Char('h') => {
            *selected = selected.checked_sub(1).unwrap_or(choices.len() - 1);
            true
          }
          _ => false,
        }
      }
      _ => self.input.handle_key(key) == InputResult::Consumed,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Enter pressed; the parent validates and closes or calls [`Form::fail`]
  Submitted,
  Cancelled,
}

/// Modal create/edit form.
#[derive(Debug, Clone, Default)]
pub struct Form {
  active: bool,
  title: String,
  fields: Vec<Field>,
  focus: usize,
  error: Option<String>,
  busy: bool,
}

impl Form {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn open(&mut self, title: impl Into<String>, fields: Vec<Field>) {
    self.active = true;
    self.title = title.into();
    self.fields = fields;
    self.focus = 0;
    self.error = None;
    self.busy = false;
  }

  pub fn close(&mut self) {
    self.active = false;
    self.fields.clear();
    self.error = None;
    self.busy = false;
  }

  /// Current value of the named field, empty when there is no such field
  pub fn value(&self, name: &str) -> String {
    self
      .fields
      .iter()
      .find(|f| f.name == name)
      .map(Field::value)
      .unwrap_or_default()
  }

  /// Show a validation error and focus the offending field
  pub fn fail(&mut self, error: &ValidationError) {
    if let Some(i) = self.fields.iter().position(|f| f.name == error.field) {
      self.focus = i;
    }
    self.error = Some(error.message.clone());
    self.busy = false;
  }

  /// Show a server-side failure, keeping the input for another try
  pub fn fail_with(&mut self, message: impl Into<String>) {
    self.error = Some(message.into());
    self.busy = false;
  }

  /// Mark as waiting for the mutation; further submits are ignored
  pub fn set_busy(&mut self) {
    self.error = None;
    self.busy = true;
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.close();
        return KeyResult::Event(FormEvent::Cancelled);
      }
      KeyCode::Enter if self.busy => return KeyResult::Handled,
      KeyCode::Enter => return KeyResult::Event(FormEvent::Submitted),
      KeyCode::Tab | KeyCode::Down => {
        if !self.fields.is_empty() {
          self.focus = (self.focus + 1) % self.fields.len();
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        if !self.fields.is_empty() {
          self.focus = self.focus.checked_sub(1).unwrap_or(self.fields.len() - 1);
        }
        return KeyResult::Handled;
      }
      _ => {}
    }

    if let Some(field) = self.fields.get_mut(self.focus) {
      if field.handle_key(key) {
        self.error = None;
      }
    }
    KeyResult::Handled
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 70 / 100).clamp(40, 80).min(area.width);
    let height = (self.fields.len() as u16 + 5).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title))
      .title_bottom(Line::from(" Tab: próximo  Enter: salvar  Esc: cancelar ").centered());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let label_width = self
      .fields
      .iter()
      .map(|f| f.label.chars().count())
      .max()
      .unwrap_or(0);

    let mut lines: Vec<Line> = self
      .fields
      .iter()
      .enumerate()
      .map(|(i, field)| {
        let focused = i == self.focus;
        let label_style = if focused {
          Style::default().fg(Color::Yellow).bold()
        } else {
          Style::default().fg(Color::DarkGray)
        };
        let mut spans = vec![Span::styled(
          format!("{:>width$}: ", field.label, width = label_width),
          label_style,
        )];
        spans.extend(field.display(focused));
        Line::from(spans)
      })
      .collect();

    lines.push(Line::raw(""));
    if self.busy {
      lines.push(Line::styled("Salvando...", Style::default().fg(Color::DarkGray)));
    } else if let Some(error) = &self.error {
      lines.push(Line::styled(error.as_str(), Style::default().fg(Color::Red)));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn form() -> Form {
    let mut form = Form::new();
    form.open(
      "Novo instrutor",
      vec![
        Field::text("name", "Nome").with_value("Bruno"),
        Field::secret("password", "Senha"),
        Field::select(
          "role",
          "Função",
          vec![Choice::new("ADMIN", "Admin"), Choice::new("INSTRUCTOR", "Instrutor")],
        )
        .with_value("INSTRUCTOR"),
      ],
    );
    form
  }

  #[test]
  fn test_typing_goes_to_focused_field() {
    let mut form = form();
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Char('x')));
    assert_eq!(form.value("name"), "Bruno");
    assert_eq!(form.value("password"), "x");
  }

  #[test]
  fn test_select_cycles() {
    let mut form = form();
    assert_eq!(form.value("role"), "INSTRUCTOR");
    form.handle_key(key(KeyCode::BackTab));
    form.handle_key(key(KeyCode::Right));
    assert_eq!(form.value("role"), "ADMIN");
  }

  #[test]
  fn test_fail_focuses_field() {
    let mut form = form();
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Event(FormEvent::Submitted));
    form.fail(&ValidationError::new("password", "Informe a senha"));
    assert_eq!(form.error(), Some("Informe a senha"));
    form.handle_key(key(KeyCode::Char('1')));
    assert_eq!(form.value("password"), "1");
    assert_eq!(form.error(), None);
  }

  #[test]
  fn test_busy_ignores_enter() {
    let mut form = form();
    form.set_busy();
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
  }

  #[test]
  fn test_escape_closes() {
    let mut form = form();
    assert_eq!(form.handle_key(key(KeyCode::Esc)), KeyResult::Event(FormEvent::Cancelled));
    assert!(!form.is_active());
  }
}
