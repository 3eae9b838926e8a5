use crate::api::types::{Instructor, InstructorInput, Role};
use crate::forms::InstructorDraft;
use crate::query::Mutation;
use crate::resources::Gym;
use crate::ui::components::{Confirm, Field, Form, FormEvent, KeyResult};
use crate::ui::renderfns::utils::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{enum_choices, parse_wire, short_date, wire_name, ListPanel, Route};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};
use serde_json::Value;

/// Staff accounts. Passwords are only required when creating.
pub struct InstructorsView {
  list: ListPanel<Instructor>,
  form: Form,
  confirm: Confirm<String>,
  editing: Option<String>,
  create: Mutation<InstructorInput, Value>,
  update: Mutation<(String, InstructorInput), Value>,
  delete: Mutation<String, Value>,
}

fn role_color(role: Role) -> Color {
  match role {
    Role::Admin => Color::Magenta,
    Role::Manager => Color::Cyan,
    Role::Instructor => Color::Green,
  }
}

fn instructor_fields(instructor: Option<&Instructor>) -> Vec<Field> {
  let password_label = if instructor.is_some() {
    "Nova senha (opcional)"
  } else {
    "Senha"
  };
  vec![
    Field::text("name", "Nome").with_value(instructor.map(|i| i.name.as_str()).unwrap_or("")),
    Field::text("email", "Email").with_value(instructor.map(|i| i.email.as_str()).unwrap_or("")),
    Field::secret("password", password_label),
    Field::select("role", "Função", enum_choices(&Role::ALL, Role::label, None))
      .with_value(&wire_name(instructor.map(|i| i.role).unwrap_or_default())),
  ]
}

impl InstructorsView {
  pub fn new(gym: Gym) -> Self {
    Self {
      list: ListPanel::new("Instrutores", gym.instructors()),
      form: Form::new(),
      confirm: Confirm::new(),
      editing: None,
      create: gym.create_instructor(),
      update: gym.update_instructor(),
      delete: gym.delete_instructor(),
    }
  }

  fn draft(&self) -> InstructorDraft {
    InstructorDraft {
      name: self.form.value("name"),
      email: self.form.value("email"),
      password: self.form.value("password"),
      role: parse_wire(&self.form.value("role")),
      editing: self.editing.is_some(),
    }
  }

  fn submit(&mut self) {
    let input = match self.draft().validate() {
      Ok(input) => input,
      Err(error) => {
        self.form.fail(&error);
        return;
      }
    };

    self.form.set_busy();
    match self.editing.clone() {
      Some(id) => self.update.mutate((id, input)),
      None => self.create.mutate(input),
    }
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.confirm.handle_key(key) {
      KeyResult::Event(id) => {
        self.delete.mutate(id);
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => self.submit(),
      KeyResult::Event(FormEvent::Cancelled) => self.editing = None,
      KeyResult::Handled => {}
      KeyResult::NotHandled => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('n') => {
        self.editing = None;
        self.form.open("Novo instrutor", instructor_fields(None));
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let instructor = self.list.selected()?.clone();
        self.editing = Some(instructor.id.clone());
        self.form.open(
          format!("Editar {}", instructor.name),
          instructor_fields(Some(&instructor)),
        );
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let instructor = self.list.selected()?;
        let question = format!("Excluir o instrutor {}?", instructor.name);
        let id = instructor.id.clone();
        self.confirm.ask(question, id);
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let id = self.list.selected()?.id.clone();
        Some(ViewAction::Push(Route::Instructor(id)))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn settle_mutations(&mut self) {
    let outcome = self.create.poll().or_else(|| self.update.poll());
    match outcome {
      Some(Ok(_)) => {
        self.form.close();
        self.editing = None;
      }
      Some(Err(error)) => self.form.fail_with(error.user_message("Erro ao salvar instrutor")),
      None => {}
    }
    // Failure is already toasted
    let _ = self.delete.poll();
  }
}

impl View for InstructorsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.list.handle_key(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.list.render(
      frame,
      area,
      &["Nome", "Email", "Função", "Desde"],
      &[
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(14),
        Constraint::Length(11),
      ],
      |i| {
        Row::new(vec![
          Cell::from(truncate(&i.name, 40)),
          Cell::from(truncate(&i.email, 40)),
          Cell::from(i.role.label()).style(Style::default().fg(role_color(i.role))),
          Cell::from(i.created_at.as_deref().map(short_date).unwrap_or_default()),
        ])
      },
    );
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Instrutores".to_string()
  }

  fn tick(&mut self) {
    self.list.tick();
    self.settle_mutations();
  }

  fn is_capturing_input(&self) -> bool {
    self.form.is_active() || self.confirm.is_active() || self.list.is_searching()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("n", "novo").with_priority(10),
      ShortcutInfo::new("e", "editar").with_priority(20),
      ShortcutInfo::new("d", "excluir").with_priority(30),
      ShortcutInfo::new("enter", "detalhes").with_priority(40),
      ShortcutInfo::new("/", "buscar").with_priority(50),
      ShortcutInfo::new("r", "atualizar").with_priority(60),
      ShortcutInfo::new("q", "voltar").with_priority(70),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing;
  use crossterm::event::KeyModifiers;
  use serde_json::json;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn loaded_view(server: &mut mockito::ServerGuard) -> (InstructorsView, crate::toast::ToastQueue) {
    server
      .mock("GET", "/users/instructors")
      .with_body(
        json!([{"id": "u1", "name": "Carla", "email": "carla@gym.com", "role": "INSTRUCTOR"}]).to_string(),
      )
      .create_async()
      .await;

    let (gym, toasts) = testing::gym(&server.url());
    let mut view = InstructorsView::new(gym);
    for _ in 0..100 {
      view.tick();
      if !view.list.items().is_empty() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    (view, toasts)
  }

  #[tokio::test]
  async fn test_create_requires_password() {
    let mut server = mockito::Server::new_async().await;
    let (mut view, _toasts) = loaded_view(&mut server).await;

    view.handle_key(key(KeyCode::Char('n')));
    for c in "Davi".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(key(KeyCode::Tab));
    for c in "davi@gym.com".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(key(KeyCode::Enter));
    assert_eq!(view.form.error(), Some("A senha é obrigatória"));
  }

  #[tokio::test]
  async fn test_delete_asks_first() {
    let mut server = mockito::Server::new_async().await;
    let delete = server
      .mock("DELETE", "/users/u1")
      .with_body("{}")
      .expect(1)
      .create_async()
      .await;
    let (mut view, _toasts) = loaded_view(&mut server).await;

    view.handle_key(key(KeyCode::Char('d')));
    assert!(view.confirm.is_active());
    view.handle_key(key(KeyCode::Char('n')));
    assert!(!view.confirm.is_active());

    view.handle_key(key(KeyCode::Char('d')));
    view.handle_key(key(KeyCode::Char('y')));
    for _ in 0..100 {
      view.tick();
      if !view.delete.is_pending() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    delete.assert_async().await;
  }
}
