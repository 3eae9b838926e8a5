use crate::api::types::{Gender, Student, StudentEnvelope, StudentInput};
use crate::forms::StudentDraft;
use crate::query::Mutation;
use crate::resources::Gym;
use crate::ui::components::{Choice, Field, Form, FormEvent, KeyResult};
use crate::ui::renderfns::utils::{student_status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{parse_wire, short_date, wire_name, ListPanel, Route};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};

/// Student roster with create/edit forms; Enter opens the profile
pub struct StudentsView {
  list: ListPanel<Student>,
  form: Form,
  editing: Option<String>,
  create: Mutation<StudentInput, StudentEnvelope>,
  update: Mutation<(String, StudentInput), StudentEnvelope>,
}

fn gender_choices() -> Vec<Choice> {
  vec![
    Choice::new("", "Não informado"),
    Choice::new(wire_name(Gender::Female), "Feminino"),
    Choice::new(wire_name(Gender::Male), "Masculino"),
    Choice::new(wire_name(Gender::Other), "Outro"),
  ]
}

fn student_fields(student: Option<&Student>) -> Vec<Field> {
  let text = |get: fn(&Student) -> Option<&str>| student.and_then(get).unwrap_or("").to_string();
  vec![
    Field::text("name", "Nome").with_value(&text(|s| Some(s.name.as_str()))),
    Field::text("email", "Email").with_value(&text(|s| Some(s.email.as_str()))),
    Field::text("phone", "Telefone").with_value(&text(|s| s.phone.as_deref())),
    Field::text("dateOfBirth", "Nascimento (AAAA-MM-DD)")
      .with_value(&text(|s| s.date_of_birth.as_deref().map(|d| d.get(..10).unwrap_or(d)))),
    Field::select("gender", "Gênero", gender_choices())
      .with_value(&student.and_then(|s| s.gender).map(wire_name).unwrap_or_default()),
    Field::text("address", "Endereço").with_value(&text(|s| s.address.as_deref())),
    Field::text("emergencyContact", "Contato de emergência")
      .with_value(&text(|s| s.emergency_contact.as_deref())),
    Field::text("emergencyPhone", "Telefone de emergência")
      .with_value(&text(|s| s.emergency_phone.as_deref())),
    Field::text("medicalRestrictions", "Restrições médicas")
      .with_value(&text(|s| s.medical_restrictions.as_deref())),
    Field::text("objectives", "Objetivos").with_value(&text(|s| s.objectives.as_deref())),
  ]
}

impl StudentsView {
  pub fn new(gym: Gym) -> Self {
    Self {
      list: ListPanel::new("Alunos", gym.students()),
      form: Form::new(),
      editing: None,
      create: gym.create_student(),
      update: gym.update_student(),
    }
  }

  fn draft(&self) -> StudentDraft {
    StudentDraft {
      name: self.form.value("name"),
      email: self.form.value("email"),
      phone: self.form.value("phone"),
      date_of_birth: self.form.value("dateOfBirth"),
      gender: parse_wire(&self.form.value("gender")),
      address: self.form.value("address"),
      emergency_contact: self.form.value("emergencyContact"),
      emergency_phone: self.form.value("emergencyPhone"),
      medical_restrictions: self.form.value("medicalRestrictions"),
      objectives: self.form.value("objectives"),
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
        self.form.open("Novo aluno", student_fields(None));
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let student = self.list.selected()?.clone();
        self.editing = Some(student.id.clone());
        self
          .form
          .open(format!("Editar {}", student.name), student_fields(Some(&student)));
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let id = self.list.selected()?.id.clone();
        Some(ViewAction::Push(Route::Student(id)))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn settle_mutations(&mut self) {
    let outcome = self
      .create
      .poll()
      .map(|r| r.map(|_| ()))
      .or_else(|| self.update.poll().map(|r| r.map(|_| ())));
    match outcome {
      Some(Ok(())) => {
        self.form.close();
        self.editing = None;
      }
      Some(Err(error)) => self.form.fail_with(error.user_message("Erro ao salvar aluno")),
      None => {}
    }
  }
}

impl View for StudentsView {
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
      &["Nome", "Email", "Telefone", "Matrícula", "Status"],
      &[
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(16),
        Constraint::Length(11),
        Constraint::Length(10),
      ],
      |s| {
        Row::new(vec![
          Cell::from(truncate(&s.name, 40)),
          Cell::from(truncate(&s.email, 40)),
          Cell::from(s.phone.clone().unwrap_or_default()),
          Cell::from(s.registration_date.as_deref().map(short_date).unwrap_or_default()),
          Cell::from(s.status.label()).style(Style::default().fg(student_status_color(s.status))),
        ])
      },
    );
    self.form.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Alunos".to_string()
  }

  fn tick(&mut self) {
    self.list.tick();
    self.settle_mutations();
  }

  fn is_capturing_input(&self) -> bool {
    self.form.is_active() || self.list.is_searching()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("n", "novo").with_priority(10),
      ShortcutInfo::new("e", "editar").with_priority(20),
      ShortcutInfo::new("enter", "perfil").with_priority(30),
      ShortcutInfo::new("/", "buscar").with_priority(40),
      ShortcutInfo::new("s", "status").with_priority(50),
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

  fn type_text(view: &mut StudentsView, text: &str) {
    for c in text.chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_edit_form_shows_birth_date_without_time() {
    let student = Student {
      name: "Ana".to_string(),
      email: "ana@gym.com".to_string(),
      date_of_birth: Some("1990-05-17T00:00:00.000Z".to_string()),
      ..Default::default()
    };
    let fields = student_fields(Some(&student));
    let birth = fields.iter().find(|f| f.name == "dateOfBirth").unwrap();
    assert_eq!(birth.value(), "1990-05-17");

    let blank = student_fields(None);
    assert!(blank.iter().all(|f| f.name == "gender" || f.value().is_empty()));
  }

  #[tokio::test]
  async fn test_invalid_form_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/students")
      .with_body(json!({"students": []}).to_string())
      .create_async()
      .await;
    let create = server.mock("POST", "/students").expect(0).create_async().await;

    let (gym, _toasts) = testing::gym(&server.url());
    let mut view = StudentsView::new(gym);
    view.handle_key(key(KeyCode::Char('n')));
    assert!(view.is_capturing_input());

    type_text(&mut view, "Ana");
    view.handle_key(key(KeyCode::Tab));
    type_text(&mut view, "ana.gym.com");
    view.handle_key(key(KeyCode::Enter));
    assert_eq!(view.form.error(), Some("Email inválido"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    view.tick();
    create.assert_async().await;
  }

  #[tokio::test]
  async fn test_create_closes_form_on_success() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/students")
      .with_body(json!({"students": []}).to_string())
      .create_async()
      .await;
    server
      .mock("POST", "/students")
      .with_status(201)
      .with_body(
        json!({"student": {"id": "s1", "name": "Ana", "email": "ana@gym.com"}, "message": "ok"})
          .to_string(),
      )
      .create_async()
      .await;

    let (gym, mut toasts) = testing::gym(&server.url());
    let mut view = StudentsView::new(gym);
    view.handle_key(key(KeyCode::Char('n')));
    type_text(&mut view, "Ana");
    view.handle_key(key(KeyCode::Tab));
    type_text(&mut view, "ana@gym.com");
    view.handle_key(key(KeyCode::Enter));

    for _ in 0..100 {
      view.tick();
      if !view.form.is_active() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!view.form.is_active());
    assert!(toasts.drain().iter().any(|t| t.message.contains("sucesso")));
  }
}
