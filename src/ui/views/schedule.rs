use crate::api::types::{
  Appointment, AppointmentEnvelope, AppointmentInput, AppointmentStatus, AppointmentType, Instructor,
  Student,
};
use crate::forms::AppointmentDraft;
use crate::query::{Mutation, Query};
use crate::resources::appointments::AppointmentFilters;
use crate::resources::Gym;
use crate::ui::components::{Choice, Confirm, Field, Form, FormEvent, KeyResult};
use crate::ui::renderfns::utils::{appointment_status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{
  enum_choices, instructor_choices, local_date_time, parse_wire, student_choices, wire_name, ListPanel,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};

/// Appointment agenda. Times are typed and shown in the local zone.
pub struct ScheduleView {
  list: ListPanel<Appointment>,
  students: Query<Vec<Student>>,
  instructors: Query<Vec<Instructor>>,
  form: Form,
  confirm: Confirm<String>,
  editing: Option<String>,
  create: Mutation<AppointmentInput, AppointmentEnvelope>,
  update: Mutation<(String, AppointmentInput), AppointmentEnvelope>,
  delete: Mutation<String, AppointmentEnvelope>,
}

/// "10/03 14:00-15:00" in local time
fn when(appointment: &Appointment) -> String {
  match (
    local_date_time(&appointment.start_time),
    local_date_time(&appointment.end_time),
  ) {
    (Some((date, start)), Some((_, end))) => {
      let day = chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map(|d| d.format("%d/%m").to_string())
        .unwrap_or(date);
      format!("{} {}-{}", day, start, end)
    }
    _ => appointment.start_time.clone(),
  }
}

impl ScheduleView {
  pub fn new(gym: Gym) -> Self {
    let mut students = gym.students();
    let mut instructors = gym.instructors();
    students.fetch();
    instructors.fetch();

    Self {
      list: ListPanel::new("Agenda", gym.appointments(AppointmentFilters::default())),
      students,
      instructors,
      form: Form::new(),
      confirm: Confirm::new(),
      editing: None,
      create: gym.create_appointment(),
      update: gym.update_appointment(),
      delete: gym.delete_appointment(),
    }
  }

  fn fields(&self, appointment: Option<&Appointment>) -> Vec<Field> {
    let start = appointment.and_then(|a| local_date_time(&a.start_time));
    let end = appointment.and_then(|a| local_date_time(&a.end_time));

    let mut student_options = student_choices(self.students.data());
    student_options.insert(0, Choice::new("", "(selecione)"));
    let mut instructor_options = instructor_choices(self.instructors.data());
    instructor_options.insert(0, Choice::new("", "(selecione)"));

    let mut fields = vec![
      Field::text("title", "Título").with_value(appointment.map(|a| a.title.as_str()).unwrap_or("")),
      Field::select("studentId", "Aluno", student_options)
        .with_value(appointment.map(|a| a.student.id.as_str()).unwrap_or("")),
      Field::select("instructorId", "Instrutor", instructor_options)
        .with_value(appointment.map(|a| a.instructor.id.as_str()).unwrap_or("")),
      Field::select(
        "type",
        "Tipo",
        enum_choices(&AppointmentType::ALL, AppointmentType::label, None),
      )
      .with_value(&wire_name(appointment.map(|a| a.kind).unwrap_or_default())),
      Field::text("date", "Data (AAAA-MM-DD)").with_value(start.as_ref().map(|(d, _)| d.as_str()).unwrap_or("")),
      Field::text("startTime", "Início (HH:MM)").with_value(start.as_ref().map(|(_, t)| t.as_str()).unwrap_or("")),
      Field::text("endTime", "Fim (HH:MM)").with_value(end.as_ref().map(|(_, t)| t.as_str()).unwrap_or("")),
      Field::text("notes", "Observações")
        .with_value(appointment.and_then(|a| a.notes.as_deref()).unwrap_or("")),
    ];

    if let Some(appointment) = appointment {
      fields.push(
        Field::select(
          "status",
          "Status",
          enum_choices(&AppointmentStatus::ALL, AppointmentStatus::label, None),
        )
        .with_value(&wire_name(appointment.status)),
      );
    }
    fields
  }

  fn draft(&self) -> AppointmentDraft {
    AppointmentDraft {
      title: self.form.value("title"),
      student_id: self.form.value("studentId"),
      instructor_id: self.form.value("instructorId"),
      kind: parse_wire(&self.form.value("type")).unwrap_or_default(),
      date: self.form.value("date"),
      start: self.form.value("startTime"),
      end: self.form.value("endTime"),
      notes: self.form.value("notes"),
      status: parse_wire(&self.form.value("status")),
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
        let fields = self.fields(None);
        self.form.open("Novo agendamento", fields);
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let appointment = self.list.selected()?.clone();
        self.editing = Some(appointment.id.clone());
        let fields = self.fields(Some(&appointment));
        self.form.open(format!("Editar {}", appointment.title), fields);
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let appointment = self.list.selected()?;
        let question = format!("Excluir o agendamento \"{}\"?", appointment.title);
        let id = appointment.id.clone();
        self.confirm.ask(question, id);
        Some(ViewAction::None)
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
      Some(Err(error)) => self
        .form
        .fail_with(error.user_message("Erro ao salvar agendamento")),
      None => {}
    }
    let _ = self.delete.poll();
  }
}

impl View for ScheduleView {
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
      &["Quando", "Título", "Aluno", "Instrutor", "Tipo", "Status"],
      &[
        Constraint::Length(18),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(10),
      ],
      |a| {
        Row::new(vec![
          Cell::from(when(a)),
          Cell::from(truncate(&a.title, 40)),
          Cell::from(truncate(&a.student.name, 30)),
          Cell::from(truncate(&a.instructor.name, 30)),
          Cell::from(a.kind.label()),
          Cell::from(a.status.label()).style(Style::default().fg(appointment_status_color(a.status))),
        ])
      },
    );
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Agenda".to_string()
  }

  fn tick(&mut self) {
    self.list.tick();
    self.students.poll();
    self.instructors.poll();
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
      ShortcutInfo::new("/", "buscar").with_priority(40),
      ShortcutInfo::new("s", "status").with_priority(50),
      ShortcutInfo::new("r", "atualizar").with_priority(60),
      ShortcutInfo::new("q", "voltar").with_priority(70),
    ]
  }
}
