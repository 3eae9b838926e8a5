use std::path::Path;

use crate::api::types::{ProgressInput, ProgressRecord, Student};
use crate::forms::{ProgressDraft, ValidationError};
use crate::imaging::{self, PhotoFile};
use crate::query::{Mutation, Query};
use crate::resources::progress::ProgressFilters;
use crate::resources::Gym;
use crate::ui::components::{Choice, Confirm, Field, Form, FormEvent, KeyResult};
use crate::ui::renderfns::utils::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{short_date, student_choices, ListPanel};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};
use serde_json::Value;
use tracing::debug;

/// Body measurements over time, with optional photos
pub struct ProgressView {
  list: ListPanel<ProgressRecord>,
  students: Query<Vec<Student>>,
  form: Form,
  confirm: Confirm<String>,
  /// Record being edited and the photos it already has
  editing: Option<(String, Vec<String>)>,
  create: Mutation<ProgressInput, Value>,
  update: Mutation<(String, ProgressInput), Value>,
  delete: Mutation<String, Value>,
}

fn number(value: Option<f64>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

fn measure(value: Option<f64>, unit: &str) -> String {
  value
    .map(|v| format!("{:.1}{}", v, unit))
    .unwrap_or_else(|| "-".to_string())
}

/// Read, check and downscale the comma-separated photo paths typed in the form
fn load_photos(paths: &str, existing: usize) -> Result<Vec<String>, ValidationError> {
  let paths: Vec<&str> = paths
    .split(',')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .collect();
  if paths.is_empty() {
    return Ok(Vec::new());
  }

  let invalid = |e: imaging::ImageError| ValidationError::new("photos", e.to_string());
  imaging::check_photo_limit(existing, paths.len()).map_err(invalid)?;

  let files = paths
    .iter()
    .map(|p| PhotoFile::read(Path::new(p)))
    .collect::<Result<Vec<_>, _>>()
    .map_err(invalid)?;
  imaging::validate_photos(&files).map_err(invalid)?;

  files
    .iter()
    .map(|f| {
      debug!(file = %f.name, bytes = f.size(), "preparing progress photo");
      imaging::prepare_photo(f).map_err(invalid)
    })
    .collect()
}

impl ProgressView {
  pub fn new(gym: Gym) -> Self {
    let mut students = gym.students();
    students.fetch();

    Self {
      list: ListPanel::new("Evolução", gym.progress_records(ProgressFilters::default())),
      students,
      form: Form::new(),
      confirm: Confirm::new(),
      editing: None,
      create: gym.create_progress(),
      update: gym.update_progress(),
      delete: gym.delete_progress(),
    }
  }

  fn fields(&self, record: Option<&ProgressRecord>) -> Vec<Field> {
    let mut students = student_choices(self.students.data());
    students.insert(0, Choice::new("", "(selecione)"));
    let value = |get: fn(&ProgressRecord) -> Option<f64>| number(record.and_then(get));
    let photos_label = if record.is_some() {
      "Adicionar fotos (caminhos, separados por vírgula)"
    } else {
      "Fotos (caminhos, separados por vírgula)"
    };

    vec![
      Field::select("studentId", "Aluno", students)
        .with_value(record.map(|r| r.student_id.as_str()).unwrap_or("")),
      Field::text("weight", "Peso (kg)").with_value(&value(|r| r.weight)),
      Field::text("bodyFat", "Gordura (%)").with_value(&value(|r| r.body_fat)),
      Field::text("muscleMass", "Massa magra (kg)").with_value(&value(|r| r.muscle_mass)),
      Field::text("chest", "Peito (cm)").with_value(&value(|r| r.chest)),
      Field::text("waist", "Cintura (cm)").with_value(&value(|r| r.waist)),
      Field::text("hip", "Quadril (cm)").with_value(&value(|r| r.hip)),
      Field::text("thigh", "Coxa (cm)").with_value(&value(|r| r.thigh)),
      Field::text("arm", "Braço (cm)").with_value(&value(|r| r.arm)),
      Field::text("notes", "Observações")
        .with_value(record.and_then(|r| r.notes.as_deref()).unwrap_or("")),
      Field::text("photos", photos_label),
    ]
  }

  fn draft(&self, photos: Vec<String>) -> ProgressDraft {
    ProgressDraft {
      student_id: self.form.value("studentId"),
      weight: self.form.value("weight"),
      body_fat: self.form.value("bodyFat"),
      muscle_mass: self.form.value("muscleMass"),
      chest: self.form.value("chest"),
      waist: self.form.value("waist"),
      hip: self.form.value("hip"),
      thigh: self.form.value("thigh"),
      arm: self.form.value("arm"),
      notes: self.form.value("notes"),
      photos,
    }
  }

  fn submit(&mut self) {
    let mut photos = self
      .editing
      .as_ref()
      .map(|(_, existing)| existing.clone())
      .unwrap_or_default();

    let input = load_photos(&self.form.value("photos"), photos.len()).and_then(|added| {
      photos.extend(added);
      self.draft(photos).validate()
    });
    let input = match input {
      Ok(input) => input,
      Err(error) => {
        self.form.fail(&error);
        return;
      }
    };

    self.form.set_busy();
    match self.editing.as_ref() {
      Some((id, _)) => self.update.mutate((id.clone(), input)),
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
        self.form.open("Novo registro de evolução", fields);
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let record = self.list.selected()?.clone();
        self.editing = Some((record.id.clone(), record.photos.clone()));
        let fields = self.fields(Some(&record));
        self.form.open("Editar registro", fields);
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let record = self.list.selected()?;
        let who = record.student.as_ref().map(|s| s.name.as_str()).unwrap_or("aluno");
        let question = format!("Excluir o registro de {} em {}?", who, short_date(&record.record_date));
        let id = record.id.clone();
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
      Some(Err(error)) => self.form.fail_with(error.user_message("Erro ao salvar registro")),
      None => {}
    }
    let _ = self.delete.poll();
  }
}

impl View for ProgressView {
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
      &["Data", "Aluno", "Peso", "Gordura", "Massa magra", "Cintura", "Fotos"],
      &[
        Constraint::Length(11),
        Constraint::Fill(2),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(6),
      ],
      |r| {
        Row::new(vec![
          Cell::from(short_date(&r.record_date)),
          Cell::from(truncate(
            r.student.as_ref().map(|s| s.name.as_str()).unwrap_or(""),
            40,
          )),
          Cell::from(measure(r.weight, " kg")),
          Cell::from(measure(r.body_fat, "%")),
          Cell::from(measure(r.muscle_mass, " kg")),
          Cell::from(measure(r.waist, " cm")),
          Cell::from(r.photos.len().to_string()),
        ])
      },
    );
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Evolução".to_string()
  }

  fn tick(&mut self) {
    self.list.tick();
    self.students.poll();
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
      ShortcutInfo::new("r", "atualizar").with_priority(50),
      ShortcutInfo::new("q", "voltar").with_priority(60),
    ]
  }
}
