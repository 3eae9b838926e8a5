use crate::api::types::{CopyPlan, Instructor, Student, WorkoutPlan, WorkoutPlanInput};
use crate::forms::{format_exercises, parse_exercises, WorkoutPlanDraft};
use crate::query::{Mutation, Query};
use crate::resources::workout_plans::WorkoutPlanFilters;
use crate::resources::Gym;
use crate::ui::components::{Choice, Confirm, Field, Form, FormEvent, KeyResult, Picker, PickerEvent};
use crate::ui::renderfns::utils::{plan_status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{instructor_choices, student_choices, ListPanel};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};
use serde_json::Value;

/// Training plans: edit, pause/resume, and copy to another student
pub struct WorkoutPlansView {
  list: ListPanel<WorkoutPlan>,
  students: Query<Vec<Student>>,
  instructors: Query<Vec<Instructor>>,
  form: Form,
  confirm: Confirm<String>,
  copy_picker: Picker,
  /// Plan id and name while the copy target is being picked
  copying: Option<(String, String)>,
  editing: Option<String>,
  create: Mutation<WorkoutPlanInput, WorkoutPlan>,
  update: Mutation<(String, WorkoutPlanInput), WorkoutPlan>,
  delete: Mutation<String, Value>,
  toggle: Mutation<String, WorkoutPlan>,
  copy: Mutation<(String, CopyPlan), WorkoutPlan>,
}

fn with_blank(mut choices: Vec<Choice>) -> Vec<Choice> {
  choices.insert(0, Choice::new("", "(selecione)"));
  choices
}

impl WorkoutPlansView {
  pub fn new(gym: Gym) -> Self {
    let mut students = gym.students();
    let mut instructors = gym.instructors();
    students.fetch();
    instructors.fetch();

    Self {
      list: ListPanel::new(
        "Planos de treino",
        gym.workout_plans(WorkoutPlanFilters::default()),
      ),
      students,
      instructors,
      form: Form::new(),
      confirm: Confirm::new(),
      copy_picker: Picker::new(),
      copying: None,
      editing: None,
      create: gym.create_workout_plan(),
      update: gym.update_workout_plan(),
      delete: gym.delete_workout_plan(),
      toggle: gym.toggle_workout_plan(),
      copy: gym.copy_workout_plan(),
    }
  }

  fn fields(&self, plan: Option<&WorkoutPlan>) -> Vec<Field> {
    vec![
      Field::text("name", "Nome").with_value(plan.map(|p| p.name.as_str()).unwrap_or("")),
      Field::text("description", "Descrição")
        .with_value(plan.and_then(|p| p.description.as_deref()).unwrap_or("")),
      Field::select("studentId", "Aluno", with_blank(student_choices(self.students.data())))
        .with_value(plan.map(|p| p.student.id.as_str()).unwrap_or("")),
      Field::select(
        "instructorId",
        "Instrutor",
        with_blank(instructor_choices(self.instructors.data())),
      )
      .with_value(plan.map(|p| p.instructor.id.as_str()).unwrap_or("")),
      Field::text("exercises", "Exercícios (nome|séries|reps|carga|descanso|obs; ...)")
        .with_value(&plan.map(|p| format_exercises(&p.exercises)).unwrap_or_default()),
    ]
  }

  fn submit(&mut self) {
    let draft = WorkoutPlanDraft {
      name: self.form.value("name"),
      description: self.form.value("description"),
      student_id: self.form.value("studentId"),
      instructor_id: self.form.value("instructorId"),
      exercises: parse_exercises(&self.form.value("exercises")),
    };
    let input = match draft.validate() {
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
    match self.copy_picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(student_id)) => {
        if let Some((id, name)) = self.copying.take() {
          let copy = CopyPlan {
            student_id,
            name: format!("{} (cópia)", name),
          };
          self.copy.mutate((id, copy));
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(PickerEvent::Cancelled) => {
        self.copying = None;
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

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
        self.form.open("Novo plano de treino", fields);
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let plan = self.list.selected()?.clone();
        self.editing = Some(plan.id.clone());
        let fields = self.fields(Some(&plan));
        self.form.open(format!("Editar {}", plan.name), fields);
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let plan = self.list.selected()?;
        let question = format!("Excluir o plano \"{}\"?", plan.name);
        let id = plan.id.clone();
        self.confirm.ask(question, id);
        Some(ViewAction::None)
      }
      KeyCode::Char('t') => {
        let id = self.list.selected()?.id.clone();
        self.toggle.mutate(id);
        Some(ViewAction::None)
      }
      KeyCode::Char('c') => {
        let plan = self.list.selected()?;
        self.copying = Some((plan.id.clone(), plan.name.clone()));
        let students = student_choices(self.students.data());
        self.copy_picker.show("Copiar para o aluno", students);
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
      Some(Err(error)) => self.form.fail_with(error.user_message("Erro ao salvar plano")),
      None => {}
    }
    let _ = self.delete.poll();
    let _ = self.toggle.poll();
    let _ = self.copy.poll();
  }
}

impl View for WorkoutPlansView {
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
      &["Nome", "Aluno", "Instrutor", "Exercícios", "Status"],
      &[
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(11),
        Constraint::Length(10),
      ],
      |p| {
        Row::new(vec![
          Cell::from(truncate(&p.name, 40)),
          Cell::from(truncate(&p.student.name, 30)),
          Cell::from(truncate(&p.instructor.name, 30)),
          Cell::from(p.exercises.len().to_string()),
          Cell::from(p.status.label()).style(Style::default().fg(plan_status_color(p.status))),
        ])
      },
    );
    self.form.render_overlay(frame, area);
    self.copy_picker.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Planos de treino".to_string()
  }

  fn tick(&mut self) {
    self.list.tick();
    self.students.poll();
    self.instructors.poll();
    self.settle_mutations();
  }

  fn is_capturing_input(&self) -> bool {
    self.form.is_active()
      || self.copy_picker.is_active()
      || self.confirm.is_active()
      || self.list.is_searching()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("n", "novo").with_priority(10),
      ShortcutInfo::new("e", "editar").with_priority(20),
      ShortcutInfo::new("t", "ativar/pausar").with_priority(30),
      ShortcutInfo::new("c", "copiar").with_priority(40),
      ShortcutInfo::new("d", "excluir").with_priority(50),
      ShortcutInfo::new("s", "status").with_priority(60),
      ShortcutInfo::new("q", "voltar").with_priority(70),
    ]
  }
}
