//! Local form validation.
//!
//! Each draft holds what the user typed, as strings, and `validate` turns it
//! into the typed request body. Nothing here talks to the network: a draft
//! that fails validation never reaches a mutation.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use crate::api::types::{
  AppointmentInput, AppointmentStatus, AppointmentType, CreatePayment, Exercise, Gender,
  InstructorInput, PaymentType, ProgressInput, Role, StudentInput, WorkoutPlanInput,
};

/// A form field the user has to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
  pub field: &'static str,
  pub message: String,
}

impl ValidationError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self {
      field,
      message: message.into(),
    }
  }
}

type Validated<T> = Result<T, ValidationError>;

fn required(field: &'static str, value: &str, message: &str) -> Validated<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(ValidationError::new(field, message));
  }
  Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
  let value = value.trim();
  (!value.is_empty()).then(|| value.to_string())
}

/// Parse a decimal, accepting a comma separator ("72,5").
fn parse_decimal(field: &'static str, value: &str) -> Validated<Option<f64>> {
  let value = value.trim();
  if value.is_empty() {
    return Ok(None);
  }
  value
    .replace(',', ".")
    .parse::<f64>()
    .ok()
    .filter(|n| n.is_finite())
    .map(Some)
    .ok_or_else(|| ValidationError::new(field, format!("Valor inválido: {}", value)))
}

fn parse_date(field: &'static str, value: &str, message: &str) -> Validated<NaiveDate> {
  NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
    .map_err(|_| ValidationError::new(field, message))
}

fn parse_time(field: &'static str, value: &str, message: &str) -> Validated<NaiveTime> {
  NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| ValidationError::new(field, message))
}

fn looks_like_email(value: &str) -> bool {
  match value.split_once('@') {
    Some((user, domain)) => !user.is_empty() && !domain.is_empty(),
    None => false,
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentDraft {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub date_of_birth: String,
  pub gender: Option<Gender>,
  pub address: String,
  pub emergency_contact: String,
  pub emergency_phone: String,
  pub medical_restrictions: String,
  pub objectives: String,
}

impl StudentDraft {
  pub fn validate(&self) -> Validated<StudentInput> {
    let name = required("name", &self.name, "O nome é obrigatório")?;
    let email = required("email", &self.email, "O email é obrigatório")?;
    if !looks_like_email(&email) {
      return Err(ValidationError::new("email", "Email inválido"));
    }

    let date_of_birth = match optional(&self.date_of_birth) {
      Some(date) => Some(
        parse_date("dateOfBirth", &date, "Data de nascimento inválida")?
          .format("%Y-%m-%d")
          .to_string(),
      ),
      None => None,
    };

    Ok(StudentInput {
      name,
      email,
      phone: optional(&self.phone),
      date_of_birth,
      gender: self.gender,
      address: optional(&self.address),
      emergency_contact: optional(&self.emergency_contact),
      emergency_phone: optional(&self.emergency_phone),
      medical_restrictions: optional(&self.medical_restrictions),
      objectives: optional(&self.objectives),
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructorDraft {
  pub name: String,
  pub email: String,
  pub password: String,
  pub role: Option<Role>,
  /// Editing an existing instructor; an empty password keeps the current one
  pub editing: bool,
}

impl InstructorDraft {
  pub fn validate(&self) -> Validated<InstructorInput> {
    let name = required("name", &self.name, "O nome é obrigatório")?;
    let email = required("email", &self.email, "O email é obrigatório")?;
    if !looks_like_email(&email) {
      return Err(ValidationError::new("email", "Email inválido"));
    }

    let password = match optional(&self.password) {
      Some(password) if password.len() < 6 => {
        return Err(ValidationError::new(
          "password",
          "A senha deve ter pelo menos 6 caracteres",
        ))
      }
      Some(password) => Some(password),
      None if self.editing => None,
      None => return Err(ValidationError::new("password", "A senha é obrigatória")),
    };

    let role = self
      .role
      .ok_or_else(|| ValidationError::new("role", "Selecione uma função"))?;

    Ok(InstructorInput {
      name,
      email,
      password,
      role,
      avatar: None,
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentDraft {
  pub title: String,
  pub student_id: String,
  pub instructor_id: String,
  pub kind: AppointmentType,
  /// YYYY-MM-DD, local calendar day
  pub date: String,
  /// HH:MM, local wall clock
  pub start: String,
  pub end: String,
  pub notes: String,
  pub status: Option<AppointmentStatus>,
}

impl AppointmentDraft {
  pub fn validate(&self) -> Validated<AppointmentInput> {
    let title = required("title", &self.title, "O título é obrigatório")?;
    let student_id = required("studentId", &self.student_id, "Selecione um aluno")?;
    let instructor_id = required("instructorId", &self.instructor_id, "Selecione um instrutor")?;
    let date = parse_date("date", &self.date, "Data inválida")?;

    required("startTime", &self.start, "Selecione o horário de início")?;
    required("endTime", &self.end, "Selecione o horário de fim")?;
    let start = date.and_time(parse_time("startTime", &self.start, "Data de início inválida")?);
    let end = date.and_time(parse_time("endTime", &self.end, "Data de fim inválida")?);

    if end <= start {
      return Err(ValidationError::new(
        "endTime",
        "O horário de fim deve ser maior que o horário de início",
      ));
    }

    Ok(AppointmentInput {
      title,
      student_id,
      instructor_id,
      kind: self.kind,
      start_time: local_to_utc(start, "startTime")?,
      end_time: local_to_utc(end, "endTime")?,
      notes: optional(&self.notes),
      status: self.status,
    })
  }
}

/// Interpret a wall-clock time in the local zone and render it as UTC RFC 3339.
fn local_to_utc(datetime: NaiveDateTime, field: &'static str) -> Validated<String> {
  Local
    .from_local_datetime(&datetime)
    .earliest()
    .map(|local| {
      local
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
    })
    .ok_or_else(|| ValidationError::new(field, "Horário inexistente no fuso local"))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentDraft {
  pub student_id: String,
  pub amount: String,
  pub due_date: String,
  pub description: String,
  pub kind: PaymentType,
}

impl PaymentDraft {
  pub fn validate(&self) -> Validated<CreatePayment> {
    const MISSING: &str = "Preencha todos os campos obrigatórios";

    let student_id = required("studentId", &self.student_id, MISSING)?;
    let amount = parse_decimal("amount", &self.amount)?
      .ok_or_else(|| ValidationError::new("amount", MISSING))?;
    if amount <= 0.0 {
      return Err(ValidationError::new("amount", "O valor deve ser maior que zero"));
    }
    required("dueDate", &self.due_date, MISSING)?;
    let due_date = parse_date("dueDate", &self.due_date, "Data de vencimento inválida")?;

    Ok(CreatePayment {
      student_id,
      amount,
      due_date: due_date.format("%Y-%m-%d").to_string(),
      description: optional(&self.description),
      kind: self.kind,
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressDraft {
  pub student_id: String,
  pub weight: String,
  pub body_fat: String,
  pub muscle_mass: String,
  pub chest: String,
  pub waist: String,
  pub hip: String,
  pub thigh: String,
  pub arm: String,
  pub notes: String,
  pub photos: Vec<String>,
}

impl ProgressDraft {
  pub fn validate(&self) -> Validated<ProgressInput> {
    let student_id = required("studentId", &self.student_id, "Selecione um aluno e informe o peso")?;
    let weight = parse_decimal("weight", &self.weight)?
      .filter(|w| *w > 0.0)
      .ok_or_else(|| ValidationError::new("weight", "Informe o peso"))?;

    Ok(ProgressInput {
      student_id,
      weight: Some(weight),
      body_fat: parse_decimal("bodyFat", &self.body_fat)?,
      muscle_mass: parse_decimal("muscleMass", &self.muscle_mass)?,
      chest: parse_decimal("chest", &self.chest)?,
      waist: parse_decimal("waist", &self.waist)?,
      hip: parse_decimal("hip", &self.hip)?,
      thigh: parse_decimal("thigh", &self.thigh)?,
      arm: parse_decimal("arm", &self.arm)?,
      photos: self.photos.clone(),
      notes: optional(&self.notes),
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseDraft {
  pub name: String,
  pub sets: String,
  pub reps: String,
  pub weight: String,
  pub rest_time: String,
  pub instructions: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutPlanDraft {
  pub name: String,
  pub description: String,
  pub student_id: String,
  pub instructor_id: String,
  pub exercises: Vec<ExerciseDraft>,
}

impl WorkoutPlanDraft {
  pub fn validate(&self) -> Validated<WorkoutPlanInput> {
    let name = self.name.trim();
    if name.chars().count() < 2 {
      return Err(ValidationError::new(
        "name",
        "O nome do plano deve ter pelo menos 2 caracteres",
      ));
    }
    let student_id = required("studentId", &self.student_id, "Selecione um aluno")?;
    let instructor_id = required("instructorId", &self.instructor_id, "Selecione um instrutor")?;

    if self.exercises.is_empty() {
      return Err(ValidationError::new(
        "exercises",
        "Adicione pelo menos um exercício",
      ));
    }

    let exercises = self
      .exercises
      .iter()
      .enumerate()
      .map(|(i, e)| e.validate(i as u32 + 1))
      .collect::<Validated<Vec<_>>>()?;

    Ok(WorkoutPlanInput {
      name: name.to_string(),
      description: optional(&self.description),
      student_id,
      instructor_id,
      exercises,
    })
  }
}

impl ExerciseDraft {
  fn validate(&self, order: u32) -> Validated<Exercise> {
    let name = required("exercises", &self.name, "Todos os exercícios devem ter um nome")?;
    let sets = self
      .sets
      .trim()
      .parse::<u32>()
      .ok()
      .filter(|s| *s >= 1)
      .ok_or_else(|| {
        ValidationError::new("exercises", "Todos os exercícios devem ter pelo menos 1 série")
      })?;
    let reps = required(
      "exercises",
      &self.reps,
      "Todos os exercícios devem ter repetições definidas",
    )?;

    Ok(Exercise {
      id: String::new(),
      name,
      sets,
      reps,
      weight: optional(&self.weight),
      rest_time: optional(&self.rest_time),
      instructions: optional(&self.instructions),
      order,
    })
  }
}

/// Parse the one-line exercise list of the plan form.
///
/// Exercises are separated by `;`, their fields by `|` in the order
/// `name|sets|reps|weight|rest|notes`. Missing trailing fields are blank.
pub fn parse_exercises(text: &str) -> Vec<ExerciseDraft> {
  text
    .split(';')
    .filter(|entry| !entry.trim().is_empty())
    .map(|entry| {
      let mut fields = entry.split('|').map(|f| f.trim().to_string());
      let mut next = || fields.next().unwrap_or_default();
      ExerciseDraft {
        name: next(),
        sets: next(),
        reps: next(),
        weight: next(),
        rest_time: next(),
        instructions: next(),
      }
    })
    .collect()
}

/// Inverse of [`parse_exercises`], used to prefill the edit form.
pub fn format_exercises(exercises: &[Exercise]) -> String {
  exercises
    .iter()
    .map(|e| {
      let fields = [
        e.name.as_str(),
        &e.sets.to_string(),
        e.reps.as_str(),
        e.weight.as_deref().unwrap_or(""),
        e.rest_time.as_deref().unwrap_or(""),
        e.instructions.as_deref().unwrap_or(""),
      ]
      .join("|");
      fields.trim_end_matches('|').to_string()
    })
    .collect::<Vec<_>>()
    .join("; ")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exercise() -> ExerciseDraft {
    ExerciseDraft {
      name: "Agachamento".to_string(),
      sets: "3".to_string(),
      reps: "12".to_string(),
      ..Default::default()
    }
  }

  fn plan() -> WorkoutPlanDraft {
    WorkoutPlanDraft {
      name: "Hipertrofia A".to_string(),
      student_id: "s1".to_string(),
      instructor_id: "i1".to_string(),
      exercises: vec![exercise()],
      ..Default::default()
    }
  }

  #[test]
  fn test_student_requires_name_and_email() {
    let draft = StudentDraft {
      email: "ana@gym.com".to_string(),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().field, "name");

    let draft = StudentDraft {
      name: "Ana".to_string(),
      email: "ana.gym.com".to_string(),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().message, "Email inválido");
  }

  #[test]
  fn test_student_trims_and_drops_blank_fields() {
    let input = StudentDraft {
      name: "  Ana  ".to_string(),
      email: "ana@gym.com".to_string(),
      phone: "   ".to_string(),
      date_of_birth: "1990-05-01".to_string(),
      ..Default::default()
    }
    .validate()
    .unwrap();

    assert_eq!(input.name, "Ana");
    assert_eq!(input.phone, None);
    assert_eq!(input.date_of_birth.as_deref(), Some("1990-05-01"));
  }

  #[test]
  fn test_instructor_password_only_required_on_create() {
    let mut draft = InstructorDraft {
      name: "Bruno".to_string(),
      email: "bruno@gym.com".to_string(),
      role: Some(Role::Instructor),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().field, "password");

    draft.editing = true;
    assert_eq!(draft.validate().unwrap().password, None);

    draft.password = "123".to_string();
    assert_eq!(draft.validate().unwrap_err().field, "password");
  }

  #[test]
  fn test_instructor_requires_role() {
    let draft = InstructorDraft {
      name: "Bruno".to_string(),
      email: "bruno@gym.com".to_string(),
      password: "segredo".to_string(),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().field, "role");
  }

  #[test]
  fn test_appointment_end_after_start() {
    let draft = AppointmentDraft {
      title: "Avaliação".to_string(),
      student_id: "s1".to_string(),
      instructor_id: "i1".to_string(),
      date: "2025-03-10".to_string(),
      start: "10:00".to_string(),
      end: "10:00".to_string(),
      ..Default::default()
    };
    assert_eq!(
      draft.validate().unwrap_err().message,
      "O horário de fim deve ser maior que o horário de início"
    );

    let draft = AppointmentDraft {
      end: "11:00".to_string(),
      ..draft
    };
    let input = draft.validate().unwrap();
    assert!(input.start_time.ends_with('Z'));
    assert!(input.start_time < input.end_time);
  }

  #[test]
  fn test_appointment_missing_fields() {
    let draft = AppointmentDraft {
      title: "Aula".to_string(),
      instructor_id: "i1".to_string(),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().message, "Selecione um aluno");

    let draft = AppointmentDraft {
      student_id: "s1".to_string(),
      date: "2025-03-10".to_string(),
      ..draft
    };
    assert_eq!(
      draft.validate().unwrap_err().message,
      "Selecione o horário de início"
    );
  }

  #[test]
  fn test_payment_amount_must_be_positive() {
    let draft = PaymentDraft {
      student_id: "s1".to_string(),
      amount: "0".to_string(),
      due_date: "2025-03-01".to_string(),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().field, "amount");

    let draft = PaymentDraft {
      amount: "149,90".to_string(),
      ..draft
    };
    assert!((draft.validate().unwrap().amount - 149.9).abs() < 1e-9);
  }

  #[test]
  fn test_payment_due_date_format() {
    let draft = PaymentDraft {
      student_id: "s1".to_string(),
      amount: "100".to_string(),
      due_date: "01/03/2025".to_string(),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().field, "dueDate");
  }

  #[test]
  fn test_progress_requires_weight() {
    let draft = ProgressDraft {
      student_id: "s1".to_string(),
      ..Default::default()
    };
    assert_eq!(draft.validate().unwrap_err().message, "Informe o peso");

    let draft = ProgressDraft {
      weight: "-3".to_string(),
      ..draft
    };
    assert_eq!(draft.validate().unwrap_err().message, "Informe o peso");

    let draft = ProgressDraft {
      weight: "72.5".to_string(),
      waist: "abc".to_string(),
      ..draft
    };
    assert_eq!(draft.validate().unwrap_err().field, "waist");
  }

  #[test]
  fn test_plan_name_length() {
    let draft = WorkoutPlanDraft {
      name: " A ".to_string(),
      ..plan()
    };
    assert_eq!(
      draft.validate().unwrap_err().message,
      "O nome do plano deve ter pelo menos 2 caracteres"
    );
  }

  #[test]
  fn test_plan_needs_exercises() {
    let draft = WorkoutPlanDraft {
      exercises: vec![],
      ..plan()
    };
    assert_eq!(
      draft.validate().unwrap_err().message,
      "Adicione pelo menos um exercício"
    );
  }

  #[test]
  fn test_plan_exercise_rules() {
    let cases = [
      (
        ExerciseDraft {
          name: " ".to_string(),
          ..exercise()
        },
        "Todos os exercícios devem ter um nome",
      ),
      (
        ExerciseDraft {
          sets: "0".to_string(),
          ..exercise()
        },
        "Todos os exercícios devem ter pelo menos 1 série",
      ),
      (
        ExerciseDraft {
          reps: "".to_string(),
          ..exercise()
        },
        "Todos os exercícios devem ter repetições definidas",
      ),
    ];

    for (bad, message) in cases {
      let draft = WorkoutPlanDraft {
        exercises: vec![exercise(), bad],
        ..plan()
      };
      assert_eq!(draft.validate().unwrap_err().message, message);
    }
  }

  #[test]
  fn test_plan_orders_exercises() {
    let input = WorkoutPlanDraft {
      exercises: vec![exercise(), exercise()],
      ..plan()
    }
    .validate()
    .unwrap();
    let orders: Vec<u32> = input.exercises.iter().map(|e| e.order).collect();
    assert_eq!(orders, vec![1, 2]);
  }

  #[test]
  fn test_parse_exercises() {
    let drafts = parse_exercises("Supino | 4 | 10 | 40kg ; Remada|3|12||60|Costas retas;  ");
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].name, "Supino");
    assert_eq!(drafts[0].weight, "40kg");
    assert_eq!(drafts[0].instructions, "");
    assert_eq!(drafts[1].rest_time, "60");
    assert_eq!(drafts[1].instructions, "Costas retas");

    let input = WorkoutPlanDraft {
      exercises: drafts,
      ..plan()
    }
    .validate()
    .unwrap();
    assert_eq!(input.exercises[1].sets, 3);
  }

  #[test]
  fn test_format_exercises_prefills_parse() {
    let exercises = vec![Exercise {
      name: "Agachamento".to_string(),
      sets: 3,
      reps: "12".to_string(),
      rest_time: Some("90".to_string()),
      ..Default::default()
    }];
    let text = format_exercises(&exercises);
    assert_eq!(text, "Agachamento|3|12||90");
    assert_eq!(parse_exercises(&text)[0].rest_time, "90");
  }
}
