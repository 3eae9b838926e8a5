//! Records exchanged with the GymCRM backend.
//!
//! All records are snapshots owned by the server; the console never edits
//! them in place, it replaces them wholesale on refetch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lightweight reference embedded in other records (student, instructor)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pagination {
  pub page: u32,
  pub limit: u32,
  pub total: u64,
  pub pages: u32,
}

// ============================================================================
// Students
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
  Male,
  Female,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
  #[default]
  Active,
  Inactive,
  Suspended,
  Pending,
  #[serde(other)]
  Unknown,
}

impl StudentStatus {
  pub const ALL: [StudentStatus; 4] = [
    StudentStatus::Active,
    StudentStatus::Inactive,
    StudentStatus::Suspended,
    StudentStatus::Pending,
  ];

  pub fn label(self) -> &'static str {
    match self {
      StudentStatus::Active => "Ativo",
      StudentStatus::Inactive => "Inativo",
      StudentStatus::Suspended => "Suspenso",
      StudentStatus::Pending => "Pendente",
      StudentStatus::Unknown => "?",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
  pub id: String,
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub date_of_birth: Option<String>,
  pub gender: Option<Gender>,
  pub address: Option<String>,
  pub emergency_contact: Option<String>,
  pub emergency_phone: Option<String>,
  pub medical_restrictions: Option<String>,
  pub objectives: Option<String>,
  #[serde(default)]
  pub status: StudentStatus,
  pub registration_date: Option<String>,
  pub instructor_id: Option<String>,
}

/// Body for `POST /students` and `PUT /students/{id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
  pub name: String,
  pub email: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_of_birth: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gender: Option<Gender>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emergency_contact: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emergency_phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub medical_restrictions: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub objectives: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentList {
  #[serde(default)]
  pub students: Vec<Student>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentEnvelope {
  pub student: Option<Student>,
  pub message: Option<String>,
}

// ============================================================================
// Instructors (backend "users")
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Admin,
  Manager,
  #[default]
  Instructor,
}

impl Role {
  pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Instructor];

  pub fn label(self) -> &'static str {
    match self {
      Role::Admin => "Administrador",
      Role::Manager => "Gerente",
      Role::Instructor => "Instrutor",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
  pub id: String,
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub role: Role,
  pub avatar: Option<String>,
  pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorInput {
  pub name: String,
  pub email: String,
  /// Required on create; omitted on update to keep the current password
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  pub role: Role,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorStats {
  #[serde(default)]
  pub students_count: u64,
  #[serde(default)]
  pub appointments_count: u64,
  #[serde(default)]
  pub workout_plans_count: u64,
  #[serde(default)]
  pub students_with_active_payments: u64,
  #[serde(default)]
  pub overdue_payments: u64,
}

// ============================================================================
// Appointments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
  #[default]
  PersonalTraining,
  GroupClass,
  Evaluation,
  Consultation,
}

impl AppointmentType {
  pub const ALL: [AppointmentType; 4] = [
    AppointmentType::PersonalTraining,
    AppointmentType::GroupClass,
    AppointmentType::Evaluation,
    AppointmentType::Consultation,
  ];

  pub fn label(self) -> &'static str {
    match self {
      AppointmentType::PersonalTraining => "Personal",
      AppointmentType::GroupClass => "Aula em grupo",
      AppointmentType::Evaluation => "Avaliação",
      AppointmentType::Consultation => "Consulta",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
  #[default]
  Scheduled,
  Completed,
  Cancelled,
  NoShow,
}

impl AppointmentStatus {
  pub const ALL: [AppointmentStatus; 4] = [
    AppointmentStatus::Scheduled,
    AppointmentStatus::Completed,
    AppointmentStatus::Cancelled,
    AppointmentStatus::NoShow,
  ];

  pub fn label(self) -> &'static str {
    match self {
      AppointmentStatus::Scheduled => "Agendado",
      AppointmentStatus::Completed => "Concluído",
      AppointmentStatus::Cancelled => "Cancelado",
      AppointmentStatus::NoShow => "Faltou",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
  pub id: String,
  pub title: String,
  pub start_time: String,
  pub end_time: String,
  #[serde(rename = "type", default)]
  pub kind: AppointmentType,
  #[serde(default)]
  pub status: AppointmentStatus,
  pub notes: Option<String>,
  #[serde(default)]
  pub student: PersonRef,
  #[serde(default)]
  pub instructor: PersonRef,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
  pub title: String,
  pub student_id: String,
  pub instructor_id: String,
  #[serde(rename = "type")]
  pub kind: AppointmentType,
  /// RFC 3339 in UTC
  pub start_time: String,
  pub end_time: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentList {
  #[serde(default)]
  pub appointments: Vec<Appointment>,
  pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentEnvelope {
  pub appointment: Option<Appointment>,
  pub message: Option<String>,
}

/// Free/busy answer for one instructor on one day.
///
/// The backend shape is loose; slots are kept as raw JSON objects.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
  #[serde(default)]
  pub busy_slots: Vec<serde_json::Value>,
  #[serde(default)]
  pub available_slots: Vec<serde_json::Value>,
}

// ============================================================================
// Payments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
  Paid,
  #[default]
  Pending,
  Overdue,
}

impl PaymentStatus {
  pub const ALL: [PaymentStatus; 3] = [
    PaymentStatus::Paid,
    PaymentStatus::Pending,
    PaymentStatus::Overdue,
  ];

  pub fn label(self) -> &'static str {
    match self {
      PaymentStatus::Paid => "Pago",
      PaymentStatus::Pending => "Pendente",
      PaymentStatus::Overdue => "Atrasado",
    }
  }

  pub fn as_param(self) -> &'static str {
    match self {
      PaymentStatus::Paid => "PAID",
      PaymentStatus::Pending => "PENDING",
      PaymentStatus::Overdue => "OVERDUE",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
  Cash,
  CreditCard,
  DebitCard,
  BankTransfer,
  Pix,
}

impl PaymentMethod {
  pub const ALL: [PaymentMethod; 5] = [
    PaymentMethod::Pix,
    PaymentMethod::Cash,
    PaymentMethod::CreditCard,
    PaymentMethod::DebitCard,
    PaymentMethod::BankTransfer,
  ];

  pub fn label(self) -> &'static str {
    match self {
      PaymentMethod::Cash => "Dinheiro",
      PaymentMethod::CreditCard => "Cartão de Crédito",
      PaymentMethod::DebitCard => "Cartão de Débito",
      PaymentMethod::BankTransfer => "Transferência",
      PaymentMethod::Pix => "PIX",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
  #[default]
  Monthly,
  Annual,
  Registration,
  Other,
}

impl PaymentType {
  pub const ALL: [PaymentType; 4] = [
    PaymentType::Monthly,
    PaymentType::Annual,
    PaymentType::Registration,
    PaymentType::Other,
  ];

  pub fn label(self) -> &'static str {
    match self {
      PaymentType::Monthly => "Mensalidade",
      PaymentType::Annual => "Anuidade",
      PaymentType::Registration => "Matrícula",
      PaymentType::Other => "Outro",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub id: String,
  pub amount: f64,
  pub due_date: String,
  pub paid_date: Option<String>,
  #[serde(default)]
  pub status: PaymentStatus,
  pub description: Option<String>,
  pub method: Option<PaymentMethod>,
  #[serde(default)]
  pub student_id: String,
  #[serde(default)]
  pub student: PersonRef,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayment {
  pub student_id: String,
  pub amount: f64,
  /// YYYY-MM-DD
  pub due_date: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind: PaymentType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayment {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub amount: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub due_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<PaymentStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<PaymentMethod>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub paid_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentList {
  #[serde(default)]
  pub payments: Vec<Payment>,
  pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEnvelope {
  pub payment: Payment,
  pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RevenueStats {
  #[serde(default)]
  pub total: f64,
  #[serde(default)]
  pub pending: f64,
  #[serde(default)]
  pub overdue: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PaymentCounts {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub paid: u64,
  #[serde(default)]
  pub pending: u64,
  #[serde(default)]
  pub overdue: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PaymentStats {
  #[serde(default)]
  pub revenue: RevenueStats,
  #[serde(default)]
  pub payments: PaymentCounts,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct OverdueCount {
  #[serde(default)]
  pub count: u64,
}

// ============================================================================
// Progress records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
  pub id: String,
  pub student_id: String,
  pub weight: Option<f64>,
  pub body_fat: Option<f64>,
  pub muscle_mass: Option<f64>,
  pub chest: Option<f64>,
  pub waist: Option<f64>,
  pub hip: Option<f64>,
  pub thigh: Option<f64>,
  pub arm: Option<f64>,
  #[serde(default)]
  pub photos: Vec<String>,
  pub notes: Option<String>,
  pub record_date: String,
  pub student: Option<PersonRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInput {
  pub student_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub body_fat: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub muscle_mass: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub chest: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub waist: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hip: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thigh: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub arm: Option<f64>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub photos: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressList {
  #[serde(default)]
  pub progress_records: Vec<ProgressRecord>,
  pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressHistory {
  #[serde(default, alias = "history")]
  pub progress_records: Vec<ProgressRecord>,
}

// ============================================================================
// Workout plans
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
  #[default]
  Active,
  Paused,
  Completed,
  Cancelled,
}

impl PlanStatus {
  pub fn as_param(self) -> &'static str {
    match self {
      PlanStatus::Active => "ACTIVE",
      PlanStatus::Paused => "PAUSED",
      PlanStatus::Completed => "COMPLETED",
      PlanStatus::Cancelled => "CANCELLED",
    }
  }

  pub const ALL: [PlanStatus; 4] = [
    PlanStatus::Active,
    PlanStatus::Paused,
    PlanStatus::Completed,
    PlanStatus::Cancelled,
  ];

  pub fn label(self) -> &'static str {
    match self {
      PlanStatus::Active => "Ativo",
      PlanStatus::Paused => "Pausado",
      PlanStatus::Completed => "Concluído",
      PlanStatus::Cancelled => "Cancelado",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
  #[serde(default, skip_serializing)]
  pub id: String,
  pub name: String,
  pub sets: u32,
  pub reps: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight: Option<String>,
  #[serde(default, deserialize_with = "rest_time", skip_serializing_if = "Option::is_none")]
  pub rest_time: Option<String>,
  /// Sent as `notes`, answered as `instructions`
  #[serde(
    rename(serialize = "notes", deserialize = "instructions"),
    alias = "notes",
    skip_serializing_if = "Option::is_none"
  )]
  pub instructions: Option<String>,
  #[serde(default, skip_serializing)]
  pub order: u32,
}

/// The backend answers `restTime` as a number of seconds but accepts strings.
fn rest_time<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::String(s)) => Some(s),
    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  #[serde(default)]
  pub status: PlanStatus,
  pub notes: Option<String>,
  #[serde(default)]
  pub student: PersonRef,
  #[serde(default)]
  pub instructor: PersonRef,
  #[serde(default)]
  pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanInput {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub student_id: String,
  pub instructor_id: String,
  pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPlan {
  pub student_id: String,
  pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanList {
  #[serde(default)]
  pub workout_plans: Vec<WorkoutPlan>,
  pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanEnvelope {
  pub workout_plan: WorkoutPlan,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
  PaymentDue,
  PaymentOverdue,
  AppointmentReminder,
  Birthday,
  PlanExpiring,
  #[default]
  #[serde(other)]
  General,
}

impl NotificationType {
  pub fn label(self) -> &'static str {
    match self {
      NotificationType::PaymentDue => "Vencimento",
      NotificationType::PaymentOverdue => "Atraso",
      NotificationType::AppointmentReminder => "Lembrete",
      NotificationType::Birthday => "Aniversário",
      NotificationType::PlanExpiring => "Plano expirando",
      NotificationType::General => "Geral",
    }
  }

  pub fn is_urgent(self) -> bool {
    matches!(
      self,
      NotificationType::PaymentOverdue | NotificationType::PlanExpiring
    )
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: String,
  pub title: String,
  pub message: String,
  #[serde(rename = "type", default)]
  pub kind: NotificationType,
  #[serde(default)]
  pub is_read: bool,
  pub created_at: String,
  pub student: Option<PersonRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationList {
  #[serde(default)]
  pub notifications: Vec<Notification>,
  pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub unread: u64,
  #[serde(default)]
  pub urgent: u64,
  #[serde(default)]
  pub by_type: BTreeMap<String, u64>,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StudentTotals {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub active: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RevenueTotals {
  #[serde(default)]
  pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentTotals {
  #[serde(default)]
  pub this_week: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DashboardOverview {
  #[serde(default)]
  pub students: StudentTotals,
  #[serde(default)]
  pub revenue: RevenueTotals,
  #[serde(default)]
  pub appointments: AppointmentTotals,
}

impl DashboardOverview {
  /// Scheduled classes this week per active student
  pub fn classes_per_student(&self) -> f64 {
    self.appointments.this_week as f64 / self.students.active.max(1) as f64
  }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub status: String,
  pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
  #[serde(default)]
  pub student: String,
  #[serde(default)]
  pub amount: f64,
  #[serde(default)]
  pub due_date_text: String,
}

// ============================================================================
// Auth and uploads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
  pub token: String,
  pub user: Option<Instructor>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
  #[serde(default)]
  pub filename: String,
  #[serde(default)]
  pub original_name: String,
  #[serde(default)]
  pub mimetype: String,
  #[serde(default)]
  pub size: u64,
  pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
  #[serde(default)]
  pub success: bool,
  pub message: Option<String>,
  pub file: Option<UploadedFile>,
  #[serde(default)]
  pub files: Vec<UploadedFile>,
}
