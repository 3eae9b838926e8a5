use super::keys::{APPOINTMENTS, DASHBOARD_OVERVIEW, INSTRUCTOR_AVAILABILITY, INSTRUCTOR_STATS};
use super::{push_opt, Gym};
use crate::api::types::{
  Appointment, AppointmentEnvelope, AppointmentInput, AppointmentList, AppointmentStatus,
  AppointmentType, Availability,
};
use crate::api::{ApiClient, ApiError, Params};
use crate::query::{Mutation, MutationDescriptor, Query, QueryKey, QueryPolicy};

/// Server-side filters for `GET /appointments`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilters {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub status: Option<AppointmentStatus>,
  pub kind: Option<AppointmentType>,
  pub student_id: Option<String>,
  pub instructor_id: Option<String>,
  /// YYYY-MM-DD
  pub start_date: Option<String>,
  pub end_date: Option<String>,
}

impl AppointmentFilters {
  pub fn params(&self) -> Params {
    let mut params = Params::new();
    push_opt(&mut params, "page", self.page);
    push_opt(&mut params, "limit", self.limit);
    push_opt(&mut params, "status", self.status.map(status_param));
    push_opt(&mut params, "type", self.kind.map(kind_param));
    push_opt(&mut params, "studentId", self.student_id.as_deref());
    push_opt(&mut params, "instructorId", self.instructor_id.as_deref());
    push_opt(&mut params, "startDate", self.start_date.as_deref());
    push_opt(&mut params, "endDate", self.end_date.as_deref());
    params
  }
}

fn status_param(status: AppointmentStatus) -> &'static str {
  match status {
    AppointmentStatus::Scheduled => "SCHEDULED",
    AppointmentStatus::Completed => "COMPLETED",
    AppointmentStatus::Cancelled => "CANCELLED",
    AppointmentStatus::NoShow => "NO_SHOW",
  }
}

fn kind_param(kind: AppointmentType) -> &'static str {
  match kind {
    AppointmentType::PersonalTraining => "PERSONAL_TRAINING",
    AppointmentType::GroupClass => "GROUP_CLASS",
    AppointmentType::Evaluation => "EVALUATION",
    AppointmentType::Consultation => "CONSULTATION",
  }
}

/// The backend signals a rejected write with a 2xx body lacking the record.
fn require_appointment(envelope: Option<AppointmentEnvelope>) -> Result<AppointmentEnvelope, ApiError> {
  match envelope {
    Some(envelope) if envelope.appointment.is_some() => Ok(envelope),
    _ => Err(ApiError::Decode("response has no appointment".to_string())),
  }
}

impl ApiClient {
  pub async fn list_appointments(
    &self,
    filters: &AppointmentFilters,
  ) -> Result<Vec<Appointment>, ApiError> {
    let list: Option<AppointmentList> = self.get("/appointments", &filters.params()).await?;
    Ok(list.unwrap_or_default().appointments)
  }

  pub async fn instructor_availability(
    &self,
    instructor_id: &str,
    date: &str,
  ) -> Result<Availability, ApiError> {
    let availability: Option<Availability> = self
      .get(
        &format!("/appointments/availability/{}", instructor_id),
        &vec![("date", date.to_string())],
      )
      .await?;
    Ok(availability.unwrap_or_default())
  }

  pub async fn create_appointment(
    &self,
    input: &AppointmentInput,
  ) -> Result<AppointmentEnvelope, ApiError> {
    require_appointment(self.post("/appointments", input).await?)
  }

  pub async fn update_appointment(
    &self,
    id: &str,
    input: &AppointmentInput,
  ) -> Result<AppointmentEnvelope, ApiError> {
    require_appointment(self.put(&format!("/appointments/{}", id), input).await?)
  }

  pub async fn delete_appointment(&self, id: &str) -> Result<AppointmentEnvelope, ApiError> {
    require_appointment(self.delete(&format!("/appointments/{}", id)).await?)
  }
}

pub fn appointments_key(filters: &AppointmentFilters) -> QueryKey {
  QueryKey::new(APPOINTMENTS).with_params(&filters.params())
}

pub fn availability_key(instructor_id: &str, date: &str) -> QueryKey {
  QueryKey::new(INSTRUCTOR_AVAILABILITY)
    .with("instructorId", instructor_id)
    .with("date", date)
}

fn write_descriptor(name: &'static str, success: &str, failure: &str) -> MutationDescriptor {
  MutationDescriptor::new(name, failure)
    .invalidating([
      QueryKey::new(APPOINTMENTS),
      QueryKey::new(INSTRUCTOR_AVAILABILITY),
      QueryKey::new(DASHBOARD_OVERVIEW),
      QueryKey::new(INSTRUCTOR_STATS),
    ])
    .with_success(success)
}

pub fn create_descriptor() -> MutationDescriptor {
  write_descriptor(
    "create-appointment",
    "Agendamento criado com sucesso.",
    "Erro ao criar agendamento.",
  )
}

pub fn update_descriptor() -> MutationDescriptor {
  write_descriptor(
    "update-appointment",
    "Agendamento atualizado com sucesso.",
    "Erro ao atualizar agendamento.",
  )
}

pub fn delete_descriptor() -> MutationDescriptor {
  write_descriptor(
    "delete-appointment",
    "Agendamento deletado com sucesso.",
    "Erro ao deletar agendamento.",
  )
}

impl Gym {
  pub fn appointments(&self, filters: AppointmentFilters) -> Query<Vec<Appointment>> {
    self.query(
      appointments_key(&filters),
      QueryPolicy::APPOINTMENTS,
      move |api| {
        let filters = filters.clone();
        async move { api.list_appointments(&filters).await }
      },
    )
  }

  pub fn instructor_availability(&self, instructor_id: &str, date: &str) -> Query<Availability> {
    let instructor_id = instructor_id.to_string();
    let date = date.to_string();
    let policy = QueryPolicy::DEFAULT.enabled(!instructor_id.is_empty() && !date.is_empty());
    self.query(availability_key(&instructor_id, &date), policy, move |api| {
      let (instructor_id, date) = (instructor_id.clone(), date.clone());
      async move { api.instructor_availability(&instructor_id, &date).await }
    })
  }

  pub fn create_appointment(&self) -> Mutation<AppointmentInput, AppointmentEnvelope> {
    self.mutation(create_descriptor(), |api, input: AppointmentInput| async move {
      api.create_appointment(&input).await
    })
  }

  pub fn update_appointment(&self) -> Mutation<(String, AppointmentInput), AppointmentEnvelope> {
    self.mutation(
      update_descriptor(),
      |api, (id, input): (String, AppointmentInput)| async move {
        api.update_appointment(&id, &input).await
      },
    )
  }

  pub fn delete_appointment(&self) -> Mutation<String, AppointmentEnvelope> {
    self.mutation(delete_descriptor(), |api, id: String| async move {
      api.delete_appointment(&id).await
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::cache::CacheWrite;
  use crate::resources::testing::gym;
  use std::sync::Arc;

  #[test]
  fn test_filter_params() {
    let filters = AppointmentFilters {
      status: Some(AppointmentStatus::NoShow),
      instructor_id: Some("i1".to_string()),
      ..Default::default()
    };
    assert_eq!(
      filters.params(),
      vec![
        ("status", "NO_SHOW".to_string()),
        ("instructorId", "i1".to_string())
      ]
    );
    assert_eq!(
      appointments_key(&filters),
      QueryKey::new("appointments")
        .with("instructorId", "i1")
        .with("status", "NO_SHOW")
    );
  }

  #[tokio::test]
  async fn test_write_without_record_is_failure() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("DELETE", "/appointments/a1")
      .with_body(r#"{"message":"ok"}"#)
      .create_async()
      .await;

    let (gym, mut toasts) = gym(&server.url());
    let key = appointments_key(&AppointmentFilters::default());
    gym.queries.cache().set(&key, CacheWrite::Data(Arc::new(0u8)));

    let result = gym.delete_appointment().mutate_async("a1".to_string()).await;
    assert!(result.is_err());
    assert!(!gym.queries.cache().get(&key).unwrap().invalidated);
    assert_eq!(toasts.drain()[0].message, "Erro ao deletar agendamento.");
  }

  #[test]
  fn test_writes_refresh_availability_and_stats() {
    let expected = vec![
      QueryKey::new(APPOINTMENTS),
      QueryKey::new(INSTRUCTOR_AVAILABILITY),
      QueryKey::new(DASHBOARD_OVERVIEW),
      QueryKey::new(INSTRUCTOR_STATS),
    ];
    for descriptor in [create_descriptor(), update_descriptor(), delete_descriptor()] {
      assert_eq!(descriptor.invalidates(), expected.as_slice());
    }
  }

  #[tokio::test]
  async fn test_delete_invalidates_dashboard() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("DELETE", "/appointments/a1")
      .with_body(r#"{"appointment":{"id":"a1","title":"Aula","startTime":"2025-03-10T10:00:00Z","endTime":"2025-03-10T11:00:00Z"},"message":"ok"}"#)
      .create_async()
      .await;

    let (gym, _) = gym(&server.url());
    let overview = QueryKey::new("dashboard-overview");
    gym.queries.cache().set(&overview, CacheWrite::Data(Arc::new(0u8)));

    gym
      .delete_appointment()
      .mutate_async("a1".to_string())
      .await
      .unwrap();
    assert!(gym.queries.cache().get(&overview).unwrap().invalidated);
  }
}
