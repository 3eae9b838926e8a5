use serde::Deserialize;
use serde_json::Value;

use super::keys::{PROGRESS_RECORD, PROGRESS_RECORDS, STUDENT_HISTORY};
use super::{push_opt, Gym};
use crate::api::types::{ProgressHistory, ProgressInput, ProgressList, ProgressRecord};
use crate::api::{ApiClient, ApiError, Params};
use crate::query::{Mutation, MutationDescriptor, Query, QueryKey, QueryPolicy};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressFilters {
  pub student_id: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  pub page: Option<u32>,
  pub limit: Option<u32>,
}

impl ProgressFilters {
  pub fn params(&self) -> Params {
    let mut params = Params::new();
    push_opt(&mut params, "studentId", self.student_id.as_deref());
    push_opt(&mut params, "startDate", self.start_date.as_deref());
    push_opt(&mut params, "endDate", self.end_date.as_deref());
    push_opt(&mut params, "page", self.page);
    push_opt(&mut params, "limit", self.limit);
    params
  }
}

/// History answers either a bare array or an envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryBody {
  Records(Vec<ProgressRecord>),
  Envelope(ProgressHistory),
}

impl ApiClient {
  pub async fn list_progress(&self, filters: &ProgressFilters) -> Result<Vec<ProgressRecord>, ApiError> {
    let list: Option<ProgressList> = self.get("/progress", &filters.params()).await?;
    Ok(list.unwrap_or_default().progress_records)
  }

  pub async fn get_progress(&self, id: &str) -> Result<ProgressRecord, ApiError> {
    self.get(&format!("/progress/{}", id), &Vec::new()).await
  }

  /// All records of one student, oldest first
  pub async fn student_history(&self, student_id: &str) -> Result<Vec<ProgressRecord>, ApiError> {
    let body: Option<HistoryBody> = self
      .get(&format!("/progress/student/{}/history", student_id), &Vec::new())
      .await?;
    let mut records = match body {
      Some(HistoryBody::Records(records)) => records,
      Some(HistoryBody::Envelope(envelope)) => envelope.progress_records,
      None => Vec::new(),
    };
    records.sort_by(|a, b| a.record_date.cmp(&b.record_date));
    Ok(records)
  }

  pub async fn create_progress(&self, input: &ProgressInput) -> Result<Value, ApiError> {
    self.post("/progress", input).await
  }

  pub async fn update_progress(&self, id: &str, input: &ProgressInput) -> Result<Value, ApiError> {
    self.put(&format!("/progress/{}", id), input).await
  }

  pub async fn delete_progress(&self, id: &str) -> Result<Value, ApiError> {
    self.delete(&format!("/progress/{}", id)).await
  }
}

pub fn progress_key(filters: &ProgressFilters) -> QueryKey {
  QueryKey::new(PROGRESS_RECORDS).with_params(&filters.params())
}

pub fn progress_record_key(id: &str) -> QueryKey {
  QueryKey::new(PROGRESS_RECORD).with("id", id)
}

pub fn student_history_key(student_id: &str) -> QueryKey {
  QueryKey::new(STUDENT_HISTORY).with("studentId", student_id)
}

fn write_descriptor(name: &'static str, success: &str, failure: &str) -> MutationDescriptor {
  MutationDescriptor::new(name, failure)
    .invalidating([
      QueryKey::new(PROGRESS_RECORDS),
      QueryKey::new(PROGRESS_RECORD),
      QueryKey::new(STUDENT_HISTORY),
    ])
    .with_success(success)
}

pub fn create_descriptor() -> MutationDescriptor {
  write_descriptor("create-progress", "Registro criado com sucesso!", "Erro ao criar registro")
}

pub fn update_descriptor() -> MutationDescriptor {
  write_descriptor(
    "update-progress",
    "Registro atualizado com sucesso!",
    "Erro ao atualizar registro",
  )
}

pub fn delete_descriptor() -> MutationDescriptor {
  write_descriptor(
    "delete-progress",
    "Registro excluído com sucesso!",
    "Erro ao excluir registro",
  )
}

impl Gym {
  pub fn progress_records(&self, filters: ProgressFilters) -> Query<Vec<ProgressRecord>> {
    self.query(progress_key(&filters), QueryPolicy::DEFAULT, move |api| {
      let filters = filters.clone();
      async move { api.list_progress(&filters).await }
    })
  }

  pub fn progress_record(&self, id: &str) -> Query<ProgressRecord> {
    let id = id.to_string();
    let policy = QueryPolicy::DEFAULT.enabled(!id.is_empty());
    self.query(progress_record_key(&id), policy, move |api| {
      let id = id.clone();
      async move { api.get_progress(&id).await }
    })
  }

  pub fn student_history(&self, student_id: &str) -> Query<Vec<ProgressRecord>> {
    let student_id = student_id.to_string();
    let policy = QueryPolicy::DEFAULT.enabled(!student_id.is_empty());
    self.query(student_history_key(&student_id), policy, move |api| {
      let student_id = student_id.clone();
      async move { api.student_history(&student_id).await }
    })
  }

  pub fn create_progress(&self) -> Mutation<ProgressInput, Value> {
    self.mutation(create_descriptor(), |api, input: ProgressInput| async move {
      api.create_progress(&input).await
    })
  }

  pub fn update_progress(&self) -> Mutation<(String, ProgressInput), Value> {
    self.mutation(
      update_descriptor(),
      |api, (id, input): (String, ProgressInput)| async move { api.update_progress(&id, &input).await },
    )
  }

  pub fn delete_progress(&self) -> Mutation<String, Value> {
    self.mutation(delete_descriptor(), |api, id: String| async move {
      api.delete_progress(&id).await
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::gym;

  const RECORD_B: &str = r#"{"id":"r2","studentId":"s1","weight":71.0,"recordDate":"2025-02-01"}"#;
  const RECORD_A: &str = r#"{"id":"r1","studentId":"s1","weight":73.5,"recordDate":"2025-01-01"}"#;

  #[tokio::test]
  async fn test_history_bare_array_sorted() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/progress/student/s1/history")
      .with_body(format!("[{},{}]", RECORD_B, RECORD_A))
      .create_async()
      .await;

    let (gym, _) = gym(&server.url());
    let history = gym.api.student_history("s1").await.unwrap();
    let ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
  }

  #[tokio::test]
  async fn test_history_envelope() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/progress/student/s1/history")
      .with_body(format!(r#"{{"progressRecords":[{}]}}"#, RECORD_A))
      .create_async()
      .await;

    let (gym, _) = gym(&server.url());
    assert_eq!(gym.api.student_history("s1").await.unwrap().len(), 1);
  }

  #[test]
  fn test_filters_to_key() {
    let filters = ProgressFilters {
      student_id: Some("s1".to_string()),
      ..Default::default()
    };
    assert_eq!(progress_key(&filters).param("studentId"), Some("s1"));
  }
}
