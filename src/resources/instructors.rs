use serde_json::Value;

use super::keys::{INSTRUCTOR, INSTRUCTORS, INSTRUCTOR_STATS};
use super::Gym;
use crate::api::types::{Instructor, InstructorInput, InstructorStats};
use crate::api::{ApiClient, ApiError};
use crate::query::{Mutation, MutationDescriptor, Query, QueryKey, QueryPolicy};

impl ApiClient {
  /// Instructors come back as a bare array, not an envelope
  pub async fn list_instructors(&self) -> Result<Vec<Instructor>, ApiError> {
    let list: Option<Vec<Instructor>> = self.get("/users/instructors", &Vec::new()).await?;
    Ok(list.unwrap_or_default())
  }

  pub async fn get_instructor(&self, id: &str) -> Result<Instructor, ApiError> {
    self.get(&format!("/users/{}", id), &Vec::new()).await
  }

  pub async fn instructor_stats(&self, id: &str) -> Result<InstructorStats, ApiError> {
    let stats: Option<InstructorStats> = self.get(&format!("/users/{}/stats", id), &Vec::new()).await?;
    Ok(stats.unwrap_or_default())
  }

  pub async fn create_instructor(&self, input: &InstructorInput) -> Result<Value, ApiError> {
    self.post("/users", input).await
  }

  pub async fn update_instructor(&self, id: &str, input: &InstructorInput) -> Result<Value, ApiError> {
    self.put(&format!("/users/{}", id), input).await
  }

  pub async fn delete_instructor(&self, id: &str) -> Result<Value, ApiError> {
    self.delete(&format!("/users/{}", id)).await
  }
}

pub fn instructors_key() -> QueryKey {
  QueryKey::new(INSTRUCTORS)
}

pub fn instructor_key(id: &str) -> QueryKey {
  QueryKey::new(INSTRUCTOR).with("id", id)
}

pub fn instructor_stats_key(id: &str) -> QueryKey {
  QueryKey::new(INSTRUCTOR_STATS).with("id", id)
}

fn write_descriptor(name: &'static str, success: &str, failure: &str) -> MutationDescriptor {
  MutationDescriptor::new(name, failure)
    .invalidating([
      QueryKey::new(INSTRUCTORS),
      QueryKey::new(INSTRUCTOR),
      QueryKey::new(INSTRUCTOR_STATS),
    ])
    .with_success(success)
}

pub fn create_descriptor() -> MutationDescriptor {
  write_descriptor(
    "create-instructor",
    "Instrutor criado com sucesso!",
    "Erro ao criar instrutor",
  )
}

pub fn update_descriptor() -> MutationDescriptor {
  write_descriptor(
    "update-instructor",
    "Instrutor atualizado com sucesso!",
    "Erro ao atualizar instrutor",
  )
}

pub fn delete_descriptor() -> MutationDescriptor {
  write_descriptor(
    "delete-instructor",
    "Instrutor removido com sucesso!",
    "Erro ao remover instrutor",
  )
}

impl Gym {
  pub fn instructors(&self) -> Query<Vec<Instructor>> {
    self.query(instructors_key(), QueryPolicy::DEFAULT, |api| async move {
      api.list_instructors().await
    })
  }

  pub fn instructor(&self, id: &str) -> Query<Instructor> {
    let id = id.to_string();
    let policy = QueryPolicy::DEFAULT.enabled(!id.is_empty());
    self.query(instructor_key(&id), policy, move |api| {
      let id = id.clone();
      async move { api.get_instructor(&id).await }
    })
  }

  pub fn instructor_stats(&self, id: &str) -> Query<InstructorStats> {
    let id = id.to_string();
    let policy = QueryPolicy::DEFAULT.enabled(!id.is_empty());
    self.query(instructor_stats_key(&id), policy, move |api| {
      let id = id.clone();
      async move { api.instructor_stats(&id).await }
    })
  }

  pub fn create_instructor(&self) -> Mutation<InstructorInput, Value> {
    self.mutation(create_descriptor(), |api, input: InstructorInput| async move {
      api.create_instructor(&input).await
    })
  }

  pub fn update_instructor(&self) -> Mutation<(String, InstructorInput), Value> {
    self.mutation(
      update_descriptor(),
      |api, (id, input): (String, InstructorInput)| async move {
        api.update_instructor(&id, &input).await
      },
    )
  }

  pub fn delete_instructor(&self) -> Mutation<String, Value> {
    self.mutation(delete_descriptor(), |api, id: String| async move {
      api.delete_instructor(&id).await
    })
  }
}
