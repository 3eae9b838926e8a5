use serde_json::Value;

use super::keys::{INSTRUCTOR_STATS, WORKOUT_PLAN, WORKOUT_PLANS};
use super::{push_opt, Gym};
use crate::api::types::{
  CopyPlan, PlanStatus, WorkoutPlan, WorkoutPlanEnvelope, WorkoutPlanInput, WorkoutPlanList,
};
use crate::api::{ApiClient, ApiError, Params};
use crate::query::{Mutation, MutationDescriptor, Query, QueryKey, QueryPolicy};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutPlanFilters {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub status: Option<PlanStatus>,
  pub student_id: Option<String>,
  pub instructor_id: Option<String>,
}

impl WorkoutPlanFilters {
  pub fn params(&self) -> Params {
    let mut params = Params::new();
    push_opt(&mut params, "page", self.page);
    push_opt(&mut params, "limit", self.limit);
    push_opt(&mut params, "status", self.status.map(PlanStatus::as_param));
    push_opt(&mut params, "studentId", self.student_id.as_deref());
    push_opt(&mut params, "instructorId", self.instructor_id.as_deref());
    params
  }
}

impl ApiClient {
  pub async fn list_workout_plans(
    &self,
    filters: &WorkoutPlanFilters,
  ) -> Result<Vec<WorkoutPlan>, ApiError> {
    let list: Option<WorkoutPlanList> = self.get("/workout-plans", &filters.params()).await?;
    Ok(list.unwrap_or_default().workout_plans)
  }

  pub async fn get_workout_plan(&self, id: &str) -> Result<WorkoutPlan, ApiError> {
    self.get(&format!("/workout-plans/{}", id), &Vec::new()).await
  }

  pub async fn create_workout_plan(&self, input: &WorkoutPlanInput) -> Result<WorkoutPlan, ApiError> {
    let envelope: WorkoutPlanEnvelope = self.post("/workout-plans", input).await?;
    Ok(envelope.workout_plan)
  }

  pub async fn update_workout_plan(
    &self,
    id: &str,
    input: &WorkoutPlanInput,
  ) -> Result<WorkoutPlan, ApiError> {
    let envelope: WorkoutPlanEnvelope = self.patch(&format!("/workout-plans/{}", id), input).await?;
    Ok(envelope.workout_plan)
  }

  pub async fn delete_workout_plan(&self, id: &str) -> Result<Value, ApiError> {
    self.delete(&format!("/workout-plans/{}", id)).await
  }

  /// ACTIVE becomes PAUSED and anything else becomes ACTIVE, server-side
  pub async fn toggle_workout_plan(&self, id: &str) -> Result<WorkoutPlan, ApiError> {
    let envelope: WorkoutPlanEnvelope = self
      .patch_empty(&format!("/workout-plans/{}/toggle-active", id))
      .await?;
    Ok(envelope.workout_plan)
  }

  pub async fn copy_workout_plan(&self, id: &str, copy: &CopyPlan) -> Result<WorkoutPlan, ApiError> {
    let envelope: WorkoutPlanEnvelope = self.post(&format!("/workout-plans/{}/copy", id), copy).await?;
    Ok(envelope.workout_plan)
  }
}

pub fn workout_plans_key(filters: &WorkoutPlanFilters) -> QueryKey {
  QueryKey::new(WORKOUT_PLANS).with_params(&filters.params())
}

pub fn workout_plan_key(id: &str) -> QueryKey {
  QueryKey::new(WORKOUT_PLAN).with("id", id)
}

fn write_descriptor(name: &'static str, success: &str, failure: &str) -> MutationDescriptor {
  MutationDescriptor::new(name, failure)
    .invalidating([
      QueryKey::new(WORKOUT_PLANS),
      QueryKey::new(WORKOUT_PLAN),
      QueryKey::new(INSTRUCTOR_STATS),
    ])
    .with_success(success)
}

pub fn create_descriptor() -> MutationDescriptor {
  write_descriptor(
    "create-workout-plan",
    "Plano de treino criado com sucesso!",
    "Erro ao criar plano de treino",
  )
}

pub fn update_descriptor() -> MutationDescriptor {
  write_descriptor(
    "update-workout-plan",
    "Plano de treino atualizado com sucesso!",
    "Erro ao atualizar plano de treino",
  )
}

pub fn delete_descriptor() -> MutationDescriptor {
  write_descriptor(
    "delete-workout-plan",
    "Plano de treino excluído com sucesso!",
    "Erro ao excluir plano de treino",
  )
}

pub fn toggle_descriptor() -> MutationDescriptor {
  write_descriptor(
    "toggle-workout-plan",
    "Status do plano de treino atualizado com sucesso!",
    "Erro ao atualizar status do plano de treino",
  )
}

pub fn copy_descriptor() -> MutationDescriptor {
  write_descriptor(
    "copy-workout-plan",
    "Plano de treino copiado com sucesso!",
    "Erro ao copiar plano de treino",
  )
}

impl Gym {
  pub fn workout_plans(&self, filters: WorkoutPlanFilters) -> Query<Vec<WorkoutPlan>> {
    self.query(
      workout_plans_key(&filters),
      QueryPolicy::WORKOUT_PLANS,
      move |api| {
        let filters = filters.clone();
        async move { api.list_workout_plans(&filters).await }
      },
    )
  }

  pub fn workout_plan(&self, id: &str) -> Query<WorkoutPlan> {
    let id = id.to_string();
    let policy = QueryPolicy::WORKOUT_PLANS.enabled(!id.is_empty());
    self.query(workout_plan_key(&id), policy, move |api| {
      let id = id.clone();
      async move { api.get_workout_plan(&id).await }
    })
  }

  pub fn create_workout_plan(&self) -> Mutation<WorkoutPlanInput, WorkoutPlan> {
    self.mutation(create_descriptor(), |api, input: WorkoutPlanInput| async move {
      api.create_workout_plan(&input).await
    })
  }

  pub fn update_workout_plan(&self) -> Mutation<(String, WorkoutPlanInput), WorkoutPlan> {
    self.mutation(
      update_descriptor(),
      |api, (id, input): (String, WorkoutPlanInput)| async move {
        api.update_workout_plan(&id, &input).await
      },
    )
  }

  pub fn delete_workout_plan(&self) -> Mutation<String, Value> {
    self.mutation(delete_descriptor(), |api, id: String| async move {
      api.delete_workout_plan(&id).await
    })
  }

  pub fn toggle_workout_plan(&self) -> Mutation<String, WorkoutPlan> {
    self.mutation(toggle_descriptor(), |api, id: String| async move {
      api.toggle_workout_plan(&id).await
    })
  }

  pub fn copy_workout_plan(&self) -> Mutation<(String, CopyPlan), WorkoutPlan> {
    self.mutation(
      copy_descriptor(),
      |api, (id, copy): (String, CopyPlan)| async move { api.copy_workout_plan(&id, &copy).await },
    )
  }
}
