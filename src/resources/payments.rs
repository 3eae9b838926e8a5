use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::keys::{
  DASHBOARD_OVERVIEW, INSTRUCTOR_STATS, PAYMENT, PAYMENTS, PAYMENT_STATS, UPCOMING_PAYMENTS,
};
use super::{push_opt, Gym};
use crate::api::types::{
  CreatePayment, OverdueCount, Payment, PaymentEnvelope, PaymentList, PaymentMethod,
  PaymentStats, PaymentStatus, UpdatePayment,
};
use crate::api::{ApiClient, ApiError, Params};
use crate::query::{Mutation, MutationDescriptor, Query, QueryKey, QueryPolicy};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilters {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub status: Option<PaymentStatus>,
  pub student_id: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
}

impl PaymentFilters {
  pub fn params(&self) -> Params {
    let mut params = Params::new();
    push_opt(&mut params, "page", self.page);
    push_opt(&mut params, "limit", self.limit);
    push_opt(&mut params, "status", self.status.map(PaymentStatus::as_param));
    push_opt(&mut params, "studentId", self.student_id.as_deref());
    push_opt(&mut params, "startDate", self.start_date.as_deref());
    push_opt(&mut params, "endDate", self.end_date.as_deref());
    params
  }
}

/// Period for the revenue overview
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsRange {
  pub start_date: Option<String>,
  pub end_date: Option<String>,
}

impl StatsRange {
  pub fn params(&self) -> Params {
    let mut params = Params::new();
    push_opt(&mut params, "startDate", self.start_date.as_deref());
    push_opt(&mut params, "endDate", self.end_date.as_deref());
    params
  }
}

impl ApiClient {
  pub async fn list_payments(&self, filters: &PaymentFilters) -> Result<Vec<Payment>, ApiError> {
    let list: Option<PaymentList> = self.get("/payments", &filters.params()).await?;
    Ok(list.unwrap_or_default().payments)
  }

  pub async fn get_payment(&self, id: &str) -> Result<Payment, ApiError> {
    self.get(&format!("/payments/{}", id), &Vec::new()).await
  }

  pub async fn payment_stats(&self, range: &StatsRange) -> Result<PaymentStats, ApiError> {
    let stats: Option<PaymentStats> = self.get("/payments/stats/overview", &range.params()).await?;
    Ok(stats.unwrap_or_default())
  }

  pub async fn create_payment(&self, input: &CreatePayment) -> Result<PaymentEnvelope, ApiError> {
    self.post("/payments", input).await
  }

  pub async fn update_payment(&self, id: &str, input: &UpdatePayment) -> Result<Value, ApiError> {
    self.patch(&format!("/payments/{}", id), input).await
  }

  pub async fn delete_payment(&self, id: &str) -> Result<Value, ApiError> {
    self.delete(&format!("/payments/{}", id)).await
  }

  /// Flag every pending payment past its due date; returns how many changed.
  pub async fn mark_overdue(&self) -> Result<OverdueCount, ApiError> {
    let count: Option<OverdueCount> = self.post_empty("/payments/mark-overdue").await?;
    Ok(count.unwrap_or_default())
  }
}

/// Body that records a payment as received now
pub fn mark_paid(method: PaymentMethod) -> UpdatePayment {
  UpdatePayment {
    status: Some(PaymentStatus::Paid),
    method: Some(method),
    paid_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    ..Default::default()
  }
}

pub fn payments_key(filters: &PaymentFilters) -> QueryKey {
  QueryKey::new(PAYMENTS).with_params(&filters.params())
}

pub fn payment_key(id: &str) -> QueryKey {
  QueryKey::new(PAYMENT).with("id", id)
}

pub fn payment_stats_key(range: &StatsRange) -> QueryKey {
  QueryKey::new(PAYMENT_STATS).with_params(&range.params())
}

fn write_descriptor(name: &'static str, failure: &str) -> MutationDescriptor {
  MutationDescriptor::new(name, failure).invalidating([
    QueryKey::new(PAYMENTS),
    QueryKey::new(PAYMENT),
    QueryKey::new(PAYMENT_STATS),
    QueryKey::new(DASHBOARD_OVERVIEW),
    QueryKey::new(UPCOMING_PAYMENTS),
    QueryKey::new(INSTRUCTOR_STATS),
  ])
}

pub fn create_descriptor() -> MutationDescriptor {
  write_descriptor("create-payment", "Erro ao criar pagamento")
    .with_success("Pagamento criado com sucesso!")
}

pub fn update_descriptor() -> MutationDescriptor {
  write_descriptor("update-payment", "Erro ao registrar pagamento")
    .with_success("Pagamento registrado com sucesso!")
}

pub fn delete_descriptor() -> MutationDescriptor {
  write_descriptor("delete-payment", "Erro ao excluir pagamento")
    .with_success("Pagamento excluído com sucesso!")
}

pub fn mark_overdue_descriptor() -> MutationDescriptor {
  write_descriptor("mark-overdue", "Erro ao atualizar pagamentos atrasados")
}

impl Gym {
  pub fn payments(&self, filters: PaymentFilters) -> Query<Vec<Payment>> {
    self.query(payments_key(&filters), QueryPolicy::PAYMENTS, move |api| {
      let filters = filters.clone();
      async move { api.list_payments(&filters).await }
    })
  }

  pub fn payment(&self, id: &str) -> Query<Payment> {
    let id = id.to_string();
    let policy = QueryPolicy::DEFAULT.enabled(!id.is_empty());
    self.query(payment_key(&id), policy, move |api| {
      let id = id.clone();
      async move { api.get_payment(&id).await }
    })
  }

  pub fn payment_stats(&self, range: StatsRange) -> Query<PaymentStats> {
    self.query(payment_stats_key(&range), QueryPolicy::PAYMENTS, move |api| {
      let range = range.clone();
      async move { api.payment_stats(&range).await }
    })
  }

  pub fn create_payment(&self) -> Mutation<CreatePayment, PaymentEnvelope> {
    self.mutation(create_descriptor(), |api, input: CreatePayment| async move {
      api.create_payment(&input).await
    })
  }

  pub fn update_payment(&self) -> Mutation<(String, UpdatePayment), Value> {
    self.mutation(
      update_descriptor(),
      |api, (id, input): (String, UpdatePayment)| async move { api.update_payment(&id, &input).await },
    )
  }

  pub fn delete_payment(&self) -> Mutation<String, Value> {
    self.mutation(delete_descriptor(), |api, id: String| async move {
      api.delete_payment(&id).await
    })
  }

  pub fn mark_overdue(&self) -> Mutation<(), OverdueCount> {
    self.mutation(mark_overdue_descriptor(), |api, _: ()| async move {
      api.mark_overdue().await
    })
  }
}
