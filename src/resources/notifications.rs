use serde_json::Value;

use super::keys::{NOTIFICATIONS, NOTIFICATION_STATS};
use super::{push_opt, Gym};
use crate::api::types::{Notification, NotificationList, NotificationStats, NotificationType};
use crate::api::{ApiClient, ApiError, Params};
use crate::query::{Mutation, MutationDescriptor, Query, QueryKey, QueryPolicy};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilters {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub kind: Option<NotificationType>,
  pub is_read: Option<bool>,
}

impl NotificationFilters {
  pub fn params(&self) -> Params {
    let mut params = Params::new();
    push_opt(&mut params, "page", self.page);
    push_opt(&mut params, "limit", self.limit);
    push_opt(&mut params, "type", self.kind.map(type_param));
    push_opt(&mut params, "isRead", self.is_read);
    params
  }
}

fn type_param(kind: NotificationType) -> &'static str {
  match kind {
    NotificationType::PaymentDue => "PAYMENT_DUE",
    NotificationType::PaymentOverdue => "PAYMENT_OVERDUE",
    NotificationType::AppointmentReminder => "APPOINTMENT_REMINDER",
    NotificationType::Birthday => "BIRTHDAY",
    NotificationType::PlanExpiring => "PLAN_EXPIRING",
    NotificationType::General => "GENERAL",
  }
}

/// Server-side batch jobs that create notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
  PaymentOverdue,
  PaymentDue,
  Birthday,
}

impl Generator {
  pub const ALL: [Generator; 3] = [
    Generator::PaymentOverdue,
    Generator::PaymentDue,
    Generator::Birthday,
  ];

  fn path(self) -> &'static str {
    match self {
      Generator::PaymentOverdue => "/notifications/payment-overdue",
      Generator::PaymentDue => "/notifications/payment-due",
      Generator::Birthday => "/notifications/birthday",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Generator::PaymentOverdue => "Pagamentos em atraso",
      Generator::PaymentDue => "Vencimentos próximos",
      Generator::Birthday => "Aniversariantes",
    }
  }
}

impl ApiClient {
  pub async fn list_notifications(
    &self,
    filters: &NotificationFilters,
  ) -> Result<Vec<Notification>, ApiError> {
    let list: Option<NotificationList> = self.get("/notifications", &filters.params()).await?;
    Ok(list.unwrap_or_default().notifications)
  }

  pub async fn notification_stats(&self) -> Result<NotificationStats, ApiError> {
    let stats: Option<NotificationStats> = self.get("/notifications/stats", &Vec::new()).await?;
    Ok(stats.unwrap_or_default())
  }

  pub async fn mark_notification_read(&self, id: &str) -> Result<Value, ApiError> {
    self.patch_empty(&format!("/notifications/{}/read", id)).await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<Value, ApiError> {
    self.patch_empty("/notifications/read-all").await
  }

  pub async fn delete_notification(&self, id: &str) -> Result<Value, ApiError> {
    self.delete(&format!("/notifications/{}", id)).await
  }

  pub async fn generate_notifications(&self, generator: Generator) -> Result<Value, ApiError> {
    self.post_empty(generator.path()).await
  }
}

pub fn notifications_key(filters: &NotificationFilters) -> QueryKey {
  QueryKey::new(NOTIFICATIONS).with_params(&filters.params())
}

pub fn notification_stats_key() -> QueryKey {
  QueryKey::new(NOTIFICATION_STATS)
}

// Read-state changes are silent on success; only failures are reported.
fn write_descriptor(name: &'static str, failure: &str) -> MutationDescriptor {
  MutationDescriptor::new(name, failure)
    .invalidating([QueryKey::new(NOTIFICATIONS), QueryKey::new(NOTIFICATION_STATS)])
}

pub fn mark_read_descriptor() -> MutationDescriptor {
  write_descriptor("mark-notification-read", "Erro ao marcar notificação como lida")
}

pub fn mark_all_read_descriptor() -> MutationDescriptor {
  write_descriptor("mark-all-notifications-read", "Erro ao marcar notificações como lidas")
}

pub fn delete_descriptor() -> MutationDescriptor {
  write_descriptor("delete-notification", "Erro ao excluir notificação")
}

pub fn generate_descriptor() -> MutationDescriptor {
  write_descriptor("generate-notifications", "Erro ao gerar notificações")
    .with_success("Notificações geradas com sucesso!")
}

impl Gym {
  pub fn notifications(&self, filters: NotificationFilters) -> Query<Vec<Notification>> {
    self.query(
      notifications_key(&filters),
      QueryPolicy::NOTIFICATIONS,
      move |api| {
        let filters = filters.clone();
        async move { api.list_notifications(&filters).await }
      },
    )
  }

  pub fn notification_stats(&self) -> Query<NotificationStats> {
    self.query(
      notification_stats_key(),
      QueryPolicy::NOTIFICATIONS,
      |api| async move { api.notification_stats().await },
    )
  }

  pub fn mark_notification_read(&self) -> Mutation<String, Value> {
    self.mutation(mark_read_descriptor(), |api, id: String| async move {
      api.mark_notification_read(&id).await
    })
  }

  pub fn mark_all_notifications_read(&self) -> Mutation<(), Value> {
    self.mutation(mark_all_read_descriptor(), |api, _: ()| async move {
      api.mark_all_notifications_read().await
    })
  }

  pub fn delete_notification(&self) -> Mutation<String, Value> {
    self.mutation(delete_descriptor(), |api, id: String| async move {
      api.delete_notification(&id).await
    })
  }

  pub fn generate_notifications(&self) -> Mutation<Generator, Value> {
    self.mutation(generate_descriptor(), |api, generator: Generator| async move {
      api.generate_notifications(generator).await
    })
  }
}
