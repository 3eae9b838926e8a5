use super::keys::{DASHBOARD_OVERVIEW, RECENT_ACTIVITIES, UPCOMING_PAYMENTS};
use super::Gym;
use crate::api::types::{DashboardOverview, RecentActivity, UpcomingPayment};
use crate::api::{ApiClient, ApiError};
use crate::query::{Query, QueryKey, QueryPolicy};

/// Rows shown in each dashboard panel
pub const PANEL_LIMIT: u32 = 5;

impl ApiClient {
  pub async fn dashboard_overview(&self) -> Result<DashboardOverview, ApiError> {
    let overview: Option<DashboardOverview> = self.get("/dashboard/overview", &Vec::new()).await?;
    Ok(overview.unwrap_or_default())
  }

  pub async fn recent_activities(&self, limit: u32) -> Result<Vec<RecentActivity>, ApiError> {
    let list: Option<Vec<RecentActivity>> = self
      .get("/dashboard/recent-activities", &vec![("limit", limit.to_string())])
      .await?;
    Ok(list.unwrap_or_default())
  }

  pub async fn upcoming_payments(&self, limit: u32) -> Result<Vec<UpcomingPayment>, ApiError> {
    let list: Option<Vec<UpcomingPayment>> = self
      .get("/dashboard/upcoming-payments", &vec![("limit", limit.to_string())])
      .await?;
    Ok(list.unwrap_or_default())
  }
}

pub fn overview_key() -> QueryKey {
  QueryKey::new(DASHBOARD_OVERVIEW)
}

pub fn recent_activities_key(limit: u32) -> QueryKey {
  QueryKey::new(RECENT_ACTIVITIES).with("limit", limit)
}

pub fn upcoming_payments_key(limit: u32) -> QueryKey {
  QueryKey::new(UPCOMING_PAYMENTS).with("limit", limit)
}

impl Gym {
  pub fn dashboard_overview(&self) -> Query<DashboardOverview> {
    self.query(overview_key(), QueryPolicy::DEFAULT, |api| async move {
      api.dashboard_overview().await
    })
  }

  pub fn recent_activities(&self, limit: u32) -> Query<Vec<RecentActivity>> {
    self.query(
      recent_activities_key(limit),
      QueryPolicy::DEFAULT,
      move |api| async move { api.recent_activities(limit).await },
    )
  }

  pub fn upcoming_payments(&self, limit: u32) -> Query<Vec<UpcomingPayment>> {
    self.query(
      upcoming_payments_key(limit),
      QueryPolicy::DEFAULT,
      move |api| async move { api.upcoming_payments(limit).await },
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::gym;

  #[tokio::test]
  async fn test_overview_partial_body() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/dashboard/overview")
      .with_body(r#"{"students":{"total":40,"active":20},"appointments":{"thisWeek":30}}"#)
      .create_async()
      .await;

    let (gym, _) = gym(&server.url());
    let overview = gym.api.dashboard_overview().await.unwrap();
    assert_eq!(overview.students.active, 20);
    assert_eq!(overview.revenue.total, 0.0);
    assert_eq!(overview.classes_per_student(), 1.5);
  }

  #[tokio::test]
  async fn test_upcoming_payments_sends_limit() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/dashboard/upcoming-payments")
      .match_query(mockito::Matcher::UrlEncoded("limit".into(), "5".into()))
      .with_body(r#"[{"student":"Ana","amount":120.0,"dueDateText":"Amanhã"}]"#)
      .create_async()
      .await;

    let (gym, _) = gym(&server.url());
    let payments = gym.api.upcoming_payments(PANEL_LIMIT).await.unwrap();
    assert_eq!(payments[0].due_date_text, "Amanhã");
    mock.assert_async().await;
  }
}
