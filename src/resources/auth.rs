use tracing::info;

use super::Gym;
use crate::api::types::{Credentials, LoginResponse};
use crate::api::{ApiClient, ApiError};
use crate::query::{Mutation, MutationDescriptor};

impl ApiClient {
  /// Exchange credentials for a token and keep it for later requests.
  pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
    let response: LoginResponse = self.post("/auth/login", credentials).await?;
    self.credentials().set_token(&response.token);
    Ok(response)
  }
}

pub fn login_descriptor() -> MutationDescriptor {
  MutationDescriptor::new("login", "Erro ao fazer login").with_success("Login realizado com sucesso!")
}

impl Gym {
  pub fn login(&self) -> Mutation<Credentials, LoginResponse> {
    self.mutation(login_descriptor(), |api, credentials: Credentials| async move {
      api.login(&credentials).await
    })
  }

  /// Forget the token and every cached read made with it.
  pub fn logout(&self) {
    self.credentials().clear();
    self.queries.clear();
    info!("logged out");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::cache::CacheWrite;
  use crate::query::QueryKey;
  use crate::resources::testing::gym;
  use std::sync::Arc;

  #[tokio::test]
  async fn test_login_stores_token() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/auth/login")
      .match_body(mockito::Matcher::Json(serde_json::json!({
        "email": "admin@gym.com", "password": "123456"
      })))
      .with_body(r#"{"token":"fresh","user":{"id":"u1","name":"Admin","email":"admin@gym.com","role":"ADMIN"}}"#)
      .create_async()
      .await;

    let (gym, _) = gym(&server.url());
    let credentials = Credentials {
      email: "admin@gym.com".to_string(),
      password: "123456".to_string(),
    };
    gym.login().mutate_async(credentials).await.unwrap();
    assert_eq!(gym.credentials().token().as_deref(), Some("fresh"));
  }

  #[tokio::test]
  async fn test_wrong_password_keeps_old_token() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/auth/login")
      .with_status(401)
      .with_body(r#"{"message":"Credenciais inválidas"}"#)
      .create_async()
      .await;

    let (gym, mut toasts) = gym(&server.url());
    let credentials = Credentials {
      email: "admin@gym.com".to_string(),
      password: "errada".to_string(),
    };
    assert!(gym.login().mutate_async(credentials).await.is_err());
    assert_eq!(gym.credentials().token().as_deref(), Some("token"));
    assert_eq!(toasts.drain()[0].message, "Credenciais inválidas");
  }

  #[test]
  fn test_logout_clears_cache() {
    let (gym, _) = gym("http://localhost:8000/api");
    let key = QueryKey::new("students");
    gym.queries.cache().set(&key, CacheWrite::Data(Arc::new(1u8)));

    gym.logout();
    assert_eq!(gym.credentials().token(), None);
    assert!(gym.queries.cache().get(&key).is_none());
  }
}
