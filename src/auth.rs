//! Session check run before any protected screen is shown.

use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::storage::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
  MissingToken,
  Malformed,
  Expired,
}

impl RedirectReason {
  pub fn message(self) -> &'static str {
    match self {
      RedirectReason::MissingToken => "Faça login para continuar",
      RedirectReason::Malformed => "Sessão inválida. Faça login novamente",
      RedirectReason::Expired => "Sessão expirada. Faça login novamente",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
  Allowed,
  Redirect(RedirectReason),
}

#[derive(Deserialize)]
struct Claims {
  /// Some issuers write a float here
  exp: Option<f64>,
}

impl Claims {
  fn expired(&self, now: i64) -> bool {
    self.exp.is_some_and(|exp| exp <= now as f64)
  }
}

/// Decode the claims segment of a JWT. The signature is not checked.
fn claims(token: &str) -> Option<Claims> {
  let mut parts = token.split('.');
  let (_header, payload) = (parts.next()?, parts.next()?);
  let trimmed = payload.trim_end_matches('=');
  let bytes = URL_SAFE_NO_PAD
    .decode(trimmed)
    .or_else(|_| STANDARD.decode(payload))
    .ok()?;
  serde_json::from_slice(&bytes).ok()
}

/// Expiry of `token` in unix seconds, when it carries one
pub fn token_expiry(token: &str) -> Option<i64> {
  claims(token)?.exp.map(|exp| exp.trunc() as i64)
}

/// Decides whether protected views may be opened with the stored token.
#[derive(Clone)]
pub struct AuthGate {
  credentials: Arc<dyn CredentialStore>,
}

impl AuthGate {
  pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
    Self { credentials }
  }

  /// `now` is unix seconds. A token without `exp` never expires.
  pub fn check(&self, now: i64) -> GateDecision {
    let Some(token) = self.credentials.token() else {
      return GateDecision::Redirect(RedirectReason::MissingToken);
    };

    let decision = match claims(&token) {
      None => GateDecision::Redirect(RedirectReason::Malformed),
      Some(claims) if claims.expired(now) => GateDecision::Redirect(RedirectReason::Expired),
      Some(_) => GateDecision::Allowed,
    };

    if let GateDecision::Redirect(reason) = decision {
      info!(?reason, "session rejected");
    }
    decision
  }

  pub fn check_now(&self) -> GateDecision {
    self.check(Utc::now().timestamp())
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::storage::MemoryCredentials;

  /// Unsigned JWT with the given claims
  pub fn jwt(claims: &str) -> String {
    format!(
      "{}.{}.sig",
      URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
      URL_SAFE_NO_PAD.encode(claims)
    )
  }

  fn gate(token: Option<String>) -> AuthGate {
    AuthGate::new(Arc::new(MemoryCredentials::new(token)))
  }

  #[test]
  fn test_missing_token() {
    assert_eq!(
      gate(None).check(0),
      GateDecision::Redirect(RedirectReason::MissingToken)
    );
  }

  #[test]
  fn test_malformed_token() {
    assert_eq!(
      gate(Some("garbage".to_string())).check(0),
      GateDecision::Redirect(RedirectReason::Malformed)
    );
    assert_eq!(
      gate(Some("a.!!!.c".to_string())).check(0),
      GateDecision::Redirect(RedirectReason::Malformed)
    );
  }

  #[test]
  fn test_expiry_boundary() {
    let gate = gate(Some(jwt(r#"{"id":"u1","exp":1000}"#)));
    assert_eq!(gate.check(999), GateDecision::Allowed);
    assert_eq!(
      gate.check(1000),
      GateDecision::Redirect(RedirectReason::Expired)
    );
  }

  #[test]
  fn test_float_exp() {
    let gate = gate(Some(jwt(r#"{"id":"u1","exp":1.7e9}"#)));
    assert_eq!(gate.check(1_600_000_000), GateDecision::Allowed);
    assert_eq!(
      gate.check(1_700_000_000),
      GateDecision::Redirect(RedirectReason::Expired)
    );
    assert_eq!(token_expiry(&jwt(r#"{"exp":1700000000.75}"#)), Some(1_700_000_000));
  }

  #[test]
  fn test_no_exp_is_allowed() {
    assert_eq!(gate(Some(jwt(r#"{"id":"u1"}"#))).check(i64::MAX), GateDecision::Allowed);
  }

  #[test]
  fn test_token_expiry() {
    assert_eq!(token_expiry(&jwt(r#"{"exp":42}"#)), Some(42));
  }
}
