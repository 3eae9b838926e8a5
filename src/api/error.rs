//! Error types for backend calls and the single place server error bodies are read.

use serde_json::Value;
use thiserror::Error;

use crate::forms::ValidationError;

/// Errors produced by the HTTP client wrapper and everything built on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
  /// The request never produced a response (DNS, connection refused, TLS...)
  #[error("network error: {0}")]
  Transport(String),
  /// The backend answered with a non-2xx status
  #[error("http {status}: {}", .message.as_deref().unwrap_or("no message"))]
  Http { status: u16, message: Option<String> },
  /// The backend answered 2xx but the body did not match the expected shape
  #[error("invalid response: {0}")]
  Decode(String),
  /// The backend answered 2xx but reported failure in the body
  #[error("rejected: {}", .0.as_deref().unwrap_or("no message"))]
  Rejected(Option<String>),
  /// Rejected locally before any request was sent
  #[error(transparent)]
  Validation(#[from] ValidationError),
}

/// Canonical `{status, message}` shape shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
  pub status: Option<u16>,
  pub message: String,
}

impl ApiError {
  /// Build an `Http` error from a status code and the raw response body.
  pub fn from_response(status: u16, body: &str) -> Self {
    ApiError::Http {
      status,
      message: extract_server_message(body),
    }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Http { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    self.status() == Some(401)
  }

  /// Normalize into the user-facing shape.
  ///
  /// Server-provided messages win; transport and decode failures, and HTTP
  /// errors without a message, fall back to `fallback`.
  pub fn info(&self, fallback: &str) -> ErrorInfo {
    let message = match self {
      ApiError::Http {
        message: Some(message),
        ..
      } => message.clone(),
      ApiError::Rejected(Some(message)) => message.clone(),
      ApiError::Validation(err) => err.message.clone(),
      _ => fallback.to_string(),
    };

    ErrorInfo {
      status: self.status(),
      message,
    }
  }

  pub fn user_message(&self, fallback: &str) -> String {
    self.info(fallback).message
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    match err.status() {
      Some(status) => ApiError::Http {
        status: status.as_u16(),
        message: None,
      },
      None => ApiError::Transport(err.to_string()),
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(err: serde_json::Error) -> Self {
    ApiError::Decode(err.to_string())
  }
}

/// Pull a human-readable message out of an error body.
///
/// The backend is inconsistent: some routes answer `{"message": ...}`, others
/// `{"mensagem": ...}` and a few `{"error": ...}`. Plain-text bodies are used
/// as-is when short enough to show in a status line.
pub fn extract_server_message(body: &str) -> Option<String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return None;
  }

  match serde_json::from_str::<Value>(trimmed) {
    Ok(Value::Object(map)) => ["message", "mensagem", "error"]
      .iter()
      .filter_map(|field| map.get(*field))
      .find_map(|value| value.as_str())
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(String::from),
    Ok(_) => None,
    Err(_) if trimmed.len() <= 200 && !trimmed.starts_with('<') => Some(trimmed.to_string()),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extracts_message_field() {
    assert_eq!(
      extract_server_message(r#"{"message":"Email já cadastrado"}"#),
      Some("Email já cadastrado".to_string())
    );
  }

  #[test]
  fn test_extracts_mensagem_field() {
    assert_eq!(
      extract_server_message(r#"{"mensagem":"Aluno não encontrado"}"#),
      Some("Aluno não encontrado".to_string())
    );
  }

  #[test]
  fn test_message_wins_over_mensagem() {
    assert_eq!(
      extract_server_message(r#"{"mensagem":"b","message":"a"}"#),
      Some("a".to_string())
    );
  }

  #[test]
  fn test_falls_back_to_error_field() {
    assert_eq!(
      extract_server_message(r#"{"error":"Token inválido"}"#),
      Some("Token inválido".to_string())
    );
  }

  #[test]
  fn test_no_message_in_body() {
    assert_eq!(extract_server_message(r#"{"details":[]}"#), None);
    assert_eq!(extract_server_message(""), None);
    assert_eq!(extract_server_message(r#"{"message":"  "}"#), None);
    assert_eq!(extract_server_message("<html>502</html>"), None);
  }

  #[test]
  fn test_plain_text_body() {
    assert_eq!(
      extract_server_message("Bad Gateway"),
      Some("Bad Gateway".to_string())
    );
  }

  #[test]
  fn test_info_uses_server_message() {
    let err = ApiError::from_response(409, r#"{"message":"Conflito de horário"}"#);
    assert_eq!(
      err.info("Erro ao criar agendamento."),
      ErrorInfo {
        status: Some(409),
        message: "Conflito de horário".to_string()
      }
    );
  }

  #[test]
  fn test_info_falls_back_without_message() {
    let err = ApiError::from_response(500, "");
    assert_eq!(err.user_message("Erro ao criar instrutor"), "Erro ao criar instrutor");

    let err = ApiError::Transport("connection refused".to_string());
    let info = err.info("Erro ao criar instrutor");
    assert_eq!(info.status, None);
    assert_eq!(info.message, "Erro ao criar instrutor");
  }

  #[test]
  fn test_unauthorized() {
    assert!(ApiError::from_response(401, "").is_unauthorized());
    assert!(!ApiError::Decode("x".to_string()).is_unauthorized());
  }
}
