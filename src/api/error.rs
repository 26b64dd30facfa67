use thiserror::Error;

use super::schema::ValidationError;

/// Failures surfaced by the examples API.
///
/// Cloneable so the same failure can be both kept as view state and
/// handed back to whoever started the operation.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
  /// Create input was rejected before any request was sent
  #[error("invalid input: {0}")]
  Validation(#[from] ValidationError),

  /// No response from the server (unreachable, refused, timed out)
  #[error("network error: {0}")]
  Transport(String),

  /// The server answered with a non-success status
  #[error("server returned {status}: {body}")]
  Server { status: u16, body: String },

  /// A success response whose body could not be parsed
  #[error("unexpected response body: {0}")]
  Decode(String),
}

impl ApiError {
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Server { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ApiError::Decode(e.to_string())
    } else {
      ApiError::Transport(e.to_string())
    }
  }
}
