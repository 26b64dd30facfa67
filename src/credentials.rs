//! Process-wide bearer credential shared by every outgoing request.

use std::sync::{Arc, PoisonError, RwLock};

/// Environment variable holding the initial API token
pub const TOKEN_ENV: &str = "EXEMPLAR_API_TOKEN";

/// Cloneable handle to the current bearer token.
///
/// All clones see the same token. The token is only ever replaced as a
/// whole, so a poisoned lock still holds a complete value and is read
/// through.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
  token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
  pub fn new(token: Option<String>) -> Self {
    Self {
      token: Arc::new(RwLock::new(token.filter(|t| !t.is_empty()))),
    }
  }

  /// Load the initial token from `EXEMPLAR_API_TOKEN`, if set
  pub fn from_env() -> Self {
    Self::new(std::env::var(TOKEN_ENV).ok())
  }

  pub fn token(&self) -> Option<String> {
    self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some()
  }

  /// Replace the token. An empty string clears it.
  pub fn set_token(&self, token: impl Into<String>) {
    let token = token.into();
    *self.token.write().unwrap_or_else(PoisonError::into_inner) =
      if token.is_empty() { None } else { Some(token) };
  }

  pub fn clear(&self) {
    *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_clones_share_token() {
    let creds = Credentials::default();
    let other = creds.clone();
    assert!(!other.is_authenticated());

    creds.set_token("abc");
    assert_eq!(other.token().as_deref(), Some("abc"));

    other.clear();
    assert_eq!(creds.token(), None);
  }

  #[test]
  fn test_empty_token_means_none() {
    assert_eq!(Credentials::new(Some(String::new())).token(), None);

    let creds = Credentials::new(Some("x".to_string()));
    creds.set_token("");
    assert!(!creds.is_authenticated());
  }
}
