//! Wire and domain types for the examples collection.
//!
//! The server speaks camelCase JSON; these types keep snake_case fields and
//! rename on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record in the examples collection, as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
  pub id: String,
  pub name: String,
  pub value: f64,
  pub created_at: DateTime<Utc>,
}

/// Unvalidated input for a new example (what the form produces)
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleDraft {
  pub name: String,
  pub value: f64,
}

impl ExampleDraft {
  pub fn new(name: impl Into<String>, value: f64) -> Self {
    Self {
      name: name.into(),
      value,
    }
  }
}

impl Default for ExampleDraft {
  fn default() -> Self {
    Self::new("", 0.0)
  }
}

/// Body of `POST /examples`.
///
/// Only `schema::validate` builds one, so holding a value means the name is
/// non-empty and the value is a non-negative number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateExampleRequest {
  name: String,
  value: f64,
}

impl CreateExampleRequest {
  pub(super) fn new_unchecked(name: String, value: f64) -> Self {
    Self { name, value }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn value(&self) -> f64 {
    self.value
  }

  /// Turn the request back into a draft, e.g. to re-validate it
  pub fn to_draft(&self) -> ExampleDraft {
    ExampleDraft::new(self.name.clone(), self.value)
  }
}
