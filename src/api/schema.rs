//! Validation of create input before it leaves the process.

use thiserror::Error;

use super::types::{CreateExampleRequest, ExampleDraft};

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
  pub field: &'static str,
  pub message: String,
}

/// Every field that failed validation for one draft
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_violations(.violations))]
pub struct ValidationError {
  violations: Vec<FieldViolation>,
}

fn join_violations(violations: &[FieldViolation]) -> String {
  violations
    .iter()
    .map(|v| format!("{}: {}", v.field, v.message))
    .collect::<Vec<_>>()
    .join("; ")
}

impl ValidationError {
  pub fn violations(&self) -> &[FieldViolation] {
    &self.violations
  }
}

/// Check a draft and turn it into a request.
///
/// The name is passed through as-is; whitespace-only names count as
/// non-empty. NaN and infinities are rejected as not being numbers.
pub fn validate(draft: &ExampleDraft) -> Result<CreateExampleRequest, ValidationError> {
  let mut violations = Vec::new();

  if draft.name.is_empty() {
    violations.push(FieldViolation {
      field: "name",
      message: "must not be empty".to_string(),
    });
  }

  if !draft.value.is_finite() {
    violations.push(FieldViolation {
      field: "value",
      message: "must be a number".to_string(),
    });
  } else if draft.value < 0.0 {
    violations.push(FieldViolation {
      field: "value",
      message: "must be greater than or equal to 0".to_string(),
    });
  }

  if violations.is_empty() {
    Ok(CreateExampleRequest::new_unchecked(
      draft.name.clone(),
      draft.value,
    ))
  } else {
    Err(ValidationError { violations })
  }
}
