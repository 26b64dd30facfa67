//! Remote access to the examples collection.

pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod schema;
pub mod types;

use std::future::Future;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{CreateExampleRequest, Example, ExampleDraft};

/// Operations the view model needs from the server.
///
/// `ApiClient` is the HTTP implementation; tests swap in scripted fakes.
pub trait ExampleApi: Clone + Send + Sync + 'static {
  /// Fetch the whole collection
  fn list_examples(&self) -> impl Future<Output = Result<Vec<Example>, ApiError>> + Send;

  /// Create one example and return the server's copy of it
  fn create_example(
    &self,
    request: CreateExampleRequest,
  ) -> impl Future<Output = Result<Example, ApiError>> + Send;
}
