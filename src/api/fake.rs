//! Scripted `ExampleApi` for tests above the HTTP layer.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use super::{ApiError, CreateExampleRequest, Example, ExampleApi};

/// An example created on 2024-01-`day`
pub fn example(id: &str, name: &str, value: f64, day: u32) -> Example {
  Example {
    id: id.to_string(),
    name: name.to_string(),
    value,
    created_at: at(day),
  }
}

fn at(day: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

#[derive(Default)]
struct FakeState {
  list_response: Option<Result<Vec<Example>, ApiError>>,
  list_delay: Duration,
  list_calls: usize,
  create_responses: VecDeque<(Result<Example, ApiError>, Duration)>,
  create_calls: Vec<CreateExampleRequest>,
}

/// Answers every list call with one scripted response and create calls
/// from a queue, recording what it was asked.
#[derive(Clone, Default)]
pub struct FakeApi {
  state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
  pub fn with_list(response: Result<Vec<Example>, ApiError>) -> Self {
    let api = Self::default();
    api.state.lock().unwrap().list_response = Some(response);
    api
  }

  pub fn list_delay(self, delay: Duration) -> Self {
    self.state.lock().unwrap().list_delay = delay;
    self
  }

  pub fn push_create(&self, response: Result<Example, ApiError>, delay: Duration) {
    self
      .state
      .lock()
      .unwrap()
      .create_responses
      .push_back((response, delay));
  }

  pub fn list_calls(&self) -> usize {
    self.state.lock().unwrap().list_calls
  }

  pub fn create_calls(&self) -> Vec<CreateExampleRequest> {
    self.state.lock().unwrap().create_calls.clone()
  }
}

impl ExampleApi for FakeApi {
  fn list_examples(&self) -> impl Future<Output = Result<Vec<Example>, ApiError>> + Send {
    let (response, delay) = {
      let mut state = self.state.lock().unwrap();
      state.list_calls += 1;
      (
        state.list_response.clone().unwrap_or_else(|| Ok(Vec::new())),
        state.list_delay,
      )
    };
    async move {
      tokio::time::sleep(delay).await;
      response
    }
  }

  fn create_example(
    &self,
    request: CreateExampleRequest,
  ) -> impl Future<Output = Result<Example, ApiError>> + Send {
    let (response, delay) = {
      let mut state = self.state.lock().unwrap();
      state.create_calls.push(request);
      state
        .create_responses
        .pop_front()
        .unwrap_or_else(|| (Err(ApiError::Transport("no response scripted".into())), Duration::ZERO))
    };
    async move {
      tokio::time::sleep(delay).await;
      response
    }
  }
}
