//! Session-wide store of known examples and the current selection.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::Example;

#[derive(Debug, Default)]
struct StoreState {
  /// Examples in append order
  examples: Vec<Example>,
  selected_example: Option<Example>,
}

/// Cloneable handle to the session store.
///
/// Created once per session and passed to whoever needs it. Setters replace
/// whole values and never validate; callers are trusted.
#[derive(Debug, Clone, Default)]
pub struct ExampleStore {
  state: Arc<RwLock<StoreState>>,
}

impl ExampleStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn read(&self) -> RwLockReadGuard<'_, StoreState> {
    // Writes are whole-value swaps, so a poisoned lock still holds a
    // consistent state.
    self.state.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
    self.state.write().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn examples(&self) -> Vec<Example> {
    self.read().examples.clone()
  }

  pub fn selected_example(&self) -> Option<Example> {
    self.read().selected_example.clone()
  }

  /// Replace the held collection wholesale (no merge, no dedup)
  pub fn set_examples(&self, examples: Vec<Example>) {
    self.write().examples = examples;
  }

  pub fn set_selected_example(&self, example: Option<Example>) {
    self.write().selected_example = example;
  }
}
