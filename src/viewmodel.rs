//! View model for the examples screen.
//!
//! Joins the session store, the query cache and the remote API:
//!
//! - the list query is seeded from the store and refreshed from the server,
//!   but a refresh only ever writes the cache;
//! - a successful create appends to the cache and to the store.

use std::borrow::Cow;

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::api::{schema, ApiError, CreateExampleRequest, Example, ExampleApi, ExampleDraft};
use crate::query::{
  self, FetchOutcome, Inbox, Mutation, MutationOutcome, Query, QueryCache, QueryKey, QueryStatus,
  Settled,
};
use crate::store::ExampleStore;

/// Cache keys for example queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExampleQueryKey {
  /// The full collection
  List,
}

impl QueryKey for ExampleQueryKey {
  fn description(&self) -> String {
    match self {
      Self::List => "examples".to_string(),
    }
  }
}

/// Carried alongside each create call until it settles
struct CreateContext {
  /// Store contents when the create was started
  store_snapshot: Vec<Example>,
  responder: oneshot::Sender<Result<Example, ApiError>>,
}

/// Finished list fetches and creates, in the order they resolved
enum Settlement {
  List(FetchOutcome<Vec<Example>, ApiError>),
  Create(MutationOutcome<CreateContext, Example, ApiError>),
}

/// Handle to one in-flight create.
///
/// Resolves after the outcome has been applied to the cache and store, which
/// happens in `ExampleViewModel::poll`. Dropping it is fine.
#[derive(Debug)]
pub struct PendingCreate {
  rx: oneshot::Receiver<Result<Example, ApiError>>,
}

impl PendingCreate {
  /// Non-blocking check, `None` while still in flight
  pub fn try_outcome(&mut self) -> Option<Result<Example, ApiError>> {
    match self.rx.try_recv() {
      Ok(outcome) => Some(outcome),
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => Some(Err(ApiError::Transport(
        "create was abandoned before it settled".to_string(),
      ))),
    }
  }
}

pub struct ExampleViewModel {
  store: ExampleStore,
  cache: QueryCache<ExampleQueryKey, Vec<Example>, ApiError>,
  inbox: Inbox<Settlement>,
  list: Query<ExampleQueryKey, Vec<Example>, ApiError, Settlement>,
  create: Mutation<CreateExampleRequest, Example, ApiError, CreateContext, Settlement>,
}

impl ExampleViewModel {
  pub fn new<A: ExampleApi>(api: A, store: ExampleStore) -> Self {
    let (reporter, inbox) = query::inbox();

    let list_api = api.clone();
    let list = Query::new(
      ExampleQueryKey::List,
      reporter.clone(),
      Settlement::List,
      move || {
        let api = list_api.clone();
        async move { api.list_examples().await }
      },
    );

    let create = Mutation::new(
      reporter,
      Settlement::Create,
      move |request: CreateExampleRequest| {
        let api = api.clone();
        async move { api.create_example(request).await }
      },
    );

    Self {
      store,
      cache: QueryCache::new(),
      inbox,
      list,
      create,
    }
  }

  /// Show the store's examples right away and start a fresh list fetch.
  ///
  /// Starts at most one fetch; calling again while it is outstanding does
  /// nothing.
  pub fn activate(&mut self) {
    let key = ExampleQueryKey::List;
    if self.cache.seed(&key, self.store.examples()) {
      info!("seeded example list from store");
    }
    self.list.fetch(&mut self.cache);
  }

  /// Start another list fetch, even if one is outstanding
  pub fn refresh(&mut self) {
    self.list.refetch(&mut self.cache);
  }

  /// Examples to display: the cached list once there is one, otherwise
  /// whatever the store holds.
  pub fn examples(&self) -> Cow<'_, [Example]> {
    match self.cache.data(&ExampleQueryKey::List) {
      Some(examples) => Cow::Borrowed(examples.as_slice()),
      None => Cow::Owned(self.store.examples()),
    }
  }

  pub fn is_loading(&self) -> bool {
    self
      .cache
      .get(&ExampleQueryKey::List)
      .is_some_and(|e| e.is_loading())
  }

  /// Error from the most recent list fetch, cleared by the next success
  pub fn error(&self) -> Option<&ApiError> {
    self
      .cache
      .get(&ExampleQueryKey::List)
      .and_then(|e| e.error())
  }

  pub fn list_status(&self) -> QueryStatus {
    self
      .cache
      .get(&ExampleQueryKey::List)
      .map(|e| e.status())
      .unwrap_or(QueryStatus::Idle)
  }

  pub fn is_creating(&self) -> bool {
    self.create.is_pending()
  }

  pub fn selected_example(&self) -> Option<Example> {
    self.store.selected_example()
  }

  pub fn select_example(&self, example: Option<Example>) {
    self.store.set_selected_example(example);
  }

  /// Validate a draft and start creating it.
  ///
  /// Invalid input fails here with `ApiError::Validation`; nothing is sent
  /// and no state changes.
  pub fn create_example(&mut self, draft: ExampleDraft) -> Result<PendingCreate, ApiError> {
    let request = schema::validate(&draft).map_err(|e| {
      warn!(error = %e, "rejected example draft");
      ApiError::from(e)
    })?;

    let (responder, rx) = oneshot::channel();
    let context = CreateContext {
      store_snapshot: self.store.examples(),
      responder,
    };
    self.create.mutate(request, context);

    Ok(PendingCreate { rx })
  }

  /// Apply every result that has arrived, in the order they resolved.
  /// Returns `true` if anything changed.
  ///
  /// Call this from the event loop tick.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Some(settlement) = self.inbox.try_next() {
      changed = true;
      match settlement {
        Settlement::List(outcome) => self.list.settle(&mut self.cache, outcome),
        Settlement::Create(outcome) => {
          if let Some(settled) = self.create.settle(outcome) {
            self.apply_create(settled);
          }
        }
      }
    }

    changed
  }

  fn apply_create(&mut self, settled: Settled<Example, ApiError, CreateContext>) {
    let CreateContext {
      store_snapshot,
      responder,
    } = settled.context;

    match &settled.result {
      Ok(example) => {
        // Cache append works on whatever is cached now
        self
          .cache
          .set_query_data(&ExampleQueryKey::List, |current| {
            let mut next = current.cloned().unwrap_or_default();
            next.push(example.clone());
            next
          });

        // Store append works on the snapshot taken when the create started.
        // Two overlapping creates can therefore drop each other's entry
        // from the store; the cache keeps both.
        let mut journal = store_snapshot;
        journal.push(example.clone());
        self.store.set_examples(journal);

        info!(id = %example.id, name = %example.name, "created example");
      }
      Err(e) => warn!(error = %e, "failed to create example"),
    }

    // Caller may have dropped its handle
    let _ = responder.send(settled.result);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::fake::{example, FakeApi};
  use std::time::Duration;

  async fn settle(vm: &mut ExampleViewModel) {
    for _ in 0..200 {
      vm.poll();
      if !vm.is_loading() && !vm.is_creating() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("view model did not settle");
  }

  async fn outcome(mut pending: PendingCreate) -> Result<Example, ApiError> {
    for _ in 0..100 {
      if let Some(outcome) = pending.try_outcome() {
        return outcome;
      }
      tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("create did not settle");
  }

  fn seeded_store() -> ExampleStore {
    let store = ExampleStore::new();
    store.set_examples(vec![example("1", "a", 5.0, 1)]);
    store
  }

  fn ids(examples: &[Example]) -> Vec<&str> {
    examples.iter().map(|e| e.id.as_str()).collect()
  }

  #[tokio::test]
  async fn test_activation_exposes_seed_while_loading() {
    let api = FakeApi::with_list(Ok(Vec::new())).list_delay(Duration::from_millis(20));
    let mut vm = ExampleViewModel::new(api, seeded_store());

    // Before activation the store shows through
    assert_eq!(ids(&vm.examples()), vec!["1"]);
    assert!(!vm.is_loading());
    vm.activate();

    assert!(vm.is_loading());
    assert_eq!(vm.list_status(), QueryStatus::Fetching);
    assert_eq!(ids(&vm.examples()), vec!["1"]);
  }

  #[tokio::test]
  async fn test_fresh_list_replaces_seed_but_not_store() {
    let fresh = vec![example("1", "a", 5.0, 1), example("2", "b", 10.0, 2)];
    let api = FakeApi::with_list(Ok(fresh.clone()));
    let store = seeded_store();
    let mut vm = ExampleViewModel::new(api, store.clone());

    vm.activate();
    settle(&mut vm).await;

    assert_eq!(vm.examples().as_ref(), fresh.as_slice());
    assert!(!vm.is_loading());
    assert!(vm.error().is_none());
    assert_eq!(vm.list_status(), QueryStatus::Success);
    // List refreshes never write back to the store
    assert_eq!(ids(&store.examples()), vec!["1"]);
  }

  #[tokio::test]
  async fn test_list_failure_keeps_seed_visible() {
    let api = FakeApi::with_list(Err(ApiError::Server {
      status: 500,
      body: "internal".to_string(),
    }));
    let mut vm = ExampleViewModel::new(api, seeded_store());

    vm.activate();
    settle(&mut vm).await;

    assert_eq!(ids(&vm.examples()), vec!["1"]);
    assert_eq!(vm.error().and_then(ApiError::status), Some(500));
    assert!(!vm.is_loading());
    assert_eq!(vm.list_status(), QueryStatus::Failure);
  }

  #[tokio::test]
  async fn test_activate_starts_one_fetch_and_refresh_starts_another() {
    let api = FakeApi::with_list(Ok(Vec::new())).list_delay(Duration::from_millis(10));
    let mut vm = ExampleViewModel::new(api.clone(), ExampleStore::new());

    vm.activate();
    vm.activate();
    assert_eq!(api.list_calls(), 1);

    vm.refresh();
    assert_eq!(api.list_calls(), 2);

    settle(&mut vm).await;
    assert!(!vm.is_loading());
  }

  #[tokio::test]
  async fn test_invalid_create_fails_before_any_call() {
    let api = FakeApi::with_list(Ok(vec![example("1", "a", 5.0, 1)]));
    let store = seeded_store();
    let mut vm = ExampleViewModel::new(api.clone(), store.clone());
    vm.activate();
    settle(&mut vm).await;

    let err = vm
      .create_example(ExampleDraft::new("c", -1.0))
      .unwrap_err();

    match err {
      ApiError::Validation(v) => assert!(v.violations().iter().any(|f| f.field == "value")),
      other => panic!("expected validation error, got {:?}", other),
    }
    assert!(!vm.is_creating());
    assert!(api.create_calls().is_empty());
    assert_eq!(ids(&vm.examples()), vec!["1"]);
    assert_eq!(ids(&store.examples()), vec!["1"]);

    assert!(vm.create_example(ExampleDraft::new("", 2.0)).is_err());
    assert!(api.create_calls().is_empty());
  }

  #[tokio::test]
  async fn test_create_appends_to_cache_and_store() {
    let api = FakeApi::with_list(Ok(vec![example("1", "a", 5.0, 1)]));
    let created = example("3", "c", 3.0, 3);
    api.push_create(Ok(created.clone()), Duration::from_millis(5));
    let store = seeded_store();
    let mut vm = ExampleViewModel::new(api.clone(), store.clone());
    vm.activate();
    settle(&mut vm).await;

    let pending = vm.create_example(ExampleDraft::new("c", 3.0)).unwrap();
    assert!(vm.is_creating());

    settle(&mut vm).await;

    assert!(!vm.is_creating());
    assert_eq!(vm.examples().last(), Some(&created));
    assert_eq!(store.examples().last(), Some(&created));
    assert_eq!(ids(&vm.examples()), vec!["1", "3"]);
    assert_eq!(ids(&store.examples()), vec!["1", "3"]);
    assert_eq!(outcome(pending).await.unwrap(), created);

    // The request reached the API unchanged
    let calls = api.create_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name(), "c");
    assert_eq!(calls[0].value(), 3.0);
  }

  #[tokio::test]
  async fn test_failed_create_changes_nothing() {
    let api = FakeApi::with_list(Ok(vec![example("1", "a", 5.0, 1)]));
    api.push_create(
      Err(ApiError::Server {
        status: 503,
        body: "down".to_string(),
      }),
      Duration::ZERO,
    );
    let store = seeded_store();
    let mut vm = ExampleViewModel::new(api, store.clone());
    vm.activate();
    settle(&mut vm).await;

    let pending = vm.create_example(ExampleDraft::new("c", 3.0)).unwrap();
    settle(&mut vm).await;

    assert_eq!(ids(&vm.examples()), vec!["1"]);
    assert_eq!(ids(&store.examples()), vec!["1"]);
    assert!(vm.error().is_none());
    assert_eq!(outcome(pending).await.unwrap_err().status(), Some(503));
  }

  #[tokio::test]
  async fn test_overlapping_creates_lose_a_store_update() {
    let api = FakeApi::with_list(Ok(vec![example("1", "a", 5.0, 1)]));
    api.push_create(Ok(example("2", "first", 1.0, 2)), Duration::from_millis(5));
    api.push_create(Ok(example("3", "second", 2.0, 3)), Duration::from_millis(30));
    let store = seeded_store();
    let mut vm = ExampleViewModel::new(api, store.clone());
    vm.activate();
    settle(&mut vm).await;

    vm.create_example(ExampleDraft::new("first", 1.0)).unwrap();
    vm.create_example(ExampleDraft::new("second", 2.0)).unwrap();
    settle(&mut vm).await;

    // Cache keeps both appends
    assert_eq!(ids(&vm.examples()), vec!["1", "2", "3"]);
    // Store: the second append was built on a snapshot without the first
    assert_eq!(ids(&store.examples()), vec!["1", "3"]);
  }

  #[tokio::test]
  async fn test_create_after_list_error_clears_error() {
    let api = FakeApi::with_list(Err(ApiError::Transport("offline".to_string())));
    api.push_create(Ok(example("3", "c", 3.0, 3)), Duration::ZERO);
    let mut vm = ExampleViewModel::new(api, seeded_store());
    vm.activate();
    settle(&mut vm).await;
    assert!(vm.error().is_some());

    vm.create_example(ExampleDraft::new("c", 3.0)).unwrap();
    settle(&mut vm).await;

    assert!(vm.error().is_none());
    assert_eq!(ids(&vm.examples()), vec!["1", "3"]);
  }

  #[tokio::test]
  async fn test_selection_goes_through_store() {
    let store = ExampleStore::new();
    let vm = ExampleViewModel::new(FakeApi::default(), store.clone());
    let picked = example("7", "g", 7.0, 7);

    vm.select_example(Some(picked.clone()));
    assert_eq!(store.selected_example(), Some(picked.clone()));
    assert_eq!(vm.selected_example(), Some(picked));

    vm.select_example(None);
    assert!(store.selected_example().is_none());
  }

  #[tokio::test]
  async fn test_list_resolving_after_create_replaces_cache() {
    let api = FakeApi::with_list(Ok(vec![example("1", "a", 5.0, 1)]));
    let store = seeded_store();
    let mut vm = ExampleViewModel::new(api.clone(), store.clone());
    vm.activate();
    settle(&mut vm).await;

    // Slow refresh first, fast create second: the create resolves first
    let api_slow = api.list_delay(Duration::from_millis(30));
    api_slow.push_create(Ok(example("3", "c", 3.0, 3)), Duration::from_millis(5));
    vm.refresh();
    vm.create_example(ExampleDraft::new("c", 3.0)).unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(vm.poll());

    // Applied in resolution order, so the later list result wins the cache
    assert_eq!(ids(&vm.examples()), vec!["1"]);
    assert_eq!(ids(&store.examples()), vec!["1", "3"]);
    assert!(!vm.is_loading());
    assert!(!vm.is_creating());
  }

  #[tokio::test]
  async fn test_create_resolving_after_list_is_appended() {
    let api = FakeApi::with_list(Ok(vec![example("1", "a", 5.0, 1)]));
    let mut vm = ExampleViewModel::new(api.clone(), seeded_store());
    vm.activate();
    settle(&mut vm).await;

    let api_fast = api.list_delay(Duration::from_millis(5));
    api_fast.push_create(Ok(example("3", "c", 3.0, 3)), Duration::from_millis(30));
    vm.create_example(ExampleDraft::new("c", 3.0)).unwrap();
    vm.refresh();

    tokio::time::sleep(Duration::from_millis(80)).await;
    vm.poll();

    assert_eq!(ids(&vm.examples()), vec!["1", "3"]);
  }
}
