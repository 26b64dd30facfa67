//! Keyed query cache with async queries and mutations.
//!
//! Modelled on TanStack Query, but explicit: a [`QueryCache`] maps typed keys
//! to [`CacheEntry`] values (data, loading flag, error), a [`Query`] fetches
//! into one entry, and a [`Mutation`] runs write operations and hands back
//! their outcomes.
//!
//! Futures run as spawned tokio tasks. Each finished task posts one message
//! to an [`Inbox`] shared by every query and mutation of its owner, so
//! messages arrive in the order the tasks resolved. The owner drains the
//! inbox from its event loop tick and settles each message in turn; no
//! result is applied anywhere else.
//!
//! # Example
//!
//! ```ignore
//! enum Msg {
//!     List(FetchOutcome<Vec<Example>, ApiError>),
//! }
//!
//! let (reporter, mut inbox) = inbox();
//! let mut cache = QueryCache::new();
//! let mut query = Query::new(ExampleQueryKey::List, reporter, Msg::List, move || {
//!     let api = api.clone();
//!     async move { api.list_examples().await }
//! });
//!
//! query.fetch(&mut cache);
//!
//! // In event loop tick
//! while let Some(msg) = inbox.try_next() {
//!     match msg {
//!         Msg::List(outcome) => query.settle(&mut cache, outcome),
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A logical cache key.
///
/// Keys are typed values rather than strings so parameterized keys (e.g. a
/// filter) hash and compare structurally.
pub trait QueryKey: Clone + Eq + Hash + fmt::Debug + Send + 'static {
  /// Human-readable name used in logs
  fn description(&self) -> String;
}

/// Where a query's entry currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Never fetched and no data
  Idle,
  /// A fetch is outstanding
  Fetching,
  /// Last settled state has data and no error
  Success,
  /// Last fetch failed
  Failure,
}

/// Cached state for one key
#[derive(Debug, Clone)]
pub struct CacheEntry<T, E> {
  data: Option<T>,
  error: Option<E>,
  is_loading: bool,
}

impl<T, E> Default for CacheEntry<T, E> {
  fn default() -> Self {
    Self {
      data: None,
      error: None,
      is_loading: false,
    }
  }
}

impl<T, E> CacheEntry<T, E> {
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  pub fn error(&self) -> Option<&E> {
    self.error.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.is_loading
  }

  pub fn status(&self) -> QueryStatus {
    if self.is_loading {
      QueryStatus::Fetching
    } else if self.error.is_some() {
      QueryStatus::Failure
    } else if self.data.is_some() {
      QueryStatus::Success
    } else {
      QueryStatus::Idle
    }
  }
}

/// Explicit mapping from query keys to cache entries
#[derive(Debug)]
pub struct QueryCache<K, T, E> {
  entries: HashMap<K, CacheEntry<T, E>>,
}

impl<K: QueryKey, T, E> Default for QueryCache<K, T, E> {
  fn default() -> Self {
    Self {
      entries: HashMap::new(),
    }
  }
}

impl<K: QueryKey, T, E> QueryCache<K, T, E> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &K) -> Option<&CacheEntry<T, E>> {
    self.entries.get(key)
  }

  pub fn data(&self, key: &K) -> Option<&T> {
    self.entries.get(key).and_then(CacheEntry::data)
  }

  fn entry_mut(&mut self, key: &K) -> &mut CacheEntry<T, E> {
    self.entries.entry(key.clone()).or_default()
  }

  /// Place initial data in an entry that has none.
  ///
  /// Returns whether the seed was used.
  pub fn seed(&mut self, key: &K, data: T) -> bool {
    let entry = self.entry_mut(key);
    if entry.data.is_some() {
      return false;
    }
    entry.data = Some(data);
    true
  }

  /// Overwrite an entry's data from its current value.
  ///
  /// The updater sees the latest cached data at the moment of the call, not
  /// a copy captured earlier. Clears any error.
  pub fn set_query_data(&mut self, key: &K, updater: impl FnOnce(Option<&T>) -> T) {
    let entry = self.entry_mut(key);
    let next = updater(entry.data.as_ref());
    entry.data = Some(next);
    entry.error = None;
  }

  fn set_loading(&mut self, key: &K, loading: bool) {
    self.entry_mut(key).is_loading = loading;
  }

  fn resolve(&mut self, key: &K, result: Result<T, E>) {
    let entry = self.entry_mut(key);
    match result {
      Ok(data) => {
        entry.data = Some(data);
        entry.error = None;
      }
      // Prior data stays visible next to the error
      Err(error) => entry.error = Some(error),
    }
  }
}

/// Result of one fetch, `None` if the task panicked
pub type FetchOutcome<T, E> = Option<Result<T, E>>;

/// Result of one mutation call with its context, `None` if the task panicked
pub type MutationOutcome<C, T, E> = Option<(C, Result<T, E>)>;

/// Sending half of an [`Inbox`]. Clone it into every query and mutation
/// whose results must be applied in one order.
#[derive(Debug)]
pub struct Reporter<M> {
  tx: mpsc::UnboundedSender<M>,
}

impl<M> Clone for Reporter<M> {
  fn clone(&self) -> Self {
    Self {
      tx: self.tx.clone(),
    }
  }
}

impl<M: Send + 'static> Reporter<M> {
  /// Run `future` on the runtime and post `wrap(output)` when it finishes.
  ///
  /// A panic inside the future is posted as `wrap(None)`, so the in-flight
  /// count still comes down.
  fn spawn<R: Send + 'static>(&self, future: BoxFuture<'static, R>, wrap: fn(Option<R>) -> M) {
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let outcome = AssertUnwindSafe(future).catch_unwind().await.ok();
      // Receiver may have been dropped along with its owner
      let _ = tx.send(wrap(outcome));
    });
  }
}

/// Settled task results in the order the tasks resolved
#[derive(Debug)]
pub struct Inbox<M> {
  rx: mpsc::UnboundedReceiver<M>,
}

impl<M> Inbox<M> {
  /// Next settled result, `None` if nothing has arrived yet
  pub fn try_next(&mut self) -> Option<M> {
    self.rx.try_recv().ok()
  }
}

/// Create a connected reporter and inbox
pub fn inbox<M>() -> (Reporter<M>, Inbox<M>) {
  let (tx, rx) = mpsc::unbounded_channel();
  (Reporter { tx }, Inbox { rx })
}

type FetcherFn<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Async query that fetches into one cache entry.
///
/// There is no cancellation: every started fetch runs to completion and its
/// result is settled in arrival order, so the last one to resolve wins.
pub struct Query<K, T, E, M> {
  key: K,
  fetcher: FetcherFn<T, E>,
  reporter: Reporter<M>,
  wrap: fn(FetchOutcome<T, E>) -> M,
  in_flight: usize,
}

impl<K, T, E, M> Query<K, T, E, M>
where
  K: QueryKey,
  T: Send + 'static,
  E: Send + 'static,
  M: Send + 'static,
{
  /// Create a new query for `key`.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time a fetch starts, and its outcome is posted through
  /// `reporter` as `wrap(outcome)`.
  pub fn new<F, Fut>(
    key: K,
    reporter: Reporter<M>,
    wrap: fn(FetchOutcome<T, E>) -> M,
    fetcher: F,
  ) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    Self {
      key,
      fetcher: Box::new(move || fetcher().boxed()),
      reporter,
      wrap,
      in_flight: 0,
    }
  }

  pub fn is_fetching(&self) -> bool {
    self.in_flight > 0
  }

  /// Start a fetch unless one is already outstanding.
  ///
  /// Returns whether a fetch was started.
  pub fn fetch(&mut self, cache: &mut QueryCache<K, T, E>) -> bool {
    if self.is_fetching() {
      return false;
    }
    self.start_fetch(cache);
    true
  }

  /// Start another fetch even if one is outstanding.
  ///
  /// The earlier fetch is not cancelled; both results are applied.
  pub fn refetch(&mut self, cache: &mut QueryCache<K, T, E>) {
    self.start_fetch(cache);
  }

  /// Apply one fetch outcome taken from the inbox
  pub fn settle(&mut self, cache: &mut QueryCache<K, T, E>, outcome: FetchOutcome<T, E>) {
    self.in_flight = self.in_flight.saturating_sub(1);

    match outcome {
      Some(result) => {
        if result.is_err() {
          warn!(query = %self.key.description(), "query failed");
        } else {
          debug!(query = %self.key.description(), "query resolved");
        }
        cache.resolve(&self.key, result);
      }
      None => warn!(query = %self.key.description(), "query task panicked"),
    }

    cache.set_loading(&self.key, self.is_fetching());
  }

  fn start_fetch(&mut self, cache: &mut QueryCache<K, T, E>) {
    debug!(query = %self.key.description(), "starting fetch");
    self.in_flight += 1;
    cache.set_loading(&self.key, true);
    self.reporter.spawn((self.fetcher)(), self.wrap);
  }
}

impl<K: fmt::Debug, T, E, M> fmt::Debug for Query<K, T, E, M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("in_flight", &self.in_flight)
      .finish_non_exhaustive()
  }
}

/// Outcome of one `Mutation::mutate` call, with the context passed to it
#[derive(Debug)]
pub struct Settled<T, E, C> {
  pub context: C,
  pub result: Result<T, E>,
}

type MutationFn<V, T, E> = Box<dyn Fn(V) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Async write operation.
///
/// Calls are independent: overlapping `mutate` calls are neither queued nor
/// merged. `settle` turns an inbox message back into the call's outcome for
/// the owner to apply.
pub struct Mutation<V, T, E, C, M> {
  mutation_fn: MutationFn<V, T, E>,
  reporter: Reporter<M>,
  wrap: fn(MutationOutcome<C, T, E>) -> M,
  pending: usize,
}

impl<V, T, E, C, M> Mutation<V, T, E, C, M>
where
  V: Send + 'static,
  T: Send + 'static,
  E: Send + 'static,
  C: Send + 'static,
  M: Send + 'static,
{
  pub fn new<F, Fut>(
    reporter: Reporter<M>,
    wrap: fn(MutationOutcome<C, T, E>) -> M,
    mutation_fn: F,
  ) -> Self
  where
    F: Fn(V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    Self {
      mutation_fn: Box::new(move |vars| mutation_fn(vars).boxed()),
      reporter,
      wrap,
      pending: 0,
    }
  }

  /// Whether any call is still in flight
  pub fn is_pending(&self) -> bool {
    self.pending > 0
  }

  /// Start a call. `context` comes back untouched with the outcome.
  pub fn mutate(&mut self, variables: V, context: C) {
    self.pending += 1;
    let future = (self.mutation_fn)(variables);
    let future = async move { (context, future.await) }.boxed();
    self.reporter.spawn(future, self.wrap);
  }

  /// Account for one outcome taken from the inbox.
  ///
  /// Returns `None` for a call whose task panicked; its context is lost.
  pub fn settle(&mut self, outcome: MutationOutcome<C, T, E>) -> Option<Settled<T, E, C>> {
    self.pending = self.pending.saturating_sub(1);
    match outcome {
      Some((context, result)) => Some(Settled { context, result }),
      None => {
        warn!("mutation task panicked");
        None
      }
    }
  }
}

impl<V, T, E, C, M> fmt::Debug for Mutation<V, T, E, C, M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Mutation")
      .field("pending", &self.pending)
      .finish_non_exhaustive()
  }
}
