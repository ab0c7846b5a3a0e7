//! Shared query/mutation client.
//!
//! Queries are cached by [`QueryKey`]; the first observer schedules a fetch
//! and every observer reads the current snapshot. Mutations report `Pending`
//! as soon as they are issued. Scheduled work runs when the host event loop
//! calls [`QueryClient::run_pending`]; the last completed result wins.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chain_eth::abi::AbiValue;

use crate::error::RequestError;
use crate::lock;
use crate::params::Balance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No data yet.
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Fetching,
    Idle,
}

/// Snapshot of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub status: QueryStatus,
    pub fetch_status: FetchStatus,
    pub data: Option<T>,
    pub error: Option<RequestError>,
}

impl<T> QueryResult<T> {
    /// A query that is not allowed to run (e.g. missing address).
    pub fn disabled() -> Self {
        Self {
            status: QueryStatus::Pending,
            fetch_status: FetchStatus::Idle,
            data: None,
            error: None,
        }
    }

    fn fetching() -> Self {
        Self {
            fetch_status: FetchStatus::Fetching,
            ..Self::disabled()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    /// First fetch in flight: pending and fetching.
    pub fn is_loading(&self) -> bool {
        self.is_pending() && self.is_fetching()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_status == FetchStatus::Fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub(crate) fn map_data<U>(self, f: impl FnOnce(T) -> Option<U>) -> QueryResult<U> {
        QueryResult {
            status: self.status,
            fetch_status: self.fetch_status,
            data: self.data.and_then(f),
            error: self.error,
        }
    }
}

/// Cached query payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Contract(AbiValue),
    Balance(Balance),
}

/// Identity of a cached query: its kind plus serialised parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    kind: &'static str,
    params: String,
}

impl QueryKey {
    pub fn new(kind: &'static str, params: &serde_json::Value) -> Self {
        Self {
            kind,
            params: params.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

type QueryFn = Arc<dyn Fn() -> Result<QueryData, RequestError> + Send + Sync>;
type MutationJob = Box<dyn FnOnce() + Send>;

struct QueryEntry {
    result: QueryResult<QueryData>,
    fetch: QueryFn,
}

enum Work {
    Fetch(QueryKey),
    Mutate(MutationJob),
}

#[derive(Default)]
struct ClientState {
    queries: HashMap<QueryKey, QueryEntry>,
    queue: VecDeque<Work>,
}

/// The query/mutation client shared by every consumer of a session.
#[derive(Default)]
pub struct QueryClient {
    state: Mutex<ClientState>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes a query, scheduling a fetch on first observation and again
    /// whenever the last fetch failed.
    ///
    /// `fetch` replaces the stored fetcher so refetches use the most
    /// recently rendered closure.
    pub fn query(
        &self,
        key: QueryKey,
        fetch: impl Fn() -> Result<QueryData, RequestError> + Send + Sync + 'static,
    ) -> QueryResult<QueryData> {
        let mut state = lock(&self.state);
        let fetch: QueryFn = Arc::new(fetch);

        if let Some(entry) = state.queries.get_mut(&key) {
            entry.fetch = fetch;
            let retry = entry.result.is_error() && !entry.result.is_fetching();
            if retry {
                entry.result.fetch_status = FetchStatus::Fetching;
            }
            let result = entry.result.clone();
            if retry {
                tracing::debug!(kind = key.kind, "retrying failed query");
                state.queue.push_back(Work::Fetch(key));
            }
            return result;
        }

        tracing::debug!(kind = key.kind, "scheduling query");
        let result = QueryResult::fetching();
        state.queries.insert(
            key.clone(),
            QueryEntry {
                result: result.clone(),
                fetch,
            },
        );
        state.queue.push_back(Work::Fetch(key));
        result
    }

    /// Current snapshot of a query without observing it.
    pub fn peek(&self, key: &QueryKey) -> Option<QueryResult<QueryData>> {
        lock(&self.state).queries.get(key).map(|e| e.result.clone())
    }

    /// Refetches every cached query of the given kind.
    pub fn invalidate(&self, kind: &str) {
        self.invalidate_where(|key| key.kind == kind);
    }

    pub fn invalidate_all(&self) {
        self.invalidate_where(|_| true);
    }

    fn invalidate_where(&self, matches: impl Fn(&QueryKey) -> bool) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        for (key, entry) in state.queries.iter_mut() {
            if matches(key) && !entry.result.is_fetching() {
                entry.result.fetch_status = FetchStatus::Fetching;
                state.queue.push_back(Work::Fetch(key.clone()));
            }
        }
    }

    /// Drops a cached query. A fetch already scheduled for it is skipped.
    pub fn remove(&self, key: &QueryKey) -> Option<QueryResult<QueryData>> {
        lock(&self.state).queries.remove(key).map(|e| e.result)
    }

    /// Drops every cached query. Scheduled mutations still run.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        tracing::debug!(count = state.queries.len(), "clearing query cache");
        state.queries.clear();
    }

    /// Number of cached queries.
    pub fn len(&self) -> usize {
        lock(&self.state).queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn enqueue_mutation(&self, job: MutationJob) {
        lock(&self.state).queue.push_back(Work::Mutate(job));
    }

    /// Number of scheduled but not yet executed jobs.
    pub fn pending_work(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Runs scheduled work until the queue is empty, including work
    /// scheduled by callbacks along the way. Returns the number of jobs run.
    ///
    /// No lock is held while a fetcher, mutation or callback executes.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;

        loop {
            let work = lock(&self.state).queue.pop_front();
            let Some(work) = work else {
                return ran;
            };
            ran += 1;

            match work {
                Work::Fetch(key) => {
                    let fetch = match lock(&self.state).queries.get(&key) {
                        Some(entry) => entry.fetch.clone(),
                        None => continue,
                    };
                    let outcome = fetch();
                    self.settle_query(&key, outcome);
                }
                Work::Mutate(job) => job(),
            }
        }
    }

    fn settle_query(&self, key: &QueryKey, outcome: Result<QueryData, RequestError>) {
        let mut state = lock(&self.state);
        let Some(entry) = state.queries.get_mut(key) else {
            return;
        };
        let result = &mut entry.result;
        result.fetch_status = FetchStatus::Idle;
        match outcome {
            Ok(data) => {
                result.status = QueryStatus::Success;
                result.data = Some(data);
                result.error = None;
            }
            Err(e) => {
                tracing::debug!(kind = key.kind, error = %e, "query failed");
                // Previously fetched data stays visible next to the error.
                result.status = QueryStatus::Error;
                result.error = Some(e);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Snapshot of a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationState<T> {
    pub status: MutationStatus,
    pub data: Option<T>,
    pub error: Option<RequestError>,
}

impl<T> MutationState<T> {
    pub fn idle() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == MutationStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

/// Per-call callbacks, fired after the mutation state is stored.
pub struct MutateOptions<T> {
    on_success: Option<Box<dyn FnOnce(&T) + Send>>,
    on_error: Option<Box<dyn FnOnce(&RequestError) + Send>>,
    on_settled: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Default for MutateOptions<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }
}

impl<T> MutateOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&RequestError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_settled(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_settled = Some(Box::new(f));
        self
    }
}

struct MutationSlot<T> {
    state: MutationState<T>,
    generation: u64,
}

/// A mutation observer: one per hook instance.
///
/// Only the most recent `mutate` call updates the state and fires its
/// callbacks; results of superseded calls are dropped.
pub struct Mutation<T> {
    client: Arc<QueryClient>,
    slot: Arc<Mutex<MutationSlot<T>>>,
}

impl<T: Clone + Send + 'static> Mutation<T> {
    pub fn new(client: Arc<QueryClient>) -> Self {
        Self {
            client,
            slot: Arc::new(Mutex::new(MutationSlot {
                state: MutationState::idle(),
                generation: 0,
            })),
        }
    }

    pub fn state(&self) -> MutationState<T> {
        lock(&self.slot).state.clone()
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).state.is_pending()
    }

    /// Marks the mutation pending and schedules `job`.
    pub fn mutate(
        &self,
        job: impl FnOnce() -> Result<T, RequestError> + Send + 'static,
        options: MutateOptions<T>,
    ) {
        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.state = MutationState {
                status: MutationStatus::Pending,
                data: None,
                error: None,
            };
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        self.client.enqueue_mutation(Box::new(move || {
            let outcome = job();
            {
                let mut slot = lock(&slot);
                if slot.generation != generation {
                    return;
                }
                slot.state = match &outcome {
                    Ok(data) => MutationState {
                        status: MutationStatus::Success,
                        data: Some(data.clone()),
                        error: None,
                    },
                    Err(e) => MutationState {
                        status: MutationStatus::Error,
                        data: None,
                        error: Some(e.clone()),
                    },
                };
            }

            match &outcome {
                Ok(data) => {
                    if let Some(f) = options.on_success {
                        f(data);
                    }
                }
                Err(e) => {
                    if let Some(f) = options.on_error {
                        f(e);
                    }
                }
            }
            if let Some(f) = options.on_settled {
                f();
            }
        }));
    }

    /// Back to `Idle`; an in-flight call will no longer report.
    pub fn reset(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.state = MutationState::idle();
    }
}
