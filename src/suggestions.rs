use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::Backend;
use crate::config::Config;
use crate::data_models::{Dropdown, EventDisposition, Query};
use crate::debounce::{Debounced, Debouncer};

/// Where the latest query is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Debouncing,
    InFlight,
    Rendered,
    SuppressedStale,
    Cancelled,
    Errored,
}

/// How a single input event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Too short: the dropdown was cleared without a request.
    Cleared,
    /// The dropdown now shows this many links.
    Rendered(usize),
    /// A response arrived for a query that is no longer the latest one.
    SuppressedStale,
    Cancelled,
    Errored,
}

impl QueryOutcome {
    fn lifecycle(self) -> Lifecycle {
        match self {
            QueryOutcome::Cleared => Lifecycle::Idle,
            QueryOutcome::Rendered(_) => Lifecycle::Rendered,
            QueryOutcome::SuppressedStale => Lifecycle::SuppressedStale,
            QueryOutcome::Cancelled => Lifecycle::Cancelled,
            QueryOutcome::Errored => Lifecycle::Errored,
        }
    }
}

#[derive(Debug)]
struct ViewState {
    dropdown: Dropdown,
    /// Bumped on every input event; only the latest invocation owns `lifecycle`.
    generation: u64,
    /// Query of the most recently issued request.
    latest_issued: Option<String>,
    lifecycle: Lifecycle,
}

impl ViewState {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn finish(&mut self, generation: u64, outcome: QueryOutcome) -> QueryOutcome {
        if self.is_current(generation) {
            self.lifecycle = outcome.lifecycle();
        }
        outcome
    }
}

struct Shared<B> {
    backend: Arc<B>,
    state: Mutex<ViewState>,
}

impl<B: Backend> Shared<B> {
    async fn run(
        self: Arc<Self>,
        (query, generation): (Query, u64),
        cancel: CancellationToken,
    ) -> QueryOutcome {
        let query = query.as_str();
        {
            let mut state = self.state.lock();
            if cancel.is_cancelled() {
                return state.finish(generation, QueryOutcome::Cancelled);
            }
            state.latest_issued = Some(query.to_string());
            if state.is_current(generation) {
                state.lifecycle = Lifecycle::InFlight;
            }
        }

        let result = self.backend.fetch_suggestions(query, cancel).await;

        let mut state = self.state.lock();
        match result {
            Ok(items) => {
                // Cancellation should already have dropped late responses,
                // this catches whatever slipped through.
                if state.latest_issued.as_deref() != Some(query) {
                    log::debug!("dropping stale suggestions for {query:?}");
                    return state.finish(generation, QueryOutcome::SuppressedStale);
                }
                let count = items.len();
                state.dropdown.render(items);
                state.finish(generation, QueryOutcome::Rendered(count))
            }
            Err(e) if e.is_cancelled() => {
                log::debug!("suggestion request for {query:?} cancelled");
                state.finish(generation, QueryOutcome::Cancelled)
            }
            Err(e) => {
                log::error!("Error fetching suggestions for {query:?}: {e}");
                state.finish(generation, QueryOutcome::Errored)
            }
        }
    }
}

/// Keeps the suggestion dropdown in sync with what the user types.
pub struct SuggestionClient<B> {
    shared: Arc<Shared<B>>,
    debouncer: Debouncer<(Query, u64), QueryOutcome>,
    min_query_len: usize,
}

impl<B: Backend> SuggestionClient<B> {
    pub fn new(backend: Arc<B>, config: &Config) -> SuggestionClient<B> {
        let shared = Arc::new(Shared {
            backend,
            state: Mutex::new(ViewState {
                dropdown: Dropdown::default(),
                generation: 0,
                latest_issued: None,
                lifecycle: Lifecycle::Idle,
            }),
        });

        let runner = shared.clone();
        let debouncer = Debouncer::new(
            config.debounce,
            move |invocation: (Query, u64), cancel: CancellationToken| {
                runner.clone().run(invocation, cancel)
            },
        );

        SuggestionClient {
            shared,
            debouncer,
            min_query_len: config.min_query_len,
        }
    }

    /// Handles an input-change event carrying the raw value of the field.
    pub fn on_input(&self, raw: &str) -> PendingSuggestion {
        let query = Query::new(raw);

        if !query.is_searchable(self.min_query_len) {
            self.debouncer.cancel();
            let mut state = self.shared.state.lock();
            state.generation += 1;
            state.dropdown.clear();
            state.latest_issued = None;
            state.lifecycle = Lifecycle::Idle;
            return PendingSuggestion::ready(QueryOutcome::Cleared);
        }

        let generation = {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            state.lifecycle = Lifecycle::Debouncing;
            state.generation
        };
        PendingSuggestion {
            inner: Pending::Spawned(self.debouncer.call((query, generation))),
        }
    }

    /// Pointer-down inside the dropdown must not blur the input, otherwise
    /// the dropdown would close before the click lands on a link.
    pub fn on_dropdown_pointer_down(&self) -> EventDisposition {
        EventDisposition::PreventDefault
    }

    /// A click that hit neither the input nor the dropdown.
    pub fn on_outside_click(&self) {
        self.shared.state.lock().dropdown.clear();
    }

    /// Navigation target of the link at `index`, if the dropdown shows one.
    pub fn select(&self, index: usize) -> Option<String> {
        let state = self.shared.state.lock();
        if !state.dropdown.visible {
            return None;
        }
        state.dropdown.links.get(index).map(|link| link.href.clone())
    }

    pub fn dropdown(&self) -> Dropdown {
        self.shared.state.lock().dropdown.clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.state.lock().lifecycle
    }

    pub fn latest_issued(&self) -> Option<String> {
        self.shared.state.lock().latest_issued.clone()
    }
}

enum Pending {
    Ready(QueryOutcome),
    Spawned(JoinHandle<Debounced<QueryOutcome>>),
}

/// Handle to the work scheduled by one input event.
pub struct PendingSuggestion {
    inner: Pending,
}

impl PendingSuggestion {
    fn ready(outcome: QueryOutcome) -> PendingSuggestion {
        PendingSuggestion {
            inner: Pending::Ready(outcome),
        }
    }

    pub async fn outcome(self) -> QueryOutcome {
        match self.inner {
            Pending::Ready(outcome) => outcome,
            Pending::Spawned(handle) => match handle.await {
                Ok(Debounced::Completed(outcome)) => outcome,
                Ok(Debounced::Cancelled) => QueryOutcome::Cancelled,
                Err(e) => {
                    log::error!("suggestion task failed: {e}");
                    QueryOutcome::Errored
                }
            },
        }
    }
}
