//! Local copy of a server-side list, shared by a view's operations.
//!
//! Every load takes a generation ticket; a response that arrives after a
//! newer load started, or after a local mutation, is dropped. Mutations go through [`Collection::mutate`]:
//! apply locally, call the server, and on failure run the caller's reconcile
//! step (normally a full reload).

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, error};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started before this one finished; its result was kept instead.
    Superseded,
}

struct State<T> {
    items: Vec<T>,
    generation: u64,
}

pub struct Collection<T> {
    state: Mutex<State<T>>,
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: Vec::new(),
                generation: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.lock().items.iter().find(|item| pred(item)).cloned()
    }

    pub fn begin_load(&self) -> LoadTicket {
        let mut state = self.lock();
        state.generation += 1;
        LoadTicket(state.generation)
    }

    /// Replaces the items wholesale, unless a newer load has begun.
    pub fn finish_load(&self, ticket: LoadTicket, items: Vec<T>) -> LoadOutcome {
        let mut state = self.lock();
        if ticket.0 != state.generation {
            debug!(
                "discarding load {} (current generation {})",
                ticket.0, state.generation
            );
            return LoadOutcome::Superseded;
        }
        state.items = items;
        LoadOutcome::Applied
    }

    pub async fn load<F>(&self, fetch: F) -> Result<LoadOutcome, ClientError>
    where
        F: Future<Output = Result<Vec<T>, ClientError>>,
    {
        let ticket = self.begin_load();
        let items = fetch.await?;
        Ok(self.finish_load(ticket, items))
    }

    /// Changes the items in place. Any load still in flight was read before
    /// this change and is superseded by it.
    pub fn apply(&self, change: impl FnOnce(&mut Vec<T>)) {
        let mut state = self.lock();
        state.generation += 1;
        change(&mut state.items);
    }

    /// Optimistic mutation: `apply` runs immediately, then `remote` is
    /// awaited. If it fails the error is logged, `reconcile` runs, and the
    /// error is still returned to the caller.
    pub async fn mutate<R, Remote, Reconcile, ReconcileFut>(
        &self,
        apply: impl FnOnce(&mut Vec<T>),
        remote: Remote,
        reconcile: Reconcile,
    ) -> Result<R, ClientError>
    where
        Remote: Future<Output = Result<R, ClientError>>,
        Reconcile: FnOnce() -> ReconcileFut,
        ReconcileFut: Future<Output = ()>,
    {
        self.apply(apply);
        match remote.await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("mutation failed, reconciling: {}", e);
                reconcile().await;
                Err(e)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
