//! Cross-view refresh requests.
//!
//! A view that changes data another view displays emits on the
//! [`RefreshSignal`]; the other view holds a [`RefreshSubscription`] and
//! reloads on each request. Requests emitted while nobody is subscribed are
//! queued and handed to the next subscriber.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshCause {
    CategoryCreated,
    CategoryRenamed,
    CategoryDeleted,
    /// A mutation failed and the emitter reloaded from the server.
    Resynced,
}

impl fmt::Display for RefreshCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshCause::CategoryCreated => "category created",
            RefreshCause::CategoryRenamed => "category renamed",
            RefreshCause::CategoryDeleted => "category deleted",
            RefreshCause::Resynced => "resynced",
        };
        f.write_str(name)
    }
}

struct Inner {
    tx: broadcast::Sender<RefreshCause>,
    backlog: VecDeque<RefreshCause>,
}

#[derive(Clone)]
pub struct RefreshSignal {
    inner: Arc<Mutex<Inner>>,
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tx,
                backlog: VecDeque::new(),
            })),
        }
    }

    /// Fire-and-forget. Identical queued requests are coalesced since a
    /// reload is idempotent.
    pub fn emit(&self, cause: RefreshCause) {
        let mut inner = self.lock();
        if inner.tx.receiver_count() == 0 {
            if !inner.backlog.contains(&cause) {
                inner.backlog.push_back(cause);
            }
            debug!("refresh queued ({}), no subscriber", cause);
            return;
        }
        if inner.tx.send(cause).is_err() {
            inner.backlog.push_back(cause);
        }
    }

    /// Starts receiving requests, including any queued while unsubscribed.
    pub fn subscribe(&self) -> RefreshSubscription {
        let mut inner = self.lock();
        let rx = inner.tx.subscribe();
        let pending = std::mem::take(&mut inner.backlog);
        RefreshSubscription { rx, pending }
    }

    pub fn queued(&self) -> usize {
        self.lock().backlog.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct RefreshSubscription {
    rx: broadcast::Receiver<RefreshCause>,
    pending: VecDeque<RefreshCause>,
}

impl RefreshSubscription {
    /// Waits for the next request. Returns `None` once every
    /// [`RefreshSignal`] handle is gone.
    pub async fn recv(&mut self) -> Option<RefreshCause> {
        if let Some(cause) = self.pending.pop_front() {
            return Some(cause);
        }
        match self.rx.recv().await {
            Ok(cause) => Some(cause),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "refresh subscriber lagged");
                Some(RefreshCause::Resynced)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    pub fn try_recv(&mut self) -> Option<RefreshCause> {
        if let Some(cause) = self.pending.pop_front() {
            return Some(cause);
        }
        match self.rx.try_recv() {
            Ok(cause) => Some(cause),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                warn!(skipped = n, "refresh subscriber lagged");
                Some(RefreshCause::Resynced)
            }
            Err(_) => None,
        }
    }

    /// Takes every request available right now.
    pub fn drain(&mut self) -> Vec<RefreshCause> {
        let mut causes = Vec::new();
        while let Some(cause) = self.try_recv() {
            causes.push(cause);
        }
        causes
    }
}
