//! Adapter lifecycle: `Preparing → Ready | Error`

use crate::core::error::AdapterError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{error, info};

type Outcome = std::result::Result<(), Arc<anyhow::Error>>;

/// Observable lifecycle state of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Preparing,
    Ready,
    Error,
}

enum Settlement {
    Pending(Vec<oneshot::Sender<Outcome>>),
    Ready,
    Failed(Arc<anyhow::Error>),
}

/// One-shot state machine gating adapter usage
///
/// Starts in [`AdapterState::Preparing`]. The first call to
/// [`mark_ready`](Self::mark_ready) or [`mark_error`](Self::mark_error)
/// settles it for good; later transitions are ignored.
pub struct Lifecycle {
    adapter: String,
    settlement: Mutex<Settlement>,
}

impl Lifecycle {
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            settlement: Mutex::new(Settlement::Pending(Vec::new())),
        }
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    pub fn state(&self) -> AdapterState {
        match &*self.lock() {
            Settlement::Pending(_) => AdapterState::Preparing,
            Settlement::Ready => AdapterState::Ready,
            Settlement::Failed(_) => AdapterState::Error,
        }
    }

    /// The fault that put the adapter in the error state
    pub fn fault(&self) -> Option<Arc<anyhow::Error>> {
        match &*self.lock() {
            Settlement::Failed(cause) => Some(cause.clone()),
            _ => None,
        }
    }

    /// Transition to `Ready`, waking every waiter
    ///
    /// Returns `false` if the lifecycle had already settled.
    pub fn mark_ready(&self) -> bool {
        let waiters = {
            let mut settlement = self.lock();
            let Settlement::Pending(waiters) = &mut *settlement else {
                return false;
            };
            let waiters = std::mem::take(waiters);
            *settlement = Settlement::Ready;
            waiters
        };

        info!(adapter = %self.adapter, waiters = waiters.len(), "adapter ready");
        for waiter in waiters {
            let _ = waiter.send(Ok(()));
        }
        true
    }

    /// Transition to `Error`, failing every waiter with `cause`
    ///
    /// Returns `false` if the lifecycle had already settled.
    pub fn mark_error(&self, cause: anyhow::Error) -> bool {
        let cause = Arc::new(cause);
        let waiters = {
            let mut settlement = self.lock();
            let Settlement::Pending(waiters) = &mut *settlement else {
                return false;
            };
            let waiters = std::mem::take(waiters);
            *settlement = Settlement::Failed(cause.clone());
            waiters
        };

        error!(adapter = %self.adapter, error = %cause, "adapter failed to initialize");
        for waiter in waiters {
            let _ = waiter.send(Err(cause.clone()));
        }
        true
    }

    /// Wait until the adapter is usable
    ///
    /// Resolves immediately once settled. Any number of callers may wait
    /// concurrently; each gets its own outcome.
    pub async fn wait_ready(&self) -> Result<(), AdapterError> {
        let receiver = {
            let mut settlement = self.lock();
            match &mut *settlement {
                Settlement::Ready => return Ok(()),
                Settlement::Failed(cause) => return Err(self.initialization_error(cause.clone())),
                Settlement::Pending(waiters) => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    receiver
                }
            }
        };

        match receiver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(cause)) => Err(self.initialization_error(cause)),
            Err(_) => Err(AdapterError::Abandoned {
                adapter: self.adapter.clone(),
            }),
        }
    }

    fn initialization_error(&self, cause: Arc<anyhow::Error>) -> AdapterError {
        AdapterError::Initialization {
            adapter: self.adapter.clone(),
            cause,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Settlement> {
        self.settlement.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("adapter", &self.adapter)
            .field("state", &self.state())
            .finish()
    }
}
