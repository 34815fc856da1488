//! Remote store abstraction: a publish/subscribe key-value store holding
//! drawings.

mod memory;
mod websocket;

pub use memory::MemoryStore;
pub use websocket::WebSocketStore;

use crate::stroke::Drawing;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use thiserror::Error;

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Remote store is offline")]
    Offline,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Write rejected: {0}")]
    Rejected(String),
    #[error("Timed out waiting for the remote store")]
    Timeout,
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future for remote operations. Owns everything it needs, so it can
/// be held across frames by the UI.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Callback receiving the full value of a watched record.
pub type Listener = Box<dyn FnMut(Drawing) + Send + 'static>;

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub(crate) u64);

/// Trait for remote store backends.
///
/// Every backend keeps whole records: a write replaces the value, and a
/// watcher sees full values, never diffs.
pub trait RemoteStore: Send + Sync {
    /// Overwrite the record at `key`.
    fn write(&self, key: &str, value: Drawing) -> BoxFuture<RemoteResult<()>>;

    /// Register `listener` for the record at `key`. It is called with the
    /// current value (empty if never written) and again on every change.
    /// Intermediate values may be skipped; the latest value always arrives.
    fn watch(&self, key: &str, listener: Listener) -> RemoteResult<WatchId>;

    /// Remove a listener. Unknown IDs are ignored.
    fn unwatch(&self, id: WatchId);

    /// Deliver queued changes to listeners on the calling thread.
    fn pump(&self) {}
}

/// A future that resolves once the outcome is delivered through a
/// [`Completer`].
pub(crate) struct Pending {
    slot: Arc<Mutex<Slot>>,
}

/// The producing side of a [`Pending`] future.
#[derive(Clone)]
pub(crate) struct Completer {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Default)]
struct Slot {
    completed: bool,
    outcome: Option<RemoteResult<()>>,
    waker: Option<Waker>,
}

pub(crate) fn pending() -> (Pending, Completer) {
    let slot = Arc::new(Mutex::new(Slot::default()));
    (Pending { slot: slot.clone() }, Completer { slot })
}

impl Completer {
    /// Deliver the outcome. Later calls are ignored.
    pub(crate) fn complete(&self, outcome: RemoteResult<()>) {
        let waker = match self.slot.lock() {
            Ok(mut slot) => {
                if slot.completed {
                    return;
                }
                slot.completed = true;
                slot.outcome = Some(outcome);
                slot.waker.take()
            }
            Err(_) => None,
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl Future for Pending {
    type Output = RemoteResult<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Ok(mut slot) = self.slot.lock() else {
            return Poll::Ready(Err(RemoteError::Transport("Lock error".to_string())));
        };
        match slot.outcome.take() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_resolves_from_other_thread() {
        let (future, completer) = pending();
        let handle = std::thread::spawn(move || completer.complete(Ok(())));
        assert_eq!(pollster::block_on(future), Ok(()));
        handle.join().unwrap();
    }

    #[test]
    fn test_first_outcome_wins() {
        let (future, completer) = pending();
        completer.complete(Err(RemoteError::Timeout));
        completer.complete(Ok(()));
        assert_eq!(pollster::block_on(future), Err(RemoteError::Timeout));
    }
}
