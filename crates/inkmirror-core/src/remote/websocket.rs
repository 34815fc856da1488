//! Remote store backed by the relay server over WebSocket.

use super::{pending, BoxFuture, Completer, Listener, RemoteError, RemoteResult, RemoteStore, WatchId};
use crate::config::SyncConfig;
use crate::protocol::{ClientMessage, ServerMessage, PERMISSION_DENIED};
use crate::stroke::Drawing;
use crate::transport::{Connection, ConnectionState, FrameHandler};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Watch {
    key: String,
    /// Taken out while the listener runs.
    listener: Option<Listener>,
    /// Newest undelivered value.
    latest: Option<Drawing>,
}

/// State shared between the UI thread and the socket thread.
#[derive(Default)]
struct Shared {
    pending: Mutex<HashMap<u64, (Instant, Completer)>>,
    watches: Mutex<BTreeMap<WatchId, Watch>>,
}

impl Shared {
    fn track(&self, request_id: u64, deadline: Instant, completer: Completer) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(request_id, (deadline, completer));
        }
    }

    fn finish(&self, request_id: u64, outcome: RemoteResult<()>) {
        let entry = self.pending.lock().ok().and_then(|mut p| p.remove(&request_id));
        match entry {
            Some((_, completer)) => completer.complete(outcome),
            None => log::debug!("Reply for unknown request {}", request_id),
        }
    }

    fn fail_all(&self, error: RemoteError) {
        let drained: Vec<_> = match self.pending.lock() {
            Ok(mut pending) => pending.drain().collect(),
            Err(_) => return,
        };
        for (_, (_, completer)) in drained {
            completer.complete(Err(error.clone()));
        }
    }

    /// Fail every write whose deadline has passed.
    fn expire(&self, now: Instant) {
        let expired: Vec<_> = match self.pending.lock() {
            Ok(mut pending) => {
                let ids: Vec<u64> = pending
                    .iter()
                    .filter(|(_, (deadline, _))| *deadline <= now)
                    .map(|(id, _)| *id)
                    .collect();
                ids.into_iter().filter_map(|id| pending.remove(&id)).collect()
            }
            Err(_) => return,
        };
        for (_, completer) in expired {
            log::warn!("Remote write timed out");
            completer.complete(Err(RemoteError::Timeout));
        }
    }

    fn store_value(&self, key: &str, value: Drawing) {
        if let Ok(mut watches) = self.watches.lock() {
            for watch in watches.values_mut().filter(|w| w.key == key) {
                watch.latest = Some(value.clone());
            }
        }
    }

    /// Hand each watch its newest value. Listeners run without the lock held.
    fn deliver(&self) {
        let ready: Vec<(WatchId, Listener, Drawing)> = match self.watches.lock() {
            Ok(mut watches) => watches
                .iter_mut()
                .filter_map(|(id, watch)| {
                    if watch.listener.is_none() {
                        return None;
                    }
                    let value = watch.latest.take()?;
                    let listener = watch.listener.take()?;
                    Some((*id, listener, value))
                })
                .collect(),
            Err(_) => return,
        };

        for (id, mut listener, value) in ready {
            listener(value);
            if let Ok(mut watches) = self.watches.lock() {
                if let Some(watch) = watches.get_mut(&id) {
                    watch.listener = Some(listener);
                }
            }
        }
    }

    fn handle(&self, message: ServerMessage) {
        match message {
            ServerMessage::Value { key, value } => {
                self.store_value(&key, value.unwrap_or_default());
            }
            ServerMessage::Ack { request_id } => self.finish(request_id, Ok(())),
            ServerMessage::Rejected { request_id, reason } => {
                let error = if reason == PERMISSION_DENIED {
                    RemoteError::PermissionDenied
                } else {
                    RemoteError::Rejected(reason)
                };
                self.finish(request_id, Err(error));
            }
            ServerMessage::Error { message } => {
                log::warn!("Server error: {}", message);
            }
        }
    }
}

/// Routes socket-thread callbacks into [`Shared`].
struct StoreHandler {
    shared: Arc<Shared>,
}

impl FrameHandler for StoreHandler {
    fn on_open(&mut self) {
        log::info!("Remote store connected");
    }

    fn on_text(&mut self, text: String) {
        match serde_json::from_str::<ServerMessage>(&text) {
            Ok(message) => self.shared.handle(message),
            Err(e) => log::warn!("Failed to parse server message: {}", e),
        }
    }

    fn on_tick(&mut self) {
        self.shared.expire(Instant::now());
    }

    fn on_close(&mut self, error: Option<String>) {
        match error {
            Some(e) => log::warn!("Remote store disconnected: {}", e),
            None => log::info!("Remote store disconnected"),
        }
        self.shared.fail_all(RemoteError::Offline);
    }
}

/// Remote store talking to `inkmirror-server`.
///
/// Changes pushed by the server are coalesced per watch and handed to
/// listeners on [`pump`](RemoteStore::pump).
pub struct WebSocketStore {
    connection: Connection,
    shared: Arc<Shared>,
    next_request: AtomicU64,
    next_watch: AtomicU64,
    request_timeout: Duration,
}

impl WebSocketStore {
    /// Start connecting to `config.endpoint` and announce the project.
    pub fn connect(config: &SyncConfig) -> RemoteResult<Self> {
        let shared = Arc::new(Shared::default());
        let handler = StoreHandler { shared: shared.clone() };
        let connection = Connection::open(&config.endpoint, handler)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let store = Self {
            connection,
            shared,
            next_request: AtomicU64::new(1),
            next_watch: AtomicU64::new(1),
            request_timeout: config.request_timeout,
        };
        let hello = ClientMessage::Hello {
            project_id: config.project_id.clone(),
            credentials: config.credentials.clone(),
        };
        // A handshake that already failed surfaces on the first write.
        if let Err(e) = store.send(&hello) {
            log::warn!("Could not queue hello: {}", e);
        }
        Ok(store)
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    fn send(&self, message: &ClientMessage) -> RemoteResult<()> {
        let text = message
            .to_json()
            .map_err(|e| RemoteError::Transport(format!("Serialization error: {}", e)))?;
        self.connection.send(text).map_err(|_| RemoteError::Offline)
    }
}

impl RemoteStore for WebSocketStore {
    fn write(&self, key: &str, value: Drawing) -> BoxFuture<RemoteResult<()>> {
        let request_id = self.next_request.fetch_add(1, Ordering::SeqCst);
        let (future, completer) = pending();

        // Track before sending so a disconnect between the two still fails it.
        self.shared
            .track(request_id, Instant::now() + self.request_timeout, completer);
        let message = ClientMessage::Write {
            request_id,
            key: key.to_string(),
            value,
        };
        if let Err(e) = self.send(&message) {
            self.shared.finish(request_id, Err(e));
        }
        Box::pin(future)
    }

    fn watch(&self, key: &str, listener: Listener) -> RemoteResult<WatchId> {
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::SeqCst));
        self.shared
            .watches
            .lock()
            .map_err(|e| RemoteError::Transport(format!("Lock error: {}", e)))?
            .insert(
                id,
                Watch {
                    key: key.to_string(),
                    listener: Some(listener),
                    latest: None,
                },
            );

        if let Err(e) = self.send(&ClientMessage::Subscribe { key: key.to_string() }) {
            self.unwatch(id);
            return Err(e);
        }
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        let orphaned_key = match self.shared.watches.lock() {
            Ok(mut watches) => watches
                .remove(&id)
                .map(|removed| removed.key)
                .filter(|key| !watches.values().any(|w| &w.key == key)),
            Err(_) => None,
        };
        if let Some(key) = orphaned_key {
            // Fails harmlessly when the connection is already gone.
            let _ = self.send(&ClientMessage::Unsubscribe { key });
        }
    }

    fn pump(&self) {
        self.shared.expire(Instant::now());
        self.shared.deliver();
    }
}
