//! Sync client: publishes the local drawing and subscribes to the shared one.

use crate::config::SyncConfig;
use crate::remote::{BoxFuture, RemoteError, RemoteStore, WatchId, WebSocketStore};
use crate::stroke::Drawing;
use std::sync::Arc;
use thiserror::Error;

/// Sync errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Failed to connect: {0}")]
    Connect(RemoteError),
    #[error("Failed to write drawing: {0}")]
    RemoteWrite(RemoteError),
    #[error("Failed to subscribe: {0}")]
    Subscribe(RemoteError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Reads and writes one shared record of a remote store.
#[derive(Clone)]
pub struct SyncClient {
    store: Arc<dyn RemoteStore>,
    key: String,
}

impl SyncClient {
    pub fn new(store: Arc<dyn RemoteStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    /// Connect to the relay server described by `config`.
    pub fn connect(config: &SyncConfig) -> SyncResult<Self> {
        let store = WebSocketStore::connect(config).map_err(SyncError::Connect)?;
        Ok(Self::new(Arc::new(store), config.key.clone()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the shared record with `drawing`.
    pub fn publish(&self, drawing: &Drawing) -> BoxFuture<SyncResult<()>> {
        log::debug!("Publishing {} strokes to '{}'", drawing.len(), self.key);
        let write = self.store.write(&self.key, drawing.clone());
        Box::pin(async move { write.await.map_err(SyncError::RemoteWrite) })
    }

    /// Publish an empty drawing.
    pub fn clear(&self) -> BoxFuture<SyncResult<()>> {
        self.publish(&Drawing::new())
    }

    /// Call `on_change` with the current shared drawing and again on every
    /// change, until the returned handle is dropped.
    pub fn subscribe(
        &self,
        on_change: impl FnMut(Drawing) + Send + 'static,
    ) -> SyncResult<Subscription> {
        let id = self
            .store
            .watch(&self.key, Box::new(on_change))
            .map_err(SyncError::Subscribe)?;
        log::debug!("Subscribed to '{}'", self.key);
        Ok(Subscription {
            store: self.store.clone(),
            id: Some(id),
        })
    }

    /// Deliver queued remote changes. Call once per frame.
    pub fn pump(&self) {
        self.store.pump();
    }
}

/// Live subscription. Dropping it unsubscribes.
pub struct Subscription {
    store: Arc<dyn RemoteStore>,
    id: Option<WatchId>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.store.unwatch(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;
    use std::sync::Mutex;

    fn client() -> (Arc<MemoryStore>, SyncClient) {
        let store = Arc::new(MemoryStore::new());
        let client = SyncClient::new(store.clone(), "drawing");
        (store, client)
    }

    #[test]
    fn test_publish_overwrites_record() {
        let (store, client) = client();
        let drawing = Drawing::from_descriptions(["M1 1 L2 2"]);
        pollster::block_on(client.publish(&drawing)).unwrap();
        assert_eq!(store.get("drawing"), Some(drawing));
    }

    #[test]
    fn test_clear_publishes_empty() {
        let (store, client) = client();
        pollster::block_on(client.publish(&Drawing::from_descriptions(["M1 1"]))).unwrap();
        pollster::block_on(client.clear()).unwrap();
        assert_eq!(store.get("drawing"), Some(Drawing::new()));
    }

    #[test]
    fn test_publish_offline_error() {
        let (store, client) = client();
        store.set_online(false);
        let result = pollster::block_on(client.publish(&Drawing::from_descriptions(["M1 1"])));
        assert_eq!(result, Err(SyncError::RemoteWrite(RemoteError::Offline)));
    }

    #[test]
    fn test_subscriber_after_two_publishes_sees_second() {
        let (_store, client) = client();
        let a = Drawing::from_descriptions(["M1 1"]);
        let b = Drawing::from_descriptions(["M2 2"]);
        pollster::block_on(client.publish(&a)).unwrap();
        pollster::block_on(client.publish(&b)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = client.subscribe(move |d| sink.lock().unwrap().push(d)).unwrap();
        client.pump();
        assert_eq!(seen.lock().unwrap().last(), Some(&b));
    }

    #[test]
    fn test_dropping_subscription_unwatches() {
        let (store, client) = client();
        let sub = client.subscribe(|_| {}).unwrap();
        assert_eq!(store.watch_count(), 1);
        drop(sub);
        assert_eq!(store.watch_count(), 0);

        let sub = client.subscribe(|_| {}).unwrap();
        sub.unsubscribe();
        assert_eq!(store.watch_count(), 0);
    }
}
