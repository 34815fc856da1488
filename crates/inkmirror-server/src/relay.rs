//! In-memory record table shared by every connection.

use dashmap::DashMap;
use inkmirror_core::Drawing;
use std::sync::Arc;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Project used by connections that never said hello.
pub const DEFAULT_PROJECT: &str = "default";

/// Why a write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    PermissionDenied,
}

/// One shared record and its change feed.
struct Record {
    tx: broadcast::Sender<Drawing>,
    value: Option<Drawing>,
}

impl Record {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, value: None }
    }
}

/// Shared application state
pub struct RelayState {
    records: DashMap<String, Record>,
    api_key: Option<String>,
}

impl RelayState {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            records: DashMap::new(),
            api_key,
        }
    }

    pub fn record_key(project: &str, key: &str) -> String {
        format!("{}/{}", project, key)
    }

    /// Writes need matching credentials once an API key is configured.
    pub fn is_authorized(&self, credentials: Option<&str>) -> bool {
        match &self.api_key {
            Some(api_key) => credentials == Some(api_key.as_str()),
            None => true,
        }
    }

    pub fn get(&self, project: &str, key: &str) -> Option<Drawing> {
        self.records
            .get(&Self::record_key(project, key))
            .and_then(|record| record.value.clone())
    }

    /// Current value plus a feed of every later write.
    ///
    /// Both are taken under the record's entry lock, so no write can land
    /// between them.
    pub fn subscribe(self: &Arc<Self>, project: &str, key: &str) -> (Option<Drawing>, Subscriber) {
        let record_key = Self::record_key(project, key);
        let record = self
            .records
            .entry(record_key.clone())
            .or_insert_with(Record::new);
        let subscriber = Subscriber {
            rx: Some(record.tx.subscribe()),
            state: Arc::clone(self),
            record_key,
        };
        (record.value.clone(), subscriber)
    }

    /// Forget a record that was never written and has no subscribers left.
    fn release(&self, record_key: &str) {
        self.records
            .remove_if(record_key, |_, record| record.value.is_none() && record.tx.receiver_count() == 0);
    }

    /// Overwrite a record and push it to its subscribers.
    pub fn write(
        &self,
        project: &str,
        key: &str,
        credentials: Option<&str>,
        value: Drawing,
    ) -> Result<usize, WriteError> {
        if !self.is_authorized(credentials) {
            return Err(WriteError::PermissionDenied);
        }
        let mut record = self
            .records
            .entry(Self::record_key(project, key))
            .or_insert_with(Record::new);
        record.value = Some(value.clone());
        // No subscribers is fine.
        Ok(record.tx.send(value).unwrap_or(0))
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Receives the writes to one record. Dropping it releases the record if
/// nothing else holds it.
pub struct Subscriber {
    rx: Option<broadcast::Receiver<Drawing>>,
    state: Arc<RelayState>,
    record_key: String,
}

impl Subscriber {
    pub async fn recv(&mut self) -> Result<Drawing, broadcast::error::RecvError> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => Err(broadcast::error::RecvError::Closed),
        }
    }

    pub fn try_recv(&mut self) -> Result<Drawing, broadcast::error::TryRecvError> {
        match self.rx.as_mut() {
            Some(rx) => rx.try_recv(),
            None => Err(broadcast::error::TryRecvError::Closed),
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        // The receiver must be gone before the count is checked.
        drop(self.rx.take());
        self.state.release(&self.record_key);
    }
}
