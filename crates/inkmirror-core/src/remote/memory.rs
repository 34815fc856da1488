//! In-memory remote store.

use super::{BoxFuture, Listener, RemoteError, RemoteResult, RemoteStore, WatchId};
use crate::stroke::Drawing;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

struct Watch {
    key: String,
    /// Taken out while the listener runs.
    listener: Option<Listener>,
}

/// In-process store for tests and single-process use.
///
/// Listeners are called synchronously from `write` and `watch`, so
/// `pump` has nothing to do. They run without any store lock held and may
/// call back into the store.
pub struct MemoryStore {
    records: Mutex<HashMap<String, Drawing>>,
    watches: Mutex<BTreeMap<WatchId, Watch>>,
    next_id: AtomicU64,
    online: AtomicBool,
    writes: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            watches: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            online: AtomicBool::new(true),
            writes: AtomicU64::new(0),
        }
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing or regaining the connection. Offline writes fail
    /// with [`RemoteError::Offline`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Current value of a record, if it was ever written.
    pub fn get(&self, key: &str) -> Option<Drawing> {
        self.records.lock().ok()?.get(key).cloned()
    }

    /// Number of writes that reached the store.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of registered listeners.
    pub fn watch_count(&self) -> usize {
        self.watches.lock().map(|w| w.len()).unwrap_or(0)
    }

    fn notify(&self, key: &str, value: &Drawing) {
        let ready: Vec<(WatchId, Listener)> = match self.watches.lock() {
            Ok(mut watches) => watches
                .iter_mut()
                .filter(|(_, watch)| watch.key == key)
                .filter_map(|(id, watch)| Some((*id, watch.listener.take()?)))
                .collect(),
            Err(_) => return,
        };

        for (id, mut listener) in ready {
            listener(value.clone());
            // A listener unwatched during its own call stays dropped.
            if let Ok(mut watches) = self.watches.lock() {
                if let Some(watch) = watches.get_mut(&id) {
                    watch.listener = Some(listener);
                }
            }
        }
    }

    fn apply_write(&self, key: &str, value: Drawing) -> RemoteResult<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(RemoteError::Offline);
        }
        {
            let mut records = self
                .records
                .lock()
                .map_err(|e| RemoteError::Transport(format!("Lock error: {}", e)))?;
            records.insert(key.to_string(), value.clone());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify(key, &value);
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn write(&self, key: &str, value: Drawing) -> BoxFuture<RemoteResult<()>> {
        let result = self.apply_write(key, value);
        Box::pin(std::future::ready(result))
    }

    fn watch(&self, key: &str, mut listener: Listener) -> RemoteResult<WatchId> {
        let current = self.get(key).unwrap_or_default();
        listener(current);

        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.watches
            .lock()
            .map_err(|e| RemoteError::Transport(format!("Lock error: {}", e)))?
            .insert(id, Watch { key: key.to_string(), listener: Some(listener) });
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        if let Ok(mut watches) = self.watches.lock() {
            watches.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<Drawing>>>, Listener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Listener = Box::new(move |drawing| sink.lock().unwrap().push(drawing));
        (seen, listener)
    }

    #[test]
    fn test_write_and_get() {
        let store = MemoryStore::new();
        let drawing = Drawing::from_descriptions(["M1 1"]);
        pollster::block_on(store.write("drawing", drawing.clone())).unwrap();
        assert_eq!(store.get("drawing"), Some(drawing));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_watch_replays_empty_when_unset() {
        let store = MemoryStore::new();
        let (seen, listener) = recorder();
        store.watch("drawing", listener).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Drawing::new()]);
    }

    #[test]
    fn test_watch_sees_later_writes() {
        let store = MemoryStore::new();
        let (seen, listener) = recorder();
        store.watch("drawing", listener).unwrap();

        let a = Drawing::from_descriptions(["M1 1"]);
        pollster::block_on(store.write("drawing", a.clone())).unwrap();
        pollster::block_on(store.write("other", Drawing::from_descriptions(["M9 9"]))).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Drawing::new(), a]);
    }

    #[test]
    fn test_late_watcher_sees_latest() {
        let store = MemoryStore::new();
        let a = Drawing::from_descriptions(["M1 1"]);
        let b = Drawing::from_descriptions(["M2 2", "M3 3"]);
        pollster::block_on(store.write("drawing", a)).unwrap();
        pollster::block_on(store.write("drawing", b.clone())).unwrap();

        let (seen, listener) = recorder();
        store.watch("drawing", listener).unwrap();
        assert_eq!(seen.lock().unwrap().last(), Some(&b));
    }

    #[test]
    fn test_unwatch_stops_delivery() {
        let store = MemoryStore::new();
        let (seen, listener) = recorder();
        let id = store.watch("drawing", listener).unwrap();
        store.unwatch(id);
        assert_eq!(store.watch_count(), 0);

        pollster::block_on(store.write("drawing", Drawing::from_descriptions(["M1 1"]))).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_offline_write_fails_and_keeps_value() {
        let store = MemoryStore::new();
        let a = Drawing::from_descriptions(["M1 1"]);
        pollster::block_on(store.write("drawing", a.clone())).unwrap();

        store.set_online(false);
        let result = pollster::block_on(store.write("drawing", Drawing::new()));
        assert_eq!(result, Err(RemoteError::Offline));
        assert_eq!(store.get("drawing"), Some(a));
    }

    #[test]
    fn test_listener_may_reenter_store() {
        let store = Arc::new(MemoryStore::new());
        let counts = Arc::new(Mutex::new(Vec::new()));
        let (inner, sink) = (store.clone(), counts.clone());
        store
            .watch(
                "drawing",
                Box::new(move |_| sink.lock().unwrap().push(inner.watch_count())),
            )
            .unwrap();

        pollster::block_on(store.write("drawing", Drawing::from_descriptions(["M1 1"]))).unwrap();
        assert_eq!(*counts.lock().unwrap(), vec![0, 1]);

        // The listener is still registered after re-entering.
        pollster::block_on(store.write("drawing", Drawing::new())).unwrap();
        assert_eq!(counts.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_listener_may_unwatch_itself() {
        let store = Arc::new(MemoryStore::new());
        let seen = Arc::new(Mutex::new(0));
        let own_id = Arc::new(Mutex::new(None::<WatchId>));
        let (inner, sink, slot) = (store.clone(), seen.clone(), own_id.clone());
        let id = store
            .watch(
                "drawing",
                Box::new(move |_| {
                    *sink.lock().unwrap() += 1;
                    if let Some(id) = *slot.lock().unwrap() {
                        inner.unwatch(id);
                    }
                }),
            )
            .unwrap();
        *own_id.lock().unwrap() = Some(id);

        pollster::block_on(store.write("drawing", Drawing::from_descriptions(["M1 1"]))).unwrap();
        pollster::block_on(store.write("drawing", Drawing::new())).unwrap();
        assert_eq!(*seen.lock().unwrap(), 2);
        assert_eq!(store.watch_count(), 0);
    }
}
