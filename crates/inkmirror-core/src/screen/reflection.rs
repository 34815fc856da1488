//! Reflection screen: a read-only mirror of the shared drawing.

use crate::client::{Subscription, SyncClient, SyncResult};
use crate::stroke::Drawing;
use std::sync::{Arc, Mutex};

/// Mirrors the shared drawing while mounted. Dropping it unsubscribes.
pub struct ReflectionScreen {
    mirrored: Arc<Mutex<Drawing>>,
    _subscription: Subscription,
}

impl ReflectionScreen {
    pub fn mount(client: &SyncClient) -> SyncResult<Self> {
        let mirrored = Arc::new(Mutex::new(Drawing::new()));
        let sink = mirrored.clone();
        let subscription = client.subscribe(move |drawing| {
            log::debug!("Reflection received {} strokes", drawing.len());
            if let Ok(mut current) = sink.lock() {
                *current = drawing;
            }
        })?;
        Ok(Self { mirrored, _subscription: subscription })
    }

    /// The most recently received drawing.
    pub fn drawing(&self) -> Drawing {
        self.mirrored.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn unmount(self) {}
}
