//! Generic text-message socket.
//!
//! Connects when created and closes when dropped. Incoming frames are
//! buffered until [`MessageSocket::poll`]; only the newest is kept.

use crate::transport::{Connection, ConnectionState, FrameHandler, TransportError};
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Connecting,
    Open,
    Closed,
}

struct Forward {
    tx: Sender<String>,
}

impl FrameHandler for Forward {
    fn on_text(&mut self, text: String) {
        let _ = self.tx.send(text);
    }

    fn on_close(&mut self, error: Option<String>) {
        if let Some(e) = error {
            log::warn!("Message socket closed: {}", e);
        }
    }
}

pub struct MessageSocket {
    connection: Connection,
    incoming: Receiver<String>,
    latest: Option<String>,
}

impl MessageSocket {
    pub fn connect(url: &str) -> Result<Self, TransportError> {
        let (tx, incoming) = channel();
        let connection = Connection::open(url, Forward { tx })?;
        Ok(Self { connection, incoming, latest: None })
    }

    /// Take frames received since the last call. Returns true if any
    /// arrived.
    pub fn poll(&mut self) -> bool {
        let mut received = false;
        while let Ok(text) = self.incoming.try_recv() {
            self.latest = Some(text);
            received = true;
        }
        received
    }

    pub fn latest_message(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    /// Send `text` if the socket is open. Otherwise it is dropped.
    pub fn send_message(&self, text: impl Into<String>) {
        if self.state() != SocketState::Open {
            log::debug!("Message socket not open; dropping message");
            return;
        }
        if let Err(e) = self.connection.send(text.into()) {
            log::debug!("Message socket send failed: {}", e);
        }
    }

    pub fn state(&self) -> SocketState {
        match self.connection.state() {
            ConnectionState::Connecting => SocketState::Connecting,
            ConnectionState::Connected => SocketState::Open,
            ConnectionState::Disconnected | ConnectionState::Error => SocketState::Closed,
        }
    }
}
