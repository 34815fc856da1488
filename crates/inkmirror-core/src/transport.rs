//! Native WebSocket transport.
//!
//! A background thread owns the socket. The caller sends text frames over a
//! command channel; incoming frames are handed to a [`FrameHandler`] on the
//! socket thread.

use std::sync::mpsc::{channel, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tungstenite::{connect, Message};
use url::Url;

/// Read timeout on the socket; also the tick interval for handlers.
const READ_TIMEOUT: Duration = Duration::from_millis(50);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid WebSocket URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Not connected")]
    NotConnected,
}

/// Callbacks run on the socket thread.
pub trait FrameHandler: Send + 'static {
    /// The handshake completed.
    fn on_open(&mut self) {}

    /// A text frame arrived.
    fn on_text(&mut self, text: String);

    /// Called roughly every [`READ_TIMEOUT`] while connected.
    fn on_tick(&mut self) {}

    /// The connection ended. `error` is set when it ended abnormally.
    fn on_close(&mut self, error: Option<String>);
}

/// Check that `url` is a plain `ws://` URL. The client is built without
/// TLS, so `wss://` is refused.
pub fn validate_url(url: &str) -> Result<Url, TransportError> {
    let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    if parsed.scheme() != "ws" {
        return Err(TransportError::UnsupportedScheme(parsed.scheme().to_string()));
    }
    Ok(parsed)
}

/// Commands sent to the socket thread.
enum Command {
    Send(String),
    Close,
}

/// A live WebSocket connection. Dropping it closes the socket.
pub struct Connection {
    state: Arc<Mutex<ConnectionState>>,
    cmd_tx: Option<Sender<Command>>,
    _thread: Option<JoinHandle<()>>,
}

/// First 100 characters of a frame, for logging.
fn clip(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn set_state(state: &Mutex<ConnectionState>, value: ConnectionState) {
    if let Ok(mut guard) = state.lock() {
        *guard = value;
    }
}

impl Connection {
    /// Start connecting to `url`. Returns immediately; the handshake runs on
    /// the socket thread. Frames queued with [`send`](Self::send) before the
    /// handshake completes are sent once it does.
    pub fn open(url: &str, mut handler: impl FrameHandler) -> Result<Self, TransportError> {
        validate_url(url)?;

        let state = Arc::new(Mutex::new(ConnectionState::Connecting));
        let (cmd_tx, cmd_rx) = channel::<Command>();
        let url = url.to_string();
        let thread_state = state.clone();

        let handle = thread::spawn(move || {
            log::info!("WebSocket thread: connecting to {}", url);

            let (mut socket, response) = match connect(url.as_str()) {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!("WebSocket connection failed: {}", e);
                    set_state(&thread_state, ConnectionState::Error);
                    handler.on_close(Some(format!("Connection failed: {}", e)));
                    return;
                }
            };

            log::info!("WebSocket connected, status: {}", response.status());
            match socket.get_mut() {
                tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                    let _ = tcp.set_read_timeout(Some(READ_TIMEOUT));
                    let _ = tcp.set_write_timeout(Some(WRITE_TIMEOUT));
                }
                #[allow(unreachable_patterns)]
                _ => {
                    log::debug!("Non-plain stream - using default timeout handling");
                }
            }
            set_state(&thread_state, ConnectionState::Connected);
            handler.on_open();

            let mut error = None;
            'io: loop {
                loop {
                    match cmd_rx.try_recv() {
                        Ok(Command::Send(text)) => {
                            log::debug!("WebSocket sending: {}", clip(&text));
                            if let Err(e) = socket.send(Message::Text(text)) {
                                log::error!("WebSocket send error: {}", e);
                                error = Some(e.to_string());
                                break 'io;
                            }
                        }
                        Ok(Command::Close) => {
                            log::info!("WebSocket close requested");
                            let _ = socket.close(None);
                            break 'io;
                        }
                        Err(TryRecvError::Disconnected) => {
                            log::info!("WebSocket command channel disconnected");
                            let _ = socket.close(None);
                            break 'io;
                        }
                        Err(TryRecvError::Empty) => break,
                    }
                }

                match socket.read() {
                    Ok(Message::Text(text)) => {
                        log::debug!("WebSocket received: {}", clip(&text));
                        handler.on_text(text);
                    }
                    Ok(Message::Ping(data)) => {
                        let _ = socket.send(Message::Pong(data));
                    }
                    Ok(Message::Close(_)) => {
                        log::info!("WebSocket received close frame");
                        break;
                    }
                    Ok(_) => {}
                    Err(tungstenite::Error::Io(ref e))
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        log::error!("WebSocket read error: {}", e);
                        error = Some(e.to_string());
                        break;
                    }
                }

                handler.on_tick();
            }

            log::info!("WebSocket thread exiting");
            set_state(&thread_state, ConnectionState::Disconnected);
            handler.on_close(error);
        });

        Ok(Self {
            state,
            cmd_tx: Some(cmd_tx),
            _thread: Some(handle),
        })
    }

    /// Queue a text frame.
    pub fn send(&self, text: String) -> Result<(), TransportError> {
        match self.state() {
            ConnectionState::Connecting | ConnectionState::Connected => {}
            _ => return Err(TransportError::NotConnected),
        }
        let tx = self.cmd_tx.as_ref().ok_or(TransportError::NotConnected)?;
        tx.send(Command::Send(text))
            .map_err(|_| TransportError::NotConnected)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Error)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Close the connection.
    pub fn close(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Close);
        }
        self._thread = None;
        if self.state() != ConnectionState::Error {
            set_state(&self.state, ConnectionState::Disconnected);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ignore;

    impl FrameHandler for Ignore {
        fn on_text(&mut self, _text: String) {}
        fn on_close(&mut self, _error: Option<String>) {}
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("ws://localhost:3030/ws").is_ok());
        assert!(matches!(
            validate_url("wss://example.com/ws"),
            Err(TransportError::UnsupportedScheme(s)) if s == "wss"
        ));
        assert!(matches!(
            validate_url("https://example.com"),
            Err(TransportError::UnsupportedScheme(s)) if s == "https"
        ));
        assert!(matches!(validate_url("not a url"), Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_open_rejects_bad_scheme() {
        assert!(Connection::open("http://localhost/ws", Ignore).is_err());
    }

    #[test]
    fn test_send_after_close_fails() {
        // Port 9 (discard) is almost never listening; the handshake fails in
        // the background but the handle is usable either way.
        let mut conn = Connection::open("ws://127.0.0.1:9/ws", Ignore).unwrap();
        conn.close();
        assert!(matches!(conn.send("x".to_string()), Err(TransportError::NotConnected)));
    }
}
