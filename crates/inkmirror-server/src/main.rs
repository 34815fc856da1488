//! InkMirror WebSocket Relay Server
//!
//! Keeps the latest drawing per record and pushes every write to the
//! record's subscribers. See `inkmirror_core::protocol` for the messages.
//!
//! Environment:
//! - `INKMIRROR_ADDR`: listen address (default `0.0.0.0:3030`)
//! - `INKMIRROR_API_KEY`: when set, writes need matching credentials

mod relay;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use inkmirror_core::protocol::{ClientMessage, PERMISSION_DENIED, ServerMessage};
use relay::{DEFAULT_PROJECT, RelayState, Subscriber, WriteError};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_ADDR: &str = "0.0.0.0:3030";
const ADDR_ENV: &str = "INKMIRROR_ADDR";
const API_KEY_ENV: &str = "INKMIRROR_API_KEY";

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    addr: SocketAddr,
    api_key: Option<String>,
}

impl ServerConfig {
    fn from_env() -> Result<Self, std::net::AddrParseError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, std::net::AddrParseError> {
        let addr = lookup(ADDR_ENV).unwrap_or_else(|| DEFAULT_ADDR.to_string()).parse()?;
        let api_key = lookup(API_KEY_ENV).filter(|key| !key.is_empty());
        Ok(Self { addr, api_key })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkmirror_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.api_key.is_none() {
        warn!("{} not set, accepting writes from anyone", API_KEY_ENV);
    }
    let state = Arc::new(RelayState::new(config.api_key));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("InkMirror relay server listening on {}", config.addr);
    info!("WebSocket endpoint: ws://{}/ws", config.addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "InkMirror Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RelayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Per-connection session state.
struct Peer {
    id: String,
    project: String,
    credentials: Option<String>,
    /// Forwarding task per subscribed key.
    subscriptions: HashMap<String, JoinHandle<()>>,
    outgoing: mpsc::UnboundedSender<ServerMessage>,
}

impl Peer {
    fn handle(&mut self, state: &Arc<RelayState>, msg: ClientMessage) {
        match msg {
            ClientMessage::Hello { project_id, credentials } => {
                info!("Peer {} joined project {}", self.id, project_id);
                self.project = project_id;
                self.credentials = credentials;
            }
            ClientMessage::Subscribe { key } => {
                let (current, subscriber) = state.subscribe(&self.project, &key);
                self.reply(ServerMessage::Value { key: key.clone(), value: current });
                let task = tokio::spawn(forward(key.clone(), subscriber, self.outgoing.clone()));
                if let Some(previous) = self.subscriptions.insert(key.clone(), task) {
                    previous.abort();
                }
                debug!("Peer {} subscribed to {}", self.id, key);
            }
            ClientMessage::Unsubscribe { key } => {
                if let Some(task) = self.subscriptions.remove(&key) {
                    task.abort();
                    debug!("Peer {} unsubscribed from {}", self.id, key);
                }
            }
            ClientMessage::Write { request_id, key, value } => {
                let strokes = value.len();
                match state.write(&self.project, &key, self.credentials.as_deref(), value) {
                    Ok(delivered) => {
                        debug!(
                            "Peer {} wrote {} strokes to {}/{} ({} subscribers)",
                            self.id, strokes, self.project, key, delivered
                        );
                        self.reply(ServerMessage::Ack { request_id });
                    }
                    Err(WriteError::PermissionDenied) => {
                        warn!("Rejected write from {} to {}/{}", self.id, self.project, key);
                        self.reply(ServerMessage::Rejected {
                            request_id,
                            reason: PERMISSION_DENIED.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn reply(&self, msg: ServerMessage) {
        // The receiver lives as long as the connection loop.
        let _ = self.outgoing.send(msg);
    }

    fn close(&mut self) {
        for (_, task) in self.subscriptions.drain() {
            task.abort();
        }
    }
}

/// Push every change of one record into the connection's outgoing queue.
async fn forward(
    key: String,
    mut subscriber: Subscriber,
    outgoing: mpsc::UnboundedSender<ServerMessage>,
) {
    loop {
        match subscriber.recv().await {
            Ok(value) => {
                let msg = ServerMessage::Value { key: key.clone(), value: Some(value) };
                if outgoing.send(msg).is_err() {
                    break;
                }
            }
            // Later values supersede the skipped ones.
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("Subscriber of {} skipped {} values", key, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<RelayState>) {
    let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel();
    let mut peer = Peer {
        id: Uuid::new_v4().to_string(),
        project: DEFAULT_PROJECT.to_string(),
        credentials: None,
        subscriptions: HashMap::new(),
        outgoing,
    };
    info!("New connection: {}", peer.id);

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => peer.handle(&state, client_msg),
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer.id, e);
                                peer.reply(ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                });
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        peer.reply(ServerMessage::Error {
                            message: "Binary frames are not supported".to_string(),
                        });
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer.id, e);
                        break;
                    }
                }
            }

            Some(server_msg) = outgoing_rx.recv() => {
                let json = match server_msg.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Could not encode message for {}: {}", peer.id, e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    peer.close();
    info!("Connection closed: {}", peer.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmirror_core::{Drawing, ReflectionScreen, RemoteError, SyncClient, SyncConfig, SyncError};
    use std::time::Duration;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

    type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    async fn spawn_server(api_key: Option<&str>) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(RelayState::new(api_key.map(str::to_string)));
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        addr
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        ws
    }

    async fn send(ws: &mut Client, msg: ClientMessage) {
        let json = msg.to_json().unwrap();
        ws.send(tungstenite::Message::text(json)).await.unwrap();
    }

    async fn recv(ws: &mut Client) -> ServerMessage {
        let next = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match ws.next().await {
                    Some(Ok(tungstenite::Message::Text(text))) => return text.as_str().to_string(),
                    Some(Ok(_)) => continue,
                    other => panic!("Connection ended: {:?}", other),
                }
            }
        })
        .await
        .expect("server reply");
        serde_json::from_str(&next).unwrap()
    }

    fn write(request_id: u64, path: &str) -> ClientMessage {
        ClientMessage::Write {
            request_id,
            key: "drawing".to_string(),
            value: Drawing::from_descriptions([path]),
        }
    }

    fn subscribe() -> ClientMessage {
        ClientMessage::Subscribe { key: "drawing".to_string() }
    }

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr, DEFAULT_ADDR.parse().unwrap());
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_config_from_env() {
        let config = ServerConfig::from_lookup(|name| match name {
            ADDR_ENV => Some("127.0.0.1:4000".to_string()),
            API_KEY_ENV => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.addr.port(), 4000);
        assert_eq!(config.api_key.as_deref(), Some("secret"));

        assert!(ServerConfig::from_lookup(|_| Some("nope".to_string())).is_err());
    }

    #[tokio::test]
    async fn test_write_then_subscribe_over_websocket() {
        let addr = spawn_server(None).await;
        let mut writer = connect(addr).await;
        send(&mut writer, write(1, "M1 1 L2 2")).await;
        assert_eq!(recv(&mut writer).await, ServerMessage::Ack { request_id: 1 });

        let mut reader = connect(addr).await;
        send(&mut reader, subscribe()).await;
        assert_eq!(
            recv(&mut reader).await,
            ServerMessage::Value {
                key: "drawing".to_string(),
                value: Some(Drawing::from_descriptions(["M1 1 L2 2"])),
            }
        );

        send(&mut writer, write(2, "M3 3")).await;
        assert_eq!(
            recv(&mut reader).await,
            ServerMessage::Value {
                key: "drawing".to_string(),
                value: Some(Drawing::from_descriptions(["M3 3"])),
            }
        );
    }

    #[tokio::test]
    async fn test_writer_receives_own_change() {
        let addr = spawn_server(None).await;
        let mut ws = connect(addr).await;
        send(&mut ws, subscribe()).await;
        assert_eq!(
            recv(&mut ws).await,
            ServerMessage::Value { key: "drawing".to_string(), value: None }
        );

        send(&mut ws, write(5, "M1 1")).await;
        let replies = [recv(&mut ws).await, recv(&mut ws).await];
        assert!(replies.contains(&ServerMessage::Ack { request_id: 5 }));
        assert!(replies.contains(&ServerMessage::Value {
            key: "drawing".to_string(),
            value: Some(Drawing::from_descriptions(["M1 1"])),
        }));
    }

    #[tokio::test]
    async fn test_write_without_credentials_is_rejected() {
        let addr = spawn_server(Some("secret")).await;
        let mut ws = connect(addr).await;
        send(&mut ws, write(1, "M1 1")).await;
        assert_eq!(
            recv(&mut ws).await,
            ServerMessage::Rejected { request_id: 1, reason: PERMISSION_DENIED.to_string() }
        );

        send(
            &mut ws,
            ClientMessage::Hello {
                project_id: DEFAULT_PROJECT.to_string(),
                credentials: Some("secret".to_string()),
            },
        )
        .await;
        send(&mut ws, write(2, "M1 1")).await;
        assert_eq!(recv(&mut ws).await, ServerMessage::Ack { request_id: 2 });
    }

    #[tokio::test]
    async fn test_malformed_message_gets_error() {
        let addr = spawn_server(None).await;
        let mut ws = connect(addr).await;
        ws.send(tungstenite::Message::text(r#"{"type":"bogus"}"#.to_string())).await.unwrap();
        match recv(&mut ws).await {
            ServerMessage::Error { message } => assert!(message.starts_with("Invalid message")),
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    fn sync_config(addr: SocketAddr, credentials: Option<&str>) -> SyncConfig {
        SyncConfig {
            endpoint: format!("ws://{}/ws", addr),
            project_id: "classroom".to_string(),
            credentials: credentials.map(str::to_string),
            ..SyncConfig::default()
        }
    }

    /// Pump `client` until the mirror shows `expected` or five seconds pass.
    async fn wait_for_mirror(client: &SyncClient, mirror: &ReflectionScreen, expected: &Drawing) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while tokio::time::Instant::now() < deadline {
            client.pump();
            if &mirror.drawing() == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sync_client_round_trip_through_relay() {
        let addr = spawn_server(Some("secret")).await;
        let a = Drawing::from_descriptions(["M1 1 L2 2"]);
        let b = Drawing::from_descriptions(["M3 3", "M4 4 L5 5"]);

        let writer = SyncClient::connect(&sync_config(addr, Some("secret"))).unwrap();
        writer.publish(&a).await.unwrap();
        writer.publish(&b).await.unwrap();

        // A fresh reader sees the latest value, not the first one.
        let reader = SyncClient::connect(&sync_config(addr, None)).unwrap();
        let mirror = ReflectionScreen::mount(&reader).unwrap();
        assert!(wait_for_mirror(&reader, &mirror, &b).await);

        // Later writes keep flowing to the mounted mirror.
        writer.clear().await.unwrap();
        assert!(wait_for_mirror(&reader, &mirror, &Drawing::new()).await);

        // Wrong or missing credentials come back as a permission error.
        let result = reader.publish(&a).await;
        assert!(matches!(
            result,
            Err(SyncError::RemoteWrite(RemoteError::PermissionDenied))
        ));
        mirror.unmount();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sync_client_projects_do_not_mix() {
        let addr = spawn_server(None).await;
        let classroom = SyncClient::connect(&sync_config(addr, None)).unwrap();
        let other = SyncClient::connect(&SyncConfig {
            project_id: "lab".to_string(),
            ..sync_config(addr, None)
        })
        .unwrap();

        classroom.publish(&Drawing::from_descriptions(["M1 1"])).await.unwrap();
        other.publish(&Drawing::from_descriptions(["M9 9"])).await.unwrap();

        let mirror = ReflectionScreen::mount(&classroom).unwrap();
        assert!(wait_for_mirror(&classroom, &mirror, &Drawing::from_descriptions(["M1 1"])).await);
    }
}
