//! InkMirror Core Library
//!
//! Platform-agnostic stroke capture, preview fitting and realtime sync for
//! the InkMirror drawing app.

pub mod capture;
pub mod client;
pub mod config;
pub mod input;
pub mod notice;
pub mod path;
pub mod preview;
pub mod protocol;
pub mod remote;
pub mod screen;
pub mod socket;
pub mod stroke;
pub mod transport;

pub use capture::{PathBuffer, StrokeStore};
pub use client::{Subscription, SyncClient, SyncError, SyncResult};
pub use config::{ConfigError, SyncConfig};
pub use input::{PointerEvent, PointerId};
pub use notice::{Notice, NoticeKind};
pub use preview::ViewBox;
pub use remote::{MemoryStore, RemoteError, RemoteResult, RemoteStore, WebSocketStore};
pub use screen::{DrawState, DrawingScreen, ReflectionScreen, ScreenKind};
pub use socket::{MessageSocket, SocketState};
pub use stroke::{Drawing, Stroke};
pub use transport::ConnectionState;
