//! InkMirror Application
//!
//! The application shell providing windowing, input handling,
//! and integration of all components.

mod app;
mod layout;
mod session;
mod ui;
mod widgets;

pub use app::{App, AppConfig, AppError};
pub use layout::Layout;
pub use session::Session;
pub use ui::{render_ui, UiAction, UiState};
