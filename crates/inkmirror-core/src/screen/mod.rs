//! Screen controllers. Each owns the state for one screen of the app.

mod drawing;
mod reflection;

pub use drawing::{DrawState, DrawingScreen};
pub use reflection::ReflectionScreen;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenKind {
    #[default]
    Draw,
    Reflect,
}
