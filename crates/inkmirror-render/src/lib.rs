//! InkMirror Render Library
//!
//! Renderer abstraction and implementations for InkMirror.
//! The default implementation uses Vello for GPU-accelerated rendering.

mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{PreviewPanel, RenderContext, RenderResult, Renderer, RendererError, StrokeStyle};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
