//! Renderer trait abstraction.

use inkmirror_core::stroke::Drawing;
use kurbo::{Point, Rect, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Pen used for a set of strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

impl StrokeStyle {
    /// Black pen for the drawing canvas.
    pub const INK: Self = Self { color: Color::BLACK, width: 3.0 };
    /// Blue pen for the mirrored drawing.
    pub const REFLECTION: Self = Self {
        color: Color::from_rgba8(0, 0, 255, 255),
        width: 3.0,
    };
    /// Thin blue pen for the miniature preview, in drawing units.
    pub const PREVIEW: Self = Self {
        color: Color::from_rgba8(0, 0, 255, 255),
        width: 1.0,
    };
}

/// Miniature of a drawing fitted into a panel.
#[derive(Debug, Clone, Copy)]
pub struct PreviewPanel<'a> {
    pub drawing: &'a Drawing,
    /// Panel bounds in logical window coordinates.
    pub rect: Rect,
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Completed strokes to draw on the canvas.
    pub drawing: &'a Drawing,
    /// The stroke being drawn, as a path description.
    pub current_stroke: Option<&'a str>,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Where canvas coordinate (0, 0) sits, in logical window coordinates.
    pub canvas_origin: Point,
    /// Background color.
    pub background_color: Color,
    pub stroke_style: StrokeStyle,
    pub preview: Option<PreviewPanel<'a>>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(drawing: &'a Drawing, viewport_size: Size) -> Self {
        Self {
            drawing,
            current_stroke: None,
            viewport_size,
            scale_factor: 1.0,
            canvas_origin: Point::ZERO,
            background_color: Color::WHITE,
            stroke_style: StrokeStyle::INK,
            preview: None,
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_canvas_origin(mut self, origin: Point) -> Self {
        self.canvas_origin = origin;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_stroke_style(mut self, style: StrokeStyle) -> Self {
        self.stroke_style = style;
        self
    }

    pub fn with_current_stroke(mut self, stroke: Option<&'a str>) -> Self {
        self.current_stroke = stroke;
        self
    }

    pub fn with_preview(mut self, preview: Option<PreviewPanel<'a>>) -> Self {
        self.preview = preview;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the scene for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
