//! Vello-based renderer implementation.

use crate::renderer::{PreviewPanel, RenderContext, Renderer, StrokeStyle};
use inkmirror_core::preview::ViewBox;
use inkmirror_core::stroke::{Drawing, Stroke as PathStroke};
use kurbo::{Affine, BezPath, Cap, Join, RoundedRect, Stroke};
use peniko::{Color, Fill};
use vello::Scene;

const PREVIEW_BACKGROUND: Color = Color::from_rgba8(245, 247, 250, 255);
const PREVIEW_BORDER: Color = Color::from_rgba8(200, 205, 215, 255);

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn pen(style: StrokeStyle) -> Stroke {
    Stroke::new(style.width)
        .with_caps(Cap::Round)
        .with_join(Join::Round)
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self { scene: Scene::new() }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    fn render_path(&mut self, path: &BezPath, style: StrokeStyle, transform: Affine) {
        if path.elements().is_empty() {
            return;
        }
        self.scene.stroke(&pen(style), transform, style.color, None, path);
    }

    fn render_drawing(&mut self, drawing: &Drawing, style: StrokeStyle, transform: Affine) {
        for stroke in drawing {
            self.render_path(&stroke.to_path(), style, transform);
        }
    }

    /// Draw the panel background and the drawing fitted inside it.
    fn render_preview(&mut self, preview: &PreviewPanel, transform: Affine) {
        let panel = RoundedRect::from_rect(preview.rect, 6.0);
        self.scene
            .fill(Fill::NonZero, transform, PREVIEW_BACKGROUND, None, &panel);
        self.scene
            .stroke(&Stroke::new(1.0), transform, PREVIEW_BORDER, None, &panel);

        let fit = ViewBox::of(preview.drawing).fit(preview.rect.inset(-8.0));
        self.render_drawing(preview.drawing, StrokeStyle::PREVIEW, transform * fit);
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();

        let window = Affine::scale(ctx.scale_factor);
        let canvas = window * Affine::translate(ctx.canvas_origin.to_vec2());

        self.render_drawing(ctx.drawing, ctx.stroke_style, canvas);
        if let Some(current) = ctx.current_stroke {
            let path = PathStroke::from_description(current).to_path();
            self.render_path(&path, ctx.stroke_style, canvas);
        }

        if let Some(preview) = &ctx.preview {
            self.render_preview(preview, window);
        }
    }
}
