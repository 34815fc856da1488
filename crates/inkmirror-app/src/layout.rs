//! Window layout in logical pixels.

use inkmirror_core::ScreenKind;
use kurbo::{Point, Rect, Size};

pub const TOOLBAR_HEIGHT: f64 = 60.0;
pub const PREVIEW_BAR_HEIGHT: f64 = 40.0;

/// Where each region of the window sits for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub toolbar: Rect,
    /// Drawing surface. Canvas coordinates are relative to its top-left.
    pub canvas: Rect,
    /// Tap target that expands or collapses the preview.
    pub preview_bar: Option<Rect>,
    /// Area the preview fills while expanded.
    pub preview_panel: Option<Rect>,
}

impl Layout {
    pub fn compute(window: Size, screen: ScreenKind, preview_expanded: bool) -> Self {
        let width = window.width.max(0.0);
        let height = window.height.max(TOOLBAR_HEIGHT);
        let toolbar = Rect::new(0.0, 0.0, width, TOOLBAR_HEIGHT);

        match (screen, preview_expanded) {
            (ScreenKind::Reflect, _) => Self {
                toolbar,
                canvas: Rect::new(0.0, TOOLBAR_HEIGHT, width, height),
                preview_bar: None,
                preview_panel: None,
            },
            (ScreenKind::Draw, false) => {
                let bar_top = (height - PREVIEW_BAR_HEIGHT).max(TOOLBAR_HEIGHT);
                Self {
                    toolbar,
                    canvas: Rect::new(0.0, TOOLBAR_HEIGHT, width, bar_top),
                    preview_bar: Some(Rect::new(0.0, bar_top, width, height)),
                    preview_panel: None,
                }
            }
            (ScreenKind::Draw, true) => {
                let bar_bottom = (TOOLBAR_HEIGHT + PREVIEW_BAR_HEIGHT).min(height);
                Self {
                    toolbar,
                    canvas: Rect::new(0.0, TOOLBAR_HEIGHT, width, height),
                    preview_bar: Some(Rect::new(0.0, TOOLBAR_HEIGHT, width, bar_bottom)),
                    preview_panel: Some(Rect::new(0.0, bar_bottom, width, height)),
                }
            }
        }
    }

    /// Canvas coordinate origin in window coordinates.
    pub fn canvas_origin(&self) -> Point {
        self.canvas.origin()
    }

    /// Map a window point to canvas coordinates, if it lies on the canvas.
    pub fn to_canvas(&self, window_point: Point) -> Option<Point> {
        self.canvas
            .contains(window_point)
            .then(|| window_point - self.canvas_origin().to_vec2())
    }

    /// Map a window point to canvas coordinates without bounds checks.
    pub fn to_canvas_unclamped(&self, window_point: Point) -> Point {
        window_point - self.canvas_origin().to_vec2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_layout() {
        let layout = Layout::compute(Size::new(800.0, 600.0), ScreenKind::Draw, false);
        assert_eq!(layout.canvas, Rect::new(0.0, 60.0, 800.0, 560.0));
        assert_eq!(layout.preview_bar, Some(Rect::new(0.0, 560.0, 800.0, 600.0)));
        assert_eq!(layout.preview_panel, None);
    }

    #[test]
    fn test_expanded_layout_fills_below_toolbar() {
        let layout = Layout::compute(Size::new(800.0, 600.0), ScreenKind::Draw, true);
        assert_eq!(layout.preview_bar, Some(Rect::new(0.0, 60.0, 800.0, 100.0)));
        assert_eq!(layout.preview_panel, Some(Rect::new(0.0, 100.0, 800.0, 600.0)));
    }

    #[test]
    fn test_reflect_has_no_preview() {
        let layout = Layout::compute(Size::new(800.0, 600.0), ScreenKind::Reflect, true);
        assert_eq!(layout.canvas, Rect::new(0.0, 60.0, 800.0, 600.0));
        assert!(layout.preview_bar.is_none());
        assert!(layout.preview_panel.is_none());
    }

    #[test]
    fn test_to_canvas_offsets_by_toolbar() {
        let layout = Layout::compute(Size::new(800.0, 600.0), ScreenKind::Draw, false);
        assert_eq!(layout.to_canvas(Point::new(10.0, 70.0)), Some(Point::new(10.0, 10.0)));
        assert_eq!(layout.to_canvas(Point::new(10.0, 30.0)), None);
        assert_eq!(layout.to_canvas_unclamped(Point::new(10.0, 30.0)), Point::new(10.0, -30.0));
    }

    #[test]
    fn test_tiny_window_does_not_invert() {
        let layout = Layout::compute(Size::new(100.0, 20.0), ScreenKind::Draw, false);
        assert!(layout.canvas.height() >= 0.0);
    }
}
