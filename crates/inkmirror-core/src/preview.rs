//! Preview fitting: the bounding box of a drawing and the transform that
//! scales it into a miniature panel.

use crate::stroke::Drawing;
use kurbo::{Affine, Rect, Vec2};

/// Size substituted for an empty or degenerate dimension.
pub const DEFAULT_EXTENT: f64 = 100.0;

/// A viewport `(min_x, min_y, width, height)` in drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: DEFAULT_EXTENT,
            height: DEFAULT_EXTENT,
        }
    }
}

impl ViewBox {
    /// The tight bounding box of every point in `drawing`.
    ///
    /// An empty drawing (or one with no parseable point) gets the default
    /// `(0, 0, 100, 100)` box. A zero width or height is replaced by 100 so
    /// the viewport never collapses.
    pub fn of(drawing: &Drawing) -> Self {
        let mut points = drawing.points();
        let Some(first) = points.next() else {
            return Self::default();
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let width = max_x - min_x;
        let height = max_y - min_y;
        Self {
            min_x,
            min_y,
            width: if width == 0.0 { DEFAULT_EXTENT } else { width },
            height: if height == 0.0 { DEFAULT_EXTENT } else { height },
        }
    }

    /// As a `(min_x, min_y, width, height)` tuple.
    pub fn to_tuple(self) -> (f64, f64, f64, f64) {
        (self.min_x, self.min_y, self.width, self.height)
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.min_x,
            self.min_y,
            self.min_x + self.width,
            self.min_y + self.height,
        )
    }

    /// Map this box into `panel`, scaled uniformly and centered
    /// (`xMidYMid meet`).
    pub fn fit(self, panel: Rect) -> Affine {
        let scale = (panel.width() / self.width).min(panel.height() / self.height);
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };

        let offset = Vec2::new(
            panel.x0 + (panel.width() - self.width * scale) / 2.0,
            panel.y0 + (panel.height() - self.height * scale) / 2.0,
        );
        Affine::translate(offset)
            * Affine::scale(scale)
            * Affine::translate((-self.min_x, -self.min_y))
    }
}

impl std::fmt::Display for ViewBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.min_x, self.min_y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_empty_drawing_default_box() {
        assert_eq!(ViewBox::of(&Drawing::new()).to_tuple(), (0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_tight_box() {
        let drawing = Drawing::from_descriptions(["M10 10 L20 10 L20 20"]);
        assert_eq!(ViewBox::of(&drawing).to_tuple(), (10.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn test_single_point_is_degenerate_on_both_axes() {
        let drawing = Drawing::from_descriptions(["M5 5"]);
        assert_eq!(ViewBox::of(&drawing).to_tuple(), (5.0, 5.0, 100.0, 100.0));
    }

    #[test]
    fn test_horizontal_line_substitutes_height() {
        let drawing = Drawing::from_descriptions(["M0 40 L30 40"]);
        assert_eq!(ViewBox::of(&drawing).to_tuple(), (0.0, 40.0, 30.0, 100.0));
    }

    #[test]
    fn test_box_spans_strokes_and_skips_garbage() {
        let drawing = Drawing::from_descriptions(["M10 50 L12.5 60", "not a path", "M40 5 Lx 900"]);
        assert_eq!(ViewBox::of(&drawing).to_tuple(), (10.0, 5.0, 30.0, 55.0));
    }

    #[test]
    fn test_only_garbage_uses_default() {
        let drawing = Drawing::from_descriptions(["nothing here"]);
        assert_eq!(ViewBox::of(&drawing), ViewBox::default());
    }

    #[test]
    fn test_deterministic() {
        let drawing = Drawing::from_descriptions(["M3 4 L9 1", "M7 7"]);
        assert_eq!(ViewBox::of(&drawing), ViewBox::of(&drawing));
    }

    #[test]
    fn test_display_matches_viewbox_attribute() {
        let drawing = Drawing::from_descriptions(["M10 10 L20.5 10 L20 20"]);
        assert_eq!(ViewBox::of(&drawing).to_string(), "10 10 10.5 10");
    }

    #[test]
    fn test_fit_centers_wide_box() {
        // 200x100 box into a 100x100 panel: scale 0.5, centered vertically.
        let view = ViewBox { min_x: 0.0, min_y: 0.0, width: 200.0, height: 100.0 };
        let affine = view.fit(Rect::new(0.0, 0.0, 100.0, 100.0));

        let top_left = affine * Point::new(0.0, 0.0);
        let bottom_right = affine * Point::new(200.0, 100.0);
        assert!((top_left.x - 0.0).abs() < 1e-9);
        assert!((top_left.y - 25.0).abs() < 1e-9);
        assert!((bottom_right.x - 100.0).abs() < 1e-9);
        assert!((bottom_right.y - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_respects_panel_origin() {
        let view = ViewBox { min_x: 10.0, min_y: 10.0, width: 10.0, height: 10.0 };
        let affine = view.fit(Rect::new(50.0, 100.0, 150.0, 200.0));
        let p = affine * Point::new(10.0, 10.0);
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!((p.y - 100.0).abs() < 1e-9);
    }
}
