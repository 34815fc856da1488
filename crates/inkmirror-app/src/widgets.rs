//! Styled egui building blocks shared by the toolbar, preview bar and
//! notice toast.

use egui::{vec2, Color32, CornerRadius, CursorIcon, Frame, Margin, Pos2, Sense, Stroke, Ui};

/// Standard sizing constants used across widgets.
pub mod sizing {
    /// Toolbar button height
    pub const BUTTON_HEIGHT: f32 = 32.0;
    /// Standard corner radius
    pub const CORNER_RADIUS: u8 = 6;
    /// Panel corner radius
    pub const PANEL_RADIUS: u8 = 8;
}

/// Standard colors used across widgets.
pub mod theme {
    use egui::Color32;

    /// Text color (dark gray)
    pub const TEXT: Color32 = Color32::from_rgb(60, 60, 60);
    /// Muted text color
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 120, 120);
    /// Border color
    pub const BORDER: Color32 = Color32::from_rgb(220, 220, 220);
    /// Selection/active color (blue)
    pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);
    pub const DANGER: Color32 = Color32::from_rgb(220, 38, 38);
    pub const SUCCESS: Color32 = Color32::from_rgb(22, 163, 74);
    /// Hover background
    pub const HOVER_BG: Color32 = Color32::from_rgb(245, 245, 245);
    /// Panel background
    pub const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(250, 250, 252, 250);
}

/// Create a standard panel frame with shadow.
pub fn panel_frame() -> Frame {
    Frame::new()
        .fill(theme::PANEL_BG)
        .corner_radius(CornerRadius::same(sizing::PANEL_RADIUS))
        .stroke(Stroke::new(1.0, theme::BORDER))
        .shadow(egui::epaint::Shadow {
            spread: 0,
            blur: 8,
            offset: [0, 2],
            color: Color32::from_black_alpha(15),
        })
        .inner_margin(Margin::same(8))
}

/// Full-width bar frame (toolbar, preview bar).
pub fn bar_frame() -> Frame {
    Frame::new()
        .fill(theme::PANEL_BG)
        .stroke(Stroke::new(1.0, theme::BORDER))
        .inner_margin(Margin::symmetric(12, 6))
}

/// Labelled toolbar button with selected and disabled states.
pub struct TextButton<'a> {
    label: &'a str,
    selected: bool,
    enabled: bool,
}

impl<'a> TextButton<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            selected: false,
            enabled: true,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Show the button and return true if clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let font = egui::FontId::proportional(14.0);
        let text_width = ui
            .painter()
            .layout_no_wrap(self.label.to_string(), font.clone(), theme::TEXT)
            .size()
            .x;
        let size = vec2(text_width + 24.0, sizing::BUTTON_HEIGHT);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected {
                theme::ACCENT
            } else if self.enabled && response.hovered() {
                theme::HOVER_BG
            } else {
                Color32::TRANSPARENT
            };
            ui.painter()
                .rect_filled(rect, CornerRadius::same(sizing::CORNER_RADIUS), bg_color);

            let text_color = if self.selected {
                Color32::WHITE
            } else if self.enabled {
                theme::TEXT
            } else {
                Color32::from_gray(180)
            };
            ui.painter().text(
                Pos2::new(rect.center().x, rect.center().y),
                egui::Align2::CENTER_CENTER,
                self.label,
                font,
                text_color,
            );
        }

        let clicked = response.clicked();
        if self.enabled {
            response.on_hover_cursor(CursorIcon::PointingHand);
        }
        self.enabled && clicked
    }
}

/// Draw a vertical separator line (small height).
pub fn vertical_separator(ui: &mut Ui) {
    let rect = ui.available_rect_before_wrap();
    let height = 20.0;
    let x = rect.left() + 4.0;
    let top = rect.center().y - height / 2.0;
    ui.painter().line_segment(
        [Pos2::new(x, top), Pos2::new(x, top + height)],
        Stroke::new(1.0, Color32::from_gray(210)),
    );
    ui.add_space(9.0);
}
