//! UI components using egui.

use egui::{Align2, Context, Pos2, RichText, Vec2};
use inkmirror_core::{Notice, NoticeKind, ScreenKind, ViewBox};

use crate::layout::Layout;
use crate::widgets::{bar_frame, panel_frame, theme, vertical_separator, TextButton};

/// Snapshot of what the UI shows this frame.
#[derive(Debug, Clone)]
pub struct UiState {
    pub screen: ScreenKind,
    pub layout: Layout,
    pub can_undo: bool,
    /// Operations still waiting on the remote store.
    pub busy: bool,
    pub preview_expanded: bool,
    pub preview_box: ViewBox,
    pub notice: Option<Notice>,
}

/// Actions triggered by UI interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    SwitchScreen(ScreenKind),
    Undo,
    Send,
    Clear,
    TogglePreview,
    DismissNotice,
}

fn to_pos(point: kurbo::Point) -> Pos2 {
    Pos2::new(point.x as f32, point.y as f32)
}

/// Render every UI layer and return the action the user took, if any.
pub fn render_ui(ctx: &Context, ui_state: &UiState) -> Option<UiAction> {
    let mut action = render_toolbar(ctx, ui_state);
    if let Some(bar) = ui_state.layout.preview_bar {
        action = render_preview_bar(ctx, ui_state, bar).or(action);
    }
    if let Some(notice) = &ui_state.notice {
        action = render_notice(ctx, notice).or(action);
    }
    action
}

fn render_toolbar(ctx: &Context, ui_state: &UiState) -> Option<UiAction> {
    let mut action = None;
    let rect = ui_state.layout.toolbar;

    egui::Area::new(egui::Id::new("toolbar"))
        .fixed_pos(to_pos(rect.origin()))
        .show(ctx, |ui| {
            bar_frame().show(ui, |ui| {
                ui.set_width(rect.width() as f32 - 24.0);
                ui.set_height(rect.height() as f32 - 14.0);
                ui.horizontal_centered(|ui| {
                    ui.spacing_mut().item_spacing = Vec2::new(4.0, 0.0);

                    for (kind, label) in [(ScreenKind::Draw, "Draw"), (ScreenKind::Reflect, "Reflect")] {
                        if TextButton::new(label).selected(ui_state.screen == kind).show(ui) {
                            action = Some(UiAction::SwitchScreen(kind));
                        }
                    }

                    if ui_state.screen != ScreenKind::Draw {
                        return;
                    }
                    vertical_separator(ui);

                    if TextButton::new("Undo").enabled(ui_state.can_undo).show(ui) {
                        action = Some(UiAction::Undo);
                    }
                    if TextButton::new("Send").show(ui) {
                        action = Some(UiAction::Send);
                    }
                    if TextButton::new("Clear").show(ui) {
                        action = Some(UiAction::Clear);
                    }
                    if ui_state.busy {
                        ui.add(egui::Spinner::new().size(16.0).color(theme::TEXT_MUTED));
                    }
                });
            });
        });

    action
}

fn render_preview_bar(ctx: &Context, ui_state: &UiState, bar: kurbo::Rect) -> Option<UiAction> {
    let mut action = None;
    let label = if ui_state.preview_expanded {
        "Hide preview"
    } else {
        "Show preview"
    };

    egui::Area::new(egui::Id::new("preview_bar"))
        .fixed_pos(to_pos(bar.origin()))
        .show(ctx, |ui| {
            bar_frame().show(ui, |ui| {
                ui.set_width(bar.width() as f32 - 24.0);
                ui.set_height(bar.height() as f32 - 14.0);
                ui.horizontal_centered(|ui| {
                    if TextButton::new(label).selected(ui_state.preview_expanded).show(ui) {
                        action = Some(UiAction::TogglePreview);
                    }
                    if ui_state.preview_expanded {
                        ui.label(
                            RichText::new(format!("viewBox {}", ui_state.preview_box))
                                .size(11.0)
                                .color(theme::TEXT_MUTED),
                        );
                    }
                });
            });
        });

    action
}

fn render_notice(ctx: &Context, notice: &Notice) -> Option<UiAction> {
    let mut action = None;
    let accent = match notice.kind {
        NoticeKind::Info => theme::ACCENT,
        NoticeKind::Success => theme::SUCCESS,
        NoticeKind::Error => theme::DANGER,
    };

    egui::Area::new(egui::Id::new("notice"))
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.set_min_width(220.0);
                ui.vertical(|ui| {
                    ui.label(RichText::new(&notice.title).strong().size(15.0).color(accent));
                    ui.add_space(4.0);
                    ui.label(RichText::new(&notice.message).color(theme::TEXT));
                    ui.add_space(8.0);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                        if TextButton::new("OK").show(ui) {
                            action = Some(UiAction::DismissNotice);
                        }
                    });
                });
            });
        });

    if ctx.input(|i| i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Escape)) {
        action = Some(UiAction::DismissNotice);
    }
    action
}
