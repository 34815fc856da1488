//! Screen switching and per-frame screen work, independent of the window.

use crate::layout::Layout;
use crate::ui::{UiAction, UiState};
use inkmirror_core::{DrawingScreen, PointerEvent, ReflectionScreen, ScreenKind, SyncClient};
use inkmirror_render::{PreviewPanel, RenderContext, Renderer, StrokeStyle};
use kurbo::Size;
use peniko::Color;

/// Both screens plus the one currently showing.
///
/// The drawing screen lives for the whole session so its strokes survive a
/// trip to the reflection screen. The reflection screen is mounted when shown
/// and dropped (unsubscribing) when left.
pub struct Session {
    client: SyncClient,
    drawing: DrawingScreen,
    reflection: Option<ReflectionScreen>,
    screen: ScreenKind,
}

impl Session {
    pub fn new(client: SyncClient, screen: ScreenKind) -> Self {
        let mut session = Self {
            drawing: DrawingScreen::new(client.clone()),
            client,
            reflection: None,
            screen: ScreenKind::Draw,
        };
        session.switch_to(screen);
        session
    }

    pub fn screen(&self) -> ScreenKind {
        self.screen
    }

    pub fn drawing_screen(&self) -> &DrawingScreen {
        &self.drawing
    }

    pub fn is_reflection_mounted(&self) -> bool {
        self.reflection.is_some()
    }

    pub fn switch_to(&mut self, screen: ScreenKind) {
        if screen == self.screen && (screen == ScreenKind::Draw || self.reflection.is_some()) {
            return;
        }
        match screen {
            ScreenKind::Draw => {
                self.reflection = None;
                self.screen = ScreenKind::Draw;
            }
            ScreenKind::Reflect => match ReflectionScreen::mount(&self.client) {
                Ok(reflection) => {
                    self.reflection = Some(reflection);
                    self.screen = ScreenKind::Reflect;
                }
                Err(e) => log::error!("Could not open the reflection screen: {}", e),
            },
        }
        log::info!("Showing {:?} screen", self.screen);
    }

    pub fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::SwitchScreen(screen) => self.switch_to(screen),
            UiAction::Undo => {
                self.drawing.undo();
            }
            UiAction::Send => {
                self.drawing.begin_send();
            }
            UiAction::Clear => self.drawing.begin_clear(),
            UiAction::TogglePreview => self.drawing.toggle_preview(),
            UiAction::DismissNotice => {
                self.drawing.dismiss_notice();
            }
        }
    }

    /// Route a canvas pointer event. Only the drawing screen takes input.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        match self.screen {
            ScreenKind::Draw => self.drawing.handle_pointer(event),
            ScreenKind::Reflect => false,
        }
    }

    /// Finish completed operations and deliver remote changes.
    pub fn tick(&mut self) {
        self.drawing.poll_pending();
        self.client.pump();
    }

    pub fn ui_state(&self, layout: Layout) -> UiState {
        UiState {
            screen: self.screen,
            layout,
            can_undo: !self.drawing.drawing().is_empty(),
            busy: self.drawing.is_busy(),
            preview_expanded: self.drawing.is_preview_expanded(),
            preview_box: self.drawing.preview_box(),
            notice: self.drawing.notice().cloned(),
        }
    }

    pub fn layout(&self, window: Size) -> Layout {
        Layout::compute(window, self.screen, self.drawing.is_preview_expanded())
    }

    /// Build the frame's scene for the current screen.
    pub fn render(
        &self,
        renderer: &mut impl Renderer,
        layout: &Layout,
        viewport_size: Size,
        scale_factor: f64,
        background: Color,
    ) {
        match self.screen {
            ScreenKind::Draw => {
                let preview = layout.preview_panel.map(|rect| PreviewPanel {
                    drawing: self.drawing.preview_source(),
                    rect,
                });
                let ctx = RenderContext::new(self.drawing.drawing(), viewport_size)
                    .with_scale_factor(scale_factor)
                    .with_canvas_origin(layout.canvas_origin())
                    .with_background(background)
                    .with_stroke_style(StrokeStyle::INK)
                    .with_current_stroke(self.drawing.current_stroke())
                    .with_preview(preview);
                renderer.build_scene(&ctx);
            }
            ScreenKind::Reflect => {
                let mirrored = self
                    .reflection
                    .as_ref()
                    .map(ReflectionScreen::drawing)
                    .unwrap_or_default();
                let ctx = RenderContext::new(&mirrored, viewport_size)
                    .with_scale_factor(scale_factor)
                    .with_canvas_origin(layout.canvas_origin())
                    .with_background(background)
                    .with_stroke_style(StrokeStyle::REFLECTION);
                renderer.build_scene(&ctx);
            }
        }
    }
}
