//! Core application state and lifecycle.

use inkmirror_core::{PointerEvent, PointerId, ScreenKind, SyncClient, SyncConfig, SyncError};
use inkmirror_render::VelloRenderer;
use kurbo::{Point, Size};
use peniko::Color;
use std::sync::Arc;
use thiserror::Error;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, ModifiersState};
use winit::window::{Window, WindowId};

use crate::layout::Layout;
use crate::session::Session;
use crate::ui::{render_ui, UiAction};

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
    /// Screen shown at startup.
    pub screen: ScreenKind,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "InkMirror".to_string(),
            width: 1024,
            height: 768,
            background_color: Color::WHITE,
            screen: ScreenKind::Draw,
            sync: SyncConfig::default(),
        }
    }
}

/// Runtime state for the application.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    stroke_renderer: VelloRenderer,
    /// Texture blitter for RGBA->surface format conversion
    texture_blitter: vello::wgpu::util::TextureBlitter,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    /// Last cursor position in logical window coordinates.
    cursor: Point,
    modifiers: ModifiersState,
}

impl AppState {
    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn logical_size(&self) -> Size {
        let size: LogicalSize<f64> = self.window.inner_size().to_logical(self.scale_factor());
        Size::new(size.width, size.height)
    }

    fn to_logical(&self, position: PhysicalPosition<f64>) -> Point {
        let logical = position.to_logical::<f64>(self.scale_factor());
        Point::new(logical.x, logical.y)
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    session: Session,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
}

impl App {
    /// Create the application and start connecting to the relay server.
    pub fn with_config(config: AppConfig) -> Result<Self, AppError> {
        let client = SyncClient::connect(&config.sync)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: AppConfig, client: SyncClient) -> Self {
        Self {
            session: Session::new(client, config.screen),
            config,
            state: None,
            render_cx: None,
        }
    }

    /// Run the application.
    pub fn run(config: AppConfig) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        let mut app = App::with_config(config)?;
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    /// Finish initialization after surface is created.
    fn finish_init(&mut self, window: Arc<Window>, surface: RenderSurface<'static>) -> Result<(), String> {
        let render_cx = self
            .render_cx
            .as_ref()
            .ok_or_else(|| "RenderContext not initialized".to_string())?;
        let device = &render_cx.devices[surface.dev_id].device;

        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| format!("Failed to create Vello renderer: {}", e))?;

        // Vello renders to Rgba8Unorm; the surface format may differ.
        let texture_blitter = vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface.config.format,
            egui_wgpu::RendererOptions::default(),
        );

        log::info!("InkMirror initialized - {}x{}", surface.config.width, surface.config.height);

        self.state = Some(AppState {
            window: window.clone(),
            surface,
            vello_renderer,
            stroke_renderer: VelloRenderer::new(),
            texture_blitter,
            egui_ctx,
            egui_state,
            egui_renderer,
            cursor: Point::ZERO,
            modifiers: ModifiersState::default(),
        });

        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        log::info!("Creating window...");
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };
        log::info!("Surface size: {}x{}", width, height);

        let render_cx = self.render_cx.get_or_insert_with(vello::util::RenderContext::new);
        let surface = match pollster::block_on(render_cx.create_surface(
            window.clone(),
            width,
            height,
            PresentMode::AutoVsync,
        )) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {:?}", e);
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.finish_init(window, surface) {
            log::error!("{}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        // Let egui process the event first
        let egui_response = state.egui_state.on_window_event(&state.window, &event);
        let egui_wants_pointer = egui_response.consumed
            || state.egui_ctx.is_pointer_over_area()
            || state.egui_ctx.wants_pointer_input();
        let egui_wants_keyboard = state.egui_ctx.wants_keyboard_input();

        let layout = self.session.layout(state.logical_size());

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                state.window.request_redraw();
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                state.modifiers = modifiers.state();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if egui_wants_keyboard || event.state != ElementState::Pressed {
                    return;
                }
                let command = state.modifiers.control_key() || state.modifiers.super_key();
                if command && matches!(&event.logical_key, Key::Character(c) if c.as_str() == "z") {
                    self.session.apply(UiAction::Undo);
                    state.window.request_redraw();
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = state.to_logical(position);
                let position = layout.to_canvas_unclamped(state.cursor);
                if self.session.pointer(PointerEvent::Move { id: PointerId::Mouse, position }) {
                    state.window.request_redraw();
                }
            }

            WindowEvent::MouseInput { state: btn_state, button: MouseButton::Left, .. } => {
                let id = PointerId::Mouse;
                let event = match btn_state {
                    ElementState::Pressed => {
                        // Skip canvas processing if egui wants the pointer
                        if egui_wants_pointer {
                            return;
                        }
                        let Some(position) = layout.to_canvas(state.cursor) else {
                            return;
                        };
                        PointerEvent::Down { id, position }
                    }
                    ElementState::Released => PointerEvent::Up {
                        id,
                        position: layout.to_canvas_unclamped(state.cursor),
                    },
                };
                if self.session.pointer(event) {
                    state.window.request_redraw();
                }
            }

            WindowEvent::Touch(touch) => {
                let id = PointerId::Touch(touch.id);
                let window_point = state.to_logical(touch.location);
                let position = layout.to_canvas_unclamped(window_point);
                let event = match touch.phase {
                    TouchPhase::Started => {
                        if egui_wants_pointer {
                            return;
                        }
                        let Some(position) = layout.to_canvas(window_point) else {
                            return;
                        };
                        PointerEvent::Down { id, position }
                    }
                    TouchPhase::Moved => PointerEvent::Move { id, position },
                    TouchPhase::Ended => PointerEvent::Up { id, position },
                    TouchPhase::Cancelled => PointerEvent::Cancel { id },
                };
                if self.session.pointer(event) {
                    state.window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                self.session.tick();

                // Run egui and get any actions
                let ui_state = self.session.ui_state(layout);
                let egui_input = state.egui_state.take_egui_input(&state.window);
                let mut action: Option<UiAction> = None;
                let egui_output = state.egui_ctx.run(egui_input, |ctx| {
                    action = render_ui(ctx, &ui_state);
                });
                state
                    .egui_state
                    .handle_platform_output(&state.window, egui_output.platform_output);
                let egui_primitives =
                    state.egui_ctx.tessellate(egui_output.shapes, egui_output.pixels_per_point);

                if let Some(action) = action {
                    log::debug!("UI action: {:?}", action);
                    self.session.apply(action);
                }

                let width = state.surface.config.width;
                let height = state.surface.config.height;
                let layout = self.session.layout(state.logical_size());
                let scale_factor = state.scale_factor();
                self.session.render(
                    &mut state.stroke_renderer,
                    &layout,
                    Size::new(width as f64, height as f64),
                    scale_factor,
                    self.config.background_color,
                );
                let scene = state.stroke_renderer.take_scene();

                // Render
                let Some(render_cx) = self.render_cx.as_ref() else {
                    return;
                };
                let device_handle = &render_cx.devices[state.surface.dev_id];
                let device = &device_handle.device;
                let queue = &device_handle.queue;

                let surface_texture = match state.surface.surface.get_current_texture() {
                    Ok(t) => t,
                    Err(e) => {
                        log::warn!("Failed to get surface texture: {:?}", e);
                        return;
                    }
                };

                let params = RenderParams {
                    base_color: self.config.background_color,
                    width,
                    height,
                    antialiasing_method: AaConfig::Area,
                };

                // Vello's compute shaders need a StorageBinding Rgba8Unorm target;
                // it is blitted to the surface afterwards.
                let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
                    label: Some("vello render texture"),
                    size: vello::wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: vello::wgpu::TextureDimension::D2,
                    format: vello::wgpu::TextureFormat::Rgba8Unorm,
                    usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                        | vello::wgpu::TextureUsages::COPY_SRC
                        | vello::wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                let render_texture_view =
                    render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

                if let Err(e) = state.vello_renderer.render_to_texture(
                    device,
                    queue,
                    &scene,
                    &render_texture_view,
                    &params,
                ) {
                    log::error!("Failed to render: {:?}", e);
                    return;
                }

                let surface_view = surface_texture
                    .texture
                    .create_view(&vello::wgpu::TextureViewDescriptor::default());

                {
                    let mut blit_encoder =
                        device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                            label: Some("blit encoder"),
                        });
                    state.texture_blitter.copy(
                        device,
                        &mut blit_encoder,
                        &render_texture_view,
                        &surface_view,
                    );
                    queue.submit(std::iter::once(blit_encoder.finish()));
                }

                // Update egui textures
                for (id, image_delta) in &egui_output.textures_delta.set {
                    state.egui_renderer.update_texture(device, queue, *id, image_delta);
                }

                // Render egui on top
                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [width, height],
                    pixels_per_point: egui_output.pixels_per_point,
                };
                {
                    let mut egui_encoder =
                        device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                            label: Some("egui encoder"),
                        });
                    state.egui_renderer.update_buffers(
                        device,
                        queue,
                        &mut egui_encoder,
                        &egui_primitives,
                        &screen_descriptor,
                    );

                    let render_pass =
                        egui_encoder.begin_render_pass(&vello::wgpu::RenderPassDescriptor {
                            label: Some("egui render pass"),
                            color_attachments: &[Some(vello::wgpu::RenderPassColorAttachment {
                                view: &surface_view,
                                resolve_target: None,
                                ops: vello::wgpu::Operations {
                                    load: vello::wgpu::LoadOp::Load,
                                    store: vello::wgpu::StoreOp::Store,
                                },
                                depth_slice: None,
                            })],
                            depth_stencil_attachment: None,
                            timestamp_writes: None,
                            occlusion_query_set: None,
                        });
                    let mut render_pass = render_pass.forget_lifetime();
                    state
                        .egui_renderer
                        .render(&mut render_pass, &egui_primitives, &screen_descriptor);
                    drop(render_pass);

                    queue.submit(std::iter::once(egui_encoder.finish()));
                }

                // Free egui textures
                for id in &egui_output.textures_delta.free {
                    state.egui_renderer.free_texture(id);
                }
                surface_texture.present();

                // Keep pumping remote changes and pending operations.
                state.window.request_redraw();
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmirror_core::MemoryStore;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.title, "InkMirror");
        assert_eq!(config.screen, ScreenKind::Draw);
        assert_eq!(config.sync, SyncConfig::default());
    }

    #[test]
    fn test_with_client_starts_on_configured_screen() {
        let store = Arc::new(MemoryStore::new());
        let client = SyncClient::new(store.clone(), "drawing");
        let config = AppConfig { screen: ScreenKind::Reflect, ..AppConfig::default() };
        let app = App::with_client(config, client);
        assert_eq!(app.session.screen(), ScreenKind::Reflect);
        assert_eq!(store.watch_count(), 1);
        assert!(app.state.is_none());
    }

    #[test]
    fn test_with_config_rejects_invalid_endpoint() {
        let mut config = AppConfig::default();
        config.sync.endpoint = "http://localhost:3030/ws".to_string();
        assert!(matches!(App::with_config(config), Err(AppError::Sync(_))));
    }
}
