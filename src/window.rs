use std::{sync::Arc, time::Instant};

use anyhow::Context;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    config::StoryConfig,
    engine,
    rendering::{config::RenderConfig, renderer::Renderer},
    story::state::StoryState,
};

// Used until the window reports its real size
const INITIAL_VIEWPORT_HEIGHT: f32 = 800.0;

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    renderer: Option<Renderer>,
    render_config: RenderConfig,
    state: StoryState,
    imgui: Option<ImguiState>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(state: StoryState, render_config: RenderConfig) -> Self {
        Self {
            renderer: None,
            render_config,
            state,
            imgui: None,
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn setup_imgui(window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = (16.0 * window.scale_factor()) as f32;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);
        context.io_mut().font_global_scale = (1.0 / window.scale_factor()) as f32;

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Geostory")
            .with_inner_size(LogicalSize::new(1280.0, INITIAL_VIEWPORT_HEIGHT));
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        let mut imgui = Self::setup_imgui(&window);

        let window = Arc::new(window);
        let mut renderer = pollster::block_on(Renderer::new(
            window.clone(),
            &mut self.state,
            &mut imgui.context,
            &self.render_config,
        ))
        .context("Failed to create renderer")?;

        renderer.upload_new_models(&mut self.state);
        self.state
            .resize_viewport(logical_height(window.inner_size(), window.scale_factor()));

        self.imgui = Some(imgui);
        self.renderer = Some(renderer);

        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

fn logical_height(size: PhysicalSize<u32>, scale_factor: f64) -> f32 {
    size.to_logical::<f32>(scale_factor).height
}

fn handle_key(state: &mut StoryState, event: &KeyEvent) {
    if event.state != ElementState::Pressed {
        return;
    }

    match &event.logical_key {
        Key::Named(NamedKey::ArrowDown) => state.scroll_lines(1.0),
        Key::Named(NamedKey::ArrowUp) => state.scroll_lines(-1.0),
        Key::Named(NamedKey::PageDown | NamedKey::Space) => state.scroll_pages(1.0),
        Key::Named(NamedKey::PageUp) => state.scroll_pages(-1.0),
        Key::Named(NamedKey::Home) => state.scroll_to(0.0),
        Key::Named(NamedKey::End) => state.scroll_to_end(),
        Key::Named(NamedKey::F3) if !event.repeat => state.show_debug = !state.show_debug,
        _ => (),
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.create_renderer(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                renderer.resize(*new_size);
                self.state
                    .resize_viewport(logical_height(*new_size, renderer.window.scale_factor()));
            }
            WindowEvent::MouseWheel { delta, .. } if !imgui.context.io().want_capture_mouse => {
                match delta {
                    MouseScrollDelta::LineDelta(_, y) => self.state.scroll_lines(-y),
                    MouseScrollDelta::PixelDelta(position) => {
                        let scale_factor = renderer.window.scale_factor();
                        self.state
                            .scroll_by(-(position.y / scale_factor) as f32);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } if !imgui.context.io().want_capture_keyboard => {
                handle_key(&mut self.state, key_event);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let delta_time = now - self.last_frame;
                self.last_frame = now;
                imgui.context.io_mut().update_delta_time(delta_time);

                renderer.window.request_redraw();

                if let Err(e) = imgui
                    .platform
                    .prepare_frame(imgui.context.io_mut(), &renderer.window)
                {
                    log::error!("Failed to prepare imgui frame: {}", e);
                    return;
                }

                let ui = imgui.context.new_frame();

                if let Err(e) =
                    engine::update(&mut self.state, renderer, ui, delta_time.as_secs_f32())
                {
                    self.error = Some(e.context("Error during engine::update"));
                    event_loop.exit();
                    return;
                }

                imgui.platform.prepare_render(ui, &renderer.window);

                match renderer.render(&self.state, &mut imgui.context) {
                    Ok(()) => (),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
            _ => (),
        }

        imgui.platform.handle_event::<()>(
            imgui.context.io_mut(),
            &renderer.window,
            &Event::WindowEvent { window_id, event },
        );
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let state = StoryState::new(StoryConfig::from_env(), INITIAL_VIEWPORT_HEIGHT)
        .context("Failed to create story")?;

    let mut app = App::new(state, RenderConfig::default());
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
