use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::config::SceneConfig;
use crate::gfx::{
    picking::ScreenRect,
    rendering::render_engine::{RenderEngine, UiPass},
    scene::Scene,
};
use crate::photos::{EmptyListing, HttpPhotoListing, PhotoListing, PhotoLoader};
use crate::simulation::{
    logical_width, ChristmasTree, GestureError, GestureInput, PointerEvent, SceneRenderer,
};
use crate::ui::{OverlayPanel, OverlayStatus, UiManager};

pub struct TinselApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    overlay: OverlayPanel,
    tree: Option<ChristmasTree>,
    loader: PhotoLoader,
    listing: Arc<dyn PhotoListing>,
    gesture_input: Option<GestureInput>,
    cursor: (f32, f32),
    error: Option<anyhow::Error>,
}

impl TinselApp {
    /// Creates the application; the window opens once `run` is called
    pub fn new(config: SceneConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        let loader =
            PhotoLoader::new(config.photos.min_photos).context("Failed to start photo loader")?;

        let listing: Arc<dyn PhotoListing> = match &config.photos.listing_url {
            Some(url) => Arc::new(HttpPhotoListing::new(url.clone(), config.photos.folder.clone())),
            None => {
                log::info!("No photo service configured, using fallback cards");
                Arc::new(EmptyListing)
            }
        };

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                overlay: OverlayPanel::new(),
                tree: None,
                loader,
                listing,
                gesture_input: None,
                cursor: (0.0, 0.0),
                error: None,
            },
        })
    }

    /// Connects a camera feed and hand detector
    pub fn with_gesture_input(mut self, input: GestureInput) -> Self {
        self.app_state.gesture_input = Some(input);
        self
    }

    /// Queues an image file to be added as a photo
    pub fn add_photo_file(&mut self, path: impl Into<PathBuf>) {
        self.app_state.loader.load_file(path);
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        self.app_state
            .loader
            .load_remote(Arc::clone(&self.app_state.listing));

        event_loop
            .run_app(&mut self.app_state)
            .context("Failed to run event loop")?;

        match self.app_state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Renders through the engine with the overlay on top
struct FrameRenderer<'a> {
    engine: &'a mut RenderEngine,
    ui: Option<&'a mut UiManager>,
    window: &'a Window,
    overlay: &'a OverlayPanel,
    status: OverlayStatus,
}

impl SceneRenderer for FrameRenderer<'_> {
    fn render(&mut self, scene: &Scene) {
        let result = match self.ui.as_deref_mut() {
            Some(ui) => {
                let (window, overlay, status) = (self.window, self.overlay, self.status);
                self.engine.render_frame(
                    scene,
                    Some(
                        |device: &wgpu::Device,
                         queue: &wgpu::Queue,
                         encoder: &mut wgpu::CommandEncoder,
                         view: &wgpu::TextureView| {
                            ui.draw(device, queue, encoder, window, view, |frame| {
                                overlay.draw(frame, &status)
                            });
                        },
                    ),
                )
            }
            None => self.engine.render_frame(scene, None::<UiPass>),
        };

        if let Err(e) = result {
            self.engine.handle_surface_error(e);
        }
    }
}

impl AppState {
    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title("Tinsel")
                    .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
            )
            .context("Failed to create window")?;
        let window_handle = Arc::new(window);

        let (width, height): (u32, u32) = window_handle.inner_size().into();
        let window_clone = window_handle.clone();
        let renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height).await
        })?;

        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window_handle,
        );

        let (width, height) = renderer.get_surface_size();
        let mut tree = ChristmasTree::new(
            self.config.clone(),
            width as f32 / height as f32,
            Instant::now(),
        );
        tree.attach_gesture_input(
            self.gesture_input
                .take()
                .ok_or_else(|| GestureError::Unavailable("no camera connected".to_string())),
        );

        self.tree = Some(tree);
        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window_handle);
        Ok(())
    }

    fn handle_pointer(&mut self, event: PointerEvent) {
        let (Some(tree), Some(render_engine)) = (self.tree.as_mut(), self.render_engine.as_ref())
        else {
            return;
        };

        let (width, height) = render_engine.get_surface_size();
        let rect = ScreenRect::from_size(width as f32, height as f32);
        tree.handle_pointer(&event, &rect);
    }

    fn redraw(&mut self) {
        let (Some(tree), Some(render_engine), Some(window)) = (
            self.tree.as_mut(),
            self.render_engine.as_mut(),
            self.window.as_ref(),
        ) else {
            return;
        };

        let now = Instant::now();
        tree.poll_gestures(now);
        for photo in self.loader.poll_completed() {
            tree.add_photo(photo.label, Arc::new(photo.image));
        }

        let status = OverlayStatus {
            mode: tree.state().mode(),
            photo_count: tree.photo_count(),
            hand_tracking: tree.has_hand_tracking(),
            hand_detected: tree.state().hand.detected,
            pending_photos: self.loader.pending(),
        };

        let (width, _) = render_engine.get_surface_size();
        let width = logical_width(width, window.scale_factor());
        let mut renderer = FrameRenderer {
            engine: render_engine,
            ui: self.ui_manager.as_mut(),
            window,
            overlay: &self.overlay,
            status,
        };
        tree.frame(now, width, &mut renderer);
    }

    /// Stops the animation, abandons photo loads, then drops GPU resources
    fn teardown(&mut self) {
        log::info!("Shutting down");
        if let Some(tree) = self.tree.as_mut() {
            tree.stop();
        }
        self.loader.shutdown();
        self.ui_manager = None;
        self.render_engine = None;
        self.tree = None;
        self.window = None;
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.open_window(event_loop) {
            log::error!("{e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // Handle UI input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_input(&window, window_id, &event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyH => self.overlay.toggle_hints(),
                _ => (),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                self.handle_pointer(PointerEvent::click(x, y, Instant::now()));
            }
            WindowEvent::Touch(Touch {
                phase: TouchPhase::Ended,
                location,
                ..
            }) => {
                self.handle_pointer(PointerEvent::touch_end(
                    location.x as f32,
                    location.y as f32,
                    Instant::now(),
                ));
            }
            WindowEvent::DroppedFile(path) => {
                log::info!("Adding dropped photo {}", path.display());
                self.loader.load_file(path);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(tree) = self.tree.as_mut() {
                    tree.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}
