mod input;
mod timing;

use atelier_portal::assets::{ContentError, ContentLibrary, FsAssetLoader};
use atelier_portal::config::{load_config_from_file, ConfigError, ExperienceConfig};
use atelier_portal::platform::headless::{HeadlessDom, HeadlessRenderer};
use atelier_portal::platform::{EventKind, InputEvent, ListenerOwner, Platform};
use atelier_portal::render::Viewport;
use atelier_portal::scene::{SceneDirector, SceneKind};
use timing::FrameTiming;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("content: {0}")]
    Content(#[from] ContentError),
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Everything the host needs before a window exists.
pub struct Settings {
    pub config: ExperienceConfig,
    pub content: ContentLibrary,
    pub seed: Option<u64>,
}

impl Settings {
    pub fn load(
        config_path: Option<&Path>,
        content_path: Option<&Path>,
        seed: Option<u64>,
    ) -> Result<Self, AppError> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                load_config_from_file(path)?
            }
            None => ExperienceConfig::default(),
        };
        let content_path = content_path
            .map(Path::to_path_buf)
            .or_else(|| config.content_path.clone());
        let content = match content_path {
            Some(path) => ContentLibrary::load_from_file(&path)?,
            None => {
                log::warn!("No content library given, galleries will be empty");
                ContentLibrary::new()
            }
        };
        log::info!(
            "{} fragment(s), {} workshop gallery(ies)",
            config.fragments.len(),
            content.len()
        );
        Ok(Self {
            config,
            content,
            seed,
        })
    }
}

struct App {
    settings: Option<Settings>,
    window: Option<Arc<Window>>,
    director: Option<SceneDirector>,
    pointer: Option<(f32, f32)>,
    timing: FrameTiming,
    clock: Instant,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(settings: Settings) -> Self {
        let title = settings.config.window.title.clone();
        Self {
            settings: Some(settings),
            window: None,
            director: None,
            pointer: None,
            timing: FrameTiming::new(title),
            clock: Instant::now(),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
        }
    }

    fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1_000.0
    }

    fn init_director(&mut self, window: &Window) {
        let Some(settings) = self.settings.take() else {
            return;
        };
        let size = window.inner_size();
        let viewport = Viewport::new(size.width.max(1), size.height.max(1));
        let loader = FsAssetLoader::new(settings.config.asset_root.clone());
        let mut platform = Platform::new(
            Box::new(HeadlessRenderer::new()),
            Box::new(HeadlessDom::new()),
            Box::new(loader),
            settings.config,
            settings.content,
            viewport,
        );
        platform
            .events
            .add_listener(EventKind::Resize, ListenerOwner::Host);

        let mut director = SceneDirector::new(platform);
        if let Some(seed) = settings.seed {
            director = director.with_seed(seed);
        }
        if let Err(err) = director.start(SceneKind::Mirror, self.now_ms()) {
            log::error!("Could not build the opening scene: {}", err);
        }
        self.director = Some(director);
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn dispatch(&mut self, event: InputEvent) {
        let now = self.now_ms();
        if let Some(director) = &mut self.director {
            director.handle_input(event, now);
        }
    }

    fn render(&mut self) {
        let started = Instant::now();
        let now = self.now_ms();
        let Some(director) = &mut self.director else {
            return;
        };
        director.frame(now);
        let status = match (director.active_kind(), director.stage()) {
            (Some(kind), Some(stage)) => format!("{kind} / {stage:?}"),
            _ => "no scene".to_string(),
        };
        self.timing
            .set_frame_ms(started.elapsed().as_secs_f32() * 1000.0);
        self.timing
            .update(self.window.as_deref(), Instant::now(), &status);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let (title, width, height) = match &self.settings {
            Some(settings) => (
                settings.config.window.title.clone(),
                settings.config.window.width,
                settings.config.window.height,
            ),
            None => return,
        };

        let window_attrs = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        self.init_director(&window);
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                if event.repeat {
                    return;
                }
                if let Some(input) = input::key_event(event.physical_key, pressed) {
                    self.dispatch(input);
                }
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    self.dispatch(InputEvent::Resize(Viewport::new(
                        new_size.width,
                        new_size.height,
                    )));
                }
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.pointer = Some((x, y));
                self.dispatch(InputEvent::PointerMove { x, y });
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer = None;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some((x, y)) = self.pointer {
                    self.dispatch(InputEvent::Click { x, y });
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.dispatch(InputEvent::Wheel {
                    delta_y: input::wheel_delta(delta),
                });
            }
            WindowEvent::RedrawRequested => self.render(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

pub fn run(settings: Settings) -> Result<(), AppError> {
    log::info!("Atelier Portal");
    log::info!("   Click to break the mirror, Enter to continue, Backspace to go back, ESC to exit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;

    log::info!("Goodbye!");
    Ok(())
}
