//! Window, event loop and frame loop.
//!
//! The runner owns everything a frame needs (GPU context, resources, scene,
//! input) and lends it out explicitly: to the setup closure once through
//! [`SetupContext`], then to the frame closure every frame through
//! [`Frame`]. Nothing lives in globals.
//!
//! Each frame runs in this order:
//!
//! 1. finished background texture loads are uploaded
//! 2. the frame closure runs (input handling, picking, scene edits)
//! 3. the scene updates, and components queue their draws
//! 4. the draw queue is rendered with the active camera
//! 5. per-frame input state is cleared

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec2};
use log::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::config::AppConfig;
use crate::draw_queue::DrawQueue;
use crate::error::{AppError, MeshError};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::material::Material;
use crate::mesh::MeshData;
use crate::picking::RayHit;
use crate::renderer::SceneRenderer;
use crate::resources::{MaterialId, MeshId, RenderResources, TextureId};
use crate::scene::Scene;

/// Context provided once, before the first frame.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    pub resources: &'a mut RenderResources,
    pub scene: &'a mut Scene,
    pub config: &'a AppConfig,
}

impl SetupContext<'_> {
    /// Validates and uploads a mesh.
    pub fn add_mesh(&mut self, data: &MeshData) -> Result<MeshId, MeshError> {
        self.resources.add_mesh(self.gpu, data)
    }

    pub fn add_material(&mut self, material: impl Material + 'static) -> MaterialId {
        self.resources.add_material(material)
    }

    /// Starts loading a texture in the background. The handle is usable at
    /// once and shows a placeholder until the image arrives.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> TextureId {
        self.resources.textures.load(self.gpu, path)
    }

    /// A camera using the configured field of view and clip planes, sized to
    /// the window.
    pub fn camera(&self) -> Camera {
        Camera::new(
            self.config.fov_degrees.to_radians(),
            self.gpu.aspect(),
            self.config.near,
            self.config.far,
        )
    }
}

/// Context provided each frame.
pub struct Frame<'a> {
    pub scene: &'a mut Scene,
    pub resources: &'a mut RenderResources,
    pub input: &'a Input,
    pub config: &'a AppConfig,
    /// Total elapsed time in seconds.
    pub time: f32,
    /// Delta time since last frame in seconds.
    pub dt: f32,
    width: u32,
    height: u32,
    cursor_grabbed: bool,
    grab_request: Option<bool>,
}

impl Frame<'_> {
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cursor position in normalized device coordinates.
    pub fn mouse_ndc(&self) -> Vec2 {
        self.input.mouse_ndc(self.width, self.height)
    }

    /// Closest collider under the cursor, seen from the active camera.
    pub fn pick(&mut self) -> Option<RayHit> {
        let ndc = self.mouse_ndc();
        self.scene.pick_ndc(ndc)
    }

    pub fn cursor_grabbed(&self) -> bool {
        self.grab_request.unwrap_or(self.cursor_grabbed)
    }

    /// Locks and hides the cursor, or releases it. Applied after the frame
    /// closure returns.
    pub fn set_cursor_grab(&mut self, grab: bool) {
        self.grab_request = Some(grab);
    }
}

/// Run a Trireme application with the default configuration.
///
/// # Example
/// ```ignore
/// trireme::run(|ctx| {
///     let camera = ctx.camera();
///     let id = ctx.scene.add(GameObject::new().with(camera));
///     ctx.scene.set_active_camera(id);
///
///     Ok(move |frame: &mut Frame| {
///         if let Some(hit) = frame.pick() {
///             log::info!("hit {:?}", hit.object);
///         }
///     })
/// })?;
/// ```
pub fn run<S, F>(setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> Result<F, AppError> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    run_with_config(AppConfig::default(), setup)
}

/// Run a Trireme application with custom configuration.
///
/// Initialises logging (`RUST_LOG`, default `info`), opens the window and
/// blocks until it is closed. Failures during GPU initialisation or setup
/// are logged and returned once the event loop has exited.
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> Result<F, AppError> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = TriremeApp::Pending {
        config,
        setup: Some(Box::new(move |ctx: &mut SetupContext| {
            setup(ctx).map(|frame_fn| Box::new(frame_fn) as FrameFn)
        })),
    };
    event_loop.run_app(&mut app)?;

    match app {
        TriremeApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

type FrameFn = Box<dyn FnMut(&mut Frame)>;
type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Result<FrameFn, AppError>>;

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: SceneRenderer,
    resources: RenderResources,
    scene: Scene,
    input: Input,
    draws: DrawQueue,
    config: AppConfig,
    frame_fn: FrameFn,
    cursor_grabbed: bool,
    start_time: Instant,
    last_frame: Instant,
}

enum TriremeApp {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
    Failed(AppError),
}

impl TriremeApp {
    fn start(
        event_loop: &ActiveEventLoop,
        config: AppConfig,
        setup: SetupFn,
    ) -> Result<Running, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        info!("surface {}x{} {:?}", gpu.width(), gpu.height(), gpu.config.format);

        let renderer = SceneRenderer::new(&gpu, config.background());
        let mut resources = RenderResources::new();
        let mut scene = Scene::new();

        let frame_fn = setup(&mut SetupContext {
            gpu: &gpu,
            resources: &mut resources,
            scene: &mut scene,
            config: &config,
        })?;
        scene.set_camera_aspect(gpu.aspect());

        Ok(Running {
            window,
            gpu,
            renderer,
            resources,
            scene,
            input: Input::new(),
            draws: DrawQueue::new(),
            config,
            frame_fn,
            cursor_grabbed: false,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        })
    }
}

impl Running {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.resources.textures.poll(&self.gpu);

        let mut frame = Frame {
            scene: &mut self.scene,
            resources: &mut self.resources,
            input: &self.input,
            config: &self.config,
            time,
            dt,
            width: self.gpu.width(),
            height: self.gpu.height(),
            cursor_grabbed: self.cursor_grabbed,
            grab_request: None,
        };
        (self.frame_fn)(&mut frame);
        if let Some(grab) = frame.grab_request {
            self.set_cursor_grab(grab);
        }

        self.draws.clear();
        self.scene.update(dt, &mut self.draws);

        let (view, projection) = self
            .scene
            .camera_matrices()
            .unwrap_or((Mat4::IDENTITY, Mat4::IDENTITY));
        match self
            .renderer
            .render(&self.gpu, &self.resources, &self.draws, view, projection)
        {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost, reconfiguring");
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("out of GPU memory");
                event_loop.exit();
            }
            Err(err) => warn!("skipped frame: {err}"),
        }

        self.input.begin_frame();
        self.window.request_redraw();
    }

    fn set_cursor_grab(&mut self, grab: bool) {
        if grab == self.cursor_grabbed {
            return;
        }
        let result = if grab {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(err) = result {
            warn!("cursor grab unavailable: {err}");
        }
        self.window.set_cursor_visible(!grab);
        self.cursor_grabbed = grab;
    }
}

impl ApplicationHandler for TriremeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let TriremeApp::Pending { config, setup } = self else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match Self::start(event_loop, config.clone(), setup) {
            Ok(running) => {
                running.window.request_redraw();
                *self = TriremeApp::Running(Box::new(running));
            }
            Err(err) => {
                error!("{err}");
                *self = TriremeApp::Failed(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let TriremeApp::Running(app) = self else {
            return;
        };

        app.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                app.gpu.resize(size.width, size.height);
                app.scene.set_camera_aspect(app.gpu.aspect());
            }
            WindowEvent::RedrawRequested => app.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let TriremeApp::Running(app) = self {
            app.input.handle_device_event(&event);
        }
    }
}
