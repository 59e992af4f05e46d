use anyhow::{anyhow, Context};
use bridge::{DisplayBridge, HologramSession, NativeDevice, SimulatedBridge};
use config::{Config, CONFIG_PATH};
use graphics::{Camera, CubeScene, QuiltTarget, Renderer, WindowContent};
use log::{error, info, warn, LevelFilter};
use model::{CubeModel, DisplayMode};
use quilt::QuiltCompositor;
use stats::FrameStats;
use std::time::Instant;
use winit::{
    dpi::PhysicalSize,
    event::{
        ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent,
    },
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

mod bridge;
mod config;
mod geo;
mod graphics;
mod model;
mod quilt;
mod stats;

const APPLICATION_NAME: &str = "quilt-cube";

fn main() {
    let config = match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(error) => {
            simple_logging::log_to_stderr(LevelFilter::Info);
            error!("{}", error);
            std::process::exit(1);
        }
    };

    if let Err(error) = simple_logging::log_to_file(&config.log_file, config.log_level()) {
        simple_logging::log_to_stderr(config.log_level());
        warn!("cannot log to {}: {}", config.log_file, error);
    }
    log_panics::init();

    if let Err(error) = run(config) {
        error!("{:#}", error);
        std::process::exit(1);
    }
}

fn run(config: Config) -> anyhow::Result<()> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(APPLICATION_NAME)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut app = futures::executor::block_on(App::new(&window, &config))?;

    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => app.resize(size),
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match state {
                    ElementState::Pressed => app.model.press(),
                    ElementState::Released => app.model.release(),
                },
                WindowEvent::CursorMoved { position, .. } => {
                    app.model.cursor_moved(position.x, position.y)
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(VirtualKeyCode::Tab),
                            ..
                        },
                    ..
                } => app.toggle_preview(),
                _ => {}
            },
            Event::MainEventsCleared => window.request_redraw(),
            Event::RedrawRequested(_) => app.redraw(),
            Event::LoopDestroyed => app.shut_down(),
            _ => {}
        }
    })
}

/// The holographic half of the app: the bridge session, the texture it reads quilts from,
/// and the compositor that fills it.
struct QuiltOutput {
    session: HologramSession,
    target: QuiltTarget,
    compositor: QuiltCompositor,
}

impl QuiltOutput {
    fn compose_and_present(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        renderer: &Renderer,
        scene: &CubeScene,
        stats: &mut FrameStats,
    ) {
        let started = Instant::now();
        let composed = renderer.render_quilt(
            device,
            queue,
            &self.target,
            scene,
            &mut self.compositor,
            self.session.layout(),
        );

        match composed {
            Ok((frame, submission)) => {
                // the bridge reads the texture as soon as it is presented
                device.poll(wgpu::Maintain::WaitForSubmissionIndex(submission));
                match self.session.present(self.target.handle()) {
                    Ok(()) => stats.record_composed(frame.views_rendered, started.elapsed()),
                    Err(error) => {
                        warn!("failed to present quilt: {}", error);
                        stats.record_skipped();
                    }
                }
            }
            Err(error) => {
                warn!("skipping quilt frame: {}", error);
                stats.record_skipped();
            }
        }
    }

    fn close(mut self, renderer: &mut Renderer) {
        // the target may only be released between frames
        debug_assert!(self.compositor.is_idle());
        if let Err(error) = self.session.unregister_texture() {
            warn!("failed to unregister quilt texture: {}", error);
        }
        renderer.forget_quilt_target(self.target.handle());
        drop(self.target);
        self.session.close();
    }
}

struct App {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    renderer: Renderer,
    camera: Camera,
    model: CubeModel,
    quilt: Option<QuiltOutput>,
    stats: FrameStats,
    last_frame: Instant,
}

impl App {
    async fn new(window: &Window, config: &Config) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = unsafe { instance.create_surface(window) }
            .context("failed to create surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or_else(|| anyhow!("no compatible graphics adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    features: wgpu::Features::empty(),
                    limits: adapter.limits(),
                },
                None,
            )
            .await
            .context("failed to open graphics device")?;

        let output_format = surface
            .get_capabilities(&adapter)
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow!("surface is not supported by the adapter"))?;
        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: output_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        if size.width > 0 && size.height > 0 {
            surface.configure(&device, &surface_config);
        }

        let mut renderer = Renderer::new(&device, output_format);

        let adapter_info = adapter.get_info();
        let native_device =
            NativeDevice::from_raw(((adapter_info.vendor as u64) << 32) | adapter_info.device as u64);
        let bridge: Box<dyn DisplayBridge> = match config.display.simulated_display() {
            Some(display) => Box::new(SimulatedBridge::connected(display)),
            None => Box::new(SimulatedBridge::disconnected()),
        };
        let session = HologramSession::open(
            bridge,
            APPLICATION_NAME,
            native_device,
            config.quilt.request(),
            config.quilt.present_settings(),
        )
        .context("failed to initialize display bridge")?;

        let max_texture_dimension = device.limits().max_texture_dimension_2d;
        let session = session.and_then(|session| {
            let (width, height) = session.layout().texture_size();
            if width.max(height) > max_texture_dimension {
                warn!(
                    "quilt texture {}x{} exceeds the device limit of {}, rendering single view",
                    width, height, max_texture_dimension
                );
                session.close();
                None
            } else {
                Some(session)
            }
        });

        let quilt = match session {
            Some(mut session) => {
                let display = session.display().clone();
                let capability = *session.capability();
                window.set_title(&format!(
                    "{} - {} ({})",
                    APPLICATION_NAME, display.name, display.serial
                ));
                window.set_inner_size(PhysicalSize::new(
                    capability.window_width / 2,
                    capability.window_height / 2,
                ));

                let target = renderer.create_quilt_target(&device, session.layout());
                match session.register_texture(target.handle()) {
                    Ok(()) => {
                        let compositor = QuiltCompositor::new(config.quilt.camera_offset_step);
                        info!(
                            "composing into {} with camera offset step {}",
                            target.handle(),
                            compositor.camera_offset_step()
                        );
                        Some(QuiltOutput {
                            session,
                            target,
                            compositor,
                        })
                    }
                    Err(error) => {
                        warn!("failed to register quilt texture: {}", error);
                        renderer.forget_quilt_target(target.handle());
                        drop(target);
                        session.close();
                        None
                    }
                }
            }
            None => None,
        };
        if quilt.is_none() {
            window.set_title(&format!("{} - No Device Connected!", APPLICATION_NAME));
        }

        let camera = Camera {
            pos: [0.0, 0.0, config.camera.distance],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_y: config.camera.fov_y_degrees.to_radians(),
            near: config.camera.near,
            far: config.camera.far,
        };

        let now = Instant::now();
        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            renderer,
            camera,
            model: CubeModel::new(config.interaction.clone()),
            quilt,
            stats: FrameStats::new(now),
            last_frame: now,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        if size.width > 0 && size.height > 0 {
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    fn toggle_preview(&mut self) {
        if self.quilt.is_some() {
            self.model.toggle_display_mode();
        }
    }

    fn scene(&self) -> CubeScene {
        CubeScene {
            camera: self.camera.clone(),
            model: self.model.model_matrix(),
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        self.model.update(now - self.last_frame);
        self.last_frame = now;

        let scene = self.scene();

        if let Some(quilt) = &mut self.quilt {
            quilt.compose_and_present(
                &self.device,
                &self.queue,
                &self.renderer,
                &scene,
                &mut self.stats,
            );
        }

        let output_size = (self.surface_config.width, self.surface_config.height);
        if output_size.0 > 0 && output_size.1 > 0 {
            match self.surface.get_current_texture() {
                Ok(frame) => {
                    let output_view = frame
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    let content = match (&self.quilt, self.model.display_mode) {
                        (Some(quilt), DisplayMode::QuiltPreview) => {
                            WindowContent::QuiltPreview(&quilt.target)
                        }
                        _ => WindowContent::SingleView(&scene),
                    };
                    self.renderer.render_window(
                        &self.device,
                        &self.queue,
                        &output_view,
                        output_size,
                        self.surface_config.format,
                        content,
                    );
                    frame.present();
                    self.stats.record_frame();
                }
                Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                    warn!("surface lost, reconfiguring");
                    self.surface.configure(&self.device, &self.surface_config);
                }
                Err(error) => warn!("failed to acquire frame: {}", error),
            }
        }

        if let Some(report) = self.stats.take_report(Instant::now()) {
            info!("{}", report);
        }
    }

    fn shut_down(&mut self) {
        if let Some(quilt) = self.quilt.take() {
            quilt.close(&mut self.renderer);
        }
        info!(
            "shut down after {} quilts ({} skipped)",
            self.stats.total_composed(),
            self.stats.total_skipped()
        );
    }
}
