use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use synthwave_assets::{AssetError, HeightField, ImageData, LoadTask, ModelData, TaskStatus};
use synthwave_kernel::{CarModel, DriveScene, SceneConfig, SunStyle};
use synthwave_render_wgpu::{SceneCamera, SceneRenderer};
use synthwave_tools::{FrameTimer, SceneInspector};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "synthwave-desktop", about = "Synthwave drive scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config file (YAML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Right-drag orbits the camera around the car, wheel zooms
    #[arg(long)]
    orbit: bool,
}

/// Loads started at launch and joined from the frame loop.
struct PendingAssets {
    heightfield: Option<LoadTask<HeightField>>,
    sun: Option<LoadTask<ImageData>>,
    car: Option<LoadTask<ModelData>>,
}

impl PendingAssets {
    fn start(config: &SceneConfig) -> Self {
        let heightmap = config.textures.heightmap.clone();
        let sun = config.textures.sun.clone();
        let car = config.car.model.clone();
        Self {
            heightfield: Some(LoadTask::spawn("heightmap", move || {
                HeightField::from_file(heightmap)
            })),
            sun: (config.sun.style == SunStyle::Textured)
                .then(|| LoadTask::spawn("sun", move || ImageData::from_file(sun))),
            car: Some(LoadTask::spawn("car", move || ModelData::load(car))),
        }
    }

    fn join(&mut self, gpu: &mut Gpu, scene: &mut DriveScene) {
        match take_ready(&mut self.heightfield) {
            Some(Ok(field)) => gpu.renderer.set_heightfield(&gpu.device, scene, &field),
            Some(Err(e)) => tracing::warn!("heightmap unavailable, terrain stays flat: {e}"),
            None => {}
        }
        match take_ready(&mut self.sun) {
            Some(Ok(image)) => gpu.renderer.set_sun_texture(&gpu.device, &gpu.queue, &image),
            Some(Err(e)) => tracing::warn!("sun texture unavailable, using gradient: {e}"),
            None => {}
        }
        match take_ready(&mut self.car) {
            Some(Ok(model)) => {
                gpu.renderer.set_car_model(&gpu.device, &model);
                scene.attach_car(Ok(car_model(&model)));
            }
            Some(Err(e)) => scene.attach_car(Err(e.to_string())),
            None => {}
        }
    }
}

/// Take a finished result out of a task slot, emptying the slot.
fn take_ready<T: Send + 'static>(
    slot: &mut Option<LoadTask<T>>,
) -> Option<Result<T, AssetError>> {
    let task = slot.as_mut()?;
    match task.poll() {
        TaskStatus::Pending => None,
        TaskStatus::Ready(result) => {
            *slot = None;
            Some(result)
        }
        TaskStatus::Cancelled => {
            *slot = None;
            None
        }
    }
}

fn car_model(model: &ModelData) -> CarModel {
    CarModel {
        name: model.name.clone(),
        vertex_count: model.vertex_count(),
        triangle_count: model.triangle_count(),
        asset_id: model.id.0,
    }
}

/// Application state.
struct AppState {
    scene: DriveScene,
    camera: SceneCamera,
    timer: FrameTimer,
    last_frame: Instant,
    show_panel: bool,
    orbit_drag: bool,
}

impl AppState {
    fn new(config: &SceneConfig, orbit: bool) -> Self {
        let mut scene = DriveScene::new(config);
        let camera = if orbit {
            SceneCamera::orbiting(scene.camera(), config.car.position)
        } else {
            SceneCamera::fixed()
        };
        scene.begin_car_load();
        Self {
            scene,
            camera,
            timer: FrameTimer::new(120),
            last_frame: Instant::now(),
            show_panel: true,
            orbit_drag: false,
        }
    }

    fn advance_frame(&mut self, now: Instant) {
        self.timer.record(now.saturating_duration_since(self.last_frame));
        self.last_frame = now;
        self.scene.update();
    }

    /// The rig sliders drive the view only while orbit controls are off.
    fn rig_controls_active(&self) -> bool {
        self.camera.orbit.is_none()
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed && key == KeyCode::F1 {
            self.show_panel = !self.show_panel;
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        let summary = SceneInspector::summary(&self.scene);
        let max_speed = self.scene.max_speed();
        let rig_controls = self.rig_controls_active();

        egui::Window::new("Controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.collapsing("Speed", |ui| {
                    let mut speed = self.scene.speed();
                    let slider = egui::Slider::new(&mut speed, 0.0..=max_speed)
                        .step_by(0.1)
                        .text("speed");
                    if ui.add(slider).changed() {
                        self.scene.set_speed(speed);
                    }
                });
                if rig_controls {
                    ui.collapsing("Camera position", |ui| {
                        let cam = self.scene.camera_mut();
                        ui.add(
                            egui::Slider::new(&mut cam.height, 0.0..=5.0)
                                .step_by(0.25)
                                .text("y"),
                        );
                    });
                    ui.collapsing("Camera rotation", |ui| {
                        let cam = self.scene.camera_mut();
                        ui.add(
                            egui::Slider::new(&mut cam.pitch, -FRAC_PI_2..=FRAC_PI_2)
                                .step_by(0.02)
                                .text("x"),
                        );
                    });
                }

                ui.separator();
                ui.label(format!(
                    "Frame: {}  Recycles: {}",
                    summary.frame, summary.recycles
                ));
                ui.label(format!(
                    "Tiles: A {:.2}  B {:.2}",
                    summary.tile_a, summary.tile_b
                ));
                ui.label(format!("Car: {}", summary.car));
                ui.label(format!(
                    "{:.0} fps ({:.2} ms)",
                    self.timer.fps(),
                    self.timer.average().as_secs_f64() * 1000.0
                ));

                ui.separator();
                if self.camera.orbit.is_some() {
                    ui.small("F1: Toggle Panel | RMB: Orbit | Wheel: Zoom");
                } else {
                    ui.small("F1: Toggle Panel");
                }
            });
    }
}

/// Window, surface and everything that draws into it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, scene: &DriveScene) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Synthwave")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("synthwave_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = SceneRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            scene,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct App {
    state: AppState,
    pending: PendingAssets,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl App {
    fn new(config: &SceneConfig, orbit: bool) -> Self {
        Self {
            state: AppState::new(config, orbit),
            pending: PendingAssets::start(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let _span = tracing::trace_span!("frame").entered();
        self.pending.join(gpu, &mut self.state.scene);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        // Only frames that reach the screen move the scene.
        self.state.advance_frame(Instant::now());

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &self.state.scene,
        );

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state.scene) {
            Ok(gpu) => {
                self.state.scene.camera_mut().aspect = gpu.aspect();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state.scene.camera_mut().aspect = gpu.aspect();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.state.orbit_drag =
                    self.state.camera.orbit.is_some() && btn_state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(orbit) = &mut self.state.camera.orbit {
                    let steps = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                    };
                    orbit.zoom(steps);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if !self.state.orbit_drag {
                return;
            }
            if let Some(orbit) = &mut self.state.camera.orbit {
                orbit.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    let orbit = cli.orbit || config.camera.orbit_controls;

    tracing::info!(orbit, "synthwave-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(&config, orbit);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn advance_frame_moves_scene_once_and_records_time() {
        let mut state = AppState::new(&SceneConfig::default(), false);
        let start = state.last_frame;
        state.advance_frame(start + Duration::from_millis(16));

        assert_eq!(state.scene.frame(), 1);
        assert_eq!(state.timer.count(), 1);
        assert_eq!(state.timer.max(), Duration::from_millis(16));
        let (a, b) = state.scene.recycler().positions();
        assert!((a - -24.9).abs() < 1e-5);
        assert!((b - -74.9).abs() < 1e-5);
    }

    #[test]
    fn rig_sliders_hidden_while_orbiting() {
        let fixed = AppState::new(&SceneConfig::default(), false);
        assert!(fixed.rig_controls_active());

        let orbiting = AppState::new(&SceneConfig::default(), true);
        assert!(!orbiting.rig_controls_active());
    }
}
