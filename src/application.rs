use std::{process::Termination, time::Instant};

use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::{Window, WindowBuilder},
};

use crate::error::SurfaceInitError;

#[derive(Debug)]
pub struct AppState {
    start_time: Instant,
    previous_time: Instant,
    /// Seconds since the previous update
    pub delta_time: f32,
    /// Seconds since startup
    pub elapsed_time: f32,
}

impl AppState {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            previous_time: now,
            delta_time: 0.0,
            elapsed_time: 0.0,
        }
    }

    pub fn update(&mut self) {
        let current_time = Instant::now();
        self.delta_time = current_time
            .duration_since(self.previous_time)
            .as_secs_f32();
        self.elapsed_time = current_time.duration_since(self.start_time).as_secs_f32();
        self.previous_time = current_time;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Window options for [`Application::init`].
#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub title: String,
    pub size: PhysicalSize<u32>,
}

pub struct Application<L: Layer + 'static> {
    layer: Option<L>,
    config: L::Config,
    screen: Screen,
    state: AppState,
}

impl<L: Layer + 'static> Application<L> {
    pub fn new(screen: Screen, config: L::Config) -> Self {
        Self {
            screen,
            config,
            layer: None,
            state: AppState::new(),
        }
    }

    fn run(
        &mut self,
        event: Event<()>,
        _event_loop: &EventLoopWindowTarget<()>,
        control_flow: &mut ControlFlow,
    ) {
        control_flow.set_poll();

        if let Some(layer) = self.layer.as_mut() {
            layer.process_event(&event, &mut self.screen);
        }

        match event {
            Event::NewEvents(StartCause::Init) => {
                self.layer = Some(L::start(&mut self.screen, &self.state, self.config.clone()));
            }
            Event::WindowEvent {
                window_id,
                ref event,
            } if self.screen.window().id() == window_id => {
                let Some(layer) = self.layer.as_mut() else {
                    return;
                };
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit_with_code(0);
                        if let Err(err) = layer.shutdown(&self.state, &mut self.screen) {
                            tracing::error!("shutdown failed: {:?}", err);
                            control_flow.set_exit_with_code(1);
                        }
                    }
                    WindowEvent::Resized(physical_size) => {
                        self.screen.resize(*physical_size);
                        layer.resize(*physical_size, &self.state, &mut self.screen);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.screen.resize(**new_inner_size);
                        layer.resize(**new_inner_size, &self.state, &mut self.screen);
                    }
                    _ => {}
                }
            }
            Event::MainEventsCleared => {
                self.state.update();
                self.screen.window().request_redraw();
            }
            Event::RedrawRequested(window_id) if self.screen.window().id() == window_id => {
                let Some(layer) = self.layer.as_mut() else {
                    return;
                };
                layer.update(&self.state, &mut self.screen);

                match layer.render(&self.state, &mut self.screen) {
                    Ok(_) => {}
                    Err(SurfaceError::Lost) => self.screen.resize_to_current(),
                    Err(SurfaceError::OutOfMemory) => control_flow.set_exit_with_code(137),
                    Err(e) => tracing::error!("{:?}", e),
                }
            }
            _ => {}
        }
    }

    pub async fn init(options: WindowOptions, config: L::Config) -> Result<(), SurfaceInitError> {
        let event_loop = EventLoop::new();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let screen = Screen::new(&event_loop, &instance, &options).await?;
        let mut application = Self::new(screen, config);
        event_loop.run(move |event, event_loop, control_flow| {
            application.run(event, event_loop, control_flow);
        });
    }
}

pub struct Screen {
    pub surface: wgpu::Surface,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    window: Window,
}

impl Screen {
    pub async fn new(
        event_loop: &EventLoopWindowTarget<()>,
        instance: &wgpu::Instance,
        options: &WindowOptions,
    ) -> Result<Self, SurfaceInitError> {
        let window = WindowBuilder::new()
            .with_title(options.title.clone())
            .with_inner_size(options.size)
            .build(event_loop)?;

        // SAFETY:
        // The surface needs to live as long as the window that created it.
        // Screen owns the window so this should be safe.
        let surface = unsafe { instance.create_surface(&window) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SurfaceInitError::NoAdapter)?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: adapter.features(),
                    limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await?;
        let size = window.inner_size();
        let config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(SurfaceInitError::UnsupportedSurface)?;
        surface.configure(&device, &config);
        tracing::info!(
            adapter = ?adapter.get_info().name,
            format = ?config.format,
            width = config.width,
            height = config.height,
            "screen ready"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    /// Resize the screen to new window size.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Resize the screen to current window inner size.
    pub fn resize_to_current(&mut self) {
        self.resize(self.window.inner_size());
    }
}

pub trait Layer: Sized {
    type LayerErr: std::fmt::Debug + Termination + 'static;
    type Config: Clone + 'static;

    fn start(screen: &mut Screen, app: &AppState, config: Self::Config) -> Self;
    fn process_event(&mut self, event: &Event<()>, screen: &mut Screen);
    fn resize(&mut self, new_size: PhysicalSize<u32>, app: &AppState, screen: &mut Screen);
    fn update(&mut self, app: &AppState, screen: &mut Screen);
    fn render(&mut self, app: &AppState, screen: &mut Screen) -> Result<(), SurfaceError>;
    fn shutdown(&mut self, app: &AppState, screen: &mut Screen) -> Result<(), Self::LayerErr>;
}
