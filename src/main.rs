use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use glam::UVec2;
use sphere_tracer::{
    application::{AppState, Application, Layer, Screen, WindowOptions},
    cli::Args,
    input::{InputCollector, InputTranslator},
    preview,
    settings::Settings,
    surface::Tracer,
    viewer::Viewer,
};
use tracing_subscriber::EnvFilter;
use winit::{dpi::PhysicalSize, event::Event};

#[derive(Debug, Clone)]
struct TracerConfig {
    settings: Settings,
    settings_path: Option<PathBuf>,
    free_fly: bool,
}

struct SphereTracer {
    viewer: Viewer,
    tracer: Tracer,
    collector: InputCollector,
    translator: InputTranslator,
    config: TracerConfig,
}

fn screen_resolution(size: PhysicalSize<u32>) -> UVec2 {
    UVec2::new(size.width, size.height)
}

impl Layer for SphereTracer {
    type LayerErr = ();
    type Config = TracerConfig;

    fn start(screen: &mut Screen, _app: &AppState, config: TracerConfig) -> Self {
        let resolution = screen_resolution(screen.size());
        let mut viewer = Viewer::from_settings(&config.settings, resolution);
        if config.free_fly {
            viewer.camera_mut().toggle_mode();
        }
        tracing::info!(
            spheres = viewer.scene().len(),
            mode = ?viewer.camera().mode(),
            "viewer started"
        );

        Self {
            viewer,
            tracer: Tracer::new(screen),
            collector: InputCollector::new(resolution),
            translator: InputTranslator::new(
                config.settings.fly_speed,
                config.settings.drag_sensitivity,
            ),
            config,
        }
    }

    fn process_event(&mut self, event: &Event<()>, _screen: &mut Screen) {
        if let Event::WindowEvent { event, .. } = event {
            self.collector.process_event(event);
        }
    }

    fn resize(&mut self, _new_size: PhysicalSize<u32>, _app: &AppState, screen: &mut Screen) {
        self.tracer.resize(screen);
        self.viewer.resize(screen_resolution(screen.size()));
    }

    fn update(&mut self, app: &AppState, _screen: &mut Screen) {
        let input = self.collector.snapshot();
        if let Some(picked) = self.translator.apply(&input, &mut self.viewer, app.delta_time) {
            match picked.and_then(|index| self.viewer.scene().get(index).ok()) {
                Some(sphere) => tracing::info!(
                    index = ?picked,
                    position = ?sphere.position,
                    radius = sphere.radius,
                    kind = ?sphere.material.kind(),
                    "picked sphere"
                ),
                None => tracing::debug!("click hit nothing"),
            }
        }
    }

    fn render(&mut self, app: &AppState, screen: &mut Screen) -> Result<(), wgpu::SurfaceError> {
        let mut frame = self.tracer.frame(screen);
        self.viewer.render_frame(&mut frame, app.elapsed_time)
    }

    fn shutdown(&mut self, _app: &AppState, screen: &mut Screen) -> Result<(), Self::LayerErr> {
        let camera = self.viewer.camera();
        let settings = &mut self.config.settings;
        settings.render = *self.viewer.render_settings();
        settings.camera_theta = camera.theta();
        settings.camera_phi = camera.phi();
        settings.camera_distance = camera.distance();
        settings.focal_length = camera.focal_length();
        settings.window_width = screen.config.width;
        settings.window_height = screen.config.height;

        match &self.config.settings_path {
            Some(path) => {
                if let Err(err) = settings.save_to(path) {
                    tracing::warn!("could not save settings to {}: {err}", path.display());
                }
            }
            None => settings.save(),
        }
        tracing::info!("exiting");
        Ok(())
    }
}

fn init_tracing(args: &Args) {
    let filter = match args.log_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) if path.exists() => Settings::load_from(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        _ => Settings::load(),
    };
    if let Some(width) = args.width {
        settings.window_width = width;
    }
    if let Some(height) = args.height {
        settings.window_height = height;
    }
    if args.no_taa {
        settings.render.temporal_aa = false;
    }
    settings.validate();
    Ok(settings)
}

fn snapshot(settings: &Settings, free_fly: bool, path: &Path) -> anyhow::Result<()> {
    let resolution = UVec2::new(settings.window_width, settings.window_height);
    let mut viewer = Viewer::from_settings(settings, resolution);
    if free_fly {
        viewer.camera_mut().toggle_mode();
    }
    let projection = viewer.camera_mut().resolve();
    let image = preview::render(&projection, viewer.scene(), settings.render.sky);
    image
        .save(path)
        .with_context(|| format!("writing snapshot to {}", path.display()))?;
    tracing::info!(
        width = resolution.x,
        height = resolution.y,
        "snapshot written to {}",
        path.display()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args);
    let settings = load_settings(&args)?;

    if let Some(path) = &args.snapshot {
        return snapshot(&settings, args.free_fly, path);
    }

    let options = WindowOptions {
        title: "Sphere Tracer".to_owned(),
        size: PhysicalSize::new(settings.window_width, settings.window_height),
    };
    let config = TracerConfig {
        settings,
        settings_path: args.settings.clone(),
        free_fly: args.free_fly,
    };
    pollster::block_on(Application::<SphereTracer>::init(options, config))?;
    Ok(())
}
