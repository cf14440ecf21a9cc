use crate::clock::MonotonicTime;
use crate::compute::CpuBackend;
use crate::config::{Backend, Config};
use crate::gpu::{GpuBackend, GpuContext};
use crate::initialize::{check_separated, solar_system};
use crate::present::HeadlessPresenter;
use crate::render::WindowPresenter;
use crate::simulation::{LoopState, MainLoop};
use crate::Particle;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use winit::keyboard::*;
use winit::{
  dpi::PhysicalSize,
  event::{ElementState, Event, KeyEvent, WindowEvent},
  event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
  window::Window,
};

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str, (width, height): (u32, u32)) -> Result<Self> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut builder = winit::window::WindowBuilder::new();
    builder = builder
      .with_title(title)
      .with_inner_size(PhysicalSize::new(width, height))
      .with_resizable(false);
    let window = Arc::new(builder.build(&event_loop).context("failed to open window")?);

    Ok(Self { event_loop, window })
  }
}

/// Builds the initial scene and drives the main loop until it closes.
pub fn run(config: &Config) -> Result<()> {
  config.validate()?;
  let particles = solar_system(config.num_particles, config.seed);
  check_separated(&particles)?;
  log::info!(
    "{} bodies, {} steps/s, {} frames/s, dt={:e}, backend {:?}{}",
    config.num_particles,
    config.update_rate,
    config.render_rate,
    config.delta_t,
    config.backend,
    if config.headless { ", headless" } else { "" }
  );

  let close = Arc::new(AtomicBool::new(false));
  let flag = close.clone();
  ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
    .context("failed to install ctrl-c handler")?;

  if config.headless {
    run_headless(config, &particles, &close)
  } else {
    pollster::block_on(start(config, &particles, &close))
  }
}

fn run_headless(config: &Config, particles: &[Particle], close: &AtomicBool) -> Result<()> {
  match config.backend {
    Backend::Cpu => {
      let backend = CpuBackend::new(config.workgroup_size);
      MainLoop::from_config(
        config,
        backend,
        particles,
        HeadlessPresenter::new(),
        MonotonicTime::new(),
      )?
      .run(close)
    }
    Backend::Gpu => {
      let context = pollster::block_on(GpuContext::new(None))?;
      let backend = GpuBackend::new(&context, config.num_particles, config.workgroup_size);
      MainLoop::from_config(
        config,
        backend,
        particles,
        HeadlessPresenter::new(),
        MonotonicTime::new(),
      )?
      .run(close)
    }
  }
}

async fn start(config: &Config, particles: &[Particle], close: &AtomicBool) -> Result<()> {
  let window_loop = EventLoopWrapper::new("N-Body Sim", config.window_size)?;
  let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
    #[cfg(not(target_arch = "wasm32"))]
    backends: wgpu::Backends::PRIMARY,
    ..Default::default()
  });
  let surface = instance
    .create_surface(window_loop.window.clone())
    .context("failed to create surface")?;
  let context = GpuContext::with_instance(instance, Some(&surface)).await?;

  let backend = GpuBackend::new(&context, config.num_particles, config.workgroup_size);
  let presenter = WindowPresenter::init(
    &context,
    surface,
    window_loop.window.inner_size(),
    config.num_particles,
  )?;
  let mut main_loop =
    MainLoop::from_config(config, backend, particles, presenter, MonotonicTime::new())?;

  let window = window_loop.window.clone();
  let mut outcome = Ok(());
  window_loop.event_loop.run(
    |event, target: &EventLoopWindowTarget<()>| {
      target.set_control_flow(ControlFlow::Poll);
      match event {
        Event::WindowEvent { event, window_id } if window_id == window.id() => {
          if main_loop.presenter_mut().input(&event) {
            return;
          }
          match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
              event:
                KeyEvent {
                  state: ElementState::Pressed,
                  physical_key: PhysicalKey::Code(KeyCode::Escape),
                  ..
                },
              ..
            } => main_loop.close(),
            WindowEvent::KeyboardInput {
              event:
                KeyEvent {
                  state: ElementState::Pressed,
                  physical_key: PhysicalKey::Code(KeyCode::Space),
                  repeat: false,
                  ..
                },
              ..
            } => main_loop.simulation_mut().toggle_pause(),
            WindowEvent::Resized(size) => main_loop.presenter_mut().resize(size),
            _ => {}
          }
        }
        Event::AboutToWait => {
          if close.load(Ordering::Relaxed) {
            main_loop.close();
          } else if let Err(err) = main_loop.tick() {
            outcome = Err(err);
            main_loop.close();
          }
        }
        _ => {}
      }
      if main_loop.state() == LoopState::Closing {
        target.exit();
      }
    },
  )?;

  outcome?;
  main_loop.shutdown()
}
