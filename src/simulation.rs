use crate::clock::{Clock, TimeSource};
use crate::compute::ComputeBackend;
use crate::config::Config;
use crate::integrator::total_momentum;
use crate::interpolate::{interpolation_factor, Frame};
use crate::present::Presenter;
use crate::store::ParticleStore;
use crate::Particle;
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Particle state plus everything needed to advance it on schedule.
pub struct Simulation<C: ComputeBackend> {
  backend: C,
  store: ParticleStore<C::Buffer>,
  clock: Clock,
  delta_t: f32,
  paused: bool,
  steps: u64,
}

impl<C: ComputeBackend> Simulation<C> {
  pub fn new(mut backend: C, particles: &[Particle], delta_t: f32, clock: Clock) -> Result<Self> {
    let store = ParticleStore::allocate(&mut backend, particles)?;
    Ok(Self {
      backend,
      store,
      clock,
      delta_t,
      paused: false,
      steps: 0,
    })
  }

  pub fn is_due(&self, now_ns: u64) -> bool {
    self.clock.is_due(now_ns)
  }

  /// The timestep actually handed to the kernel. Pausing zeroes it but the
  /// step itself still runs.
  pub fn effective_dt(&self) -> f32 {
    self.delta_t * f32::from(u8::from(!self.paused))
  }

  /// Snapshot, integrate, swap, then record the step on the clock.
  pub fn step<T: TimeSource>(&mut self, time: &T) -> Result<()> {
    let start = time.now_ns();
    let dt = self.effective_dt();
    let Self { backend, store, .. } = self;
    let (source, target) = store.snapshot_for_write(|src, dst| backend.copy(src, dst))?;
    backend.dispatch(source, target, dt)?;
    store.swap();
    let end = time.now_ns();
    self.clock.record(start, end);
    self.steps += 1;
    log::debug!(
      "step {} dt={dt:e} took {:.3} ms",
      self.steps,
      end.saturating_sub(start) as f64 / 1e6
    );
    Ok(())
  }

  pub fn interpolation(&self, now_ns: u64) -> f32 {
    interpolation_factor(now_ns, self.clock.last_ns, self.clock.interval_ns)
  }

  pub fn frame(&self, now_ns: u64) -> Frame<'_, C::Buffer> {
    Frame {
      previous: self.store.previous(),
      current: self.store.current(),
      t: self.interpolation(now_ns),
      now_ns,
    }
  }

  /// Reads back the current buffer.
  pub fn snapshot(&mut self) -> Result<Vec<Particle>> {
    self.backend.read(self.store.current())
  }

  /// Reads back the previous buffer.
  pub fn previous_snapshot(&mut self) -> Result<Vec<Particle>> {
    self.backend.read(self.store.previous())
  }

  pub fn store(&self) -> &ParticleStore<C::Buffer> {
    &self.store
  }

  pub fn clock(&self) -> &Clock {
    &self.clock
  }

  pub fn steps(&self) -> u64 {
    self.steps
  }

  pub fn set_paused(&mut self, paused: bool) {
    self.paused = paused;
  }

  pub fn toggle_pause(&mut self) {
    self.paused = !self.paused;
    log::info!("{}", if self.paused { "paused" } else { "resumed" });
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
  Running,
  Closing,
}

/// What a single loop iteration did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tick {
  pub stepped: bool,
  pub rendered: bool,
}

/// Polls the simulation and render clocks and drives both activities from a
/// single thread.
pub struct MainLoop<C: ComputeBackend, P, T> {
  simulation: Simulation<C>,
  presenter: P,
  render_clock: Clock,
  time: T,
  state: LoopState,
  frames: u64,
  deadline_ns: Option<u64>,
}

impl<C, P, T> MainLoop<C, P, T>
where
  C: ComputeBackend,
  P: Presenter<C::Buffer>,
  T: TimeSource,
{
  #[must_use]
  pub fn new(simulation: Simulation<C>, presenter: P, render_clock: Clock, time: T) -> Self {
    Self {
      simulation,
      presenter,
      render_clock,
      time,
      state: LoopState::Running,
      frames: 0,
      deadline_ns: None,
    }
  }

  /// Validates `config` against the scene and allocates the particle buffers
  /// through `backend`.
  pub fn from_config(
    config: &Config,
    backend: C,
    particles: &[Particle],
    presenter: P,
    time: T,
  ) -> Result<Self> {
    config.validate()?;
    if particles.len() != config.num_particles as usize {
      bail!(
        "configured for {} particles but the scene has {}",
        config.num_particles,
        particles.len()
      );
    }
    let now = time.now_ns();
    let mut simulation = Simulation::new(
      backend,
      particles,
      config.delta_t,
      Clock::from_rate(config.update_rate, now)?,
    )?;
    simulation.set_paused(config.paused);
    let render_clock = Clock::from_rate(config.render_rate, now)?;
    let mut main_loop = Self::new(simulation, presenter, render_clock, time);
    // float-to-int casts saturate, so an enormous duration just never expires
    main_loop.deadline_ns = config
      .duration
      .map(|secs| now.saturating_add((secs * 1e9) as u64));
    Ok(main_loop)
  }

  /// One pass: step if the simulation clock is due, present if the render
  /// clock is due.
  pub fn tick(&mut self) -> Result<Tick> {
    if self.state == LoopState::Closing {
      return Ok(Tick::default());
    }
    let now = self.time.now_ns();
    if self.deadline_ns.is_some_and(|deadline| now >= deadline) {
      self.close();
      return Ok(Tick::default());
    }

    let stepped = self.simulation.is_due(now);
    if stepped {
      self.simulation.step(&self.time)?;
    }

    let now = self.time.now_ns();
    let rendered = self.render_clock.is_due(now);
    if rendered {
      self.presenter.present(self.simulation.frame(now))?;
      self.render_clock.record(now, self.time.now_ns());
      self.frames += 1;
    }

    Ok(Tick { stepped, rendered })
  }

  /// Spins until `close` is raised or the loop closes itself, then shuts down.
  pub fn run(&mut self, close: &AtomicBool) -> Result<()> {
    log::info!(
      "running {} particles on the {} backend",
      self.simulation.store().len(),
      self.simulation.backend.name()
    );
    while self.state == LoopState::Running {
      if close.load(Ordering::Relaxed) {
        self.close();
        break;
      }
      let tick = self.tick()?;
      if tick == Tick::default() {
        std::thread::yield_now();
      }
    }
    self.shutdown()
  }

  pub fn close(&mut self) {
    self.state = LoopState::Closing;
  }

  /// Logs a summary of the run. Buffers are released when the loop is dropped.
  pub fn shutdown(&mut self) -> Result<()> {
    let particles = self.simulation.snapshot()?;
    let momentum = total_momentum(&particles);
    log::info!(
      "closing after {} steps and {} frames, total momentum ({:.3e}, {:.3e}, {:.3e})",
      self.simulation.steps(),
      self.frames,
      momentum.x,
      momentum.y,
      momentum.z
    );
    Ok(())
  }

  pub fn state(&self) -> LoopState {
    self.state
  }

  pub fn frames(&self) -> u64 {
    self.frames
  }

  pub fn simulation(&self) -> &Simulation<C> {
    &self.simulation
  }

  pub fn simulation_mut(&mut self) -> &mut Simulation<C> {
    &mut self.simulation
  }

  pub fn presenter(&self) -> &P {
    &self.presenter
  }

  pub fn presenter_mut(&mut self) -> &mut P {
    &mut self.presenter
  }
}
