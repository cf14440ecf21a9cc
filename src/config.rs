use anyhow::{bail, Result};

/// GPUs are only guaranteed 256 invocations per work-group.
pub const MAX_GPU_WORKGROUP_SIZE: u32 = 256;

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
  /// rayon worker pool
  Cpu,
  /// wgpu compute shader
  Gpu,
}

#[derive(Clone, Debug)]
pub struct Config {
  /// Simulation steps per second.
  pub update_rate: f64,
  /// Frames presented per second.
  pub render_rate: f64,
  pub num_particles: u32,
  /// Integration timestep handed to every step.
  pub delta_t: f32,
  pub workgroup_size: u32,
  pub backend: Backend,
  pub headless: bool,
  pub paused: bool,
  pub seed: u64,
  pub window_size: (u32, u32),
  /// Close the loop after this many seconds of wall time.
  pub duration: Option<f64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      update_rate: 2.0,
      render_rate: 60.0,
      num_particles: 2048,
      delta_t: 1e-6,
      workgroup_size: 64,
      backend: Backend::Gpu,
      headless: false,
      paused: false,
      seed: 42,
      window_size: (800, 800),
      duration: None,
    }
  }
}

impl Config {
  pub fn validate(&self) -> Result<()> {
    if !(self.update_rate.is_finite() && self.update_rate > 0.0) {
      bail!("update rate must be positive, got {}", self.update_rate);
    }
    if !(self.render_rate.is_finite() && self.render_rate > 0.0) {
      bail!("render rate must be positive, got {}", self.render_rate);
    }
    if self.num_particles == 0 {
      bail!("particle count must be positive");
    }
    if !self.delta_t.is_finite() {
      bail!("timestep must be finite, got {}", self.delta_t);
    }
    if self.workgroup_size == 0 {
      bail!("work-group size must be positive");
    }
    if self.backend == Backend::Gpu && self.workgroup_size > MAX_GPU_WORKGROUP_SIZE {
      bail!(
        "work-group size {} exceeds the GPU limit of {MAX_GPU_WORKGROUP_SIZE}",
        self.workgroup_size
      );
    }
    if !self.headless && self.backend == Backend::Cpu {
      bail!("windowed rendering draws straight from GPU buffers; use --backend gpu or --headless");
    }
    if let Some(duration) = self.duration {
      if !(duration.is_finite() && duration >= 0.0) {
        bail!("duration must be a non-negative number of seconds, got {duration}");
      }
    }
    Ok(())
  }
}
