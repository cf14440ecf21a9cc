pub mod camera;
pub mod clock;
pub mod compute;
pub mod config;
pub mod gpu;
pub mod initialize;
pub mod integrator;
pub mod interpolate;
pub mod present;
pub mod render;
pub mod simulation;
pub mod state;
pub mod store;

pub use clock::{Clock, MonotonicTime, TimeSource};
pub use compute::{ComputeBackend, CpuBackend};
pub use config::{Backend, Config};
pub use interpolate::{interpolation_factor, Frame};
pub use present::{HeadlessPresenter, Presenter};
pub use simulation::{LoopState, MainLoop, Simulation, Tick};
pub use store::ParticleStore;

/// One simulated body. The layout matches `struct Particle` in the WGSL shaders,
/// so the same bytes back both the CPU and the GPU buffers.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
  pub pos: [f32; 3],
  pub radius: f32,
  pub vel: [f32; 3],
  pub mass: f32,
  pub color: [f32; 4],
}

impl Particle {
  #[must_use]
  pub fn new(pos: [f32; 3], vel: [f32; 3], mass: f32) -> Self {
    Self {
      pos,
      radius: 0.005,
      vel,
      mass,
      color: [1.0; 4],
    }
  }
}

/// Uniform consumed by the compute kernel.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StepParams {
  pub delta_t: f32,
  pub num_particles: u32,
  _pad: [u32; 2],
}

impl StepParams {
  #[must_use]
  pub fn new(delta_t: f32, num_particles: u32) -> Self {
    Self {
      delta_t,
      num_particles,
      _pad: [0; 2],
    }
  }
}

/// Uniform consumed by the sprite shader: camera transform plus the
/// interpolation factor between the previous and current snapshot.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawParams {
  pub view_proj: [[f32; 4]; 4],
  pub interp: f32,
  _pad: [f32; 3],
}

impl DrawParams {
  #[must_use]
  pub fn new(view_proj: [[f32; 4]; 4], interp: f32) -> Self {
    Self {
      view_proj,
      interp,
      _pad: [0.0; 3],
    }
  }
}
