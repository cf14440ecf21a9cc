use crate::integrator;
use crate::Particle;
use anyhow::Result;

/// Parallel-for over the particle range. Every call returns only once all of
/// its work has landed in the target buffer.
pub trait ComputeBackend {
  type Buffer;

  fn allocate(&mut self, particles: &[Particle]) -> Result<Self::Buffer>;

  fn copy(&mut self, src: &Self::Buffer, dst: &mut Self::Buffer) -> Result<()>;

  /// Integrates `target` by `dt`. `target` holds an exact copy of `source`
  /// on entry; forces are evaluated against the pre-step state only.
  fn dispatch(&mut self, source: &Self::Buffer, target: &mut Self::Buffer, dt: f32) -> Result<()>;

  fn read(&mut self, buffer: &Self::Buffer) -> Result<Vec<Particle>>;

  fn name(&self) -> &'static str;
}

/// Runs the kernel on the rayon pool, one task per work-group of indices.
pub struct CpuBackend {
  workgroup_size: usize,
}

impl CpuBackend {
  #[must_use]
  pub fn new(workgroup_size: u32) -> Self {
    Self {
      workgroup_size: workgroup_size.max(1) as usize,
    }
  }
}

impl Default for CpuBackend {
  fn default() -> Self {
    Self::new(64)
  }
}

impl ComputeBackend for CpuBackend {
  type Buffer = Vec<Particle>;

  fn allocate(&mut self, particles: &[Particle]) -> Result<Self::Buffer> {
    Ok(particles.to_vec())
  }

  fn copy(&mut self, src: &Self::Buffer, dst: &mut Self::Buffer) -> Result<()> {
    dst.copy_from_slice(src);
    Ok(())
  }

  fn dispatch(&mut self, _source: &Self::Buffer, target: &mut Self::Buffer, dt: f32) -> Result<()> {
    integrator::integrate(target, dt, self.workgroup_size);
    Ok(())
  }

  fn read(&mut self, buffer: &Self::Buffer) -> Result<Vec<Particle>> {
    Ok(buffer.clone())
  }

  fn name(&self) -> &'static str {
    "cpu"
  }
}
