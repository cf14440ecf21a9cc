#![allow(dead_code)]

use anyhow::{bail, Result};
use nbody_sim::{ComputeBackend, Config, Frame, Particle, Presenter, TimeSource};
use std::cell::Cell;
use std::rc::Rc;

/// Time source the test moves by hand.
#[derive(Clone, Default)]
pub struct ManualTime(Rc<Cell<u64>>);

impl ManualTime {
  pub fn set(&self, now_ns: u64) {
    self.0.set(now_ns);
  }

  pub fn advance(&self, ns: u64) {
    self.0.set(self.0.get() + ns);
  }
}

impl TimeSource for ManualTime {
  fn now_ns(&self) -> u64 {
    self.0.get()
  }
}

/// Keeps every interpolation factor and the positions it was handed.
#[derive(Default)]
pub struct Recorder {
  pub ts: Vec<f32>,
  pub frames: Vec<(Vec<Particle>, Vec<Particle>)>,
}

impl Presenter<Vec<Particle>> for Recorder {
  fn present(&mut self, frame: Frame<'_, Vec<Particle>>) -> Result<()> {
    self.ts.push(frame.t);
    self
      .frames
      .push((frame.previous.clone(), frame.current.clone()));
    Ok(())
  }
}

/// Backend whose kernel always fails, as a lost device would.
pub struct BrokenBackend;

impl ComputeBackend for BrokenBackend {
  type Buffer = Vec<Particle>;

  fn allocate(&mut self, particles: &[Particle]) -> Result<Self::Buffer> {
    Ok(particles.to_vec())
  }

  fn copy(&mut self, src: &Self::Buffer, dst: &mut Self::Buffer) -> Result<()> {
    dst.copy_from_slice(src);
    Ok(())
  }

  fn dispatch(&mut self, _: &Self::Buffer, _: &mut Self::Buffer, _: f32) -> Result<()> {
    bail!("device lost")
  }

  fn read(&mut self, buffer: &Self::Buffer) -> Result<Vec<Particle>> {
    Ok(buffer.clone())
  }

  fn name(&self) -> &'static str {
    "broken"
  }
}

/// Backend that must never be reached.
pub struct UnreachableBackend;

impl ComputeBackend for UnreachableBackend {
  type Buffer = Vec<Particle>;

  fn allocate(&mut self, _: &[Particle]) -> Result<Self::Buffer> {
    panic!("allocated despite an invalid configuration")
  }

  fn copy(&mut self, _: &Self::Buffer, _: &mut Self::Buffer) -> Result<()> {
    unreachable!()
  }

  fn dispatch(&mut self, _: &Self::Buffer, _: &mut Self::Buffer, _: f32) -> Result<()> {
    unreachable!()
  }

  fn read(&mut self, _: &Self::Buffer) -> Result<Vec<Particle>> {
    unreachable!()
  }

  fn name(&self) -> &'static str {
    "unreachable"
  }
}

/// Headless CPU configuration: 10 steps/s, 100 frames/s.
pub fn test_config() -> Config {
  Config {
    update_rate: 10.0,
    render_rate: 100.0,
    num_particles: 4,
    delta_t: 0.01,
    workgroup_size: 2,
    backend: nbody_sim::Backend::Cpu,
    headless: true,
    ..Config::default()
  }
}

/// A small spread-out system with unequal masses and velocities.
pub fn scattered(n: usize) -> Vec<Particle> {
  (0..n)
    .map(|i| {
      let f = i as f32;
      Particle::new(
        [f.cos() * (1.0 + f), f.sin() * (1.0 + f), 0.3 * f],
        [0.1 * f.sin(), -0.05 * f, 0.02],
        1.0 + f,
      )
    })
    .collect()
}
