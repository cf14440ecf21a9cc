//! All-pairs gravitational integration with symplectic Euler.
//!
//! A step runs in two phases: every acceleration is computed from the
//! unmodified pre-step state, then velocities and positions are committed.
//! No particle ever observes another particle's post-step values.

use crate::Particle;
use cgmath::{InnerSpace, Vector3, Zero};
use rayon::prelude::*;

/// Acceleration on particle `i` from every other body. Gravity constant is 1.
/// Co-located bodies produce non-finite values; initial conditions must keep
/// them apart.
#[must_use]
pub fn acceleration_on(particles: &[Particle], i: usize) -> Vector3<f32> {
  let pos = Vector3::from(particles[i].pos);
  particles
    .iter()
    .enumerate()
    .filter(|&(j, _)| j != i)
    .fold(Vector3::zero(), |acc, (_, other)| {
      let diff = Vector3::from(other.pos) - pos;
      let d = diff.magnitude();
      acc + diff.normalize() * (other.mass / (d * d))
    })
}

/// Phase one: accelerations for all particles, dispatched in tiles of
/// `workgroup_size` indices across the rayon pool.
#[must_use]
pub fn accelerations(particles: &[Particle], workgroup_size: usize) -> Vec<Vector3<f32>> {
  let group = workgroup_size.max(1);
  let mut acc = vec![Vector3::zero(); particles.len()];
  acc
    .par_chunks_mut(group)
    .enumerate()
    .for_each(|(g, chunk)| {
      for (local, a) in chunk.iter_mut().enumerate() {
        *a = acceleration_on(particles, g * group + local);
      }
    });
  acc
}

/// Phase two: velocity first, then position from the updated velocity.
pub fn commit(particles: &mut [Particle], acc: &[Vector3<f32>], dt: f32) {
  debug_assert_eq!(particles.len(), acc.len());
  particles
    .par_iter_mut()
    .zip(acc.par_iter())
    .for_each(|(p, a)| {
      let vel = Vector3::from(p.vel) + *a * dt;
      let pos = Vector3::from(p.pos) + vel * dt;
      p.vel = vel.into();
      p.pos = pos.into();
    });
}

/// Advances `particles` by `dt` in place.
pub fn integrate(particles: &mut [Particle], dt: f32, workgroup_size: usize) {
  let acc = accelerations(particles, workgroup_size);
  commit(particles, &acc, dt);
}

/// Sum of `mass * velocity`, accumulated in f64.
#[must_use]
pub fn total_momentum(particles: &[Particle]) -> Vector3<f64> {
  particles.iter().fold(Vector3::zero(), |acc, p| {
    let m = f64::from(p.mass);
    acc + Vector3::new(
      f64::from(p.vel[0]) * m,
      f64::from(p.vel[1]) * m,
      f64::from(p.vel[2]) * m,
    )
  })
}
