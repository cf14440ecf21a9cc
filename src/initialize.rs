use crate::Particle;
use anyhow::{bail, Result};
use cgmath::{InnerSpace, Vector3};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const SUN_MASS: f32 = 1e7;
const BODY_MASS: f32 = 1e-8;
const BODY_RADIUS: f32 = 0.005;
const EXTENT: f32 = 0.95;

/// A sun at the origin, two planets on the x axis and a field of light bodies,
/// all on circular orbits in the xy plane.
#[must_use]
pub fn solar_system(num_particles: u32, seed: u64) -> Vec<Particle> {
  let mut rng = SmallRng::seed_from_u64(seed);
  let mut particles: Vec<Particle> = (0..num_particles)
    .map(|_| Particle {
      pos: [
        rng.gen_range(-EXTENT..EXTENT),
        rng.gen_range(-EXTENT..EXTENT),
        0.0,
      ],
      radius: BODY_RADIUS,
      vel: [0.0; 3],
      mass: BODY_MASS,
      color: [
        rng.gen_range(0.5..1.0),
        rng.gen_range(0.5..1.0),
        rng.gen_range(0.5..1.0),
        1.0,
      ],
    })
    .collect();

  // earth, then mars at 1.5x the distance and a tenth of the mass
  for (particle, (x, mass)) in particles
    .iter_mut()
    .skip(1)
    .zip([(0.5, 10.0), (0.75, 1.0)])
  {
    particle.pos = [x, 0.0, 0.0];
    particle.mass = mass;
    particle.radius = 0.02;
    particle.color = [1.0; 4];
  }

  for particle in particles.iter_mut() {
    particle.vel = orbital_velocity(Vector3::from(particle.pos), SUN_MASS).into();
  }

  if let Some(sun) = particles.first_mut() {
    *sun = Particle {
      pos: [0.0; 3],
      radius: 0.045,
      vel: [0.0; 3],
      mass: SUN_MASS,
      color: [1.0, 0.0, 0.0, 1.0],
    };
  }
  particles
}

/// Circular-orbit velocity around a central mass at the origin, tangential
/// in the xy plane.
#[must_use]
pub fn orbital_velocity(pos: Vector3<f32>, central_mass: f32) -> Vector3<f32> {
  let r = pos.magnitude();
  if r == 0.0 {
    return Vector3::new(0.0, 0.0, 0.0);
  }
  let v = (central_mass / r).sqrt();
  Vector3::new(-pos.y, pos.x, pos.z) * (v / r)
}

/// Fails if two bodies share a position; the force kernel divides by their
/// distance.
pub fn check_separated(particles: &[Particle]) -> Result<()> {
  // + 0.0 folds -0.0 into 0.0 so equal positions share a bit pattern
  let mut keys: Vec<([u32; 3], usize)> = particles
    .iter()
    .enumerate()
    .map(|(i, p)| (p.pos.map(|c| (c + 0.0).to_bits()), i))
    .collect();
  keys.sort_unstable();
  for pair in keys.windows(2) {
    if pair[0].0 == pair[1].0 {
      bail!(
        "particles {} and {} are co-located at {:?}",
        pair[0].1.min(pair[1].1),
        pair[0].1.max(pair[1].1),
        particles[pair[0].1].pos
      );
    }
  }
  Ok(())
}
