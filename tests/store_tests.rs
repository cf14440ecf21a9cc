mod common;

use common::{scattered, ManualTime};
use nbody_sim::{Clock, ComputeBackend, CpuBackend, ParticleStore, Simulation};

#[test]
fn allocation_fills_both_slots() {
  let particles = scattered(5);
  let mut backend = CpuBackend::default();
  let store = ParticleStore::allocate(&mut backend, &particles).unwrap();
  assert_eq!(store.len(), 5);
  assert!(!store.is_empty());
  assert_eq!(store.current(), &particles);
  assert_eq!(store.previous(), &particles);
}

#[test]
fn reads_between_swaps_are_stable() {
  let mut store = ParticleStore::new(scattered(3), scattered(4), 3);
  let first = store.current().clone();
  let second = store.current().clone();
  assert_eq!(first, second);

  store.swap();
  store.swap();
  assert_eq!(store.current(), &first);
}

#[test]
fn previous_is_bit_identical_to_the_pre_step_state() {
  let time = ManualTime::default();
  let mut sim = Simulation::new(CpuBackend::new(2), &scattered(10), 0.02, Clock::new(1, 0)).unwrap();

  for _ in 0..3 {
    let before = sim.snapshot().unwrap();
    let index = sim.store().current_index();
    time.advance(5);
    sim.step(&time).unwrap();

    let previous = sim.previous_snapshot().unwrap();
    let bytes_before: &[u8] = bytemuck::cast_slice(&before);
    let bytes_previous: &[u8] = bytemuck::cast_slice(&previous);
    assert_eq!(bytes_before, bytes_previous);
    assert_ne!(sim.snapshot().unwrap(), before);
    assert_ne!(sim.store().current_index(), index);
  }
}

#[test]
fn snapshot_leaves_current_untouched_while_writing() {
  let particles = scattered(6);
  let mut backend = CpuBackend::new(3);
  let mut store = ParticleStore::allocate(&mut backend, &particles).unwrap();
  {
    let (source, target) = store
      .snapshot_for_write(|src, dst| backend.copy(src, dst))
      .unwrap();
    backend.dispatch(source, target, 0.1).unwrap();
  }
  assert_eq!(store.current(), &particles);
  store.swap();
  assert_eq!(store.previous(), &particles);
  assert_ne!(store.current(), &particles);
}
