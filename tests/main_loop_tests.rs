mod common;

use common::{scattered, test_config, BrokenBackend, ManualTime, Recorder, UnreachableBackend};
use nbody_sim::{Clock, Config, CpuBackend, LoopState, MainLoop, Tick};
use std::sync::atomic::AtomicBool;

const MS: u64 = 1_000_000;

#[test]
fn clock_is_not_due_right_after_recording() {
  let mut clock = Clock::new(100, 0);
  clock.record(1_000, 1_050);
  assert!(!clock.is_due(1_050));
  assert!(!clock.is_due(1_050 + 100 + 50));
  assert!(clock.is_due(1_050 + 100 + 50 + 1));
}

#[test]
fn slow_steps_push_the_next_one_back() {
  let mut fast = Clock::new(100, 0);
  let mut slow = Clock::new(100, 0);
  fast.record(0, 10);
  slow.record(0, 10);
  slow.last_duration_ns = 80;
  assert!(fast.is_due(200));
  assert!(!slow.is_due(150));
  assert!(slow.is_due(191));
}

#[test]
fn renders_and_steps_on_their_own_cadence() {
  let time = ManualTime::default();
  let mut main_loop = MainLoop::from_config(
    &test_config(),
    CpuBackend::new(2),
    &scattered(4),
    Recorder::default(),
    time.clone(),
  )
  .unwrap();

  assert_eq!(main_loop.tick().unwrap(), Tick::default());

  time.set(11 * MS);
  assert_eq!(
    main_loop.tick().unwrap(),
    Tick {
      stepped: false,
      rendered: true
    }
  );
  // nothing new until the render interval has passed again
  assert_eq!(main_loop.tick().unwrap(), Tick::default());

  time.set(101 * MS);
  assert_eq!(
    main_loop.tick().unwrap(),
    Tick {
      stepped: true,
      rendered: true
    }
  );
  assert_eq!(main_loop.simulation().steps(), 1);
  assert_eq!(main_loop.frames(), 2);

  let ts = &main_loop.presenter().ts;
  assert!((ts[0] - 0.11).abs() < 1e-6);
  assert_eq!(ts[1], 0.0);

  // the frame after the step blends from the old state to the new one
  let (previous, current) = &main_loop.presenter().frames[1];
  assert_eq!(previous, &scattered(4));
  assert_ne!(current, previous);
}

#[test]
fn interpolation_factor_stays_in_unit_range() {
  let time = ManualTime::default();
  let config = Config {
    update_rate: 7.0,
    render_rate: 240.0,
    ..test_config()
  };
  let mut main_loop = MainLoop::from_config(
    &config,
    CpuBackend::new(2),
    &scattered(4),
    Recorder::default(),
    time.clone(),
  )
  .unwrap();

  for i in 0..400 {
    time.advance(3 * MS + i % 5 * MS);
    main_loop.tick().unwrap();
  }
  let ts = &main_loop.presenter().ts;
  assert!(main_loop.simulation().steps() > 5);
  assert!(ts.len() > 100);
  assert!(ts.iter().all(|t| (0.0..=1.0).contains(t)));
  assert!(ts.iter().any(|&t| t > 0.5));
}

#[test]
fn late_frames_are_clamped_not_extrapolated() {
  let time = ManualTime::default();
  let mut main_loop = MainLoop::from_config(
    &test_config(),
    CpuBackend::new(2),
    &scattered(4),
    Recorder::default(),
    time.clone(),
  )
  .unwrap();
  time.set(101 * MS);
  main_loop.tick().unwrap();
  let last_update = main_loop.simulation().clock().last_ns;
  assert_eq!(main_loop.simulation().interpolation(last_update + 10 * 100 * MS), 1.0);
  assert_eq!(main_loop.simulation().frame(last_update + 50 * MS).t, 0.5);
}

#[test]
fn paused_loop_keeps_bodies_still() {
  let time = ManualTime::default();
  let config = Config {
    paused: true,
    ..test_config()
  };
  let initial = scattered(4);
  let mut main_loop = MainLoop::from_config(
    &config,
    CpuBackend::new(2),
    &initial,
    Recorder::default(),
    time.clone(),
  )
  .unwrap();

  for _ in 0..10 {
    time.advance(101 * MS);
    main_loop.tick().unwrap();
  }
  assert_eq!(main_loop.simulation().steps(), 10);
  assert_eq!(main_loop.simulation_mut().snapshot().unwrap(), initial);
}

#[test]
fn duration_limit_closes_the_loop() {
  let time = ManualTime::default();
  let config = Config {
    duration: Some(0.5),
    ..test_config()
  };
  let mut main_loop = MainLoop::from_config(
    &config,
    CpuBackend::new(2),
    &scattered(4),
    Recorder::default(),
    time.clone(),
  )
  .unwrap();

  time.set(499 * MS);
  main_loop.tick().unwrap();
  assert_eq!(main_loop.state(), LoopState::Running);
  time.set(500 * MS);
  assert_eq!(main_loop.tick().unwrap(), Tick::default());
  assert_eq!(main_loop.state(), LoopState::Closing);
  assert!(main_loop.run(&AtomicBool::new(false)).is_ok());
}

#[test]
fn huge_duration_never_expires() {
  let time = ManualTime::default();
  time.set(5);
  let config = Config {
    duration: Some(1e12),
    ..test_config()
  };
  let mut main_loop = MainLoop::from_config(
    &config,
    CpuBackend::new(2),
    &scattered(4),
    Recorder::default(),
    time.clone(),
  )
  .unwrap();

  time.set(10);
  main_loop.tick().unwrap();
  assert_eq!(main_loop.state(), LoopState::Running);
  time.set(u64::MAX - 1);
  main_loop.tick().unwrap();
  assert_eq!(main_loop.state(), LoopState::Running);
}

#[test]
fn close_signal_stops_the_loop() {
  let mut main_loop = MainLoop::from_config(
    &test_config(),
    CpuBackend::new(2),
    &scattered(4),
    Recorder::default(),
    ManualTime::default(),
  )
  .unwrap();
  main_loop.run(&AtomicBool::new(true)).unwrap();
  assert_eq!(main_loop.state(), LoopState::Closing);
  assert_eq!(main_loop.simulation().steps(), 0);
  assert_eq!(main_loop.tick().unwrap(), Tick::default());
}

#[test]
fn invalid_configuration_fails_before_allocation() {
  for config in [
    Config {
      update_rate: 0.0,
      ..test_config()
    },
    Config {
      render_rate: -60.0,
      ..test_config()
    },
    Config {
      num_particles: 0,
      ..test_config()
    },
  ] {
    let result = MainLoop::from_config(
      &config,
      UnreachableBackend,
      &scattered(4),
      Recorder::default(),
      ManualTime::default(),
    );
    assert!(result.is_err());
  }
}

#[test]
fn scene_size_must_match_configuration() {
  let result = MainLoop::from_config(
    &test_config(),
    UnreachableBackend,
    &scattered(5),
    Recorder::default(),
    ManualTime::default(),
  );
  let err = result.err().unwrap();
  assert!(err.to_string().contains("4 particles"));
}

#[test]
fn dispatch_failure_is_fatal() {
  let time = ManualTime::default();
  let mut main_loop = MainLoop::from_config(
    &test_config(),
    BrokenBackend,
    &scattered(4),
    Recorder::default(),
    time.clone(),
  )
  .unwrap();
  time.set(101 * MS);
  let err = main_loop.tick().unwrap_err();
  assert!(err.to_string().contains("device lost"));
  assert_eq!(main_loop.simulation().steps(), 0);
}
