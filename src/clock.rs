use anyhow::{bail, Result};
use std::time::Instant;

/// Monotonic nanosecond time source polled by the main loop.
pub trait TimeSource {
  fn now_ns(&self) -> u64;
}

/// Nanoseconds elapsed since construction.
pub struct MonotonicTime {
  origin: Instant,
}

impl MonotonicTime {
  #[must_use]
  pub fn new() -> Self {
    Self {
      origin: Instant::now(),
    }
  }
}

impl Default for MonotonicTime {
  fn default() -> Self {
    Self::new()
  }
}

impl TimeSource for MonotonicTime {
  fn now_ns(&self) -> u64 {
    self.origin.elapsed().as_nanos() as u64
  }
}

/// True once more than `interval_ns` has passed since the last action,
/// with the action's own runtime taken out of the elapsed time.
#[must_use]
pub fn is_due(now_ns: u64, last_ns: u64, last_duration_ns: u64, interval_ns: u64) -> bool {
  now_ns.saturating_sub(last_ns).saturating_sub(last_duration_ns) > interval_ns
}

/// Fixed-rate pacing for one activity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Clock {
  pub interval_ns: u64,
  pub last_ns: u64,
  pub last_duration_ns: u64,
}

impl Clock {
  #[must_use]
  pub fn new(interval_ns: u64, now_ns: u64) -> Self {
    Self {
      interval_ns,
      last_ns: now_ns,
      last_duration_ns: 0,
    }
  }

  /// Builds a clock ticking `rate` times per second, starting at `now_ns`.
  pub fn from_rate(rate: f64, now_ns: u64) -> Result<Self> {
    if !(rate.is_finite() && rate > 0.0) {
      bail!("clock rate must be positive, got {rate}");
    }
    Ok(Self::new((1e9 / rate) as u64, now_ns))
  }

  #[must_use]
  pub fn is_due(&self, now_ns: u64) -> bool {
    is_due(now_ns, self.last_ns, self.last_duration_ns, self.interval_ns)
  }

  /// Records an action that ran from `start_ns` to `end_ns`.
  pub fn record(&mut self, start_ns: u64, end_ns: u64) {
    self.last_ns = end_ns;
    self.last_duration_ns = end_ns.saturating_sub(start_ns);
  }
}
