/// What a presenter needs for one frame: the pre-step snapshot, the latest
/// snapshot and how far wall time has moved between them.
pub struct Frame<'a, B> {
  pub previous: &'a B,
  pub current: &'a B,
  pub t: f32,
  /// Loop time the frame was taken at.
  pub now_ns: u64,
}

/// Fraction of the update interval elapsed since the last simulation step,
/// clamped to [0, 1] so a late simulation never extrapolates.
#[must_use]
pub fn interpolation_factor(now_ns: u64, last_update_ns: u64, update_interval_ns: u64) -> f32 {
  if update_interval_ns == 0 {
    return 1.0;
  }
  let elapsed = now_ns.saturating_sub(last_update_ns) as f64;
  (elapsed / update_interval_ns as f64).clamp(0.0, 1.0) as f32
}
