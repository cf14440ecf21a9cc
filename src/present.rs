use crate::interpolate::Frame;
use anyhow::Result;

const REPORT_PERIOD_NS: u64 = 1_000_000_000;

/// Consumer of interpolated frames. Implementations must only read the two
/// buffers in `frame`; both are settled when `present` is called.
pub trait Presenter<B> {
  fn present(&mut self, frame: Frame<'_, B>) -> Result<()>;
}

/// Presenter for runs without a window: counts frames and reports the rate
/// once per second of loop time.
pub struct HeadlessPresenter {
  frames: u64,
  frames_since_report: u64,
  last_report_ns: Option<u64>,
}

impl HeadlessPresenter {
  #[must_use]
  pub fn new() -> Self {
    Self {
      frames: 0,
      frames_since_report: 0,
      last_report_ns: None,
    }
  }

  /// Frames per second since the previous report, once a full period has
  /// passed.
  fn sample(&mut self, now_ns: u64) -> Option<f64> {
    self.frames_since_report += 1;
    let since = *self.last_report_ns.get_or_insert(now_ns);
    let elapsed = now_ns.saturating_sub(since);
    if elapsed < REPORT_PERIOD_NS {
      return None;
    }
    let rate = self.frames_since_report as f64 / (elapsed as f64 / 1e9);
    self.frames_since_report = 0;
    self.last_report_ns = Some(now_ns);
    Some(rate)
  }
}

impl Default for HeadlessPresenter {
  fn default() -> Self {
    Self::new()
  }
}

impl<B> Presenter<B> for HeadlessPresenter {
  fn present(&mut self, frame: Frame<'_, B>) -> Result<()> {
    self.frames += 1;
    log::trace!("frame {} t={:.3}", self.frames, frame.t);
    if let Some(rate) = self.sample(frame.now_ns) {
      log::info!("{rate:.1} frames/s");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MS: u64 = 1_000_000;

  fn frame_at(buffer: &[u8; 0], now_ns: u64) -> Frame<'_, [u8; 0]> {
    Frame {
      previous: buffer,
      current: buffer,
      t: 0.0,
      now_ns,
    }
  }

  #[test]
  fn reports_once_per_second_of_loop_time() {
    let buffer = [];
    let mut presenter = HeadlessPresenter::new();
    for i in 0..10 {
      presenter.present(frame_at(&buffer, i * 100 * MS)).unwrap();
      assert_eq!(presenter.last_report_ns, Some(0));
    }
    assert_eq!(presenter.frames_since_report, 10);

    presenter.present(frame_at(&buffer, 1000 * MS)).unwrap();
    assert_eq!(presenter.frames, 11);
    assert_eq!(presenter.frames_since_report, 0);
    assert_eq!(presenter.last_report_ns, Some(1000 * MS));
  }

  #[test]
  fn sampled_rate_matches_frame_spacing() {
    let mut presenter = HeadlessPresenter::new();
    let mut rates = Vec::new();
    for i in 0..=40 {
      rates.extend(presenter.sample(i * 50 * MS));
    }
    // the first period also counts its opening frame
    assert_eq!(rates.len(), 2);
    assert!((rates[0] - 21.0).abs() < 1e-9);
    assert!((rates[1] - 20.0).abs() < 1e-9);
  }
}
