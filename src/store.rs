use crate::compute::ComputeBackend;
use crate::Particle;
use anyhow::Result;

/// Two equally sized particle buffers and a selector bit naming the current one.
///
/// The previous buffer is always an untouched copy of the state one step ago,
/// which is what the renderer interpolates from.
pub struct ParticleStore<B> {
  buffers: [B; 2],
  current: usize,
  len: u32,
}

impl<B> ParticleStore<B> {
  #[must_use]
  pub fn new(a: B, b: B, len: u32) -> Self {
    Self {
      buffers: [a, b],
      current: 0,
      len,
    }
  }

  /// Allocates both slots through `backend`, each holding `particles`.
  pub fn allocate<C>(backend: &mut C, particles: &[Particle]) -> Result<Self>
  where
    C: ComputeBackend<Buffer = B>,
  {
    let a = backend.allocate(particles)?;
    let b = backend.allocate(particles)?;
    Ok(Self::new(a, b, particles.len() as u32))
  }

  pub fn len(&self) -> u32 {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  pub fn current(&self) -> &B {
    &self.buffers[self.current]
  }

  pub fn previous(&self) -> &B {
    &self.buffers[self.current ^ 1]
  }

  pub fn swap(&mut self) {
    self.current ^= 1;
  }

  /// Copies the current buffer into the other slot and hands that slot back
  /// for in-place integration. The current buffer stays readable and
  /// untouched; once the caller has finished writing it calls [`swap`], which
  /// promotes the written slot to current and leaves the pre-step state as
  /// previous.
  ///
  /// [`swap`]: ParticleStore::swap
  pub fn snapshot_for_write<F>(&mut self, copy: F) -> Result<(&B, &mut B)>
  where
    F: FnOnce(&B, &mut B) -> Result<()>,
  {
    let (first, second) = self.buffers.split_at_mut(1);
    let (source, target) = if self.current == 0 {
      (&first[0], &mut second[0])
    } else {
      (&second[0], &mut first[0])
    };
    copy(source, target)?;
    Ok((source, target))
  }
}
