use crate::params::ParameterStore;

/// Real-time safe effect interface.
/// - process() must not allocate, lock or panic on the hot path.
/// - `block` is interleaved f32 samples in [-1, 1]; `block.len() / channels` frames.
///   A trailing partial frame is left untouched.
pub trait Effect: Send {
    fn name(&self) -> &'static str;

    /// Pull this effect's cells from the store. Called once per block, before
    /// `process`. Values are clamped by the effect; the store is not trusted.
    fn apply_params(&mut self, _params: &ParameterStore) {}

    fn process(&mut self, block: &mut [f32], channels: usize);

    /// Clear filter memory / delay lines.
    fn reset(&mut self) {}
}

/// Stereo at most; effects keep fixed per-channel state for this many channels.
pub const MAX_CHANNELS: usize = 2;

#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}
