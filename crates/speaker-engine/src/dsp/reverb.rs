//! Single-tap feedback delay ("Schroeder-style echo") per channel.

use super::effect::{Effect, MAX_CHANNELS};
use crate::params::{ParamId, ParameterStore};

/// Hard cap below 1.0 so the loop gain can never run away.
pub const FEEDBACK_MAX: f32 = 0.98;
pub const WET_MAX: f32 = 1.0;
pub const DRY_MAX: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub delay_ms: f32,
    pub feedback: f32,
    pub wet: f32,
    pub dry: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            delay_ms: ParamId::ReverbDelayMs.default_value(),
            feedback: ParamId::ReverbFeedback.default_value(),
            wet: ParamId::ReverbWet.default_value(),
            dry: ParamId::ReverbDry.default_value(),
        }
    }
}

/// Per-channel circular delay line sized for `max_delay_ms`.
///
/// Per sample: read `line[w - d]`, write `x + delayed * feedback` at `w`,
/// output `dry * x + wet * delayed`. Delay changes move the read tap
/// without clearing the line.
pub struct Reverb {
    sample_rate: f32,
    channels: usize,
    line_len: usize,
    lines: Vec<f32>,
    write_idx: [usize; MAX_CHANNELS],
    params: ReverbParams,
}

impl Reverb {
    pub fn new(sample_rate: f32, max_delay_ms: f32, max_channels: usize) -> Self {
        let channels = max_channels.clamp(1, MAX_CHANNELS);
        let max_delay_samples = (max_delay_ms.max(0.0) as f64 * sample_rate as f64 / 1000.0).round() as usize;
        // +1 so the maximum delay is reachable without overlapping the write slot.
        let line_len = max_delay_samples + 1;

        Self {
            sample_rate,
            channels,
            line_len,
            lines: vec![0.0; channels * line_len],
            write_idx: [0; MAX_CHANNELS],
            params: ReverbParams::default(),
        }
    }

    pub fn with_params(mut self, params: ReverbParams) -> Self {
        self.params = params;
        self
    }

    /// Raw values; clamped when a block is processed.
    pub fn set_params(&mut self, params: ReverbParams) {
        self.params = params;
    }

    pub fn params(&self) -> ReverbParams {
        self.params
    }

    pub fn max_delay_ms(&self) -> f32 {
        (self.line_len - 1) as f32 / self.sample_rate * 1000.0
    }

    /// Largest absolute value held in any delay line.
    pub fn peak_level(&self) -> f32 {
        self.lines.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Clamp the current raw parameters into safe ranges and convert the delay
    /// to whole samples in `[1, line_len - 1]`.
    fn effective(&self) -> (usize, f32, f32, f32) {
        let p = self.params;
        let delay_ms = finite_or(p.delay_ms, 0.0).clamp(0.0, self.max_delay_ms());
        let fb = finite_or(p.feedback, 0.0).clamp(0.0, FEEDBACK_MAX);
        let wet = finite_or(p.wet, 0.0).clamp(0.0, WET_MAX);
        let dry = finite_or(p.dry, 1.0).clamp(0.0, DRY_MAX);

        let samples = (delay_ms as f64 * self.sample_rate as f64 / 1000.0).round() as usize;
        let max = self.line_len.saturating_sub(1).max(1);
        (samples.clamp(1, max), fb, wet, dry)
    }
}

#[inline]
fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

impl Effect for Reverb {
    fn name(&self) -> &'static str {
        "reverb"
    }

    fn apply_params(&mut self, params: &ParameterStore) {
        self.params = ReverbParams {
            delay_ms: params.get(ParamId::ReverbDelayMs),
            feedback: params.get(ParamId::ReverbFeedback),
            wet: params.get(ParamId::ReverbWet),
            dry: params.get(ParamId::ReverbDry),
        };
    }

    fn process(&mut self, block: &mut [f32], channels: usize) {
        if block.is_empty() || channels == 0 {
            return;
        }
        let ch = channels.min(self.channels);
        let (delay, fb, wet, dry) = self.effective();
        let len = self.line_len;

        for frame in block.chunks_exact_mut(channels) {
            for (c, s) in frame.iter_mut().take(ch).enumerate() {
                let x = *s;
                let w = self.write_idx[c];
                let r = (w + len - delay) % len;
                let line = &mut self.lines[c * len..(c + 1) * len];

                let delayed = line[r];
                line[w] = x + delayed * fb;
                *s = dry * x + wet * delayed;

                self.write_idx[c] = if w + 1 == len { 0 } else { w + 1 };
            }
        }
    }

    fn reset(&mut self) {
        self.lines.fill(0.0);
        self.write_idx = [0; MAX_CHANNELS];
    }
}
