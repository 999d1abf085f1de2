use super::effect::{Effect, MAX_CHANNELS};
use crate::params::{ParamId, ParameterStore};
use std::f64::consts::PI;

pub const CUTOFF_MIN_HZ: f32 = 1.0;
pub const CUTOFF_MAX_HZ: f32 = 2000.0;

/// One-pole DC blocking high-pass, `y = x - x[n-1] + r * y[n-1]`,
/// with `r = exp(-2π fc / fs)`.
///
/// Changing the cutoff only swaps `r`; the per-channel history is kept.
pub struct DcBlocker {
    sample_rate: f32,
    cutoff_hz: f32,
    r: f32,
    x_prev: [f32; MAX_CHANNELS],
    y_prev: [f32; MAX_CHANNELS],
}

impl DcBlocker {
    pub fn new(sample_rate: f32, cutoff_hz: f32) -> Self {
        let mut dc = Self {
            sample_rate,
            cutoff_hz: f32::NAN,
            r: 0.995,
            x_prev: [0.0; MAX_CHANNELS],
            y_prev: [0.0; MAX_CHANNELS],
        };
        dc.set_cutoff(cutoff_hz);
        dc
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        let hz = if hz.is_nan() { CUTOFF_MIN_HZ } else { hz.clamp(CUTOFF_MIN_HZ, CUTOFF_MAX_HZ) };
        if hz == self.cutoff_hz {
            return;
        }
        self.cutoff_hz = hz;
        self.r = (-2.0 * PI * hz as f64 / self.sample_rate as f64).exp() as f32;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn pole(&self) -> f32 {
        self.r
    }
}

impl Effect for DcBlocker {
    fn name(&self) -> &'static str {
        "dc_blocker"
    }

    fn apply_params(&mut self, params: &ParameterStore) {
        self.set_cutoff(params.get(ParamId::DcBlockerCutoffHz));
    }

    fn process(&mut self, block: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let ch = channels.min(MAX_CHANNELS);
        let r = self.r;

        for frame in block.chunks_exact_mut(channels) {
            for (c, s) in frame.iter_mut().take(ch).enumerate() {
                let x = *s;
                let y = x - self.x_prev[c] + r * self.y_prev[c];
                self.x_prev[c] = x;
                self.y_prev[c] = y;
                *s = y;
            }
        }
    }

    fn reset(&mut self) {
        self.x_prev = [0.0; MAX_CHANNELS];
        self.y_prev = [0.0; MAX_CHANNELS];
    }
}
