use super::effect::Effect;

pub const DEFAULT_DRIVE: f32 = 10.0;
pub const DEFAULT_MIX: f32 = 1.0;
pub const DEFAULT_OUTPUT_TRIM: f32 = 0.3;

/// tanh waveshaper: `y = trim * ((1 - mix) * x + mix * tanh(drive * x))`.
///
/// Stateless. Parameters are fixed at construction and are not exposed
/// through the parameter store, so `apply_params` is the trait default.
pub struct Distortion {
    drive: f32,
    mix: f32,
    output_trim: f32,
}

impl Distortion {
    /// `drive` is clamped to [1, 20], `mix` to [0, 1], `output_trim` to [0, 1].
    pub fn new(drive: f32, mix: f32, output_trim: f32) -> Self {
        Self {
            drive: drive.clamp(1.0, 20.0),
            mix: mix.clamp(0.0, 1.0),
            output_trim: output_trim.clamp(0.0, 1.0),
        }
    }

    #[inline]
    fn shape(&self, x: f32) -> f32 {
        let wet = (self.drive * x).tanh();
        self.output_trim * ((1.0 - self.mix) * x + self.mix * wet)
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new(DEFAULT_DRIVE, DEFAULT_MIX, DEFAULT_OUTPUT_TRIM)
    }
}

impl Effect for Distortion {
    fn name(&self) -> &'static str {
        "distortion"
    }

    fn process(&mut self, block: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let whole = block.len() - block.len() % channels;
        for s in block[..whole].iter_mut() {
            *s = self.shape(*s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamId, ParameterStore};

    #[test]
    fn silence_stays_silent() {
        let mut d = Distortion::default();
        let mut block = [0.0f32; 8];
        d.process(&mut block, 2);
        assert_eq!(block, [0.0; 8]);
    }

    #[test]
    fn zero_mix_is_plain_trim() {
        let mut d = Distortion::new(10.0, 0.0, 0.5);
        let mut block = [0.8f32, -0.4];
        d.process(&mut block, 2);
        assert!((block[0] - 0.4).abs() < 1e-6);
        assert!((block[1] + 0.2).abs() < 1e-6);
    }

    #[test]
    fn output_is_bounded_by_trim() {
        let mut d = Distortion::default();
        let mut block = [5.0f32, -5.0, 1.0, -1.0];
        d.process(&mut block, 1);
        for s in block {
            assert!(s.abs() <= DEFAULT_OUTPUT_TRIM + 1e-6);
        }
    }

    #[test]
    fn ignores_parameter_store() {
        // Distortion has no store cells; retuning the store must not change it.
        let store = ParameterStore::new();
        store.set(ParamId::GainDb, 12.0);
        let mut d = Distortion::default();
        let mut before = [0.2f32, -0.2];
        d.process(&mut before, 2);
        d.apply_params(&store);
        let mut after = [0.2f32, -0.2];
        d.process(&mut after, 2);
        assert_eq!(before, after);
    }
}
