use crate::dsp::effect::Effect;
use crate::params::ParameterStore;

/// A serial chain of effects. Owns the effects; order is fixed once built.
#[derive(Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self { effects: Vec::new() }
    }

    /// Configuration time only; never called from the processing loop.
    pub fn push(&mut self, fx: Box<dyn Effect>) {
        self.effects.push(fx);
    }

    pub fn with(mut self, fx: impl Effect + 'static) -> Self {
        self.push(Box::new(fx));
        self
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.effects.iter().map(|fx| fx.name())
    }

    pub fn apply_params(&mut self, params: &ParameterStore) {
        for fx in self.effects.iter_mut() {
            fx.apply_params(params);
        }
    }

    /// Process one interleaved block in-place, each effect seeing the
    /// previous one's output.
    pub fn process(&mut self, block: &mut [f32], channels: usize) {
        for fx in self.effects.iter_mut() {
            fx.process(block, channels);
        }
    }

    pub fn reset(&mut self) {
        for fx in self.effects.iter_mut() {
            fx.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Distortion, Gain};

    struct AddOne;
    impl Effect for AddOne {
        fn name(&self) -> &'static str {
            "add_one"
        }
        fn process(&mut self, block: &mut [f32], _channels: usize) {
            block.iter_mut().for_each(|s| *s += 1.0);
        }
    }

    struct Double;
    impl Effect for Double {
        fn name(&self) -> &'static str {
            "double"
        }
        fn process(&mut self, block: &mut [f32], _channels: usize) {
            block.iter_mut().for_each(|s| *s *= 2.0);
        }
    }

    #[test]
    fn empty_chain_passes_through() {
        let mut chain = EffectChain::new();
        let mut block = [0.1f32, 0.2];
        chain.process(&mut block, 2);
        assert_eq!(block, [0.1, 0.2]);
        assert!(chain.is_empty());
    }

    #[test]
    fn effects_run_in_insertion_order() {
        let mut a = EffectChain::new().with(AddOne).with(Double);
        let mut b = EffectChain::new().with(Double).with(AddOne);
        let mut x = [1.0f32];
        let mut y = [1.0f32];
        a.process(&mut x, 1);
        b.process(&mut y, 1);
        assert_eq!(x, [4.0]);
        assert_eq!(y, [3.0]);
        assert_eq!(a.names().collect::<Vec<_>>(), ["add_one", "double"]);
    }

    #[test]
    fn params_reach_every_effect() {
        let store = ParameterStore::new();
        store.set(crate::params::ParamId::GainDb, -80.0);
        let mut chain = EffectChain::new()
            .with(Gain::default())
            .with(Distortion::new(1.0, 0.0, 1.0));
        chain.apply_params(&store);
        let mut block = [1.0f32, 1.0];
        chain.process(&mut block, 2);
        assert!(block[0].abs() < 1e-3);
    }
}
