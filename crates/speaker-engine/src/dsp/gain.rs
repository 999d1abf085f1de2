use super::effect::{db_to_linear, Effect};
use crate::params::{ParamId, ParameterStore};

pub const GAIN_DB_MIN: f32 = -80.0;
pub const GAIN_DB_MAX: f32 = 12.0;

/// Linear gain with dB control. The linear factor is cached per change.
pub struct Gain {
    db: f32,
    lin: f32,
}

impl Gain {
    pub fn new(db: f32) -> Self {
        let mut g = Self { db: 0.0, lin: 1.0 };
        g.set_db(db);
        g
    }

    pub fn set_db(&mut self, db: f32) {
        let db = if db.is_nan() { 0.0 } else { db.clamp(GAIN_DB_MIN, GAIN_DB_MAX) };
        if db != self.db {
            self.db = db;
            self.recompute();
        }
    }

    pub fn db(&self) -> f32 {
        self.db
    }

    pub fn linear(&self) -> f32 {
        self.lin
    }

    fn recompute(&mut self) {
        self.lin = db_to_linear(self.db);
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Effect for Gain {
    fn name(&self) -> &'static str {
        "gain"
    }

    fn apply_params(&mut self, params: &ParameterStore) {
        self.set_db(params.get(ParamId::GainDb));
    }

    fn process(&mut self, block: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let g = self.lin;
        let whole = block.len() - block.len() % channels;
        for s in block[..whole].iter_mut() {
            *s *= g;
        }
    }
}
