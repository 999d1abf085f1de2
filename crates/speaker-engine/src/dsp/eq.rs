//! Three-band equalizer: low shelf, mid peak and high shelf biquads in series.
//!
//! Coefficients follow the RBJ Audio EQ Cookbook and are recomputed only when
//! a band's gain actually changes.

use super::effect::{Effect, MAX_CHANNELS};
use crate::params::{ParamId, ParameterStore};
use std::f32::consts::{FRAC_1_SQRT_2, PI};

pub const BAND_DB_MIN: f32 = -12.0;
pub const BAND_DB_MAX: f32 = 12.0;

pub const LOW_SHELF_HZ: f32 = 120.0;
pub const MID_PEAK_HZ: f32 = 1000.0;
pub const MID_PEAK_Q: f32 = 0.9;
pub const HIGH_SHELF_HZ: f32 = 8000.0;

/// Highest usable band frequency as a fraction of the sample rate. A band at
/// or above Nyquist puts the poles on the unit circle.
pub const MAX_BAND_FRACTION: f32 = 0.45;

/// Normalised transposed direct form II biquad with per-channel state.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: [f32; MAX_CHANNELS],
    z2: [f32; MAX_CHANNELS],
}

impl Default for Biquad {
    fn default() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: [0.0; MAX_CHANNELS],
            z2: [0.0; MAX_CHANNELS],
        }
    }
}

impl Biquad {
    pub fn reset(&mut self) {
        self.z1 = [0.0; MAX_CHANNELS];
        self.z2 = [0.0; MAX_CHANNELS];
    }

    #[inline]
    pub fn process(&mut self, x: f32, ch: usize) -> f32 {
        let y = self.b0 * x + self.z1[ch];
        self.z1[ch] = self.b1 * x - self.a1 * y + self.z2[ch];
        self.z2[ch] = self.b2 * x - self.a2 * y;
        y
    }

    pub fn set_peaking(&mut self, sample_rate: f32, freq_hz: f32, q: f32, db: f32) {
        let a = 10f32.powf(db / 40.0);
        let (cw, sw) = omega(sample_rate, freq_hz);
        let alpha = sw / (2.0 * q);

        self.set_normalized(
            1.0 + alpha * a,
            -2.0 * cw,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cw,
            1.0 - alpha / a,
        );
    }

    /// Shelf slope S = 1, i.e. Q = 1/sqrt(2).
    pub fn set_low_shelf(&mut self, sample_rate: f32, freq_hz: f32, db: f32) {
        let a = 10f32.powf(db / 40.0);
        let (cw, sw) = omega(sample_rate, freq_hz);
        let two_sa_alpha = 2.0 * a.sqrt() * sw * FRAC_1_SQRT_2;

        self.set_normalized(
            a * ((a + 1.0) - (a - 1.0) * cw + two_sa_alpha),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cw),
            a * ((a + 1.0) - (a - 1.0) * cw - two_sa_alpha),
            (a + 1.0) + (a - 1.0) * cw + two_sa_alpha,
            -2.0 * ((a - 1.0) + (a + 1.0) * cw),
            (a + 1.0) + (a - 1.0) * cw - two_sa_alpha,
        );
    }

    pub fn set_high_shelf(&mut self, sample_rate: f32, freq_hz: f32, db: f32) {
        let a = 10f32.powf(db / 40.0);
        let (cw, sw) = omega(sample_rate, freq_hz);
        let two_sa_alpha = 2.0 * a.sqrt() * sw * FRAC_1_SQRT_2;

        self.set_normalized(
            a * ((a + 1.0) + (a - 1.0) * cw + two_sa_alpha),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * cw),
            a * ((a + 1.0) + (a - 1.0) * cw - two_sa_alpha),
            (a + 1.0) - (a - 1.0) * cw + two_sa_alpha,
            2.0 * ((a - 1.0) - (a + 1.0) * cw),
            (a + 1.0) - (a - 1.0) * cw - two_sa_alpha,
        );
    }

    fn set_normalized(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Magnitude response at `freq_hz`, for tests and diagnostics.
    pub fn magnitude_at(&self, sample_rate: f32, freq_hz: f32) -> f32 {
        let w = 2.0 * PI as f64 * freq_hz as f64 / sample_rate as f64;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());
        let (b0, b1, b2) = (self.b0 as f64, self.b1 as f64, self.b2 as f64);
        let (a1, a2) = (self.a1 as f64, self.a2 as f64);

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt() as f32
    }
}

#[inline]
fn omega(sample_rate: f32, freq_hz: f32) -> (f32, f32) {
    let w0 = 2.0 * PI * band_freq(sample_rate, freq_hz) / sample_rate;
    (w0.cos(), w0.sin())
}

/// Keeps a band strictly inside (0, Nyquist) at low sample rates.
#[inline]
fn band_freq(sample_rate: f32, freq_hz: f32) -> f32 {
    freq_hz.min(MAX_BAND_FRACTION * sample_rate).max(1.0)
}

#[inline]
fn clamp_band(db: f32) -> f32 {
    if db.is_nan() {
        0.0
    } else {
        db.clamp(BAND_DB_MIN, BAND_DB_MAX)
    }
}

/// Low shelf @120 Hz, peak @1 kHz (Q 0.9), high shelf @8 kHz, each ±12 dB.
/// Channels beyond the second pass through untouched.
pub struct Equalizer3Band {
    sample_rate: f32,
    low_db: f32,
    mid_db: f32,
    high_db: f32,
    low: Biquad,
    mid: Biquad,
    high: Biquad,
}

impl Equalizer3Band {
    pub fn new(sample_rate: f32) -> Self {
        let mut eq = Self {
            sample_rate,
            low_db: 0.0,
            mid_db: 0.0,
            high_db: 0.0,
            low: Biquad::default(),
            mid: Biquad::default(),
            high: Biquad::default(),
        };
        eq.update_low();
        eq.update_mid();
        eq.update_high();
        eq
    }

    pub fn set_low_db(&mut self, db: f32) {
        let db = clamp_band(db);
        if db != self.low_db {
            self.low_db = db;
            self.update_low();
        }
    }

    pub fn set_mid_db(&mut self, db: f32) {
        let db = clamp_band(db);
        if db != self.mid_db {
            self.mid_db = db;
            self.update_mid();
        }
    }

    pub fn set_high_db(&mut self, db: f32) {
        let db = clamp_band(db);
        if db != self.high_db {
            self.high_db = db;
            self.update_high();
        }
    }

    pub fn gains_db(&self) -> (f32, f32, f32) {
        (self.low_db, self.mid_db, self.high_db)
    }

    /// Combined magnitude of the three bands at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f32) -> f32 {
        self.low.magnitude_at(self.sample_rate, freq_hz)
            * self.mid.magnitude_at(self.sample_rate, freq_hz)
            * self.high.magnitude_at(self.sample_rate, freq_hz)
    }

    fn update_low(&mut self) {
        self.low.set_low_shelf(self.sample_rate, LOW_SHELF_HZ, self.low_db);
    }

    fn update_mid(&mut self) {
        self.mid.set_peaking(self.sample_rate, MID_PEAK_HZ, MID_PEAK_Q, self.mid_db);
    }

    fn update_high(&mut self) {
        self.high.set_high_shelf(self.sample_rate, HIGH_SHELF_HZ, self.high_db);
    }
}

impl Effect for Equalizer3Band {
    fn name(&self) -> &'static str {
        "eq3band"
    }

    fn apply_params(&mut self, params: &ParameterStore) {
        self.set_low_db(params.get(ParamId::EqLowDb));
        self.set_mid_db(params.get(ParamId::EqMidDb));
        self.set_high_db(params.get(ParamId::EqHighDb));
    }

    fn process(&mut self, block: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let ch = channels.min(MAX_CHANNELS);

        for frame in block.chunks_exact_mut(channels) {
            for (c, s) in frame.iter_mut().take(ch).enumerate() {
                let x = self.low.process(*s, c);
                let x = self.mid.process(x, c);
                *s = self.high.process(x, c);
            }
        }
    }

    fn reset(&mut self) {
        self.low.reset();
        self.mid.reset();
        self.high.reset();
    }
}
