use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

/// f32 cell stored as its bit pattern. Relaxed: cells are independent and
/// only need per-value atomicity.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }
}

/// The runtime-tunable parameters. Distortion is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    GainDb,
    ReverbDelayMs,
    ReverbFeedback,
    ReverbWet,
    ReverbDry,
    DcBlockerCutoffHz,
    EqLowDb,
    EqMidDb,
    EqHighDb,
}

impl ParamId {
    pub const ALL: [ParamId; 9] = [
        ParamId::GainDb,
        ParamId::ReverbDelayMs,
        ParamId::ReverbFeedback,
        ParamId::ReverbWet,
        ParamId::ReverbDry,
        ParamId::DcBlockerCutoffHz,
        ParamId::EqLowDb,
        ParamId::EqMidDb,
        ParamId::EqHighDb,
    ];

    /// Name used on the control channel.
    pub fn name(self) -> &'static str {
        match self {
            ParamId::GainDb => "gain_db",
            ParamId::ReverbDelayMs => "reverb_delay_ms",
            ParamId::ReverbFeedback => "reverb_feedback",
            ParamId::ReverbWet => "reverb_wet",
            ParamId::ReverbDry => "reverb_dry",
            ParamId::DcBlockerCutoffHz => "dc_blocker_cutoff_hz",
            ParamId::EqLowDb => "eq_low_db",
            ParamId::EqMidDb => "eq_mid_db",
            ParamId::EqHighDb => "eq_high_db",
        }
    }

    pub fn from_name(name: &str) -> Option<ParamId> {
        ParamId::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Range the control plane clamps to. Advisory: effects clamp again
    /// to their own ranges.
    pub fn control_range(self) -> (f32, f32) {
        match self {
            ParamId::GainDb => (-60.0, 12.0),
            ParamId::ReverbDelayMs => (0.0, 2000.0),
            ParamId::ReverbFeedback => (0.0, 1.0),
            ParamId::ReverbWet => (0.0, 1.0),
            ParamId::ReverbDry => (0.0, 1.0),
            ParamId::DcBlockerCutoffHz => (1.0, 2000.0),
            ParamId::EqLowDb | ParamId::EqMidDb | ParamId::EqHighDb => (-12.0, 12.0),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            ParamId::GainDb => 0.0,
            ParamId::ReverbDelayMs => 120.0,
            ParamId::ReverbFeedback => 0.25,
            ParamId::ReverbWet => 0.55,
            ParamId::ReverbDry => 0.8,
            ParamId::DcBlockerCutoffHz => 10.0,
            ParamId::EqLowDb => 10.0,
            ParamId::EqMidDb => 0.0,
            ParamId::EqHighDb => 0.0,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Flat set of independently atomic parameter cells, shared as
/// `Arc<ParameterStore>` between the control plane and the processing loop.
///
/// No cross-cell consistency: a reader may see a partially applied update.
#[derive(Debug)]
pub struct ParameterStore {
    cells: [AtomicF32; 9],
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            cells: ParamId::ALL.map(|id| AtomicF32::new(id.default_value())),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.cells[id.index()].load()
    }

    /// Raw store. Callers own any clamping; effects clamp on read regardless.
    #[inline]
    pub fn set(&self, id: ParamId, value: f32) {
        self.cells[id.index()].store(value);
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            gain_db: self.get(ParamId::GainDb),
            reverb_delay_ms: self.get(ParamId::ReverbDelayMs),
            reverb_feedback: self.get(ParamId::ReverbFeedback),
            reverb_wet: self.get(ParamId::ReverbWet),
            reverb_dry: self.get(ParamId::ReverbDry),
            dc_blocker_cutoff_hz: self.get(ParamId::DcBlockerCutoffHz),
            eq_low_db: self.get(ParamId::EqLowDb),
            eq_mid_db: self.get(ParamId::EqMidDb),
            eq_high_db: self.get(ParamId::EqHighDb),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of every cell, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSnapshot {
    pub gain_db: f32,
    pub reverb_delay_ms: f32,
    pub reverb_feedback: f32,
    pub reverb_wet: f32,
    pub reverb_dry: f32,
    pub dc_blocker_cutoff_hz: f32,
    pub eq_low_db: f32,
    pub eq_mid_db: f32,
    pub eq_high_db: f32,
}

/// Free-form "now playing" label. Control plane only; the audio path never
/// reads it, so a lock is fine here.
#[derive(Debug, Default)]
pub struct NowPlaying(Mutex<String>);

impl NowPlaying {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> String {
        self.0.lock().clone()
    }

    pub fn set(&self, name: impl Into<String>) {
        *self.0.lock() = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn defaults_match_startup_values() {
        let store = ParameterStore::new();
        for id in ParamId::ALL {
            assert_eq!(store.get(id), id.default_value(), "{}", id.name());
        }
        assert_eq!(store.get(ParamId::ReverbDelayMs), 120.0);
        assert_eq!(store.get(ParamId::EqLowDb), 10.0);
    }

    #[test]
    fn cells_are_independent() {
        let store = ParameterStore::new();
        store.set(ParamId::ReverbWet, 0.1);
        store.set(ParamId::EqHighDb, -3.5);
        assert_eq!(store.get(ParamId::ReverbWet), 0.1);
        assert_eq!(store.get(ParamId::EqHighDb), -3.5);
        assert_eq!(store.get(ParamId::ReverbDry), 0.8);
    }

    #[test]
    fn names_round_trip() {
        for id in ParamId::ALL {
            assert_eq!(ParamId::from_name(id.name()), Some(id));
        }
        assert_eq!(ParamId::from_name("distortion_drive"), None);
    }

    #[test]
    fn default_values_lie_inside_control_ranges() {
        for id in ParamId::ALL {
            let (lo, hi) = id.control_range();
            let v = id.default_value();
            assert!(v >= lo && v <= hi, "{} default {} outside [{lo}, {hi}]", id.name(), v);
        }
    }

    #[test]
    fn last_store_wins_across_threads() {
        let store = Arc::new(ParameterStore::new());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..1000 {
                        store.set(ParamId::GainDb, -(t as f32) - i as f32 * 0.001);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        // Never a torn value: always one of the written values.
        let v = store.get(ParamId::GainDb);
        assert!(v.is_finite() && v <= 0.0 && v > -4.0);
    }

    #[test]
    fn snapshot_reads_every_cell() {
        let store = ParameterStore::new();
        let snap = store.snapshot();
        assert_eq!(snap.reverb_feedback, 0.25);
        assert_eq!(snap.dc_blocker_cutoff_hz, 10.0);
    }

    #[test]
    fn now_playing_updates() {
        let np = NowPlaying::new();
        assert_eq!(np.get(), "");
        np.set("Track 1");
        assert_eq!(np.get(), "Track 1");
    }
}
