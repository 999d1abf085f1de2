pub mod dc_blocker;
pub mod distortion;
pub mod effect;
pub mod eq;
pub mod gain;
pub mod reverb;

pub use self::dc_blocker::DcBlocker;
pub use self::distortion::Distortion;
pub use self::effect::Effect;
pub use self::eq::{Biquad, Equalizer3Band};
pub use self::gain::Gain;
pub use self::reverb::{Reverb, ReverbParams};
