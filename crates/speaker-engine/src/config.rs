use crate::error::{EngineError, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub block_frames: usize,             // ingestion/processing block
    pub output_frames: Option<u32>,      // frames per device callback (if backend supports)
    pub buffer_seconds: f32,             // ring buffer length
    pub max_delay_ms: f32,               // reverb line size
    pub backoff: Duration,               // sleep while the ring is full
    pub output_name: Option<String>,     // match by substring (case-insensitive)
    pub output_index: Option<usize>,     // explicit index from device list
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            block_frames: 1024,
            output_frames: Some(512),
            buffer_seconds: 0.2,
            max_delay_ms: 2000.0,
            backoff: Duration::from_micros(200),
            output_name: None,
            output_index: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(EngineError::Config("sample rate must be positive".into()));
        }
        if self.channels == 0 || self.channels as usize > crate::dsp::effect::MAX_CHANNELS {
            return Err(EngineError::Config(format!(
                "channels must be 1 or 2, got {}",
                self.channels
            )));
        }
        if self.block_frames == 0 {
            return Err(EngineError::Config("block size must be positive".into()));
        }
        if self.output_frames == Some(0) {
            return Err(EngineError::Config("output block size must be positive".into()));
        }
        if !(self.max_delay_ms.is_finite() && self.max_delay_ms >= 0.0) {
            return Err(EngineError::Config("max delay must be a non-negative number".into()));
        }
        if self.ring_capacity() == 0 {
            return Err(EngineError::Config("ring buffer would hold no samples".into()));
        }
        Ok(())
    }

    /// Ring size in samples: `sample_rate * channels * buffer_seconds`.
    pub fn ring_capacity(&self) -> usize {
        let seconds = if self.buffer_seconds.is_finite() { self.buffer_seconds.max(0.0) } else { 0.0 };
        (self.sample_rate as f64 * self.channels as f64 * seconds as f64) as usize
    }

    /// Samples per ingestion block.
    pub fn block_samples(&self) -> usize {
        self.block_frames * self.channels as usize
    }
}
