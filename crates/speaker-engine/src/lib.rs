//! Real-time PCM effect pipeline: ingestion -> effect chain -> SPSC ring ->
//! audio output, with effect parameters retunable from other threads.

pub mod config;
pub mod devices;
pub mod dsp;
pub mod error;
pub mod graph;
pub mod output;
pub mod params;
pub mod pcm;
pub mod processor;
pub mod ring;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use graph::EffectChain;
pub use output::{fill_from_ring, wait_for_drain, OutputStream};
pub use params::{NowPlaying, ParamId, ParamSnapshot, ParameterStore};
pub use pcm::PcmReader;
pub use processor::{build_default_chain, ProcessStats, Processor};
pub use ring::SampleRingBuffer;
