use crate::config::EngineConfig;
use crate::dsp::{DcBlocker, Distortion, Equalizer3Band, Gain, Reverb};
use crate::error::Result;
use crate::graph::EffectChain;
use crate::params::{ParamId, ParameterStore};
use crate::pcm::PcmReader;
use crate::ring::SampleRingBuffer;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Gain -> EQ -> reverb -> distortion -> DC blocker.
pub fn build_default_chain(cfg: &EngineConfig) -> EffectChain {
    let sr = cfg.sample_rate as f32;
    EffectChain::new()
        .with(Gain::default())
        .with(Equalizer3Band::new(sr))
        .with(Reverb::new(sr, cfg.max_delay_ms, cfg.channels as usize))
        .with(Distortion::default())
        .with(DcBlocker::new(sr, ParamId::DcBlockerCutoffHz.default_value()))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStats {
    pub blocks: u64,
    pub samples: u64,
    /// Sleeps taken because the ring was full.
    pub backoff_waits: u64,
    /// True if the loop ended on the shutdown flag rather than end-of-input.
    pub interrupted: bool,
}

/// The non-real-time side: ingest, apply parameters, run the chain, enqueue.
pub struct Processor {
    chain: EffectChain,
    params: Arc<ParameterStore>,
    ring: Arc<SampleRingBuffer>,
    channels: usize,
    backoff: Duration,
    // Reused every block (avoid allocs)
    scratch: Vec<f32>,
}

impl Processor {
    pub fn new(
        cfg: &EngineConfig,
        chain: EffectChain,
        params: Arc<ParameterStore>,
        ring: Arc<SampleRingBuffer>,
    ) -> Self {
        Self {
            chain,
            params,
            ring,
            channels: cfg.channels.max(1) as usize,
            backoff: cfg.backoff,
            scratch: vec![0.0; cfg.block_samples()],
        }
    }

    /// Apply the current parameter values, then run the chain over `block`.
    pub fn process_block(&mut self, block: &mut [f32]) {
        self.chain.apply_params(&self.params);
        self.chain.process(block, self.channels);
    }

    /// Run until end-of-input, shutdown, or a read error.
    pub fn run<R: Read>(&mut self, reader: &mut PcmReader<R>, shutdown: &AtomicBool) -> Result<ProcessStats> {
        let mut stats = ProcessStats::default();
        let mut scratch = std::mem::take(&mut self.scratch);
        log::info!(
            "processing: {} ch, {} samples/block, chain [{}]",
            self.channels,
            scratch.len(),
            self.chain.names().collect::<Vec<_>>().join(" -> ")
        );

        let result = self.run_inner(reader, shutdown, &mut scratch, &mut stats);
        self.scratch = scratch;
        result?;

        log::info!(
            "processing stopped ({}): {} blocks, {} samples, {} backoff waits",
            if stats.interrupted { "shutdown" } else { "end of input" },
            stats.blocks,
            stats.samples,
            stats.backoff_waits
        );
        Ok(stats)
    }

    fn run_inner<R: Read>(
        &mut self,
        reader: &mut PcmReader<R>,
        shutdown: &AtomicBool,
        scratch: &mut [f32],
        stats: &mut ProcessStats,
    ) -> Result<()> {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                stats.interrupted = true;
                return Ok(());
            }
            let n = reader.read_block(scratch).map_err(|e| {
                log::error!("pcm input read failed: {e}");
                e
            })?;
            if n == 0 {
                return Ok(());
            }

            let block = &mut scratch[..n];
            self.process_block(block);
            stats.blocks += 1;

            for &s in block.iter() {
                // Backpressure: wait if buffer full
                while !self.ring.push(s) {
                    if shutdown.load(Ordering::Relaxed) {
                        stats.interrupted = true;
                        return Ok(());
                    }
                    if stats.backoff_waits == 0 {
                        log::debug!("ring buffer full, backing off");
                    }
                    stats.backoff_waits += 1;
                    std::thread::sleep(self.backoff);
                }
                stats.samples += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::io::{self, Cursor};
    use std::thread;

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn small_cfg() -> EngineConfig {
        EngineConfig {
            block_frames: 16,
            backoff: Duration::from_micros(50),
            ..Default::default()
        }
    }

    #[test]
    fn empty_chain_forwards_samples_in_order() {
        let cfg = small_cfg();
        let input: Vec<i16> = (0..500).map(|i| (i * 37 % 2000 - 1000) as i16).collect();
        let ring = Arc::new(SampleRingBuffer::with_capacity(4096));
        let mut p = Processor::new(&cfg, EffectChain::new(), Arc::new(ParameterStore::new()), ring.clone());
        let mut reader = PcmReader::new(Cursor::new(pcm(&input)), 2, cfg.block_samples());

        let stats = p.run(&mut reader, &AtomicBool::new(false)).unwrap();
        assert_eq!(stats.samples, 500);
        assert_eq!(stats.blocks, 16);
        assert!(!stats.interrupted);

        for &s in &input {
            assert_eq!(ring.pop(), Some(s as f32 / 32768.0));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn backpressure_delivers_everything() {
        let cfg = small_cfg();
        let input: Vec<i16> = (0..2000).map(|i| i as i16).collect();
        let ring = Arc::new(SampleRingBuffer::with_capacity(24));
        let consumer = {
            let ring = ring.clone();
            thread::spawn(move || {
                let mut got = Vec::with_capacity(2000);
                while got.len() < 2000 {
                    match ring.pop() {
                        Some(s) => got.push(s),
                        None => thread::sleep(Duration::from_micros(20)),
                    }
                }
                got
            })
        };

        let mut p = Processor::new(&cfg, EffectChain::new(), Arc::new(ParameterStore::new()), ring);
        let mut reader = PcmReader::new(Cursor::new(pcm(&input)), 2, cfg.block_samples());
        let stats = p.run(&mut reader, &AtomicBool::new(false)).unwrap();
        assert!(stats.backoff_waits > 0);

        let got = consumer.join().unwrap();
        let want: Vec<f32> = input.iter().map(|&s| s as f32 / 32768.0).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn shutdown_unblocks_a_full_ring() {
        let cfg = small_cfg();
        let ring = Arc::new(SampleRingBuffer::with_capacity(8));
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut p = Processor::new(&cfg, EffectChain::new(), Arc::new(ParameterStore::new()), ring.clone());

        let stopper = {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                shutdown.store(true, Ordering::Relaxed);
            })
        };
        // Nobody drains the ring; only the flag can end this.
        let mut reader = PcmReader::new(Cursor::new(vec![0u8; 1 << 16]), 2, cfg.block_samples());
        let stats = p.run(&mut reader, &shutdown).unwrap();
        stopper.join().unwrap();

        assert!(stats.interrupted);
        assert_eq!(ring.occupancy(), 8);
    }

    #[test]
    fn read_error_ends_the_loop() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
            }
        }
        let cfg = small_cfg();
        let ring = Arc::new(SampleRingBuffer::with_capacity(64));
        let mut p = Processor::new(&cfg, EffectChain::new(), Arc::new(ParameterStore::new()), ring);
        let mut reader = PcmReader::new(Broken, 2, cfg.block_samples());
        let err = p.run(&mut reader, &AtomicBool::new(false)).unwrap_err();
        assert!(matches!(err, EngineError::Ingest(_)));
    }

    #[test]
    fn store_changes_apply_on_next_block() {
        let cfg = small_cfg();
        let store = Arc::new(ParameterStore::new());
        let ring = Arc::new(SampleRingBuffer::with_capacity(64));
        let chain = EffectChain::new().with(Gain::default());
        let mut p = Processor::new(&cfg, chain, store.clone(), ring);

        let mut block = [0.5f32; 4];
        p.process_block(&mut block);
        assert_eq!(block, [0.5; 4]);

        store.set(ParamId::GainDb, 100.0);
        let mut block = [0.5f32; 4];
        p.process_block(&mut block);
        let max = 10f32.powf(12.0 / 20.0);
        assert!((block[0] - 0.5 * max).abs() < 1e-5);
    }

    #[test]
    fn default_chain_layout() {
        let chain = build_default_chain(&EngineConfig::default());
        assert_eq!(
            chain.names().collect::<Vec<_>>(),
            ["gain", "eq3band", "reverb", "distortion", "dc_blocker"]
        );
    }
}
