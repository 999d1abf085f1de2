//! Output driver adapter: the hard-real-time side. The device callback only
//! pops from the ring and substitutes silence on underrun; it never blocks,
//! allocates or logs.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ring::SampleRingBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fill `out` from the ring, writing 0.0 for every sample that is not there.
/// Returns how many samples were substituted.
pub fn fill_from_ring(ring: &SampleRingBuffer, out: &mut [f32]) -> usize {
    fill_typed(ring, out)
}

#[inline]
fn fill_typed<T: Sample + FromSample<f32>>(ring: &SampleRingBuffer, out: &mut [T]) -> usize {
    let mut missed = 0;
    for o in out.iter_mut() {
        let v = match ring.pop() {
            Some(s) => s,
            None => {
                missed += 1;
                0.0 // underrun => silence
            }
        };
        *o = T::from_sample(v);
    }
    missed
}

/// Poll until the ring is empty or `timeout` passes. Returns true if drained.
pub fn wait_for_drain(ring: &SampleRingBuffer, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !ring.is_empty() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    true
}

/// A playing cpal output stream fed from a [`SampleRingBuffer`].
pub struct OutputStream {
    stream: Option<cpal::Stream>,
    underruns: Arc<AtomicU64>,
    device_name: String,
}

impl OutputStream {
    /// Open the configured device and start pulling from `ring`.
    pub fn start(ring: Arc<SampleRingBuffer>, cfg: &EngineConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = pick_output_device(&host, cfg.output_name.as_deref(), cfg.output_index)?
            .ok_or(EngineError::NoOutputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());

        let supported = device
            .default_output_config()
            .map_err(|e| EngineError::DeviceConfig(e.to_string()))?;

        let stream_cfg = cpal::StreamConfig {
            channels: cfg.channels,
            sample_rate: cpal::SampleRate(cfg.sample_rate),
            buffer_size: match cfg.output_frames {
                Some(n) => cpal::BufferSize::Fixed(n),
                None => cpal::BufferSize::Default,
            },
        };

        let underruns = Arc::new(AtomicU64::new(0));
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build::<f32>(&device, &stream_cfg, ring, underruns.clone())?,
            cpal::SampleFormat::I16 => build::<i16>(&device, &stream_cfg, ring, underruns.clone())?,
            cpal::SampleFormat::U16 => build::<u16>(&device, &stream_cfg, ring, underruns.clone())?,
            other => return Err(EngineError::UnsupportedFormat(format!("{other:?}"))),
        };
        stream.play().map_err(|e| EngineError::StreamPlay(e.to_string()))?;

        log::info!(
            "output: '{}' {} Hz, {} ch, {} ({:?})",
            device_name,
            cfg.sample_rate,
            cfg.channels,
            match cfg.output_frames {
                Some(n) => format!("{n} frames/callback"),
                None => "default buffer".to_string(),
            },
            supported.sample_format()
        );

        Ok(Self { stream: Some(stream), underruns, device_name })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Samples substituted with silence so far.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            log::info!("output stopped ({} underrun samples)", self.underruns());
        }
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<SampleRingBuffer>,
    underruns: Arc<AtomicU64>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    device
        .build_output_stream::<T, _, _>(
            config,
            move |out: &mut [T], _: &cpal::OutputCallbackInfo| {
                let missed = fill_typed(&ring, out);
                if missed > 0 {
                    underruns.fetch_add(missed as u64, Ordering::Relaxed);
                }
            },
            move |err| log::error!("output stream error: {err}"),
            None,
        )
        .map_err(|e| EngineError::StreamBuild(e.to_string()))
}

/* ---------- device picking (by name or index) ---------- */

fn pick_output_device(
    host: &cpal::Host,
    name_substr: Option<&str>,
    index: Option<usize>,
) -> Result<Option<cpal::Device>> {
    let devices = || host.output_devices().map_err(|e| EngineError::DeviceConfig(e.to_string()));

    // Try explicit index first
    if let Some(idx) = index {
        if let Some(dev) = devices()?.nth(idx) {
            return Ok(Some(dev));
        }
        log::warn!("no output device at index {idx}, falling back");
    }

    // Then try substring match
    if let Some(q) = name_substr {
        let qn = q.to_lowercase();
        for dev in devices()? {
            let name = dev.name().unwrap_or_default();
            if name.to_lowercase().contains(&qn) {
                return Ok(Some(dev));
            }
        }
        log::warn!("no output device matching '{q}', falling back to default");
    }

    Ok(host.default_output_device())
}
