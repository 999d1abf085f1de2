use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use speaker_control::{ControlConfig, ControlServer, ControlState};
use speaker_engine::{
    build_default_chain, wait_for_drain, EngineConfig, NowPlaying, OutputStream, ParameterStore,
    PcmReader, Processor, SampleRingBuffer,
};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name="speaker", version, about="Stream raw PCM through an effect chain to the sound card")]
struct Cli {
    #[command(subcommand)]
    cmd: Command
}

#[derive(Subcommand)]
enum Command {
    /// List output devices
    Devices,
    /// Play interleaved s16le PCM from stdin (or a file)
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Input file; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,
    /// 1 (mono) or 2 (stereo)
    #[arg(long, default_value_t = 2)]
    channels: u16,
    /// Frames per processing block
    #[arg(long, default_value_t = 1024)]
    block_frames: usize,
    /// Frames per device callback; 0 lets the backend choose
    #[arg(long, default_value_t = 512)]
    output_frames: u32,
    /// Ring buffer length in seconds
    #[arg(long, default_value_t = 0.2)]
    buffer_seconds: f32,
    /// Output device name (case-insensitive substring)
    #[arg(long)]
    device: Option<String>,
    /// Output device index from `speaker devices`
    #[arg(long)]
    device_index: Option<usize>,
    /// Control server address
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: String,
    /// Do not start the control server
    #[arg(long)]
    no_control: bool,
}

impl RunArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            block_frames: self.block_frames,
            output_frames: (self.output_frames > 0).then_some(self.output_frames),
            buffer_seconds: self.buffer_seconds,
            output_name: self.device.clone(),
            output_index: self.device_index,
            ..Default::default()
        }
    }
}

/// `[timestamp LEVEL module] message`, Info unless RUST_LOG says otherwise.
fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {:5} {}] {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        })
        .init();
}

/// Ask the processing loop to stop; teardown then runs as on end-of-input.
/// A second interrupt while stopping exits immediately.
fn request_shutdown(flag: &AtomicBool) {
    if flag.swap(true, Ordering::Relaxed) {
        log::warn!("second interrupt, exiting without teardown");
        std::process::exit(130);
    }
    log::info!("interrupt received, stopping");
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Devices => speaker_engine::devices::print_devices(),
        Command::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let cfg = args.engine_config();
    cfg.validate()?;

    let params = Arc::new(ParameterStore::new());
    let now_playing = Arc::new(NowPlaying::new());
    let ring = Arc::new(SampleRingBuffer::with_capacity(cfg.ring_capacity()));

    let mut control = if args.no_control {
        None
    } else {
        let ccfg = ControlConfig { listen: args.listen.clone(), ..Default::default() };
        let state = ControlState::new(params.clone(), now_playing.clone());
        Some(ControlServer::start(ccfg, state).context("Failed to start control server")?)
    };

    let mut output = OutputStream::start(ring.clone(), &cfg).context("Failed to open audio output")?;

    let input: Box<dyn Read + Send> = match &args.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(std::io::stdin()),
    };
    let mut reader = PcmReader::new(input, cfg.channels as usize, cfg.block_samples());
    let mut processor = Processor::new(&cfg, build_default_chain(&cfg), params, ring.clone());
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || request_shutdown(&shutdown))
            .context("Failed to install Ctrl-C handler")?;
    }

    let result = std::thread::scope(|s| {
        let worker = std::thread::Builder::new()
            .name("processing".into())
            .spawn_scoped(s, || processor.run(&mut reader, &shutdown))
            .context("Failed to spawn processing thread")?;

        let mut ticks = 0u32;
        while !worker.is_finished() {
            std::thread::sleep(Duration::from_millis(100));
            ticks += 1;
            if ticks % 50 == 0 {
                log::debug!(
                    "ring {}/{} samples, {} underrun samples",
                    ring.occupancy(),
                    ring.capacity(),
                    output.underruns()
                );
            }
        }
        match worker.join() {
            Ok(r) => r.map_err(anyhow::Error::from),
            Err(_) => Err(anyhow::anyhow!("processing thread panicked")),
        }
    });

    if result.is_ok() {
        // Let queued audio play out before closing the device.
        let grace = Duration::from_secs_f32(cfg.buffer_seconds.max(0.0) + 1.0);
        if !wait_for_drain(&ring, grace) {
            log::warn!("output did not drain, dropping {} samples", ring.occupancy());
        }
    }
    output.stop();
    if let Some(control) = control.as_mut() {
        control.stop();
    }

    let stats = result.context("Processing failed")?;
    log::info!(
        "done: {} blocks, {} samples, {} backoff waits, {} underrun samples",
        stats.blocks,
        stats.samples,
        stats.backoff_waits,
        output.underruns()
    );
    Ok(())
}
