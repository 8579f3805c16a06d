//! NES emulator binary.
//!
//! Runs a cartridge as fast as the host allows and prints the achieved
//! clock rate once per emulated second.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use emu_nes::{FrameCapture, NTSC_CLOCK, TraceTarget, save_png, trace_callbacks};
use emu_pacer::{
    CancelToken, MonotonicClock, PacingDriver, StdoutTelemetry, Telemetry, TelemetryFormat,
    TelemetrySink,
};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    /// `Clock=<hz>Hz (<percent>% speed)`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl From<Format> for TelemetryFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => Self::Text,
            Format::Json => Self::Json,
        }
    }
}

/// Run an NES cartridge flat out and report emulation speed.
#[derive(Parser, Debug)]
#[command(name = "emu-nes", version)]
#[command(about = "Run an NES cartridge and report emulation speed", long_about = None)]
struct Cli {
    /// iNES ROM file (.nes)
    #[arg(short, long)]
    rom: PathBuf,

    /// Stop after this many one-second epochs [default: run forever]
    #[arg(short, long)]
    epochs: Option<u64>,

    /// Telemetry line format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Save the last presented frame as PNG when the run stops
    #[arg(short, long)]
    screenshot: Option<PathBuf>,

    /// Log per-step state at trace level (RUST_LOG=emu_nes=trace)
    #[arg(short, long, value_enum)]
    trace: Vec<TraceTarget>,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let rom = match fs::read(&cli.rom) {
        Ok(data) => data,
        Err(e) => {
            error!("failed to read ROM file {}: {e}", cli.rom.display());
            process::exit(1);
        }
    };
    info!("loaded {}", cli.rom.display());

    let cancel = CancelToken::new();
    if cli.epochs == Some(0) {
        cancel.cancel();
    }

    let telemetry = {
        let mut stdout = StdoutTelemetry::new(cli.format.into());
        let limit = cli.epochs;
        let cancel = cancel.clone();
        let mut epochs = 0u64;
        move |sample: &Telemetry| {
            stdout.emit(sample);
            epochs += 1;
            if limit.is_some_and(|limit| epochs >= limit) {
                cancel.cancel();
            }
        }
    };
    let mut driver = PacingDriver::with_parts(NTSC_CLOCK, MonotonicClock::new(), telemetry);

    let capture = FrameCapture::new();
    let result = emu_nes::run(
        &mut driver,
        &rom,
        capture.clone(),
        trace_callbacks(&cli.trace),
        &cancel,
    );

    if let Some(path) = cli.screenshot.as_deref() {
        match capture.latest() {
            Some(frame) => match save_png(&frame, path) {
                Ok(()) => info!("screenshot saved to {}", path.display()),
                Err(e) => {
                    error!("{e}");
                    process::exit(1);
                }
            },
            None => warn!("no frame was presented; screenshot not saved"),
        }
    }

    match result {
        Ok(epochs) => info!("stopped after {epochs} epochs, {} frames", capture.presented()),
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            process::exit(1);
        }
    }
}
