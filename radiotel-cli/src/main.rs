mod progress;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use radiotel::capture::{run_capture, CaptureConfig, CaptureEnd, SnapshotDir};
use radiotel::source::soundcard::list_input_devices;
use radiotel::{Params, SourceRegistry, Spectrogram, SpectrogramConfig};
use tracing::{error, info, warn};

use crate::progress::CliListener;

#[derive(Parser)]
#[command(
    name = "radiotel",
    about = "Integrate the power spectrum of an IQ stream and snapshot it periodically"
)]
struct Cli {
    /// Source type (file, soundcard)
    #[arg(required_unless_present = "list_devices")]
    source: Option<String>,

    /// Source parameters, e.g. "path=iq.raw,fs=250000,fc=1420405752"
    #[arg(default_value = "")]
    params: String,

    /// FFT size
    #[arg(short, long, default_value_t = SpectrogramConfig::default().bins)]
    bins: usize,

    /// Averaging time per snapshot in seconds
    #[arg(short, long, default_value_t = SpectrogramConfig::default().avg_time)]
    avg_time: f64,

    /// Directory receiving one capture-NNN directory per run
    #[arg(short = 'd', long, default_value = "snapshots")]
    snapshot_dir: PathBuf,

    /// Stop after this many snapshots
    #[arg(short, long)]
    cycles: Option<u64>,

    /// List sound card input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn list_devices() -> Result<()> {
    let devices = list_input_devices().context("Failed to list input devices")?;
    for device in devices {
        println!(
            "{} ({} Hz, {} channels)",
            device.name, device.sample_rate, device.channels
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_devices {
        list_devices()?;
        return Ok(ExitCode::SUCCESS);
    }

    let source_name = cli.source.as_deref().unwrap_or_default();
    let registry = SourceRegistry::with_builtin_sources();

    let params = Params::parse(&cli.params).context("Failed to parse source parameters")?;
    let source = registry
        .open(source_name, &params)
        .with_context(|| format!("Failed to open `{}' source", source_name))?;

    let capture = CaptureConfig {
        max_cycles: cli.cycles,
        ..CaptureConfig::default()
    };
    let dir = SnapshotDir::create(&cli.snapshot_dir)
        .context("Failed to init capture directory")?;
    info!("saving snapshots under {}", dir.path().display());

    let mut spect = Spectrogram::new(
        source,
        SpectrogramConfig {
            bins: cli.bins,
            avg_time: cli.avg_time,
        },
    )
    .context("Failed to create spectrogram")?;

    let mut listener = CliListener::new();
    let summary = run_capture(&mut spect, &dir.data_prefix(), &capture, &mut listener);
    listener.finish();

    if summary.failed_exports > 0 {
        warn!("{} snapshots could not be saved", summary.failed_exports);
    }

    match summary.end {
        CaptureEnd::CycleLimit | CaptureEnd::EndOfStream => {
            info!("RX finished: {} snapshots", summary.cycles);
            Ok(ExitCode::SUCCESS)
        }
        CaptureEnd::Source(e) => {
            error!("RX stopped: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
