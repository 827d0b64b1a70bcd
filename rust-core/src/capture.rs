//! Capture loop: integrate a cycle, snapshot it, start over
//!
//! Keeps the hot loop in Rust; front ends only observe it through a
//! [`CaptureListener`].

use crate::source::{SignalSource, SourceError};
use crate::spectrum::{AcquireError, Spectrogram, SpectrumRange};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Capture loop configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Minimum time between progress notifications
    pub progress_interval: Duration,

    /// Stop after this many completed cycles (run until the source ends if `None`)
    pub max_cycles: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(1),
            max_cycles: None,
        }
    }
}

/// Per-run snapshot directory, `<root>/capture-NNN`
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    dir: PathBuf,
}

impl SnapshotDir {
    /// Create the first unused `capture-NNN` directory under `root`
    pub fn create(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        for i in 0u32.. {
            let dir = root.join(format!("capture-{:03}", i));
            match std::fs::create_dir(&dir) {
                Ok(()) => {
                    debug!("snapshot directory {}", dir.display());
                    return Ok(Self { dir });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::Other,
            "no free capture directory name",
        ))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Prefix handed to the spectrum export
    pub fn data_prefix(&self) -> PathBuf {
        self.dir.join("data")
    }
}

/// Snapshot of the spectrogram state handed to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureStatus {
    pub reset_count: u64,
    pub frame_count: u64,
    pub frames: u64,
    pub progress: f64,
    pub integration_time: f64,
    pub range: SpectrumRange,
    pub db_range: Option<(f64, f64)>,
}

impl CaptureStatus {
    pub fn from_spectrogram<S>(spect: &Spectrogram<S>) -> Self {
        Self {
            reset_count: spect.reset_count(),
            frame_count: spect.frame_count(),
            frames: spect.frames(),
            progress: spect.progress(),
            integration_time: spect.integration_time(),
            range: spect.range(),
            db_range: spect.db_range(),
        }
    }
}

/// Observer of the capture loop
pub trait CaptureListener {
    /// Called periodically while a cycle accumulates, once a frame exists
    fn on_progress(&mut self, _status: &CaptureStatus) {}

    /// Called when a cycle completes, with the snapshot path if export worked
    fn on_cycle(&mut self, _status: &CaptureStatus, _snapshot: Option<&Path>) {}
}

/// Listener that ignores every event
pub struct NullListener;

impl CaptureListener for NullListener {}

/// Why the capture loop stopped
#[derive(Debug)]
pub enum CaptureEnd {
    /// `max_cycles` cycles were completed
    CycleLimit,
    /// The source ran out of samples
    EndOfStream,
    /// The source failed
    Source(SourceError),
}

/// Outcome of [`run_capture`]
#[derive(Debug)]
pub struct CaptureSummary {
    /// Completed cycles
    pub cycles: u64,
    /// Cycles whose snapshot could not be written
    pub failed_exports: u64,
    pub end: CaptureEnd,
}

/// Integrate cycles until the source stops or the cycle limit is reached
///
/// Each completed cycle is exported under `prefix` and the spectrogram is
/// reset. Export failures are logged and do not stop the loop.
pub fn run_capture<S: SignalSource>(
    spect: &mut Spectrogram<S>,
    prefix: &Path,
    config: &CaptureConfig,
    listener: &mut dyn CaptureListener,
) -> CaptureSummary {
    let mut cycles = 0;
    let mut failed_exports = 0;

    let end = loop {
        if config.max_cycles.is_some_and(|max| cycles >= max) {
            break CaptureEnd::CycleLimit;
        }

        let mut last_report = Instant::now();

        let failure = loop {
            if spect.is_complete() {
                break None;
            }

            if let Err(e) = spect.acquire() {
                break Some(e);
            }

            if last_report.elapsed() >= config.progress_interval && spect.frame_count() > 0 {
                listener.on_progress(&CaptureStatus::from_spectrogram(spect));
                last_report = Instant::now();
            }
        };

        match failure {
            Some(AcquireError::EndOfStream) => break CaptureEnd::EndOfStream,
            Some(AcquireError::Source(e)) => break CaptureEnd::Source(e),
            None => {}
        }

        let status = CaptureStatus::from_spectrogram(spect);
        listener.on_progress(&status);

        let snapshot = match spect.export_matlab(prefix) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("failed to save spectrum snapshot: {}", e);
                failed_exports += 1;
                None
            }
        };
        listener.on_cycle(&status, snapshot.as_deref());

        cycles += 1;
        spect.reset();
    };

    info!("capture finished after {} cycles", cycles);

    CaptureSummary {
        cycles,
        failed_exports,
        end,
    }
}
