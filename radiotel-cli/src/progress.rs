use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use radiotel::capture::{CaptureListener, CaptureStatus};

const PROGRESS_STEPS: u64 = 1000;

/// Shown when the spectrum has no finite dB range
const FALLBACK_DB_RANGE: (f64, f64) = (-60.0, 0.0);

/// Progress bar over the current integration cycle, plus a summary line per
/// finished cycle.
pub struct CliListener {
    pb: ProgressBar,
}

impl CliListener {
    pub fn new() -> Self {
        let pb = ProgressBar::new(PROGRESS_STEPS);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.red} Integrating [{bar:40.red/black}] {percent:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Default for CliListener {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureListener for CliListener {
    fn on_progress(&mut self, status: &CaptureStatus) {
        let position = (status.progress.clamp(0.0, 1.0) * PROGRESS_STEPS as f64) as u64;
        self.pb.set_position(position);
        self.pb.set_message(format!(
            "snapshot {} | {:.1} s | frame {}/{}",
            status.reset_count, status.integration_time, status.frame_count, status.frames
        ));
    }

    fn on_cycle(&mut self, status: &CaptureStatus, snapshot: Option<&Path>) {
        let (min, max) = status.db_range.unwrap_or(FALLBACK_DB_RANGE);
        let db = format!("{:+5.1} dB to {:+5.1} dB ({:+5.1} dB)", min, max, max - min);

        let r = &status.range;
        self.pb.println(format!(
            "Snapshot {:05}: dB range {} -- frequency range {} MHz to {} MHz ({} MHz) -- {}",
            status.reset_count,
            db,
            r.f_lo * 1e-6,
            r.f_hi * 1e-6,
            (r.f_hi - r.f_lo) * 1e-6,
            snapshot
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "not saved".to_string()),
        ));
        self.pb.reset();
    }
}
