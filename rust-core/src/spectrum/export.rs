//! Plain-text snapshot of an averaged spectrum
//!
//! Writes a MATLAB/Octave script assigning a column vector:
//!
//! ```text
//! spectrum = [
//! 1.234567890e-03;
//! 9.876543210e-04
//! ];
//! ```

use super::accumulator::Spectrogram;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No frames have been accumulated yet")]
    NoFrames,

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Destination of the snapshot for cycle `reset_count`: `<prefix>_<NNNNN>.m`
pub fn export_path(prefix: impl AsRef<Path>, reset_count: u64) -> PathBuf {
    let mut name = prefix.as_ref().as_os_str().to_owned();
    name.push(format!("_{:05}.m", reset_count));
    PathBuf::from(name)
}

/// Format like C's `%.9e`: nine decimals, signed exponent of at least two digits
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.9e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
        }
        None => formatted,
    }
}

impl<S> Spectrogram<S> {
    /// Write the averaged spectrum as a MATLAB vector literal
    pub fn write_matlab<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "spectrum = [")?;

        for (i, value) in self.averaged_iter().enumerate() {
            let separator = if i == 0 { "" } else { ";" };
            write!(out, "{}\n{}", separator, format_scientific(value))?;
        }

        write!(out, "\n];")?;
        out.flush()
    }

    /// Export the averaged spectrum to `<prefix>_<reset_count>.m`
    ///
    /// Successive cycles land in distinct files. Failure leaves the
    /// spectrogram untouched.
    pub fn export_matlab(&self, prefix: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        if self.frame_count() == 0 {
            return Err(ExportError::NoFrames);
        }

        let path = export_path(prefix, self.reset_count());
        let io_err = |source| ExportError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_err)?;
        self.write_matlab(BufWriter::new(file)).map_err(io_err)?;

        info!("saved spectrum snapshot to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::ScriptedSource;
    use crate::spectrum::SpectrogramConfig;
    use num_complex::Complex;

    fn dc_spectrogram() -> Spectrogram<ScriptedSource> {
        let source = ScriptedSource::new(8000, vec![Complex::new(1.0, 0.0); 4]);
        Spectrogram::new(
            source,
            SpectrogramConfig {
                bins: 4,
                avg_time: 0.001,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_export_path() {
        assert_eq!(
            export_path("snapshots/capture-000/data", 7),
            PathBuf::from("snapshots/capture-000/data_00007.m")
        );
        assert_eq!(export_path("x", 123456), PathBuf::from("x_123456.m"));
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_scientific(1.0), "1.000000000e+00");
        assert_eq!(format_scientific(0.00123), "1.230000000e-03");
        assert_eq!(format_scientific(-2.5e120), "-2.500000000e+120");
        assert_eq!(format_scientific(0.0), "0.000000000e+00");
        assert_eq!(format_scientific(f64::NAN), "nan");
        assert_eq!(format_scientific(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_write_layout() {
        let mut spect = dc_spectrogram();
        // First of two frames
        spect.acquire().unwrap();

        let mut out = Vec::new();
        spect.write_matlab(&mut out).unwrap();

        // DC of four unit samples: |4|^2 / 4 = 4
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "spectrum = [\n4.000000000e+00;\n0.000000000e+00;\n0.000000000e+00;\n0.000000000e+00\n];"
        );
    }

    #[test]
    fn test_export_requires_frames() {
        let spect = dc_spectrogram();
        let prefix = std::env::temp_dir().join("radiotel-no-frames");

        assert!(matches!(spect.export_matlab(&prefix), Err(ExportError::NoFrames)));
        assert!(!export_path(&prefix, 0).exists());
    }

    #[test]
    fn test_export_io_error() {
        let mut spect = dc_spectrogram();
        spect.acquire().unwrap();

        let err = spect
            .export_matlab("/nonexistent-dir/radiotel/data")
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert_eq!(spect.frame_count(), 1);
    }
}
