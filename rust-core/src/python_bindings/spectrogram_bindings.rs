//! Python bindings for the spectrum integrator

use pyo3::exceptions::{PyEOFError, PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use numpy::PyArray1;
use crate::params::Params;
use crate::source::{SignalSource, SourceRegistry};
use crate::spectrum::{AcquireError, AcquireOutcome, Spectrogram, SpectrogramConfig};

/// Spectrum integrator exposed to Python
///
/// Owns the signal source it was opened with; the source is closed when the
/// object is garbage collected.
#[pyclass(name = "Spectrogram", unsendable)]
pub struct PySpectrogram {
    spectrogram: Spectrogram<Box<dyn SignalSource>>,
}

#[pymethods]
impl PySpectrogram {
    /// Open a source and create a spectrogram on it
    ///
    /// Args:
    ///     source: Source type ("file" or "soundcard")
    ///     params: Source parameters, e.g. "path=iq.raw,fs=250000,fc=1420405752"
    ///     bins: FFT size
    ///     avg_time: Averaging time per cycle in seconds
    #[new]
    #[pyo3(signature = (source, params, bins=2048, avg_time=60.0))]
    fn new(source: &str, params: &str, bins: usize, avg_time: f64) -> PyResult<Self> {
        let params = Params::parse(params)
            .map_err(|e| PyValueError::new_err(format!("Failed to parse source parameters: {}", e)))?;

        let source = SourceRegistry::with_builtin_sources()
            .open(source, &params)
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to open source: {}", e)))?;

        let spectrogram = Spectrogram::new(source, SpectrogramConfig { bins, avg_time })
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        Ok(Self { spectrogram })
    }

    /// Pull samples from the source
    ///
    /// Returns:
    ///     True if a full window was transformed by this call
    ///
    /// Raises:
    ///     EOFError: the source ran out of samples
    ///     IOError: the source failed
    fn acquire(&mut self) -> PyResult<bool> {
        match self.spectrogram.acquire() {
            Ok(outcome) => Ok(outcome == AcquireOutcome::FrameFolded),
            Err(AcquireError::EndOfStream) => Err(PyEOFError::new_err("end of stream")),
            Err(AcquireError::Source(e)) => Err(PyIOError::new_err(e.to_string())),
        }
    }

    /// Whether the current cycle has all its frames
    fn is_complete(&self) -> bool {
        self.spectrogram.is_complete()
    }

    /// Start a new averaging cycle
    fn reset(&mut self) {
        self.spectrogram.reset();
    }

    /// Accumulated power per bin (not divided by the frame count)
    fn cumulative<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, self.spectrogram.cumulative())
    }

    /// Averaged power per bin
    fn averaged<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_vec(py, self.spectrogram.averaged())
    }

    #[getter]
    fn frame_count(&self) -> u64 {
        self.spectrogram.frame_count()
    }

    #[getter]
    fn frames(&self) -> u64 {
        self.spectrogram.frames()
    }

    #[getter]
    fn reset_count(&self) -> u64 {
        self.spectrogram.reset_count()
    }

    #[getter]
    fn sample_rate(&self) -> u32 {
        self.spectrogram.sample_rate()
    }

    /// Fraction of the cycle acquired so far
    fn progress(&self) -> f64 {
        self.spectrogram.progress()
    }

    /// Seconds of signal integrated in this cycle
    fn integration_time(&self) -> f64 {
        self.spectrogram.integration_time()
    }

    /// Returns:
    ///     Tuple of (min, max, f_lo, f_hi)
    fn range(&self) -> (f64, f64, f64, f64) {
        let r = self.spectrogram.range();
        (r.min, r.max, r.f_lo, r.f_hi)
    }

    /// Averaged (min, max) in dB, or None before the first frame
    fn db_range(&self) -> Option<(f64, f64)> {
        self.spectrogram.db_range()
    }

    /// Write the averaged spectrum to `<prefix>_<reset_count>.m`
    ///
    /// Returns:
    ///     Path of the written file
    fn export_matlab(&self, prefix: &str) -> PyResult<String> {
        self.spectrogram
            .export_matlab(prefix)
            .map(|path| path.display().to_string())
            .map_err(|e| PyIOError::new_err(e.to_string()))
    }
}

/// Names of the available source types
#[pyfunction]
pub fn list_sources() -> Vec<String> {
    SourceRegistry::with_builtin_sources()
        .names()
        .into_iter()
        .map(String::from)
        .collect()
}
