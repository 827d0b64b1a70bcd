//! Averaged power spectra with FFT

pub mod accumulator;
pub mod export;
pub mod fft;

pub use accumulator::{
    AcquireError, AcquireOutcome, ConstructionError, Spectrogram, SpectrogramConfig, SpectrumRange,
};
pub use export::{export_path, ExportError};
pub use fft::FftEngine;
