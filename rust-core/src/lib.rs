//! radiotel - Streaming Spectrum Integrator Core
//!
//! Averages FFT power spectra of a live or replayed IQ stream over long
//! integration windows, with optional Python bindings.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod capture;
pub mod params;
pub mod source;
pub mod spectrum;
#[cfg(feature = "python")]
pub mod python_bindings;

pub use capture::{run_capture, CaptureConfig, CaptureListener, CaptureStatus, SnapshotDir};
pub use params::Params;
pub use source::{SignalSource, SourceInfo, SourceRegistry};
pub use spectrum::{Spectrogram, SpectrogramConfig};
