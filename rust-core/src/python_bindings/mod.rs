//! PyO3 bindings for Python integration

use pyo3::prelude::*;

mod spectrogram_bindings;

/// Python module definition
#[pymodule]
fn radiotel(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<spectrogram_bindings::PySpectrogram>()?;
    m.add_function(wrap_pyfunction!(spectrogram_bindings::list_sources, m)?)?;

    Ok(())
}
