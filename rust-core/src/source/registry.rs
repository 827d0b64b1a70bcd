//! Name-based lookup of source drivers

use super::{FileDriver, SignalSource, SoundcardDriver, SourceDriver, SourceError};
use crate::params::Params;
use tracing::{debug, info};

/// Explicit collection of source drivers, looked up by name
#[derive(Default)]
pub struct SourceRegistry {
    drivers: Vec<Box<dyn SourceDriver>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `file` and `soundcard` drivers
    pub fn with_builtin_sources() -> Self {
        let mut registry = Self::new();
        // Names are distinct, registration cannot collide
        let _ = registry.register(Box::new(FileDriver));
        let _ = registry.register(Box::new(SoundcardDriver));
        registry
    }

    /// Add a driver. Names must be unique.
    pub fn register(&mut self, driver: Box<dyn SourceDriver>) -> Result<(), SourceError> {
        if self.lookup(driver.name()).is_some() {
            return Err(SourceError::AlreadyRegistered(driver.name().to_string()));
        }

        debug!("registered source driver `{}'", driver.name());
        self.drivers.push(driver);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn SourceDriver> {
        self.drivers
            .iter()
            .find(|d| d.name() == name)
            .map(|d| d.as_ref())
    }

    /// Registered driver names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    /// Resolve `name` and open a source with `params`
    pub fn open(&self, name: &str, params: &Params) -> Result<Box<dyn SignalSource>, SourceError> {
        let driver = self
            .lookup(name)
            .ok_or_else(|| SourceError::UnknownSource(name.to_string()))?;

        let source = driver.open(params)?;
        let info = source.info();
        info!(
            "opened `{}' source: fs={} Hz, fc={} Hz",
            name, info.sample_rate, info.frequency
        );

        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::ScriptedSource;
    use num_complex::Complex;

    struct SilenceDriver;

    impl SourceDriver for SilenceDriver {
        fn name(&self) -> &str {
            "silence"
        }

        fn open(&self, params: &Params) -> Result<Box<dyn SignalSource>, SourceError> {
            let fs = params.require_parsed::<u32>("fs")?;
            Ok(Box::new(ScriptedSource::new(fs, vec![Complex::new(0.0, 0.0)])))
        }
    }

    #[test]
    fn test_builtin_sources() {
        let registry = SourceRegistry::with_builtin_sources();

        assert_eq!(registry.names(), vec!["file", "soundcard"]);
        assert!(registry.lookup("file").is_some());
        assert!(registry.lookup("bladerf").is_none());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = SourceRegistry::new();
        registry.register(Box::new(SilenceDriver)).unwrap();

        let err = registry.register(Box::new(SilenceDriver)).unwrap_err();
        assert!(matches!(err, SourceError::AlreadyRegistered(name) if name == "silence"));
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn test_open_by_name() {
        let mut registry = SourceRegistry::new();
        registry.register(Box::new(SilenceDriver)).unwrap();

        let params = Params::parse("fs=8000").unwrap();
        let source = registry.open("silence", &params).unwrap();
        assert_eq!(source.info().sample_rate, 8000);

        let err = registry.open("bladerf", &params).err().unwrap();
        assert!(matches!(err, SourceError::UnknownSource(_)));

        let err = registry.open("silence", &Params::new()).err().unwrap();
        assert!(matches!(err, SourceError::Param(_)));
    }
}
