//! Source parameters
//!
//! Ordered `name=value` store used to configure signal sources at open time

use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Malformed parameter `{0}': expected name=value")]
    Malformed(String),

    #[error("`{0}' not set")]
    Missing(String),

    #[error("Invalid value for `{name}': {value}")]
    Invalid { name: String, value: String },
}

/// Ordered mapping from parameter names to opaque string values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `name=value,name=value` string
    ///
    /// Any segment without `=` fails the whole parse. An empty string and a
    /// trailing comma are accepted.
    pub fn parse(input: &str) -> Result<Self, ParamError> {
        let mut params = Self::new();
        params.merge(input)?;
        Ok(params)
    }

    /// Parse `input` into this store, replacing values of keys already present
    pub fn merge(&mut self, input: &str) -> Result<(), ParamError> {
        if input.is_empty() {
            return Ok(());
        }

        let body = input.strip_suffix(',').unwrap_or(input);

        for pair in body.split(',') {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| ParamError::Malformed(pair.to_string()))?;
            self.set(name, value);
        }

        Ok(())
    }

    /// Set a parameter. An existing key keeps its position.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove a parameter, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, name: &str) -> Result<&str, ParamError> {
        self.get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    /// Parse an optional parameter with `FromStr`
    pub fn get_parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, ParamError> {
        match self.get(name) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| invalid(name, value)),
            None => Ok(None),
        }
    }

    /// Parse a mandatory parameter with `FromStr`
    pub fn require_parsed<T: FromStr>(&self, name: &str) -> Result<T, ParamError> {
        self.get_parsed(name)?
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    /// Parse an optional integer accepting decimal, `0x` hex and leading-zero octal
    pub fn get_integer(&self, name: &str) -> Result<Option<i64>, ParamError> {
        match self.get(name) {
            Some(value) => parse_c_integer(value)
                .map(Some)
                .ok_or_else(|| invalid(name, value)),
            None => Ok(None),
        }
    }

    /// Parse an optional boolean (`1/0`, `true/false`, `yes/no`, `on/off`)
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, ParamError> {
        match self.get(name) {
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(invalid(name, value)),
            },
            None => Ok(None),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for Params {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn invalid(name: &str, value: &str) -> ParamError {
    ParamError::Invalid {
        name: name.to_string(),
        value: value.to_string(),
    }
}

/// Integer literal with optional sign and C-style radix prefix
fn parse_c_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    let (negative, digits) = match value.as_bytes().first()? {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs_in_order() {
        let params = Params::parse("path=/tmp/iq.raw,fs=250000,fc=1420405752").unwrap();

        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["path", "fs", "fc"]);
        assert_eq!(params.get("fs"), Some("250000"));
        assert_eq!(params.get("lna"), None);
    }

    #[test]
    fn test_parse_rejects_missing_equals() {
        let err = Params::parse("fs=8000,device").unwrap_err();
        assert_eq!(err, ParamError::Malformed("device".to_string()));

        assert!(Params::parse("fs=8000,,fc=0").is_err());
    }

    #[test]
    fn test_parse_edge_cases() {
        assert!(Params::parse("").unwrap().is_empty());

        // Trailing comma is tolerated
        let params = Params::parse("fs=8000,").unwrap();
        assert_eq!(params.len(), 1);

        // Only the first '=' separates name and value
        let params = Params::parse("path=a=b.raw,serial=").unwrap();
        assert_eq!(params.get("path"), Some("a=b.raw"));
        assert_eq!(params.get("serial"), Some(""));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = Params::parse("fs=8000,fc=100").unwrap();
        params.merge("fs=16000").unwrap();

        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(pairs, vec![("fs", "16000"), ("fc", "100")]);

        assert_eq!(params.remove("fs"), Some("16000".to_string()));
        assert_eq!(params.remove("fs"), None);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_typed_getters() {
        let params = Params::parse("fs=48000,fc=0x10,oct=017,neg=-5,dc=yes,bad=12k").unwrap();

        assert_eq!(params.require_parsed::<u32>("fs").unwrap(), 48000);
        assert_eq!(params.get_integer("fc").unwrap(), Some(16));
        assert_eq!(params.get_integer("oct").unwrap(), Some(15));
        assert_eq!(params.get_integer("neg").unwrap(), Some(-5));
        assert_eq!(params.get_bool("dc").unwrap(), Some(true));
        assert_eq!(params.get_integer("missing").unwrap(), None);

        assert!(params.get_parsed::<u32>("bad").is_err());
        assert!(params.get_integer("bad").is_err());
        assert_eq!(
            params.require_parsed::<u32>("path").unwrap_err(),
            ParamError::Missing("path".to_string())
        );
    }
}
