//! Engine configuration that hosting layers can serialize/deserialize.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a derived source may stay without listeners before the
    /// sweeper destroys it.
    pub sweep_grace_ms: u64,

    /// Period of the background sweeper.
    pub sweep_interval_ms: u64,

    /// Window size given to viewports that do not request one.
    pub default_viewport_size: usize,

    /// Upper bound for any requested window size.
    pub max_viewport_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweep_grace_ms: 30_000,
            sweep_interval_ms: 5_000,
            default_viewport_size: 50,
            max_viewport_size: 10_000,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            return Err(Error::config("sweep_interval_ms must be positive"));
        }
        if self.default_viewport_size == 0 {
            return Err(Error::config("default_viewport_size must be positive"));
        }
        if self.default_viewport_size > self.max_viewport_size {
            return Err(Error::config(format!(
                "default_viewport_size {} exceeds max_viewport_size {}",
                self.default_viewport_size, self.max_viewport_size
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn sweep_grace(&self) -> Duration {
        Duration::from_millis(self.sweep_grace_ms)
    }

    #[inline]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Clamps a requested window size into `1..=max_viewport_size`.
    pub fn clamp_viewport_size(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_viewport_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json_str(r#"{"sweep_grace_ms": 10}"#).unwrap();
        assert_eq!(config.sweep_grace(), Duration::from_millis(10));
        assert_eq!(config.default_viewport_size, 50);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(EngineConfig::from_json_str(r#"{"sweep_interval_ms": 0}"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{"default_viewport_size": 20, "max_viewport_size": 10}"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_clamp_viewport_size() {
        let config = EngineConfig::default();
        assert_eq!(config.clamp_viewport_size(0), 1);
        assert_eq!(config.clamp_viewport_size(25), 25);
        assert_eq!(config.clamp_viewport_size(1_000_000), 10_000);
    }
}
