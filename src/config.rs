use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, WhipError};

/// Tunables for a processing run.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides:
///
/// ```
/// use whipgen::config::ProcessorConfig;
///
/// let config = ProcessorConfig::from_json(r#"{ "lengthStep": 10 }"#).unwrap();
/// assert_eq!(config.length_step, 10.0);
/// assert_eq!(config.default_whip_length, 10.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorConfig {
    /// Increment (feet) used to discretize a natural-language length range.
    pub length_step: f64,
    /// Whip length used when a description names no length at all.
    pub default_whip_length: f64,
    /// Tail length given to rows generated from a description.
    pub default_tail_length: f64,
    /// Conduit type used when neither the pattern nor the lookup row has one.
    pub default_conduit: Option<String>,
    /// Largest quantity one input may expand to. Larger requests produce a
    /// single flagged row instead.
    pub max_quantity: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            length_step: 5.0,
            default_whip_length: 10.0,
            default_tail_length: 10.0,
            default_conduit: None,
            max_quantity: 100_000,
        }
    }
}

impl ProcessorConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ProcessorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        if !(self.length_step > 0.0) {
            return Err(WhipError::Config(format!(
                "lengthStep must be positive, got {}",
                self.length_step
            )));
        }
        if self.default_whip_length < 0.0 || self.default_tail_length < 0.0 {
            return Err(WhipError::Config(
                "default lengths must not be negative".to_string(),
            ));
        }
        if self.max_quantity == 0 {
            return Err(WhipError::Config("maxQuantity must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ProcessorConfig::from_json("{}").unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }

    #[test]
    fn rejects_zero_step() {
        let err = ProcessorConfig::from_json(r#"{ "lengthStep": 0 }"#).unwrap_err();
        assert!(matches!(err, WhipError::Config(_)));
    }

    #[test]
    fn quantity_cap_is_configurable() {
        let config = ProcessorConfig::from_json(r#"{ "maxQuantity": 50 }"#).unwrap();
        assert_eq!(config.max_quantity, 50);
        assert!(ProcessorConfig::from_json(r#"{ "maxQuantity": 0 }"#).is_err());
    }
}
