//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eye ratio (box height / width) below which the eyes count as closed
    pub closed_threshold: f64,

    /// Sustained closure before a drowsiness alert (seconds)
    pub alert_seconds: f64,

    /// Upper bound on the time credited to a single frame (seconds)
    pub max_dt_clamp_seconds: f64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            closed_threshold: 0.15,
            alert_seconds: 3.0,
            max_dt_clamp_seconds: 1.0,
        }
    }
}

impl DmsConfig {
    /// Create strict config (alerts sooner)
    pub fn strict() -> Self {
        Self {
            closed_threshold: 0.18,
            alert_seconds: 2.0,
            ..Default::default()
        }
    }

    /// Create lenient config (alerts later)
    pub fn lenient() -> Self {
        Self {
            closed_threshold: 0.12,
            alert_seconds: 4.5,
            ..Default::default()
        }
    }

    /// Check that every threshold is a positive finite number
    pub fn validate(&self) -> Result<(), DmsError> {
        let fields = [
            ("closed_threshold", self.closed_threshold),
            ("alert_seconds", self.alert_seconds),
            ("max_dt_clamp_seconds", self.max_dt_clamp_seconds),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(DmsError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DmsConfig::default();
        assert_eq!(config.closed_threshold, 0.15);
        assert_eq!(config.alert_seconds, 3.0);
        assert_eq!(config.max_dt_clamp_seconds, 1.0);
        assert!(config.validate().is_ok());
        assert!(DmsConfig::strict().validate().is_ok());
        assert!(DmsConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_and_nan() {
        let zero_alert = DmsConfig {
            alert_seconds: 0.0,
            ..Default::default()
        };
        assert!(zero_alert.validate().is_err());

        let nan_threshold = DmsConfig {
            closed_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(nan_threshold.validate().is_err());

        let negative_clamp = DmsConfig {
            max_dt_clamp_seconds: -1.0,
            ..Default::default()
        };
        assert!(negative_clamp.validate().is_err());
    }
}
