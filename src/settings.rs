//! Engine settings
//!
//! Tolerances and sizes used by the stepper. Loadable from JSON so a host can
//! tune them without recompiling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{DynamicsError, Result};

/// Engine tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Conservation ===
    /// Largest per-tick energy drift accepted without rollback (J)
    pub energy_tolerance: f64,
    /// Rollback-and-retry attempts before a violation is accepted
    pub max_retries: u8,

    // === Geometry ===
    /// Largest center-of-mass shift tolerated by a frame conversion (m)
    pub frame_tolerance: f64,
    /// Coarse samples per closest-point search
    pub traversal_samples: usize,

    // === Bookkeeping ===
    /// Collision snapshots retained per body
    pub history_capacity: usize,
    /// Minimum speed before the facing flag is updated (m/s)
    pub facing_speed_threshold: f64,

    // === Development ===
    /// Panic when both rotation angles are non-zero
    pub debug_angles: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            energy_tolerance: ENERGY_TOLERANCE,
            max_retries: MAX_RETRIES,

            frame_tolerance: FRAME_TOLERANCE,
            traversal_samples: TRAVERSAL_SAMPLES,

            history_capacity: HISTORY_CAPACITY,
            facing_speed_threshold: FACING_SPEED_THRESHOLD,

            debug_angles: false,
        }
    }
}

impl EngineSettings {
    /// Development profile: defaults plus the fatal rotation check
    pub fn debug() -> Self {
        Self {
            debug_angles: true,
            ..Self::default()
        }
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(DynamicsError::InvalidSettings(format!(
                    "{name} must be finite and > 0, got {v}"
                )))
            }
        };
        positive("energy_tolerance", self.energy_tolerance)?;
        positive("frame_tolerance", self.frame_tolerance)?;
        if !(self.facing_speed_threshold.is_finite() && self.facing_speed_threshold >= 0.0) {
            return Err(DynamicsError::InvalidSettings(format!(
                "facing_speed_threshold must be finite and >= 0, got {}",
                self.facing_speed_threshold
            )));
        }
        if self.history_capacity == 0 {
            return Err(DynamicsError::InvalidSettings(
                "history_capacity must be at least 1".into(),
            ));
        }
        if self.traversal_samples < 2 {
            return Err(DynamicsError::InvalidSettings(
                "traversal_samples must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded engine settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.history_capacity, 100);
        assert_eq!(settings.traversal_samples, 100);
        assert_eq!(settings.max_retries, 1);
        assert!(!settings.debug_angles);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = EngineSettings::from_json(r#"{ "history_capacity": 10 }"#).unwrap();
        assert_eq!(settings.history_capacity, 10);
        assert_eq!(settings.energy_tolerance, ENERGY_TOLERANCE);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineSettings::from_json(r#"{ "history_capacity": 0 }"#),
            Err(DynamicsError::InvalidSettings(_))
        ));
        assert!(matches!(
            EngineSettings::from_json(r#"{ "energy_tolerance": -1.0 }"#),
            Err(DynamicsError::InvalidSettings(_))
        ));
        assert!(matches!(
            EngineSettings::from_json("not json"),
            Err(DynamicsError::SettingsParse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_keeps_debug_flag() {
        let settings = EngineSettings::debug();
        let back = EngineSettings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(settings, back);
    }
}
