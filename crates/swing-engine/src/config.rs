//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use swing_core::{DerivationConfig, Error, Result};

use crate::capacity::CapacityConfig;
use crate::events::EventConfig;
use crate::gap::GapConfig;
use crate::krs::KrsConfig;
use crate::profile::ProfileConfig;
use crate::scoring::ScoringConfig;
use crate::sequence::SequenceConfig;

const ENV_PREFIX: &str = "SWING";

/// Every tunable constant of the pipeline, one section per stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Joint angle and velocity derivation
    pub derivation: DerivationConfig,

    /// Phase/event detection
    pub events: EventConfig,

    /// Kinetic sequence timing
    pub sequence: SequenceConfig,

    /// Component scoring references, weights and defaults
    pub scoring: ScoringConfig,

    /// Kinetic Rating Score
    pub krs: KrsConfig,

    /// Motor-profile classification
    pub profile: ProfileConfig,

    /// Anthropometric capacity table and corrections
    pub capacity: CapacityConfig,

    /// Efficiency/gap analysis
    pub gap: GapConfig,
}

impl EngineConfig {
    /// Load configuration from file, with `SWING_` environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables, e.g. `SWING_EVENTS__MIN_PHASE_MS=15`
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Reject settings the stages cannot work with
    pub fn validate(&self) -> Result<()> {
        let events = &self.events;
        let fractions = [
            events.load_fallback_fraction,
            events.foot_down_fallback_fraction,
            events.contact_fallback_fraction,
        ];
        if !(0.0 < fractions[0] && fractions[0] < fractions[1] && fractions[1] < fractions[2] && fractions[2] < 1.0) {
            return Err(Error::Config(format!(
                "fallback fractions must increase within (0, 1), got {:?}",
                fractions
            )));
        }
        if events.min_phase_ms < 0.0 {
            return Err(Error::Config("events.min_phase_ms must be non-negative".into()));
        }

        let krs = &self.krs;
        if krs.creation_weight < 0.0 || krs.transfer_weight < 0.0 {
            return Err(Error::Config("KRS weights must be non-negative".into()));
        }
        if krs.level_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Config(format!(
                "KRS level thresholds must increase, got {:?}",
                krs.level_thresholds
            )));
        }

        let capacity = &self.capacity;
        if !(0.0 < capacity.min_efficiency
            && capacity.min_efficiency < capacity.typical_efficiency
            && capacity.typical_efficiency < capacity.max_efficiency)
        {
            return Err(Error::Config(format!(
                "capacity efficiencies must satisfy 0 < min < typical < max, got {} / {} / {}",
                capacity.min_efficiency, capacity.typical_efficiency, capacity.max_efficiency
            )));
        }
        if capacity.table.entries().is_empty() {
            return Err(Error::Config("capacity baseline table is empty".into()));
        }

        if self.gap.efficiency_weights.iter().any(|w| *w < 0.0) {
            return Err(Error::Config("gap efficiency weights must be non-negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.events.min_phase_ms, 10.0);
        assert_eq!(config.krs.level_thresholds, [40.0, 60.0, 75.0, 85.0]);
        assert_eq!(config.capacity.typical_efficiency, 0.85);
        assert_eq!(config.gap.target_score, 85.0);
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("swing-engine-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[events]\nmin_phase_ms = 15.0\n\n[gap]\ntarget_score = 90.0\n",
        )
        .unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.events.min_phase_ms, 15.0);
        assert_eq!(config.gap.target_score, 90.0);
        // Untouched sections keep their defaults
        assert_eq!(config.events.load_fallback_fraction, 0.15);
        assert_eq!(config.krs.transfer_weight, 0.60);
    }

    #[test]
    fn test_invalid_fractions_are_rejected() {
        let mut config = EngineConfig::default();
        config.events.foot_down_fallback_fraction = 0.9;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = EngineConfig::from_file("/nonexistent/swing.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
