//! Anthropometric bat-speed capacity.
//!
//! A benchmark table keyed by height and weight gives the bat speed an
//! athlete of that size reaches at ~85% mechanical efficiency. Three
//! linear corrections follow, in order:
//!
//! 1. wingspan: +1.5% per inch of wingspan over height
//! 2. bat weight: -0.7 mph per ounce over 30 oz
//! 3. age: none through 25, -1.5%/yr from 26 to 35, -2.5%/yr after 35
//!
//! The corrected value is the typical (85%) point. Min and max rescale it
//! to 75% and 95% efficiency; they are not modelled independently.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swing_core::{Anthropometry, Error, Result};

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub height_in: f64,
    pub weight_lb: f64,
    pub bat_speed_mph: f64,
}

const fn entry(height_in: f64, weight_lb: f64, bat_speed_mph: f64) -> BaselineEntry {
    BaselineEntry {
        height_in,
        weight_lb,
        bat_speed_mph,
    }
}

/// Youth through adult benchmark bat speeds (mph)
const STANDARD_BASELINES: [BaselineEntry; 37] = [
    entry(54.0, 70.0, 35.0),
    entry(54.0, 80.0, 38.0),
    entry(54.0, 90.0, 40.0),
    entry(60.0, 90.0, 42.0),
    entry(60.0, 100.0, 45.0),
    entry(60.0, 110.0, 47.0),
    entry(64.0, 120.0, 52.0),
    entry(64.0, 130.0, 54.0),
    entry(64.0, 140.0, 56.0),
    entry(66.0, 130.0, 55.0),
    entry(66.0, 140.0, 57.0),
    entry(66.0, 150.0, 59.0),
    entry(68.0, 160.0, 68.0),
    entry(68.0, 170.0, 70.0),
    entry(68.0, 180.0, 72.0),
    entry(68.0, 190.0, 75.0),
    entry(68.0, 200.0, 77.0),
    entry(70.0, 170.0, 70.0),
    entry(70.0, 180.0, 72.0),
    entry(70.0, 190.0, 74.0),
    entry(70.0, 200.0, 76.0),
    entry(70.0, 210.0, 78.0),
    entry(72.0, 190.0, 76.0),
    entry(72.0, 200.0, 78.0),
    entry(72.0, 210.0, 80.0),
    entry(72.0, 220.0, 82.0),
    entry(72.0, 230.0, 83.0),
    entry(74.0, 210.0, 80.0),
    entry(74.0, 220.0, 82.0),
    entry(74.0, 230.0, 84.0),
    entry(74.0, 240.0, 85.0),
    entry(74.0, 250.0, 86.0),
    entry(76.0, 230.0, 84.0),
    entry(76.0, 240.0, 86.0),
    entry(76.0, 250.0, 87.0),
    entry(76.0, 260.0, 88.0),
    entry(76.0, 270.0, 89.0),
];

/// Read-only benchmark table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineTable {
    entries: Vec<BaselineEntry>,
}

impl BaselineTable {
    pub fn new(entries: Vec<BaselineEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Config("baseline table is empty".into()));
        }
        if let Some(bad) = entries.iter().find(|e| {
            !(e.height_in.is_finite() && e.weight_lb.is_finite() && e.bat_speed_mph > 0.0)
        }) {
            return Err(Error::Config(format!("invalid baseline entry {:?}", bad)));
        }
        Ok(Self { entries })
    }

    pub fn standard() -> Self {
        Self {
            entries: STANDARD_BASELINES.to_vec(),
        }
    }

    pub fn entries(&self) -> &[BaselineEntry] {
        &self.entries
    }

    /// Inverse-distance weighted baseline over the `neighbours` nearest
    /// entries. Height differences count `height_scale` times as much as
    /// weight differences; an exact match returns the table value.
    pub fn lookup(&self, height_in: f64, weight_lb: f64, neighbours: usize, height_scale: f64) -> f64 {
        if let Some(exact) = self
            .entries
            .iter()
            .find(|e| e.height_in == height_in && e.weight_lb == weight_lb)
        {
            return exact.bat_speed_mph;
        }

        let mut ranked: Vec<(f64, f64)> = self
            .entries
            .iter()
            .map(|e| {
                let dh = (height_in - e.height_in) * height_scale;
                let dw = weight_lb - e.weight_lb;
                ((dh * dh + dw * dw).sqrt(), e.bat_speed_mph)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let (weighted, total) = ranked
            .iter()
            .take(neighbours.max(1))
            .fold((0.0, 0.0), |(sum, weights), (distance, speed)| {
                let weight = 1.0 / (distance * distance + 0.1);
                (sum + weight * speed, weights + weight)
            });
        weighted / total
    }
}

impl Default for BaselineTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    pub table: BaselineTable,
    pub neighbours: usize,
    pub height_distance_scale: f64,
    /// Fractional gain per inch of wingspan over height
    pub wingspan_gain_per_inch: f64,
    pub reference_bat_oz: f64,
    /// mph lost per ounce above the reference
    pub mph_per_bat_oz: f64,
    pub age_decline_start: f64,
    pub age_early_decline_per_year: f64,
    pub age_late_decline_start: f64,
    pub age_late_decline_per_year: f64,
    pub min_age_factor: f64,
    pub min_efficiency: f64,
    pub typical_efficiency: f64,
    pub max_efficiency: f64,
    /// Exit velocity per unit bat speed off a tee
    pub tee_exit_multiplier: f64,
    pub pitched_bat_multiplier: f64,
    pub pitched_pitch_multiplier: f64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            table: BaselineTable::standard(),
            neighbours: 4,
            height_distance_scale: 5.0,
            wingspan_gain_per_inch: 0.015,
            reference_bat_oz: 30.0,
            mph_per_bat_oz: 0.7,
            age_decline_start: 25.0,
            age_early_decline_per_year: 0.015,
            age_late_decline_start: 35.0,
            age_late_decline_per_year: 0.025,
            min_age_factor: 0.5,
            min_efficiency: 0.75,
            typical_efficiency: 0.85,
            max_efficiency: 0.95,
            tee_exit_multiplier: 1.28,
            pitched_bat_multiplier: 1.2,
            pitched_pitch_multiplier: 0.27,
        }
    }
}

/// Each correction stage of a capacity estimate (mph)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityBreakdown {
    pub baseline: f64,
    pub after_wingspan: f64,
    pub after_bat_weight: f64,
    pub age_factor: f64,
    pub after_age: f64,
}

/// Min/typical/max bat-speed capacity (mph); min < typical < max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityRange {
    pub min: f64,
    pub typical: f64,
    pub max: f64,
    pub breakdown: Option<CapacityBreakdown>,
}

impl CapacityRange {
    pub fn new(min: f64, typical: f64, max: f64) -> Result<Self> {
        let range = Self {
            min,
            typical,
            max,
            breakdown: None,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        let finite = self.min.is_finite() && self.typical.is_finite() && self.max.is_finite();
        if !finite || !(self.min < self.typical && self.typical < self.max) {
            return Err(Error::InvariantViolation(format!(
                "capacity range must satisfy min < typical < max, got {:.2} / {:.2} / {:.2}",
                self.min, self.typical, self.max
            )));
        }
        Ok(())
    }

    /// Same range for batted-ball exit velocity. Off a tee when
    /// `pitch_speed_mph` is `None`.
    pub fn exit_velocity(&self, pitch_speed_mph: Option<f64>, config: &CapacityConfig) -> [f64; 3] {
        let ev = |bat: f64| match pitch_speed_mph {
            Some(pitch) => bat * config.pitched_bat_multiplier + pitch * config.pitched_pitch_multiplier,
            None => bat * config.tee_exit_multiplier,
        };
        [ev(self.min), ev(self.typical), ev(self.max)]
    }

    /// Bat kinetic energy at each point of the range (J)
    pub fn kinetic_energy_j(&self, bat_mass_kg: f64) -> [f64; 3] {
        let joules = |mph: f64| {
            let ms = mph * 0.447_04;
            0.5 * bat_mass_kg * ms * ms
        };
        [joules(self.min), joules(self.typical), joules(self.max)]
    }
}

impl Record for CapacityRange {}

#[derive(Debug, Clone)]
pub struct CapacityCalculator {
    config: Arc<CapacityConfig>,
}

impl CapacityCalculator {
    pub fn new(config: CapacityConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CapacityConfig {
        &self.config
    }

    pub fn calculate(&self, body: &Anthropometry) -> Result<CapacityRange> {
        body.validate()?;
        let c = &self.config;

        let baseline = c.table.lookup(body.height_in, body.weight_lb, c.neighbours, c.height_distance_scale);
        let after_wingspan = baseline * (1.0 + c.wingspan_gain_per_inch * body.ape_index_in());
        let after_bat_weight = after_wingspan - c.mph_per_bat_oz * (body.bat_weight_oz - c.reference_bat_oz);
        let age_factor = self.age_factor(body.age_years);
        let typical = after_bat_weight * age_factor;

        let range = CapacityRange {
            min: typical * c.min_efficiency / c.typical_efficiency,
            typical,
            max: typical * c.max_efficiency / c.typical_efficiency,
            breakdown: Some(CapacityBreakdown {
                baseline,
                after_wingspan,
                after_bat_weight,
                age_factor,
                after_age: typical,
            }),
        };
        range.validate()?;

        tracing::debug!(
            "Capacity for {:.0}in/{:.0}lb: baseline {:.1} mph, typical {:.1} mph ({:.1}-{:.1})",
            body.height_in,
            body.weight_lb,
            baseline,
            range.typical,
            range.min,
            range.max
        );
        Ok(range)
    }

    /// Multiplicative age decline, floored at the configured minimum
    pub fn age_factor(&self, age_years: f64) -> f64 {
        let c = &self.config;
        let early_years = (age_years.min(c.age_late_decline_start) - c.age_decline_start).max(0.0);
        let late_years = (age_years - c.age_late_decline_start).max(0.0);
        let factor = 1.0 - c.age_early_decline_per_year * early_years - c.age_late_decline_per_year * late_years;
        factor.max(c.min_age_factor)
    }
}

impl Default for CapacityCalculator {
    fn default() -> Self {
        Self::new(CapacityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_entry_calculator(speed: f64) -> CapacityCalculator {
        CapacityCalculator::new(CapacityConfig {
            table: BaselineTable::new(vec![BaselineEntry {
                height_in: 72.0,
                weight_lb: 200.0,
                bat_speed_mph: speed,
            }])
            .unwrap(),
            ..CapacityConfig::default()
        })
    }

    #[test]
    fn test_wingspan_adds_one_and_a_half_percent_per_inch() {
        let calc = single_entry_calculator(80.0);
        let body = Anthropometry::new(72.0, 200.0, 76.0, 20.0, 30.0);
        let range = calc.calculate(&body).unwrap();
        let breakdown = range.breakdown.unwrap();

        assert_eq!(breakdown.baseline, 80.0);
        assert!((breakdown.after_wingspan / breakdown.baseline - 1.06).abs() < 1e-12);
        // 30oz bat and age 20 leave it untouched
        assert!((range.typical - 84.8).abs() < 1e-9);
    }

    #[test]
    fn test_bat_weight_correction() {
        let calc = single_entry_calculator(80.0);
        let heavy = Anthropometry::new(72.0, 200.0, 72.0, 20.0, 32.0);
        let light = Anthropometry::new(72.0, 200.0, 72.0, 20.0, 28.0);
        assert!((calc.calculate(&heavy).unwrap().typical - 78.6).abs() < 1e-9);
        assert!((calc.calculate(&light).unwrap().typical - 81.4).abs() < 1e-9);
    }

    #[test]
    fn test_age_factor() {
        let calc = CapacityCalculator::default();
        assert_eq!(calc.age_factor(14.0), 1.0);
        assert_eq!(calc.age_factor(25.0), 1.0);
        assert!((calc.age_factor(30.0) - 0.925).abs() < 1e-12);
        assert!((calc.age_factor(35.0) - 0.85).abs() < 1e-12);
        assert!((calc.age_factor(40.0) - 0.725).abs() < 1e-12);
        assert_eq!(calc.age_factor(90.0), 0.5);
    }

    #[test]
    fn test_range_is_proportional_and_ordered() {
        let calc = CapacityCalculator::default();
        let body = Anthropometry::new(71.0, 195.0, 73.0, 19.0, 31.0);
        let range = calc.calculate(&body).unwrap();

        assert!(range.min < range.typical && range.typical < range.max);
        assert!((range.min / range.typical - 0.75 / 0.85).abs() < 1e-12);
        assert!((range.max / range.typical - 0.95 / 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_interpolation_stays_between_neighbours() {
        let table = BaselineTable::standard();
        let exact = table.lookup(72.0, 200.0, 4, 5.0);
        assert_eq!(exact, 78.0);

        let between = table.lookup(72.0, 205.0, 4, 5.0);
        assert!(between > 76.0 && between < 82.0);
    }

    #[test]
    fn test_degenerate_capacity_is_rejected() {
        // A very heavy bat drives the corrected value below zero
        let calc = single_entry_calculator(10.0);
        let body = Anthropometry::new(72.0, 200.0, 72.0, 20.0, 60.0);
        let err = calc.calculate(&body).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn test_invalid_anthropometry() {
        let calc = CapacityCalculator::default();
        let body = Anthropometry::new(f64::NAN, 200.0, 72.0, 20.0, 30.0);
        assert!(matches!(calc.calculate(&body), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_exit_velocity_and_energy() {
        let range = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        let config = CapacityConfig::default();

        let tee = range.exit_velocity(None, &config);
        assert!((tee[1] - 68.0 * 1.28).abs() < 1e-9);
        let pitched = range.exit_velocity(Some(80.0), &config);
        assert!((pitched[1] - (68.0 * 1.2 + 80.0 * 0.27)).abs() < 1e-9);

        let energy = range.kinetic_energy_j(0.85);
        assert!(energy[0] < energy[1] && energy[1] < energy[2]);
        assert!(CapacityRange::new(70.0, 70.0, 80.0).is_err());
    }
}
