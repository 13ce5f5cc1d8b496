//! Load-to-swing tempo.
//!
//! Tempo ratio = load duration (load → foot down) / swing duration
//! (foot down → contact). Long loads store more elastic energy; short ones
//! react faster to velocity.

use serde::{Deserialize, Serialize};

use crate::record::Record;

pub const TEMPO_RATIO_MIN: f64 = 0.5;
pub const TEMPO_RATIO_MAX: f64 = 10.0;

/// Clamp a raw load/swing ratio into the reportable range
pub fn clamp_tempo_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return TEMPO_RATIO_MIN;
    }
    ratio.clamp(TEMPO_RATIO_MIN, TEMPO_RATIO_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TempoCategory {
    HairTrigger,
    Quick,
    Balanced,
    LongLoad,
}

impl TempoCategory {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.75 {
            TempoCategory::HairTrigger
        } else if ratio < 1.5 {
            TempoCategory::Quick
        } else if ratio < 2.5 {
            TempoCategory::Balanced
        } else {
            TempoCategory::LongLoad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TempoCategory::HairTrigger => "hair trigger",
            TempoCategory::Quick => "quick",
            TempoCategory::Balanced => "balanced",
            TempoCategory::LongLoad => "long load",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TempoCategory::HairTrigger => "Very quick trigger - may struggle with off-speed pitches",
            TempoCategory::Quick => "Fast reaction to pitch - good for fastballs",
            TempoCategory::Balanced => "Optimal timing - can handle all pitch types",
            TempoCategory::LongLoad => "Patient approach - high power potential, watch timing on fastballs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyRating {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl ConsistencyRating {
    pub fn from_cv(cv_percent: f64) -> Self {
        if cv_percent < 5.0 {
            ConsistencyRating::Excellent
        } else if cv_percent < 10.0 {
            ConsistencyRating::VeryGood
        } else if cv_percent < 15.0 {
            ConsistencyRating::Good
        } else if cv_percent < 20.0 {
            ConsistencyRating::Fair
        } else {
            ConsistencyRating::NeedsImprovement
        }
    }
}

/// Tempo repeatability across several swings of one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoConsistency {
    pub swing_count: usize,
    pub mean_ratio: f64,
    pub std_dev: f64,
    /// Coefficient of variation, percent
    pub cv_percent: f64,
    pub rating: ConsistencyRating,
    /// Category of the mean tempo
    pub category: TempoCategory,
}

impl TempoConsistency {
    /// `None` for an empty set of swings
    pub fn from_ratios(ratios: &[f64]) -> Option<Self> {
        let ratios: Vec<f64> = ratios.iter().copied().filter(|r| r.is_finite()).collect();
        if ratios.is_empty() {
            return None;
        }

        let n = ratios.len() as f64;
        let mean_ratio = ratios.iter().sum::<f64>() / n;
        let std_dev = (ratios.iter().map(|r| (r - mean_ratio).powi(2)).sum::<f64>() / n).sqrt();
        let cv_percent = if mean_ratio > 0.0 {
            std_dev / mean_ratio * 100.0
        } else {
            0.0
        };

        Some(Self {
            swing_count: ratios.len(),
            mean_ratio,
            std_dev,
            cv_percent,
            rating: ConsistencyRating::from_cv(cv_percent),
            category: TempoCategory::from_ratio(mean_ratio),
        })
    }
}

impl Record for TempoConsistency {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries() {
        assert_eq!(TempoCategory::from_ratio(0.5), TempoCategory::HairTrigger);
        assert_eq!(TempoCategory::from_ratio(0.75), TempoCategory::Quick);
        assert_eq!(TempoCategory::from_ratio(1.49), TempoCategory::Quick);
        assert_eq!(TempoCategory::from_ratio(1.5), TempoCategory::Balanced);
        assert_eq!(TempoCategory::from_ratio(2.5), TempoCategory::LongLoad);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_tempo_ratio(0.01), TEMPO_RATIO_MIN);
        assert_eq!(clamp_tempo_ratio(1e9), TEMPO_RATIO_MAX);
        assert_eq!(clamp_tempo_ratio(f64::INFINITY), TEMPO_RATIO_MAX);
        assert_eq!(clamp_tempo_ratio(f64::NAN), TEMPO_RATIO_MIN);
        assert_eq!(clamp_tempo_ratio(2.0), 2.0);
    }

    #[test]
    fn test_consistency() {
        let steady = TempoConsistency::from_ratios(&[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(steady.rating, ConsistencyRating::Excellent);
        assert_eq!(steady.category, TempoCategory::Balanced);
        assert!(steady.std_dev.abs() < 1e-12);

        let erratic = TempoConsistency::from_ratios(&[1.0, 3.0]).unwrap();
        assert!((erratic.mean_ratio - 2.0).abs() < 1e-12);
        assert!((erratic.cv_percent - 50.0).abs() < 1e-9);
        assert_eq!(erratic.rating, ConsistencyRating::NeedsImprovement);

        assert!(TempoConsistency::from_ratios(&[]).is_none());
    }
}
