//! Kinetic Rating Score: one headline number combining energy creation
//! (ground score) and energy transfer (engine score).

use serde::{Deserialize, Serialize};

use crate::record::{round_to, Record};
use crate::scoring::{clamp_score, ComponentScores};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KrsConfig {
    pub creation_weight: f64,
    pub transfer_weight: f64,
    /// Lower bounds of Building, Developing, Advanced and Elite
    pub level_thresholds: [f64; 4],
}

impl Default for KrsConfig {
    fn default() -> Self {
        Self {
            creation_weight: 0.40,
            transfer_weight: 0.60,
            level_thresholds: [40.0, 60.0, 75.0, 85.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KrsLevel {
    Foundation,
    Building,
    Developing,
    Advanced,
    Elite,
}

impl KrsLevel {
    const ASCENDING: [KrsLevel; 5] = [
        KrsLevel::Foundation,
        KrsLevel::Building,
        KrsLevel::Developing,
        KrsLevel::Advanced,
        KrsLevel::Elite,
    ];

    pub fn from_score(score: f64, thresholds: &[f64; 4]) -> Self {
        let reached = thresholds.iter().filter(|t| score >= **t).count();
        Self::ASCENDING[reached]
    }

    pub fn label(&self) -> &'static str {
        match self {
            KrsLevel::Foundation => "FOUNDATION",
            KrsLevel::Building => "BUILDING",
            KrsLevel::Developing => "DEVELOPING",
            KrsLevel::Advanced => "ADVANCED",
            KrsLevel::Elite => "ELITE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            KrsLevel::Foundation => "Learning the basic movement pattern",
            KrsLevel::Building => "Pattern in place, building strength and timing",
            KrsLevel::Developing => "Solid mechanics with clear areas to refine",
            KrsLevel::Advanced => "Efficient, repeatable energy creation and transfer",
            KrsLevel::Elite => "Elite kinetic efficiency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KrsScore {
    /// 0-100, one decimal
    pub total: f64,
    pub creation: f64,
    pub transfer: f64,
    pub level: KrsLevel,
    /// Points to the next level; `None` at Elite
    pub points_to_next: Option<f64>,
}

impl KrsScore {
    pub fn calculate(creation: f64, transfer: f64, config: &KrsConfig) -> Self {
        let creation = clamp_score(creation);
        let transfer = clamp_score(transfer);
        let total = round_to(
            clamp_score(config.creation_weight * creation + config.transfer_weight * transfer),
            1,
        );
        let level = KrsLevel::from_score(total, &config.level_thresholds);
        let points_to_next = config
            .level_thresholds
            .iter()
            .find(|t| **t > total)
            .map(|t| round_to(t - total, 1));

        Self {
            total,
            creation,
            transfer,
            level,
            points_to_next,
        }
    }

    /// Creation from the ground score, transfer from the engine score
    pub fn from_scores(scores: &ComponentScores, config: &KrsConfig) -> Self {
        Self::calculate(scores.ground, scores.engine, config)
    }
}

impl Record for KrsScore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_total_and_level() {
        let krs = KrsScore::calculate(74.8, 69.5, &KrsConfig::default());
        assert_eq!(krs.total, 71.6);
        assert_eq!(krs.level, KrsLevel::Developing);
        assert_eq!(krs.level.label(), "DEVELOPING");
        assert_eq!(krs.points_to_next, Some(3.4));
    }

    #[test]
    fn test_level_boundaries() {
        let t = KrsConfig::default().level_thresholds;
        assert_eq!(KrsLevel::from_score(0.0, &t), KrsLevel::Foundation);
        assert_eq!(KrsLevel::from_score(39.9, &t), KrsLevel::Foundation);
        assert_eq!(KrsLevel::from_score(40.0, &t), KrsLevel::Building);
        assert_eq!(KrsLevel::from_score(60.0, &t), KrsLevel::Developing);
        assert_eq!(KrsLevel::from_score(75.0, &t), KrsLevel::Advanced);
        assert_eq!(KrsLevel::from_score(85.0, &t), KrsLevel::Elite);
        assert_eq!(KrsLevel::from_score(100.0, &t), KrsLevel::Elite);
    }

    #[test]
    fn test_elite_has_no_next_level() {
        let krs = KrsScore::calculate(100.0, 100.0, &KrsConfig::default());
        assert_eq!(krs.total, 100.0);
        assert_eq!(krs.points_to_next, None);
    }
}
