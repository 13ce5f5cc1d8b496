//! Measured bat speed against anthropometric capacity.
//!
//! Reports how much of the athlete's capacity a swing used, ranks the
//! three components by how far they sit below target, and predicts the
//! bat speed after fixing them. The prediction never exceeds the top of
//! the capacity range.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use swing_core::{Error, Result};

use crate::capacity::CapacityRange;
use crate::record::{round_to, Record};
use crate::scoring::{clamp_score, Component, ComponentScores};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Component score treated as "fixed"
    pub target_score: f64,
    /// mph recovered per point below target
    pub ground_gain_per_point: f64,
    pub engine_gain_per_point: f64,
    pub weapon_gain_per_point: f64,
    /// Weights of ground, engine and weapon in the efficiency estimate
    pub efficiency_weights: [f64; 3],
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            target_score: 85.0,
            ground_gain_per_point: 0.12,
            engine_gain_per_point: 0.15,
            weapon_gain_per_point: 0.10,
            efficiency_weights: [0.25, 0.50, 0.25],
        }
    }
}

impl GapConfig {
    pub fn gain_per_point(&self, component: Component) -> f64 {
        match component {
            Component::Ground => self.ground_gain_per_point,
            Component::Engine => self.engine_gain_per_point,
            Component::Weapon => self.weapon_gain_per_point,
        }
    }
}

/// Where the measured speed falls within the capacity range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePosition {
    AboveMaximum,
    AboveTypical,
    BelowTypical,
    BelowMinimum,
}

impl RangePosition {
    pub fn locate(actual_mph: f64, capacity: &CapacityRange) -> Self {
        if actual_mph > capacity.max {
            RangePosition::AboveMaximum
        } else if actual_mph >= capacity.typical {
            RangePosition::AboveTypical
        } else if actual_mph >= capacity.min {
            RangePosition::BelowTypical
        } else {
            RangePosition::BelowMinimum
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    Undertrained,
    BelowAverage,
    Average,
    Good,
    Elite,
}

impl CapacityStatus {
    pub fn from_used_pct(pct: f64) -> Self {
        match pct {
            p if p >= 95.0 => CapacityStatus::Elite,
            p if p >= 85.0 => CapacityStatus::Good,
            p if p >= 75.0 => CapacityStatus::Average,
            p if p >= 65.0 => CapacityStatus::BelowAverage,
            _ => CapacityStatus::Undertrained,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CapacityStatus::Elite => "elite",
            CapacityStatus::Good => "good",
            CapacityStatus::Average => "average",
            CapacityStatus::BelowAverage => "below average",
            CapacityStatus::Undertrained => "undertrained",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 50.0 => Priority::Critical,
            s if s < 65.0 => Priority::High,
            s if s < 80.0 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentGap {
    pub component: Component,
    pub score: f64,
    pub points_below_target: f64,
    pub estimated_gain_mph: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub focus: Component,
    pub focus_gain_mph: f64,
    /// Sum of all component gains, before the capacity cap
    pub total_gain_mph: f64,
    /// Bat speed after the fixes, capped at capacity max
    pub predicted_mph: f64,
    pub predicted_gain_mph: f64,
    pub remaining_to_max_mph: f64,
    pub capped: bool,
}

/// Mechanical efficiency implied by the component scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyEstimate {
    pub ground: f64,
    pub engine: f64,
    pub weapon: f64,
    pub overall: f64,
    pub predicted_mph: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub actual_mph: f64,
    pub capacity: CapacityRange,
    /// Not clamped; above 100 when the swing beat the typical estimate
    pub capacity_used_pct: f64,
    pub gap_to_typical_mph: f64,
    pub gap_to_max_mph: f64,
    pub position: RangePosition,
    pub status: CapacityStatus,
    /// Weakest first
    pub components: Vec<ComponentGap>,
    pub weakest: Component,
    pub prescription: Prescription,
    pub efficiency: EfficiencyEstimate,
    pub summary: String,
}

impl Record for GapAnalysis {
    fn to_record(&self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        let mut put = |key: &str, value: Value| {
            map.insert(key.to_string(), value);
        };
        put("actual_mph", round_to(self.actual_mph, 1).into());
        put("capacity_min_mph", round_to(self.capacity.min, 1).into());
        put("capacity_typical_mph", round_to(self.capacity.typical, 1).into());
        put("capacity_max_mph", round_to(self.capacity.max, 1).into());
        put("capacity_used_pct", round_to(self.capacity_used_pct, 1).into());
        put("gap_to_typical_mph", round_to(self.gap_to_typical_mph, 1).into());
        put("gap_to_max_mph", round_to(self.gap_to_max_mph, 1).into());
        put("position", serde_json::to_value(self.position)?);
        put("status", self.status.label().into());
        put("weakest", self.weakest.name().into());
        for gap in &self.components {
            put(
                &format!("{}_gain_mph", gap.component.name()),
                round_to(gap.estimated_gain_mph, 1).into(),
            );
            put(
                &format!("{}_priority", gap.component.name()),
                serde_json::to_value(gap.priority)?,
            );
        }
        put("total_gain_mph", round_to(self.prescription.total_gain_mph, 1).into());
        put("predicted_mph", round_to(self.prescription.predicted_mph, 1).into());
        put("predicted_gain_mph", round_to(self.prescription.predicted_gain_mph, 1).into());
        put("efficiency_pct", round_to(self.efficiency.overall * 100.0, 1).into());
        put("summary", self.summary.clone().into());
        Ok(map)
    }
}

pub struct GapAnalyzer {
    config: GapConfig,
}

impl GapAnalyzer {
    pub fn new(config: GapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    /// Gap analysis for the bat speed measured by the pipeline
    pub fn analyze(&self, scores: &ComponentScores, capacity: &CapacityRange) -> Result<GapAnalysis> {
        self.analyze_measured(scores.peaks.bat_speed_mph, scores, capacity)
    }

    /// Gap analysis for an externally measured bat speed, e.g. from a bat sensor
    pub fn analyze_measured(
        &self,
        actual_mph: f64,
        scores: &ComponentScores,
        capacity: &CapacityRange,
    ) -> Result<GapAnalysis> {
        capacity.validate()?;
        if !actual_mph.is_finite() || actual_mph < 0.0 {
            return Err(Error::InvalidInput(format!(
                "bat speed must be a non-negative number, got {}",
                actual_mph
            )));
        }

        let capacity_used_pct = actual_mph / capacity.typical * 100.0;
        let components = self.rank(scores);
        let weakest = components[0].component;
        let prescription = self.prescribe(actual_mph, capacity, &components);
        let efficiency = self.efficiency(scores, capacity);
        let status = CapacityStatus::from_used_pct(capacity_used_pct);

        let summary = format!(
            "{:.1} mph is {:.0}% of typical capacity ({}). Fix {} first: up to {:.1} mph.",
            actual_mph,
            capacity_used_pct,
            status.label(),
            weakest.name(),
            prescription.predicted_mph,
        );

        tracing::debug!(
            "Gap: {:.1} mph, {:.1}% used, weakest {}, predicted {:.1} mph",
            actual_mph,
            capacity_used_pct,
            weakest.name(),
            prescription.predicted_mph
        );

        Ok(GapAnalysis {
            actual_mph,
            capacity: capacity.clone(),
            capacity_used_pct,
            gap_to_typical_mph: capacity.typical - actual_mph,
            gap_to_max_mph: capacity.max - actual_mph,
            position: RangePosition::locate(actual_mph, capacity),
            status,
            components,
            weakest,
            prescription,
            efficiency,
            summary,
        })
    }

    fn rank(&self, scores: &ComponentScores) -> Vec<ComponentGap> {
        let mut gaps: Vec<ComponentGap> = Component::ALL
            .iter()
            .map(|&component| {
                let score = clamp_score(scores.get(component));
                let points_below_target = (self.config.target_score - score).max(0.0);
                ComponentGap {
                    component,
                    score,
                    points_below_target,
                    estimated_gain_mph: points_below_target * self.config.gain_per_point(component),
                    priority: Priority::from_score(score),
                }
            })
            .collect();
        // stable: ties keep ground, engine, weapon order
        gaps.sort_by(|a, b| a.score.total_cmp(&b.score));
        gaps
    }

    fn prescribe(&self, actual_mph: f64, capacity: &CapacityRange, ranked: &[ComponentGap]) -> Prescription {
        let total_gain_mph: f64 = ranked.iter().map(|g| g.estimated_gain_mph).sum();
        let uncapped = actual_mph + total_gain_mph;
        let predicted_mph = uncapped.min(capacity.max);
        if uncapped > capacity.max {
            tracing::debug!(
                "Predicted {:.1} mph capped at capacity max {:.1} mph",
                uncapped,
                capacity.max
            );
        }

        Prescription {
            focus: ranked[0].component,
            focus_gain_mph: ranked[0].estimated_gain_mph,
            total_gain_mph,
            predicted_mph,
            predicted_gain_mph: (predicted_mph - actual_mph).max(0.0),
            remaining_to_max_mph: (capacity.max - predicted_mph).max(0.0),
            capped: uncapped > capacity.max,
        }
    }

    fn efficiency(&self, scores: &ComponentScores, capacity: &CapacityRange) -> EfficiencyEstimate {
        let eff = |c: Component| 0.5 + clamp_score(scores.get(c)) / 200.0;
        let (ground, engine, weapon) = (eff(Component::Ground), eff(Component::Engine), eff(Component::Weapon));
        let [wg, we, ww] = self.config.efficiency_weights;
        let total = wg + we + ww;
        let overall = if total > 0.0 {
            (ground * wg + engine * we + weapon * ww) / total
        } else {
            (ground + engine + weapon) / 3.0
        };
        EfficiencyEstimate {
            ground,
            engine,
            weapon,
            overall,
            predicted_mph: capacity.typical * overall,
        }
    }
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(GapConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::PeakMetrics;

    fn scores(ground: f64, engine: f64, weapon: f64, bat_mph: f64) -> ComponentScores {
        ComponentScores {
            ground,
            engine,
            weapon,
            transfer_efficiency: 75.0,
            overall: (ground + engine + weapon) / 3.0,
            peaks: PeakMetrics {
                pelvis_velocity_dps: 500.0,
                torso_velocity_dps: 700.0,
                separation_deg: 30.0,
                peak_force_n: 1200.0,
                bat_speed_ms: bat_mph / 2.236_936,
                bat_speed_mph: bat_mph,
                hand_speed_ms: 7.0,
            },
            defaulted: Vec::new(),
        }
    }

    #[test]
    fn test_prediction_never_exceeds_capacity_max() {
        let capacity = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        // Gains: ground 85*0.12 + engine 85*0.15 + weapon 85*0.10 = 31.45 mph
        let analysis = GapAnalyzer::default()
            .analyze(&scores(0.0, 0.0, 0.0, 70.0), &capacity)
            .unwrap();

        assert!((analysis.prescription.total_gain_mph - 31.45).abs() < 1e-9);
        assert_eq!(analysis.prescription.predicted_mph, 76.0);
        assert!(analysis.prescription.capped);
        assert!((analysis.prescription.predicted_gain_mph - 6.0).abs() < 1e-9);
        assert_eq!(analysis.prescription.remaining_to_max_mph, 0.0);
    }

    #[test]
    fn test_capacity_used_is_not_clamped() {
        let capacity = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        let analysis = GapAnalyzer::default()
            .analyze(&scores(90.0, 90.0, 90.0, 78.2), &capacity)
            .unwrap();

        assert!((analysis.capacity_used_pct - 115.0).abs() < 1e-9);
        assert_eq!(analysis.position, RangePosition::AboveMaximum);
        assert_eq!(analysis.status, CapacityStatus::Elite);
        // Nothing left to gain and already past max
        assert_eq!(analysis.prescription.predicted_gain_mph, 0.0);
    }

    #[test]
    fn test_weakest_component_is_ranked_first() {
        let capacity = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        let analysis = GapAnalyzer::default()
            .analyze(&scores(72.0, 45.0, 81.0, 55.0), &capacity)
            .unwrap();

        assert_eq!(analysis.weakest, Component::Engine);
        assert_eq!(analysis.prescription.focus, Component::Engine);
        let order: Vec<Component> = analysis.components.iter().map(|g| g.component).collect();
        assert_eq!(order, vec![Component::Engine, Component::Ground, Component::Weapon]);
        assert_eq!(analysis.components[0].priority, Priority::Critical);
        assert_eq!(analysis.components[2].priority, Priority::Low);
        // Engine: 40 points below target at 0.15 mph/point
        assert!((analysis.prescription.focus_gain_mph - 6.0).abs() < 1e-9);
        assert_eq!(analysis.position, RangePosition::BelowMinimum);
        // 55 / 68 = 80.9% of typical
        assert_eq!(analysis.status, CapacityStatus::Average);
    }

    #[test]
    fn test_ties_keep_component_order() {
        let capacity = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        let analysis = GapAnalyzer::default()
            .analyze(&scores(60.0, 60.0, 60.0, 62.0), &capacity)
            .unwrap();
        assert_eq!(analysis.weakest, Component::Ground);
    }

    #[test]
    fn test_efficiency_estimate() {
        let capacity = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        let analysis = GapAnalyzer::default()
            .analyze(&scores(100.0, 0.0, 100.0, 62.0), &capacity)
            .unwrap();

        assert_eq!(analysis.efficiency.ground, 1.0);
        assert_eq!(analysis.efficiency.engine, 0.5);
        assert!((analysis.efficiency.overall - 0.75).abs() < 1e-12);
        assert!((analysis.efficiency.predicted_mph - 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_bat_speed() {
        let capacity = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        let result = GapAnalyzer::default().analyze_measured(f64::NAN, &scores(70.0, 70.0, 70.0, 0.0), &capacity);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_record_is_flat() {
        let capacity = CapacityRange::new(60.0, 68.0, 76.0).unwrap();
        let analysis = GapAnalyzer::default()
            .analyze(&scores(72.0, 45.0, 81.0, 55.0), &capacity)
            .unwrap();
        let record = analysis.to_record().unwrap();

        assert_eq!(record["weakest"], "engine");
        assert_eq!(record["engine_priority"], "critical");
        assert_eq!(record["status"], "average");
        assert!(record.values().all(|v| !v.is_object()));
    }
}
