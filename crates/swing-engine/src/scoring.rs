//! Component scoring.
//!
//! Three 0-100 component scores, each a weighted sum of sub-scores that
//! compare a measured peak against an elite reference:
//!
//! - **Ground** (energy creation): hip angular velocity, hip-shoulder
//!   separation, peak force proxy
//! - **Engine** (energy transfer): torso angular velocity, sequence
//!   quality, bat speed
//! - **Weapon** (delivery): bat speed, hand speed, hand-to-bat lag
//!
//! Every input is optional. A missing or non-finite signal is replaced by
//! its declared default from [`SignalDefaults`], logged, and listed in
//! [`ComponentScores::defaulted`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use swing_core::{Anthropometry, KinematicSeries, Result};

use crate::events::SwingEvents;
use crate::record::{round_to, Record};
use crate::sequence::KineticSequence;

pub const MPS_TO_MPH: f64 = 2.236_936;
const GRAVITY: f64 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Component {
    Ground,
    Engine,
    Weapon,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Ground, Component::Engine, Component::Weapon];

    pub fn name(&self) -> &'static str {
        match self {
            Component::Ground => "ground",
            Component::Engine => "engine",
            Component::Weapon => "weapon",
        }
    }
}

/// Derived quantities the scores are built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    HipVelocity,
    TorsoVelocity,
    Separation,
    PeakForce,
    BatSpeed,
    HandSpeed,
    SequenceQuality,
    BatLag,
    TransferEfficiency,
}

/// Elite reference values a measured peak is scored against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceValues {
    pub pelvis_velocity_dps: f64,
    pub torso_velocity_dps: f64,
    pub separation_deg: f64,
    pub peak_force_n: f64,
    pub bat_speed_ms: f64,
    pub hand_speed_ms: f64,
}

impl Default for ReferenceValues {
    fn default() -> Self {
        Self {
            pelvis_velocity_dps: 600.0,
            torso_velocity_dps: 800.0,
            separation_deg: 40.0,
            peak_force_n: 1500.0,
            bat_speed_ms: 38.0,
            hand_speed_ms: 9.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub ground_hip_velocity: f64,
    pub ground_separation: f64,
    pub ground_peak_force: f64,
    pub engine_torso_velocity: f64,
    pub engine_sequence: f64,
    pub engine_bat_speed: f64,
    pub weapon_bat_speed: f64,
    pub weapon_hand_speed: f64,
    pub weapon_bat_lag: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            ground_hip_velocity: 0.40,
            ground_separation: 0.30,
            ground_peak_force: 0.30,
            engine_torso_velocity: 0.35,
            engine_sequence: 0.35,
            engine_bat_speed: 0.30,
            weapon_bat_speed: 0.50,
            weapon_hand_speed: 0.30,
            weapon_bat_lag: 0.20,
        }
    }
}

/// Value substituted for each signal when it cannot be measured
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalDefaults {
    pub hip_velocity_dps: f64,
    pub torso_velocity_dps: f64,
    pub separation_deg: f64,
    pub peak_force_n: f64,
    pub bat_speed_ms: f64,
    pub hand_speed_ms: f64,
    pub sequence_quality: f64,
    pub bat_lag_score: f64,
    pub transfer_efficiency_pct: f64,
}

impl Default for SignalDefaults {
    fn default() -> Self {
        Self {
            hip_velocity_dps: 300.0,
            torso_velocity_dps: 400.0,
            separation_deg: 20.0,
            peak_force_n: 1000.0,
            bat_speed_ms: 15.0,
            hand_speed_ms: 4.5,
            sequence_quality: 50.0,
            bat_lag_score: 70.0,
            transfer_efficiency_pct: 75.0,
        }
    }
}

impl SignalDefaults {
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::HipVelocity => self.hip_velocity_dps,
            Signal::TorsoVelocity => self.torso_velocity_dps,
            Signal::Separation => self.separation_deg,
            Signal::PeakForce => self.peak_force_n,
            Signal::BatSpeed => self.bat_speed_ms,
            Signal::HandSpeed => self.hand_speed_ms,
            Signal::SequenceQuality => self.sequence_quality,
            Signal::BatLag => self.bat_lag_score,
            Signal::TransferEfficiency => self.transfer_efficiency_pct,
        }
    }
}

/// Body segment model for the energy proxies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentModel {
    pub pelvis_mass_fraction: f64,
    pub torso_mass_fraction: f64,
    pub arms_mass_fraction: f64,
    /// Radius of gyration as a fraction of body height
    pub pelvis_gyration_ratio: f64,
    pub torso_gyration_ratio: f64,
}

impl Default for SegmentModel {
    fn default() -> Self {
        Self {
            pelvis_mass_fraction: 0.142,
            torso_mass_fraction: 0.355,
            arms_mass_fraction: 0.10,
            pelvis_gyration_ratio: 0.10,
            torso_gyration_ratio: 0.12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub references: ReferenceValues,
    pub weights: ScoreWeights,
    pub defaults: SignalDefaults,
    pub segments: SegmentModel,
    /// Hand-to-bat peak gap considered a clean lag (ms)
    pub bat_lag_min_ms: f64,
    pub bat_lag_max_ms: f64,
    pub bat_lag_in_window_score: f64,
    pub bat_lag_outside_score: f64,
    /// Half-width of the window around contact for bat and hand peaks (ms)
    pub contact_window_ms: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            references: ReferenceValues::default(),
            weights: ScoreWeights::default(),
            defaults: SignalDefaults::default(),
            segments: SegmentModel::default(),
            bat_lag_min_ms: 5.0,
            bat_lag_max_ms: 40.0,
            bat_lag_in_window_score: 100.0,
            bat_lag_outside_score: 70.0,
            contact_window_ms: 100.0,
        }
    }
}

/// Measured peaks for one swing; `None` where the signal was unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringInputs {
    /// deg/s
    pub peak_pelvis_velocity: Option<f64>,
    /// deg/s
    pub peak_torso_velocity: Option<f64>,
    /// deg
    pub max_separation: Option<f64>,
    /// N
    pub peak_force: Option<f64>,
    /// m/s
    pub peak_bat_speed: Option<f64>,
    /// m/s
    pub peak_hand_speed: Option<f64>,
    pub sequence_quality: Option<f64>,
    pub hands_bat_gap_ms: Option<f64>,
    /// percent
    pub transfer_efficiency: Option<f64>,
}

fn max_of<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

impl ScoringInputs {
    /// Measure every scoring signal from a detected swing
    pub fn extract(
        series: &KinematicSeries,
        events: &SwingEvents,
        sequence: &KineticSequence,
        body: Option<&Anthropometry>,
        config: &ScoringConfig,
    ) -> Self {
        let drive = series.velocity_range(events.load, events.contact);
        let drive = &series.velocities[drive];
        let around_contact = series.velocity_range(
            events.contact.offset_ms(-config.contact_window_ms),
            events.contact.offset_ms(config.contact_window_ms),
        );
        let around_contact = &series.velocities[around_contact];

        let peak_pelvis_velocity = max_of(drive.iter().map(|v| v.pelvis.abs()));
        let peak_torso_velocity = max_of(drive.iter().map(|v| v.torso.abs()));
        let peak_pelvis_linear = max_of(drive.iter().map(|v| v.pelvis_linear));
        let peak_bat_speed = max_of(around_contact.iter().map(|v| v.bat));
        let peak_hand_speed = max_of(around_contact.iter().map(|v| v.hand));

        let max_separation = max_of(
            series
                .angles
                .iter()
                .filter(|a| a.timestamp >= events.load && a.timestamp <= events.contact)
                .map(|a| a.separation()),
        );

        let swing_secs = events.swing_duration_ms() / 1000.0;
        let peak_force = match (body, peak_pelvis_linear) {
            (Some(body), Some(v)) if swing_secs > 0.0 => {
                Some(body.mass_kg() * (GRAVITY + v / swing_secs))
            }
            _ => None,
        };

        let transfer_efficiency = body.and_then(|body| {
            let energy = EnergyProxies::compute(
                body,
                &config.segments,
                peak_pelvis_velocity?,
                peak_torso_velocity?,
                peak_hand_speed?,
                peak_bat_speed?,
            );
            tracing::debug!(
                "Energy proxies: pelvis {:.0}J torso {:.0}J arms {:.0}J bat {:.0}J",
                energy.pelvis_j,
                energy.torso_j,
                energy.arms_j,
                energy.bat_j
            );
            energy.transfer_efficiency()
        });

        Self {
            peak_pelvis_velocity,
            peak_torso_velocity,
            max_separation,
            peak_force,
            peak_bat_speed,
            peak_hand_speed,
            sequence_quality: sequence.quality,
            hands_bat_gap_ms: sequence.hands_bat_gap_ms(),
            transfer_efficiency,
        }
    }
}

/// Peak kinetic energy proxies per segment (J)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyProxies {
    pub pelvis_j: f64,
    pub torso_j: f64,
    pub arms_j: f64,
    pub bat_j: f64,
}

impl EnergyProxies {
    pub fn compute(
        body: &Anthropometry,
        model: &SegmentModel,
        pelvis_dps: f64,
        torso_dps: f64,
        hand_ms: f64,
        bat_ms: f64,
    ) -> Self {
        let mass = body.mass_kg();
        let height = body.height_m();
        let rotational = |fraction: f64, gyration: f64, dps: f64| {
            let inertia = fraction * mass * (gyration * height).powi(2);
            0.5 * inertia * dps.to_radians().powi(2)
        };

        Self {
            pelvis_j: rotational(model.pelvis_mass_fraction, model.pelvis_gyration_ratio, pelvis_dps),
            torso_j: rotational(model.torso_mass_fraction, model.torso_gyration_ratio, torso_dps),
            arms_j: 0.5 * model.arms_mass_fraction * mass * hand_ms.powi(2),
            bat_j: 0.5 * body.bat_mass_kg() * bat_ms.powi(2),
        }
    }

    pub fn total_j(&self) -> f64 {
        self.pelvis_j + self.torso_j + self.arms_j + self.bat_j
    }

    /// Share of the chain's peak energy that reaches the bat, percent
    pub fn transfer_efficiency(&self) -> Option<f64> {
        let total = self.total_j();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        Some((self.bat_j / total * 100.0).min(100.0))
    }
}

/// Resolved peak values the scores were computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakMetrics {
    pub pelvis_velocity_dps: f64,
    pub torso_velocity_dps: f64,
    pub separation_deg: f64,
    pub peak_force_n: f64,
    pub bat_speed_ms: f64,
    pub bat_speed_mph: f64,
    pub hand_speed_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub ground: f64,
    pub engine: f64,
    pub weapon: f64,
    pub transfer_efficiency: f64,
    pub overall: f64,
    pub peaks: PeakMetrics,
    /// Signals replaced by their default
    pub defaulted: Vec<Signal>,
}

impl ComponentScores {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Ground => self.ground,
            Component::Engine => self.engine,
            Component::Weapon => self.weapon,
        }
    }

    /// Lowest-scoring component; earlier components win ties
    pub fn weakest(&self) -> Component {
        Component::ALL
            .iter()
            .copied()
            .fold(Component::Ground, |weakest, c| {
                if self.get(c) < self.get(weakest) {
                    c
                } else {
                    weakest
                }
            })
    }

    pub fn all_in_range(&self) -> bool {
        [self.ground, self.engine, self.weapon, self.overall, self.transfer_efficiency]
            .iter()
            .all(|s| (0.0..=100.0).contains(s))
    }
}

impl Record for ComponentScores {
    fn to_record(&self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        for (key, value) in [
            ("ground", self.ground),
            ("engine", self.engine),
            ("weapon", self.weapon),
            ("overall", self.overall),
            ("transfer_efficiency", self.transfer_efficiency),
        ] {
            map.insert(key.into(), round_to(value, 1).into());
        }
        if let Value::Object(peaks) = serde_json::to_value(&self.peaks)? {
            for (key, value) in peaks {
                map.insert(key, value);
            }
        }
        map.insert("defaulted".into(), serde_json::to_value(&self.defaulted)?);
        Ok(map)
    }
}

/// Clamp into [0, 100]; NaN scores as 0
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Measured value as a percentage of its reference, clamped to [0, 100]
pub fn ratio_score(measured: f64, reference: f64) -> f64 {
    if reference <= 0.0 {
        return 0.0;
    }
    clamp_score(measured / reference * 100.0)
}

pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, inputs: &ScoringInputs) -> ComponentScores {
        let mut defaulted = Vec::new();
        let mut resolve = |signal: Signal, value: Option<f64>| match value {
            Some(v) if v.is_finite() => v,
            _ => {
                let fallback = self.config.defaults.get(signal);
                tracing::warn!("{:?} unavailable; substituting default {}", signal, fallback);
                defaulted.push(signal);
                fallback
            }
        };

        let hip = resolve(Signal::HipVelocity, inputs.peak_pelvis_velocity);
        let torso = resolve(Signal::TorsoVelocity, inputs.peak_torso_velocity);
        let separation = resolve(Signal::Separation, inputs.max_separation);
        let force = resolve(Signal::PeakForce, inputs.peak_force);
        let bat = resolve(Signal::BatSpeed, inputs.peak_bat_speed);
        let hand = resolve(Signal::HandSpeed, inputs.peak_hand_speed);
        let sequence = resolve(Signal::SequenceQuality, inputs.sequence_quality);
        let lag = resolve(Signal::BatLag, inputs.hands_bat_gap_ms.map(|g| self.bat_lag_score(g)));
        let transfer = resolve(Signal::TransferEfficiency, inputs.transfer_efficiency);

        let r = &self.config.references;
        let w = &self.config.weights;

        let ground = clamp_score(
            w.ground_hip_velocity * ratio_score(hip, r.pelvis_velocity_dps)
                + w.ground_separation * ratio_score(separation, r.separation_deg)
                + w.ground_peak_force * ratio_score(force, r.peak_force_n),
        );
        let engine = clamp_score(
            w.engine_torso_velocity * ratio_score(torso, r.torso_velocity_dps)
                + w.engine_sequence * clamp_score(sequence)
                + w.engine_bat_speed * ratio_score(bat, r.bat_speed_ms),
        );
        let weapon = clamp_score(
            w.weapon_bat_speed * ratio_score(bat, r.bat_speed_ms)
                + w.weapon_hand_speed * ratio_score(hand, r.hand_speed_ms)
                + w.weapon_bat_lag * clamp_score(lag),
        );
        let overall = clamp_score((ground + engine + weapon) / 3.0);

        let scores = ComponentScores {
            ground,
            engine,
            weapon,
            transfer_efficiency: clamp_score(transfer),
            overall,
            peaks: PeakMetrics {
                pelvis_velocity_dps: hip,
                torso_velocity_dps: torso,
                separation_deg: separation,
                peak_force_n: force,
                bat_speed_ms: bat,
                bat_speed_mph: bat * MPS_TO_MPH,
                hand_speed_ms: hand,
            },
            defaulted,
        };
        debug_assert!(scores.all_in_range());

        tracing::debug!(
            "Scores: ground {:.1} engine {:.1} weapon {:.1} overall {:.1} transfer {:.1}%",
            scores.ground,
            scores.engine,
            scores.weapon,
            scores.overall,
            scores.transfer_efficiency
        );

        scores
    }

    fn bat_lag_score(&self, gap_ms: f64) -> f64 {
        if gap_ms >= self.config.bat_lag_min_ms && gap_ms <= self.config.bat_lag_max_ms {
            self.config.bat_lag_in_window_score
        } else {
            self.config.bat_lag_outside_score
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elite_inputs() -> ScoringInputs {
        ScoringInputs {
            peak_pelvis_velocity: Some(600.0),
            peak_torso_velocity: Some(800.0),
            max_separation: Some(40.0),
            peak_force: Some(1500.0),
            peak_bat_speed: Some(38.0),
            peak_hand_speed: Some(9.0),
            sequence_quality: Some(100.0),
            hands_bat_gap_ms: Some(20.0),
            transfer_efficiency: Some(60.0),
        }
    }

    #[test]
    fn test_reference_values_score_full_marks() {
        let scores = ScoringEngine::default().score(&elite_inputs());
        assert!((scores.ground - 100.0).abs() < 1e-9);
        assert!((scores.engine - 100.0).abs() < 1e-9);
        assert!((scores.weapon - 100.0).abs() < 1e-9);
        assert!((scores.overall - 100.0).abs() < 1e-9);
        assert!(scores.defaulted.is_empty());
    }

    #[test]
    fn test_half_reference() {
        let inputs = ScoringInputs {
            peak_pelvis_velocity: Some(300.0),
            max_separation: Some(20.0),
            peak_force: Some(750.0),
            ..elite_inputs()
        };
        let scores = ScoringEngine::default().score(&inputs);
        assert!((scores.ground - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_signals_use_defaults() {
        let scores = ScoringEngine::default().score(&ScoringInputs::default());

        assert_eq!(scores.defaulted.len(), 9);
        assert!(scores.defaulted.contains(&Signal::PeakForce));
        assert!((scores.transfer_efficiency - 75.0).abs() < 1e-9);
        // 0.4*50 + 0.3*50 + 0.3*(1000/1500*100)
        assert!((scores.ground - 55.0).abs() < 1e-9);
        assert!(scores.all_in_range());
    }

    #[test]
    fn test_extreme_inputs_stay_in_range() {
        let wild = [f64::MAX, -f64::MAX, 1e300, -1e-300, 0.0, f64::NAN, f64::INFINITY];
        let engine = ScoringEngine::default();
        for v in wild {
            let inputs = ScoringInputs {
                peak_pelvis_velocity: Some(v),
                peak_torso_velocity: Some(v),
                max_separation: Some(v),
                peak_force: Some(v),
                peak_bat_speed: Some(v),
                peak_hand_speed: Some(v),
                sequence_quality: Some(v),
                hands_bat_gap_ms: Some(v),
                transfer_efficiency: Some(v),
            };
            let scores = engine.score(&inputs);
            assert!(scores.all_in_range(), "out of range for input {}", v);
        }
    }

    #[test]
    fn test_bat_lag_window() {
        let engine = ScoringEngine::default();
        let late = ScoringInputs {
            hands_bat_gap_ms: Some(80.0),
            ..elite_inputs()
        };
        let scores = engine.score(&late);
        // Lag sub-score drops from 100 to 70 at weight 0.2
        assert!((scores.weapon - 94.0).abs() < 1e-9);
    }

    #[test]
    fn test_weakest_component() {
        let mut scores = ScoringEngine::default().score(&elite_inputs());
        scores.engine = 40.0;
        assert_eq!(scores.weakest(), Component::Engine);
        scores.weapon = 40.0;
        assert_eq!(scores.weakest(), Component::Engine);
    }

    #[test]
    fn test_energy_proxies() {
        let body = Anthropometry::new(72.0, 190.0, 74.0, 22.0, 31.0);
        let energy = EnergyProxies::compute(&body, &SegmentModel::default(), 600.0, 800.0, 8.0, 35.0);
        assert!(energy.bat_j > energy.torso_j);
        let efficiency = energy.transfer_efficiency().unwrap();
        assert!(efficiency > 0.0 && efficiency < 100.0);
        assert!((efficiency - energy.bat_j / energy.total_j() * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_export() {
        let scores = ScoringEngine::default().score(&elite_inputs());
        let record = scores.to_record().unwrap();
        assert!(record.contains_key("ground"));
        assert!(record.contains_key("transfer_efficiency"));
        assert!(record.contains_key("bat_speed_mph"));
        assert!(record.values().all(|v| !v.is_object()));
    }
}
