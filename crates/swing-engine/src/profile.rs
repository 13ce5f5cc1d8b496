//! Motor profile classification from the three component scores.
//!
//! ## Profiles
//!
//! | Profile | Pattern |
//! |---------|---------|
//! | Titan | High everywhere, bonus for anything above 80 |
//! | Spinner | Strong engine, weapon lagging behind the body |
//! | Slingshotter | Ground-driven, engine in the low 70s |
//! | Whipper | Hands and bat carry the swing, weak ground |
//! | Balanced | All three components close together |
//!
//! Every profile is scored and the best match wins; ties go to the profile
//! listed first. The winning match score is the confidence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use swing_core::Result;

use crate::record::{round_to, Record};
use crate::scoring::{clamp_score, ComponentScores};
use crate::tempo::TempoCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Below this confidence the runner-up is reported as well
    pub secondary_threshold: f64,
    /// Score above which Titan earns bonus credit
    pub titan_bonus_threshold: f64,
    /// Component level treated as "strong" / "weak" in profile rules
    pub strong_threshold: f64,
    pub weak_threshold: f64,
    /// Engine score a Slingshotter is centred on
    pub slingshot_engine_center: f64,
    /// Points deducted from Balanced per unit of standard deviation
    pub balanced_spread_penalty: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            secondary_threshold: 80.0,
            titan_bonus_threshold: 80.0,
            strong_threshold: 75.0,
            weak_threshold: 70.0,
            slingshot_engine_center: 72.5,
            balanced_spread_penalty: 3.33,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotorProfileKind {
    Titan,
    Spinner,
    Slingshotter,
    Whipper,
    Balanced,
}

impl MotorProfileKind {
    /// Evaluation order, also the tie-break order
    pub const ORDER: [MotorProfileKind; 5] = [
        MotorProfileKind::Titan,
        MotorProfileKind::Spinner,
        MotorProfileKind::Slingshotter,
        MotorProfileKind::Whipper,
        MotorProfileKind::Balanced,
    ];

    /// Match score in [0, 100] for a set of component scores
    pub fn score(&self, g: f64, e: f64, w: f64, config: &ProfileConfig) -> f64 {
        let weak = config.weak_threshold;
        let raw = match self {
            MotorProfileKind::Titan => {
                let bonus: f64 = [g, e, w]
                    .iter()
                    .map(|s| (s - config.titan_bonus_threshold).max(0.0))
                    .sum();
                (g + e + w + 0.5 * bonus) / 300.0 * 100.0
            }
            MotorProfileKind::Spinner => {
                let engine = if e >= config.strong_threshold { e * 0.40 } else { e * 0.20 };
                let lagging_hands = if w < weak { (100.0 - w) * 0.30 } else { 0.0 };
                g * 0.30 + engine + lagging_hands
            }
            MotorProfileKind::Slingshotter => {
                let engine_fit = 100.0 - (e - config.slingshot_engine_center).abs();
                let lagging_hands = if w < weak { (100.0 - w) * 0.30 } else { 0.0 };
                g * 0.40 + engine_fit * 0.30 + lagging_hands
            }
            MotorProfileKind::Whipper => {
                let weak_ground = if g < weak { (100.0 - g) * 0.40 } else { 0.0 };
                weak_ground + w * 0.40 + e * 0.20
            }
            MotorProfileKind::Balanced => {
                let mean = (g + e + w) / 3.0;
                let variance = ((g - mean).powi(2) + (e - mean).powi(2) + (w - mean).powi(2)) / 3.0;
                100.0 - variance.sqrt() * config.balanced_spread_penalty
            }
        };
        clamp_score(raw)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MotorProfileKind::Titan => "Titan",
            MotorProfileKind::Spinner => "Spinner",
            MotorProfileKind::Slingshotter => "Slingshotter",
            MotorProfileKind::Whipper => "Whipper",
            MotorProfileKind::Balanced => "Balanced",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MotorProfileKind::Titan => "Elite power and efficiency across the whole chain",
            MotorProfileKind::Spinner => "Rotation-dominant: fast core turn that outruns the hands",
            MotorProfileKind::Slingshotter => "Ground-dominant: loads into the back side and slings the bat with separation",
            MotorProfileKind::Whipper => "Hand-dominant: quick hands and bat control with little lower-body support",
            MotorProfileKind::Balanced => "Even contribution from ground, engine and weapon",
        }
    }

    pub fn improvement_focus(&self) -> &'static str {
        match self {
            MotorProfileKind::Titan => "Maintain strength and keep mechanics repeatable",
            MotorProfileKind::Spinner => "Connect the hands to the rotation so core speed reaches the barrel",
            MotorProfileKind::Slingshotter => "Speed up torso rotation to cash in the stored separation",
            MotorProfileKind::Whipper => "Build lower-body drive so the hands have something to ride on",
            MotorProfileKind::Balanced => "Raise all three together, starting with the lowest",
        }
    }
}

/// Inputs to classification; timing features only add characteristics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileInputs {
    pub ground: f64,
    pub engine: f64,
    pub weapon: f64,
    pub sequence_quality: Option<f64>,
    pub tempo_ratio: Option<f64>,
}

impl ProfileInputs {
    pub fn from_scores(scores: &ComponentScores) -> Self {
        Self {
            ground: scores.ground,
            engine: scores.engine,
            weapon: scores.weapon,
            sequence_quality: None,
            tempo_ratio: None,
        }
    }

    pub fn with_timing(mut self, sequence_quality: Option<f64>, tempo_ratio: Option<f64>) -> Self {
        self.sequence_quality = sequence_quality;
        self.tempo_ratio = tempo_ratio;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileMatch {
    pub kind: MotorProfileKind,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorProfile {
    pub kind: MotorProfileKind,
    /// Winning match score, 0-100
    pub confidence: f64,
    /// Runner-up when the win is not decisive
    pub secondary: Option<ProfileMatch>,
    /// Every profile's match score, in evaluation order
    pub matches: Vec<ProfileMatch>,
    pub characteristics: Vec<String>,
    pub description: String,
    pub improvement_focus: String,
}

impl MotorProfile {
    pub fn is_ambiguous(&self) -> bool {
        self.secondary.is_some()
    }
}

impl Record for MotorProfile {
    fn to_record(&self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("kind".into(), self.kind.name().into());
        map.insert("confidence".into(), round_to(self.confidence, 1).into());
        map.insert(
            "secondary".into(),
            self.secondary.map_or(Value::Null, |m| m.kind.name().into()),
        );
        for m in &self.matches {
            map.insert(
                format!("{}_match", m.kind.name().to_lowercase()),
                round_to(m.score, 1).into(),
            );
        }
        map.insert("characteristics".into(), self.characteristics.clone().into());
        map.insert("description".into(), self.description.clone().into());
        map.insert("improvement_focus".into(), self.improvement_focus.clone().into());
        Ok(map)
    }
}

pub struct ProfileClassifier {
    config: ProfileConfig,
}

impl ProfileClassifier {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, inputs: &ProfileInputs) -> MotorProfile {
        let g = clamp_score(inputs.ground);
        let e = clamp_score(inputs.engine);
        let w = clamp_score(inputs.weapon);

        let matches: Vec<ProfileMatch> = MotorProfileKind::ORDER
            .iter()
            .map(|kind| ProfileMatch {
                kind: *kind,
                score: kind.score(g, e, w, &self.config),
            })
            .collect();

        let best = Self::best_of(matches.iter());
        let secondary = if best.score < self.config.secondary_threshold {
            Self::best_of_opt(matches.iter().filter(|m| m.kind != best.kind))
        } else {
            None
        };

        tracing::debug!(
            "Motor profile {} ({:.1}), secondary {:?}",
            best.kind.name(),
            best.score,
            secondary.map(|m| m.kind)
        );

        MotorProfile {
            kind: best.kind,
            confidence: best.score,
            secondary,
            characteristics: self.characteristics(g, e, w, inputs),
            description: best.kind.description().to_string(),
            improvement_focus: best.kind.improvement_focus().to_string(),
            matches,
        }
    }

    fn best_of<'a>(matches: impl Iterator<Item = &'a ProfileMatch>) -> ProfileMatch {
        Self::best_of_opt(matches).unwrap_or(ProfileMatch {
            kind: MotorProfileKind::Balanced,
            score: 0.0,
        })
    }

    /// Strictly greater replaces, so the earliest profile keeps a tie
    fn best_of_opt<'a>(matches: impl Iterator<Item = &'a ProfileMatch>) -> Option<ProfileMatch> {
        matches.fold(None, |best: Option<ProfileMatch>, m| match best {
            Some(b) if b.score >= m.score => Some(b),
            _ => Some(*m),
        })
    }

    fn characteristics(&self, g: f64, e: f64, w: f64, inputs: &ProfileInputs) -> Vec<String> {
        let ladder = |score: f64, labels: [&'static str; 4]| {
            if score >= 85.0 {
                labels[0]
            } else if score >= 70.0 {
                labels[1]
            } else if score >= 55.0 {
                labels[2]
            } else {
                labels[3]
            }
        };

        let mut out = vec![
            ladder(
                g,
                [
                    "Excellent lower body power generation",
                    "Good lower body mechanics",
                    "Moderate lower body engagement",
                    "Limited lower body contribution",
                ],
            )
            .to_string(),
            ladder(
                e,
                [
                    "Elite core rotation and energy transfer",
                    "Good torso rotation velocity",
                    "Average core engagement",
                    "Weak torso rotation",
                ],
            )
            .to_string(),
            ladder(
                w,
                [
                    "Excellent bat speed and barrel control",
                    "Good hand path efficiency",
                    "Average bat-to-ball ability",
                    "Poor energy transfer to bat",
                ],
            )
            .to_string(),
        ];

        let strong = self.config.strong_threshold;
        if g > strong && e > strong && w < 60.0 {
            out.push("Body rotates well but hands disconnect".into());
        } else if g > strong && w < 60.0 {
            out.push("Strong foundation but weak transfer to contact".into());
        }
        if w > strong && g < 60.0 {
            out.push("Hand-dominated swing lacking body support".into());
        }

        if let Some(quality) = inputs.sequence_quality {
            if quality >= 100.0 {
                out.push("Clean proximal-to-distal sequence".into());
            } else if quality < 75.0 {
                out.push("Kinetic chain fires out of order".into());
            }
        }
        if let Some(ratio) = inputs.tempo_ratio {
            out.push(format!(
                "{} tempo ({:.2}:1)",
                TempoCategory::from_ratio(ratio).label(),
                ratio
            ));
        }

        out
    }
}

impl Default for ProfileClassifier {
    fn default() -> Self {
        Self::new(ProfileConfig::default())
    }
}
