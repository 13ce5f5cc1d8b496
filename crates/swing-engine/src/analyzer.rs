//! Complete swing pipeline orchestrating every analysis stage.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swing_core::{Anthropometry, JointFrame, KinematicDeriver, Result};

use crate::capacity::{CapacityCalculator, CapacityRange};
use crate::config::EngineConfig;
use crate::events::{EventDetector, SwingEvents};
use crate::gap::{GapAnalysis, GapAnalyzer};
use crate::krs::KrsScore;
use crate::profile::{MotorProfile, ProfileClassifier, ProfileInputs};
use crate::scoring::{ComponentScores, ScoringEngine, ScoringInputs};
use crate::sequence::{KineticSequence, SequenceAnalyzer};
use crate::tempo::{TempoCategory, TempoConsistency};

/// Everything derived from one swing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingAnalysis {
    pub events: SwingEvents,
    pub tempo_ratio: f64,
    pub tempo_category: TempoCategory,
    pub sequence: KineticSequence,
    pub scores: ComponentScores,
    pub krs: KrsScore,
    pub profile: MotorProfile,
    /// Present when anthropometry was supplied
    pub capacity: Option<CapacityRange>,
    pub gap: Option<GapAnalysis>,
}

struct Stages {
    config: EngineConfig,
    deriver: KinematicDeriver,
    detector: EventDetector,
    sequencer: SequenceAnalyzer,
    scorer: ScoringEngine,
    classifier: ProfileClassifier,
    capacity: CapacityCalculator,
    gap: GapAnalyzer,
}

/// Frames in, analysis out. Stateless; clones share the same stages.
#[derive(Clone)]
pub struct SwingPipeline {
    stages: Arc<Stages>,
}

impl SwingPipeline {
    pub fn new(config: EngineConfig) -> Self {
        let stages = Stages {
            deriver: KinematicDeriver::new(config.derivation.clone()),
            detector: EventDetector::new(config.events.clone()),
            sequencer: SequenceAnalyzer::new(config.sequence.clone()),
            scorer: ScoringEngine::new(config.scoring.clone()),
            classifier: ProfileClassifier::new(config.profile.clone()),
            capacity: CapacityCalculator::new(config.capacity.clone()),
            gap: GapAnalyzer::new(config.gap.clone()),
            config,
        };
        Self {
            stages: Arc::new(stages),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.stages.config
    }

    /// Bat-speed capacity for an athlete
    pub fn capacity(&self, athlete: &Anthropometry) -> Result<CapacityRange> {
        self.stages.capacity.calculate(athlete)
    }

    /// Analyze one swing. With `athlete`, capacity and gap analysis are
    /// included and body size scales the linear velocities.
    pub fn analyze(&self, frames: &[JointFrame], athlete: Option<&Anthropometry>) -> Result<SwingAnalysis> {
        let capacity = athlete.map(|a| self.capacity(a)).transpose()?;
        self.analyze_with_capacity(frames, athlete, capacity)
    }

    /// Analyze one swing against an already computed capacity
    pub fn analyze_with_capacity(
        &self,
        frames: &[JointFrame],
        athlete: Option<&Anthropometry>,
        capacity: Option<CapacityRange>,
    ) -> Result<SwingAnalysis> {
        let s = &*self.stages;

        let series = s.deriver.derive(frames, athlete.map(|a| a.height_m()))?;
        let series = s.detector.isolate(&series);
        let events = s.detector.detect(&series)?;
        let sequence = s.sequencer.analyze(&series, &events);

        let inputs = ScoringInputs::extract(&series, &events, &sequence, athlete, &s.config.scoring);
        let scores = s.scorer.score(&inputs);
        let krs = KrsScore::from_scores(&scores, &s.config.krs);

        let tempo_ratio = events.tempo_ratio();
        let profile = s.classifier.classify(
            &ProfileInputs::from_scores(&scores).with_timing(sequence.quality, Some(tempo_ratio)),
        );

        let gap = capacity
            .as_ref()
            .map(|c| s.gap.analyze(&scores, c))
            .transpose()?;

        tracing::info!(
            "Analyzed swing: {} frames, tempo {:.2}, overall {:.1}, KRS {:.1} ({}), profile {}",
            frames.len(),
            tempo_ratio,
            scores.overall,
            krs.total,
            krs.level.label(),
            profile.kind.name()
        );

        Ok(SwingAnalysis {
            tempo_category: events.tempo_category(),
            tempo_ratio,
            events,
            sequence,
            scores,
            krs,
            profile,
            capacity,
            gap,
        })
    }

    /// Tempo consistency across a session of swings
    pub fn consistency(analyses: &[SwingAnalysis]) -> Option<TempoConsistency> {
        let ratios: Vec<f64> = analyses.iter().map(|a| a.tempo_ratio).collect();
        TempoConsistency::from_ratios(&ratios)
    }
}

impl Default for SwingPipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
