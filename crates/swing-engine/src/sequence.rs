//! Kinetic chain sequencing.
//!
//! An efficient swing fires proximal-to-distal: pelvis, torso, lead
//! shoulder, hands, then the bat, each segment peaking shortly after the
//! one before it. Quality rewards that order with 15-30ms spacing and
//! penalizes every adjacent inversion.

use serde::{Deserialize, Serialize};
use swing_core::{refined_peak, JointVelocities, KinematicSeries, Timestamp};

use crate::events::SwingEvents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    Pelvis,
    Torso,
    Shoulder,
    Hand,
    Bat,
}

impl Segment {
    /// Expected firing order
    pub const CHAIN: [Segment; 5] = [
        Segment::Pelvis,
        Segment::Torso,
        Segment::Shoulder,
        Segment::Hand,
        Segment::Bat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Segment::Pelvis => "pelvis",
            Segment::Torso => "torso",
            Segment::Shoulder => "shoulder",
            Segment::Hand => "hand",
            Segment::Bat => "bat",
        }
    }

    /// Speed of this segment in a velocity sample: |deg/s| for rotating
    /// segments, m/s for hand and bat. NaN when the joint was not tracked.
    pub fn speed(&self, v: &JointVelocities) -> f64 {
        match self {
            Segment::Pelvis => v.pelvis.abs(),
            Segment::Torso => v.torso.abs(),
            Segment::Shoulder => v.shoulder.map_or(f64::NAN, f64::abs),
            Segment::Hand => v.hand,
            Segment::Bat => v.bat,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub ideal_gap_min_ms: f64,
    pub ideal_gap_max_ms: f64,
    pub ideal_score: f64,
    pub rushed_score: f64,
    pub slow_score: f64,
    pub inversion_penalty: f64,
    /// How far before contact segment peaks are searched for (ms)
    pub lookback_ms: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            ideal_gap_min_ms: 15.0,
            ideal_gap_max_ms: 30.0,
            ideal_score: 100.0,
            rushed_score: 80.0,
            slow_score: 90.0,
            inversion_penalty: 25.0,
            lookback_ms: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentPeak {
    pub segment: Segment,
    pub timestamp: Timestamp,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequencePattern {
    Optimal,
    Rushed,
    Slow,
    OutOfOrder,
}

impl SequencePattern {
    pub fn description(&self) -> &'static str {
        match self {
            SequencePattern::Optimal => "Proximal-to-distal with ideal spacing",
            SequencePattern::Rushed => "Correct order but segments fire almost together",
            SequencePattern::Slow => "Correct order but energy stalls between segments",
            SequencePattern::OutOfOrder => "Segments peak out of order; energy leaks through the chain",
        }
    }
}

/// Peak timing of each segment and the resulting sequence quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticSequence {
    /// Found peaks in chain order; an untracked segment is absent
    pub peaks: Vec<SegmentPeak>,
    /// Gaps between consecutive found peaks (ms), negative when inverted
    pub gaps_ms: Vec<f64>,
    pub inversions: usize,
    pub average_gap_ms: f64,
    pub pattern: Option<SequencePattern>,
    /// 0-100, `None` unless all five segments were found
    pub quality: Option<f64>,
}

impl KineticSequence {
    pub fn peak(&self, segment: Segment) -> Option<&SegmentPeak> {
        self.peaks.iter().find(|p| p.segment == segment)
    }

    pub fn is_complete(&self) -> bool {
        self.peaks.len() == Segment::CHAIN.len()
    }

    pub fn is_proximal_to_distal(&self) -> bool {
        self.is_complete() && self.inversions == 0
    }

    fn gap_between(&self, first: Segment, second: Segment) -> Option<f64> {
        Some(self.peak(second)?.timestamp.millis_since(self.peak(first)?.timestamp))
    }

    /// Torso peak minus pelvis peak (ms)
    pub fn hip_shoulder_gap_ms(&self) -> Option<f64> {
        self.gap_between(Segment::Pelvis, Segment::Torso)
    }

    /// Bat peak minus hand peak (ms)
    pub fn hands_bat_gap_ms(&self) -> Option<f64> {
        self.gap_between(Segment::Hand, Segment::Bat)
    }
}

pub struct SequenceAnalyzer {
    config: SequenceConfig,
}

impl SequenceAnalyzer {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, series: &KinematicSeries, events: &SwingEvents) -> KineticSequence {
        let from = events
            .contact
            .offset_ms(-self.config.lookback_ms)
            .max(events.stance);
        let candidates = series.velocity_range(from, events.contact);

        let peaks: Vec<SegmentPeak> = Segment::CHAIN
            .iter()
            .filter_map(|segment| {
                let peak = refined_peak(&series.velocities, candidates.clone(), |v| segment.speed(v));
                if peak.is_none() {
                    tracing::debug!("No {} peak before contact", segment.name());
                }
                peak.map(|p| SegmentPeak {
                    segment: *segment,
                    timestamp: p.timestamp,
                    value: p.value,
                })
            })
            .collect();

        self.from_peaks(peaks)
    }

    /// Score an already-located set of peaks (chain order)
    pub fn from_peaks(&self, peaks: Vec<SegmentPeak>) -> KineticSequence {
        let gaps_ms: Vec<f64> = peaks
            .windows(2)
            .map(|w| w[1].timestamp.millis_since(w[0].timestamp))
            .collect();
        let inversions = gaps_ms.iter().filter(|g| **g < 0.0).count();
        let average_gap_ms = if gaps_ms.is_empty() {
            0.0
        } else {
            gaps_ms.iter().sum::<f64>() / gaps_ms.len() as f64
        };

        let complete = peaks.len() == Segment::CHAIN.len();
        let pattern = complete.then(|| self.pattern(inversions, average_gap_ms));
        let quality = pattern.map(|p| self.quality(p, inversions));

        if let Some(q) = quality {
            tracing::debug!(
                "Kinetic sequence: {} inversions, mean gap {:.1}ms, quality {:.0}",
                inversions,
                average_gap_ms,
                q
            );
        }

        KineticSequence {
            peaks,
            gaps_ms,
            inversions,
            average_gap_ms,
            pattern,
            quality,
        }
    }

    fn pattern(&self, inversions: usize, average_gap_ms: f64) -> SequencePattern {
        if inversions > 0 {
            SequencePattern::OutOfOrder
        } else if average_gap_ms < self.config.ideal_gap_min_ms {
            SequencePattern::Rushed
        } else if average_gap_ms > self.config.ideal_gap_max_ms {
            SequencePattern::Slow
        } else {
            SequencePattern::Optimal
        }
    }

    fn quality(&self, pattern: SequencePattern, inversions: usize) -> f64 {
        match pattern {
            SequencePattern::Optimal => self.config.ideal_score,
            SequencePattern::Rushed => self.config.rushed_score,
            SequencePattern::Slow => self.config.slow_score,
            SequencePattern::OutOfOrder => {
                (100.0 - self.config.inversion_penalty * inversions as f64).max(0.0)
            }
        }
    }
}

impl Default for SequenceAnalyzer {
    fn default() -> Self {
        Self::new(SequenceConfig::default())
    }
}
