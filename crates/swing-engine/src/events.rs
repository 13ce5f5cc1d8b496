//! Swing phase detection.
//!
//! A swing moves through five keyframes in a fixed order with no
//! back-transitions:
//!
//! ```text
//! STANCE → LOAD → FOOT_DOWN → CONTACT → FOLLOW_THROUGH
//! ```
//!
//! - **Load**: largest backward pelvis rotation in the first half of the clip
//! - **Foot down**: pelvis rotates forward past a threshold relative to load
//! - **Contact**: peak bat-tip speed after foot down
//! - **Follow through**: end of the clip
//!
//! Each detector has a duration-fraction fallback so a degenerate capture
//! still yields a complete, ordered set of events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use swing_core::{
    refined_peak, wrap_degrees, Error, KinematicSeries, Result, Timestamp, MIN_VALID_FRAMES,
};

use crate::record::{round_to, Record};
use crate::tempo::{clamp_tempo_ratio, TempoCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwingPhase {
    Stance,
    Load,
    FootDown,
    Contact,
    FollowThrough,
}

impl SwingPhase {
    pub const ORDER: [SwingPhase; 5] = [
        SwingPhase::Stance,
        SwingPhase::Load,
        SwingPhase::FootDown,
        SwingPhase::Contact,
        SwingPhase::FollowThrough,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SwingPhase::Stance => "stance",
            SwingPhase::Load => "load",
            SwingPhase::FootDown => "foot_down",
            SwingPhase::Contact => "contact",
            SwingPhase::FollowThrough => "follow_through",
        }
    }
}

/// Phase detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Minimum spacing between consecutive events (ms)
    pub min_phase_ms: f64,
    /// Backward pelvis rotation needed to accept a detected load (deg)
    pub load_min_displacement_deg: f64,
    /// Forward pelvis rotation past load that marks foot down (deg)
    pub foot_down_threshold_deg: f64,
    /// Peak bat speed needed to accept a detected contact (m/s)
    pub contact_min_bat_velocity: f64,
    pub load_fallback_fraction: f64,
    pub foot_down_fallback_fraction: f64,
    pub contact_fallback_fraction: f64,
    /// Width of the window kept around peak bat speed; `None` analyzes the whole clip
    pub swing_window_ms: Option<f64>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            min_phase_ms: 10.0,
            load_min_displacement_deg: 5.0,
            foot_down_threshold_deg: 10.0,
            contact_min_bat_velocity: 1.0,
            load_fallback_fraction: 0.15,
            foot_down_fallback_fraction: 0.40,
            contact_fallback_fraction: 0.70,
            swing_window_ms: Some(2000.0),
        }
    }
}

/// The five keyframes of one swing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingEvents {
    pub stance: Timestamp,
    pub load: Timestamp,
    pub foot_down: Timestamp,
    pub contact: Timestamp,
    pub follow_through: Timestamp,
    /// Events placed by a duration fallback instead of detection
    pub fallbacks: Vec<SwingPhase>,
    /// Events pushed later to honour the minimum phase spacing
    pub adjusted: Vec<SwingPhase>,
}

impl SwingEvents {
    pub fn get(&self, phase: SwingPhase) -> Timestamp {
        match phase {
            SwingPhase::Stance => self.stance,
            SwingPhase::Load => self.load,
            SwingPhase::FootDown => self.foot_down,
            SwingPhase::Contact => self.contact,
            SwingPhase::FollowThrough => self.follow_through,
        }
    }

    /// Foot down minus load, ms
    pub fn load_duration_ms(&self) -> f64 {
        self.foot_down.millis_since(self.load)
    }

    /// Contact minus foot down, ms
    pub fn swing_duration_ms(&self) -> f64 {
        self.contact.millis_since(self.foot_down)
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.follow_through.millis_since(self.stance)
    }

    /// Load/swing ratio, always within [0.5, 10]
    pub fn tempo_ratio(&self) -> f64 {
        let swing = self.swing_duration_ms();
        if swing <= 0.0 {
            return clamp_tempo_ratio(f64::INFINITY);
        }
        clamp_tempo_ratio(self.load_duration_ms() / swing)
    }

    pub fn tempo_category(&self) -> TempoCategory {
        TempoCategory::from_ratio(self.tempo_ratio())
    }

    pub fn is_fallback(&self, phase: SwingPhase) -> bool {
        self.fallbacks.contains(&phase)
    }

    /// Phase in progress at `t`
    pub fn phase_at(&self, t: Timestamp) -> SwingPhase {
        SwingPhase::ORDER
            .iter()
            .rev()
            .copied()
            .find(|p| t >= self.get(*p))
            .unwrap_or(SwingPhase::Stance)
    }

    /// Checks ordering and spacing
    pub fn validate(&self, min_phase_ms: f64) -> Result<()> {
        if self.load < self.stance {
            return Err(Error::InvariantViolation(format!(
                "load ({:.3}ms) precedes stance ({:.3}ms)",
                self.load.as_millis(),
                self.stance.as_millis()
            )));
        }
        for pair in SwingPhase::ORDER.windows(2) {
            let gap = self.get(pair[1]).millis_since(self.get(pair[0]));
            if gap < min_phase_ms - 1e-6 {
                return Err(Error::InvariantViolation(format!(
                    "{} -> {} spacing {:.3}ms below {:.1}ms",
                    pair[0].name(),
                    pair[1].name(),
                    gap,
                    min_phase_ms
                )));
            }
        }
        Ok(())
    }
}

impl Record for SwingEvents {
    fn to_record(&self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        for phase in SwingPhase::ORDER {
            map.insert(
                format!("{}_ms", phase.name()),
                Value::from(round_to(self.get(phase).as_millis(), 3)),
            );
        }
        map.insert("load_duration_ms".into(), Value::from(round_to(self.load_duration_ms(), 3)));
        map.insert("swing_duration_ms".into(), Value::from(round_to(self.swing_duration_ms(), 3)));
        map.insert("total_duration_ms".into(), Value::from(round_to(self.total_duration_ms(), 3)));
        map.insert("tempo_ratio".into(), Value::from(round_to(self.tempo_ratio(), 2)));
        map.insert("tempo_category".into(), Value::from(self.tempo_category().label()));
        map.insert(
            "fallbacks".into(),
            Value::from(self.fallbacks.iter().map(|p| p.name()).collect::<Vec<_>>()),
        );
        Ok(map)
    }
}

/// Finds the five swing keyframes in a kinematic series
#[derive(Debug, Clone, Default)]
pub struct EventDetector {
    config: EventConfig,
}

impl EventDetector {
    pub fn new(config: EventConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    /// Trim a long recording to the window around peak bat speed.
    ///
    /// Returns the series unchanged when no clear peak exists or the window
    /// would leave too few frames to analyze.
    pub fn isolate(&self, series: &KinematicSeries) -> KinematicSeries {
        let Some(window_ms) = self.config.swing_window_ms else {
            return series.clone();
        };

        let peak = refined_peak(&series.velocities, 0..series.velocities.len(), |v| v.bat);
        let peak = match peak {
            Some(p) if p.value >= self.config.contact_min_bat_velocity => p,
            _ => {
                tracing::warn!("No bat speed peak to isolate the swing around; analyzing full clip");
                return series.clone();
            }
        };

        let start = peak.timestamp.offset_ms(-window_ms / 2.0).max(series.start());
        let end = peak.timestamp.offset_ms(window_ms / 2.0).min(series.end());
        if start == series.start() && end == series.end() {
            return series.clone();
        }

        let windowed = series.window(start, end);
        if windowed.angles.len() < MIN_VALID_FRAMES {
            tracing::warn!(
                "Swing window holds only {} frames; analyzing full clip",
                windowed.angles.len()
            );
            return series.clone();
        }

        tracing::debug!(
            "Isolated swing window {:.1}-{:.1}ms around peak bat speed {:.2} m/s",
            start.as_millis(),
            end.as_millis(),
            peak.value
        );
        windowed
    }

    pub fn detect(&self, series: &KinematicSeries) -> Result<SwingEvents> {
        if series.angles.len() < MIN_VALID_FRAMES {
            return Err(Error::InsufficientData {
                required: MIN_VALID_FRAMES,
                available: series.angles.len(),
            });
        }

        let mut fallbacks = Vec::new();
        let stance = series.start();

        let load = self.detect_load(series).unwrap_or_else(|| {
            fallbacks.push(SwingPhase::Load);
            series.time_at_fraction(self.config.load_fallback_fraction)
        });

        let foot_down = self.detect_foot_down(series, load).unwrap_or_else(|| {
            fallbacks.push(SwingPhase::FootDown);
            series.time_at_fraction(self.config.foot_down_fallback_fraction)
        });

        let contact = self.detect_contact(series, foot_down).unwrap_or_else(|| {
            fallbacks.push(SwingPhase::Contact);
            series.time_at_fraction(self.config.contact_fallback_fraction)
        });

        for phase in &fallbacks {
            tracing::warn!("{} not detected; using duration fallback", phase.name());
        }

        let mut events = SwingEvents {
            stance,
            load,
            foot_down,
            contact,
            follow_through: series.end(),
            fallbacks,
            adjusted: Vec::new(),
        };
        self.enforce_spacing(&mut events);
        events.validate(self.config.min_phase_ms)?;

        tracing::debug!(
            "Swing events: load={:.1}ms foot_down={:.1}ms contact={:.1}ms tempo={:.2}",
            events.load.as_millis(),
            events.foot_down.as_millis(),
            events.contact.as_millis(),
            events.tempo_ratio()
        );

        Ok(events)
    }

    fn detect_load(&self, series: &KinematicSeries) -> Option<Timestamp> {
        let initial = series.angles.first()?.pelvis;
        let half = series.time_at_fraction(0.5);

        let mut best: Option<(usize, f64)> = None;
        for (i, angles) in series.angles.iter().enumerate() {
            if angles.timestamp > half {
                break;
            }
            let backward = wrap_degrees(initial - angles.pelvis);
            if best.map_or(true, |(_, b)| backward > b) {
                best = Some((i, backward));
            }
        }

        match best {
            Some((i, displacement)) if i > 0 && displacement >= self.config.load_min_displacement_deg => {
                Some(series.angles[i].timestamp)
            }
            _ => None,
        }
    }

    /// First forward crossing of the threshold after load, interpolated
    /// between the bracketing samples.
    fn detect_foot_down(&self, series: &KinematicSeries, load: Timestamp) -> Option<Timestamp> {
        let reference = series.pelvis_at(load)?;
        let threshold = self.config.foot_down_threshold_deg;

        let mut prev = (load, 0.0);
        for angles in series.angles.iter().filter(|a| a.timestamp > load) {
            let forward = wrap_degrees(angles.pelvis - reference);
            if forward > threshold {
                let (t0, d0) = prev;
                let span = angles.timestamp.millis_since(t0);
                let alpha = ((threshold - d0) / (forward - d0)).clamp(0.0, 1.0);
                return Some(t0.offset_ms(alpha * span));
            }
            prev = (angles.timestamp, forward);
        }
        None
    }

    fn detect_contact(&self, series: &KinematicSeries, foot_down: Timestamp) -> Option<Timestamp> {
        let candidates = series.velocity_range(foot_down.offset_ms(1e-6), series.end());
        let peak = refined_peak(&series.velocities, candidates, |v| v.bat)?;
        if peak.value < self.config.contact_min_bat_velocity || peak.timestamp <= foot_down {
            return None;
        }
        Some(peak.timestamp)
    }

    /// Push later events forward until every gap meets the minimum
    fn enforce_spacing(&self, events: &mut SwingEvents) {
        let gap = self.config.min_phase_ms;
        let mut previous = events.stance;

        for phase in &SwingPhase::ORDER[1..] {
            let earliest = previous.offset_ms(gap);
            let slot = match phase {
                SwingPhase::Load => &mut events.load,
                SwingPhase::FootDown => &mut events.foot_down,
                SwingPhase::Contact => &mut events.contact,
                SwingPhase::FollowThrough => &mut events.follow_through,
                SwingPhase::Stance => continue,
            };
            if *slot < earliest {
                *slot = earliest;
                events.adjusted.push(*phase);
            }
            previous = *slot;
        }
    }
}
