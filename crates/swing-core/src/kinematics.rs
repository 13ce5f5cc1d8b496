//! Joint angle and velocity derivation.
//!
//! Angles come straight from landmark geometry; velocities are first-order
//! finite differences between consecutive valid frames. No smoothing is
//! applied beyond whatever the landmark provider already did.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{joint_angle_deg, rotation_angle_deg, wrap_degrees};
use crate::types::{Joint, JointFrame, Position3D, Timestamp};

/// Fewest valid frames a swing can be analyzed from
pub const MIN_VALID_FRAMES: usize = 5;

/// Parameters for turning landmarks into physical quantities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Landmarks below this confidence are treated as missing
    pub min_confidence: f32,
    /// Metres per normalized image unit when the athlete's height is unknown
    pub default_scale_m: f64,
    /// Lever arm from the lead shoulder to the bat's sweet spot (m)
    pub effective_radius_m: f64,
    /// Physical ceiling on bat-tip speed (m/s)
    pub max_bat_velocity_ms: f64,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            default_scale_m: 1.8,
            effective_radius_m: 2.0,
            max_bat_velocity_ms: 53.0,
        }
    }
}

/// Segment and joint angles for one frame, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub frame_index: u32,
    pub timestamp: Timestamp,
    /// Hip line rotation
    pub pelvis: f64,
    /// Shoulder line rotation
    pub torso: f64,
    /// Trail shoulder - hip - knee
    pub hip: Option<f64>,
    /// Hip - shoulder - elbow on the lead arm
    pub shoulder: Option<f64>,
    /// Shoulder - elbow - wrist on the lead arm
    pub elbow: Option<f64>,
    /// Hip - knee - ankle on the front leg
    pub knee: Option<f64>,
}

impl JointAngles {
    /// `None` when any required landmark is missing or below `min_confidence`
    pub fn from_frame(frame: &JointFrame, min_confidence: f32) -> Option<Self> {
        let get = |joint: Joint| frame.position(joint, min_confidence);

        let left_shoulder = get(Joint::LeftShoulder)?;
        let right_shoulder = get(Joint::RightShoulder)?;
        let left_hip = get(Joint::LeftHip)?;
        let right_hip = get(Joint::RightHip)?;
        let right_elbow = get(Joint::RightElbow)?;
        let right_wrist = get(Joint::RightWrist)?;

        let hip = get(Joint::RightKnee)
            .and_then(|knee| joint_angle_deg(&right_shoulder, &right_hip, &knee));
        let knee = match (get(Joint::LeftKnee), get(Joint::LeftAnkle)) {
            (Some(knee), Some(ankle)) => joint_angle_deg(&left_hip, &knee, &ankle),
            _ => None,
        };

        Some(Self {
            frame_index: frame.frame_index,
            timestamp: frame.timestamp,
            pelvis: rotation_angle_deg(&left_hip, &right_hip),
            torso: rotation_angle_deg(&left_shoulder, &right_shoulder),
            hip,
            shoulder: joint_angle_deg(&right_hip, &right_shoulder, &right_elbow),
            elbow: joint_angle_deg(&right_shoulder, &right_elbow, &right_wrist),
            knee,
        })
    }

    /// Hip-shoulder separation (X-factor), degrees
    pub fn separation(&self) -> f64 {
        wrap_degrees(self.torso - self.pelvis).abs()
    }
}

/// Velocities over one consecutive frame pair, stamped at the pair's midpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointVelocities {
    pub timestamp: Timestamp,
    /// deg/s, signed
    pub pelvis: f64,
    pub torso: f64,
    pub hip: Option<f64>,
    pub shoulder: Option<f64>,
    pub elbow: Option<f64>,
    pub knee: Option<f64>,
    /// Lead wrist linear speed, m/s
    pub hand: f64,
    /// Hip midpoint linear speed, m/s
    pub pelvis_linear: f64,
    /// Estimated bat-tip linear speed, m/s
    pub bat: f64,
}

/// Angular velocity in deg/s; zero when time does not advance
pub fn angular_velocity(previous: f64, current: f64, dt_secs: f64) -> f64 {
    if dt_secs <= 0.0 {
        return 0.0;
    }
    wrap_degrees(current - previous) / dt_secs
}

fn optional_velocity(previous: Option<f64>, current: Option<f64>, dt_secs: f64) -> Option<f64> {
    Some(angular_velocity(previous?, current?, dt_secs))
}

/// Linear speed of a landmark in m/s, given metres per normalized unit
pub fn linear_velocity(previous: &Position3D, current: &Position3D, scale_m: f64, dt_secs: f64) -> f64 {
    if dt_secs <= 0.0 {
        return 0.0;
    }
    previous.planar_distance_to(current) * scale_m / dt_secs
}

/// Time-ordered derived series for one swing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicSeries {
    pub angles: Vec<JointAngles>,
    pub velocities: Vec<JointVelocities>,
    /// Metres per normalized image unit used for linear speeds
    pub scale_m: f64,
}

impl KinematicSeries {
    pub fn start(&self) -> Timestamp {
        self.angles.first().map(|a| a.timestamp).unwrap_or(Timestamp::ZERO)
    }

    pub fn end(&self) -> Timestamp {
        self.angles.last().map(|a| a.timestamp).unwrap_or(Timestamp::ZERO)
    }

    pub fn duration_ms(&self) -> f64 {
        self.end().millis_since(self.start())
    }

    /// Time at a fraction of the recording, e.g. 0.15 for 15% in
    pub fn time_at_fraction(&self, fraction: f64) -> Timestamp {
        self.start().offset_ms(self.duration_ms() * fraction)
    }

    /// Pelvis rotation at an arbitrary time, linearly interpolated
    pub fn pelvis_at(&self, timestamp: Timestamp) -> Option<f64> {
        let first = self.angles.first()?;
        let last = self.angles.last()?;
        let idx = self.angles.binary_search_by_key(&timestamp, |a| a.timestamp);

        match idx {
            Ok(i) => Some(self.angles[i].pelvis),
            Err(0) => Some(first.pelvis),
            Err(i) if i >= self.angles.len() => Some(last.pelvis),
            Err(i) => {
                let a0 = &self.angles[i - 1];
                let a1 = &self.angles[i];
                let span = a1.timestamp.millis_since(a0.timestamp);
                let alpha = timestamp.millis_since(a0.timestamp) / span;
                Some(a0.pelvis + alpha * wrap_degrees(a1.pelvis - a0.pelvis))
            }
        }
    }

    /// Sub-series covering `[start, end]`
    pub fn window(&self, start: Timestamp, end: Timestamp) -> KinematicSeries {
        let angles: Vec<JointAngles> = self
            .angles
            .iter()
            .filter(|a| a.timestamp >= start && a.timestamp <= end)
            .copied()
            .collect();
        let velocities = match (angles.first(), angles.last()) {
            (Some(first), Some(last)) => self
                .velocities
                .iter()
                .filter(|v| v.timestamp > first.timestamp && v.timestamp < last.timestamp)
                .copied()
                .collect(),
            _ => Vec::new(),
        };

        KinematicSeries {
            angles,
            velocities,
            scale_m: self.scale_m,
        }
    }

    /// Index range of velocity samples stamped within `[start, end]`
    pub fn velocity_range(&self, start: Timestamp, end: Timestamp) -> Range<usize> {
        let lo = self.velocities.partition_point(|v| v.timestamp < start);
        let hi = self.velocities.partition_point(|v| v.timestamp <= end);
        lo..hi.max(lo)
    }
}

/// Location of a maximum in a sampled signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub index: usize,
    pub timestamp: Timestamp,
    pub value: f64,
}

/// Maximum of `value` over `candidates`, with its time refined by fitting a
/// parabola through the neighbouring samples. Earliest sample wins ties.
pub fn refined_peak<F>(samples: &[JointVelocities], candidates: Range<usize>, value: F) -> Option<Peak>
where
    F: Fn(&JointVelocities) -> f64,
{
    let end = candidates.end.min(samples.len());
    let mut best: Option<(usize, f64)> = None;
    for i in candidates.start..end {
        let v = value(&samples[i]);
        if !v.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    let (index, peak_value) = best?;

    let mut timestamp = samples[index].timestamp;
    if index > 0 && index + 1 < samples.len() {
        let (t0, t1, t2) = (
            samples[index - 1].timestamp,
            samples[index].timestamp,
            samples[index + 1].timestamp,
        );
        let (y0, y2) = (value(&samples[index - 1]), value(&samples[index + 1]));
        if y0.is_finite() && y2.is_finite() && peak_value >= y0 && peak_value >= y2 {
            let a = t1.millis_since(t0);
            let b = t1.millis_since(t2);
            let den = a * (peak_value - y2) - b * (peak_value - y0);
            if a > 0.0 && b < 0.0 && den > 1e-12 {
                let num = a * a * (peak_value - y2) - b * b * (peak_value - y0);
                let shift = (-0.5 * num / den).clamp(-a, -b);
                timestamp = t1.offset_ms(shift);
            }
        }
    }

    Some(Peak {
        index,
        timestamp,
        value: peak_value,
    })
}

/// Derives angle and velocity series from landmark frames
#[derive(Debug, Clone, Default)]
pub struct KinematicDeriver {
    config: DerivationConfig,
}

impl KinematicDeriver {
    pub fn new(config: DerivationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    /// Build the series. `body_height_m` scales normalized landmark motion
    /// to metres; the configured default is used when it is unknown.
    pub fn derive(&self, frames: &[JointFrame], body_height_m: Option<f64>) -> Result<KinematicSeries> {
        let min_conf = self.config.min_confidence;
        let mut valid: Vec<(&JointFrame, JointAngles)> = Vec::with_capacity(frames.len());

        for frame in frames {
            let Some(angles) = JointAngles::from_frame(frame, min_conf) else {
                continue;
            };
            if let Some((last, _)) = valid.last() {
                if frame.timestamp <= last.timestamp {
                    tracing::warn!(
                        "Dropping frame {} with non-increasing timestamp {:.3}ms",
                        frame.frame_index,
                        frame.timestamp.as_millis()
                    );
                    continue;
                }
            }
            valid.push((frame, angles));
        }

        if valid.len() < MIN_VALID_FRAMES {
            return Err(Error::InsufficientData {
                required: MIN_VALID_FRAMES,
                available: valid.len(),
            });
        }

        let scale_m = match body_height_m {
            Some(h) if h.is_finite() && h > 0.0 => h,
            _ => self.config.default_scale_m,
        };

        let velocities = valid
            .windows(2)
            .filter_map(|w| self.velocities_between(&w[0], &w[1], scale_m))
            .collect::<Vec<_>>();

        tracing::debug!(
            "Derived {} angle samples and {} velocity samples from {} frames",
            valid.len(),
            velocities.len(),
            frames.len()
        );

        Ok(KinematicSeries {
            angles: valid.into_iter().map(|(_, a)| a).collect(),
            velocities,
            scale_m,
        })
    }

    fn velocities_between(
        &self,
        previous: &(&JointFrame, JointAngles),
        current: &(&JointFrame, JointAngles),
        scale_m: f64,
    ) -> Option<JointVelocities> {
        let (f0, a0) = previous;
        let (f1, a1) = current;
        let min_conf = self.config.min_confidence;
        let dt = f1.timestamp.millis_since(f0.timestamp) / 1000.0;

        let wrist0 = f0.position(Joint::RightWrist, min_conf)?;
        let wrist1 = f1.position(Joint::RightWrist, min_conf)?;
        let pelvis0 = f0
            .position(Joint::LeftHip, min_conf)?
            .midpoint(&f0.position(Joint::RightHip, min_conf)?);
        let pelvis1 = f1
            .position(Joint::LeftHip, min_conf)?
            .midpoint(&f1.position(Joint::RightHip, min_conf)?);

        let shoulder = optional_velocity(a0.shoulder, a1.shoulder, dt);
        let hand = linear_velocity(&wrist0, &wrist1, scale_m, dt);
        let lever = shoulder.unwrap_or(0.0).abs().to_radians() * self.config.effective_radius_m;
        let bat = (hand + lever).min(self.config.max_bat_velocity_ms);

        Some(JointVelocities {
            timestamp: Timestamp::midpoint(f0.timestamp, f1.timestamp),
            pelvis: angular_velocity(a0.pelvis, a1.pelvis, dt),
            torso: angular_velocity(a0.torso, a1.torso, dt),
            hip: optional_velocity(a0.hip, a1.hip, dt),
            shoulder,
            elbow: optional_velocity(a0.elbow, a1.elbow, dt),
            knee: optional_velocity(a0.knee, a1.knee, dt),
            hand,
            pelvis_linear: linear_velocity(&pelvis0, &pelvis1, scale_m, dt),
            bat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u32, ms: f64, wrist_x: f64, elbow_angle_deg: f64) -> JointFrame {
        let shoulder = Position3D::planar(0.5, 0.4);
        let rad = elbow_angle_deg.to_radians();
        let elbow = Position3D::planar(0.5 + 0.15 * rad.sin(), 0.4 + 0.15 * rad.cos());
        JointFrame::new(index, Timestamp::from_millis(ms))
            .with_joint(Joint::LeftShoulder, Position3D::planar(0.4, 0.4), 0.9)
            .with_joint(Joint::RightShoulder, shoulder, 0.9)
            .with_joint(Joint::LeftHip, Position3D::planar(0.42, 0.6), 0.9)
            .with_joint(Joint::RightHip, Position3D::planar(0.5, 0.6), 0.9)
            .with_joint(Joint::RightElbow, elbow, 0.9)
            .with_joint(Joint::RightWrist, Position3D::planar(wrist_x, 0.5), 0.9)
    }

    #[test]
    fn test_angular_velocity_guards_time() {
        assert_eq!(angular_velocity(10.0, 20.0, 0.0), 0.0);
        assert_eq!(angular_velocity(10.0, 20.0, -0.1), 0.0);
        assert!((angular_velocity(10.0, 20.0, 0.1) - 100.0).abs() < 1e-10);
        // Crossing the ±180 seam is a small step, not a full turn
        assert!((angular_velocity(179.0, -179.0, 1.0) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_insufficient_frames() {
        let frames: Vec<_> = (0..4).map(|i| frame(i, i as f64 * 10.0, 0.5, 30.0)).collect();
        let err = KinematicDeriver::default().derive(&frames, None).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData {
                required: 5,
                available: 4
            }
        ));
    }

    #[test]
    fn test_frames_missing_required_joints_are_skipped() {
        let mut frames: Vec<_> = (0..6).map(|i| frame(i, i as f64 * 10.0, 0.5, 30.0)).collect();
        frames[2].joints[Joint::RightWrist as usize] = None;

        let series = KinematicDeriver::default().derive(&frames, None).unwrap();
        assert_eq!(series.angles.len(), 5);
        assert_eq!(series.velocities.len(), 4);
    }

    #[test]
    fn test_bat_velocity_adds_shoulder_lever() {
        // Wrist moves 0.01 units in 10ms; shoulder opens 1 degree
        let frames: Vec<_> = (0..5)
            .map(|i| frame(i, i as f64 * 10.0, 0.5 + 0.01 * i as f64, 30.0 + i as f64))
            .collect();
        let series = KinematicDeriver::default().derive(&frames, Some(2.0)).unwrap();

        let v = &series.velocities[0];
        assert!((v.hand - 2.0).abs() < 1e-9);
        let shoulder = v.shoulder.unwrap();
        assert!((shoulder.abs() - 100.0).abs() < 1e-6);
        let expected = 2.0 + 100f64.to_radians() * 2.0;
        assert!((v.bat - expected).abs() < 1e-6);
        assert_eq!(v.timestamp, Timestamp::from_millis(5.0));
    }

    #[test]
    fn test_refined_peak_recovers_tent_apex() {
        // Symmetric tent peaking at 50ms, sampled every 10ms at interval midpoints
        let samples: Vec<JointVelocities> = (0..10)
            .map(|i| {
                let t = 5.0 + 10.0 * i as f64;
                JointVelocities {
                    timestamp: Timestamp::from_millis(t),
                    pelvis: 0.0,
                    torso: 0.0,
                    hip: None,
                    shoulder: None,
                    elbow: None,
                    knee: None,
                    hand: 0.0,
                    pelvis_linear: 0.0,
                    bat: 100.0 - (t - 50.0).abs(),
                }
            })
            .collect();

        let peak = refined_peak(&samples, 0..samples.len(), |v| v.bat).unwrap();
        assert!((peak.timestamp.as_millis() - 50.0).abs() < 1e-6);
        assert!((peak.value - 95.0).abs() < 1e-10);
    }

    #[test]
    fn test_pelvis_interpolation() {
        let frames: Vec<_> = (0..5).map(|i| frame(i, i as f64 * 10.0, 0.5, 30.0)).collect();
        let series = KinematicDeriver::default().derive(&frames, None).unwrap();
        let mid = series.pelvis_at(Timestamp::from_millis(15.0)).unwrap();
        assert!((mid - series.angles[1].pelvis).abs() < 1e-10);
        assert!(series.pelvis_at(Timestamp::from_millis(-5.0)).is_some());
    }
}
