//! Synthetic swings sampled from continuous motion profiles.
#![allow(dead_code)]

use serde_json::{json, Map, Value};
use swing_core::{FrameClock, Joint, JointFrame, Position3D};

pub const DURATION_MS: f64 = 1200.0;

/// Load peaks at 300ms, foot down crosses at 514.815ms
pub const LOAD_MS: f64 = 300.0;
pub const FOOT_DOWN_MS: f64 = 500.0 + 4.0 / 0.27;
/// Shoulder angular velocity peaks at 900ms
pub const CONTACT_MS: f64 = 900.0;

const PELVIS_KNOTS: [(f64, f64); 5] = [(0.0, 0.0), (300.0, -20.0), (500.0, -14.0), (700.0, 40.0), (1200.0, 40.0)];

/// Pelvis rotation (deg) relative to stance: coils back, then fires open
pub fn coiling_pelvis(t: f64) -> f64 {
    for w in PELVIS_KNOTS.windows(2) {
        let ((t0, a0), (t1, a1)) = (w[0], w[1]);
        if t <= t1 {
            return a0 + (a1 - a0) * ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
        }
    }
    PELVIS_KNOTS[PELVIS_KNOTS.len() - 1].1
}

/// No backward pelvis rotation at all
pub fn still_pelvis(_t: f64) -> f64 {
    0.0
}

/// Shoulder angle (deg): angular velocity ramps 0 -> 0.6 deg/ms at 900ms
/// and back to 0 by 1100ms
pub fn arm_angle(t: f64) -> f64 {
    if t <= 700.0 {
        20.0
    } else if t <= 900.0 {
        let u = t - 700.0;
        20.0 + 0.0015 * u * u
    } else if t <= 1100.0 {
        let u = t - 900.0;
        80.0 + 0.6 * u - 0.0015 * u * u
    } else {
        140.0
    }
}

/// Landmarks of one instant
pub fn pose(t: f64, pelvis: fn(f64) -> f64) -> Vec<(Joint, Position3D)> {
    let phi = -pelvis(t).to_radians();
    let (cx, cy, half) = (0.5, 0.6, 0.08);
    let left_hip = Position3D::planar(cx - half * phi.cos(), cy - half * phi.sin());
    let right_hip = Position3D::planar(cx + half * phi.cos(), cy + half * phi.sin());
    let left_shoulder = Position3D::planar(left_hip.x, left_hip.y - 0.25);
    let right_shoulder = Position3D::planar(right_hip.x, right_hip.y - 0.25);

    let alpha = arm_angle(t).to_radians();
    let right_elbow = Position3D::planar(right_shoulder.x + 0.12 * alpha.sin(), right_shoulder.y + 0.12 * alpha.cos());
    let right_wrist = Position3D::planar(0.80, 0.45);

    vec![
        (Joint::LeftShoulder, left_shoulder),
        (Joint::RightShoulder, right_shoulder),
        (Joint::LeftHip, left_hip),
        (Joint::RightHip, right_hip),
        (Joint::RightElbow, right_elbow),
        (Joint::RightWrist, right_wrist),
    ]
}

pub fn frame_count(rate_hz: f64) -> u32 {
    (DURATION_MS * rate_hz / 1000.0).round() as u32 + 1
}

/// The swing captured at `rate_hz`
pub fn capture(rate_hz: f64, pelvis: fn(f64) -> f64) -> Vec<JointFrame> {
    let total = frame_count(rate_hz);
    let clock = FrameClock::at_rate(rate_hz, total).unwrap();
    (0..total)
        .map(|i| {
            let timestamp = clock.timestamp(i);
            pose(timestamp.as_millis(), pelvis)
                .into_iter()
                .fold(JointFrame::new(i, timestamp), |frame, (joint, p)| {
                    frame.with_joint(joint, p, 0.95)
                })
        })
        .collect()
}

/// The same swing as a pose-estimation export, skipping `missing` frames
pub fn export(rate_hz: f64, missing: &[u32]) -> String {
    let total = frame_count(rate_hz);
    let clock = FrameClock::at_rate(rate_hz, total).unwrap();
    let frames: Vec<Value> = (0..total)
        .filter(|i| !missing.contains(i))
        .map(|i| {
            let landmarks: Map<String, Value> = pose(clock.timestamp(i).as_millis(), coiling_pelvis)
                .into_iter()
                .map(|(joint, p)| (joint.name().to_string(), json!([p.x, p.y, 0.0, 0.95])))
                .collect();
            json!({ "frame": i, "landmarks": landmarks })
        })
        .collect();
    json!({ "frames": frames }).to_string()
}
