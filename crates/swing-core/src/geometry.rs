//! Planar joint geometry.
//!
//! Angles are measured in the image plane in degrees. Segment rotation is
//! referenced to vertical: a level hip or shoulder line reads 90°.

use nalgebra::Vector2;

use crate::types::Position3D;

const DEGENERATE_NORM: f64 = 1e-10;

/// Angle between two vectors in radians, 0 when either is degenerate
pub fn angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> f64 {
    let dot = v1.dot(v2);
    let norms = v1.norm() * v2.norm();
    if norms < DEGENERATE_NORM {
        0.0
    } else {
        (dot / norms).clamp(-1.0, 1.0).acos()
    }
}

/// Interior angle at `vertex` formed by `a`-`vertex`-`c`, in degrees.
/// `None` when either limb segment collapses to a point.
pub fn joint_angle_deg(a: &Position3D, vertex: &Position3D, c: &Position3D) -> Option<f64> {
    let ba = a.xy() - vertex.xy();
    let bc = c.xy() - vertex.xy();
    if ba.norm() < DEGENERATE_NORM || bc.norm() < DEGENERATE_NORM {
        return None;
    }
    Some(angle_between(&ba, &bc).to_degrees())
}

/// Rotation of the line from `left` to `right` relative to vertical, in degrees
pub fn rotation_angle_deg(left: &Position3D, right: &Position3D) -> f64 {
    let d = right.xy() - left.xy();
    90.0 - d.y.atan2(d.x).to_degrees()
}

/// Wrap an angular difference into (-180, 180]
pub fn wrap_degrees(delta: f64) -> f64 {
    let mut wrapped = delta % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    wrapped
}
