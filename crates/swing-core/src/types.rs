//! Fundamental types for swing capture and athlete description.

use nalgebra::{Point3, Vector2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an athlete profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AthleteId(pub Uuid);

impl AthleteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AthleteId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier for one recorded swing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwingId(pub Uuid);

impl SwingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SwingId {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture time relative to the first frame of a recording, nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(ms: f64) -> Self {
        Self((ms * 1_000_000.0).round() as i64)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_millis(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// Shift by a (possibly fractional) number of milliseconds
    pub fn offset_ms(&self, ms: f64) -> Self {
        Self(self.0 + (ms * 1_000_000.0).round() as i64)
    }

    /// Elapsed milliseconds from `earlier` to `self` (negative if `earlier` is later)
    pub fn millis_since(&self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000_000.0
    }

    pub fn midpoint(a: Timestamp, b: Timestamp) -> Self {
        Self(a.0 + (b.0 - a.0) / 2)
    }
}

/// Position in normalized image coordinates (x right, y down, z toward camera)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar landmark with no depth estimate
    pub fn planar(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    pub fn to_nalgebra(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn xy(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }

    /// Distance in the image plane. Monocular depth is too noisy to
    /// contribute to speed estimates.
    pub fn planar_distance_to(&self, other: &Self) -> f64 {
        (self.xy() - other.xy()).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// 17-joint body landmark set (COCO ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Joint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Joint {
    pub const COUNT: usize = 17;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Joints every frame must carry for the swing to be analyzable
    pub const REQUIRED: [Joint; 6] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::RightElbow,
        Joint::RightWrist,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }

    /// Accepts snake_case or upper-case landmark names as emitted by common pose estimators
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|j| j.name() == lowered)
    }
}

/// One detected landmark with its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointPosition {
    pub joint: Joint,
    pub position: Position3D,
    pub confidence: f32,
}

impl JointPosition {
    pub fn new(joint: Joint, position: Position3D, confidence: f32) -> Self {
        Self {
            joint,
            position,
            confidence,
        }
    }
}

/// All landmarks captured at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointFrame {
    pub frame_index: u32,
    pub timestamp: Timestamp,
    pub joints: [Option<JointPosition>; Joint::COUNT],
}

impl JointFrame {
    pub fn new(frame_index: u32, timestamp: Timestamp) -> Self {
        Self {
            frame_index,
            timestamp,
            joints: [None; Joint::COUNT],
        }
    }

    pub fn with_joint(mut self, joint: Joint, position: Position3D, confidence: f32) -> Self {
        self.set(JointPosition::new(joint, position, confidence));
        self
    }

    pub fn set(&mut self, detection: JointPosition) {
        self.joints[detection.joint as usize] = Some(detection);
    }

    /// Landmark position if detected with at least `min_confidence`
    pub fn position(&self, joint: Joint, min_confidence: f32) -> Option<Position3D> {
        self.joints[joint as usize]
            .filter(|d| d.confidence >= min_confidence && d.position.is_finite())
            .map(|d| d.position)
    }

    pub fn has_required_joints(&self, min_confidence: f32) -> bool {
        Joint::REQUIRED
            .iter()
            .all(|j| self.position(*j, min_confidence).is_some())
    }

    pub fn detected_count(&self, min_confidence: f32) -> usize {
        Joint::ALL
            .iter()
            .filter(|j| self.position(**j, min_confidence).is_some())
            .count()
    }
}

/// Body and implement measurements for one athlete, imperial units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anthropometry {
    pub height_in: f64,
    pub weight_lb: f64,
    pub wingspan_in: f64,
    pub age_years: f64,
    pub bat_weight_oz: f64,
}

impl Anthropometry {
    pub fn new(height_in: f64, weight_lb: f64, wingspan_in: f64, age_years: f64, bat_weight_oz: f64) -> Self {
        Self {
            height_in,
            weight_lb,
            wingspan_in,
            age_years,
            bat_weight_oz,
        }
    }

    /// Wingspan minus height, in inches
    pub fn ape_index_in(&self) -> f64 {
        self.wingspan_in - self.height_in
    }

    pub fn height_m(&self) -> f64 {
        self.height_in * 0.0254
    }

    pub fn mass_kg(&self) -> f64 {
        self.weight_lb * 0.453_592_37
    }

    pub fn bat_mass_kg(&self) -> f64 {
        self.bat_weight_oz * 0.028_349_5
    }

    pub fn validate(&self) -> crate::Result<()> {
        let fields = [
            ("height_in", self.height_in),
            ("weight_lb", self.weight_lb),
            ("wingspan_in", self.wingspan_in),
            ("bat_weight_oz", self.bat_weight_oz),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(crate::Error::InvalidInput(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !self.age_years.is_finite() || self.age_years < 0.0 {
            return Err(crate::Error::InvalidInput(format!(
                "age_years must be non-negative, got {}",
                self.age_years
            )));
        }
        Ok(())
    }
}
