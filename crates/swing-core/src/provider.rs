//! Landmark provider boundary.
//!
//! Pose estimation runs outside this workspace. A provider turns one raw
//! video frame into named joint positions, or reports that nobody was
//! detected in it. Frames without a detection are dropped here; frames
//! with low-confidence joints pass through and are filtered downstream.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::timing::FrameClock;
use crate::types::{Joint, JointFrame, JointPosition, Position3D};

/// Undecoded visual data for one frame
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub index: u32,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(index: u32, data: Vec<u8>) -> Self {
        Self { index, data }
    }
}

/// Trait for pose-estimation backends
#[async_trait]
pub trait LandmarkProvider: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// Detect joints in one frame. `Ok(None)` means no person was found.
    async fn detect(&self, frame: &RawFrame) -> Result<Option<Vec<JointPosition>>>;
}

/// Run `provider` over `frames` and stamp each detection with its capture time
pub async fn collect_frames(
    provider: &dyn LandmarkProvider,
    frames: &[RawFrame],
    clock: &FrameClock,
) -> Result<Vec<JointFrame>> {
    let mut out = Vec::with_capacity(frames.len());
    let mut missed = 0usize;

    for raw in frames {
        match provider.detect(raw).await? {
            Some(detections) => {
                let mut frame = JointFrame::new(raw.index, clock.timestamp(raw.index));
                for detection in detections {
                    frame.set(detection);
                }
                out.push(frame);
            }
            None => missed += 1,
        }
    }

    if missed > 0 {
        tracing::debug!(
            "{}: no detection in {} of {} frames",
            provider.name(),
            missed,
            frames.len()
        );
    }

    Ok(out)
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    frame: u32,
    #[serde(default)]
    landmarks: HashMap<String, [f64; 4]>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    frames: Vec<RecordedFrame>,
}

/// Replays landmarks exported by an earlier pose-estimation run.
///
/// Export format: `{"frames": [{"frame": 0, "landmarks": {"left_hip": [x, y, z, visibility]}}]}`.
/// Frames absent from the export, or exported with no landmarks, are
/// reported as "no detection".
#[derive(Debug, Clone, Default)]
pub struct ReplayProvider {
    frames: HashMap<u32, Vec<JointPosition>>,
}

impl ReplayProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame_index: u32, detections: Vec<JointPosition>) {
        self.frames.insert(frame_index, detections);
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let recording: Recording = serde_json::from_str(json)?;
        let mut provider = Self::new();

        for recorded in recording.frames {
            let mut detections = Vec::with_capacity(recorded.landmarks.len());
            for (name, [x, y, z, visibility]) in recorded.landmarks {
                match Joint::from_name(&name) {
                    Some(joint) => detections.push(JointPosition::new(
                        joint,
                        Position3D::new(x, y, z),
                        visibility as f32,
                    )),
                    None => tracing::debug!("Ignoring unknown landmark '{}'", name),
                }
            }
            if !detections.is_empty() {
                detections.sort_by_key(|d| d.joint);
                provider.insert(recorded.frame, detections);
            }
        }

        Ok(provider)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl LandmarkProvider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    async fn detect(&self, frame: &RawFrame) -> Result<Option<Vec<JointPosition>>> {
        Ok(self.frames.get(&frame.index).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "frames": [
            {"frame": 0, "landmarks": {"left_hip": [0.4, 0.6, 0.0, 0.9], "RIGHT_HIP": [0.6, 0.6, 0.0, 0.8], "left_pinky": [0.1, 0.1, 0.0, 0.9]}},
            {"frame": 1, "landmarks": {}},
            {"frame": 3, "landmarks": {"left_hip": [0.41, 0.6, 0.0, 0.9]}}
        ]
    }"#;

    #[test]
    fn test_parse_export() {
        let provider = ReplayProvider::from_json(EXPORT).unwrap();
        assert_eq!(provider.frame_count(), 2);
        assert!(ReplayProvider::from_json("{not json").is_err());
    }

    #[tokio::test]
    async fn test_collect_drops_missing_frames() {
        let provider = ReplayProvider::from_json(EXPORT).unwrap();
        let clock = FrameClock::at_rate(240.0, 4).unwrap();
        let raw: Vec<RawFrame> = (0..4).map(|i| RawFrame::new(i, Vec::new())).collect();

        let frames = collect_frames(&provider, &raw, &clock).await.unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].frame_index, 0);
        assert_eq!(frames[1].frame_index, 3);
        assert_eq!(frames[1].timestamp, clock.timestamp(3));
        assert!(frames[0].position(Joint::RightHip, 0.5).is_some());
        assert!(frames[1].position(Joint::RightHip, 0.5).is_none());
    }
}
