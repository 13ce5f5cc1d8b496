//! Frame index to physical time conversion.
//!
//! Every downstream stage works in milliseconds. Frame counts are never
//! used as a time base, so the same motion captured at 30 and 300 frames
//! per second yields the same phase durations.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Timestamp;

/// Source of the per-frame interval for a recording
pub trait FrameTiming: Send + Sync {
    /// Milliseconds between consecutive frames for a recording of
    /// `total_frames` frames captured at `capture_rate_hz`.
    fn ms_per_frame(&self, total_frames: u32, capture_rate_hz: f64) -> Result<f64>;
}

/// Trusts the nominal capture rate reported by the camera
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NominalRate;

impl FrameTiming for NominalRate {
    fn ms_per_frame(&self, total_frames: u32, capture_rate_hz: f64) -> Result<f64> {
        validate_rate(capture_rate_hz)?;
        if total_frames == 0 {
            return Err(Error::InvalidInput("recording has no frames".into()));
        }
        Ok(1000.0 / capture_rate_hz)
    }
}

/// Derives the interval from a container-reported duration.
///
/// High-speed phone captures often play back at 30 fps while recording at
/// 120-240 fps; the container duration then disagrees with the nominal
/// rate and the measured duration wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasuredDuration {
    pub duration_ms: f64,
}

impl FrameTiming for MeasuredDuration {
    fn ms_per_frame(&self, total_frames: u32, capture_rate_hz: f64) -> Result<f64> {
        if total_frames == 0 {
            return Err(Error::InvalidInput("recording has no frames".into()));
        }
        if !self.duration_ms.is_finite() || self.duration_ms <= 0.0 {
            return NominalRate.ms_per_frame(total_frames, capture_rate_hz);
        }
        let ms = self.duration_ms / total_frames as f64;
        let nominal = 1000.0 / capture_rate_hz;
        if capture_rate_hz.is_finite() && capture_rate_hz > 0.0 && (ms - nominal).abs() / nominal > 0.05 {
            tracing::debug!(
                "Measured frame interval {:.3}ms differs from nominal {:.3}ms",
                ms,
                nominal
            );
        }
        Ok(ms)
    }
}

/// Frame/Time Normalizer for one recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    ms_per_frame: f64,
    total_frames: u32,
}

impl FrameClock {
    pub fn new(timing: &dyn FrameTiming, total_frames: u32, capture_rate_hz: f64) -> Result<Self> {
        let ms_per_frame = timing.ms_per_frame(total_frames, capture_rate_hz)?;
        if !ms_per_frame.is_finite() || ms_per_frame <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "frame interval must be positive, got {}ms",
                ms_per_frame
            )));
        }
        Ok(Self {
            ms_per_frame,
            total_frames,
        })
    }

    /// Shorthand for a fixed capture rate
    pub fn at_rate(capture_rate_hz: f64, total_frames: u32) -> Result<Self> {
        Self::new(&NominalRate, total_frames, capture_rate_hz)
    }

    pub fn ms_per_frame(&self) -> f64 {
        self.ms_per_frame
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Absolute capture time of a frame. Computed from the index directly
    /// so rounding does not accumulate across a long recording.
    pub fn timestamp(&self, frame_index: u32) -> Timestamp {
        Timestamp::from_nanos((frame_index as f64 * self.ms_per_frame * 1_000_000.0).round() as i64)
    }

    pub fn duration_ms(&self) -> f64 {
        self.total_frames.saturating_sub(1) as f64 * self.ms_per_frame
    }
}

fn validate_rate(capture_rate_hz: f64) -> Result<()> {
    if !capture_rate_hz.is_finite() || capture_rate_hz <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "capture rate must be positive, got {}",
            capture_rate_hz
        )));
    }
    Ok(())
}
