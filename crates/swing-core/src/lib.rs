//! # Swing-Core
//!
//! Core types and joint kinematics for batting swing analysis: landmark
//! frames, physical-time normalization, and the angle/velocity series the
//! phase detector and scoring stages consume.

pub mod error;
pub mod geometry;
pub mod kinematics;
pub mod provider;
pub mod timing;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use kinematics::*;
pub use provider::*;
pub use timing::*;
pub use types::*;
