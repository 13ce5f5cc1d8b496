//! # Swing-Engine
//!
//! Turns a swing's kinematic series into coaching numbers.
//!
//! ## Pipeline
//!
//! 1. **Events** - stance, load, foot down, contact and follow-through,
//!    with duration-fraction fallbacks when a signal is flat
//! 2. **Sequence** - peak timing of pelvis, torso, shoulder, hands and bat
//! 3. **Scoring** - Ground, Engine and Weapon component scores (0-100)
//! 4. **KRS** - one headline rating from creation and transfer
//! 5. **Profile** - motor-profile label from the component pattern
//! 6. **Capacity** - anthropometric bat-speed ceiling (min/typical/max)
//! 7. **Gap** - measured speed against capacity, weakest link first
//!
//! [`SwingPipeline`] runs all of it synchronously for one swing;
//! [`AnalysisService`] caches athlete capacity and fans swings out over
//! the tokio blocking pool.
//!
//! ## Tempo
//!
//! Load duration (load to foot down) over swing duration (foot down to
//! contact), clamped to [0.5, 10]:
//!
//! - < 0.75: hair trigger
//! - 0.75 - 1.5: quick
//! - 1.5 - 2.5: balanced
//! - >= 2.5: long load

pub mod analyzer;
pub mod capacity;
pub mod config;
pub mod events;
pub mod gap;
pub mod krs;
pub mod profile;
pub mod record;
pub mod scoring;
pub mod sequence;
pub mod service;
pub mod tempo;

pub use analyzer::*;
pub use capacity::*;
pub use self::config::*;
pub use events::*;
pub use gap::*;
pub use krs::*;
pub use profile::*;
pub use record::Record;
pub use scoring::*;
pub use sequence::*;
pub use service::*;
pub use tempo::*;
