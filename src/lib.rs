#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Live heart-rate estimation from a stream of remote-photoplethysmography
//! (rPPG) samples.
//!
//! [`HeartRateEngine::ingest`] takes each batch of raw samples and returns a
//! smoothed, confidence-scored, trend-classified [`HeartRateEstimate`]. The
//! engine keeps two bounded histories (raw signal and accepted BPM readings)
//! and never allocates. [`FramePacer`] drives an engine from a
//! [`SampleSource`] at a fixed frame rate.

pub mod bandpass;
pub mod confidence;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod pacer;
pub mod periodicity;
pub mod signal_buffer;
pub mod trend;

pub use config::{ConfidenceFloor, EngineConfig, PacerConfig};
pub use control::ControlMap;
pub use engine::{EngineState, HeartRateEngine, HeartRateEstimate};
pub use error::{AcquisitionError, Error, Result};
pub use fallback::BpmSource;
pub use pacer::{Batch, Cancellation, EstimateSink, FramePacer, SampleSource, SessionSummary};
pub use trend::Trend;
