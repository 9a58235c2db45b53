// config: tunables for the heart-rate pipeline
//
// Defaults: 30 fps, 5-sample filter half-window, 55..110 BPM lag search,
// 60..100 BPM output clamp.

use embassy_time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_FPS: f32 = 30.0;
pub const DEFAULT_WINDOW_SIZE: usize = 5;
pub const DEFAULT_MIN_BPM: f32 = 55.0;
pub const DEFAULT_MAX_BPM: f32 = 110.0;
pub const DEFAULT_MIN_CORRELATION: f32 = 0.05;
pub const DEFAULT_MIN_PERIODICITY_SAMPLES: usize = 60; // 2 s at 30 fps
pub const DEFAULT_MIN_CONFIDENCE_SAMPLES: usize = 50;
pub const DEFAULT_VARIANCE_FLOOR: f32 = 1e-4;
pub const DEFAULT_VARIANCE_SCALE: f32 = 100.0;
pub const DEFAULT_CONTINUITY_SCALE: f32 = 50.0;
pub const DEFAULT_RESTING_BPM: f32 = 75.0;
pub const DEFAULT_FALLBACK_WINDOW: usize = 5;
pub const DEFAULT_OUTPUT_MIN_BPM: u16 = 60;
pub const DEFAULT_OUTPUT_MAX_BPM: u16 = 100;
pub const DEFAULT_TREND_MIN_LEN: usize = 5;
pub const DEFAULT_TREND_THRESHOLD: f32 = 2.0;

/// Replaces low confidence scores with a random value in
/// `[threshold, threshold + span)`. Off unless configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceFloor {
    pub threshold: f32,
    pub span: f32,
    pub seed: u64,
}

impl ConfidenceFloor {
    pub const fn new(seed: u64) -> Self {
        Self { threshold: 0.4, span: 0.2, seed }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Assumed sample rate of the incoming signal
    pub fps: f32,
    /// Half-width of the bandpass smoothing window
    pub window_size: usize,
    pub min_bpm: f32,
    pub max_bpm: f32,
    /// Mean autocorrelation below this is treated as "no periodicity"
    pub min_correlation: f32,
    pub min_periodicity_samples: usize,
    pub min_confidence_samples: usize,
    pub variance_floor: f32,
    pub variance_scale: f32,
    pub continuity_scale: f32,
    pub default_bpm: f32,
    pub fallback_window: usize,
    pub output_min_bpm: u16,
    pub output_max_bpm: u16,
    pub trend_min_len: usize,
    pub trend_threshold: f32,
    pub confidence_floor: Option<ConfidenceFloor>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            window_size: DEFAULT_WINDOW_SIZE,
            min_bpm: DEFAULT_MIN_BPM,
            max_bpm: DEFAULT_MAX_BPM,
            min_correlation: DEFAULT_MIN_CORRELATION,
            min_periodicity_samples: DEFAULT_MIN_PERIODICITY_SAMPLES,
            min_confidence_samples: DEFAULT_MIN_CONFIDENCE_SAMPLES,
            variance_floor: DEFAULT_VARIANCE_FLOOR,
            variance_scale: DEFAULT_VARIANCE_SCALE,
            continuity_scale: DEFAULT_CONTINUITY_SCALE,
            default_bpm: DEFAULT_RESTING_BPM,
            fallback_window: DEFAULT_FALLBACK_WINDOW,
            output_min_bpm: DEFAULT_OUTPUT_MIN_BPM,
            output_max_bpm: DEFAULT_OUTPUT_MAX_BPM,
            trend_min_len: DEFAULT_TREND_MIN_LEN,
            trend_threshold: DEFAULT_TREND_THRESHOLD,
            confidence_floor: None,
        }
    }
}

impl EngineConfig {
    pub fn with_confidence_floor(mut self, floor: ConfidenceFloor) -> Self {
        self.confidence_floor = Some(floor);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.fps,
            self.min_bpm,
            self.max_bpm,
            self.min_correlation,
            self.variance_floor,
            self.variance_scale,
            self.continuity_scale,
            self.default_bpm,
            self.trend_threshold,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig("non-finite parameter"));
        }
        if self.fps <= 0.0 {
            return Err(Error::InvalidConfig("fps must be positive"));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidConfig("window_size must be non-zero"));
        }
        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(Error::InvalidConfig("bpm search range is empty"));
        }
        if self.variance_scale <= 0.0 || self.continuity_scale <= 0.0 {
            return Err(Error::InvalidConfig("confidence scales must be positive"));
        }
        if self.output_min_bpm > self.output_max_bpm {
            return Err(Error::InvalidConfig("output bpm range is inverted"));
        }
        if self.fallback_window == 0 {
            return Err(Error::InvalidConfig("fallback_window must be non-zero"));
        }
        if let Some(floor) = self.confidence_floor {
            if !(floor.threshold.is_finite() && floor.span.is_finite())
                || floor.span < 0.0
                || floor.threshold < 0.0
                || floor.threshold + floor.span > 1.0
            {
                return Err(Error::InvalidConfig("confidence floor outside [0, 1]"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacerConfig {
    /// Target spacing between frames
    pub interval: Duration,
    /// Stop after this many frames; `None` runs until cancelled
    pub max_frames: Option<u32>,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_hz(DEFAULT_FPS as u64), max_frames: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
        let cfg = EngineConfig::default().with_confidence_floor(ConfidenceFloor::new(7));
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_ranges() {
        let cfg = EngineConfig { min_bpm: 120.0, ..EngineConfig::default() };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let cfg = EngineConfig { fps: 0.0, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig { fps: f32::NAN, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig { output_min_bpm: 101, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig { window_size: 0, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());

        let floor = ConfidenceFloor { threshold: 0.9, span: 0.2, seed: 1 };
        let cfg = EngineConfig::default().with_confidence_floor(floor);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn pacer_defaults_to_frame_rate() {
        let p = PacerConfig::default();
        assert_eq!(p.interval, Duration::from_hz(30));
        assert_eq!(p.max_frames, None);
    }
}
