// fallback: pick a usable BPM and clamp it to the output range

use libm::{fmaxf, fminf, roundf};
use stats::Stats;

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BpmSource {
    /// Autocorrelation produced the value
    Periodicity,
    /// Mean of the most recent accepted readings
    RecentHistory,
    /// Nothing to go on: resting default
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackPolicy {
    window: usize,
    default_bpm: f32,
    min_bpm: u16,
    max_bpm: u16,
}

impl FallbackPolicy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            window: config.fallback_window,
            default_bpm: config.default_bpm,
            min_bpm: config.output_min_bpm,
            max_bpm: config.output_max_bpm,
        }
    }

    /// `estimated` is the periodicity BPM if there was one; `history` holds
    /// previously accepted readings, oldest first.
    pub fn resolve(&self, estimated: Option<f32>, history: &[u16]) -> (u16, BpmSource) {
        let (raw, source) = match estimated {
            Some(bpm) => (bpm, BpmSource::Periodicity),
            None if !history.is_empty() => {
                let recent = &history[history.len().saturating_sub(self.window)..];
                let stats: Stats = recent.iter().map(|&b| b as f64).collect();
                (stats.mean() as f32, BpmSource::RecentHistory)
            }
            None => (self.default_bpm, BpmSource::Default),
        };
        (self.clamp(raw), source)
    }

    pub fn clamp(&self, bpm: f32) -> u16 {
        roundf(fminf(fmaxf(bpm, self.min_bpm as f32), self.max_bpm as f32)) as u16
    }
}
