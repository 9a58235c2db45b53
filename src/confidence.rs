// confidence: signal-quality score from variance and continuity
//
// variance_score   = min(1, var / variance_scale)
// continuity_score = max(0, 1 - mean|dx| / continuity_scale)
// combined         = sqrt(variance_score * continuity_score)
// A near-flat signal (var below the floor) scores 0 outright.

use libm::{fmaxf, fminf, sqrtf};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stats::Stats;

use crate::config::{ConfidenceFloor, EngineConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Assessment {
    /// Fewer samples than the scorer needs
    TooShort { len: usize },
    /// Variance under the floor: no usable signal
    Degenerate { variance: f32 },
    Scored { variance_score: f32, continuity_score: f32, combined: f32 },
}

impl Assessment {
    pub fn value(&self) -> f32 {
        match *self {
            Assessment::Scored { combined, .. } => combined,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    min_samples: usize,
    variance_floor: f32,
    variance_scale: f32,
    continuity_scale: f32,
}

impl ConfidenceScorer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_samples: config.min_confidence_samples,
            variance_floor: config.variance_floor,
            variance_scale: config.variance_scale,
            continuity_scale: config.continuity_scale,
        }
    }

    pub fn assess(&self, signal: &[f32]) -> Assessment {
        if signal.len() < self.min_samples || signal.len() < 2 {
            return Assessment::TooShort { len: signal.len() };
        }
        let stats: Stats = signal.iter().map(|&x| x as f64).collect();

        let variance = stats.variance() as f32;
        if variance < self.variance_floor {
            log::debug!("confidence: degenerate signal, variance={}", variance);
            return Assessment::Degenerate { variance };
        }
        let variance_score = fminf(1.0, variance / self.variance_scale);

        let avg_step = stats.mean_abs_step() as f32;
        let continuity_score = fmaxf(0.0, 1.0 - avg_step / self.continuity_scale);

        Assessment::Scored {
            variance_score,
            continuity_score,
            combined: sqrtf(variance_score * continuity_score),
        }
    }

    pub fn score(&self, signal: &[f32]) -> f32 {
        self.assess(signal).value()
    }
}

/// Presentation-side smoothing: scores under the threshold are replaced by
/// a seeded uniform draw from `[threshold, threshold + span)`.
pub struct FloorRng {
    floor: ConfidenceFloor,
    rng: SmallRng,
}

impl FloorRng {
    pub fn new(floor: ConfidenceFloor) -> Self {
        Self { floor, rng: SmallRng::seed_from_u64(floor.seed) }
    }

    pub fn apply(&mut self, score: f32) -> f32 {
        if score >= self.floor.threshold {
            return score;
        }
        if self.floor.span <= 0.0 {
            return self.floor.threshold;
        }
        self.floor.threshold + self.rng.gen::<f32>() * self.floor.span
    }

    /// Restart the random sequence from the configured seed.
    pub fn reseed(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.floor.seed);
    }
}
