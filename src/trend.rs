// trend: compare the two halves of the BPM history
//
// first = h[..len/2], second = h[len/2..]; with an odd length the middle
// reading lands in the second half.

use libm::fabsf;
use stats::Stats;

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendClassifier {
    min_len: usize,
    threshold: f32,
}

impl TrendClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self { min_len: config.trend_min_len.max(2), threshold: config.trend_threshold }
    }

    pub fn classify(&self, history: &[u16]) -> Trend {
        if history.len() < self.min_len {
            return Trend::Stable;
        }
        let mid = history.len() / 2;
        let mean = |h: &[u16]| h.iter().map(|&b| b as f64).collect::<Stats>().mean() as f32;
        let diff = mean(&history[mid..]) - mean(&history[..mid]);

        if fabsf(diff) < self.threshold {
            Trend::Stable
        } else if diff > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        }
    }
}
