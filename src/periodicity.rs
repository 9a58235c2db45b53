// periodicity: autocorrelation search over a physiological lag range
//
// The filtered, mean-removed signal is correlated with itself at every lag
// in [floor(fps*60/max_bpm), floor(fps*60/min_bpm)]. The lag with the
// highest mean product wins (ascending scan, first lag keeps ties) and is
// converted to BPM as fps*60/lag.

use heapless::Vec;
use libm::floorf;

use crate::bandpass::BandpassStage;
use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Periodicity {
    pub bpm: f32,
    pub lag: usize,
    pub correlation: f32,
}

/// Why no periodicity was reported. None of these are failures; the engine
/// falls back to history or the resting default.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoEstimate {
    InsufficientData { len: usize },
    /// The filtered signal does not fit the caller's buffer capacity
    ExceedsCapacity { len: usize, capacity: usize },
    NoLagEvaluated,
    WeakCorrelation { lag: usize, correlation: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct PeriodicityEstimator {
    fps: f32,
    min_bpm: f32,
    max_bpm: f32,
    min_correlation: f32,
    min_samples: usize,
    bandpass: BandpassStage,
}

impl PeriodicityEstimator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            fps: config.fps,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            min_correlation: config.min_correlation,
            min_samples: config.min_periodicity_samples,
            bandpass: BandpassStage::new(config.window_size),
        }
    }

    /// Inclusive (min_lag, max_lag) in samples.
    pub fn lag_bounds(&self) -> (usize, usize) {
        let beats = self.fps * 60.0;
        (floorf(beats / self.max_bpm) as usize, floorf(beats / self.min_bpm) as usize)
    }

    pub fn estimate<const N: usize>(&self, signal: &[f32]) -> Result<Periodicity, NoEstimate> {
        if signal.len() < self.min_samples {
            return Err(NoEstimate::InsufficientData { len: signal.len() });
        }

        let mut normalized: Vec<f32, N> = self
            .bandpass
            .apply(signal)
            .ok_or(NoEstimate::ExceedsCapacity { len: signal.len(), capacity: N })?;
        if normalized.is_empty() {
            return Err(NoEstimate::NoLagEvaluated);
        }
        let mean = normalized.iter().sum::<f32>() / normalized.len() as f32;
        normalized.iter_mut().for_each(|v| *v -= mean);

        let (min_lag, max_lag) = self.lag_bounds();
        let (lag, correlation) =
            best_lag(&normalized, min_lag, max_lag).ok_or(NoEstimate::NoLagEvaluated)?;
        log::trace!(
            "autocorr: filtered={} lags={}..={} best_lag={} corr={}",
            normalized.len(),
            min_lag,
            max_lag,
            lag,
            correlation
        );
        if correlation < self.min_correlation {
            return Err(NoEstimate::WeakCorrelation { lag, correlation });
        }
        Ok(Periodicity { bpm: self.fps * 60.0 / lag as f32, lag, correlation })
    }
}

// Ascending scan over [min_lag, max_lag]; a later lag only replaces the
// current best when strictly greater, so the first lag keeps ties.
fn best_lag(x: &[f32], min_lag: usize, max_lag: usize) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for lag in min_lag.max(1)..=max_lag {
        let Some(corr) = mean_lagged_product(x, lag) else {
            continue;
        };
        match best {
            Some((_, max_corr)) if corr <= max_corr => {}
            _ => best = Some((lag, corr)),
        }
    }
    best
}

// Mean of x[i]*x[i+lag] over every valid i; None when the lag leaves no pairs.
fn mean_lagged_product(x: &[f32], lag: usize) -> Option<f32> {
    let count = x.len().checked_sub(lag).filter(|&c| c > 0)?;
    let sum: f32 = x[..count].iter().zip(&x[lag..]).map(|(a, b)| a * b).sum();
    Some(sum / count as f32)
}
