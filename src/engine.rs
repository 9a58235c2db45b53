// engine: per-batch heart-rate pipeline and session state
//
// ingest(batch):
//   signal history <- batch (FIFO trimmed)
//   periodicity -> fallback/clamp -> confidence (+ optional floor)
//   bpm history <- bpm (FIFO trimmed) -> trend

use heapless::Vec;
use libm::{fmaxf, fminf};
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

use crate::confidence::{ConfidenceScorer, FloorRng};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fallback::{BpmSource, FallbackPolicy};
use crate::periodicity::PeriodicityEstimator;
use crate::signal_buffer::SignalBuffer;
use crate::trend::{Trend, TrendClassifier};

pub const SIGNAL_HISTORY_LEN: usize = 300; // 10 s at 30 fps
pub const BPM_HISTORY_LEN: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartRateEstimate {
    pub bpm: u16,
    pub confidence: f32,
    pub trend: Trend,
    pub source: BpmSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// No samples held
    Idle,
    /// At least one batch ingested since construction or reset
    Active,
}

/// Owns both bounded histories for one capture session. Sessions never
/// share an engine; `reset` returns it to `Idle`.
pub struct HeartRateEngine<const S: usize = SIGNAL_HISTORY_LEN, const H: usize = BPM_HISTORY_LEN> {
    config: EngineConfig,
    signal: SignalBuffer<S>,
    bpm_history: ConstGenericRingBuffer<u16, H>,
    estimator: PeriodicityEstimator,
    scorer: ConfidenceScorer,
    fallback: FallbackPolicy,
    trend: TrendClassifier,
    floor: Option<FloorRng>,
    n: usize, // Monotonic count of successful ingests since reset
}

impl HeartRateEngine {
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl Default for HeartRateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<const S: usize, const H: usize> HeartRateEngine<S, H> {
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            signal: SignalBuffer::new(),
            bpm_history: ConstGenericRingBuffer::new(),
            estimator: PeriodicityEstimator::new(&config),
            scorer: ConfidenceScorer::new(&config),
            fallback: FallbackPolicy::new(&config),
            trend: TrendClassifier::new(&config),
            floor: config.confidence_floor.map(FloorRng::new),
            n: 0,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        if self.n == 0 { EngineState::Idle } else { EngineState::Active }
    }

    pub fn ingest_count(&self) -> usize {
        self.n
    }

    /// Feed one batch of raw samples and get the current estimate back.
    ///
    /// Low-signal conditions never fail; they show up as fallback BPM and
    /// low confidence. Only empty or non-finite batches are rejected, and a
    /// rejected batch leaves the engine untouched.
    pub fn ingest(&mut self, samples: &[f32]) -> Result<HeartRateEstimate> {
        if samples.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if let Some(index) = samples.iter().position(|x| !x.is_finite()) {
            return Err(Error::NonFiniteSample { index });
        }

        self.signal.append(samples);
        let signal = self.signal.snapshot();
        let history = self.bpm_snapshot();

        let periodicity = match self.estimator.estimate::<S>(&signal) {
            Ok(p) => Some(p.bpm),
            Err(reason) => {
                log::debug!("no periodicity: {:?}", reason);
                None
            }
        };
        let (bpm, source) = self.fallback.resolve(periodicity, &history);
        if source != BpmSource::Periodicity {
            log::debug!("bpm {} from {:?}", bpm, source);
        }

        let mut confidence = self.scorer.score(&signal);
        if let Some(floor) = self.floor.as_mut() {
            confidence = floor.apply(confidence);
        }
        let confidence = fminf(1.0, fmaxf(0.0, confidence));

        self.bpm_history.push(bpm);
        let trend = self.trend.classify(&self.bpm_snapshot());

        self.n += 1;
        log::trace!(
            "ingest #{}: batch={} signal={} bpm={} conf={} trend={:?}",
            self.n,
            samples.len(),
            signal.len(),
            bpm,
            confidence,
            trend
        );
        Ok(HeartRateEstimate { bpm, confidence, trend, source })
    }

    /// Drop all buffered samples and readings. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.signal.reset();
        self.bpm_history.clear();
        if let Some(floor) = self.floor.as_mut() {
            floor.reseed();
        }
        self.n = 0;
    }

    pub fn signal_len(&self) -> usize {
        self.signal.len()
    }

    pub fn signal_history(&self) -> Vec<f32, S> {
        self.signal.snapshot()
    }

    pub fn heart_rate_history(&self) -> Vec<u16, H> {
        self.bpm_snapshot()
    }

    fn bpm_snapshot(&self) -> Vec<u16, H> {
        let mut out = Vec::new();
        for &b in self.bpm_history.iter() {
            let _ = out.push(b);
        }
        out
    }
}
