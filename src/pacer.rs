// pacer: frame-paced acquisition loop
//
// Wakes on absolute deadlines spaced by the configured interval, pulls
// whatever the upstream extractor produced, and pushes non-empty batches
// through the engine. Runs until cancelled, `max_frames` is reached, or the
// source fails. The engine is reset on entry and on every exit path.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};
use heapless::Vec;
use stats::Stats;
use time_stats::TimeStats;

use crate::config::PacerConfig;
use crate::engine::{HeartRateEngine, HeartRateEstimate};
use crate::error::{AcquisitionError, Error, Result};

/// Most samples one frame may contribute
pub const MAX_BATCH: usize = 64;

pub type Batch = Vec<f32, MAX_BATCH>;

/// Upstream extractor producing raw rPPG samples.
pub trait SampleSource {
    /// Push the samples produced since the last poll into `batch` (which
    /// arrives empty). Leaving it empty means "nothing new this frame".
    fn poll_batch(&mut self, batch: &mut Batch) -> core::result::Result<(), AcquisitionError>;
}

/// Downstream consumer of estimates.
pub trait EstimateSink {
    fn publish(&mut self, estimate: &HeartRateEstimate);
}

impl<F: FnMut(&HeartRateEstimate)> EstimateSink for F {
    fn publish(&mut self, estimate: &HeartRateEstimate) {
        self(estimate)
    }
}

/// Stop request for a running pacer; may be triggered from another task or
/// thread. Once cancelled the handle stays cancelled (and a pacer started
/// with it returns immediately) until [`Cancellation::rearm`].
pub struct Cancellation {
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub const fn new() -> Self {
        Self { signal: Signal::new() }
    }

    pub fn cancel(&self) {
        self.signal.signal(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.signaled()
    }

    /// Clear a pending cancel so the handle can be reused.
    pub fn rearm(&self) {
        self.signal.reset();
    }

    // `wait` consumes the signal; put it back so the stop request stays
    // visible through `is_cancelled` until `rearm`.
    async fn cancelled(&self) {
        self.signal.wait().await;
        self.signal.signal(());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSummary {
    /// Frame deadlines serviced
    pub frames: u32,
    /// Estimates published
    pub estimates: u32,
    /// Frames where the source had nothing new
    pub skipped: u32,
    /// Deadlines missed by more than one interval
    pub overruns: u32,
    /// Achieved frame spacing, microseconds
    pub cadence: Stats,
    pub last: Option<HeartRateEstimate>,
}

pub struct FramePacer {
    config: PacerConfig,
}

impl FramePacer {
    pub const fn new(config: PacerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PacerConfig {
        &self.config
    }

    pub async fn run<Src, Snk, const S: usize, const H: usize>(
        &self,
        engine: &mut HeartRateEngine<S, H>,
        source: &mut Src,
        sink: &mut Snk,
        cancel: &Cancellation,
    ) -> Result<SessionSummary>
    where
        Src: SampleSource,
        Snk: EstimateSink,
    {
        let interval = self.config.interval;
        log::info!("pacer: session start, interval={}us", interval.as_micros());
        engine.reset();

        let mut summary = SessionSummary::default();
        let mut timing = TimeStats::new();
        let mut batch = Batch::new();
        let mut deadline = Instant::now();

        loop {
            if self.config.max_frames.is_some_and(|max| summary.frames >= max) {
                break;
            }
            if cancel.is_cancelled() {
                log::info!("pacer: cancelled after {} frames", summary.frames);
                break;
            }
            deadline += interval;
            // Cancel is polled first so a pending stop wins over a due deadline.
            if let Either::First(()) = select(cancel.cancelled(), Timer::at(deadline)).await {
                log::info!("pacer: cancelled after {} frames", summary.frames);
                break;
            }

            let now = Instant::now();
            timing.loop_tick_at(now);
            if now > deadline + interval {
                summary.overruns += 1;
                log::warn!("pacer: overrun, {}us late", (now - deadline).as_micros());
                deadline = now;
            }
            summary.frames += 1;

            batch.clear();
            if let Err(e) = source.poll_batch(&mut batch) {
                log::warn!("pacer: acquisition failed: {:?}", e);
                engine.reset();
                return Err(Error::Acquisition(e));
            }
            if batch.is_empty() {
                summary.skipped += 1;
                continue;
            }

            let estimate = match engine.ingest(&batch) {
                Ok(estimate) => estimate,
                Err(e) => {
                    engine.reset();
                    return Err(e);
                }
            };
            sink.publish(&estimate);
            summary.estimates += 1;
            summary.last = Some(estimate);
        }

        summary.cadence = timing.stats();
        engine.reset();
        log::info!(
            "pacer: session end, frames={} estimates={} skipped={} overruns={}",
            summary.frames,
            summary.estimates,
            summary.skipped,
            summary.overruns
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineState;
    use core::f32::consts::PI;
    use embassy_futures::block_on;
    use embassy_time::Duration;

    // Emits `per_frame` samples of a 1.2 Hz sinusoid per poll; every
    // `gap`-th poll (if set) yields nothing.
    struct SineSource {
        i: usize,
        polls: usize,
        per_frame: usize,
        gap: Option<usize>,
        fail_at: Option<usize>,
    }

    impl SineSource {
        fn new(per_frame: usize) -> Self {
            Self { i: 0, polls: 0, per_frame, gap: None, fail_at: None }
        }
    }

    impl SampleSource for SineSource {
        fn poll_batch(&mut self, batch: &mut Batch) -> core::result::Result<(), AcquisitionError> {
            self.polls += 1;
            if self.fail_at == Some(self.polls) {
                return Err(AcquisitionError::DeviceLost);
            }
            if self.gap.is_some_and(|g| self.polls % g == 0) {
                return Ok(());
            }
            for _ in 0..self.per_frame {
                let x = 10.0 * libm::sinf(2.0 * PI * 1.2 * self.i as f32 / 30.0);
                let _ = batch.push(x);
                self.i += 1;
            }
            Ok(())
        }
    }

    fn fast(frames: u32) -> FramePacer {
        FramePacer::new(PacerConfig { interval: Duration::from_micros(500), max_frames: Some(frames) })
    }

    #[test]
    fn runs_bounded_session() {
        let mut engine = HeartRateEngine::new();
        let mut source = SineSource::new(30);
        let mut seen = std::vec::Vec::new();
        let mut sink = |e: &HeartRateEstimate| seen.push(*e);
        let cancel = Cancellation::new();

        let summary = block_on(fast(12).run(&mut engine, &mut source, &mut sink, &cancel)).unwrap();

        assert_eq!(summary.frames, 12);
        assert_eq!(summary.estimates, 12);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.cadence.n(), 11);
        assert_eq!(seen.len(), 12);
        // 12 x 30 samples fills the 300-sample history.
        let last = summary.last.unwrap();
        assert!((68..=76).contains(&last.bpm), "bpm {}", last.bpm);
        // Stop resets the engine.
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.signal_len(), 0);
    }

    #[test]
    fn empty_frames_are_skipped() {
        let mut engine = HeartRateEngine::new();
        let mut source = SineSource::new(2);
        source.gap = Some(3);
        let mut count = 0u32;
        let mut sink = |_: &HeartRateEstimate| count += 1;
        let cancel = Cancellation::new();

        let summary = block_on(fast(9).run(&mut engine, &mut source, &mut sink, &cancel)).unwrap();

        assert_eq!(summary.frames, 9);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.estimates, 6);
        assert_eq!(count, 6);
    }

    #[test]
    fn acquisition_failure_ends_session() {
        let mut engine = HeartRateEngine::new();
        let mut source = SineSource::new(10);
        source.fail_at = Some(4);
        let mut sink = |_: &HeartRateEstimate| {};
        let cancel = Cancellation::new();

        let r = block_on(fast(20).run(&mut engine, &mut source, &mut sink, &cancel));

        assert_eq!(r, Err(Error::Acquisition(AcquisitionError::DeviceLost)));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    struct CancellingSource<'a> {
        inner: SineSource,
        cancel: &'a Cancellation,
        after: usize,
    }

    impl SampleSource for CancellingSource<'_> {
        fn poll_batch(&mut self, batch: &mut Batch) -> core::result::Result<(), AcquisitionError> {
            self.inner.poll_batch(batch)?;
            if self.inner.polls == self.after {
                self.cancel.cancel();
            }
            Ok(())
        }
    }

    #[test]
    fn cancellation_stops_loop() {
        let cancel = Cancellation::new();
        let mut engine = HeartRateEngine::new();
        let mut source = CancellingSource { inner: SineSource::new(5), cancel: &cancel, after: 5 };
        let mut sink = |_: &HeartRateEstimate| {};
        let pacer = FramePacer::new(PacerConfig { interval: Duration::from_micros(500), max_frames: None });

        let summary = block_on(pacer.run(&mut engine, &mut source, &mut sink, &cancel)).unwrap();

        assert_eq!(summary.frames, 5);
        assert_eq!(summary.estimates, 5);
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn stays_cancelled_until_rearmed() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let mut engine = HeartRateEngine::new();
        let mut source = SineSource::new(5);
        let mut sink = |_: &HeartRateEstimate| {};

        let summary = block_on(fast(4).run(&mut engine, &mut source, &mut sink, &cancel)).unwrap();
        assert_eq!(summary.frames, 0);
        assert!(cancel.is_cancelled());

        cancel.rearm();
        let summary = block_on(fast(4).run(&mut engine, &mut source, &mut sink, &cancel)).unwrap();
        assert_eq!(summary.frames, 4);
        assert!(!cancel.is_cancelled());
    }

    struct SlowSource {
        inner: SineSource,
    }

    impl SampleSource for SlowSource {
        fn poll_batch(&mut self, batch: &mut Batch) -> core::result::Result<(), AcquisitionError> {
            std::thread::sleep(std::time::Duration::from_millis(3));
            self.inner.poll_batch(batch)
        }
    }

    #[test]
    fn late_frames_count_as_overruns() {
        let mut engine = HeartRateEngine::new();
        let mut source = SlowSource { inner: SineSource::new(3) };
        let mut sink = |_: &HeartRateEstimate| {};
        let cancel = Cancellation::new();

        let summary = block_on(fast(6).run(&mut engine, &mut source, &mut sink, &cancel)).unwrap();

        assert_eq!(summary.frames, 6);
        assert!(summary.overruns >= 1);
    }

    #[test]
    fn cancellation_handle_rearms() {
        let c = Cancellation::new();
        assert!(!c.is_cancelled());
        c.cancel();
        assert!(c.is_cancelled());
        c.rearm();
        assert!(!c.is_cancelled());
    }
}
