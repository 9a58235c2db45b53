#![cfg_attr(not(test), no_std)]

//! Interval timing for periodic loops, accumulated in microseconds.

use embassy_time::{Instant,Duration};
use stats::Stats;

pub struct TimeStats {
    started: bool,
    start: Instant,
    delta: Duration,
    stats: Stats
}

impl Default for TimeStats {
    fn default() -> Self { Self::new() }
}

impl TimeStats {
    pub const fn new() -> Self {
        Self {
            stats: Stats::new(),
            started: false,
            start: Instant::from_ticks(0),
            delta: Duration::from_ticks(0),
        }
    }
    // Call once per loop iteration; records the time since the previous call.
    pub fn loop_tick(&mut self) {
        self.loop_tick_at(Instant::now());
    }
    pub fn loop_tick_at(&mut self, now: Instant) {
        if self.started {
            self.delta = now - self.start;
            self.stats.add(self.delta.as_micros() as f64);
        } else {
            self.started = true;
        }
        self.start = now;
    }
    // Bracket a section with start_tick/stop_tick. Returns false (and records
    // nothing) when called out of order.
    pub fn start_tick(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.start = Instant::now();
        self.started = true;
        true
    }
    pub fn stop_tick(&mut self) -> bool {
        if !self.started {
            return false;
        }
        self.delta = Instant::now() - self.start;
        self.started = false;
        self.stats.add(self.delta.as_micros() as f64);
        true
    }
    pub fn last(&self) -> Duration { self.delta }
    pub fn reset(&mut self) {
        self.stats.reset();
        self.started = false;
        self.delta = Duration::from_ticks(0);
    }
    pub fn stats(&self) -> Stats {
        self.stats
    }
}
