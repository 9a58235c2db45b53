#![cfg_attr(not(test), no_std)]

//! Running statistics over a stream of samples.
//!
//! Besides the usual count/min/max/mean/std, the accumulator tracks the
//! population variance and the mean absolute step between consecutive
//! samples, which is what signal-quality scoring needs.

use libm::{sqrt,fmin,fmax,fabs};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stats {
    n : f64,
    sx : f64,
    sxx : f64,
    minx : f64,
    maxx : f64,
    last : f64, // Previous sample, for first differences
    sdx : f64, // Sum of |x[i] - x[i-1]|
}

impl Default for Stats {
    fn default() -> Self { Self::new() }
}

impl Stats {
    pub const fn new() -> Self {
        Self { n:0.0, sx:0.0, sxx:0.0, minx:0.0, maxx:0.0, last:0.0, sdx:0.0 }
    }
    pub fn reset(&mut self) { *self = Self::new(); }
    pub fn add(&mut self, x:f64) {
        if self.n == 0.0 {
            self.minx = x;
            self.maxx = x;
        } else {
            self.minx = fmin(self.minx, x);
            self.maxx = fmax(self.maxx, x);
            self.sdx += fabs(x - self.last);
        }
        self.last = x;
        self.n += 1.0;
        self.sx += x;
        self.sxx += x*x;
    }
    pub fn n(&self) -> u32 { self.n as u32 }
    pub fn min(&self) -> f64 {
        if self.n > 0.0 { self.minx } else { f64::NAN }
    }
    pub fn max(&self) -> f64 {
        if self.n > 0.0 { self.maxx } else { f64::NAN }
    }
    pub fn mean(&self) -> f64 {
        if self.n > 0.0 { self.sx/self.n } else { f64::NAN }
    }
    // Sample standard deviation (n-1 denominator)
    pub fn std(&self) -> f64 {
        if self.n > 1.0 {
            sqrt(fmax(0.0, self.sxx - self.sx*self.sx/self.n) / (self.n-1.0))
        } else { f64::NAN }
    }
    // Population variance (n denominator). Clamped at zero, the one-pass
    // formula can go slightly negative on constant input.
    pub fn variance(&self) -> f64 {
        if self.n > 0.0 {
            fmax(0.0, (self.sxx - self.sx*self.sx/self.n) / self.n)
        } else { f64::NAN }
    }
    // Mean of |x[i] - x[i-1]| over the n-1 consecutive pairs
    pub fn mean_abs_step(&self) -> f64 {
        if self.n > 1.0 { self.sdx / (self.n-1.0) } else { f64::NAN }
    }
}

impl FromIterator<f64> for Stats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut s = Stats::new();
        iter.into_iter().for_each(|x| s.add(x));
        s
    }
}

impl Extend<f64> for Stats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        iter.into_iter().for_each(|x| self.add(x));
    }
}
