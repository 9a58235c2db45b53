// control: map BPM onto a bounded control value (e.g. playback volume)

use libm::{fmaxf, fminf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlMap {
    pub bpm_lo: u16,
    pub bpm_hi: u16,
    pub out_lo: f32,
    pub out_hi: f32,
}

impl Default for ControlMap {
    fn default() -> Self {
        Self { bpm_lo: 60, bpm_hi: 100, out_lo: 0.2, out_hi: 1.0 }
    }
}

impl ControlMap {
    /// Linear map of `bpm` from [bpm_lo, bpm_hi] onto [out_lo, out_hi],
    /// clamped at both ends.
    pub fn map(&self, bpm: u16) -> f32 {
        let span = self.bpm_hi.saturating_sub(self.bpm_lo);
        if span == 0 {
            return self.out_lo;
        }
        let t = (bpm as f32 - self.bpm_lo as f32) / span as f32;
        let v = t * (self.out_hi - self.out_lo) + self.out_lo;
        fminf(fmaxf(v, self.out_lo), self.out_hi)
    }
}
