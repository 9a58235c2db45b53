// bandpass: windowed smoothing plus second-difference detrend
//
// For each interior index i:
//   smoothed = mean(signal[i-w ..= i+w])
//   out      = 2*smoothed - signal[i-w] - signal[i+w]
// The first and last w samples are dropped; nothing is padded or wrapped.

use heapless::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandpassStage {
    window: usize,
}

impl BandpassStage {
    pub const fn new(window: usize) -> Self {
        Self { window }
    }

    pub const fn window(&self) -> usize {
        self.window
    }

    /// Length of the filtered output for an input of `len` samples.
    pub const fn output_len(&self, len: usize) -> usize {
        len.saturating_sub(2 * self.window)
    }

    /// Filter `signal` into a buffer of capacity `N`. Returns `None` when
    /// the filtered output would not fit, never a truncated sequence.
    pub fn apply<const N: usize>(&self, signal: &[f32]) -> Option<Vec<f32, N>> {
        let w = self.window;
        let span = (2 * w + 1) as f32;
        let mut out = Vec::new();
        if self.output_len(signal.len()) > N {
            return None;
        }
        if self.output_len(signal.len()) == 0 {
            return Some(out);
        }
        for i in w..signal.len() - w {
            let sum: f32 = signal[i - w..=i + w].iter().sum();
            let smoothed = sum / span;
            out.push(2.0 * smoothed - signal[i - w] - signal[i + w]).ok()?;
        }
        Some(out)
    }
}
