//! # Low-Cut / High-Cut Biquad
//!
//! The tone controls in front of the delay line are two-pole (12 dB/octave)
//! filters: a high-pass for the low cut and a low-pass for the high cut.
//! Both use the RBJ "Audio EQ Cookbook" coefficients:
//!
//! ```text
//! w0    = 2π * cutoff / sample_rate
//! alpha = sin(w0) / (2 * Q)
//!
//! low-pass:   b0 = (1 - cos w0) / 2   b1 = 1 - cos w0      b2 = b0
//! high-pass:  b0 = (1 + cos w0) / 2   b1 = -(1 + cos w0)   b2 = b0
//! both:       a0 = 1 + alpha          a1 = -2 cos w0       a2 = 1 - alpha
//! ```
//!
//! and run in transposed direct form II, which needs two state variables
//! and behaves well when coefficients change between samples.
//!
//! ## Why cache coefficients?
//!
//! Cutoff and Q are re-read every sample so they can be automated, but they
//! are constant most of the time. Each filter remembers the settings its
//! coefficients were computed for and only redoes the trigonometry when one
//! of them moves.

use std::f32::consts::PI;

/// Lowest cutoff the filter will accept.
const MIN_CUTOFF_HZ: f32 = 10.0;

/// Lowest Q the filter will accept.
const MIN_Q: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Response {
    LowPass,
    HighPass,
}

/// The settings the cached coefficients belong to.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Design {
    response: Response,
    cutoff_hz: f32,
    q: f32,
    sample_rate: f32,
}

/// A two-pole filter stage. Each channel gets its own instance per stage.
pub struct BiquadFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    /// Transposed direct form II state.
    z1: f32,
    z2: f32,

    design: Option<Design>,
}

impl BiquadFilter {
    /// A filter with cleared state and passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            design: None,
        }
    }

    /// Clear the filter's memory. Coefficients are kept.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Run one sample through a high-pass at `cutoff_hz`.
    pub fn low_cut(&mut self, input: f32, cutoff_hz: f32, q: f32, sample_rate: f32) -> f32 {
        self.configure(Response::HighPass, cutoff_hz, q, sample_rate);
        self.process(input)
    }

    /// Run one sample through a low-pass at `cutoff_hz`.
    pub fn high_cut(&mut self, input: f32, cutoff_hz: f32, q: f32, sample_rate: f32) -> f32 {
        self.configure(Response::LowPass, cutoff_hz, q, sample_rate);
        self.process(input)
    }

    fn configure(&mut self, response: Response, cutoff_hz: f32, q: f32, sample_rate: f32) {
        let design = Design {
            response,
            cutoff_hz,
            q,
            sample_rate,
        };
        if self.design == Some(design) {
            return;
        }

        // Stay clear of DC and of Nyquist, where the coefficient math
        // degenerates.
        let cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, sample_rate * 0.49);
        let q = q.max(MIN_Q);

        let w0 = 2.0 * PI * cutoff / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match response {
            Response::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            Response::HighPass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
        };
        let a0 = 1.0 + alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
        self.design = Some(design);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}

impl Default for BiquadFilter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 44100.0;
    const BUTTERWORTH_Q: f32 = 0.707;

    /// Peak absolute output for a +1/-1 alternating (Nyquist) input, after
    /// the filter has settled.
    fn nyquist_peak(mut run: impl FnMut(f32) -> f32) -> f32 {
        let mut peak = 0.0_f32;
        for i in 0..4000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            let output = run(input);
            if i > 2000 {
                peak = peak.max(output.abs());
            }
        }
        peak
    }

    #[test]
    fn test_high_cut_passes_dc() {
        let mut filter = BiquadFilter::new();

        let mut output = 0.0;
        for _ in 0..10_000 {
            output = filter.high_cut(1.0, 1000.0, BUTTERWORTH_Q, RATE);
        }
        assert!(
            (output - 1.0).abs() < 1e-3,
            "DC should pass the high cut, got {output}"
        );
    }

    #[test]
    fn test_high_cut_attenuates_nyquist() {
        let mut filter = BiquadFilter::new();
        let peak = nyquist_peak(|x| filter.high_cut(x, 200.0, BUTTERWORTH_Q, RATE));
        assert!(peak < 0.01, "Expected heavy attenuation, got {peak}");
    }

    #[test]
    fn test_low_cut_blocks_dc() {
        let mut filter = BiquadFilter::new();

        let mut output = 1.0;
        for _ in 0..10_000 {
            output = filter.low_cut(1.0, 200.0, BUTTERWORTH_Q, RATE);
        }
        assert!(output.abs() < 1e-3, "DC should be removed, got {output}");
    }

    #[test]
    fn test_low_cut_passes_nyquist() {
        let mut filter = BiquadFilter::new();
        let peak = nyquist_peak(|x| filter.low_cut(x, 200.0, BUTTERWORTH_Q, RATE));
        assert!(
            (peak - 1.0).abs() < 0.01,
            "Nyquist should pass the low cut, got {peak}"
        );
    }

    #[test]
    fn test_coefficients_follow_cutoff_changes() {
        let mut filter = BiquadFilter::new();
        filter.high_cut(0.0, 1000.0, BUTTERWORTH_Q, RATE);
        let b0_low = filter.b0;

        filter.high_cut(0.0, 8000.0, BUTTERWORTH_Q, RATE);
        assert!(
            filter.b0 > b0_low,
            "Raising the cutoff should raise b0 ({} -> {})",
            b0_low,
            filter.b0
        );
        assert_eq!(filter.design.map(|d| d.cutoff_hz), Some(8000.0));
    }

    #[test]
    fn test_extreme_settings_stay_finite() {
        let mut filter = BiquadFilter::new();
        for &(cutoff, q) in &[(0.0, 0.0), (-5.0, 1.0), (1e9, 50.0), (20.0, 1e-6)] {
            for i in 0..500 {
                let input = (i as f32 * 0.1).sin();
                let out_low = filter.low_cut(input, cutoff, q, RATE);
                assert!(out_low.is_finite(), "low cut {cutoff}/{q} went non-finite");
            }
            filter.reset();
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = BiquadFilter::new();
        filter.high_cut(1.0, 1000.0, BUTTERWORTH_Q, RATE);
        assert!(filter.z1.abs() > 0.0, "state should be non-zero after a sample");

        filter.reset();
        assert_eq!(filter.z1, 0.0);
        assert_eq!(filter.z2, 0.0);
    }
}
