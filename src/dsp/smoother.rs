//! # Exponential Parameter Smoother
//!
//! Every control value the delay reacts to (delay length, dry/wet gains,
//! feedback, crossfeed) is glided toward its target one sample at a time:
//!
//! ```text
//! current = target * w + current * (1 - w)
//! ```
//!
//! This is a first-order lowpass on the control signal. It never overshoots
//! and the distance to a constant target shrinks by `(1 - w)` every step,
//! so after `k` steps from `c0` the error is `(target - c0) * (1 - w)^k`.
//!
//! Two weights are used. Delay time moves slowly (`w = 0.001`, roughly a
//! thousand samples to settle) because a fast-moving read head is heard as
//! a pitch bend. Gains move ten times faster.

/// Weight for delay-length smoothing.
pub const DELAY_SMOOTHING: f64 = 0.001;

/// Weight for dry/wet, feedback and crossfeed gain smoothing.
pub const GAIN_SMOOTHING: f64 = 0.01;

/// A one-pole smoother gliding `current` toward `target`.
///
/// State is kept in `f64`: at the longest delays (millions of samples) an
/// `f32` would only resolve the read position to an eighth of a sample.
#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    current: f64,
    target: f64,
    weight: f64,
}

impl Smoother {
    /// A smoother at rest on zero.
    pub const fn new(weight: f64) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            weight,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Advance one sample and return the new current value.
    #[inline]
    pub fn step(&mut self) -> f64 {
        self.current = self.target * self.weight + self.current * (1.0 - self.weight);
        self.current
    }

    /// Jump both current and target to `value`.
    pub fn reset(&mut self, value: f64) {
        self.current = value;
        self.target = value;
    }
}
