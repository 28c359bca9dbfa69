//! # DSP Primitives
//!
//! - **`delay_line`**: circular buffer with fractional, wrap-around reads.
//! - **`smoother`**: one-pole glide for delay lengths and gains.
//! - **`gain`**: maps the percent knobs to gain targets.
//! - **`filter`**: biquad low cut / high cut in front of the delay line.

pub mod delay_line;
pub mod filter;
pub mod gain;
pub mod smoother;
