//! # Fractional Delay Line
//!
//! A fixed-capacity circular buffer of samples, written at an integral
//! cursor and read back at any fractional position.
//!
//! ## Who owns the write head?
//!
//! Both channels of the delay advance in lockstep, so the write cursor is
//! shared and lives in the engine, not in each line. The line only knows
//! how to store a sample at an index and how to read at a position. The
//! engine reads at `write_pos - delay_samples`, which is usually negative
//! for the first few thousand samples after a reset and always fractional
//! while the delay time glides.
//!
//! ## Linear Interpolation
//!
//! ```text
//! result = buffer[i] * (1 - frac) + buffer[i + 1] * frac
//! ```
//!
//! where `i = floor(position)` and `frac = position - i`. The upper index
//! wraps to 0 past the end of the buffer, so a read at `capacity - 0.5`
//! blends the last and the first slot.

use std::num::NonZeroUsize;

/// A circular audio buffer with fractional, wrap-around reads.
///
/// Allocated once at full capacity; nothing in here ever reallocates,
/// which keeps `process()` free of heap traffic.
pub struct DelayLine {
    /// Stored samples, zero-filled on creation and on [`clear`](Self::clear).
    buffer: Vec<f32>,
}

impl DelayLine {
    /// Create a zero-filled delay line holding `capacity` samples.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            buffer: vec![0.0; capacity.get()],
        }
    }

    /// Number of samples the line can hold.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Store `sample` at the integral write cursor `index`.
    ///
    /// The caller keeps `index` in `[0, capacity)`; an out-of-range index
    /// wraps instead of panicking.
    pub fn write(&mut self, index: usize, sample: f32) {
        let len = self.buffer.len();
        self.buffer[index % len] = sample;
    }

    /// Read the buffer at a fractional `position` using linear
    /// interpolation.
    ///
    /// `position` may be negative or beyond the capacity: it is first
    /// brought into `[0, capacity)` modulo the capacity, so `-0.5` and
    /// `capacity - 0.5` read the same value.
    pub fn read(&self, position: f64) -> f32 {
        let len = self.buffer.len();
        let capacity = len as f64;

        let mut wrapped = position.rem_euclid(capacity);
        // rem_euclid of a tiny negative number can round up to exactly
        // `capacity`, which is the same slot as 0.
        if wrapped >= capacity {
            wrapped -= capacity;
        }

        let index_a = (wrapped as usize).min(len - 1);
        let frac = (wrapped - index_a as f64) as f32;
        let index_b = if index_a + 1 >= len { 0 } else { index_a + 1 };

        let sample_a = self.buffer[index_a];
        let sample_b = self.buffer[index_b];

        sample_a * (1.0 - frac) + sample_b * frac
    }

    /// Zero the whole buffer.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
