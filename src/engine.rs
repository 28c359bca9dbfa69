//! # Delay Engine
//!
//! The per-instance state of the tempo delay and the per-sample routine
//! that runs it. Host glue calls [`DelayEngine::begin_block`] once per
//! audio block and [`DelayEngine::process_frame`] once per stereo sample.
//!
//! ## Signal Flow (per channel, crossfeed shown for the left side)
//!
//! ```text
//! input ──┬─────────────────────────────────────────────── × dry ──┐
//!         │                                                        │
//!         └─► [Low Cut] ─► [High Cut] ─►(+)──► [Delay Line]        │
//!                                        ▲         │               │
//!                     × feedback ────────┤     delayed_l ── × wet ─(+)──► output
//!                     (own delayed)      │         │
//!                     × crossfeed ───────┘         │
//!                     (delayed_r)                  ▼
//!                                         feeds the right channel's
//!                                         crossfeed the same way
//! ```
//!
//! ## No fades, no resets
//!
//! Changing tempo or division never touches the buffers or the write
//! cursor. Only the *target* delay changes; the read head then glides
//! there through the delay smoother, and gains glide through theirs.
//! Start-up is the same story: every gain starts at zero, so the output
//! ramps in instead of clicking.

use std::num::NonZeroUsize;

use crate::dsp::delay_line::DelayLine;
use crate::dsp::filter::BiquadFilter;
use crate::dsp::gain::{feedback_gain, mix_gains};
use crate::dsp::smoother::{Smoother, DELAY_SMOOTHING, GAIN_SMOOTHING};
use crate::tempo::{Division, TapTempo, TempoMode, TempoResolver};

/// Control values read once at the start of each audio block.
#[derive(Debug, Clone, Copy)]
pub struct BlockControls {
    /// Transport tempo, if the host reports one.
    pub host_tempo: Option<f32>,
    pub user_tempo: f32,
    pub tempo_mode: TempoMode,
    /// Monotonic clock reading in milliseconds when the tap button was
    /// pressed during this block.
    pub tap_time_ms: Option<u64>,
    pub division_left: Division,
    pub division_right: Division,
    /// Dry/wet blend, percent.
    pub mix: f32,
    /// Own-channel feedback, percent.
    pub feedback: f32,
    /// Opposite-channel feedback, percent.
    pub crossfeed: f32,
}

impl Default for BlockControls {
    fn default() -> Self {
        Self {
            host_tempo: None,
            user_tempo: 120.0,
            tempo_mode: TempoMode::User,
            tap_time_ms: None,
            division_left: Division::Quarter,
            division_right: Division::Quarter,
            mix: 50.0,
            feedback: 0.0,
            crossfeed: 0.0,
        }
    }
}

/// Cutoff and resonance for one tone filter stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub frequency: f32,
    pub q: f32,
}

/// Tone filters applied to the input before it enters the delay line.
/// `None` bypasses a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToneSettings {
    pub low_cut: Option<FilterSettings>,
    pub high_cut: Option<FilterSettings>,
}

/// Everything one side of the stereo delay owns.
struct Channel {
    line: DelayLine,
    delay: Smoother,
    low_cut: BiquadFilter,
    high_cut: BiquadFilter,
}

impl Channel {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            line: DelayLine::new(capacity),
            delay: Smoother::new(DELAY_SMOOTHING),
            low_cut: BiquadFilter::new(),
            high_cut: BiquadFilter::new(),
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        self.delay.reset(0.0);
        self.low_cut.reset();
        self.high_cut.reset();
    }

    /// Low cut, then high cut, each only if enabled.
    fn shape(&mut self, input: f32, tone: &ToneSettings, sample_rate: f32) -> f32 {
        let mut sample = input;
        if let Some(low) = tone.low_cut {
            sample = self.low_cut.low_cut(sample, low.frequency, low.q, sample_rate);
        }
        if let Some(high) = tone.high_cut {
            sample = self.high_cut.high_cut(sample, high.frequency, high.q, sample_rate);
        }
        sample
    }
}

/// The tempo-synced stereo delay.
///
/// All memory is allocated in [`new`](Self::new); nothing after that
/// allocates, blocks or fails.
pub struct DelayEngine {
    sample_rate: f32,
    capacity: usize,

    left: Channel,
    right: Channel,

    /// The shared "now" of both delay lines, always in `[0, capacity)`.
    write_pos: usize,

    dry: Smoother,
    wet: Smoother,
    feedback: Smoother,
    crossfeed: Smoother,

    tap: TapTempo,
    resolver: TempoResolver,
}

impl DelayEngine {
    /// Allocate a silent engine whose delay lines hold `capacity` samples.
    pub fn new(sample_rate: f32, capacity: NonZeroUsize) -> Self {
        let left = Channel::new(capacity);
        let right = Channel::new(capacity);

        Self {
            sample_rate,
            capacity: left.line.capacity(),
            left,
            right,
            write_pos: 0,
            dry: Smoother::new(GAIN_SMOOTHING),
            wet: Smoother::new(GAIN_SMOOTHING),
            feedback: Smoother::new(GAIN_SMOOTHING),
            crossfeed: Smoother::new(GAIN_SMOOTHING),
            tap: TapTempo::new(),
            resolver: TempoResolver::new(),
        }
    }

    /// Return to the freshly activated state: silent buffers, cleared
    /// filters, zero gains and delays, no memorised tempo, tap tempo at
    /// 120 BPM.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.write_pos = 0;

        for gain in [
            &mut self.dry,
            &mut self.wet,
            &mut self.feedback,
            &mut self.crossfeed,
        ] {
            gain.reset(0.0);
        }

        self.tap.reset();
        self.resolver.reset();
    }

    /// The tempo the current delay targets follow. This is what the tempo
    /// display shows; 0.0 until a valid tempo has been seen.
    pub fn current_tempo(&self) -> f32 {
        self.resolver.tempo()
    }

    /// The `[left, right]` delay lengths the read heads are gliding to.
    pub fn delay_targets(&self) -> [f64; 2] {
        [self.left.delay.target(), self.right.delay.target()]
    }

    /// Once-per-block work: register a tap, resolve the tempo, retarget the
    /// delays if tempo or division changed, and map the gain knobs.
    pub fn begin_block(&mut self, controls: &BlockControls) {
        if let Some(now_ms) = controls.tap_time_ms {
            self.tap.tap(now_ms);
        }

        let tempo = controls
            .tempo_mode
            .select(controls.host_tempo, controls.user_tempo, self.tap.bpm());
        let divisions = [controls.division_left, controls.division_right];
        let retarget = self
            .resolver
            .resolve(tempo, divisions, self.sample_rate, self.capacity);
        if let Some([left, right]) = retarget {
            self.left.delay.set_target(left);
            self.right.delay.set_target(right);
        }

        let (dry, wet) = mix_gains(controls.mix);
        self.dry.set_target(dry as f64);
        self.wet.set_target(wet as f64);
        self.feedback.set_target(feedback_gain(controls.feedback) as f64);
        self.crossfeed.set_target(feedback_gain(controls.crossfeed) as f64);
    }

    /// Process one stereo sample and return the `(left, right)` output.
    pub fn process_frame(&mut self, input_l: f32, input_r: f32, tone: &ToneSettings) -> (f32, f32) {
        // Read before write, at the delay lengths from the previous step.
        let now = self.write_pos as f64;
        let delayed_l = self.left.line.read(now - self.left.delay.current());
        let delayed_r = self.right.line.read(now - self.right.delay.current());

        let shaped_l = self.left.shape(input_l, tone, self.sample_rate);
        let shaped_r = self.right.shape(input_r, tone, self.sample_rate);

        self.left.delay.step();
        self.right.delay.step();
        let dry = self.dry.step() as f32;
        let wet = self.wet.step() as f32;
        let feedback = self.feedback.step() as f32;
        let crossfeed = self.crossfeed.step() as f32;

        self.left.line.write(
            self.write_pos,
            shaped_l + delayed_r * crossfeed + delayed_l * feedback,
        );
        self.right.line.write(
            self.write_pos,
            shaped_r + delayed_l * crossfeed + delayed_r * feedback,
        );

        // The dry path is the unfiltered input.
        let out_l = dry * input_l + wet * delayed_l;
        let out_r = dry * input_r + wet * delayed_r;

        self.write_pos += 1;
        if self.write_pos >= self.capacity {
            self.write_pos = 0;
        }

        (out_l, out_r)
    }

    /// How long the echoes keep ringing after the input stops, in samples.
    ///
    /// Each trip around the loop scales the signal by at most
    /// `feedback + crossfeed`. The tail ends when that has fallen to -60 dB:
    ///
    /// ```text
    /// repeats = log(0.001) / log(loop_gain)
    /// ```
    ///
    /// `None` means the loop doesn't decay at all.
    pub fn tail_samples(&self) -> Option<u32> {
        let [left, right] = self.delay_targets();
        let longest = left.max(right);
        let loop_gain = self.feedback.target() + self.crossfeed.target();

        if loop_gain >= 1.0 {
            return None;
        }
        if loop_gain > 0.001 {
            let repeats = -3.0 / loop_gain.log10();
            Some(((repeats + 1.0) * longest).min(u32::MAX as f64) as u32)
        } else {
            Some(longest as u32)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
