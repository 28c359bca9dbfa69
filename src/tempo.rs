//! # Tempo
//!
//! Everything that turns "120 BPM, dotted eighth" into a number of
//! samples:
//!
//! - [`TempoMode`] picks where the tempo comes from: the host transport,
//!   the user's tempo knob, or the tap button.
//! - [`TapTempo`] turns the time between two taps into BPM.
//! - [`Division`] scales one beat to the selected note value.
//! - [`TempoResolver`] remembers the last tempo and divisions and only
//!   produces new delay targets when one of them actually changes.
//!
//! ## From tempo to samples
//!
//! ```text
//! samples_per_beat = 60 / bpm * sample_rate
//! delay_samples    = samples_per_beat * division_multiplier
//! ```
//!
//! At 120 BPM and 48 kHz a quarter note is `0.5 s * 48000 = 24000` samples,
//! a dotted eighth `18000`.

use std::num::NonZeroUsize;

use nih_plug::nih_debug_assert;

/// The slowest tempo the delay buffers are sized for. At 6 BPM one beat
/// lasts ten seconds, the same span as the tap-tempo timeout.
pub const MIN_TEMPO_BPM: f32 = 6.0;

/// Tap tempo before the first valid pair of taps.
pub const DEFAULT_TAP_BPM: f32 = 120.0;

/// Taps closer together than this are contact bounce, not rhythm.
pub const TAP_MIN_INTERVAL_MS: u64 = 50;

/// Taps further apart than this start a new measurement.
pub const TAP_MAX_INTERVAL_MS: u64 = 10_000;

/// Buffer capacity needed to hold one beat at [`MIN_TEMPO_BPM`], plus one
/// guard sample so the longest delay never aliases onto the write head.
///
/// Returns `None` for sample rates that can't produce a usable buffer.
pub fn max_delay_capacity(sample_rate: f32) -> Option<NonZeroUsize> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return None;
    }
    let samples_per_slowest_beat = (60.0 / MIN_TEMPO_BPM as f64) * sample_rate as f64;
    NonZeroUsize::new(samples_per_slowest_beat.ceil() as usize + 1)
}

/// Rhythmic value of the delay, relative to one beat (a quarter note).
///
/// The selector order matches the division parameters: 0 is a quarter,
/// 5 a sixteenth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Division {
    /// 1 beat.
    #[default]
    Quarter,
    /// 2/3 beat.
    QuarterTriplet,
    /// 1/2 beat.
    Eighth,
    /// 3/4 beat.
    DottedEighth,
    /// 1/3 beat.
    EighthTriplet,
    /// 1/4 beat.
    Sixteenth,
}

impl Division {
    /// Number of selectable divisions.
    pub const COUNT: i32 = 6;

    /// Map a selector value to a division. Anything outside `0..=5` is a
    /// quarter note.
    pub fn from_selector(selector: i32) -> Self {
        match selector {
            1 => Self::QuarterTriplet,
            2 => Self::Eighth,
            3 => Self::DottedEighth,
            4 => Self::EighthTriplet,
            5 => Self::Sixteenth,
            _ => Self::Quarter,
        }
    }

    /// Length of this division in beats.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Quarter => 1.0,
            Self::QuarterTriplet => 2.0 / 3.0,
            Self::Eighth => 0.5,
            Self::DottedEighth => 0.75,
            Self::EighthTriplet => 1.0 / 3.0,
            Self::Sixteenth => 0.25,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Quarter => "1/4",
            Self::QuarterTriplet => "1/4 T",
            Self::Eighth => "1/8",
            Self::DottedEighth => "1/8 D",
            Self::EighthTriplet => "1/8 T",
            Self::Sixteenth => "1/16",
        }
    }
}

/// Where the delay takes its tempo from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempoMode {
    #[default]
    Host,
    User,
    Tap,
}

impl TempoMode {
    /// Number of selectable modes.
    pub const COUNT: i32 = 3;

    /// Map a selector value to a mode; unknown values follow the host.
    pub fn from_selector(selector: i32) -> Self {
        match selector {
            1 => Self::User,
            2 => Self::Tap,
            _ => Self::Host,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::User => "User",
            Self::Tap => "Tap",
        }
    }

    /// Pick the effective tempo for this mode.
    ///
    /// A host that doesn't report a tempo (no transport, offline preview)
    /// falls back to the user tempo.
    pub fn select(self, host_bpm: Option<f32>, user_bpm: f32, tap_bpm: f32) -> f32 {
        match self {
            Self::Host => host_bpm.unwrap_or(user_bpm),
            Self::User => user_bpm,
            Self::Tap => tap_bpm,
        }
    }
}

/// Estimates tempo from the interval between two taps.
#[derive(Debug, Clone)]
pub struct TapTempo {
    bpm: f32,
    /// Timestamp of the previous tap in milliseconds, if any.
    last_tap_ms: Option<u64>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            bpm: DEFAULT_TAP_BPM,
            last_tap_ms: None,
        }
    }

    /// Forget the previous tap and return to [`DEFAULT_TAP_BPM`].
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The last valid tapped tempo.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Register a tap at `now_ms` on a monotonic millisecond clock.
    ///
    /// Returns the new tempo when the interval since the previous tap lies
    /// in `(50 ms, 10 s]`. Otherwise the held tempo is left alone. Either
    /// way this tap becomes the reference for the next one, so a burst of
    /// taps re-synchronises on its own.
    pub fn tap(&mut self, now_ms: u64) -> Option<f32> {
        let previous = self.last_tap_ms.replace(now_ms)?;
        let interval = now_ms.checked_sub(previous)?;
        if interval <= TAP_MIN_INTERVAL_MS || interval > TAP_MAX_INTERVAL_MS {
            return None;
        }

        self.bpm = 60_000.0 / interval as f32;
        Some(self.bpm)
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay length in samples for `tempo` and `division`, clamped to
/// `[0, capacity - 1]`.
///
/// `tempo` must be positive and finite; [`TempoResolver`] filters
/// everything else out before calling this.
pub fn delay_samples(tempo: f32, division: Division, sample_rate: f32, capacity: usize) -> f64 {
    let samples_per_beat = (60.0 / tempo as f64) * sample_rate as f64;
    let max_delay = capacity.saturating_sub(1) as f64;
    (samples_per_beat * division.multiplier()).clamp(0.0, max_delay)
}

/// Memorises the tempo and divisions the current delay targets were
/// computed from.
#[derive(Debug, Clone, Default)]
pub struct TempoResolver {
    /// 0.0 until the first valid tempo arrives.
    tempo: f32,
    divisions: [Division; 2],
}

impl TempoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Tempo the current targets were computed from, or 0.0 if none yet.
    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    /// Compare against the memorised state and return fresh `[left, right]`
    /// delay targets if the tempo or either division changed.
    ///
    /// A tempo that is zero, negative or not finite would give an infinite
    /// or negative delay. Such a block is ignored entirely and the previous
    /// targets stay in force.
    pub fn resolve(
        &mut self,
        tempo: f32,
        divisions: [Division; 2],
        sample_rate: f32,
        capacity: usize,
    ) -> Option<[f64; 2]> {
        if !tempo.is_finite() || tempo <= 0.0 {
            return None;
        }
        if tempo == self.tempo && divisions == self.divisions {
            return None;
        }

        self.tempo = tempo;
        self.divisions = divisions;

        let targets = divisions.map(|division| delay_samples(tempo, division, sample_rate, capacity));
        nih_debug_assert!(targets.iter().all(|&t| t < capacity as f64));
        Some(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 48000.0;

    #[test]
    fn test_division_table() {
        let expected = [1.0, 2.0 / 3.0, 0.5, 0.75, 1.0 / 3.0, 0.25];
        for (selector, multiplier) in expected.iter().enumerate() {
            let division = Division::from_selector(selector as i32);
            assert_eq!(division.multiplier(), *multiplier, "selector {selector}");
        }
    }

    #[test]
    fn test_unknown_division_is_a_quarter() {
        for selector in [-1, 6, 42, i32::MAX] {
            assert_eq!(Division::from_selector(selector), Division::Quarter);
        }
    }

    #[test]
    fn test_unknown_tempo_mode_follows_host() {
        assert_eq!(TempoMode::from_selector(0), TempoMode::Host);
        assert_eq!(TempoMode::from_selector(1), TempoMode::User);
        assert_eq!(TempoMode::from_selector(2), TempoMode::Tap);
        assert_eq!(TempoMode::from_selector(3), TempoMode::Host);
        assert_eq!(TempoMode::from_selector(-7), TempoMode::Host);
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(TempoMode::Host.select(Some(90.0), 100.0, 110.0), 90.0);
        assert_eq!(TempoMode::Host.select(None, 100.0, 110.0), 100.0);
        assert_eq!(TempoMode::User.select(Some(90.0), 100.0, 110.0), 100.0);
        assert_eq!(TempoMode::Tap.select(Some(90.0), 100.0, 110.0), 110.0);
    }

    #[test]
    fn test_quarter_at_120_bpm() {
        let samples = delay_samples(120.0, Division::Quarter, RATE, 1_000_000);
        assert!((samples - 24_000.0).abs() < 1e-9, "got {samples}");

        let dotted = delay_samples(120.0, Division::DottedEighth, RATE, 1_000_000);
        assert!((dotted - 18_000.0).abs() < 1e-9, "got {dotted}");
    }

    #[test]
    fn test_delay_never_reaches_capacity() {
        let capacity = 1000;
        for selector in 0..Division::COUNT {
            let division = Division::from_selector(selector);
            for tempo in [1e-6, 0.01, 1.0, MIN_TEMPO_BPM] {
                let samples = delay_samples(tempo, division, RATE, capacity);
                assert_eq!(samples, (capacity - 1) as f64, "{tempo} BPM, {division:?}");
            }
        }
    }

    #[test]
    fn test_capacity_holds_slowest_beat() {
        let capacity = max_delay_capacity(RATE).unwrap().get();
        assert_eq!(capacity, 480_001);

        let slowest = delay_samples(MIN_TEMPO_BPM, Division::Quarter, RATE, capacity);
        assert!(slowest < capacity as f64);
        assert_eq!(slowest, 480_000.0);

        assert!(max_delay_capacity(0.0).is_none());
        assert!(max_delay_capacity(f32::NAN).is_none());
    }

    #[test]
    fn test_two_taps_500ms_apart_give_120_bpm() {
        let mut tap = TapTempo::new();
        assert_eq!(tap.tap(1_000), None, "a lone first tap has no interval");
        assert_eq!(tap.tap(1_500), Some(120.0));
        assert_eq!(tap.bpm(), 120.0);
    }

    #[test]
    fn test_bounce_and_timeout_keep_previous_tempo() {
        let mut tap = TapTempo::new();
        tap.tap(0);
        tap.tap(600);
        assert_eq!(tap.bpm(), 100.0);

        // 50 ms is still bounce.
        assert_eq!(tap.tap(650), None);
        assert_eq!(tap.bpm(), 100.0);

        // More than ten seconds is a timeout.
        assert_eq!(tap.tap(10_651), None);
        assert_eq!(tap.bpm(), 100.0);

        // Exactly ten seconds still counts: the rejected taps above moved
        // the reference forward.
        assert_eq!(tap.tap(20_651), Some(6.0));
    }

    #[test]
    fn test_tap_reset() {
        let mut tap = TapTempo::new();
        tap.tap(0);
        tap.tap(250);
        assert_eq!(tap.bpm(), 240.0);

        tap.reset();
        assert_eq!(tap.bpm(), DEFAULT_TAP_BPM);
        assert_eq!(tap.tap(5_000), None);
    }

    #[test]
    fn test_resolver_only_fires_on_change() {
        let mut resolver = TempoResolver::new();
        let quarters = [Division::Quarter, Division::Quarter];

        let targets = resolver.resolve(120.0, quarters, RATE, 1_000_000);
        assert_eq!(targets, Some([24_000.0, 24_000.0]));
        assert_eq!(resolver.tempo(), 120.0);

        assert_eq!(resolver.resolve(120.0, quarters, RATE, 1_000_000), None);

        let targets = resolver.resolve(120.0, [Division::Quarter, Division::Eighth], RATE, 1_000_000);
        assert_eq!(targets, Some([24_000.0, 12_000.0]));

        let targets = resolver.resolve(60.0, [Division::Quarter, Division::Eighth], RATE, 1_000_000);
        assert_eq!(targets, Some([48_000.0, 24_000.0]));
    }

    #[test]
    fn test_resolver_ignores_invalid_tempo() {
        let mut resolver = TempoResolver::new();
        let quarters = [Division::Quarter, Division::Quarter];
        resolver.resolve(120.0, quarters, RATE, 1_000_000);

        for tempo in [0.0, -30.0, f32::NAN, f32::INFINITY] {
            assert_eq!(resolver.resolve(tempo, quarters, RATE, 1_000_000), None);
            assert_eq!(resolver.tempo(), 120.0);
        }
    }
}
