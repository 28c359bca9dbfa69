//! # Loveless Tempo Delay: An AU/VST3/CLAP Stereo Delay
//!
//! A stereo delay whose time follows the music instead of a millisecond
//! knob. The delay length comes from a tempo (host transport, a tempo knob,
//! or tapped in) and a note value per channel. Built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug); AUv2 via
//! clap-wrapper.
//!
//! ## Layout
//!
//! - [`params`]: what the host sees.
//! - [`tempo`]: tempo sources, tap tempo, note divisions, tempo → samples.
//! - [`engine`]: per-instance state and the per-sample routine.
//! - [`dsp`]: delay line, smoothers, gain curves, tone filters.
//!
//! This file is only glue between nih-plug's lifecycle and the engine:
//!
//! | Host event     | Here           | Engine                        |
//! |----------------|----------------|-------------------------------|
//! | instantiate    | `initialize()` | `DelayEngine::new`            |
//! | activate       | `reset()`      | `DelayEngine::reset`          |
//! | process block  | `process()`    | `begin_block` + `process_frame` |

mod dsp;
mod engine;
mod params;
mod tempo;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use engine::{BlockControls, DelayEngine, FilterSettings, ToneSettings};
use nih_plug::prelude::*;
use params::PluginParams;
use tempo::{Division, TempoMode};

/// The plugin instance.
///
/// Parameters are shared with the host through an `Arc`; everything the
/// audio thread mutates lives in the engine and is owned exclusively by it.
/// Instances share nothing, so any number can run side by side.
struct LovelessTempoDelay {
    params: Arc<PluginParams>,

    /// Allocated in `initialize()` once the sample rate is known.
    engine: Option<DelayEngine>,

    /// Origin of the monotonic millisecond clock tap tempo is measured on.
    clock: Instant,

    /// Tap button state in the previous block, for edge detection. The
    /// button is a host parameter and stays high for as long as it is held.
    tap_was_down: bool,
}

impl Default for LovelessTempoDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            engine: None,
            clock: Instant::now(),
            tap_was_down: false,
        }
    }
}

impl LovelessTempoDelay {
    /// Milliseconds since this instance was created.
    fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    fn block_controls(&mut self, host_tempo: Option<f64>) -> BlockControls {
        let tap_down = self.params.tap.value();
        let tap_time_ms = (tap_down && !self.tap_was_down).then(|| self.now_ms());
        self.tap_was_down = tap_down;

        BlockControls {
            host_tempo: host_tempo.map(|bpm| bpm as f32),
            user_tempo: self.params.user_tempo.value(),
            tempo_mode: TempoMode::from_selector(self.params.tempo_mode.value()),
            tap_time_ms,
            division_left: Division::from_selector(self.params.division_left.value()),
            division_right: Division::from_selector(self.params.division_right.value()),
            mix: self.params.mix.value(),
            feedback: self.params.feedback.value(),
            crossfeed: self.params.crossfeed.value(),
        }
    }
}

/// Next per-sample tone settings. Smoothers are advanced even for a
/// disabled stage so it doesn't jump when switched back on.
fn next_tone(params: &PluginParams) -> ToneSettings {
    let low = FilterSettings {
        frequency: params.low_cut_freq.smoothed.next(),
        q: params.low_cut_q.smoothed.next(),
    };
    let high = FilterSettings {
        frequency: params.high_cut_freq.smoothed.next(),
        q: params.high_cut_q.smoothed.next(),
    };

    ToneSettings {
        low_cut: params.low_cut_enabled.value().then_some(low),
        high_cut: params.high_cut_enabled.value().then_some(high),
    }
}

impl Plugin for LovelessTempoDelay {
    const NAME: &'static str = "Loveless Tempo Delay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo only: the feedback network crosses exactly two channels.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Blocks get split at automation points, so once-per-block controls
    // still land on the right sample.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay lines for the new sample rate. They are sized
    /// for one beat at the slowest supported tempo and never resized.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;
        let Some(capacity) = tempo::max_delay_capacity(sample_rate) else {
            nih_error!("Cannot size delay buffers for a sample rate of {sample_rate} Hz");
            return false;
        };

        nih_log!(
            "Allocating {} samples per channel at {sample_rate} Hz",
            capacity.get()
        );
        self.engine = Some(DelayEngine::new(sample_rate, capacity));
        true
    }

    /// Activation: silence the buffers, clear the filters and return every
    /// gain, delay and tempo to its starting point.
    fn reset(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset();
        }
        self.tap_was_down = false;
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let controls = self.block_controls(context.transport().tempo);

        let Some(engine) = self.engine.as_mut() else {
            return ProcessStatus::Normal;
        };
        engine.begin_block(&controls);

        for mut channel_samples in buffer.iter_samples() {
            // Filter settings are live: re-read every sample.
            let tone = next_tone(&self.params);

            let input_l = channel_samples.get_mut(0).map_or(0.0, |s| *s);
            let input_r = channel_samples.get_mut(1).map_or(input_l, |s| *s);

            let (output_l, output_r) = engine.process_frame(input_l, input_r, &tone);

            if let Some(sample) = channel_samples.get_mut(0) {
                *sample = output_l;
            }
            if let Some(sample) = channel_samples.get_mut(1) {
                *sample = output_r;
            }
        }

        // Keep being called after the input stops so the repeats can ring
        // out; with a loop gain of one or more they never stop.
        match engine.tail_samples() {
            Some(tail) => ProcessStatus::Tail(tail),
            None => ProcessStatus::KeepAlive,
        }
    }
}

impl ClapPlugin for LovelessTempoDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-tempo-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Tempo-synced stereo delay with tap tempo, crossfeed and tone filters");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for LovelessTempoDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssTempoDly001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(LovelessTempoDelay);
nih_export_vst3!(LovelessTempoDelay);

// AUv2 entry point for Logic Pro.
clap_wrapper::export_auv2!();
