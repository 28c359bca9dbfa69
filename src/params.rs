//! # Plugin Parameters
//!
//! The knobs and switches the host sees. IDs (`#[id = "..."]`) are what
//! hosts store in sessions and presets; never change a published one.
//!
//! ## Who smooths what?
//!
//! Mix, feedback and crossfeed are read once per block and glided by the
//! delay engine's own smoothers, so they carry no nih-plug smoother. The
//! filter cutoffs and Qs are read every sample and use nih-plug's
//! smoothing. Selectors (tempo mode, divisions) are plain integers with
//! formatters that show the musical name.

use std::sync::Arc;

use nih_plug::prelude::*;

use crate::tempo::{Division, TempoMode};

/// All user-facing parameters of the tempo delay.
#[derive(Params)]
pub struct PluginParams {
    /// **Tempo** used in "User" mode, and as the fallback in "Host" mode
    /// when the host doesn't report one.
    #[id = "tempo"]
    pub user_tempo: FloatParam,

    /// **Sync** selects the tempo source: 0 = host, 1 = user, 2 = tap.
    #[id = "tmode"]
    pub tempo_mode: IntParam,

    /// **Tap**: each press registers one tap.
    #[id = "tap"]
    pub tap: BoolParam,

    /// **Mix** in percent. 0 is dry only, 100 wet only, 50 both at unity.
    #[id = "mix"]
    pub mix: FloatParam,

    /// **Feedback**: how much of each channel's echo is fed back into
    /// its own delay line.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Crossfeed**: how much of each channel's echo is fed into the
    /// opposite delay line.
    #[id = "xfeed"]
    pub crossfeed: FloatParam,

    #[id = "lowon"]
    pub low_cut_enabled: BoolParam,
    #[id = "lowf"]
    pub low_cut_freq: FloatParam,
    #[id = "lowq"]
    pub low_cut_q: FloatParam,

    #[id = "highon"]
    pub high_cut_enabled: BoolParam,
    #[id = "highf"]
    pub high_cut_freq: FloatParam,
    #[id = "highq"]
    pub high_cut_q: FloatParam,

    /// **Division L/R**: note value of each side's delay.
    #[id = "divl"]
    pub division_left: IntParam,
    #[id = "divr"]
    pub division_right: IntParam,
}

fn division_param(name: &str, default: Division) -> IntParam {
    IntParam::new(
        name,
        default as i32,
        IntRange::Linear {
            min: 0,
            max: Division::COUNT - 1,
        },
    )
    .with_value_to_string(Arc::new(|value: i32| {
        Division::from_selector(value).label().to_string()
    }))
    .with_string_to_value(Arc::new(|text: &str| {
        (0..Division::COUNT).find(|&selector| Division::from_selector(selector).label() == text.trim())
    }))
}

fn percent_param(name: &str, default: f32) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min: 0.0, max: 100.0 })
        .with_unit("%")
        .with_step_size(0.1)
}

fn q_param(name: &str) -> FloatParam {
    FloatParam::new(
        name,
        0.707, // Butterworth: flat, no resonant bump
        FloatRange::Skewed {
            min: 0.1,
            max: 10.0,
            factor: FloatRange::skew_factor(-1.0),
        },
    )
    .with_smoother(SmoothingStyle::Logarithmic(20.0))
    .with_step_size(0.01)
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            user_tempo: FloatParam::new(
                "Tempo",
                120.0,
                FloatRange::Linear {
                    min: 20.0,
                    max: 300.0,
                },
            )
            .with_unit(" BPM")
            .with_step_size(0.1),

            tempo_mode: IntParam::new(
                "Sync",
                TempoMode::Host as i32,
                IntRange::Linear {
                    min: 0,
                    max: TempoMode::COUNT - 1,
                },
            )
            .with_value_to_string(Arc::new(|value: i32| {
                TempoMode::from_selector(value).label().to_string()
            }))
            .with_string_to_value(Arc::new(|text: &str| {
                (0..TempoMode::COUNT).find(|&selector| {
                    TempoMode::from_selector(selector)
                        .label()
                        .eq_ignore_ascii_case(text.trim())
                })
            })),

            tap: BoolParam::new("Tap", false),

            mix: percent_param("Mix", 50.0),
            feedback: percent_param("Feedback", 60.0),
            crossfeed: percent_param("Crossfeed", 0.0),

            low_cut_enabled: BoolParam::new("Low Cut", false),
            low_cut_freq: FloatParam::new(
                "Low Cut Freq",
                100.0,
                FloatRange::Skewed {
                    min: 20.0,
                    max: 2000.0,
                    // Frequency perception is roughly logarithmic.
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" Hz")
            .with_smoother(SmoothingStyle::Logarithmic(50.0))
            .with_step_size(1.0),
            low_cut_q: q_param("Low Cut Q"),

            high_cut_enabled: BoolParam::new("High Cut", false),
            high_cut_freq: FloatParam::new(
                "High Cut Freq",
                8000.0,
                FloatRange::Skewed {
                    min: 500.0,
                    max: 20000.0,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" Hz")
            .with_smoother(SmoothingStyle::Logarithmic(50.0))
            .with_step_size(1.0),
            high_cut_q: q_param("High Cut Q"),

            division_left: division_param("Division L", Division::Quarter),
            division_right: division_param("Division R", Division::DottedEighth),
        }
    }
}
