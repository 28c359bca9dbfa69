//! # Gain Curves
//!
//! Maps the 0-100 % knobs to linear gain targets. The curves are
//! exponential (linear in dB), so the useful part of each knob is spread
//! over its whole travel instead of bunched up near the top.
//!
//! ```text
//! mix:       0 ........ 50 ........ 100
//! dry gain:  1    1     1    ↘ -40 dB→ 0
//! wet gain:  0 -40 dB ↗ 1    1      1
//! ```
//!
//! At exactly 50 % neither path is attenuated: dry and wet are both unity.

/// Dry and wet gain targets for a mix setting in percent.
///
/// Returns `(dry, wet)`.
pub fn mix_gains(mix: f32) -> (f32, f32) {
    if mix <= 0.0 {
        (1.0, 0.0)
    } else if mix >= 100.0 {
        (0.0, 1.0)
    } else if mix < 50.0 {
        (1.0, 10f32.powf((mix - 50.0) * 0.04))
    } else {
        (10f32.powf((mix - 50.0) * -0.04), 1.0)
    }
}

/// Gain target for a feedback or crossfeed setting in percent.
///
/// 0 % is silent, 100 % is unity, anything between follows
/// `10^((amount - 100) * 0.02)`, i.e. -40 dB just above zero.
pub fn feedback_gain(amount: f32) -> f32 {
    if amount <= 0.0 {
        0.0
    } else if amount >= 100.0 {
        1.0
    } else {
        10f32.powf((amount - 100.0) * 0.02)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_endpoints() {
        assert_eq!(mix_gains(0.0), (1.0, 0.0));
        assert_eq!(mix_gains(100.0), (0.0, 1.0));
    }

    /// Known quirk: the centre is not attenuated on either path.
    #[test]
    fn test_mix_centre_is_unity_on_both_paths() {
        assert_eq!(mix_gains(50.0), (1.0, 1.0));
    }

    #[test]
    fn test_mix_curve_shape() {
        // -20 dB halfway between the centre and either end.
        let (dry, wet) = mix_gains(25.0);
        assert_eq!(dry, 1.0);
        assert!((wet - 0.1).abs() < 1e-5, "wet at 25%: {wet}");

        let (dry, wet) = mix_gains(75.0);
        assert_eq!(wet, 1.0);
        assert!((dry - 0.1).abs() < 1e-5, "dry at 75%: {dry}");

        // Wet rises and dry falls monotonically across the range.
        let mut last = mix_gains(0.0);
        for step in 1..=100 {
            let gains = mix_gains(step as f32);
            assert!(gains.0 <= last.0, "dry rose at {step}%");
            assert!(gains.1 >= last.1, "wet fell at {step}%");
            last = gains;
        }
    }

    #[test]
    fn test_feedback_curve() {
        assert_eq!(feedback_gain(0.0), 0.0);
        assert_eq!(feedback_gain(100.0), 1.0);
        assert!((feedback_gain(50.0) - 0.1).abs() < 1e-5);
        assert!((feedback_gain(1e-3) - 0.01).abs() < 1e-4);
        assert!(feedback_gain(99.0) < 1.0);
    }

    #[test]
    fn test_out_of_range_controls_clamp_to_endpoints() {
        assert_eq!(mix_gains(-10.0), (1.0, 0.0));
        assert_eq!(mix_gains(140.0), (0.0, 1.0));
        assert_eq!(feedback_gain(-1.0), 0.0);
        assert_eq!(feedback_gain(250.0), 1.0);
    }
}
