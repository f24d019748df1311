//! Conversions between fader percent, dB, linear gain and meter position.
//!
//! Percent is what the user moves, dB is the perceptually linear step in
//! between, and linear gain is what the engine consumes. Every input is
//! clamped rather than rejected.

use mixdesk_types::console::{MAX_DB, MAX_GAIN, METER_SENSITIVITY, MIN_DB, MIN_GAIN};

fn clamp_percent(percent: f32) -> f32 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Map a fader percent (0..=100) linearly onto -60..=0 dB.
pub fn percent_to_db(percent: f32) -> f32 {
    let percent = clamp_percent(percent);
    MIN_DB + (MAX_DB - MIN_DB) * percent / 100.0
}

/// Convert dB to a linear amplitude multiplier.
pub fn db_to_linear_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Logarithmic interpolation between the near-silence floor and full scale.
///
/// Agrees with `db_to_linear_gain(percent_to_db(percent))`.
pub fn percent_to_gain(percent: f32) -> f32 {
    let percent = clamp_percent(percent);
    if percent >= 100.0 {
        return MAX_GAIN;
    }
    MIN_GAIN * (MAX_GAIN / MIN_GAIN).powf(percent / 100.0)
}

/// Inverse of [`percent_to_gain`], used to place a fader from the engine's gain.
pub fn gain_to_percent(gain: f32) -> f32 {
    if !gain.is_finite() || gain <= MIN_GAIN {
        return 0.0;
    }
    let percent = 100.0 * (gain / MIN_GAIN).ln() / (MAX_GAIN / MIN_GAIN).ln();
    clamp_percent(percent)
}

/// Absolute sample magnitude scaled by the meter sensitivity, clamped to 0..=1.
pub fn sample_to_meter_fraction(raw_sample: f32) -> f32 {
    if !raw_sample.is_finite() {
        return 0.0;
    }
    (raw_sample.abs() * METER_SENSITIVITY).clamp(0.0, 1.0)
}

/// Top-anchored meter position: 0.0 is the top (loudest), 1.0 the bottom.
pub fn meter_position(fraction: f32) -> f32 {
    1.0 - fraction.clamp(0.0, 1.0)
}

/// Format a dB value for the strip readout.
pub fn format_db(db: f32) -> String {
    if !db.is_finite() || db <= MIN_DB {
        "-inf dB".to_string()
    } else {
        format!("{:.1} dB", db)
    }
}
