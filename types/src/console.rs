//! Console constants.
//!
//! Single source of truth shared by the engine and the console.

// ── Fader law ───────────────────────────────────────────────────────
/// Fader floor in dB (fader at 0%)
pub const MIN_DB: f32 = -60.0;
/// Fader ceiling in dB (fader at 100%)
pub const MAX_DB: f32 = 0.0;
/// Linear gain at the fader floor
pub const MIN_GAIN: f32 = 0.001;
/// Linear gain at the fader ceiling
pub const MAX_GAIN: f32 = 1.0;

// ── Wheel steps (percent) ───────────────────────────────────────────
pub const WHEEL_STEP: f32 = 1.0;
pub const WHEEL_FINE_STEP: f32 = 0.1;

// ── Metering ────────────────────────────────────────────────────────
/// Multiplier mapping typical sample magnitudes into the meter range
pub const METER_SENSITIVITY: f32 = 50.0;

// ── Track defaults ──────────────────────────────────────────────────
pub const DEFAULT_TRACK_GAIN: f32 = 1.0;
pub const DEFAULT_TRACK_PAN: f32 = 0.0;
/// Prefix for names given to empty tracks ("Track 1", "Track 2", ...)
pub const EMPTY_TRACK_PREFIX: &str = "Track";
