//! Pitch, gain and note-name helpers.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Pitch
//!
//! - [`midi_note_to_hz`] - Equal-tempered note frequency (A4 = 440 Hz)
//! - [`semitones_to_ratio`] - Frequency multiplier for a semitone offset
//! - [`pitch_wheel_to_bend`] - 14-bit pitch wheel position to `[-1, 1]`
//!
//! # Level
//!
//! - [`decibels_to_gain`] / [`gain_to_decibels`] - dB conversions
//! - [`headroom_gain`] - Inverse-square-root normalization for summed voices
//! - [`normalize_gain_value`] / [`perceptual_gain_curve`] - Control-surface mapping

use core::fmt;
use libm::{log10f, powf, sqrtf};

/// Highest frequency a note is allowed to resolve to, in Hz.
pub const MAX_NOTE_HZ: f32 = 20_000.0;

/// Pitch wheel rest position.
pub const PITCH_WHEEL_CENTER: u16 = 8192;

/// Gain at or below which [`gain_to_decibels`] reports its floor.
const MIN_GAIN: f32 = 1e-5;

/// Convert a MIDI note number to a frequency in Hz.
///
/// Uses `440 * 2^((n - 69) / 12)`, clamped to `[0, MAX_NOTE_HZ]`.
///
/// # Example
/// ```rust
/// use trivox_core::midi_note_to_hz;
///
/// assert!((midi_note_to_hz(69) - 440.0).abs() < 1e-3);
/// assert!((midi_note_to_hz(60) - 261.63).abs() < 0.01);
/// ```
#[inline]
pub fn midi_note_to_hz(note: u8) -> f32 {
    let hz = 440.0 * powf(2.0, (f32::from(note) - 69.0) / 12.0);
    hz.clamp(0.0, MAX_NOTE_HZ)
}

/// Frequency ratio for an offset in semitones (`2^(s/12)`).
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    powf(2.0, semitones / 12.0)
}

/// Convert a 14-bit pitch wheel position `[0, 16383]` to a bend in `[-1, 1]`.
///
/// Center (8192) maps to 0. The scale is symmetric around center, so the
/// top of the wheel lands just short of +1.
///
/// # Example
/// ```rust
/// use trivox_core::pitch_wheel_to_bend;
///
/// assert_eq!(pitch_wheel_to_bend(8192), 0.0);
/// assert_eq!(pitch_wheel_to_bend(0), -1.0);
/// assert!(pitch_wheel_to_bend(16383) > 0.999);
/// ```
#[inline]
pub fn pitch_wheel_to_bend(value: u16) -> f32 {
    let center = f32::from(PITCH_WHEEL_CENTER);
    ((f32::from(value) - center) / center).clamp(-1.0, 1.0)
}

/// Convert decibels to linear gain (`10^(dB/20)`).
///
/// # Example
/// ```rust
/// use trivox_core::decibels_to_gain;
///
/// assert!((decibels_to_gain(0.0) - 1.0).abs() < 1e-6);
/// assert!((decibels_to_gain(-20.0) - 0.1).abs() < 1e-6);
/// ```
#[inline]
pub fn decibels_to_gain(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Convert linear gain to decibels, reporting `min_db` for near-silent gains.
#[inline]
pub fn gain_to_decibels(gain: f32, min_db: f32) -> f32 {
    if gain <= MIN_GAIN {
        return min_db;
    }
    20.0 * log10f(gain)
}

/// Map an integer control value against its maximum into `[0, 1]`.
#[inline]
pub fn normalize_gain_value(value: i32, max: i32) -> f32 {
    if max == 0 {
        return 0.0;
    }
    (value as f32 / max as f32).clamp(0.0, 1.0)
}

/// Apply a power-law taper to a normalized gain. `exponent = 1` is linear.
#[inline]
pub fn perceptual_gain_curve(normalized: f32, exponent: f32) -> f32 {
    powf(normalized.clamp(0.0, 1.0), exponent)
}

/// Loudness normalization for `active_voices` summed voices.
///
/// Returns `ceiling / sqrt(active_voices)` clamped to `[0, 1]`, or `1.0`
/// when nothing is sounding.
///
/// # Example
/// ```rust
/// use trivox_core::headroom_gain;
///
/// assert_eq!(headroom_gain(0, 0.25), 1.0);
/// assert_eq!(headroom_gain(4, 0.25), 0.125);
/// ```
#[inline]
pub fn headroom_gain(active_voices: usize, ceiling: f32) -> f32 {
    if active_voices == 0 {
        return 1.0;
    }
    (ceiling / sqrtf(active_voices as f32)).clamp(0.0, 1.0)
}

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Display adapter for a MIDI note's name with enharmonic spelling.
///
/// Naturals print once (`"C4"`); accidentals print both spellings
/// (`"C# / Db4"`). Middle C (60) is octave 4.
///
/// # Example
/// ```rust
/// use trivox_core::NoteName;
///
/// assert_eq!(NoteName(60).to_string(), "C4");
/// assert_eq!(NoteName(61).to_string(), "C# / Db4");
/// assert_eq!(NoteName(0).to_string(), "C-1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteName(pub u8);

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pitch_class = usize::from(self.0 % 12);
        let octave = i32::from(self.0 / 12) - 1;
        let sharp = SHARP_NAMES[pitch_class];
        let flat = FLAT_NAMES[pitch_class];
        if sharp == flat {
            write!(f, "{sharp}{octave}")
        } else {
            write!(f, "{sharp} / {flat}{octave}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "std"))]
    extern crate alloc;
    #[cfg(not(feature = "std"))]
    use alloc::string::ToString;

    #[test]
    fn a4_is_440() {
        assert!((midi_note_to_hz(69) - 440.0).abs() < 1e-3);
        assert!((midi_note_to_hz(81) - 880.0).abs() < 1e-2);
        assert!((midi_note_to_hz(57) - 220.0).abs() < 1e-3);
    }

    #[test]
    fn note_frequency_stays_in_range() {
        for n in 0..=127u8 {
            let hz = midi_note_to_hz(n);
            assert!(hz > 0.0 && hz <= MAX_NOTE_HZ, "note {n} -> {hz}");
        }
    }

    #[test]
    fn semitone_ratio() {
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-6);
        assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-6);
        assert_eq!(semitones_to_ratio(0.0), 1.0);
    }

    #[test]
    fn pitch_wheel_mapping() {
        assert_eq!(pitch_wheel_to_bend(8192), 0.0);
        assert_eq!(pitch_wheel_to_bend(0), -1.0);
        let top = pitch_wheel_to_bend(16383);
        assert!((top - 1.0).abs() < 1e-3, "top = {top}");
        assert_eq!(pitch_wheel_to_bend(u16::MAX), 1.0);
        assert_eq!(pitch_wheel_to_bend(4096), -0.5);
    }

    #[test]
    fn db_conversions() {
        assert!((decibels_to_gain(-6.0206) - 0.5).abs() < 1e-4);
        assert!((gain_to_decibels(1.0, -100.0)).abs() < 1e-6);
        assert!((gain_to_decibels(0.1, -100.0) + 20.0).abs() < 1e-4);
        assert_eq!(gain_to_decibels(0.0, -100.0), -100.0);
        assert_eq!(gain_to_decibels(1e-6, -60.0), -60.0);
    }

    #[test]
    fn gain_value_normalization() {
        assert_eq!(normalize_gain_value(64, 128), 0.5);
        assert_eq!(normalize_gain_value(200, 127), 1.0);
        assert_eq!(normalize_gain_value(-3, 127), 0.0);
        assert_eq!(normalize_gain_value(5, 0), 0.0);
        assert_eq!(perceptual_gain_curve(0.5, 1.0), 0.5);
        assert_eq!(perceptual_gain_curve(0.5, 2.0), 0.25);
        assert_eq!(perceptual_gain_curve(1.5, 2.0), 1.0);
    }

    #[test]
    fn headroom_law() {
        assert_eq!(headroom_gain(0, 0.25), 1.0);
        assert_eq!(headroom_gain(1, 0.25), 0.25);
        assert_eq!(headroom_gain(4, 0.25), 0.125);
        // Sum of four full-scale voices lands at 0.5
        assert_eq!(4.0 * headroom_gain(4, 0.25), 0.5);
        // Never amplifies above unity
        assert_eq!(headroom_gain(1, 4.0), 1.0);
    }

    #[test]
    fn note_names() {
        assert_eq!(NoteName(60).to_string(), "C4");
        assert_eq!(NoteName(69).to_string(), "A4");
        assert_eq!(NoteName(70).to_string(), "A# / Bb4");
        assert_eq!(NoteName(127).to_string(), "G9");
        assert_eq!(NoteName(1).to_string(), "C# / Db-1");
    }
}
