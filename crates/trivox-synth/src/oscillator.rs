//! Phase-accumulating oscillators.
//!
//! Naive (non band-limited) waveforms computed directly from phase. Phase
//! increments of one or more cycles per sample are allowed and simply alias.

use core::f32::consts::TAU;
use core::fmt;
use libm::{fabsf, floorf, sinf};

/// Oscillator waveform types, in declared-parameter order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// Sine waveform - pure fundamental tone.
    #[default]
    Sine,
    /// Square/pulse waveform - duty cycle set by the pulse width.
    Square,
    /// Rising sawtooth.
    Saw,
    /// Symmetric triangle.
    Triangle,
}

impl Waveform {
    /// All waveforms in index order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Saw,
        Waveform::Triangle,
    ];

    /// Waveforms the sub oscillator offers.
    pub const SUB: [Waveform; 2] = [Waveform::Sine, Waveform::Square];

    /// Index of this waveform in [`ALL`](Self::ALL).
    pub const fn index(self) -> usize {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Saw => 2,
            Waveform::Triangle => 3,
        }
    }

    /// Waveform at `index`, clamped to the last one.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::Saw => "Saw",
            Waveform::Triangle => "Triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How far below the fundamental the sub oscillator sounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OctaveOffset {
    /// One octave down (frequency / 2).
    #[default]
    One,
    /// Two octaves down (frequency / 4).
    Two,
}

impl OctaveOffset {
    /// Number of octaves.
    pub const fn octaves(self) -> u32 {
        match self {
            OctaveOffset::One => 1,
            OctaveOffset::Two => 2,
        }
    }

    /// Offset for a number of octaves, clamped to `1..=2`.
    pub const fn from_octaves(octaves: u32) -> Self {
        if octaves >= 2 {
            OctaveOffset::Two
        } else {
            OctaveOffset::One
        }
    }

    /// Divide `frequency` down by this many octaves.
    #[inline]
    pub fn apply(self, frequency: f32) -> f32 {
        frequency / (1u32 << self.octaves()) as f32
    }
}

/// Phase-accumulating waveform generator.
///
/// # Example
///
/// ```rust
/// use trivox_synth::{Oscillator, Waveform};
///
/// let mut osc = Oscillator::new();
/// osc.set_waveform(Waveform::Saw);
/// osc.set_frequency(440.0, 48000.0);
///
/// assert_eq!(osc.process(), -1.0); // saw starts at the bottom
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_increment: f32,
    /// Frequency in Hz
    frequency: f32,
    /// Sample rate the increment was computed for
    sample_rate: f32,
    waveform: Waveform,
    /// Square duty cycle [0.01, 0.99]
    pulse_width: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscillator {
    /// Create a silent (0 Hz) sine oscillator with a 50% pulse width.
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            phase_increment: 0.0,
            frequency: 0.0,
            sample_rate: 0.0,
            waveform: Waveform::Sine,
            pulse_width: 0.5,
        }
    }

    /// Set waveform type.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Get current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set frequency and recompute the phase increment.
    ///
    /// A non-positive sample rate or non-finite frequency leaves the
    /// oscillator frozen at its current phase.
    pub fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) {
        self.frequency = if frequency_hz.is_finite() {
            frequency_hz.max(0.0)
        } else {
            0.0
        };
        self.sample_rate = sample_rate;
        self.phase_increment = if sample_rate > 0.0 {
            self.frequency / sample_rate
        } else {
            0.0
        };
    }

    /// Get current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Phase advance per sample.
    pub fn phase_increment(&self) -> f32 {
        self.phase_increment
    }

    /// Set the square duty cycle, clamped to `[0.01, 0.99]`.
    pub fn set_pulse_width(&mut self, pulse_width: f32) {
        self.pulse_width = pulse_width.clamp(0.01, 0.99);
    }

    /// Get the square duty cycle.
    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    /// Restart at `start`, wrapped into `[0, 1)`.
    pub fn reset_phase(&mut self, start: f32) {
        self.phase = wrap_phase(start);
    }

    /// Current phase.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Produce one sample in `[-1, 1]` and advance the phase.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let p = self.phase;
        let sample = match self.waveform {
            Waveform::Sine => sinf(TAU * p),
            Waveform::Square => {
                if p < self.pulse_width {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * p - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * fabsf(p - 0.5),
        };

        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
            // Increments of a cycle or more per sample
            if self.phase >= 1.0 {
                self.phase = wrap_phase(self.phase);
            }
        }
        sample
    }
}

#[inline]
fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase - floorf(phase);
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}
