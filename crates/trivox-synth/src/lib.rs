//! Trivox Synth - Polyphonic synthesis engine
//!
//! A fixed pool of eight voices, each with three oscillators (A, B and a sub
//! oscillator one or two octaves down) shaped by a linear ADSR envelope.
//! The engine consumes MIDI events per block and mixes every sounding voice
//! into all output channels.
//!
//! # Core Components
//!
//! ## Oscillators
//!
//! - [`Oscillator`] - Naive phase-accumulator oscillator
//! - [`Waveform`] - Sine, Square, Saw, Triangle
//! - [`OctaveOffset`] - How far below the note the sub oscillator sits
//!
//! ```rust
//! use trivox_synth::{Oscillator, Waveform};
//!
//! let mut osc = Oscillator::new();
//! osc.set_waveform(Waveform::Saw);
//! osc.set_frequency(440.0, 48000.0);
//! let sample = osc.process();
//! assert!(sample >= -1.0 && sample <= 1.0);
//! ```
//!
//! ## Envelopes
//!
//! - [`EnvelopeGenerator`] - Linear ADSR
//! - [`EnvelopeParams`] / [`EnvelopeState`]
//!
//! ## Voices
//!
//! - [`Voice`] - One note: three oscillators, amplitude and modulation envelopes
//! - [`VoiceSlot`] - Pool entry that adapts MIDI values for its voice
//!
//! ## Engine
//!
//! - [`SynthEngine`] - Voice allocation, MIDI dispatch, mixing and headroom
//! - [`EngineHandle`] - Thread-safe parameter and play-mode control
//! - [`PlayMode`] - Mono, duo or poly
//! - [`params`] - The declared parameter table
//!
//! # Example
//!
//! ```rust
//! use trivox_synth::{MidiEvent, SynthEngine, TimedMidiEvent, Waveform};
//!
//! let mut engine = SynthEngine::new();
//! engine.prepare(44100.0, 512);
//! engine.set_oscillator_a_type(Waveform::Saw);
//!
//! let chord = [60, 64, 67].map(|note| {
//!     TimedMidiEvent::at_start(MidiEvent::NoteOn { note, velocity: 100 })
//! });
//!
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! engine.process(&mut [&mut left, &mut right], &chord);
//! assert_eq!(engine.active_voice_count(), 3);
//! ```
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! trivox-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod engine;
pub mod envelope;
pub mod midi;
pub mod oscillator;
pub mod params;
pub mod slot;
pub mod voice;

pub use engine::{
    DEFAULT_BLOCK_SIZE, EngineHandle, GAIN_CEILING, MAX_VOICES, PlayMode, SynthEngine,
};
pub use envelope::{EnvelopeGenerator, EnvelopeParams, EnvelopeState};
pub use midi::{MidiEvent, TimedMidiEvent};
pub use oscillator::{OctaveOffset, Oscillator, Waveform};
pub use params::PARAM_COUNT;
pub use slot::{Sound, SynthSound, VoiceSlot};
pub use voice::{
    AUDIBLE_FLOOR, DEFAULT_PITCH_BEND_RANGE, GAIN_RAMP_TIME_S, MAX_PITCH_BEND_RANGE, MOD_WHEEL_CC,
    OscillatorSlot, Voice,
};

pub use trivox_core::{NoteName, ParamDescriptor, ParameterInfo};
