//! Trivox Core - primitives for the trivox synthesis engine
//!
//! This crate provides the building blocks shared by the engine, the patch
//! loader and the command-line renderer. Everything here is allocation-free
//! and safe to call from the audio thread.
//!
//! # Core Abstractions
//!
//! ## Gain Smoothing
//!
//! - [`GainRamp`] - Linear gain ramp that lands exactly on its target
//!
//! ## Parameters
//!
//! - [`ParamDescriptor`] - Range, default, unit and identity of a declared parameter
//! - [`ParameterInfo`] - Index-based parameter introspection and control
//!
//! ## Cross-thread Hand-off
//!
//! - [`PendingCell`] - Latest-value-wins request cell, consumed once by the audio thread
//! - [`AtomicParam`] - f32 value with a dirty flag for control-to-audio updates
//!
//! ## Utilities
//!
//! - MIDI math: [`midi_note_to_hz`], [`pitch_wheel_to_bend`], [`semitones_to_ratio`]
//! - Gain math: [`decibels_to_gain`], [`gain_to_decibels`], [`headroom_gain`]
//! - Note names: [`NoteName`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! trivox-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod handoff;
pub mod math;
pub mod param_info;
pub mod ramp;

pub use handoff::{AtomicParam, PendingCell};
pub use math::{
    MAX_NOTE_HZ, NoteName, PITCH_WHEEL_CENTER, decibels_to_gain, gain_to_decibels, headroom_gain,
    midi_note_to_hz, normalize_gain_value, perceptual_gain_curve, pitch_wheel_to_bend,
    semitones_to_ratio,
};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamUnit, ParameterInfo};
pub use ramp::GainRamp;
