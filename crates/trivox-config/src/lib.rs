//! Patch files for the trivox synthesis engine.
//!
//! A patch is a small TOML document naming a play mode, a few engine-wide
//! settings and values for any of the declared parameters. Patches are
//! validated against the parameter table and applied through the engine's
//! clamping setters.
//!
//! # Example
//!
//! ```rust
//! use trivox_config::Patch;
//! use trivox_synth::{SynthEngine, Waveform};
//!
//! let patch = Patch::from_toml(r#"
//!     play_mode = "poly"
//!
//!     [params]
//!     oscillatorAType = "saw"
//!     amplitudeEnvelopeRelease = 0.4
//! "#).unwrap();
//! patch.validate().unwrap();
//!
//! let mut engine = SynthEngine::new();
//! patch.apply(&mut engine).unwrap();
//! assert_eq!(engine.oscillator_a_type(), Waveform::Saw);
//! ```

mod error;
mod patch;

pub use error::ConfigError;
pub use patch::{ParamValue, Patch, capture};
