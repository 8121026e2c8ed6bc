//! Patch file format and operations.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;
use trivox_core::{ParamDescriptor, ParameterInfo};
use trivox_synth::{MAX_PITCH_BEND_RANGE, OctaveOffset, PlayMode, SynthEngine, params};

/// A value in a patch's `[params]` table.
///
/// Choice parameters accept a name (`"saw"`) or an index; continuous
/// parameters take a number, or a string holding one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Plain number.
    Number(f64),
    /// Choice name or numeric text.
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Number(f64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Engine settings stored as TOML.
///
/// # TOML Format
///
/// ```toml
/// name = "Warm Pad"
/// play_mode = "poly"
/// pitch_bend_range = 7
/// sub_octave = 2
///
/// [params]
/// oscillatorAType = "saw"
/// oscillatorBType = 3
/// oscillatorSubGain = 0.4
/// amplitudeEnvelopeAttack = 0.25
/// amplitudeEnvelopeRelease = 1.2
/// masterGain = 0.7
/// ```
///
/// Keys in `[params]` are the declared parameters' string ids, matched
/// case-insensitively. Omitted settings keep the engine's current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patch {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// `"mono"`, `"duo"` or `"poly"`.
    #[serde(default)]
    pub play_mode: Option<String>,

    /// Pitch-bend range in semitones, `[0, 48]`.
    #[serde(default)]
    pub pitch_bend_range: Option<f32>,

    /// Sub oscillator depth in octaves, 1 or 2.
    #[serde(default)]
    pub sub_octave: Option<u32>,

    /// Declared parameter values by string id.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set a parameter value.
    pub fn with_param(mut self, id: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(id.into(), value.into());
        self
    }

    /// Set the play mode by name.
    pub fn with_play_mode(mut self, mode: impl Into<String>) -> Self {
        self.play_mode = Some(mode.into());
        self
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Every problem in the patch, in field then key order.
    pub fn problems(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        if let Err(e) = self.resolved_play_mode() {
            problems.push(e);
        }
        if let Some(range) = self.pitch_bend_range
            && !(0.0..=MAX_PITCH_BEND_RANGE).contains(&range)
        {
            problems.push(ConfigError::OutOfRange {
                name: "pitch_bend_range".to_string(),
                value: range,
                min: 0.0,
                max: MAX_PITCH_BEND_RANGE,
            });
        }
        if let Some(octaves) = self.sub_octave
            && !(1..=2).contains(&octaves)
        {
            problems.push(ConfigError::invalid_choice("sub_octave", octaves));
        }

        for (id, value) in &self.params {
            match resolve(id, value) {
                Ok((_, desc, plain)) => {
                    if let Err(e) = check_range(&desc, plain, value) {
                        problems.push(e);
                    }
                }
                Err(e) => problems.push(e),
            }
        }

        problems
    }

    /// Check every setting against its declared range and choices.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match ConfigError::from_problems(self.problems()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply the patch to `engine`.
    ///
    /// Unknown keys and unreadable values are errors and leave the engine
    /// untouched. Values outside their range are clamped. A play mode is
    /// requested and takes effect at the engine's next block.
    pub fn apply(&self, engine: &mut SynthEngine) -> Result<(), ConfigError> {
        let play_mode = self.resolved_play_mode()?;
        let values = self
            .params
            .iter()
            .map(|(id, value)| resolve(id, value).map(|(index, _, plain)| (index, plain)))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(range) = self.pitch_bend_range {
            engine.set_pitch_bend_range(range);
        }
        if let Some(octaves) = self.sub_octave {
            engine.set_sub_octave_offset(OctaveOffset::from_octaves(octaves));
        }
        for (index, plain) in values {
            engine.set_param(index, plain);
        }
        if let Some(mode) = play_mode {
            engine.request_play_mode_change(mode);
        }
        Ok(())
    }

    fn resolved_play_mode(&self) -> Result<Option<PlayMode>, ConfigError> {
        self.play_mode
            .as_deref()
            .map(|name| {
                PlayMode::from_name(name).ok_or_else(|| ConfigError::invalid_choice("play_mode", name))
            })
            .transpose()
    }
}

/// Look up a parameter and turn its patch value into a plain value.
fn resolve(id: &str, value: &ParamValue) -> Result<(usize, ParamDescriptor, f32), ConfigError> {
    let index = params::index_of(id).ok_or_else(|| ConfigError::UnknownParameter(id.to_string()))?;
    let desc = params::descriptor(index).ok_or_else(|| ConfigError::UnknownParameter(id.to_string()))?;

    let plain = match value {
        ParamValue::Number(n) => *n as f32,
        ParamValue::Text(text) => {
            let text = text.trim();
            if let Some(choice) = desc.choice_index(text) {
                choice as f32
            } else if let Ok(n) = text.parse::<f32>() {
                n
            } else if desc.is_stepped() {
                return Err(ConfigError::invalid_choice(desc.string_id, text));
            } else {
                return Err(ConfigError::Validation(format!(
                    "parameter '{}' expects a number, got '{text}'",
                    desc.string_id
                )));
            }
        }
    };
    Ok((index, desc, plain))
}

fn check_range(desc: &ParamDescriptor, plain: f32, raw: &ParamValue) -> Result<(), ConfigError> {
    if desc.is_stepped() && (plain.fract() != 0.0 || !(desc.min..=desc.max).contains(&plain)) {
        return Err(ConfigError::invalid_choice(desc.string_id, raw));
    }
    if !(desc.min..=desc.max).contains(&plain) {
        return Err(ConfigError::OutOfRange {
            name: desc.string_id.to_string(),
            value: plain,
            min: desc.min,
            max: desc.max,
        });
    }
    Ok(())
}

/// Snapshot an engine's declared parameters as a patch.
///
/// Choice parameters are written by name.
pub fn capture(engine: &SynthEngine) -> Patch {
    let mut patch = Patch::new().with_play_mode(engine.play_mode().name());
    patch.pitch_bend_range = Some(engine.pitch_bend_range());
    patch.sub_octave = Some(engine.sub_octave_offset().octaves());
    for index in 0..engine.param_count() {
        let Some(desc) = engine.param_info(index) else {
            continue;
        };
        let value = engine.get_param(index);
        let entry = match desc.choice_label(value) {
            Some(label) => ParamValue::Text(label.to_lowercase()),
            None => ParamValue::from(value),
        };
        patch.params.insert(desc.string_id.to_string(), entry);
    }
    patch
}
