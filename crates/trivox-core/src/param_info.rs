//! Parameter introspection for declared engine parameters.
//!
//! The [`ParameterInfo`] trait gives hosts, patch loaders and control
//! surfaces a uniform way to discover, read and write parameters by index
//! without knowing the concrete engine type.
//!
//! # Example
//!
//! ```rust
//! use trivox_core::{ParameterInfo, ParamDescriptor, ParamId};
//!
//! struct Organ {
//!     drawbar: f32,
//! }
//!
//! impl ParameterInfo for Organ {
//!     fn param_count(&self) -> usize { 1 }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         match index {
//!             0 => Some(ParamDescriptor::level("Drawbar", "Bar", 1.0)
//!                 .with_id(ParamId(1), "drawbar")),
//!             _ => None,
//!         }
//!     }
//!
//!     fn get_param(&self, index: usize) -> f32 {
//!         match index {
//!             0 => self.drawbar,
//!             _ => 0.0,
//!         }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f32) {
//!         if index == 0 {
//!             self.drawbar = value.clamp(0.0, 1.0);
//!         }
//!     }
//! }
//!
//! let mut organ = Organ { drawbar: 1.0 };
//! organ.set_param(0, 3.0);
//! assert_eq!(organ.get_param(0), 1.0);
//! assert_eq!(organ.find_param_by_name("bar"), Some(0));
//! ```

/// Stable parameter identifier that survives reordering.
///
/// Once assigned, a `ParamId` must never change for a given parameter;
/// patches and automation refer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Parameter capability flags. Use [`union`](Self::union) to combine.
///
/// ```rust
/// use trivox_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Value may change while audio is running.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Value is a discrete index into [`ParamDescriptor::choices`].
    pub const STEPPED: Self = Self(1 << 1);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Seconds - envelope stage durations.
    Seconds,
    /// Linear gain in `[0, 1]`.
    Gain,
    /// Dimensionless (sustain level, choice index).
    None,
}

impl ParamUnit {
    /// Unit suffix for display.
    ///
    /// ```rust
    /// use trivox_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Seconds.suffix(), " s");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Seconds => " s",
            ParamUnit::Gain | ParamUnit::None => "",
        }
    }
}

/// Describes one declared parameter: identity, range, default and display.
///
/// Stepped parameters carry their option labels in `choices`; their value
/// is the option index stored as `f32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full display name, e.g. "Amp Attack".
    pub name: &'static str,
    /// Abbreviated name for narrow displays (8 characters or fewer).
    pub short_name: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Minimum plain value.
    pub min: f32,
    /// Maximum plain value.
    pub max: f32,
    /// Default plain value.
    pub default: f32,
    /// Recommended increment for encoder-style control.
    pub step: f32,
    /// Stable numeric identity.
    pub id: ParamId,
    /// Stable string identity, used as the patch file key.
    pub string_id: &'static str,
    /// Capability flags.
    pub flags: ParamFlags,
    /// Group label for organizing controls ("Oscillators", "Amp Envelope", ...).
    pub group: &'static str,
    /// Option labels for stepped parameters; empty otherwise.
    pub choices: &'static [&'static str],
}

impl ParamDescriptor {
    /// Linear gain in `[0, 1]`, step 0.01.
    pub const fn level(name: &'static str, short_name: &'static str, default: f32) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Gain,
            min: 0.0,
            max: 1.0,
            default,
            step: 0.01,
            id: ParamId(0),
            string_id: "",
            flags: ParamFlags::AUTOMATABLE,
            group: "",
            choices: &[],
        }
    }

    /// Duration in seconds with custom range.
    pub const fn time_s(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Seconds,
            min,
            max,
            default,
            step: 0.01,
            id: ParamId(0),
            string_id: "",
            flags: ParamFlags::AUTOMATABLE,
            group: "",
            choices: &[],
        }
    }

    /// Discrete choice among `choices`, valued by index.
    pub const fn choice(
        name: &'static str,
        short_name: &'static str,
        choices: &'static [&'static str],
        default_index: usize,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min: 0.0,
            max: choices.len().saturating_sub(1) as f32,
            default: default_index as f32,
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
            group: "",
            choices,
        }
    }

    /// Sets the stable parameter ID and string ID.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the parameter group.
    pub const fn with_group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    /// Whether the parameter is a discrete choice.
    #[inline]
    pub const fn is_stepped(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Clamps a value to this parameter's valid range. Stepped values are
    /// also rounded to the nearest option index.
    ///
    /// ```rust
    /// use trivox_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::level("Gain", "Gain", 1.0);
    /// assert_eq!(desc.clamp(1.5), 1.0);
    /// assert_eq!(desc.clamp(-0.5), 0.0);
    ///
    /// let wave = ParamDescriptor::choice("Wave", "Wave", &["a", "b", "c"], 0);
    /// assert_eq!(wave.clamp(1.6), 2.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if value.is_nan() { self.default } else { value };
        let clamped = value.clamp(self.min, self.max);
        if self.is_stepped() {
            libm::roundf(clamped)
        } else {
            clamped
        }
    }

    /// Converts a plain value to `[0, 1]`.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        ((value - self.min) / range).clamp(0.0, 1.0)
    }

    /// Converts a normalized `[0, 1]` value back to the plain range.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min)
    }

    /// Label of the option selected by `value`, for stepped parameters.
    pub fn choice_label(&self, value: f32) -> Option<&'static str> {
        if !self.is_stepped() {
            return None;
        }
        self.choices.get(self.clamp(value) as usize).copied()
    }

    /// Index of the option whose label matches `label` (case-insensitive).
    pub fn choice_index(&self, label: &str) -> Option<usize> {
        self.choices
            .iter()
            .position(|c| c.eq_ignore_ascii_case(label))
    }
}

/// Trait for components that expose introspectable parameters.
///
/// Parameters are accessed by zero-based index, stable for the lifetime of
/// the instance. Setters clamp to the descriptor range and ignore
/// out-of-bounds indices.
pub trait ParameterInfo {
    /// Number of parameters. Valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Descriptor for the parameter at `index`, or `None` when out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current plain value of the parameter at `index` (`0.0` when out of range).
    fn get_param(&self, index: usize) -> f32;

    /// Set the parameter at `index`, clamped to its range.
    fn set_param(&mut self, index: usize, value: f32);

    /// Find a parameter index by name, short name or string id (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name)
                    || desc.short_name.eq_ignore_ascii_case(name)
                    || desc.string_id.eq_ignore_ascii_case(name)
            })
        })
    }

    /// Stable [`ParamId`] for the parameter at `index`.
    fn param_id(&self, index: usize) -> Option<ParamId> {
        self.param_info(index).map(|d| d.id)
    }

    /// Finds a parameter index by its stable [`ParamId`]. O(n), not for the audio path.
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}
