//! Declared engine parameters.
//!
//! Index order is stable; [`ParamId`]s and string ids are permanent and
//! used as patch keys.
//!
//! | Index | String id | Range | Default |
//! |-------|-----------|-------|---------|
//! | 0 | `oscillatorAType` | Sine/Square/Saw/Triangle | Sine |
//! | 1 | `oscillatorBType` | Sine/Square/Saw/Triangle | Sine |
//! | 2 | `oscillatorSubType` | Sine/Square | Sine |
//! | 3 | `oscillatorAGain` | 0-1 | 1.0 |
//! | 4 | `oscillatorBGain` | 0-1 | 1.0 |
//! | 5 | `oscillatorSubGain` | 0-1 | 1.0 |
//! | 6 | `amplitudeEnvelopeAttack` | 0-5 s | 0.0 |
//! | 7 | `amplitudeEnvelopeDecay` | 0.01-5 s | 0.1 |
//! | 8 | `amplitudeEnvelopeSustain` | 0-1 | 1.0 |
//! | 9 | `amplitudeEnvelopeRelease` | 0.01-5 s | 0.1 |
//! | 10 | `modulationEnvelopeAttack` | 0-5 s | 0.0 |
//! | 11 | `modulationEnvelopeDecay` | 0.01-5 s | 0.1 |
//! | 12 | `modulationEnvelopeSustain` | 0-1 | 1.0 |
//! | 13 | `modulationEnvelopeRelease` | 0.01-5 s | 0.1 |
//! | 14 | `masterGain` | 0-1 | 0.8 |

use trivox_core::{ParamDescriptor, ParamId, ParamUnit};

/// Oscillator A waveform.
pub const OSC_A_TYPE: usize = 0;
/// Oscillator B waveform.
pub const OSC_B_TYPE: usize = 1;
/// Sub oscillator waveform.
pub const SUB_TYPE: usize = 2;
/// Oscillator A level.
pub const OSC_A_GAIN: usize = 3;
/// Oscillator B level.
pub const OSC_B_GAIN: usize = 4;
/// Sub oscillator level.
pub const SUB_GAIN: usize = 5;
/// Amplitude envelope attack.
pub const AMP_ATTACK: usize = 6;
/// Amplitude envelope decay.
pub const AMP_DECAY: usize = 7;
/// Amplitude envelope sustain.
pub const AMP_SUSTAIN: usize = 8;
/// Amplitude envelope release.
pub const AMP_RELEASE: usize = 9;
/// Modulation envelope attack.
pub const MOD_ATTACK: usize = 10;
/// Modulation envelope decay.
pub const MOD_DECAY: usize = 11;
/// Modulation envelope sustain.
pub const MOD_SUSTAIN: usize = 12;
/// Modulation envelope release.
pub const MOD_RELEASE: usize = 13;
/// Master output gain.
pub const MASTER_GAIN: usize = 14;

/// Number of declared parameters.
pub const PARAM_COUNT: usize = 15;

/// Default master gain.
pub const DEFAULT_MASTER_GAIN: f32 = 0.8;

const WAVE_CHOICES: &[&str] = &["Sine", "Square", "Saw", "Triangle"];
const SUB_WAVE_CHOICES: &[&str] = &["Sine", "Square"];

const OSCILLATORS: &str = "Oscillators";
const AMP_ENVELOPE: &str = "Amp Envelope";
const MOD_ENVELOPE: &str = "Mod Envelope";
const MASTER: &str = "Master";

static DESCRIPTORS: [ParamDescriptor; PARAM_COUNT] = [
    ParamDescriptor::choice("Oscillator A Type", "Osc A", WAVE_CHOICES, 0)
        .with_id(ParamId(100), "oscillatorAType")
        .with_group(OSCILLATORS),
    ParamDescriptor::choice("Oscillator B Type", "Osc B", WAVE_CHOICES, 0)
        .with_id(ParamId(101), "oscillatorBType")
        .with_group(OSCILLATORS),
    ParamDescriptor::choice("Sub Oscillator Type", "Sub", SUB_WAVE_CHOICES, 0)
        .with_id(ParamId(102), "oscillatorSubType")
        .with_group(OSCILLATORS),
    ParamDescriptor::level("Oscillator A Gain", "Osc A Lv", 1.0)
        .with_id(ParamId(103), "oscillatorAGain")
        .with_group(OSCILLATORS),
    ParamDescriptor::level("Oscillator B Gain", "Osc B Lv", 1.0)
        .with_id(ParamId(104), "oscillatorBGain")
        .with_group(OSCILLATORS),
    ParamDescriptor::level("Sub Oscillator Gain", "Sub Lv", 1.0)
        .with_id(ParamId(105), "oscillatorSubGain")
        .with_group(OSCILLATORS),
    ParamDescriptor::time_s("Amp Attack", "A Att", 0.0, 5.0, 0.0)
        .with_id(ParamId(106), "amplitudeEnvelopeAttack")
        .with_group(AMP_ENVELOPE),
    ParamDescriptor::time_s("Amp Decay", "A Dec", 0.01, 5.0, 0.1)
        .with_id(ParamId(107), "amplitudeEnvelopeDecay")
        .with_group(AMP_ENVELOPE),
    ParamDescriptor::level("Amp Sustain", "A Sus", 1.0)
        .with_unit(ParamUnit::None)
        .with_id(ParamId(108), "amplitudeEnvelopeSustain")
        .with_group(AMP_ENVELOPE),
    ParamDescriptor::time_s("Amp Release", "A Rel", 0.01, 5.0, 0.1)
        .with_id(ParamId(109), "amplitudeEnvelopeRelease")
        .with_group(AMP_ENVELOPE),
    ParamDescriptor::time_s("Mod Attack", "M Att", 0.0, 5.0, 0.0)
        .with_id(ParamId(110), "modulationEnvelopeAttack")
        .with_group(MOD_ENVELOPE),
    ParamDescriptor::time_s("Mod Decay", "M Dec", 0.01, 5.0, 0.1)
        .with_id(ParamId(111), "modulationEnvelopeDecay")
        .with_group(MOD_ENVELOPE),
    ParamDescriptor::level("Mod Sustain", "M Sus", 1.0)
        .with_unit(ParamUnit::None)
        .with_id(ParamId(112), "modulationEnvelopeSustain")
        .with_group(MOD_ENVELOPE),
    ParamDescriptor::time_s("Mod Release", "M Rel", 0.01, 5.0, 0.1)
        .with_id(ParamId(113), "modulationEnvelopeRelease")
        .with_group(MOD_ENVELOPE),
    ParamDescriptor::level("Master Gain", "Master", DEFAULT_MASTER_GAIN)
        .with_id(ParamId(114), "masterGain")
        .with_group(MASTER),
];

/// Descriptor for the parameter at `index`.
pub fn descriptor(index: usize) -> Option<ParamDescriptor> {
    DESCRIPTORS.get(index).copied()
}

/// All descriptors in index order.
pub fn descriptors() -> &'static [ParamDescriptor] {
    &DESCRIPTORS
}

/// Index of the parameter with string id `string_id` (case-insensitive).
pub fn index_of(string_id: &str) -> Option<usize> {
    DESCRIPTORS
        .iter()
        .position(|d| d.string_id.eq_ignore_ascii_case(string_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_complete_and_ordered() {
        assert_eq!(descriptors().len(), PARAM_COUNT);
        for (i, desc) in descriptors().iter().enumerate() {
            assert_eq!(desc.id, ParamId(100 + i as u32), "id of {}", desc.string_id);
            assert!(!desc.string_id.is_empty());
            assert!(desc.short_name.len() <= 8, "{} too long", desc.short_name);
            assert!(desc.min <= desc.default && desc.default <= desc.max);
        }
    }

    #[test]
    fn string_ids_are_unique() {
        for (i, a) in descriptors().iter().enumerate() {
            for b in &descriptors()[i + 1..] {
                assert_ne!(a.string_id, b.string_id);
            }
        }
    }

    #[test]
    fn string_ids_in_declaration_order() {
        let expected = [
            "oscillatorAType",
            "oscillatorBType",
            "oscillatorSubType",
            "oscillatorAGain",
            "oscillatorBGain",
            "oscillatorSubGain",
            "amplitudeEnvelopeAttack",
            "amplitudeEnvelopeDecay",
            "amplitudeEnvelopeSustain",
            "amplitudeEnvelopeRelease",
            "modulationEnvelopeAttack",
            "modulationEnvelopeDecay",
            "modulationEnvelopeSustain",
            "modulationEnvelopeRelease",
            "masterGain",
        ];
        assert_eq!(descriptors().len(), expected.len());
        for (desc, id) in descriptors().iter().zip(expected) {
            assert_eq!(desc.string_id, id);
        }
        assert_eq!(index_of("oscillatorSubType"), Some(SUB_TYPE));
        assert_eq!(index_of("oscillatorSubGain"), Some(SUB_GAIN));
    }

    #[test]
    fn lookup_by_string_id() {
        assert_eq!(index_of("masterGain"), Some(MASTER_GAIN));
        assert_eq!(index_of("AMPLITUDEENVELOPERELEASE"), Some(AMP_RELEASE));
        assert_eq!(index_of("filterCutoff"), None);
    }

    #[test]
    fn declared_ranges() {
        let sub = descriptor(SUB_TYPE).expect("sub type");
        assert!(sub.is_stepped());
        assert_eq!(sub.max, 1.0);
        assert_eq!(sub.choice_label(1.0), Some("Square"));

        let osc = descriptor(OSC_A_TYPE).expect("osc a type");
        assert_eq!(osc.max, 3.0);
        assert_eq!(osc.choice_index("triangle"), Some(3));

        let decay = descriptor(MOD_DECAY).expect("mod decay");
        assert_eq!((decay.min, decay.max, decay.default), (0.01, 5.0, 0.1));

        let master = descriptor(MASTER_GAIN).expect("master");
        assert_eq!(master.default, 0.8);
        assert_eq!(master.step, 0.01);

        assert!(descriptor(PARAM_COUNT).is_none());
    }
}
