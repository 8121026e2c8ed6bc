//! MIDI events consumed by the engine.

use trivox_core::PITCH_WHEEL_CENTER;

/// A channel-voice message the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// Key pressed. Velocity 0 is treated as a note-off.
    NoteOn {
        /// Note number (0-127).
        note: u8,
        /// Velocity (0-127).
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// Note number (0-127).
        note: u8,
        /// Release velocity (0-127).
        velocity: u8,
    },
    /// Pitch wheel moved to a 14-bit position (0-16383, center 8192).
    PitchWheel(u16),
    /// Continuous controller changed.
    Controller {
        /// Controller number (0-127).
        number: u8,
        /// Controller value (0-127).
        value: u8,
    },
}

impl MidiEvent {
    /// Note-on with non-zero velocity.
    pub const fn is_note_on(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { velocity, .. } if *velocity > 0)
    }

    /// Note-off, or note-on with zero velocity.
    pub const fn is_note_off(&self) -> bool {
        matches!(
            self,
            MidiEvent::NoteOff { .. } | MidiEvent::NoteOn { velocity: 0, .. }
        )
    }

    /// Pitch wheel message.
    pub const fn is_pitch_wheel(&self) -> bool {
        matches!(self, MidiEvent::PitchWheel(_))
    }

    /// Note number for note messages.
    pub const fn note_number(&self) -> Option<u8> {
        match self {
            MidiEvent::NoteOn { note, .. } | MidiEvent::NoteOff { note, .. } => Some(*note),
            _ => None,
        }
    }

    /// Velocity for note messages.
    pub const fn velocity(&self) -> Option<u8> {
        match self {
            MidiEvent::NoteOn { velocity, .. } | MidiEvent::NoteOff { velocity, .. } => {
                Some(*velocity)
            }
            _ => None,
        }
    }

    /// Pitch wheel position for pitch wheel messages.
    pub const fn pitch_wheel_value(&self) -> Option<u16> {
        match self {
            MidiEvent::PitchWheel(value) => Some(*value),
            _ => None,
        }
    }

    /// Decode a raw channel-voice message. Running status and system
    /// messages are not supported; anything unrecognized yields `None`.
    ///
    /// ```rust
    /// use trivox_synth::MidiEvent;
    ///
    /// assert_eq!(
    ///     MidiEvent::from_bytes(&[0x90, 60, 100]),
    ///     Some(MidiEvent::NoteOn { note: 60, velocity: 100 })
    /// );
    /// assert_eq!(MidiEvent::from_bytes(&[0xE0, 0x00, 0x40]), Some(MidiEvent::PitchWheel(8192)));
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let d0 = *data.first()? & 0x7F;
        let d1 = data.get(1).map(|b| b & 0x7F);
        match status & 0xF0 {
            0x80 => Some(MidiEvent::NoteOff {
                note: d0,
                velocity: d1?,
            }),
            0x90 => Some(MidiEvent::NoteOn {
                note: d0,
                velocity: d1?,
            }),
            0xB0 => Some(MidiEvent::Controller {
                number: d0,
                value: d1?,
            }),
            0xE0 => Some(MidiEvent::PitchWheel(
                u16::from(d0) | (u16::from(d1?) << 7),
            )),
            _ => None,
        }
    }

    /// Centered pitch wheel.
    pub const fn pitch_wheel_center() -> Self {
        MidiEvent::PitchWheel(PITCH_WHEEL_CENTER)
    }
}

/// A MIDI event with its offset inside the block.
///
/// The engine dispatches all events at block start in list order; the
/// offset is carried for hosts and recorders but does not delay the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMidiEvent {
    /// Sample offset from the start of the block.
    pub sample_offset: u32,
    /// The event.
    pub event: MidiEvent,
}

impl TimedMidiEvent {
    /// Event at `sample_offset`.
    pub const fn new(sample_offset: u32, event: MidiEvent) -> Self {
        Self {
            sample_offset,
            event,
        }
    }

    /// Event at the start of the block.
    pub const fn at_start(event: MidiEvent) -> Self {
        Self::new(0, event)
    }
}

impl From<MidiEvent> for TimedMidiEvent {
    fn from(event: MidiEvent) -> Self {
        Self::at_start(event)
    }
}
