//! Voice slots: a [`Voice`] bound to the note-allocation contract.
//!
//! The slot converts raw controller values (14-bit pitch wheel positions,
//! normalized velocity) for its voice and renders it into multichannel
//! buffers, duplicating the mono voice signal across every channel.

use core::any::Any;

use crate::voice::Voice;
use trivox_core::pitch_wheel_to_bend;

/// Something a slot may be asked to play.
///
/// Mirrors the sound/voice pairing of sampler-style allocators: a slot only
/// accepts sounds of the type it knows how to render.
pub trait Sound: Any {
    /// Whether this sound responds to `note`.
    fn applies_to_note(&self, note: u8) -> bool;

    /// Whether this sound responds to MIDI `channel` (1-16).
    fn applies_to_channel(&self, channel: u8) -> bool;
}

/// The one sound type voice slots render: every note on every channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthSound;

impl Sound for SynthSound {
    fn applies_to_note(&self, _note: u8) -> bool {
        true
    }

    fn applies_to_channel(&self, _channel: u8) -> bool {
        true
    }
}

/// A pool entry wrapping one [`Voice`].
#[derive(Debug, Clone)]
pub struct VoiceSlot {
    voice: Voice,
    /// Note the allocator last assigned; cleared when the voice goes quiet
    current_note: Option<u8>,
}

impl VoiceSlot {
    /// Create a slot with a free voice.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voice: Voice::new(sample_rate),
            current_note: None,
        }
    }

    /// Forward a new sample rate to the voice.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.voice.prepare(sample_rate);
    }

    /// Whether this slot can render `sound`.
    pub fn can_play_sound(&self, sound: &dyn Any) -> bool {
        sound.is::<SynthSound>()
    }

    /// Start `note` with `velocity` in `[0, 1]`, applying the current
    /// 14-bit pitch wheel position first.
    pub fn start_note(&mut self, note: u8, velocity: f32, pitch_wheel: u16) {
        self.voice.set_pitch_bend(pitch_wheel_to_bend(pitch_wheel));
        self.voice.start_note(note, velocity);
        self.current_note = self.voice.midi_note();
    }

    /// Stop the voice, clearing the slot when it stops immediately.
    pub fn stop_note(&mut self, velocity: f32, allow_tail_off: bool) {
        self.voice.stop_note(velocity, allow_tail_off);
        if !allow_tail_off || !self.voice.is_active() {
            self.clear_current_note();
        }
    }

    /// Apply a 14-bit pitch wheel position.
    pub fn pitch_wheel_moved(&mut self, value: u16) {
        self.voice.set_pitch_bend(pitch_wheel_to_bend(value));
    }

    /// Forward a controller change to the voice.
    pub fn controller_moved(&mut self, controller: u8, value: u8) {
        self.voice.controller_moved(controller, value);
    }

    /// Add `count` samples starting at `start` into every channel of `outputs`.
    ///
    /// A slot whose voice is no longer active clears itself and renders nothing.
    pub fn render_block(&mut self, outputs: &mut [&mut [f32]], start: usize, count: usize) {
        if !self.voice.is_active() {
            self.clear_current_note();
            return;
        }

        for i in start..start + count {
            let sample = self.voice.render_next_sample();
            for channel in outputs.iter_mut() {
                if let Some(out) = channel.get_mut(i) {
                    *out += sample;
                }
            }
        }
    }

    /// Whether the voice is sounding.
    #[inline]
    pub fn is_voice_active(&self) -> bool {
        self.voice.is_active()
    }

    /// Note the voice is playing, `None` when free.
    pub fn currently_playing_note(&self) -> Option<u8> {
        self.voice.midi_note()
    }

    /// Note this slot was assigned, until it is cleared.
    pub fn assigned_note(&self) -> Option<u8> {
        self.current_note
    }

    /// Forget the assigned note.
    pub fn clear_current_note(&mut self) {
        self.current_note = None;
    }

    /// The wrapped voice.
    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    /// The wrapped voice, for parameter updates.
    pub fn voice_mut(&mut self) -> &mut Voice {
        &mut self.voice
    }
}
