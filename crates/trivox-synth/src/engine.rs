//! The polyphonic synthesis engine.
//!
//! [`SynthEngine`] owns a fixed pool of [`VoiceSlot`]s and renders them block
//! by block. Each call to [`process`](SynthEngine::process):
//!
//! 1. clears the output,
//! 2. applies a pending play-mode change,
//! 3. applies parameter writes posted through an [`EngineHandle`],
//! 4. dispatches the block's MIDI events in order (all at block start),
//! 5. renders every active slot into a mono scratch buffer,
//! 6. applies the ramped master gain and the voice-count headroom factor,
//! 7. adds the scratch buffer into every output channel.
//!
//! Nothing on this path allocates or blocks. Blocks longer than the size
//! passed to [`prepare`](SynthEngine::prepare) are rendered in chunks.
//!
//! # Example
//!
//! ```rust
//! use trivox_synth::{MidiEvent, SynthEngine, TimedMidiEvent};
//!
//! let mut engine = SynthEngine::new();
//! engine.prepare(48000.0, 256);
//!
//! let mut left = vec![0.0f32; 256];
//! let mut right = vec![0.0f32; 256];
//! let events = [TimedMidiEvent::at_start(MidiEvent::NoteOn { note: 60, velocity: 100 })];
//! engine.process(&mut [&mut left, &mut right], &events);
//!
//! assert_eq!(engine.active_voice_count(), 1);
//! assert_eq!(left, right);
//! ```

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::array;
use core::fmt;

use crate::envelope::EnvelopeParams;
use crate::midi::{MidiEvent, TimedMidiEvent};
use crate::oscillator::{OctaveOffset, Waveform};
use crate::params::{self, PARAM_COUNT};
use crate::slot::{SynthSound, VoiceSlot};
use crate::voice::{
    DEFAULT_PITCH_BEND_RANGE, GAIN_RAMP_TIME_S, MAX_PITCH_BEND_RANGE, OscillatorSlot, Voice,
};
use trivox_core::{
    AtomicParam, GainRamp, PITCH_WHEEL_CENTER, ParamDescriptor, ParameterInfo, PendingCell,
    headroom_gain,
};

/// Size of the voice pool.
pub const MAX_VOICES: usize = 8;

/// Headroom ceiling: one voice plays at this gain, `n` voices at `ceiling / sqrt(n)`.
pub const GAIN_CEILING: f32 = 0.25;

/// Scratch size used until [`SynthEngine::prepare`] is called.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
const NOTE_COUNT: usize = 128;

/// How many pool slots may sound at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlayMode {
    /// One voice.
    Monophonic,
    /// Two voices, allocated like any other N-voice mode.
    Duophonic,
    /// The whole pool.
    #[default]
    Polyphonic,
}

impl PlayMode {
    /// All modes in code order.
    pub const ALL: [PlayMode; 3] = [PlayMode::Monophonic, PlayMode::Duophonic, PlayMode::Polyphonic];

    /// Number of eligible slots.
    pub const fn voice_count(self) -> usize {
        match self {
            PlayMode::Monophonic => 1,
            PlayMode::Duophonic => 2,
            PlayMode::Polyphonic => MAX_VOICES,
        }
    }

    /// Code stored in the hand-off cell.
    pub const fn code(self) -> u8 {
        match self {
            PlayMode::Monophonic => 0,
            PlayMode::Duophonic => 1,
            PlayMode::Polyphonic => 2,
        }
    }

    /// Mode for a hand-off code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PlayMode::Monophonic),
            1 => Some(PlayMode::Duophonic),
            2 => Some(PlayMode::Polyphonic),
            _ => None,
        }
    }

    /// Short lowercase name (`mono`, `duo`, `poly`).
    pub const fn name(self) -> &'static str {
        match self {
            PlayMode::Monophonic => "mono",
            PlayMode::Duophonic => "duo",
            PlayMode::Polyphonic => "poly",
        }
    }

    /// Parse a short or long name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| {
            let long = match mode {
                PlayMode::Monophonic => "monophonic",
                PlayMode::Duophonic => "duophonic",
                PlayMode::Polyphonic => "polyphonic",
            };
            name.eq_ignore_ascii_case(mode.name()) || name.eq_ignore_ascii_case(long)
        })
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State shared between the engine and its handles.
#[derive(Debug)]
struct SharedControls {
    params: [AtomicParam; PARAM_COUNT],
    play_mode: PendingCell,
}

impl SharedControls {
    fn new() -> Self {
        Self {
            params: array::from_fn(|i| {
                AtomicParam::new(params::descriptor(i).map_or(0.0, |d| d.default))
            }),
            play_mode: PendingCell::new(),
        }
    }
}

/// Cloneable, thread-safe control surface for a [`SynthEngine`].
///
/// Writes are picked up by the audio thread at the start of its next block.
///
/// ```rust
/// use trivox_synth::{PlayMode, SynthEngine, params};
///
/// let mut engine = SynthEngine::new();
/// let handle = engine.handle();
///
/// std::thread::spawn(move || {
///     handle.set_param(params::MASTER_GAIN, 0.5);
///     handle.request_play_mode_change(PlayMode::Monophonic);
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(engine.play_mode(), PlayMode::Polyphonic);
/// engine.process(&mut [&mut [0.0f32; 64][..]], &[]);
/// assert_eq!(engine.play_mode(), PlayMode::Monophonic);
/// assert_eq!(engine.master_gain(), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct EngineHandle {
    shared: Arc<SharedControls>,
}

impl EngineHandle {
    /// Ask the engine to switch play mode at its next block boundary.
    pub fn request_play_mode_change(&self, mode: PlayMode) {
        self.shared.play_mode.request(mode.code());
    }

    /// Post a parameter value, clamped to its declared range. Unknown indices
    /// are ignored.
    pub fn set_param(&self, index: usize, value: f32) {
        if let (Some(desc), Some(cell)) = (params::descriptor(index), self.shared.params.get(index))
        {
            cell.store(desc.clamp(value));
        }
    }

    /// Latest value posted or applied for a parameter.
    pub fn param(&self, index: usize) -> Option<f32> {
        self.shared.params.get(index).map(AtomicParam::load)
    }

    /// Play mode waiting to be applied.
    pub fn pending_play_mode(&self) -> Option<PlayMode> {
        self.shared.play_mode.peek().and_then(PlayMode::from_code)
    }
}

/// Declared-parameter values as last applied to the pool.
#[derive(Debug, Clone, Copy)]
struct ParamSnapshot {
    oscillator_types: [Waveform; 3],
    oscillator_levels: [f32; 3],
    amplitude_envelope: EnvelopeParams,
    modulation_envelope: EnvelopeParams,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            oscillator_types: [Waveform::Sine; 3],
            oscillator_levels: [1.0; 3],
            amplitude_envelope: EnvelopeParams::default(),
            modulation_envelope: EnvelopeParams::default(),
        }
    }
}

/// Fixed-pool polyphonic synthesizer.
#[derive(Debug)]
pub struct SynthEngine {
    sample_rate: f32,
    block_size: usize,

    slots: [VoiceSlot; MAX_VOICES],
    num_voices: usize,
    /// Sounding note -> slot index
    active_notes: [Option<u8>; NOTE_COUNT],
    play_mode: PlayMode,

    pitch_bend_range: f32,
    pitch_wheel_value: u16,
    sub_offset: OctaveOffset,
    master_gain: GainRamp,
    gain_ceiling: f32,
    gain_ramp_time: f32,
    snapshot: ParamSnapshot,

    /// Mono mix bus, sized at prepare time
    scratch: Vec<f32>,
    shared: Arc<SharedControls>,
    sound: SynthSound,
}

impl Default for SynthEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthEngine {
    /// Create a polyphonic engine with every parameter at its default.
    pub fn new() -> Self {
        let mut engine = Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            slots: array::from_fn(|_| VoiceSlot::new(DEFAULT_SAMPLE_RATE)),
            num_voices: PlayMode::Polyphonic.voice_count(),
            active_notes: [None; NOTE_COUNT],
            play_mode: PlayMode::Polyphonic,
            pitch_bend_range: DEFAULT_PITCH_BEND_RANGE,
            pitch_wheel_value: PITCH_WHEEL_CENTER,
            sub_offset: OctaveOffset::One,
            master_gain: GainRamp::new(params::DEFAULT_MASTER_GAIN),
            gain_ceiling: GAIN_CEILING,
            gain_ramp_time: GAIN_RAMP_TIME_S,
            snapshot: ParamSnapshot::default(),
            scratch: vec![0.0; DEFAULT_BLOCK_SIZE],
            shared: Arc::new(SharedControls::new()),
            sound: SynthSound,
        };
        engine.set_pitch_bend_range(DEFAULT_PITCH_BEND_RANGE);
        engine
    }

    /// Prepare for playback. Allocates the scratch buffer; call before
    /// audio starts, not from the render path.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = block_size.max(1);
        self.scratch.clear();
        self.scratch.resize(self.block_size, 0.0);

        let range = self.pitch_bend_range;
        for slot in &mut self.slots {
            slot.prepare(sample_rate);
            slot.voice_mut().set_pitch_bend_range(range);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, block_size = self.block_size, "engine prepared");
    }

    /// A thread-safe handle for posting parameter and play-mode changes.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Render one block.
    ///
    /// `output` holds one slice per channel; the block length is the shortest
    /// channel. `events` are dispatched in order before rendering.
    pub fn process(&mut self, output: &mut [&mut [f32]], events: &[TimedMidiEvent]) {
        for channel in output.iter_mut() {
            channel.fill(0.0);
        }

        self.handle_deferred_play_mode_change();
        self.apply_pending_params();
        self.handle_midi(events);

        let num_samples = output.iter().map(|c| c.len()).min().unwrap_or(0);
        let chunk = self.scratch.len().max(1);
        let mut start = 0;
        while start < num_samples {
            let count = chunk.min(num_samples - start);
            self.render_voices(output, start, count);
            start += count;
        }
    }

    /// Stop every voice immediately and forget all note and pending state.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.stop_note(0.0, false);
        }
        self.pitch_wheel_value = PITCH_WHEEL_CENTER;
        self.shared.play_mode.clear();
        self.active_notes = [None; NOTE_COUNT];

        #[cfg(feature = "tracing")]
        tracing::debug!("engine reset");
    }

    /// Ask for a play-mode change. Applied at the start of the next
    /// [`process`](Self::process) call, never mid-block.
    pub fn request_play_mode_change(&self, mode: PlayMode) {
        self.shared.play_mode.request(mode.code());
    }

    fn handle_deferred_play_mode_change(&mut self) {
        if let Some(mode) = self.shared.play_mode.take().and_then(PlayMode::from_code) {
            self.set_play_mode(mode);
        }
    }

    fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
        self.num_voices = mode.voice_count();
        for slot in &mut self.slots[self.num_voices..] {
            slot.stop_note(0.0, false);
        }
        self.active_notes = [None; NOTE_COUNT];

        #[cfg(feature = "tracing")]
        tracing::debug!(mode = mode.name(), voices = self.num_voices, "play mode applied");
    }

    fn apply_pending_params(&mut self) {
        for index in 0..PARAM_COUNT {
            if let Some(value) = self.shared.params[index].take() {
                self.apply_param(index, value);
            }
        }
    }

    fn handle_midi(&mut self, events: &[TimedMidiEvent]) {
        for timed in events {
            match timed.event {
                MidiEvent::NoteOn { note, velocity } if velocity > 0 => {
                    self.note_on(note, velocity);
                }
                MidiEvent::NoteOn { note, .. } | MidiEvent::NoteOff { note, .. } => {
                    self.note_off(note);
                }
                MidiEvent::PitchWheel(value) => {
                    self.pitch_wheel_value = value.min(16383);
                    for slot in &mut self.slots[..self.num_voices] {
                        slot.pitch_wheel_moved(self.pitch_wheel_value);
                    }
                }
                MidiEvent::Controller { number, value } => {
                    for slot in &mut self.slots[..self.num_voices] {
                        slot.controller_moved(number, value);
                    }
                }
            }
        }
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let key = usize::from(note.min(127));
        if self.active_notes[key].is_some() {
            return;
        }

        let sound = &self.sound;
        let free = self.slots[..self.num_voices]
            .iter()
            .position(|slot| !slot.is_voice_active() && slot.can_play_sound(sound));

        match free {
            Some(index) => {
                let velocity = f32::from(velocity.min(127)) / 127.0;
                self.slots[index].start_note(note, velocity, self.pitch_wheel_value);
                self.active_notes[key] = Some(index as u8);
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(note, "no free voice, note dropped");
            }
        }
    }

    fn note_off(&mut self, note: u8) {
        let key = usize::from(note.min(127));
        let tracked = self.active_notes[key]
            .map(usize::from)
            .filter(|&i| i < self.num_voices && self.slot_is_playing(i, note));
        let index = tracked.or_else(|| {
            (0..self.num_voices).find(|&i| {
                self.slot_is_playing(i, note) && !self.slots[i].voice().is_releasing()
            })
        });

        if let Some(index) = index {
            self.slots[index].stop_note(0.0, true);
            self.active_notes[key] = None;
        }
    }

    fn slot_is_playing(&self, index: usize, note: u8) -> bool {
        let slot = &self.slots[index];
        slot.is_voice_active() && slot.currently_playing_note() == Some(note)
    }

    fn render_voices(&mut self, output: &mut [&mut [f32]], start: usize, count: usize) {
        let scratch = &mut self.scratch[..count];
        scratch.fill(0.0);

        let mut active_voices = 0;
        let mut freed_any = false;
        for slot in &mut self.slots[..self.num_voices] {
            let was_active = slot.is_voice_active();
            let mut bus: [&mut [f32]; 1] = [&mut *scratch];
            slot.render_block(&mut bus, 0, count);
            if was_active {
                active_voices += 1;
                freed_any |= !slot.is_voice_active();
            }
        }

        for sample in scratch.iter_mut() {
            *sample *= self.master_gain.next_sample();
        }

        let normalization = headroom_gain(active_voices, self.gain_ceiling);
        for sample in scratch.iter_mut() {
            *sample *= normalization;
        }

        for channel in output.iter_mut() {
            for (out, &mixed) in channel[start..start + count].iter_mut().zip(scratch.iter()) {
                *out += mixed;
            }
        }

        if freed_any {
            self.prune_active_notes();
        }
    }

    /// Drop map entries whose voice finished on its own while the key was held.
    fn prune_active_notes(&mut self) {
        for note in 0..NOTE_COUNT {
            if let Some(index) = self.active_notes[note] {
                let index = usize::from(index);
                if index >= self.num_voices || !self.slot_is_playing(index, note as u8) {
                    self.active_notes[note] = None;
                }
            }
        }
    }

    // --- Parameter setters ---

    /// Set an oscillator's waveform on every voice.
    pub fn set_oscillator_type(&mut self, slot: OscillatorSlot, waveform: Waveform) {
        let waveform = match (slot, waveform) {
            (OscillatorSlot::Sub, Waveform::Saw | Waveform::Triangle) => Waveform::Square,
            (_, waveform) => waveform,
        };
        self.snapshot.oscillator_types[slot_index(slot)] = waveform;
        for s in &mut self.slots {
            s.voice_mut().set_oscillator_type(slot, waveform);
        }
    }

    /// Set oscillator A's waveform.
    pub fn set_oscillator_a_type(&mut self, waveform: Waveform) {
        self.set_oscillator_type(OscillatorSlot::A, waveform);
    }

    /// Set oscillator B's waveform.
    pub fn set_oscillator_b_type(&mut self, waveform: Waveform) {
        self.set_oscillator_type(OscillatorSlot::B, waveform);
    }

    /// Set the sub oscillator's waveform. Only Sine and Square are offered;
    /// Saw and Triangle fall back to Square.
    pub fn set_oscillator_sub_type(&mut self, waveform: Waveform) {
        self.set_oscillator_type(OscillatorSlot::Sub, waveform);
    }

    /// Set an oscillator's level on every voice, ramped.
    pub fn set_oscillator_gain(&mut self, slot: OscillatorSlot, level: f32) {
        let level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
        self.snapshot.oscillator_levels[slot_index(slot)] = level;
        let ramp = self.gain_ramp_time;
        for s in &mut self.slots {
            s.voice_mut().set_oscillator_gain(slot, level, ramp);
        }
    }

    /// Set oscillator A's level.
    pub fn set_oscillator_a_gain(&mut self, level: f32) {
        self.set_oscillator_gain(OscillatorSlot::A, level);
    }

    /// Set oscillator B's level.
    pub fn set_oscillator_b_gain(&mut self, level: f32) {
        self.set_oscillator_gain(OscillatorSlot::B, level);
    }

    /// Set the sub oscillator's level.
    pub fn set_oscillator_sub_gain(&mut self, level: f32) {
        self.set_oscillator_gain(OscillatorSlot::Sub, level);
    }

    /// Set all three oscillator levels.
    pub fn set_oscillator_gains(&mut self, a: f32, b: f32, sub: f32) {
        self.set_oscillator_a_gain(a);
        self.set_oscillator_b_gain(b);
        self.set_oscillator_sub_gain(sub);
    }

    /// Set both envelope shapes on every voice, clamped to declared ranges.
    pub fn set_envelope_params(&mut self, amplitude: EnvelopeParams, modulation: EnvelopeParams) {
        self.set_amplitude_envelope_params(amplitude);
        self.set_modulation_envelope_params(modulation);
    }

    /// Set the amplitude envelope shape on every voice.
    pub fn set_amplitude_envelope_params(&mut self, params: EnvelopeParams) {
        let params = params.clamped();
        self.snapshot.amplitude_envelope = params;
        for slot in &mut self.slots {
            slot.voice_mut().set_amplitude_envelope_params(params);
        }
    }

    /// Set the modulation envelope shape on every voice.
    pub fn set_modulation_envelope_params(&mut self, params: EnvelopeParams) {
        let params = params.clamped();
        self.snapshot.modulation_envelope = params;
        for slot in &mut self.slots {
            slot.voice_mut().set_modulation_envelope_params(params);
        }
    }

    /// Set the master gain (clamped to `[0, 1]`), ramped.
    pub fn set_master_gain(&mut self, gain: f32) {
        let gain = if gain.is_nan() { 0.0 } else { gain };
        self.master_gain
            .set_target(gain, self.gain_ramp_time, self.sample_rate);
    }

    /// Set the pitch-bend range in semitones (clamped to `[0, 48]`) on every voice.
    pub fn set_pitch_bend_range(&mut self, semitones: f32) {
        self.pitch_bend_range = if semitones.is_nan() {
            DEFAULT_PITCH_BEND_RANGE
        } else {
            semitones.clamp(0.0, MAX_PITCH_BEND_RANGE)
        };
        let range = self.pitch_bend_range;
        for slot in &mut self.slots {
            slot.voice_mut().set_pitch_bend_range(range);
        }
    }

    /// Set how far below the note the sub oscillator sounds, on every voice.
    pub fn set_sub_octave_offset(&mut self, offset: OctaveOffset) {
        self.sub_offset = offset;
        for slot in &mut self.slots {
            slot.voice_mut().set_sub_offset(offset);
        }
    }

    // --- Queries ---

    /// Current oscillator waveform.
    pub fn oscillator_type(&self, slot: OscillatorSlot) -> Waveform {
        self.slots[0].voice().oscillator_type(slot)
    }

    /// Oscillator A's waveform.
    pub fn oscillator_a_type(&self) -> Waveform {
        self.oscillator_type(OscillatorSlot::A)
    }

    /// Oscillator B's waveform.
    pub fn oscillator_b_type(&self) -> Waveform {
        self.oscillator_type(OscillatorSlot::B)
    }

    /// Sub oscillator's waveform.
    pub fn oscillator_sub_type(&self) -> Waveform {
        self.oscillator_type(OscillatorSlot::Sub)
    }

    /// Oscillator level before velocity scaling.
    pub fn oscillator_gain(&self, slot: OscillatorSlot) -> f32 {
        self.snapshot.oscillator_levels[slot_index(slot)]
    }

    /// Amplitude envelope shape.
    pub fn amplitude_envelope_params(&self) -> EnvelopeParams {
        self.slots[0].voice().amplitude_envelope_params()
    }

    /// Modulation envelope shape.
    pub fn modulation_envelope_params(&self) -> EnvelopeParams {
        self.slots[0].voice().modulation_envelope_params()
    }

    /// Master gain target.
    pub fn master_gain(&self) -> f32 {
        self.master_gain.target()
    }

    /// Pitch-bend range in semitones.
    pub fn pitch_bend_range(&self) -> f32 {
        self.pitch_bend_range
    }

    /// Last pitch wheel position received.
    pub fn pitch_wheel_value(&self) -> u16 {
        self.pitch_wheel_value
    }

    /// Sub oscillator octave offset.
    pub fn sub_octave_offset(&self) -> OctaveOffset {
        self.sub_offset
    }

    /// Play mode currently in effect.
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Play mode waiting for the next block boundary.
    pub fn pending_play_mode(&self) -> Option<PlayMode> {
        self.shared.play_mode.peek().and_then(PlayMode::from_code)
    }

    /// Number of slots eligible to sound.
    pub fn num_voices(&self) -> usize {
        self.num_voices
    }

    /// Number of sounding voices, including release tails.
    pub fn active_voice_count(&self) -> usize {
        self.slots[..self.num_voices]
            .iter()
            .filter(|s| s.is_voice_active())
            .count()
    }

    /// Tracked `(note, slot index)` pairs in note order.
    pub fn active_notes(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.active_notes
            .iter()
            .enumerate()
            .filter_map(|(note, slot)| slot.map(|s| (note as u8, usize::from(s))))
    }

    /// Slot tracked for `note`, if it is sounding.
    pub fn slot_for_note(&self, note: u8) -> Option<usize> {
        self.active_notes
            .get(usize::from(note))
            .copied()
            .flatten()
            .map(usize::from)
    }

    /// Pool slot at `index`.
    pub fn slot(&self, index: usize) -> Option<&VoiceSlot> {
        self.slots.get(index)
    }

    /// Voice in pool slot `index`.
    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.slots.get(index).map(VoiceSlot::voice)
    }

    /// Sample rate from the last prepare.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Block size from the last prepare.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Headroom ceiling.
    pub fn gain_ceiling(&self) -> f32 {
        self.gain_ceiling
    }

    fn apply_param(&mut self, index: usize, value: f32) {
        let Some(desc) = params::descriptor(index) else {
            return;
        };
        let value = desc.clamp(value);
        let amp = self.snapshot.amplitude_envelope;
        let modulation = self.snapshot.modulation_envelope;
        match index {
            params::OSC_A_TYPE => self.set_oscillator_a_type(Waveform::from_index(value as usize)),
            params::OSC_B_TYPE => self.set_oscillator_b_type(Waveform::from_index(value as usize)),
            params::SUB_TYPE => {
                self.set_oscillator_sub_type(Waveform::SUB[(value as usize).min(1)]);
            }
            params::OSC_A_GAIN => self.set_oscillator_a_gain(value),
            params::OSC_B_GAIN => self.set_oscillator_b_gain(value),
            params::SUB_GAIN => self.set_oscillator_sub_gain(value),
            params::AMP_ATTACK => self.set_amplitude_envelope_params(EnvelopeParams {
                attack: value,
                ..amp
            }),
            params::AMP_DECAY => self.set_amplitude_envelope_params(EnvelopeParams {
                decay: value,
                ..amp
            }),
            params::AMP_SUSTAIN => self.set_amplitude_envelope_params(EnvelopeParams {
                sustain: value,
                ..amp
            }),
            params::AMP_RELEASE => self.set_amplitude_envelope_params(EnvelopeParams {
                release: value,
                ..amp
            }),
            params::MOD_ATTACK => self.set_modulation_envelope_params(EnvelopeParams {
                attack: value,
                ..modulation
            }),
            params::MOD_DECAY => self.set_modulation_envelope_params(EnvelopeParams {
                decay: value,
                ..modulation
            }),
            params::MOD_SUSTAIN => self.set_modulation_envelope_params(EnvelopeParams {
                sustain: value,
                ..modulation
            }),
            params::MOD_RELEASE => self.set_modulation_envelope_params(EnvelopeParams {
                release: value,
                ..modulation
            }),
            params::MASTER_GAIN => self.set_master_gain(value),
            _ => {}
        }
    }
}

fn slot_index(slot: OscillatorSlot) -> usize {
    match slot {
        OscillatorSlot::A => 0,
        OscillatorSlot::B => 1,
        OscillatorSlot::Sub => 2,
    }
}

impl ParameterInfo for SynthEngine {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        params::descriptor(index)
    }

    fn get_param(&self, index: usize) -> f32 {
        let s = &self.snapshot;
        match index {
            params::OSC_A_TYPE => s.oscillator_types[0].index() as f32,
            params::OSC_B_TYPE => s.oscillator_types[1].index() as f32,
            params::SUB_TYPE => s.oscillator_types[2].index() as f32,
            params::OSC_A_GAIN => s.oscillator_levels[0],
            params::OSC_B_GAIN => s.oscillator_levels[1],
            params::SUB_GAIN => s.oscillator_levels[2],
            params::AMP_ATTACK => s.amplitude_envelope.attack,
            params::AMP_DECAY => s.amplitude_envelope.decay,
            params::AMP_SUSTAIN => s.amplitude_envelope.sustain,
            params::AMP_RELEASE => s.amplitude_envelope.release,
            params::MOD_ATTACK => s.modulation_envelope.attack,
            params::MOD_DECAY => s.modulation_envelope.decay,
            params::MOD_SUSTAIN => s.modulation_envelope.sustain,
            params::MOD_RELEASE => s.modulation_envelope.release,
            params::MASTER_GAIN => self.master_gain.target(),
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.apply_param(index, value);
        if let Some(cell) = self.shared.params.get(index) {
            cell.sync(self.get_param(index));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn note_on(note: u8) -> TimedMidiEvent {
        TimedMidiEvent::at_start(MidiEvent::NoteOn {
            note,
            velocity: 100,
        })
    }

    fn note_off(note: u8) -> TimedMidiEvent {
        TimedMidiEvent::at_start(MidiEvent::NoteOff { note, velocity: 0 })
    }

    fn run(engine: &mut SynthEngine, events: &[TimedMidiEvent], len: usize) -> Vec<f32> {
        let mut buf = vec![0.0f32; len];
        engine.process(&mut [&mut buf[..]], events);
        buf
    }

    fn prepared() -> SynthEngine {
        let mut engine = SynthEngine::new();
        engine.prepare(SR, 64);
        engine
    }

    #[test]
    fn defaults() {
        let engine = SynthEngine::new();
        assert_eq!(engine.play_mode(), PlayMode::Polyphonic);
        assert_eq!(engine.num_voices(), MAX_VOICES);
        assert_eq!(engine.master_gain(), 0.8);
        assert_eq!(engine.pitch_bend_range(), 2.0);
        assert_eq!(engine.pitch_wheel_value(), 8192);
        assert_eq!(engine.gain_ceiling(), 0.25);
        assert_eq!(engine.oscillator_a_type(), Waveform::Sine);
        assert_eq!(engine.amplitude_envelope_params(), EnvelopeParams::default());
        for i in 0..PARAM_COUNT {
            let desc = params::descriptor(i).expect("declared");
            assert_eq!(engine.get_param(i), desc.default, "{}", desc.string_id);
        }
    }

    #[test]
    fn repeated_note_on_is_ignored() {
        let mut engine = prepared();
        run(&mut engine, &[note_on(60), note_on(60)], 64);
        assert_eq!(engine.active_voice_count(), 1);
        assert_eq!(engine.slot_for_note(60), Some(0));
    }

    #[test]
    fn note_off_for_unknown_note_is_noop() {
        let mut engine = prepared();
        run(&mut engine, &[note_on(60), note_off(61)], 64);
        assert_eq!(engine.active_voice_count(), 1);
        assert!(!engine.voice(0).expect("voice").is_releasing());
    }

    #[test]
    fn zero_velocity_note_on_releases() {
        let mut engine = prepared();
        run(&mut engine, &[note_on(60)], 64);
        let off = TimedMidiEvent::at_start(MidiEvent::NoteOn {
            note: 60,
            velocity: 0,
        });
        run(&mut engine, &[off], 64);
        assert!(engine.voice(0).expect("voice").is_releasing());
        assert_eq!(engine.slot_for_note(60), None);
    }

    #[test]
    fn retriggered_note_releases_the_newest_voice() {
        let mut engine = prepared();
        engine.set_amplitude_envelope_params(EnvelopeParams::new(0.0, 0.1, 1.0, 2.0));
        run(&mut engine, &[note_on(60), note_off(60), note_on(60)], 64);
        assert_eq!(engine.slot_for_note(60), Some(1));
        assert!(engine.voice(0).expect("voice").is_releasing());

        run(&mut engine, &[note_off(60)], 64);
        assert!(engine.voice(1).expect("voice").is_releasing());
    }

    #[test]
    fn pitch_wheel_reaches_idle_voices() {
        let mut engine = prepared();
        let bend = TimedMidiEvent::at_start(MidiEvent::PitchWheel(16383));
        run(&mut engine, &[bend], 64);
        assert_eq!(engine.pitch_wheel_value(), 16383);
        for i in 0..MAX_VOICES {
            let semis = engine.voice(i).expect("voice").pitch_bend_semitones();
            assert!((semis - 2.0).abs() < 1e-3);
        }

        run(&mut engine, &[note_on(69)], 64);
        let expected = 440.0 * trivox_core::semitones_to_ratio(2.0 * 8191.0 / 8192.0);
        assert!((engine.voice(0).expect("voice").frequency() - expected).abs() < 0.01);
    }

    #[test]
    fn mod_wheel_is_broadcast() {
        let mut engine = prepared();
        let cc = TimedMidiEvent::at_start(MidiEvent::Controller {
            number: 1,
            value: 127,
        });
        run(&mut engine, &[cc], 64);
        assert_eq!(engine.voice(3).expect("voice").mod_wheel_depth(), 1.0);
    }

    #[test]
    fn reset_silences_everything() {
        let mut engine = prepared();
        let bend = TimedMidiEvent::at_start(MidiEvent::PitchWheel(0));
        run(&mut engine, &[bend, note_on(60), note_on(64)], 64);
        engine.request_play_mode_change(PlayMode::Monophonic);

        engine.reset();
        assert_eq!(engine.active_voice_count(), 0);
        assert_eq!(engine.active_notes().count(), 0);
        assert_eq!(engine.pitch_wheel_value(), 8192);
        assert_eq!(engine.pending_play_mode(), None);

        let out = run(&mut engine, &[], 64);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(engine.play_mode(), PlayMode::Polyphonic);
    }

    #[test]
    fn oversized_blocks_render_in_chunks() {
        let mut engine = SynthEngine::new();
        engine.prepare(SR, 16);
        let out = run(&mut engine, &[note_on(60)], 100);
        assert!(out[16..].iter().any(|&s| s != 0.0));
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn sub_type_restricted_to_sine_and_square() {
        let mut engine = prepared();
        engine.set_oscillator_sub_type(Waveform::Saw);
        assert_eq!(engine.oscillator_sub_type(), Waveform::Square);
        engine.set_param(params::SUB_TYPE, 3.0);
        assert_eq!(engine.oscillator_sub_type(), Waveform::Square);
        engine.set_param(params::SUB_TYPE, 0.0);
        assert_eq!(engine.oscillator_sub_type(), Waveform::Sine);
    }

    #[test]
    fn set_param_clamps_and_dispatches() {
        let mut engine = prepared();
        engine.set_param(params::OSC_B_TYPE, 2.0);
        assert_eq!(engine.oscillator_b_type(), Waveform::Saw);

        engine.set_param(params::AMP_RELEASE, 0.0);
        assert_eq!(engine.amplitude_envelope_params().release, 0.01);

        engine.set_param(params::MOD_SUSTAIN, 0.3);
        assert_eq!(engine.modulation_envelope_params().sustain, 0.3);
        assert_eq!(engine.amplitude_envelope_params().sustain, 1.0);

        engine.set_param(params::MASTER_GAIN, 2.0);
        assert_eq!(engine.master_gain(), 1.0);

        engine.set_param(params::OSC_A_GAIN, 0.4);
        assert_eq!(engine.oscillator_gain(OscillatorSlot::A), 0.4);
        assert_eq!(engine.handle().param(params::OSC_A_GAIN), Some(0.4));

        engine.set_param(99, 1.0);
        assert_eq!(engine.get_param(99), 0.0);
    }

    #[test]
    fn handle_params_apply_at_block_start() {
        let mut engine = prepared();
        let handle = engine.handle();
        handle.set_param(params::AMP_ATTACK, 9.0);
        handle.set_param(params::OSC_A_TYPE, 3.0);
        assert_eq!(engine.amplitude_envelope_params().attack, 0.0);

        run(&mut engine, &[], 64);
        assert_eq!(engine.amplitude_envelope_params().attack, 5.0);
        assert_eq!(engine.oscillator_a_type(), Waveform::Triangle);
        assert_eq!(handle.param(params::AMP_ATTACK), Some(5.0));
    }

    #[test]
    fn find_param_by_string_id() {
        let engine = SynthEngine::new();
        assert_eq!(engine.find_param_by_name("masterGain"), Some(params::MASTER_GAIN));
        assert_eq!(engine.find_param_by_name("Amp Release"), Some(params::AMP_RELEASE));
    }

    #[test]
    fn play_mode_names() {
        assert_eq!(PlayMode::from_name("MONO"), Some(PlayMode::Monophonic));
        assert_eq!(PlayMode::from_name("duophonic"), Some(PlayMode::Duophonic));
        assert_eq!(PlayMode::from_name("poly"), Some(PlayMode::Polyphonic));
        assert_eq!(PlayMode::from_name("unison"), None);
        for mode in PlayMode::ALL {
            assert_eq!(PlayMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(PlayMode::from_code(PendingCell::EMPTY), None);
    }
}
