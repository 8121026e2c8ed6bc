//! A single monophonic synthesizer voice.
//!
//! Three oscillators (A, B and a sub oscillator an octave or two below),
//! one gain ramp per oscillator, an amplitude envelope and a modulation
//! envelope. A voice frees itself once its amplitude envelope has decayed
//! below the audible floor.

use crate::envelope::{EnvelopeGenerator, EnvelopeParams, EnvelopeState};
use crate::oscillator::{OctaveOffset, Oscillator, Waveform};
use trivox_core::{GainRamp, midi_note_to_hz, semitones_to_ratio};

/// Amplitude-envelope level below which a voice stops sounding.
pub const AUDIBLE_FLOOR: f32 = 1e-4;

/// Ramp time for oscillator and master gain changes, in seconds.
pub const GAIN_RAMP_TIME_S: f32 = 0.025;

/// Default pitch-bend range in semitones.
pub const DEFAULT_PITCH_BEND_RANGE: f32 = 2.0;

/// Largest pitch-bend range in semitones.
pub const MAX_PITCH_BEND_RANGE: f32 = 48.0;

/// MIDI controller number of the modulation wheel.
pub const MOD_WHEEL_CC: u8 = 1;

/// Which of a voice's three oscillators a setter targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscillatorSlot {
    /// Oscillator A.
    A,
    /// Oscillator B.
    B,
    /// Sub oscillator.
    Sub,
}

impl OscillatorSlot {
    /// All slots in A, B, Sub order.
    pub const ALL: [OscillatorSlot; 3] = [OscillatorSlot::A, OscillatorSlot::B, OscillatorSlot::Sub];

    const fn index(self) -> usize {
        match self {
            OscillatorSlot::A => 0,
            OscillatorSlot::B => 1,
            OscillatorSlot::Sub => 2,
        }
    }
}

/// One oscillator with its smoothed output gain.
#[derive(Debug, Clone)]
struct OscillatorChannel {
    oscillator: Oscillator,
    gain: GainRamp,
    /// Gain before velocity scaling
    level: f32,
}

impl OscillatorChannel {
    fn new() -> Self {
        Self {
            oscillator: Oscillator::new(),
            gain: GainRamp::new(0.0),
            level: 1.0,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        self.gain.process(self.oscillator.process())
    }
}

/// A single synthesizer voice.
///
/// Identity is the MIDI note it is playing (`None` when free) plus the
/// previous note, kept so pitch-bend can retune a voice between notes.
///
/// # Example
///
/// ```rust
/// use trivox_synth::Voice;
///
/// let mut voice = Voice::new(48000.0);
/// voice.start_note(69, 1.0);
/// assert!(voice.is_active());
/// assert!((voice.frequency() - 440.0).abs() < 1e-3);
///
/// voice.stop_note(0.0, false);
/// assert!(!voice.is_active());
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    sample_rate: f32,
    midi_note: Option<u8>,
    previous_note: Option<u8>,
    velocity: f32,
    frequency: f32,

    /// Normalized bend in [-1, 1]
    pitch_bend: f32,
    pitch_bend_semitones: f32,
    pitch_bend_range: f32,
    mod_wheel_depth: f32,

    /// A, B, Sub
    channels: [OscillatorChannel; 3],
    sub_offset: OctaveOffset,
    gain_ramp_time: f32,

    amplitude_envelope: EnvelopeGenerator,
    modulation_envelope: EnvelopeGenerator,
    last_amplitude_sample: f32,
    last_modulation_sample: f32,

    active: bool,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl Voice {
    /// Create a free voice: sine oscillators, silent gains, default envelopes.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            midi_note: None,
            previous_note: None,
            velocity: 0.0,
            frequency: 0.0,
            pitch_bend: 0.0,
            pitch_bend_semitones: 0.0,
            pitch_bend_range: DEFAULT_PITCH_BEND_RANGE,
            mod_wheel_depth: 0.0,
            channels: core::array::from_fn(|_| OscillatorChannel::new()),
            sub_offset: OctaveOffset::One,
            gain_ramp_time: GAIN_RAMP_TIME_S,
            amplitude_envelope: EnvelopeGenerator::new(sample_rate),
            modulation_envelope: EnvelopeGenerator::new(sample_rate),
            last_amplitude_sample: 0.0,
            last_modulation_sample: 0.0,
            active: false,
        }
    }

    /// Adopt a new sample rate, retuning oscillators and envelopes.
    pub fn prepare(&mut self, sample_rate: f32) {
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.amplitude_envelope.set_sample_rate(sample_rate);
            self.modulation_envelope.set_sample_rate(sample_rate);
        }
        self.update_frequencies();
        self.apply_gains(self.gain_ramp_time);
    }

    /// Start sounding `note` at `velocity` (clamped to `[0, 1]`).
    pub fn start_note(&mut self, note: u8, velocity: f32) {
        self.midi_note = Some(note.min(127));
        self.velocity = if velocity.is_nan() {
            0.0
        } else {
            velocity.clamp(0.0, 1.0)
        };
        self.update_frequencies();

        self.amplitude_envelope.note_on();
        self.modulation_envelope.note_on();

        self.apply_gains(self.gain_ramp_time);
        self.active = true;
    }

    /// Stop the note. With `allow_tail_off` the envelopes enter release and
    /// the voice keeps sounding until it decays; otherwise it is freed now.
    pub fn stop_note(&mut self, _velocity: f32, allow_tail_off: bool) {
        if allow_tail_off {
            self.amplitude_envelope.note_off();
            self.modulation_envelope.note_off();
        } else {
            self.free();
        }
    }

    /// Render one mono sample.
    ///
    /// Returns silence and frees the voice once the amplitude envelope falls
    /// below [`AUDIBLE_FLOOR`]. A rising attack never counts as decayed.
    #[inline]
    pub fn render_next_sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }

        let envelope = self.amplitude_envelope.next_sample();
        self.last_amplitude_sample = envelope;
        if envelope <= AUDIBLE_FLOOR && self.amplitude_envelope.state() != EnvelopeState::Attack {
            self.free();
            return 0.0;
        }

        // Computed for parity; not routed to any destination yet
        if self.modulation_envelope.is_active() {
            self.last_modulation_sample = self.modulation_envelope.next_sample();
        } else {
            self.last_modulation_sample = 0.0;
            self.modulation_envelope.reset();
        }

        let [a, b, sub] = &mut self.channels;
        (a.next_sample() + b.next_sample() + sub.next_sample()) * envelope
    }

    /// Bend by `normalized` (clamped to `[-1, 1]`) times the bend range,
    /// retuning the current or previous note.
    pub fn set_pitch_bend(&mut self, normalized: f32) {
        self.pitch_bend = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(-1.0, 1.0)
        };
        self.pitch_bend_semitones = self.pitch_bend * self.pitch_bend_range;
        self.update_frequencies();
    }

    /// Set the bend range in semitones, clamped to `[0, 48]`.
    pub fn set_pitch_bend_range(&mut self, semitones: f32) {
        self.pitch_bend_range = if semitones.is_nan() {
            DEFAULT_PITCH_BEND_RANGE
        } else {
            semitones.clamp(0.0, MAX_PITCH_BEND_RANGE)
        };
        self.pitch_bend_semitones = self.pitch_bend * self.pitch_bend_range;
        self.update_frequencies();
    }

    /// Handle a MIDI controller. Only the mod wheel is tracked.
    pub fn controller_moved(&mut self, controller: u8, value: u8) {
        if controller == MOD_WHEEL_CC {
            self.mod_wheel_depth = (f32::from(value) / 127.0).clamp(0.0, 1.0);
        }
    }

    /// Set an oscillator's waveform.
    pub fn set_oscillator_type(&mut self, slot: OscillatorSlot, waveform: Waveform) {
        self.channels[slot.index()].oscillator.set_waveform(waveform);
    }

    /// Waveform of an oscillator.
    pub fn oscillator_type(&self, slot: OscillatorSlot) -> Waveform {
        self.channels[slot.index()].oscillator.waveform()
    }

    /// Set an oscillator's level (clamped to `[0, 1]`), ramped over `ramp_time_s`.
    /// The sounding gain is the level scaled by note velocity.
    pub fn set_oscillator_gain(&mut self, slot: OscillatorSlot, level: f32, ramp_time_s: f32) {
        let velocity = self.velocity;
        let sample_rate = self.sample_rate;
        let channel = &mut self.channels[slot.index()];
        channel.level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
        channel
            .gain
            .set_target(channel.level * velocity, ramp_time_s, sample_rate);
    }

    /// Level of an oscillator before velocity scaling.
    pub fn oscillator_level(&self, slot: OscillatorSlot) -> f32 {
        self.channels[slot.index()].level
    }

    /// Gain ramp of an oscillator.
    pub fn oscillator_gain(&self, slot: OscillatorSlot) -> &GainRamp {
        &self.channels[slot.index()].gain
    }

    /// Oscillator in a slot.
    pub fn oscillator(&self, slot: OscillatorSlot) -> &Oscillator {
        &self.channels[slot.index()].oscillator
    }

    /// Set how many octaves the sub oscillator sits below the note.
    pub fn set_sub_offset(&mut self, offset: OctaveOffset) {
        self.sub_offset = offset;
        self.channels[OscillatorSlot::Sub.index()]
            .oscillator
            .set_frequency(offset.apply(self.frequency), self.sample_rate);
    }

    /// Sub oscillator octave offset.
    pub fn sub_offset(&self) -> OctaveOffset {
        self.sub_offset
    }

    /// Set both envelope shapes.
    pub fn set_envelope_params(&mut self, amplitude: EnvelopeParams, modulation: EnvelopeParams) {
        self.amplitude_envelope.set_params(amplitude);
        self.modulation_envelope.set_params(modulation);
    }

    /// Set the amplitude envelope shape.
    pub fn set_amplitude_envelope_params(&mut self, params: EnvelopeParams) {
        self.amplitude_envelope.set_params(params);
    }

    /// Set the modulation envelope shape.
    pub fn set_modulation_envelope_params(&mut self, params: EnvelopeParams) {
        self.modulation_envelope.set_params(params);
    }

    /// Amplitude envelope shape.
    pub fn amplitude_envelope_params(&self) -> EnvelopeParams {
        self.amplitude_envelope.params()
    }

    /// Modulation envelope shape.
    pub fn modulation_envelope_params(&self) -> EnvelopeParams {
        self.modulation_envelope.params()
    }

    /// Stage of the amplitude envelope.
    pub fn amplitude_envelope_state(&self) -> EnvelopeState {
        self.amplitude_envelope.state()
    }

    /// Amplitude envelope sample from the last render.
    pub fn amplitude_envelope_value(&self) -> f32 {
        self.last_amplitude_sample
    }

    /// Modulation envelope sample from the last render.
    pub fn modulation_envelope_value(&self) -> f32 {
        self.last_modulation_sample
    }

    /// Whether the voice is sounding (including its release tail).
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the voice is sounding its release tail.
    pub fn is_releasing(&self) -> bool {
        self.active && self.amplitude_envelope.state() == EnvelopeState::Release
    }

    /// Note being played, `None` when free.
    pub fn midi_note(&self) -> Option<u8> {
        self.midi_note
    }

    /// Last note this voice played.
    pub fn previous_note(&self) -> Option<u8> {
        self.previous_note
    }

    /// Note velocity in `[0, 1]`.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Frequency of oscillators A and B in Hz, including pitch bend.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current pitch-bend offset in semitones.
    pub fn pitch_bend_semitones(&self) -> f32 {
        self.pitch_bend_semitones
    }

    /// Pitch-bend range in semitones.
    pub fn pitch_bend_range(&self) -> f32 {
        self.pitch_bend_range
    }

    /// Mod wheel position in `[0, 1]`.
    pub fn mod_wheel_depth(&self) -> f32 {
        self.mod_wheel_depth
    }

    /// Return to the free state: silent gains, idle envelopes.
    fn free(&mut self) {
        self.midi_note = None;
        self.active = false;
        self.velocity = 0.0;
        self.last_amplitude_sample = 0.0;
        self.last_modulation_sample = 0.0;
        for channel in &mut self.channels {
            channel.gain.reset(0.0);
        }
        self.amplitude_envelope.reset();
        self.modulation_envelope.reset();
    }

    fn apply_gains(&mut self, ramp_time_s: f32) {
        for channel in &mut self.channels {
            channel
                .gain
                .set_target(channel.level * self.velocity, ramp_time_s, self.sample_rate);
        }
    }

    fn update_frequencies(&mut self) {
        self.frequency = match self.midi_note.or(self.previous_note) {
            Some(note) => midi_note_to_hz(note) * semitones_to_ratio(self.pitch_bend_semitones),
            None => 0.0,
        };
        if self.midi_note.is_some() {
            self.previous_note = self.midi_note;
        }

        let [a, b, sub] = &mut self.channels;
        a.oscillator.set_frequency(self.frequency, self.sample_rate);
        b.oscillator.set_frequency(self.frequency, self.sample_rate);
        sub.oscillator
            .set_frequency(self.sub_offset.apply(self.frequency), self.sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn render(voice: &mut Voice, samples: usize) -> f32 {
        let mut peak = 0.0f32;
        for _ in 0..samples {
            peak = peak.max(voice.render_next_sample().abs());
        }
        peak
    }

    #[test]
    fn new_voice_is_free_and_silent() {
        let mut voice = Voice::new(SR);
        assert!(!voice.is_active());
        assert_eq!(voice.midi_note(), None);
        assert_eq!(voice.render_next_sample(), 0.0);
    }

    #[test]
    fn start_note_tunes_all_oscillators() {
        let mut voice = Voice::new(SR);
        voice.start_note(60, 0.8);
        assert!(voice.is_active());
        assert_eq!(voice.midi_note(), Some(60));
        assert_eq!(voice.velocity(), 0.8);
        assert!((voice.frequency() - 261.6256).abs() < 0.01);

        let sub = voice.oscillator(OscillatorSlot::Sub).frequency();
        assert!((sub - voice.frequency() / 2.0).abs() < 1e-3);

        voice.set_sub_offset(OctaveOffset::Two);
        let sub = voice.oscillator(OscillatorSlot::Sub).frequency();
        assert!((sub - voice.frequency() / 4.0).abs() < 1e-3);
    }

    #[test]
    fn gains_ramp_to_velocity_scaled_levels() {
        let mut voice = Voice::new(SR);
        voice.set_oscillator_gain(OscillatorSlot::B, 0.5, 0.0);
        voice.start_note(60, 0.5);

        let ramp = voice.oscillator_gain(OscillatorSlot::B);
        assert!(ramp.is_ramping());
        assert_eq!(ramp.target(), 0.25);
        assert_eq!(voice.oscillator_gain(OscillatorSlot::A).target(), 0.5);
        assert_eq!(voice.oscillator_level(OscillatorSlot::B), 0.5);
    }

    #[test]
    fn gain_level_does_not_compound_across_notes() {
        let mut voice = Voice::new(SR);
        voice.start_note(60, 0.5);
        voice.stop_note(0.0, false);
        voice.start_note(62, 0.5);
        assert_eq!(voice.oscillator_gain(OscillatorSlot::A).target(), 0.5);
    }

    #[test]
    fn immediate_stop_frees_now() {
        let mut voice = Voice::new(SR);
        voice.start_note(60, 1.0);
        render(&mut voice, 64);
        voice.stop_note(0.0, false);
        assert!(!voice.is_active());
        assert_eq!(voice.midi_note(), None);
        assert_eq!(voice.oscillator_gain(OscillatorSlot::A).current(), 0.0);
        assert_eq!(voice.amplitude_envelope_state(), EnvelopeState::Idle);
        assert_eq!(voice.render_next_sample(), 0.0);
    }

    #[test]
    fn tail_off_self_frees_after_release() {
        let mut voice = Voice::new(SR);
        voice.set_amplitude_envelope_params(EnvelopeParams::new(0.0, 0.1, 1.0, 0.1));
        voice.start_note(60, 1.0);
        render(&mut voice, 256);

        voice.stop_note(0.0, true);
        assert!(voice.is_active());
        assert!(voice.is_releasing());

        let mut samples = 0;
        while voice.is_active() {
            voice.render_next_sample();
            samples += 1;
            assert!(samples < 10_000, "voice never freed");
        }
        assert!((4400..=4412).contains(&samples), "freed after {samples} samples");
        assert_eq!(voice.midi_note(), None);
        assert_eq!(voice.previous_note(), Some(60));
    }

    #[test]
    fn long_attack_is_not_mistaken_for_silence() {
        let mut voice = Voice::new(SR);
        voice.set_amplitude_envelope_params(EnvelopeParams::new(5.0, 0.1, 1.0, 0.1));
        voice.start_note(60, 1.0);
        render(&mut voice, 16);
        assert!(voice.is_active());
        assert_eq!(voice.amplitude_envelope_state(), EnvelopeState::Attack);
    }

    #[test]
    fn zero_sustain_frees_after_decay() {
        let mut voice = Voice::new(SR);
        voice.set_amplitude_envelope_params(EnvelopeParams::new(0.0, 0.01, 0.0, 0.1));
        voice.start_note(60, 1.0);
        render(&mut voice, 1000);
        assert!(!voice.is_active());
    }

    #[test]
    fn output_is_scaled_by_envelope_and_gain() {
        let mut voice = Voice::new(SR);
        for slot in OscillatorSlot::ALL {
            voice.set_oscillator_type(slot, Waveform::Square);
        }
        voice.start_note(60, 1.0);
        // Let the 25 ms gain ramp finish
        render(&mut voice, 2000);
        let peak = render(&mut voice, 2000);
        assert!((peak - 3.0).abs() < 1e-4, "peak {peak}");
    }

    #[test]
    fn pitch_bend_retunes_sounding_note() {
        let mut voice = Voice::new(SR);
        voice.start_note(69, 1.0);
        voice.set_pitch_bend(1.0);
        assert_eq!(voice.pitch_bend_semitones(), 2.0);
        let expected = 440.0 * semitones_to_ratio(2.0);
        assert!((voice.frequency() - expected).abs() < 1e-2);

        voice.set_pitch_bend(-5.0);
        assert_eq!(voice.pitch_bend_semitones(), -2.0);
    }

    #[test]
    fn pitch_bend_range_rescales_offset() {
        let mut voice = Voice::new(SR);
        voice.set_pitch_bend(0.5);
        voice.set_pitch_bend_range(12.0);
        assert_eq!(voice.pitch_bend_semitones(), 6.0);
        voice.set_pitch_bend_range(100.0);
        assert_eq!(voice.pitch_bend_range(), 48.0);
        voice.set_pitch_bend_range(-3.0);
        assert_eq!(voice.pitch_bend_range(), 0.0);
    }

    #[test]
    fn bend_on_free_voice_uses_previous_note() {
        let mut voice = Voice::new(SR);
        voice.set_pitch_bend(1.0);
        assert_eq!(voice.frequency(), 0.0);

        voice.start_note(69, 1.0);
        voice.stop_note(0.0, false);
        voice.set_pitch_bend(0.0);
        assert!((voice.frequency() - 440.0).abs() < 1e-3);
    }

    #[test]
    fn mod_wheel_tracks_controller_one() {
        let mut voice = Voice::new(SR);
        voice.controller_moved(1, 127);
        assert_eq!(voice.mod_wheel_depth(), 1.0);
        voice.controller_moved(7, 0);
        assert_eq!(voice.mod_wheel_depth(), 1.0);
        voice.controller_moved(1, 0);
        assert_eq!(voice.mod_wheel_depth(), 0.0);
    }

    #[test]
    fn modulation_envelope_runs_while_active() {
        let mut voice = Voice::new(SR);
        voice.set_modulation_envelope_params(EnvelopeParams::new(0.01, 0.1, 0.5, 0.1));
        voice.start_note(60, 1.0);
        render(&mut voice, 100);
        let value = voice.modulation_envelope_value();
        assert!(value > 0.0 && value < 1.0, "mod env {value}");
    }
}
