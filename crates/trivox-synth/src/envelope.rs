//! Linear ADSR envelope generator.
//!
//! Stages move at constant rates: attack rises to 1.0, decay falls to the
//! sustain level, release falls from wherever the envelope was at note-off
//! to zero in exactly the release time.

/// ADSR envelope states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Envelope is inactive - output is zero.
    #[default]
    Idle,
    /// Attack phase - output ramps up toward 1.0.
    Attack,
    /// Decay phase - output falls from peak toward sustain level.
    Decay,
    /// Sustain phase - output holds at sustain level while the note is held.
    Sustain,
    /// Release phase - output falls to zero after note-off.
    Release,
}

/// Envelope shape: stage durations in seconds and the sustain level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeParams {
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level in `[0, 1]`.
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.0,
            decay: 0.1,
            sustain: 1.0,
            release: 0.1,
        }
    }
}

impl EnvelopeParams {
    /// Longest stage duration a control surface offers, in seconds.
    pub const MAX_TIME: f32 = 5.0;
    /// Shortest decay and release a control surface offers, in seconds.
    pub const MIN_DECAY_RELEASE: f32 = 0.01;

    /// Create a parameter set.
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Clamp to the ranges the declared parameters use: attack `[0, 5]`,
    /// decay and release `[0.01, 5]`, sustain `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            attack: clamp_or(self.attack, 0.0, Self::MAX_TIME),
            decay: clamp_or(self.decay, Self::MIN_DECAY_RELEASE, Self::MAX_TIME),
            sustain: clamp_or(self.sustain, 0.0, 1.0),
            release: clamp_or(self.release, Self::MIN_DECAY_RELEASE, Self::MAX_TIME),
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Linear attack-decay-sustain-release envelope.
///
/// # Example
///
/// ```rust
/// use trivox_synth::{EnvelopeGenerator, EnvelopeParams, EnvelopeState};
///
/// let mut env = EnvelopeGenerator::new(1000.0);
/// env.set_params(EnvelopeParams::new(0.01, 0.0, 1.0, 0.01)); // 10-sample attack
///
/// env.note_on();
/// while env.state() == EnvelopeState::Attack {
///     env.next_sample();
/// }
/// assert_eq!(env.level(), 1.0);
/// assert_eq!(env.state(), EnvelopeState::Sustain);
///
/// env.note_off();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,
    params: EnvelopeParams,

    // Per-sample increments; non-positive means the stage is skipped
    attack_rate: f32,
    decay_rate: f32,
    /// Fixed at note-off from the level reached
    release_rate: f32,
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl EnvelopeGenerator {
    /// Create an idle envelope with default parameters.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate,
            params: EnvelopeParams::default(),
            attack_rate: 0.0,
            decay_rate: 0.0,
            release_rate: 0.0,
        };
        env.recalculate_rates();
        env
    }

    /// Set sample rate and recompute stage rates.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_rates();
    }

    /// Replace the envelope shape. Takes effect on the next sample, including
    /// for a stage already in progress.
    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = EnvelopeParams {
            attack: params.attack.max(0.0),
            decay: params.decay.max(0.0),
            sustain: clamp_or(params.sustain, 0.0, 1.0),
            release: params.release.max(0.0),
        };
        self.recalculate_rates();
    }

    /// Current envelope shape.
    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    /// Start the attack stage from the current level.
    pub fn note_on(&mut self) {
        if self.attack_rate > 0.0 {
            self.state = EnvelopeState::Attack;
        } else if self.decay_rate > 0.0 {
            self.level = 1.0;
            self.state = EnvelopeState::Decay;
        } else {
            self.level = self.params.sustain;
            self.state = EnvelopeState::Sustain;
        }
    }

    /// Enter release from any sounding stage.
    pub fn note_off(&mut self) {
        if self.state == EnvelopeState::Idle {
            return;
        }
        if self.params.release > 0.0 && self.sample_rate > 0.0 {
            self.release_rate = self.level / (self.params.release * self.sample_rate);
            self.state = EnvelopeState::Release;
        } else {
            self.reset();
        }
    }

    /// Force envelope to idle state.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }

    /// Get current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Get current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Check if envelope is active (not idle).
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance envelope by one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => return 0.0,

            EnvelopeState::Attack => {
                self.level += self.attack_rate;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.finish_attack();
                }
            }

            EnvelopeState::Decay => {
                self.level -= self.decay_rate;
                if self.level <= self.params.sustain {
                    self.level = self.params.sustain;
                    self.state = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.params.sustain;
            }

            EnvelopeState::Release => {
                self.level -= self.release_rate;
                if self.level <= 0.0 {
                    self.reset();
                }
            }
        }

        self.level
    }

    fn finish_attack(&mut self) {
        self.state = if self.decay_rate > 0.0 {
            EnvelopeState::Decay
        } else {
            EnvelopeState::Sustain
        };
    }

    fn recalculate_rates(&mut self) {
        let p = self.params;
        self.attack_rate = rate(1.0, p.attack, self.sample_rate);
        self.decay_rate = rate(1.0 - p.sustain, p.decay, self.sample_rate);
        if self.state == EnvelopeState::Release {
            self.release_rate = rate(self.level, p.release, self.sample_rate);
        }

        // A stage whose time dropped to zero mid-flight moves on at once
        match self.state {
            EnvelopeState::Attack if self.attack_rate <= 0.0 => {
                self.level = 1.0;
                self.finish_attack();
            }
            EnvelopeState::Decay
                if self.decay_rate <= 0.0 || self.level <= self.params.sustain =>
            {
                self.level = self.params.sustain;
                self.state = EnvelopeState::Sustain;
            }
            EnvelopeState::Release if self.release_rate <= 0.0 => self.reset(),
            _ => {}
        }
    }
}

/// Per-sample rate covering `distance` in `time_s`, or -1 when the stage has no duration.
fn rate(distance: f32, time_s: f32, sample_rate: f32) -> f32 {
    if time_s > 0.0 && sample_rate > 0.0 {
        distance / (time_s * sample_rate)
    } else {
        -1.0
    }
}
