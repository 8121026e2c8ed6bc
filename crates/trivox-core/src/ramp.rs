//! Linear gain ramping for click-free level changes.
//!
//! [`GainRamp`] moves a gain from its current value to a target over a fixed
//! number of samples, then pins it to the target exactly so repeated float
//! addition never leaves it a few ULPs off.

use libm::roundf;

/// A gain in `[0, 1]` that travels linearly toward a target.
///
/// Retargeting mid-ramp starts a fresh linear path from wherever the gain is
/// at that instant; the new duration is measured from the current value.
///
/// # Example
///
/// ```rust
/// use trivox_core::GainRamp;
///
/// let mut ramp = GainRamp::new(0.0);
/// ramp.set_target(1.0, 0.001, 48000.0); // 48 samples
///
/// let mut last = 0.0;
/// for _ in 0..48 {
///     last = ramp.next_sample();
/// }
/// assert_eq!(last, 1.0);
/// assert!(!ramp.is_ramping());
/// ```
#[derive(Debug, Clone)]
pub struct GainRamp {
    /// Value returned by the most recent [`next_sample`](Self::next_sample)
    current: f32,
    /// Value the ramp settles on
    target: f32,
    /// Increment applied per sample (signed)
    step: f32,
    /// Samples left until `current` is pinned to `target`
    samples_remaining: u32,
}

impl Default for GainRamp {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl GainRamp {
    /// Create a settled ramp at `gain` (clamped to `[0, 1]`).
    pub fn new(gain: f32) -> Self {
        let gain = gain.clamp(0.0, 1.0);
        Self {
            current: gain,
            target: gain,
            step: 0.0,
            samples_remaining: 0,
        }
    }

    /// Start ramping toward `target` over `ramp_time_s` seconds.
    ///
    /// The target is clamped to `[0, 1]`. A non-positive ramp time or sample
    /// rate snaps the gain to the target immediately.
    pub fn set_target(&mut self, target: f32, ramp_time_s: f32, sample_rate: f32) {
        self.target = target.clamp(0.0, 1.0);

        if ramp_time_s <= 0.0 {
            self.snap();
            return;
        }
        if !ramp_time_s.is_finite() || !sample_rate.is_finite() || sample_rate <= 0.0 {
            #[cfg(feature = "tracing")]
            tracing::debug!(ramp_time_s, sample_rate, target = self.target, "gain ramp snapped");
            self.snap();
            return;
        }

        let total = roundf(ramp_time_s * sample_rate).max(1.0) as u32;
        self.step = (self.target - self.current) / total as f32;
        self.samples_remaining = total;
    }

    /// Advance one sample and return the gain to apply to it.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.step;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Scale `input` by the next ramped gain.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        input * self.next_sample()
    }

    /// Whether a ramp is still in progress.
    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.samples_remaining > 0
    }

    /// Jump to `gain` (clamped) with no ramp.
    pub fn reset(&mut self, gain: f32) {
        self.target = gain.clamp(0.0, 1.0);
        self.snap();
    }

    /// Gain returned by the last call to [`next_sample`](Self::next_sample).
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Gain the ramp is heading to.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    fn snap(&mut self) {
        self.current = self.target;
        self.step = 0.0;
        self.samples_remaining = 0;
    }
}
