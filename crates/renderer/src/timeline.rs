use std::time::{Duration, Instant};

use sceneconfig::EasingSetting;

/// Easing curves available to tweens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    Smoothstep,
    EaseInOut,
    EaseInCubic,
    EaseInOutBack,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => clamped,
            Easing::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            Easing::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
            Easing::EaseInCubic => clamped * clamped * clamped,
            Easing::EaseInOutBack => {
                let back_in = |x: f32| x * x * (3.0 * x - 2.0);
                if clamped < 0.5 {
                    back_in(clamped * 2.0) / 2.0
                } else {
                    1.0 - back_in(2.0 - clamped * 2.0) / 2.0
                }
            }
        }
    }
}

impl From<EasingSetting> for Easing {
    fn from(value: EasingSetting) -> Self {
        match value {
            EasingSetting::Linear => Easing::Linear,
            EasingSetting::Smoothstep => Easing::Smoothstep,
            EasingSetting::EaseInOut => Easing::EaseInOut,
            EasingSetting::EaseInCubic => Easing::EaseInCubic,
            EasingSetting::EaseInOutBack => Easing::EaseInOutBack,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Tween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    fn value_at(&self, now: Instant) -> (f32, bool) {
        let elapsed = now.saturating_duration_since(self.start);
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        let finished = progress >= 1.0;
        if finished {
            return (self.to, true);
        }
        let mix = self.easing.sample(progress);
        (self.from + (self.to - self.from) * mix, false)
    }
}

/// Single-owner cell for one animated scalar.
///
/// At most one tween writes the cell. Starting another transition replaces
/// the in-flight tween with one that departs from the current value, so a
/// redirect never produces two competing writers.
#[derive(Debug, Clone)]
pub struct AnimatedValue {
    current: f32,
    target: f32,
    tween: Option<Tween>,
    round: bool,
}

impl AnimatedValue {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            tween: None,
            round: false,
        }
    }

    /// Snaps every sampled value to the nearest whole number.
    pub fn rounded(mut self) -> Self {
        self.round = true;
        self.current = self.current.round();
        self.target = self.target.round();
        self
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Jumps to `value` and drops any tween in flight.
    pub fn set(&mut self, value: f32) {
        let value = self.quantize(value);
        self.current = value;
        self.target = value;
        self.tween = None;
    }

    /// Starts, or redirects, the transition toward `target`.
    pub fn animate_to(&mut self, target: f32, duration: Duration, easing: Easing, now: Instant) {
        let target = self.quantize(target);
        self.target = target;
        if duration.is_zero() {
            self.current = target;
            self.tween = None;
            return;
        }
        self.tween = Some(Tween {
            from: self.current,
            to: target,
            start: now,
            duration,
            easing,
        });
    }

    /// Advances the active tween; returns the new value while one is running.
    pub fn sample(&mut self, now: Instant) -> Option<f32> {
        let tween = self.tween?;
        let (value, finished) = tween.value_at(now);
        self.current = self.quantize(value);
        if finished {
            self.tween = None;
        }
        Some(self.current)
    }

    fn quantize(&self, value: f32) -> f32 {
        if self.round {
            value.round()
        } else {
            value
        }
    }
}
