//! Deadline-driven stagger scheduling for tile flips.
//!
//! A [`StaggerScheduler`] owns one self-re-arming cycle: tile `i` is due at
//! `cycle_start + i * delay`, and the next cycle begins at
//! `cycle_start + tile_count * delay * multiplier`. Nothing here sleeps or
//! spawns; the host polls with the current instant and waits until
//! [`StaggerScheduler::next_deadline`] between polls. The chain never ends on
//! its own and is stopped through its [`TaskHandle`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sceneconfig::AnimationConfig;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchedulerError {
    #[error("stagger schedule needs at least one tile")]
    EmptyGrid,
    #[error("stagger delay must be greater than zero")]
    ZeroDelay,
    #[error("delay multiplier must be a finite value >= 1 (got {0})")]
    InvalidMultiplier(f32),
    #[error("stagger cycle of {0:?} exceeds the {max:?} limit", max = MAX_PERIOD)]
    PeriodTooLong(Duration),
}

/// Longest cycle a schedule may span.
pub const MAX_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Cancellation token shared between a repeating task and its owner.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle(Arc<AtomicBool>);

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One tile flip that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub index: usize,
    pub at: Instant,
}

#[derive(Debug)]
pub struct StaggerScheduler {
    tile_count: usize,
    delay: Duration,
    period: Duration,
    cycle_start: Instant,
    next_index: usize,
    cycles: u64,
    handle: TaskHandle,
}

impl StaggerScheduler {
    /// Arms the first cycle at `now`.
    pub fn start(
        tile_count: usize,
        delay: Duration,
        multiplier: f32,
        now: Instant,
    ) -> Result<Self, SchedulerError> {
        if tile_count == 0 {
            return Err(SchedulerError::EmptyGrid);
        }
        if delay.is_zero() {
            return Err(SchedulerError::ZeroDelay);
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(SchedulerError::InvalidMultiplier(multiplier));
        }

        let sweep = delay.saturating_mul(u32::try_from(tile_count).unwrap_or(u32::MAX));
        let period = if multiplier.fract() == 0.0 {
            sweep.saturating_mul(multiplier as u32)
        } else {
            Duration::try_from_secs_f64(sweep.as_secs_f64() * f64::from(multiplier))
                .unwrap_or(Duration::MAX)
        };
        if period > MAX_PERIOD || now.checked_add(period.saturating_mul(2)).is_none() {
            return Err(SchedulerError::PeriodTooLong(period));
        }
        tracing::debug!(
            tile_count,
            delay_ms = delay.as_millis() as u64,
            period_ms = period.as_millis() as u64,
            "armed stagger schedule"
        );

        Ok(Self {
            tile_count,
            delay,
            period,
            cycle_start: now,
            next_index: 0,
            cycles: 1,
            handle: TaskHandle::new(),
        })
    }

    pub fn from_config(
        config: &AnimationConfig,
        tile_count: usize,
        now: Instant,
    ) -> Result<Self, SchedulerError> {
        Self::start(tile_count, config.flip_delay, config.delay_multiplier, now)
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn cycle_start(&self) -> Instant {
        self.cycle_start
    }

    /// Number of cycles armed so far, the initial one included.
    pub fn cycles_started(&self) -> u64 {
        self.cycles
    }

    fn trigger_at(&self, index: usize) -> Option<Instant> {
        self.cycle_start
            .checked_add(self.delay.saturating_mul(index as u32))
    }

    fn rearm_at(&self) -> Option<Instant> {
        self.cycle_start.checked_add(self.period)
    }

    /// Returns every trigger due at or before `now`, in schedule order.
    pub fn poll(&mut self, now: Instant) -> Vec<Trigger> {
        let mut fired = Vec::new();
        loop {
            if self.handle.is_cancelled() {
                break;
            }

            while self.next_index < self.tile_count {
                let Some(at) = self.trigger_at(self.next_index) else {
                    return fired;
                };
                if at > now {
                    break;
                }
                fired.push(Trigger {
                    index: self.next_index,
                    at,
                });
                self.next_index += 1;
            }

            let Some(rearm_at) = self.rearm_at() else {
                tracing::warn!("stagger schedule ran past the clock range; stopping");
                self.handle.cancel();
                break;
            };
            if now < rearm_at || self.handle.is_cancelled() {
                break;
            }

            let behind = now.saturating_duration_since(rearm_at);
            let skipped = (behind.as_nanos() / self.period.as_nanos().max(1)).min(u32::MAX as u128)
                as u32;
            if skipped > 0 {
                tracing::debug!(skipped, "stagger schedule fell behind; skipping whole cycles");
            }
            let Some(cycle_start) = rearm_at.checked_add(self.period.saturating_mul(skipped))
            else {
                tracing::warn!("stagger schedule ran past the clock range; stopping");
                self.handle.cancel();
                break;
            };
            self.cycle_start = cycle_start;
            self.next_index = 0;
            self.cycles += u64::from(skipped) + 1;
            tracing::trace!(cycle = self.cycles, "stagger cycle re-armed");
        }
        fired
    }

    /// Instant of the next trigger or re-arm; `None` once cancelled.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.handle.is_cancelled() {
            return None;
        }
        if self.next_index < self.tile_count {
            self.trigger_at(self.next_index)
        } else {
            self.rearm_at()
        }
    }
}
