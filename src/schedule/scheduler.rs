use std::time::{Duration, Instant};

use crate::foundation::core::RenderScale;

/// Quiet period that collapses bursts of text edits into one redraw.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(80);
/// Delay for redraws the user expects to see right away.
pub const DEFAULT_IMMEDIATE: Duration = Duration::from_millis(8);
/// Delay between an export render and the preview redraw that follows it.
pub const DEFAULT_RESTORE: Duration = Duration::from_millis(16);
/// Frame interval of the animated policy (about 30 draws per second).
pub const DEFAULT_ANIMATION_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Urgency {
    /// Text edits: restart the debounce timer.
    Coalesce,
    /// Swatches, custom color, toggles, resize, extraction results.
    Immediate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawPolicy {
    /// Redraw only when invalidated.
    Debounced,
    /// Redraw on every tick; invalidations are served by the next tick.
    Animated { interval: Duration },
}

impl RedrawPolicy {
    pub fn animated() -> Self {
        Self::Animated {
            interval: DEFAULT_ANIMATION_INTERVAL,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerTimings {
    pub debounce: Duration,
    pub immediate: Duration,
    pub restore: Duration,
}

impl Default for SchedulerTimings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            immediate: DEFAULT_IMMEDIATE,
            restore: DEFAULT_RESTORE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Pending { due: Instant },
    Running,
}

/// Permission to draw one preview frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RedrawTicket {
    pub scale: RenderScale,
    /// Seconds since the scheduler started.
    pub phase: f64,
}

/// Coalescing redraw scheduler. Holds a single dirty flag, never a queue: however many
/// invalidations arrive, at most one redraw is pending at a time.
#[derive(Clone, Debug)]
pub struct RenderScheduler {
    state: SchedulerState,
    policy: RedrawPolicy,
    timings: SchedulerTimings,
    scale: RenderScale,
    started: Instant,
    next_tick: Instant,
    // Delay to apply once the running redraw completes.
    rerun: Option<Duration>,
    renders: u64,
}

impl RenderScheduler {
    pub fn new(now: Instant, scale: RenderScale, policy: RedrawPolicy) -> Self {
        Self::with_timings(now, scale, policy, SchedulerTimings::default())
    }

    pub fn with_timings(
        now: Instant,
        scale: RenderScale,
        policy: RedrawPolicy,
        timings: SchedulerTimings,
    ) -> Self {
        let state = match policy {
            RedrawPolicy::Debounced => SchedulerState::Idle,
            RedrawPolicy::Animated { .. } => SchedulerState::Pending { due: now },
        };
        Self {
            state,
            policy,
            timings,
            scale,
            started: now,
            next_tick: now,
            rerun: None,
            renders: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn policy(&self) -> RedrawPolicy {
        self.policy
    }

    pub fn scale(&self) -> RenderScale {
        self.scale
    }

    pub fn set_scale(&mut self, scale: RenderScale) {
        self.scale = scale;
    }

    /// Preview redraws completed so far.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Animation phase at `now`, in seconds since the scheduler started.
    pub fn phase_at(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started).as_secs_f64()
    }

    fn delay_for(&self, urgency: Urgency) -> Duration {
        match urgency {
            Urgency::Coalesce => self.timings.debounce,
            Urgency::Immediate => self.timings.immediate,
        }
    }

    /// Mark the preview dirty. The most recent request decides when the redraw is due.
    pub fn invalidate(&mut self, now: Instant, urgency: Urgency) {
        let delay = self.delay_for(urgency);
        self.arm(now, delay);
    }

    /// Preview redraw after an export render drew at another scale.
    pub fn schedule_restore(&mut self, now: Instant) {
        let delay = self.timings.restore;
        self.arm(now, delay);
    }

    fn arm(&mut self, now: Instant, delay: Duration) {
        match (self.state, self.policy) {
            (SchedulerState::Running, _) => self.rerun = Some(delay),
            // The next tick serves it; the tick keeps its cadence.
            (_, RedrawPolicy::Animated { .. }) => {}
            (_, RedrawPolicy::Debounced) => {
                self.state = SchedulerState::Pending { due: now + delay };
            }
        }
    }

    /// Hand out a ticket when a redraw is due. Moves to [`SchedulerState::Running`].
    pub fn poll(&mut self, now: Instant) -> Option<RedrawTicket> {
        let SchedulerState::Pending { due } = self.state else {
            return None;
        };
        if now < due {
            return None;
        }
        if let RedrawPolicy::Animated { interval } = self.policy {
            self.next_tick = next_tick_after(self.started, interval, now);
        }
        self.state = SchedulerState::Running;
        Some(RedrawTicket {
            scale: self.scale,
            phase: self.phase_at(now),
        })
    }

    /// The redraw handed out by [`RenderScheduler::poll`] has finished.
    pub fn complete(&mut self, now: Instant) {
        if self.state != SchedulerState::Running {
            return;
        }
        self.renders += 1;
        self.state = match (self.rerun.take(), self.policy) {
            (_, RedrawPolicy::Animated { .. }) => SchedulerState::Pending {
                due: self.next_tick,
            },
            (Some(delay), RedrawPolicy::Debounced) => SchedulerState::Pending { due: now + delay },
            (None, RedrawPolicy::Debounced) => SchedulerState::Idle,
        };
    }

    /// When the next redraw is due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Pending { due } => Some(due),
            _ => None,
        }
    }
}

fn next_tick_after(started: Instant, interval: Duration, now: Instant) -> Instant {
    if interval.is_zero() {
        return now;
    }
    let elapsed = now.saturating_duration_since(started).as_nanos();
    let step = interval.as_nanos();
    let ticks = elapsed / step + 1;
    let offset = step.saturating_mul(ticks);
    started + Duration::from_nanos(u64::try_from(offset).unwrap_or(u64::MAX))
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;
