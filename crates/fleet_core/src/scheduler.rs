//! Pause/resume-aware refresh cadence.
//!
//! The scheduler owns no timer. The caller feeds it elapsed time through
//! [`RefreshScheduler::tick`] and page/operator events through the setters, and
//! starts a fetch whenever a [`RefreshTrigger`] comes back. At most one cycle is
//! in flight; triggers that arrive meanwhile are coalesced into one follow-up.

use std::time::Duration;

pub type CycleId = u64;

pub const DEFAULT_CADENCE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Counting,
    Fetching,
    Paused,
}

/// Instruction to start refresh cycle `cycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTrigger {
    pub cycle: CycleId,
    /// Background refresh without a page-level loading state.
    pub silent: bool,
}

/// What [`RefreshScheduler::complete`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The completed cycle was the in-flight one.
    Accepted { follow_up: Option<RefreshTrigger> },
    /// Unknown or superseded cycle; its result must be discarded.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Counting { remaining: Duration },
    Fetching { cycle: CycleId, from_idle: bool },
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshScheduler {
    cadence: Duration,
    phase: Phase,
    auto_refresh: bool,
    visible: bool,
    focused: bool,
    last_cycle: CycleId,
    /// `Some(silent)` when a refresh was requested during a fetch.
    queued: Option<bool>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE)
    }
}

impl RefreshScheduler {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            phase: Phase::Idle,
            auto_refresh: true,
            visible: true,
            focused: true,
            last_cycle: 0,
            queued: None,
        }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn phase(&self) -> SchedulerPhase {
        match self.phase {
            Phase::Idle => SchedulerPhase::Idle,
            Phase::Counting { .. } => SchedulerPhase::Counting,
            Phase::Fetching { .. } => SchedulerPhase::Fetching,
            Phase::Paused => SchedulerPhase::Paused,
        }
    }

    /// Time left until the next automatic refresh, while counting.
    pub fn remaining(&self) -> Option<Duration> {
        match self.phase {
            Phase::Counting { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> Option<CycleId> {
        match self.phase {
            Phase::Fetching { cycle, .. } => Some(cycle),
            _ => None,
        }
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn has_queued_refresh(&self) -> bool {
        self.queued.is_some()
    }

    /// Auto refresh is enabled and the page is visible and focused.
    pub fn is_active(&self) -> bool {
        self.auto_refresh && self.visible && self.focused
    }

    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = if self.is_active() {
                self.full_countdown()
            } else {
                Phase::Paused
            };
        }
    }

    /// Advances the countdown. Fires at most once per call.
    pub fn tick(&mut self, elapsed: Duration) -> Option<RefreshTrigger> {
        let Phase::Counting { remaining } = self.phase else {
            return None;
        };
        let remaining = remaining.saturating_sub(elapsed);
        if remaining.is_zero() {
            Some(self.begin_cycle(true, false))
        } else {
            self.phase = Phase::Counting { remaining };
            None
        }
    }

    /// Operator-initiated (or follow-up) refresh. Returns `None` and queues the
    /// request when a cycle is already in flight.
    pub fn request_refresh(&mut self, silent: bool) -> Option<RefreshTrigger> {
        match self.phase {
            Phase::Fetching { .. } => {
                self.queued = Some(match self.queued {
                    Some(queued_silent) => queued_silent && silent,
                    None => silent,
                });
                None
            }
            Phase::Idle => Some(self.begin_cycle(silent, true)),
            Phase::Counting { .. } | Phase::Paused => Some(self.begin_cycle(silent, false)),
        }
    }

    /// Settles cycle `cycle`. Pause requests made while it was in flight take
    /// effect here.
    pub fn complete(&mut self, cycle: CycleId) -> Completion {
        let Phase::Fetching {
            cycle: in_flight,
            from_idle,
        } = self.phase
        else {
            return Completion::Stale;
        };
        if in_flight != cycle {
            return Completion::Stale;
        }

        self.phase = if !self.is_active() {
            Phase::Paused
        } else if from_idle {
            Phase::Idle
        } else {
            self.full_countdown()
        };

        let follow_up = self
            .queued
            .take()
            .map(|silent| self.begin_cycle(silent, from_idle));
        Completion::Accepted { follow_up }
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
        self.reconcile();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.reconcile();
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.reconcile();
    }

    fn reconcile(&mut self) {
        let active = self.is_active();
        match self.phase {
            Phase::Idle | Phase::Counting { .. } if !active => self.phase = Phase::Paused,
            // Resuming never continues a stale countdown.
            Phase::Paused if active => self.phase = self.full_countdown(),
            _ => {}
        }
    }

    fn begin_cycle(&mut self, silent: bool, from_idle: bool) -> RefreshTrigger {
        self.last_cycle += 1;
        let cycle = self.last_cycle;
        self.phase = Phase::Fetching { cycle, from_idle };
        RefreshTrigger { cycle, silent }
    }

    fn full_countdown(&self) -> Phase {
        Phase::Counting {
            remaining: self.cadence,
        }
    }
}
