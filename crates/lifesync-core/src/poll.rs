//! Poll scheduling: when the next automatic synchronization is due.
//!
//! The scheduler is driven by a fixed wall-clock tick (one second in the
//! default configuration) and never looks at the clock itself, which keeps
//! it deterministic under test.
//!
//! # Adaptive cadence
//!
//! A single countdown starts at `initial_countdown_secs`. When it reaches
//! zero a due event fires, the countdown resets to the current rung of the
//! [`BackoffLadder`], and the ladder steps forward. With the default
//! configuration the observed spacing is `3, 15, 30, 60, 60, ...`: the
//! client slows down over the process lifetime and never speeds back up.
//!
//! # Fixed dual cadence
//!
//! Two independent countdowns, one for fetches and one for steps, each
//! reloaded with its own fixed period.

use crate::config::{ConfigError, PollConfig, PollMode, validate_ladder};

/// An ordered escalation table of intervals, in seconds.
///
/// The position only moves forward; stepping at the top rung is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffLadder {
    rungs: Vec<u64>,
    position: usize,
}

impl BackoffLadder {
    /// Build a ladder positioned at its first rung.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `rungs` is empty, contains a
    /// zero, or decreases anywhere.
    pub fn new(rungs: Vec<u64>) -> Result<Self, ConfigError> {
        validate_ladder(&rungs)?;
        Ok(Self { rungs, position: 0 })
    }

    /// The interval at the current position.
    pub fn current(&self) -> u64 {
        self.rungs
            .get(self.position)
            .or_else(|| self.rungs.last())
            .copied()
            .unwrap_or(1)
    }

    /// Move one rung up, staying put at the top.
    pub fn step_forward(&mut self) {
        let next = self.position.saturating_add(1);
        if next < self.rungs.len() {
            self.position = next;
        }
    }
}

/// What a due tick asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DueEvent {
    /// A snapshot fetch is due.
    pub fetch: bool,
    /// A step is due (honoured only while running).
    pub step: bool,
}

/// A countdown reloaded with a fixed period.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FixedTimer {
    remaining: u64,
    period: u64,
}

impl FixedTimer {
    const fn new(period: u64) -> Self {
        Self {
            remaining: period,
            period,
        }
    }

    fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return false;
        }
        self.remaining = self.period;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cadence {
    Adaptive {
        countdown: u64,
        ladder: BackoffLadder,
    },
    FixedDual {
        fetch: FixedTimer,
        step: FixedTimer,
    },
}

/// Decides, one tick at a time, whether a synchronization is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollScheduler {
    cadence: Cadence,
    due_count: u64,
}

impl PollScheduler {
    /// Build a scheduler from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configured cadence is
    /// unusable (zero countdown, bad ladder, zero period).
    pub fn new(config: &PollConfig) -> Result<Self, ConfigError> {
        let cadence = match config.mode {
            PollMode::Adaptive => {
                if config.initial_countdown_secs == 0 {
                    return Err(ConfigError::Invalid {
                        reason: "poll.initial_countdown_secs must be at least 1".to_owned(),
                    });
                }
                Cadence::Adaptive {
                    countdown: config.initial_countdown_secs,
                    ladder: BackoffLadder::new(config.backoff_secs.clone())?,
                }
            }
            PollMode::FixedDual => {
                if config.fetch_interval_secs == 0 || config.step_interval_secs == 0 {
                    return Err(ConfigError::Invalid {
                        reason: "fixed dual periods must be at least 1".to_owned(),
                    });
                }
                Cadence::FixedDual {
                    fetch: FixedTimer::new(config.fetch_interval_secs),
                    step: FixedTimer::new(config.step_interval_secs),
                }
            }
        };
        Ok(Self {
            cadence,
            due_count: 0,
        })
    }

    /// Advance one tick. Returns the due event when something is due.
    pub fn tick(&mut self) -> Option<DueEvent> {
        let due = match &mut self.cadence {
            Cadence::Adaptive { countdown, ladder } => {
                *countdown = countdown.saturating_sub(1);
                if *countdown > 0 {
                    return None;
                }
                *countdown = ladder.current();
                ladder.step_forward();
                DueEvent {
                    fetch: true,
                    step: true,
                }
            }
            Cadence::FixedDual { fetch, step } => {
                let due = DueEvent {
                    fetch: fetch.tick(),
                    step: step.tick(),
                };
                if !due.fetch && !due.step {
                    return None;
                }
                due
            }
        };
        self.due_count = self.due_count.saturating_add(1);
        Some(due)
    }

    /// Ticks until the next due event.
    pub fn countdown_secs(&self) -> u64 {
        match &self.cadence {
            Cadence::Adaptive { countdown, .. } => *countdown,
            Cadence::FixedDual { fetch, step } => fetch.remaining.min(step.remaining),
        }
    }

    /// The interval the next reload will use.
    pub fn interval_secs(&self) -> u64 {
        match &self.cadence {
            Cadence::Adaptive { ladder, .. } => ladder.current(),
            Cadence::FixedDual { fetch, .. } => fetch.period,
        }
    }

    /// Number of due events fired so far.
    pub const fn due_count(&self) -> u64 {
        self.due_count
    }

    /// Whether a resolved step should be followed by a snapshot fetch.
    ///
    /// In adaptive mode the due event already dispatches a fetch next to
    /// the step; in fixed dual mode the step timer fires alone.
    pub const fn refresh_after_step(&self) -> bool {
        matches!(self.cadence, Cadence::FixedDual { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn adaptive() -> PollScheduler {
        PollScheduler::new(&PollConfig::default()).unwrap()
    }

    /// Tick until the next due event, returning how many ticks it took.
    fn ticks_until_due(scheduler: &mut PollScheduler) -> u64 {
        let mut ticks = 0_u64;
        loop {
            ticks = ticks.saturating_add(1);
            if scheduler.tick().is_some() {
                return ticks;
            }
            assert!(ticks < 1000, "scheduler never fired");
        }
    }

    #[test]
    fn ladder_steps_forward_and_plateaus() {
        let mut ladder = BackoffLadder::new(vec![15, 30, 60]).unwrap();
        assert_eq!(ladder.current(), 15);
        ladder.step_forward();
        assert_eq!(ladder.current(), 30);
        ladder.step_forward();
        assert_eq!(ladder.current(), 60);
        ladder.step_forward();
        ladder.step_forward();
        assert_eq!(ladder.current(), 60);
    }

    #[test]
    fn first_due_after_initial_countdown() {
        let mut scheduler = adaptive();
        assert_eq!(scheduler.countdown_secs(), 3);
        assert_eq!(scheduler.tick(), None);
        assert_eq!(scheduler.tick(), None);
        assert_eq!(
            scheduler.tick(),
            Some(DueEvent {
                fetch: true,
                step: true
            })
        );
        assert_eq!(scheduler.due_count(), 1);
    }

    #[test]
    fn backoff_escalates_then_plateaus() {
        let mut scheduler = adaptive();
        assert_eq!(ticks_until_due(&mut scheduler), 3);
        assert_eq!(scheduler.interval_secs(), 30);

        // Interval starts at 15 and escalates 15 -> 30 -> 60.
        assert_eq!(ticks_until_due(&mut scheduler), 15);
        assert_eq!(scheduler.interval_secs(), 60);
        assert_eq!(ticks_until_due(&mut scheduler), 30);
        assert_eq!(ticks_until_due(&mut scheduler), 60);
        assert_eq!(ticks_until_due(&mut scheduler), 60);
        assert_eq!(scheduler.interval_secs(), 60);
    }

    #[test]
    fn countdown_reloads_with_current_interval() {
        let mut scheduler = adaptive();
        assert_eq!(scheduler.interval_secs(), 15);
        let _ = ticks_until_due(&mut scheduler);
        assert_eq!(scheduler.countdown_secs(), 15);
        let _ = ticks_until_due(&mut scheduler);
        assert_eq!(scheduler.countdown_secs(), 30);
        let _ = ticks_until_due(&mut scheduler);
        assert_eq!(scheduler.countdown_secs(), 60);
    }

    #[test]
    fn fixed_dual_fires_independently() {
        let config = PollConfig {
            mode: PollMode::FixedDual,
            ..PollConfig::default()
        };
        let mut scheduler = PollScheduler::new(&config).unwrap();
        assert!(scheduler.refresh_after_step());

        let mut fetches = 0_u32;
        let mut steps = 0_u32;
        let mut both = 0_u32;
        for _ in 0..120 {
            if let Some(due) = scheduler.tick() {
                if due.fetch {
                    fetches = fetches.saturating_add(1);
                }
                if due.step {
                    steps = steps.saturating_add(1);
                }
                if due.fetch && due.step {
                    both = both.saturating_add(1);
                }
            }
        }
        assert_eq!(fetches, 4);
        assert_eq!(steps, 2);
        assert_eq!(both, 2);
        assert_eq!(scheduler.interval_secs(), 30);
    }

    #[test]
    fn adaptive_does_not_refresh_after_step() {
        assert!(!adaptive().refresh_after_step());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = PollConfig {
            initial_countdown_secs: 0,
            ..PollConfig::default()
        };
        assert!(PollScheduler::new(&config).is_err());

        let config = PollConfig {
            backoff_secs: vec![60, 15],
            ..PollConfig::default()
        };
        assert!(PollScheduler::new(&config).is_err());
    }
}
