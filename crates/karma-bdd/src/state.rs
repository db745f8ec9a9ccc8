//! Mutable state owned by one result translator for one run.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Source of wall-clock instants for timing steps.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Clock backed by [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Feature currently running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentFeature {
    /// Feature name.
    pub name: String,
}

/// Scenario currently running, stamped with its start instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentScenario {
    /// Scenario name.
    pub name: String,
    /// Instant the scenario was entered.
    pub started_at: Instant,
}

/// Step currently running, stamped with its start instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentStep {
    /// Step text.
    pub name: String,
    /// Instant the step was entered.
    pub started_at: Instant,
}

/// Pointers and accumulators updated as run events arrive.
///
/// The failure log and the step counter span the whole run; nothing is reset
/// when a new scenario starts.
#[derive(Debug)]
pub struct RunState {
    /// Feature most recently entered.
    pub feature: Option<CurrentFeature>,
    /// Scenario most recently entered.
    pub scenario: Option<CurrentScenario>,
    /// Step most recently entered.
    pub step: Option<CurrentStep>,
    /// Gate applied to every step classification.
    pub scenario_success: bool,
    /// Whether the last concluded step was skipped.
    pub scenario_skipped: bool,
    /// Formatted failure messages in the order they occurred.
    pub log: Vec<String>,
    /// Number of step results seen so far.
    pub total_steps: usize,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            feature: None,
            scenario: None,
            step: None,
            scenario_success: true,
            scenario_skipped: false,
            log: Vec::new(),
            total_steps: 0,
        }
    }
}

impl RunState {
    /// Record a failed step as `step name + newline + details`.
    pub fn record_failure(&mut self, step: &str, details: &str) {
        self.log.push(format!("{step}\n{details}"));
    }

    /// Advance the step counter and return its new value.
    pub fn count_step(&mut self) -> usize {
        self.total_steps = self.total_steps.saturating_add(1);
        self.total_steps
    }
}

/// Milliseconds between `start` and `end`, saturating at zero.
#[must_use]
pub fn elapsed_millis(start: Instant, end: Instant) -> u64 {
    let elapsed = end.saturating_duration_since(start);
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Clock that only moves when told to.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use karma_bdd::state::{Clock, ManualClock, elapsed_millis};
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_millis(40));
/// assert_eq!(elapsed_millis(start, clock.now()), 40);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    /// Start at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let now = self.now.get();
        self.now.set(now.checked_add(by).unwrap_or(now));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
