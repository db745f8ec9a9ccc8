//! Listeners consuming an engine's event stream.
//!
//! [`ResultTranslator`] turns step outcomes into result records for a
//! [`ReportingSink`], applying the scenario's directives when classifying
//! pending steps. Engines hand every event to every listener together with a
//! [`Continuation`]; a listener resumes it exactly once before returning, and
//! the engine only moves on after that.

use std::fmt;

use crate::config::{Config, ElapsedOrigin};
use crate::directives::{ALLOW_PENDING, DirectiveSettings};
use crate::events::{EngineEvent, EventKind, PayloadItem, StepOutcome};
use crate::sink::{ReportingSink, StepReport};
use crate::state::{
    Clock, CurrentFeature, CurrentScenario, CurrentStep, RunState, SystemClock, elapsed_millis,
};

/// Callback advancing the engine to its next event.
///
/// Consumed on resumption, so it cannot run twice.
pub struct Continuation<'a> {
    resume: Box<dyn FnOnce() + 'a>,
}

impl<'a> Continuation<'a> {
    /// Wrap the engine's resume callback.
    pub fn new(resume: impl FnOnce() + 'a) -> Self {
        Self {
            resume: Box::new(resume),
        }
    }

    /// Hand control back to the engine.
    pub fn resume(self) {
        (self.resume)();
    }
}

impl fmt::Debug for Continuation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Continuation")
    }
}

/// Receiver of engine events.
pub trait Listener {
    /// Handle `event`, then resume `next`.
    fn hear(&mut self, event: &dyn EngineEvent, next: Continuation<'_>);
}

/// Listener logging every event it hears at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceListener;

impl Listener for TraceListener {
    fn hear(&mut self, event: &dyn EngineEvent, next: Continuation<'_>) {
        log::debug!(target: "karma_bdd::events", "{}", event.name());
        next.resume();
    }
}

/// Why an event had no effect on the run state.
#[derive(Debug)]
enum Dropped {
    MissingPayload(EventKind),
    NoCurrent(&'static str),
}

impl fmt::Display for Dropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPayload(kind) => write!(
                f,
                "{} event carries no '{}' payload",
                kind.as_str(),
                kind.payload_key().as_str()
            ),
            Self::NoCurrent(entity) => write!(f, "step result arrived with no current {entity}"),
        }
    }
}

/// Translates run events into result records.
///
/// # Examples
///
/// ```
/// use karma_bdd::directives::DirectiveSettings;
/// use karma_bdd::events::{OutcomeStatus, RecordedEvent, RecordedOutcome};
/// use karma_bdd::listener::{Continuation, Listener, ResultTranslator};
/// use karma_bdd::sink::CollectingSink;
///
/// let settings = DirectiveSettings::extract(
///     "Feature: Login\nScenario: Draft\n#karma-bdd allowPending",
///     None,
/// );
/// let mut sink = CollectingSink::default();
/// let mut translator = ResultTranslator::new(&mut sink, &settings);
/// for event in [
///     RecordedEvent::before_feature("Login"),
///     RecordedEvent::before_scenario("Draft"),
///     RecordedEvent::before_step("a step"),
///     RecordedEvent::step_result(RecordedOutcome::new(OutcomeStatus::Pending)),
/// ] {
///     translator.hear(&event, Continuation::new(|| {}));
/// }
/// drop(translator);
/// assert!(sink.results().all(|report| report.success));
/// ```
pub struct ResultTranslator<'a, S, C = SystemClock> {
    sink: S,
    settings: &'a DirectiveSettings,
    clock: C,
    elapsed_origin: ElapsedOrigin,
    latch_scenario_failure: bool,
    state: RunState,
}

impl<'a, S: ReportingSink> ResultTranslator<'a, S> {
    /// Create a translator using the default configuration and system clock.
    pub fn new(sink: S, settings: &'a DirectiveSettings) -> Self {
        Self::with_clock(sink, settings, &Config::default(), SystemClock)
    }
}

impl<'a, S: ReportingSink, C: Clock> ResultTranslator<'a, S, C> {
    /// Create a translator with explicit configuration and clock.
    pub fn with_clock(sink: S, settings: &'a DirectiveSettings, config: &Config, clock: C) -> Self {
        Self {
            sink,
            settings,
            clock,
            elapsed_origin: config.elapsed_origin,
            latch_scenario_failure: config.latch_scenario_failure,
            state: RunState::default(),
        }
    }

    /// Current run state.
    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    fn dispatch(&mut self, event: &dyn EngineEvent) -> Result<(), Dropped> {
        let Some(kind) = EventKind::from_name(event.name()) else {
            return Ok(());
        };
        let payload = event
            .payload_item(kind.payload_key())
            .ok_or(Dropped::MissingPayload(kind))?;
        match (kind, payload) {
            (EventKind::BeforeFeature, PayloadItem::Feature(feature)) => {
                self.state.feature = Some(CurrentFeature {
                    name: feature.name().to_owned(),
                });
                Ok(())
            }
            (EventKind::BeforeScenario, PayloadItem::Scenario(scenario)) => {
                self.enter_scenario(scenario.name());
                Ok(())
            }
            (EventKind::BeforeStep, PayloadItem::Step(step)) => {
                self.state.step = Some(CurrentStep {
                    name: step.name().to_owned(),
                    started_at: self.clock.now(),
                });
                Ok(())
            }
            (EventKind::StepResult, PayloadItem::StepResult(outcome)) => self.conclude_step(outcome),
            _ => Err(Dropped::MissingPayload(kind)),
        }
    }

    fn enter_scenario(&mut self, name: &str) {
        self.state.scenario = Some(CurrentScenario {
            name: name.to_owned(),
            started_at: self.clock.now(),
        });
        if self.latch_scenario_failure {
            self.state.scenario_success = true;
        }
    }

    fn conclude_step(&mut self, outcome: &dyn StepOutcome) -> Result<(), Dropped> {
        let total = self.state.count_step();
        self.sink.report_progress(total);

        let feature = self
            .state
            .feature
            .as_ref()
            .map(|feature| feature.name.clone())
            .ok_or(Dropped::NoCurrent("feature"))?;
        let scenario = self
            .state
            .scenario
            .as_ref()
            .map(|scenario| scenario.name.clone())
            .ok_or(Dropped::NoCurrent("scenario"))?;

        let allow_pending = self
            .settings
            .allows(&feature, &scenario, ALLOW_PENDING);
        let success = self.state.scenario_success
            && (outcome.is_successful() || (allow_pending && outcome.is_pending()));
        let skipped = outcome.is_skipped();

        if outcome.is_failed() {
            let step = self
                .state
                .step
                .as_ref()
                .map(|step| step.name.clone())
                .unwrap_or_default();
            let details = outcome.failure().map_or_else(String::new, |failure| {
                failure
                    .stack()
                    .map_or_else(|| failure.to_string(), str::to_owned)
            });
            self.state.record_failure(&step, &details);
            if self.latch_scenario_failure {
                self.state.scenario_success = false;
            }
        }
        self.state.scenario_skipped = skipped;

        let time = if skipped { 0 } else { self.elapsed_millis() };
        let report = StepReport {
            description: scenario,
            log: self.state.log.clone(),
            suite: vec![feature],
            success,
            skipped,
            time,
        };
        self.sink.report_result(&report);
        Ok(())
    }

    fn elapsed_millis(&self) -> u64 {
        let started_at = match self.elapsed_origin {
            ElapsedOrigin::Scenario => self.state.scenario.as_ref().map(|s| s.started_at),
            ElapsedOrigin::Step => self.state.step.as_ref().map(|s| s.started_at),
        };
        started_at.map_or(0, |start| elapsed_millis(start, self.clock.now()))
    }
}

impl<S: ReportingSink, C: Clock> Listener for ResultTranslator<'_, S, C> {
    fn hear(&mut self, event: &dyn EngineEvent, next: Continuation<'_>) {
        if let Err(dropped) = self.dispatch(event) {
            log::debug!("ignoring event: {dropped}");
        }
        next.resume();
    }
}
