//! Capability model for the events emitted by a Gherkin engine.
//!
//! The translator never depends on an engine's concrete types. Engines adapt
//! their own objects to the small traits below: an event exposes its name and
//! a keyed payload, and the payload entities expose names and outcome
//! predicates.

use std::fmt;

use serde::Deserialize;

/// A feature as seen by listeners.
pub trait Feature {
    /// Display name declared after `Feature:`.
    fn name(&self) -> &str;
}

/// A scenario as seen by listeners.
pub trait Scenario {
    /// Display name declared after `Scenario:`.
    fn name(&self) -> &str;
}

/// A step as seen by listeners.
pub trait Step {
    /// Step text without its keyword.
    fn name(&self) -> &str;
}

/// Terminal status of one executed step.
///
/// A step failed when none of the four predicates hold; only then is
/// [`failure`](Self::failure) meaningful.
pub trait StepOutcome {
    /// The step ran and passed.
    fn is_successful(&self) -> bool;
    /// The step reported itself as pending.
    fn is_pending(&self) -> bool;
    /// No step definition matched.
    fn is_undefined(&self) -> bool;
    /// The step did not run.
    fn is_skipped(&self) -> bool;
    /// Details of the failure, when the engine captured any.
    fn failure(&self) -> Option<StepFailure>;

    /// Whether the outcome falls outside every other status.
    fn is_failed(&self) -> bool {
        !(self.is_successful() || self.is_pending() || self.is_undefined() || self.is_skipped())
    }
}

/// Error captured for a failed step.
///
/// # Examples
///
/// ```
/// use karma_bdd::events::StepFailure;
///
/// let failure = StepFailure::new("expected 2, got 3").with_stack("at step.rs:4");
/// assert_eq!(failure.to_string(), "expected 2, got 3");
/// assert_eq!(failure.stack(), Some("at step.rs:4"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StepFailure {
    message: String,
    #[serde(default)]
    stack: Option<String>,
}

impl StepFailure {
    /// Create a failure carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Attach a stack trace.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Stack trace, if the engine provided one.
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Key naming one payload entry of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKey {
    /// The feature being entered.
    Feature,
    /// The scenario being entered.
    Scenario,
    /// The step being entered.
    Step,
    /// The outcome of the step that just ran.
    StepResult,
}

impl PayloadKey {
    /// Wire name of the key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Scenario => "scenario",
            Self::Step => "step",
            Self::StepResult => "stepResult",
        }
    }
}

/// Borrowed payload entity returned by [`EngineEvent::payload_item`].
#[derive(Clone, Copy)]
pub enum PayloadItem<'a> {
    /// Feature payload.
    Feature(&'a dyn Feature),
    /// Scenario payload.
    Scenario(&'a dyn Scenario),
    /// Step payload.
    Step(&'a dyn Step),
    /// Step outcome payload.
    StepResult(&'a dyn StepOutcome),
}

impl fmt::Debug for PayloadItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feature(feature) => f.debug_tuple("Feature").field(&feature.name()).finish(),
            Self::Scenario(scenario) => {
                f.debug_tuple("Scenario").field(&scenario.name()).finish()
            }
            Self::Step(step) => f.debug_tuple("Step").field(&step.name()).finish(),
            Self::StepResult(_) => f.write_str("StepResult"),
        }
    }
}

/// One event in an engine's run stream.
pub trait EngineEvent {
    /// Event-kind name, e.g. `BeforeScenario`.
    fn name(&self) -> &str;
    /// Look up a payload entry by key.
    fn payload_item(&self, key: PayloadKey) -> Option<PayloadItem<'_>>;
}

/// Event kinds the result translator reacts to.
///
/// # Examples
///
/// ```
/// use karma_bdd::events::EventKind;
///
/// assert_eq!(EventKind::from_name("StepResult"), Some(EventKind::StepResult));
/// assert_eq!(EventKind::from_name("AfterFeature"), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A feature is about to run.
    BeforeFeature,
    /// A scenario is about to run.
    BeforeScenario,
    /// A step is about to run.
    BeforeStep,
    /// A step finished running.
    StepResult,
}

impl EventKind {
    /// Resolve an event name against the fixed vocabulary.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "BeforeFeature" => Some(Self::BeforeFeature),
            "BeforeScenario" => Some(Self::BeforeScenario),
            "BeforeStep" => Some(Self::BeforeStep),
            "StepResult" => Some(Self::StepResult),
            _ => None,
        }
    }

    /// Event name as emitted by engines.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeFeature => "BeforeFeature",
            Self::BeforeScenario => "BeforeScenario",
            Self::BeforeStep => "BeforeStep",
            Self::StepResult => "StepResult",
        }
    }

    /// Payload entry carrying this kind's entity.
    #[must_use]
    pub const fn payload_key(&self) -> PayloadKey {
        match self {
            Self::BeforeFeature => PayloadKey::Feature,
            Self::BeforeScenario => PayloadKey::Scenario,
            Self::BeforeStep => PayloadKey::Step,
            Self::StepResult => PayloadKey::StepResult,
        }
    }
}

/// Named entity carried by a recorded event.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Named {
    name: String,
}

impl Named {
    /// Wrap a display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Feature for Named {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Scenario for Named {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Step for Named {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Status recorded for a step outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The step passed. Logs may also spell this `passed`.
    #[serde(alias = "passed")]
    Successful,
    /// The step is pending.
    Pending,
    /// No definition matched the step.
    Undefined,
    /// The step did not run.
    Skipped,
    /// The step failed.
    Failed,
}

/// Owned step outcome, as replayed from a log or produced by the dry-run
/// engine.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RecordedOutcome {
    status: OutcomeStatus,
    #[serde(default)]
    failure: Option<StepFailure>,
}

impl RecordedOutcome {
    /// Outcome with the given status and no failure details.
    #[must_use]
    pub fn new(status: OutcomeStatus) -> Self {
        Self {
            status,
            failure: None,
        }
    }

    /// Failed outcome carrying `failure`.
    #[must_use]
    pub fn failed(failure: StepFailure) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            failure: Some(failure),
        }
    }
}

impl StepOutcome for RecordedOutcome {
    fn is_successful(&self) -> bool {
        self.status == OutcomeStatus::Successful
    }

    fn is_pending(&self) -> bool {
        self.status == OutcomeStatus::Pending
    }

    fn is_undefined(&self) -> bool {
        self.status == OutcomeStatus::Undefined
    }

    fn is_skipped(&self) -> bool {
        self.status == OutcomeStatus::Skipped
    }

    fn failure(&self) -> Option<StepFailure> {
        self.failure.clone()
    }
}

/// Owned event with optional payload entries.
///
/// Recorded events deserialise from one JSON object per event:
///
/// ```
/// use karma_bdd::events::{EngineEvent, PayloadKey, RecordedEvent};
///
/// let event: RecordedEvent =
///     serde_json::from_str(r#"{"name":"BeforeFeature","feature":{"name":"Login"}}"#).unwrap();
/// assert_eq!(event.name(), "BeforeFeature");
/// assert!(event.payload_item(PayloadKey::Feature).is_some());
/// assert!(event.payload_item(PayloadKey::Scenario).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    name: String,
    #[serde(default)]
    feature: Option<Named>,
    #[serde(default)]
    scenario: Option<Named>,
    #[serde(default)]
    step: Option<Named>,
    #[serde(default)]
    step_result: Option<RecordedOutcome>,
}

impl RecordedEvent {
    /// Event with the given name and no payload.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feature: None,
            scenario: None,
            step: None,
            step_result: None,
        }
    }

    /// `BeforeFeature` event.
    #[must_use]
    pub fn before_feature(name: impl Into<String>) -> Self {
        Self {
            feature: Some(Named::new(name)),
            ..Self::bare(EventKind::BeforeFeature.as_str())
        }
    }

    /// `BeforeScenario` event.
    #[must_use]
    pub fn before_scenario(name: impl Into<String>) -> Self {
        Self {
            scenario: Some(Named::new(name)),
            ..Self::bare(EventKind::BeforeScenario.as_str())
        }
    }

    /// `BeforeStep` event.
    #[must_use]
    pub fn before_step(name: impl Into<String>) -> Self {
        Self {
            step: Some(Named::new(name)),
            ..Self::bare(EventKind::BeforeStep.as_str())
        }
    }

    /// `StepResult` event.
    #[must_use]
    pub fn step_result(outcome: RecordedOutcome) -> Self {
        Self {
            step_result: Some(outcome),
            ..Self::bare(EventKind::StepResult.as_str())
        }
    }
}

impl EngineEvent for RecordedEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn payload_item(&self, key: PayloadKey) -> Option<PayloadItem<'_>> {
        match key {
            PayloadKey::Feature => self
                .feature
                .as_ref()
                .map(|f| PayloadItem::Feature(f as &dyn Feature)),
            PayloadKey::Scenario => self
                .scenario
                .as_ref()
                .map(|s| PayloadItem::Scenario(s as &dyn Scenario)),
            PayloadKey::Step => self.step.as_ref().map(|s| PayloadItem::Step(s as &dyn Step)),
            PayloadKey::StepResult => self
                .step_result
                .as_ref()
                .map(|r| PayloadItem::StepResult(r as &dyn StepOutcome)),
        }
    }
}
