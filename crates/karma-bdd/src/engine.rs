//! Engines driving listeners through a run.
//!
//! An engine owns iteration: it hands each event to each attached listener
//! and only advances once that listener resumed the continuation it was
//! given. Two engines ship with the crate: [`DryRunEngine`] walks parsed
//! features and reports every step as skipped, and [`ReplayEngine`] replays a
//! recorded event log.

use std::cell::Cell;
use std::io::BufRead;

use gherkin::GherkinEnv;

use crate::error::EngineError;
use crate::events::{EngineEvent, OutcomeStatus, RecordedEvent, RecordedOutcome};
use crate::listener::{Continuation, Listener};
use crate::runner::FeatureFile;

/// Source of run events.
pub trait Engine {
    /// Run `features`, delivering every event to `listeners` in order.
    ///
    /// # Errors
    ///
    /// Returns an error when the run cannot proceed, including when a
    /// listener fails to resume it.
    fn start(
        &mut self,
        features: &[FeatureFile],
        listeners: &mut [&mut dyn Listener],
    ) -> Result<(), EngineError>;
}

/// Deliver `event` to each listener, waiting for each to resume.
///
/// # Errors
///
/// Returns [`EngineError::Stalled`] when a listener returns without resuming
/// its continuation.
pub fn deliver(
    event: &dyn EngineEvent,
    listeners: &mut [&mut dyn Listener],
) -> Result<(), EngineError> {
    for listener in listeners.iter_mut() {
        let resumed = Cell::new(false);
        listener.hear(event, Continuation::new(|| resumed.set(true)));
        if !resumed.get() {
            return Err(EngineError::Stalled {
                event: event.name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Engine that walks each feature without running any step.
///
/// Background steps are emitted ahead of every scenario's own steps, rule
/// scenarios follow the feature's top-level scenarios, and every step
/// concludes as skipped. `After*` events are emitted as well; the result
/// translator ignores them.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunEngine;

impl Engine for DryRunEngine {
    fn start(
        &mut self,
        features: &[FeatureFile],
        listeners: &mut [&mut dyn Listener],
    ) -> Result<(), EngineError> {
        for file in features {
            let feature = parse_feature(file)?;
            log::debug!("dry run of feature '{}'", feature.name);
            for event in dry_run_events(&feature) {
                deliver(&event, listeners)?;
            }
        }
        Ok(())
    }
}

fn parse_feature(file: &FeatureFile) -> Result<gherkin::Feature, EngineError> {
    let mut text = file.contents().to_owned();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    gherkin::Feature::parse(&text, GherkinEnv::default()).map_err(|err| EngineError::Parse {
        path: file.path().to_path_buf(),
        message: err.to_string(),
    })
}

fn dry_run_events(feature: &gherkin::Feature) -> Vec<RecordedEvent> {
    let mut events = vec![RecordedEvent::before_feature(&feature.name)];
    let background = feature
        .background
        .as_ref()
        .map(|bg| bg.steps.as_slice())
        .unwrap_or_default();

    for scenario in &feature.scenarios {
        push_scenario(&mut events, scenario, &[background]);
    }
    for rule in &feature.rules {
        let rule_background = rule
            .background
            .as_ref()
            .map(|bg| bg.steps.as_slice())
            .unwrap_or_default();
        for scenario in &rule.scenarios {
            push_scenario(&mut events, scenario, &[background, rule_background]);
        }
    }

    events.push(RecordedEvent::bare("AfterFeature"));
    events
}

fn push_scenario(
    events: &mut Vec<RecordedEvent>,
    scenario: &gherkin::Scenario,
    backgrounds: &[&[gherkin::Step]],
) {
    events.push(RecordedEvent::before_scenario(&scenario.name));
    let steps = backgrounds
        .iter()
        .flat_map(|steps| steps.iter())
        .chain(&scenario.steps);
    for step in steps {
        events.push(RecordedEvent::before_step(&step.value));
        events.push(RecordedEvent::step_result(RecordedOutcome::new(
            OutcomeStatus::Skipped,
        )));
        events.push(RecordedEvent::bare("AfterStep"));
    }
    events.push(RecordedEvent::bare("AfterScenario"));
}

/// Engine replaying a recorded event stream.
///
/// The features passed to [`Engine::start`] are not consulted; they only
/// contribute directives through the runner.
#[derive(Clone, Debug, Default)]
pub struct ReplayEngine {
    events: Vec<RecordedEvent>,
}

impl ReplayEngine {
    /// Replay `events` in order.
    #[must_use]
    pub fn new(events: Vec<RecordedEvent>) -> Self {
        Self { events }
    }

    /// Read one JSON event per line, skipping blank lines.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] when reading fails and
    /// [`EngineError::Decode`] when a line is not a valid event.
    ///
    /// # Examples
    ///
    /// ```
    /// use karma_bdd::engine::ReplayEngine;
    ///
    /// let log = "{\"name\":\"BeforeFeature\",\"feature\":{\"name\":\"F\"}}\n\n";
    /// let engine = ReplayEngine::from_json_lines(log.as_bytes()).unwrap();
    /// assert_eq!(engine.len(), 1);
    /// ```
    pub fn from_json_lines(reader: impl BufRead) -> Result<Self, EngineError> {
        let mut events = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|source| EngineError::Decode {
                line: index + 1,
                source,
            })?;
            events.push(event);
        }
        Ok(Self { events })
    }

    /// Number of events to replay.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there is nothing to replay.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Engine for ReplayEngine {
    fn start(
        &mut self,
        _features: &[FeatureFile],
        listeners: &mut [&mut dyn Listener],
    ) -> Result<(), EngineError> {
        for event in &self.events {
            deliver(event, listeners)?;
        }
        Ok(())
    }
}
