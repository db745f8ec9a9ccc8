//! Runtime configuration for the result translator and directive extraction.
//!
//! Every setting may be overridden through `KARMA_BDD_*` environment
//! variables. The defaults reproduce the observed reporting behaviour except
//! for the timing origin, which measures from scenario entry.

use std::env;

use crate::directives::{DEFAULT_MARKER, DirectiveSyntax};
use crate::error::ConfigError;

const MARKER_VAR: &str = "KARMA_BDD_DIRECTIVE_MARKER";
const ELAPSED_VAR: &str = "KARMA_BDD_ELAPSED_ORIGIN";
const LATCH_VAR: &str = "KARMA_BDD_LATCH_FAILURES";

/// Instant that a reported step time is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ElapsedOrigin {
    /// Time since the enclosing scenario was entered.
    #[default]
    Scenario,
    /// Time since the step itself was entered.
    Step,
}

impl ElapsedOrigin {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scenario" => Some(Self::Scenario),
            "step" => Some(Self::Step),
            _ => None,
        }
    }
}

/// Settings shared by the runner and the result translator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Marker introducing directive comments (`#<marker> token ...`).
    pub directive_marker: String,
    /// Where step timings are measured from.
    pub elapsed_origin: ElapsedOrigin,
    /// Whether a failed step marks the rest of its scenario unsuccessful.
    ///
    /// Disabled by default: the success gate then stays open for the whole
    /// run.
    pub latch_scenario_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directive_marker: DEFAULT_MARKER.to_owned(),
            elapsed_origin: ElapsedOrigin::default(),
            latch_scenario_failure: false,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Reads `KARMA_BDD_DIRECTIVE_MARKER`, `KARMA_BDD_ELAPSED_ORIGIN` and
    /// `KARMA_BDD_LATCH_FAILURES`, falling back to defaults for unset
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable holds an unsupported
    /// value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable holds an unsupported
    /// value.
    ///
    /// # Examples
    ///
    /// ```
    /// use karma_bdd::config::{Config, ElapsedOrigin};
    ///
    /// let config = Config::from_lookup(|key| {
    ///     (key == "KARMA_BDD_ELAPSED_ORIGIN").then(|| "step".to_string())
    /// })
    /// .unwrap();
    /// assert_eq!(config.elapsed_origin, ElapsedOrigin::Step);
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(marker) = lookup(MARKER_VAR) {
            let marker = marker.trim();
            if marker.is_empty() || marker.contains(char::is_whitespace) {
                return Err(invalid(MARKER_VAR, marker, "a non-empty word"));
            }
            marker.clone_into(&mut config.directive_marker);
        }

        if let Some(value) = lookup(ELAPSED_VAR) {
            config.elapsed_origin = ElapsedOrigin::parse(&value)
                .ok_or_else(|| invalid(ELAPSED_VAR, &value, "scenario or step"))?;
        }

        if let Some(value) = lookup(LATCH_VAR) {
            config.latch_scenario_failure = parse_env_bool(&value)
                .ok_or_else(|| invalid(LATCH_VAR, &value, "a boolean"))?;
        }

        Ok(config)
    }

    /// Compile the directive recognisers for the configured marker.
    #[must_use]
    pub fn directive_syntax(&self) -> DirectiveSyntax {
        DirectiveSyntax::with_marker(&self.directive_marker)
    }
}

fn invalid(key: &'static str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_owned(),
        expected,
    }
}

fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
