//! Command line configuration.
//!
//! Library settings come from [`karma_bdd::Config::from_env`]. The log level
//! is read from `KARMA_BDD_LOG_LEVEL`; `--log-level` takes precedence.

use std::env;

use karma_bdd::{Config, ConfigError};
use tracing::Level;

const LOG_LEVEL_VAR: &str = "KARMA_BDD_LOG_LEVEL";

/// Settings for one invocation.
#[derive(Debug, Clone)]
pub(crate) struct CliConfig {
    pub(crate) log_level: Level,
    pub(crate) run: Config,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            run: Config::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable contains an invalid value.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: parse_log_level(env::var(LOG_LEVEL_VAR).ok())?,
            run: Config::from_env()?,
        })
    }

    #[must_use]
    pub(crate) fn apply_overrides(mut self, log_level: Option<Level>) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }
}

fn parse_log_level(value: Option<String>) -> Result<Level, ConfigError> {
    let Some(value) = value else {
        return Ok(Level::INFO);
    };
    value.parse().map_err(|_| ConfigError::Invalid {
        key: LOG_LEVEL_VAR,
        value,
        expected: "one of trace, debug, info, warn, error",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Level::INFO)]
    #[case(Some("debug"), Level::DEBUG)]
    #[case(Some("WARN"), Level::WARN)]
    fn log_level_defaults_to_info(#[case] value: Option<&str>, #[case] expected: Level) {
        let level = parse_log_level(value.map(str::to_owned));
        assert!(matches!(level, Ok(level) if level == expected), "{level:?}");
    }

    #[test]
    fn unknown_log_level_names_the_variable() {
        let result = parse_log_level(Some("loud".to_owned()));
        assert!(matches!(result, Err(ConfigError::Invalid { key: LOG_LEVEL_VAR, .. })));
    }

    #[test]
    fn command_line_level_wins() {
        let config = CliConfig::default().apply_overrides(Some(Level::ERROR));
        assert_eq!(config.log_level, Level::ERROR);
        assert_eq!(CliConfig::default().apply_overrides(None).log_level, Level::INFO);
    }
}
