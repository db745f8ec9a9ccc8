//! Logging to stderr, keeping stdout free for reports.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

fn filter_for(config: &CliConfig) -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::from_level(config.log_level).into())
}

/// Install the global subscriber.
///
/// Records the library emits through `log` reach the same subscriber. A
/// second call leaves the first subscriber in place.
pub(crate) fn init_logging(config: &CliConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(config))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
