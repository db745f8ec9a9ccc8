//! Command dispatch for the `karma-bdd` entrypoint.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result};
use karma_bdd::{DryRunEngine, Engine, FsLoader, JsonLinesSink, ReplayEngine, Runner};
use tracing::Level;

use crate::config::CliConfig;
use crate::discovery::expand_paths;
use crate::logging::init_logging;

/// Extract scenario directives and report Gherkin step results.
#[derive(Parser)]
#[command(author, version, about)]
pub(crate) struct Cli {
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<Level>,
    #[command(subcommand)]
    command: Commands,
}

/// Supported commands.
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print the directive settings collected from feature files as JSON.
    Directives(FeatureArgs),
    /// Walk the features without executing them, reporting every step as skipped.
    DryRun(FeatureArgs),
    /// Translate a recorded event log into result records.
    Replay(ReplayArgs),
}

#[derive(Args)]
pub(crate) struct FeatureArgs {
    /// Feature files or directories to search for `.feature` files.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub(crate) struct ReplayArgs {
    /// JSON lines file holding the recorded engine events.
    #[arg(long)]
    pub events: PathBuf,
    #[command(flatten)]
    pub features: FeatureArgs,
}

/// Parse arguments, configure logging and run the selected command.
///
/// # Errors
///
/// Returns an error if configuration is invalid, features cannot be loaded
/// or reports cannot be written.
pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_env()
        .wrap_err("invalid environment configuration")?
        .apply_overrides(cli.log_level);
    init_logging(&config);

    let mut stdout = io::stdout().lock();
    match cli.command {
        Commands::Directives(args) => handle_directives(&config, &args, &mut stdout),
        Commands::DryRun(args) => handle_report(&config, &args, &mut DryRunEngine, &mut stdout),
        Commands::Replay(args) => {
            let mut engine = load_events(&args.events)?;
            handle_report(&config, &args.features, &mut engine, &mut stdout)
        }
    }
}

fn load_runner(config: &CliConfig, args: &FeatureArgs) -> Result<Runner<FsLoader>> {
    let paths = expand_paths(&args.paths).wrap_err("failed to search feature directories")?;
    let mut runner = Runner::from_fs(config.run.clone());
    runner
        .initialise(paths)
        .wrap_err("failed to load feature files")?;
    Ok(runner)
}

fn load_events(path: &Path) -> Result<ReplayEngine> {
    let file = File::open(path)
        .wrap_err_with(|| format!("failed to open event log {}", path.display()))?;
    let engine = ReplayEngine::from_json_lines(BufReader::new(file))
        .wrap_err_with(|| format!("failed to decode event log {}", path.display()))?;
    if engine.is_empty() {
        tracing::warn!(log = %path.display(), "event log holds no events");
    } else {
        tracing::debug!(events = engine.len(), log = %path.display(), "loaded event log");
    }
    Ok(engine)
}

/// Handle the `directives` subcommand.
fn handle_directives(config: &CliConfig, args: &FeatureArgs, writer: &mut dyn Write) -> Result<()> {
    let runner = load_runner(config, args)?;
    for (feature, scenarios) in runner.settings().iter() {
        tracing::info!(feature, scenarios = scenarios.len(), "collected directives");
    }
    serde_json::to_writer_pretty(&mut *writer, runner.settings())
        .wrap_err("failed to serialise directive settings")?;
    writeln!(writer).wrap_err("failed to terminate directive output")
}

/// Run the features through `engine`, writing reports as JSON lines.
fn handle_report<E: Engine>(
    config: &CliConfig,
    args: &FeatureArgs,
    engine: &mut E,
    writer: &mut dyn Write,
) -> Result<()> {
    let runner = load_runner(config, args)?;
    let mut sink = JsonLinesSink::new(writer);
    runner.run(engine, &mut sink).wrap_err("run aborted")?;
    sink.finish()
        .wrap_err("failed to write reports")?
        .flush()
        .wrap_err("failed to flush reports")
}
