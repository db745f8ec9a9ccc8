//! Command line front end for `karma-bdd`.
//!
//! Reads feature files, prints their directive settings, and turns dry runs
//! or recorded event logs into JSON lines result records on stdout.

mod cli;
mod config;
mod discovery;
mod logging;

fn main() -> eyre::Result<()> {
    cli::run()
}
