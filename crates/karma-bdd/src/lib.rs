//! Core library for `karma-bdd`.
//!
//! The crate bridges the event stream of a Gherkin engine to a browser test
//! runner's result-reporting protocol. It has two halves:
//!
//! - [`directives`] extracts per-scenario settings from annotation comments
//!   in feature files (for example `#karma-bdd allowPending`).
//! - [`listener`] consumes run events and emits progress, one result record
//!   per concluded step, and a completion signal to a [`sink::ReportingSink`].
//!
//! [`runner::Runner`] wires both together for one run.
//!
//! # Examples
//!
//! ```
//! use karma_bdd::directives::{ALLOW_PENDING, DirectiveSettings};
//!
//! let settings = DirectiveSettings::extract(
//!     "#karma-bdd allowPending\nFeature: Login\nScenario: Valid user\n",
//!     None,
//! );
//! assert!(settings.allows("Login", "Valid user", ALLOW_PENDING));
//! ```

pub mod config;
pub mod directives;
pub mod engine;
pub mod error;
pub mod events;
pub mod listener;
pub mod runner;
pub mod sink;
pub mod state;

pub use config::{Config, ElapsedOrigin};
pub use directives::{ALLOW_PENDING, DirectiveSettings, DirectiveSyntax};
pub use engine::{DryRunEngine, Engine, ReplayEngine};
pub use error::{ConfigError, EngineError, ReportError, RunnerError};
pub use listener::{Continuation, Listener, ResultTranslator, TraceListener};
pub use runner::{FeatureFile, FeatureLoader, FsLoader, Runner};
pub use sink::{CollectingSink, JsonLinesSink, ReportingSink, SinkCall, StepReport};
