//! Run orchestration: feature loading, directive collection and reporting.
//!
//! A [`Runner`] is built once per run. It loads the `.feature` files it is
//! given, folds their directives into one [`DirectiveSettings`] map, then
//! drives an [`Engine`] with a [`ResultTranslator`] attached and signals
//! completion to the sink once the engine finishes.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::directives::{DirectiveSettings, DirectiveSyntax};
use crate::engine::Engine;
use crate::error::RunnerError;
use crate::listener::{Listener, ResultTranslator, TraceListener};
use crate::sink::ReportingSink;
use crate::state::SystemClock;

/// Reads feature sources.
pub trait FeatureLoader {
    /// Load the text of the feature at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the file cannot be read.
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Loader reading features from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsLoader;

impl FeatureLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// A loaded feature source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureFile {
    path: PathBuf,
    contents: String,
}

impl FeatureFile {
    /// Pair a path with its contents.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Path the feature was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Feature text.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// Whether `path` names a `.feature` file.
#[must_use]
pub fn is_feature_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"))
}

/// Prepares and executes one run.
///
/// # Examples
///
/// ```
/// use std::io;
/// use std::path::Path;
///
/// use karma_bdd::config::Config;
/// use karma_bdd::engine::DryRunEngine;
/// use karma_bdd::runner::{FeatureLoader, Runner};
/// use karma_bdd::sink::{CollectingSink, SinkCall};
///
/// struct Inline;
///
/// impl FeatureLoader for Inline {
///     fn load(&self, _path: &Path) -> io::Result<String> {
///         Ok("Feature: F\n  Scenario: S\n    Given a step\n".into())
///     }
/// }
///
/// let mut runner = Runner::new(Inline, Config::default());
/// runner.initialise(["f.feature", "app.js"]).unwrap();
/// let mut sink = CollectingSink::default();
/// runner.run(&mut DryRunEngine, &mut sink).unwrap();
/// assert_eq!(sink.calls().last(), Some(&SinkCall::Complete));
/// ```
#[derive(Debug)]
pub struct Runner<L> {
    loader: L,
    config: Config,
    syntax: DirectiveSyntax,
    features: Vec<FeatureFile>,
    settings: DirectiveSettings,
}

impl<L: FeatureLoader> Runner<L> {
    /// Create a runner reading features through `loader`.
    pub fn new(loader: L, config: Config) -> Self {
        let syntax = config.directive_syntax();
        Self {
            loader,
            config,
            syntax,
            features: Vec::new(),
            settings: DirectiveSettings::new(),
        }
    }

    /// Load every `.feature` path among `paths`; other paths are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::NoFeatureFiles`] when no path names a feature
    /// file and [`RunnerError::Load`] when one cannot be read.
    pub fn initialise<I, P>(&mut self, paths: I) -> Result<(), RunnerError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let feature_paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|path| path.as_ref().to_path_buf())
            .filter(|path| is_feature_file(path))
            .collect();
        if feature_paths.is_empty() {
            return Err(RunnerError::NoFeatureFiles);
        }
        for path in feature_paths {
            self.load_feature(path)?;
        }
        Ok(())
    }

    /// Load one feature and collect its directives.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Load`] when the feature cannot be read.
    pub fn load_feature(&mut self, path: PathBuf) -> Result<(), RunnerError> {
        let contents = self
            .loader
            .load(&path)
            .map_err(|source| RunnerError::Load {
                path: path.clone(),
                source,
            })?;
        self.settings.absorb(&contents, &self.syntax);
        log::info!("loaded feature {}", path.display());
        self.features.push(FeatureFile { path, contents });
        Ok(())
    }

    /// Features loaded so far, in load order.
    #[must_use]
    pub fn features(&self) -> &[FeatureFile] {
        &self.features
    }

    /// Directives collected from every loaded feature.
    #[must_use]
    pub fn settings(&self) -> &DirectiveSettings {
        &self.settings
    }

    /// Run the loaded features on `engine`, reporting to `sink`.
    ///
    /// The sink receives its completion signal only when the engine finished
    /// without error.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::NoFeatureFiles`] when nothing was loaded and
    /// [`RunnerError::Engine`] when the engine aborts.
    pub fn run<E, S>(&self, engine: &mut E, sink: &mut S) -> Result<(), RunnerError>
    where
        E: Engine + ?Sized,
        S: ReportingSink + ?Sized,
    {
        if self.features.is_empty() {
            return Err(RunnerError::NoFeatureFiles);
        }
        {
            let mut translator =
                ResultTranslator::with_clock(&mut *sink, &self.settings, &self.config, SystemClock);
            let mut trace = TraceListener;
            let mut listeners: [&mut dyn Listener; 2] = [&mut trace, &mut translator];
            engine.start(&self.features, &mut listeners)?;
        }
        sink.report_run_complete();
        Ok(())
    }
}

impl Runner<FsLoader> {
    /// Create a runner reading features from the filesystem.
    #[must_use]
    pub fn from_fs(config: Config) -> Self {
        Self::new(FsLoader, config)
    }
}
