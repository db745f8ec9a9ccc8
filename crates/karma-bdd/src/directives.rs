//! Directive extraction from feature text.
//!
//! Feature files may carry annotation comments such as
//! `#karma-bdd allowPending` which relax how step outcomes are classified for
//! the scenarios they cover. Extraction is line based: only annotation lines,
//! `Feature:` headers and `Scenario:` headers are recognised, every other line
//! is ignored.
//!
//! Scoping follows the structure of the file. Tokens declared before the
//! first scenario of a feature apply to every scenario of that feature, tokens
//! declared after a `Scenario:` header apply to that scenario only, and tokens
//! declared before the first `Feature:` header are carried into the first
//! feature.

use std::collections::{BTreeMap, BTreeSet};

use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Directive allowing pending steps to count as successful.
pub const ALLOW_PENDING: &str = "allowPending";

/// Marker used by annotation comments when no other marker is configured.
pub const DEFAULT_MARKER: &str = "karma-bdd";

/// Token sets declared for each scenario, grouped by feature name.
///
/// # Examples
///
/// ```
/// use karma_bdd::directives::{ALLOW_PENDING, DirectiveSettings};
///
/// let text = "#karma-bdd allowPending\nFeature: Login\nScenario: Valid user\n";
/// let settings = DirectiveSettings::extract(text, None);
/// assert!(settings.allows("Login", "Valid user", ALLOW_PENDING));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirectiveSettings {
    features: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl DirectiveSettings {
    /// Create an empty settings map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract directives from `text` using the default marker.
    ///
    /// When `existing` is supplied the new directives are merged into it,
    /// allowing several feature files to be folded into one map.
    #[must_use]
    pub fn extract(text: &str, existing: Option<Self>) -> Self {
        let mut settings = existing.unwrap_or_default();
        settings.absorb(text, &DirectiveSyntax::default());
        settings
    }

    /// Merge the directives declared in `text` into this map.
    pub fn absorb(&mut self, text: &str, syntax: &DirectiveSyntax) {
        let mut scope = ScopeTracker::default();
        for line in text.trim().lines() {
            match syntax.classify(line) {
                Some(Line::Annotation(tokens)) => scope.annotate(tokens),
                Some(Line::Feature(name)) => scope.enter_feature(name, self),
                Some(Line::Scenario(name)) => scope.enter_scenario(name, self),
                None => {}
            }
        }
        scope.flush(self);
    }

    /// Tokens declared for the given scenario, if any were recorded.
    #[must_use]
    pub fn tokens(&self, feature: &str, scenario: &str) -> Option<&BTreeSet<String>> {
        self.features.get(feature)?.get(scenario)
    }

    /// Whether `token` was declared for the given scenario.
    #[must_use]
    pub fn allows(&self, feature: &str, scenario: &str, token: &str) -> bool {
        self.tokens(feature, scenario)
            .is_some_and(|tokens| tokens.contains(token))
    }

    /// Whether no scenario has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over features and their scenario token sets.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, BTreeSet<String>>)> {
        self.features
            .iter()
            .map(|(name, scenarios)| (name.as_str(), scenarios))
    }

    fn commit<'t>(
        &mut self,
        feature: &str,
        scenario: &str,
        tokens: impl IntoIterator<Item = &'t String>,
    ) {
        self.features
            .entry(feature.to_owned())
            .or_default()
            .entry(scenario.to_owned())
            .or_default()
            .extend(tokens.into_iter().cloned());
    }
}

/// Compiled recognisers for the three line shapes that matter.
#[derive(Clone, Debug)]
pub struct DirectiveSyntax {
    annotation: Regex,
    feature: Regex,
    scenario: Regex,
}

impl DirectiveSyntax {
    /// Build recognisers for annotation comments introduced by `#<marker>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use karma_bdd::directives::{DirectiveSettings, DirectiveSyntax};
    ///
    /// let syntax = DirectiveSyntax::with_marker("runner");
    /// let mut settings = DirectiveSettings::new();
    /// settings.absorb("Feature: F\nScenario: S\n#runner slow", &syntax);
    /// assert!(settings.allows("F", "S", "slow"));
    /// ```
    #[must_use]
    pub fn with_marker(marker: &str) -> Self {
        let annotation = format!(r"^\s*#{} ?(.+)$", regex::escape(marker));
        Self {
            annotation: case_insensitive(&annotation),
            feature: case_insensitive(r"^\s*Feature: ?(.+)$"),
            scenario: case_insensitive(r"^\s*Scenario(?: Outline)?: ?(.+)$"),
        }
    }

    fn classify<'l>(&self, line: &'l str) -> Option<Line<'l>> {
        if let Some(tokens) = capture(&self.annotation, line) {
            return Some(Line::Annotation(tokens));
        }
        if let Some(name) = capture(&self.feature, line) {
            return Some(Line::Feature(name.trim()));
        }
        capture(&self.scenario, line).map(|name| Line::Scenario(name.trim()))
    }
}

impl Default for DirectiveSyntax {
    fn default() -> Self {
        Self::with_marker(DEFAULT_MARKER)
    }
}

#[expect(
    clippy::expect_used,
    reason = "patterns are fixed apart from the escaped marker"
)]
fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("directive pattern should compile")
}

fn capture<'l>(regex: &Regex, line: &'l str) -> Option<&'l str> {
    regex
        .captures(line.trim_end())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

enum Line<'l> {
    Annotation(&'l str),
    Feature(&'l str),
    Scenario(&'l str),
}

#[derive(Default)]
struct ScopeTracker {
    feature: Option<String>,
    scenario: Option<String>,
    feature_tokens: Vec<String>,
    scenario_tokens: Vec<String>,
}

impl ScopeTracker {
    fn annotate(&mut self, tokens: &str) {
        let target = if self.feature.is_none() || self.scenario.is_none() {
            &mut self.feature_tokens
        } else {
            &mut self.scenario_tokens
        };
        target.extend(tokens.split_whitespace().map(str::to_owned));
    }

    fn enter_feature(&mut self, name: &str, settings: &mut DirectiveSettings) {
        self.flush(settings);
        // Preamble tokens seen before the first feature belong to it.
        if self.feature.is_some() {
            self.feature_tokens.clear();
        }
        if self.scenario.is_some() {
            self.scenario_tokens.clear();
        }
        self.feature = Some(name.to_owned());
        self.scenario = None;
    }

    fn enter_scenario(&mut self, name: &str, settings: &mut DirectiveSettings) {
        self.flush(settings);
        if self.scenario.is_some() {
            self.scenario_tokens.clear();
        }
        self.scenario = Some(name.to_owned());
    }

    fn flush(&self, settings: &mut DirectiveSettings) {
        if let (Some(feature), Some(scenario)) = (&self.feature, &self.scenario) {
            settings.commit(
                feature,
                scenario,
                self.scenario_tokens.iter().chain(&self.feature_tokens),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tokens_of(settings: &DirectiveSettings, feature: &str, scenario: &str) -> Vec<String> {
        settings
            .tokens(feature, scenario)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn preamble_tokens_apply_to_first_feature() {
        let text = "#karma-bdd allowPending\nFeature: Login\nScenario: Valid user\n";
        let settings = DirectiveSettings::extract(text, None);
        assert_eq!(tokens_of(&settings, "Login", "Valid user"), [ALLOW_PENDING]);
    }

    #[test]
    fn scenario_tokens_stay_in_their_scenario() {
        let text = "\
Feature: Login
  Scenario: First
    Given a user
  Scenario: Second
    #karma-bdd allowPending
    Given a user
";
        let settings = DirectiveSettings::extract(text, None);
        assert!(tokens_of(&settings, "Login", "First").is_empty());
        assert_eq!(tokens_of(&settings, "Login", "Second"), [ALLOW_PENDING]);
    }

    #[test]
    fn feature_scope_tokens_reach_every_scenario() {
        let text = "\
Feature: Checkout
  #karma-bdd allowPending slow
  Scenario: One
    #karma-bdd flaky
  Scenario: Two
";
        let settings = DirectiveSettings::extract(text, None);
        assert_eq!(
            tokens_of(&settings, "Checkout", "One"),
            ["allowPending", "flaky", "slow"]
        );
        assert_eq!(tokens_of(&settings, "Checkout", "Two"), ["allowPending", "slow"]);
    }

    #[test]
    fn scenario_before_any_feature_hands_its_tokens_to_the_feature() {
        let text = "Scenario: Orphan\n#karma-bdd allowPending\nFeature: F\nScenario: S\n";
        let settings = DirectiveSettings::extract(text, None);
        assert_eq!(tokens_of(&settings, "F", "S"), [ALLOW_PENDING]);
        assert!(settings.tokens("F", "Orphan").is_none());
        let recorded: Vec<(&str, Vec<&str>)> = settings
            .iter()
            .map(|(feature, scenarios)| (feature, scenarios.keys().map(String::as_str).collect()))
            .collect();
        assert_eq!(recorded, [("F", vec!["S"])]);
    }

    #[test]
    fn feature_scope_resets_between_features() {
        let text = "\
Feature: A
  #karma-bdd allowPending
  Scenario: a1
Feature: B
  Scenario: b1
";
        let settings = DirectiveSettings::extract(text, None);
        assert_eq!(tokens_of(&settings, "A", "a1"), [ALLOW_PENDING]);
        assert!(tokens_of(&settings, "B", "b1").is_empty());
    }

    #[test]
    fn scenarios_without_directives_are_still_recorded() {
        let settings = DirectiveSettings::extract("Feature: F\nScenario: S\n", None);
        assert!(settings.tokens("F", "S").is_some_and(BTreeSet::is_empty));
    }

    #[test]
    fn existing_map_accumulates_across_texts() {
        let first = DirectiveSettings::extract(
            "Feature: F\nScenario: S\n#karma-bdd allowPending",
            None,
        );
        let merged = DirectiveSettings::extract("Feature: G\nScenario: T\n", Some(first));
        assert!(merged.allows("F", "S", ALLOW_PENDING));
        assert!(merged.tokens("G", "T").is_some());
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "#karma-bdd a\nFeature: F\nScenario: S\n#karma-bdd b\nScenario: T\n";
        assert_eq!(
            DirectiveSettings::extract(text, None),
            DirectiveSettings::extract(text, None)
        );
    }

    #[rstest]
    #[case("#KARMA-BDD allowPending")]
    #[case("   #karma-bdd    allowPending   ")]
    #[case("#karma-bddallowPending")]
    fn annotation_lines_are_recognised(#[case] line: &str) {
        let text = format!("feature: F\nSCENARIO: S\n{line}\n");
        let settings = DirectiveSettings::extract(&text, None);
        assert_eq!(tokens_of(&settings, "F", "S"), [ALLOW_PENDING]);
    }

    #[rstest]
    #[case("# karma-bdd allowPending")]
    #[case("#other allowPending")]
    #[case("Given #karma-bdd allowPending")]
    fn unrelated_lines_are_ignored(#[case] line: &str) {
        let text = format!("Feature: F\nScenario: S\n{line}\n");
        let settings = DirectiveSettings::extract(&text, None);
        assert!(tokens_of(&settings, "F", "S").is_empty());
    }

    #[test]
    fn outline_headers_open_a_scenario() {
        let text = "Feature: F\nScenario Outline: Adding <a>\n#karma-bdd allowPending\n";
        let settings = DirectiveSettings::extract(text, None);
        assert!(settings.allows("F", "Adding <a>", ALLOW_PENDING));
    }

    #[test]
    fn custom_marker_replaces_default() {
        let syntax = DirectiveSyntax::with_marker("karma-cucumberjs");
        let mut settings = DirectiveSettings::new();
        settings.absorb(
            "Feature: F\nScenario: S\n#karma-cucumberjs allowPending\n#karma-bdd other",
            &syntax,
        );
        assert_eq!(tokens_of(&settings, "F", "S"), [ALLOW_PENDING]);
    }

    #[test]
    fn text_without_scenarios_records_nothing() {
        let settings = DirectiveSettings::extract("#karma-bdd allowPending\nFeature: F\n", None);
        assert!(settings.is_empty());
    }
}
