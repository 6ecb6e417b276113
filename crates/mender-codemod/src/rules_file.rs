//! Declarative YAML rule files.
//!
//! A rule file targets one language and lists replacements and deprecations:
//!
//! ```yaml
//! language: typescript
//! api_names: [gridApi, api]
//! replacements:
//!   - id: set-dom-layout
//!     pattern: $API.setDomLayout($VALUE)
//!     template: '$API.setGridOption("domLayout", $VALUE)'
//!     captures: { API: expression, VALUE: expression }
//!     subject: API
//! deprecations:
//!   - id: show-loading-overlay
//!     pattern: $API.showLoadingOverlay()
//!     message: showLoadingOverlay() was removed
//!     subject: API
//! ```
//!
//! When `api_names` is present, rules with a `subject` only fire when the
//! subject's trailing identifier is one of those names.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mender_syntax::{
    AnyOf, CaptureSet, Deprecation, NameListGuard, NodeClass, Pattern, Replacement, RuleSet,
    SupportedLanguage, TextTemplate,
};
use serde::Deserialize;
use tracing::debug;

use crate::codemod::Codemod;
use crate::compose::ComposedCodemod;
use crate::error::RuleFileError;
use crate::fs::FileSystem;
use crate::rule_codemod::RuleCodemod;

const RULES_FILE_TARGET: &str = "mender_codemod::rules_file";
const INLINE_ORIGIN: &str = "<inline>";

/// A parsed, not yet compiled, rule file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    /// Language the rules are written in.
    pub language: String,
    /// Receiver names accepted by the semantic guard.
    #[serde(default)]
    pub api_names: Vec<String>,
    /// Rewrites, in priority order.
    #[serde(default)]
    pub replacements: Vec<ReplacementRule>,
    /// Usages to report for manual migration.
    #[serde(default)]
    pub deprecations: Vec<DeprecationRule>,
    #[serde(skip)]
    origin: Option<PathBuf>,
}

/// One `replacements` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplacementRule {
    /// Unique rule identifier.
    pub id: String,
    /// Pattern to match.
    pub pattern: String,
    /// Further patterns sharing the same template.
    #[serde(default)]
    pub any_of: Vec<String>,
    /// Template rendered in place of the match.
    pub template: String,
    /// Node class per capture name.
    #[serde(default)]
    pub captures: BTreeMap<String, String>,
    /// Capture the semantic guard must approve.
    #[serde(default)]
    pub subject: Option<String>,
    /// Warning recorded whenever the rule applies.
    #[serde(default)]
    pub warning: Option<String>,
    /// Only apply when dangerous edits are enabled.
    #[serde(default)]
    pub dangerous: bool,
}

/// One `deprecations` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeprecationRule {
    /// Unique rule identifier.
    pub id: String,
    /// Pattern to match.
    pub pattern: String,
    /// Message reported for each match.
    pub message: String,
    /// Node class per capture name.
    #[serde(default)]
    pub captures: BTreeMap<String, String>,
    /// Capture the semantic guard must approve.
    #[serde(default)]
    pub subject: Option<String>,
}

impl RuleFile {
    /// Parses a rule file from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RuleFileError::Parse`] if the text is not a valid rule file.
    pub fn parse(text: &str) -> Result<Self, RuleFileError> {
        serde_saphyr::from_str(text).map_err(|err| RuleFileError::Parse {
            origin: INLINE_ORIGIN.to_owned(),
            message: err.to_string(),
        })
    }

    /// Reads and parses the rule file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleFileError::Read`] if the file cannot be read, or
    /// [`RuleFileError::Parse`] if it is not a valid rule file.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, RuleFileError> {
        let text = fs.read_to_string(path).map_err(|err| RuleFileError::Read {
            path: path.to_path_buf(),
            source: Arc::new(err),
        })?;
        let mut file: Self = serde_saphyr::from_str(&text).map_err(|err| RuleFileError::Parse {
            origin: path.display().to_string(),
            message: err.to_string(),
        })?;
        file.origin = Some(path.to_path_buf());
        Ok(file)
    }

    /// Returns where the file was loaded from, or `<inline>`.
    #[must_use]
    pub fn origin(&self) -> String {
        self.origin
            .as_ref()
            .map_or_else(|| INLINE_ORIGIN.to_owned(), |path| path.display().to_string())
    }

    /// Parses the `language` field.
    ///
    /// # Errors
    ///
    /// Returns [`RuleFileError::Language`] for unsupported languages.
    pub fn target_language(&self) -> Result<SupportedLanguage, RuleFileError> {
        self.language
            .parse()
            .map_err(|_| RuleFileError::Language {
                origin: self.origin(),
                language: self.language.clone(),
            })
    }

    /// Compiles every rule into a [`RuleSet`].
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported language, a repeated rule id, an
    /// unknown capture class, or a pattern or template that does not compile.
    /// When `api_names` is set every rule must name a `subject`, since a rule
    /// without one would bypass the guard.
    pub fn rule_set(&self) -> Result<RuleSet, RuleFileError> {
        let language = self.target_language()?;
        let mut seen = BTreeSet::new();
        let headers = self
            .replacements
            .iter()
            .map(|rule| (&rule.id, rule.subject.is_some()))
            .chain(
                self.deprecations
                    .iter()
                    .map(|rule| (&rule.id, rule.subject.is_some())),
            );
        for (id, has_subject) in headers {
            if !seen.insert(id.as_str()) {
                return Err(RuleFileError::DuplicateRule { rule: id.clone() });
            }
            if !has_subject && !self.api_names.is_empty() {
                return Err(RuleFileError::MissingSubject { rule: id.clone() });
            }
        }

        let mut rules = RuleSet::new(language);
        for rule in &self.replacements {
            rules = rules.replacement(rule.compile(language)?);
        }
        for rule in &self.deprecations {
            rules = rules.deprecation(rule.compile(language)?);
        }
        debug!(
            target: RULES_FILE_TARGET,
            origin = %self.origin(),
            %language,
            replacements = self.replacements.len(),
            deprecations = self.deprecations.len(),
            "compiled rule file"
        );
        Ok(rules)
    }

    /// Compiles the file into a codemod named `name`.
    ///
    /// # Errors
    ///
    /// See [`RuleFile::rule_set`].
    pub fn into_codemod(self, name: impl Into<String>) -> Result<Box<dyn Codemod>, RuleFileError> {
        let rules = self.rule_set()?;
        if self.api_names.is_empty() {
            Ok(Box::new(RuleCodemod::new(name, rules)))
        } else {
            let guard = NameListGuard::new(self.api_names);
            Ok(Box::new(RuleCodemod::with_guard(name, rules, guard)))
        }
    }
}

impl ReplacementRule {
    fn compile(&self, language: SupportedLanguage) -> Result<Replacement, RuleFileError> {
        let captures = capture_set(&self.id, &self.captures)?;
        let pattern = compile_pattern(&self.id, language, &self.pattern, &captures)?;
        let template = TextTemplate::compile(language, &self.template)
            .map_err(|err| RuleFileError::rule(&self.id, err))?;

        let built = if self.any_of.is_empty() {
            Replacement::new(&self.id, pattern, template)
        } else {
            let mut matcher = AnyOf::new(Vec::new()).or(pattern);
            for alternative in &self.any_of {
                matcher = matcher.or(compile_pattern(&self.id, language, alternative, &captures)?);
            }
            Replacement::new(&self.id, matcher, template)
        };
        let mut replacement = built.map_err(|err| RuleFileError::rule(&self.id, err))?;

        if let Some(subject) = &self.subject {
            replacement = replacement
                .with_subject(subject)
                .map_err(|err| RuleFileError::rule(&self.id, err))?;
        }
        if let Some(warning) = &self.warning {
            replacement = replacement.with_warning(warning);
        }
        if self.dangerous {
            replacement = replacement.dangerous();
        }
        Ok(replacement)
    }
}

impl DeprecationRule {
    fn compile(&self, language: SupportedLanguage) -> Result<Deprecation, RuleFileError> {
        let captures = capture_set(&self.id, &self.captures)?;
        let pattern = compile_pattern(&self.id, language, &self.pattern, &captures)?;
        let deprecation = Deprecation::new(&self.id, pattern, &self.message);
        match &self.subject {
            Some(subject) => deprecation
                .with_subject(subject)
                .map_err(|err| RuleFileError::rule(&self.id, err)),
            None => Ok(deprecation),
        }
    }
}

fn capture_set(rule: &str, declared: &BTreeMap<String, String>) -> Result<CaptureSet, RuleFileError> {
    let mut captures = CaptureSet::new();
    for (name, class) in declared {
        let parsed: NodeClass = class.parse().map_err(|_| RuleFileError::CaptureClass {
            rule: rule.to_owned(),
            name: name.clone(),
            class: class.clone(),
        })?;
        captures = captures.with(name, parsed);
    }
    Ok(captures)
}

fn compile_pattern(
    rule: &str,
    language: SupportedLanguage,
    source: &str,
    captures: &CaptureSet,
) -> Result<Pattern, RuleFileError> {
    Pattern::compile(language, source, captures).map_err(|err| RuleFileError::rule(rule, err))
}

/// Loads rule files in order and composes them into one codemod.
///
/// Each file becomes one stage, named after its path.
///
/// # Errors
///
/// Returns the first error met while loading or compiling a file.
pub fn load_rule_files<P: AsRef<Path>>(
    fs: &dyn FileSystem,
    paths: &[P],
) -> Result<ComposedCodemod, RuleFileError> {
    let mut pipeline = ComposedCodemod::new("rules");
    for path in paths {
        let file = RuleFile::load(fs, path.as_ref())?;
        let name = file.origin();
        pipeline.push(file.into_codemod(name)?);
    }
    Ok(pipeline)
}
