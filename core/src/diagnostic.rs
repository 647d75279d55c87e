//! Diagnostics and the per-run diagnostic collector.
//!
//! Every finding is a [`BindingError`] attached to the declaration it is
//! about. The `Display` impl of the error is the message shown to the
//! developer; [`BindingError::kind`] gives its category.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diagnostic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Wrong default for a type category.
    TypeConstraintViolation,
    /// Disallowed character in a label.
    LabelSyntaxError,
    /// Alias claimed by more than one parameter.
    LabelConflict,
    /// Shadow group argument that is not a string literal.
    ShadowGroupSyntaxError,
    /// Shadow group naming an undeclared parameter.
    ShadowGroupUnknownName,
    /// Inconsistent chain wiring or return type.
    StateContractViolation,
    /// Directive misuse.
    UsageError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeConstraintViolation => "type-constraint",
            Self::LabelSyntaxError => "label-syntax",
            Self::LabelConflict => "label-conflict",
            Self::ShadowGroupSyntaxError => "shadow-group-syntax",
            Self::ShadowGroupUnknownName => "shadow-group-unknown-name",
            Self::StateContractViolation => "state-contract",
            Self::UsageError => "usage",
        };
        f.write_str(name)
    }
}

/// Binding compiler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BindingError {
    #[error("the parameter '{parameter}' has a default value of 'true', which is not allowed for flags")]
    FlagDefaultsToTrue { parameter: String },

    #[error("the parameter '{parameter}' is missing its required default value")]
    MissingMetaFlagDefault { parameter: String },

    #[error("the parameter '{parameter}', a {type_name}, must have a label")]
    UnlabeledFlag { parameter: String, type_name: String },

    #[error(
        "the parameter '{parameter}' has a default value other than 'None', which is not allowed for optional types"
    )]
    OptionalWithDefault { parameter: String },

    /// `category` is the plural category name (`arrays`, `variadics`).
    #[error(
        "the parameter '{parameter}' has a default value other than an empty sequence, which is not allowed for {category}"
    )]
    NonEmptySequenceDefault { parameter: String, category: String },

    #[error(
        "the label '{label}' of parameter '{parameter}' is not valid (only ASCII letters, digits and '_' are allowed)"
    )]
    InvalidLabel { parameter: String, label: String },

    #[error("alias '{alias}' is duplicated, used by {}", quoted_list(.parameters))]
    DuplicateAlias { alias: String, parameters: Vec<String> },

    #[error("all shadow_groups arguments must be string literals")]
    ShadowGroupsNotLiteral,

    #[error(
        "unrecognized shadowed parameter {}: {}",
        name_or_names(.names),
        quoted_list(.names)
    )]
    UnknownShadowedNames { names: Vec<String> },

    #[error("penultimate parameter must be 'node_path: {expected}'")]
    MissingNodePath { expected: String },

    #[error("return type mismatch: expected '{expected}'")]
    StateReturnMismatch { expected: String },

    #[error("the 'state' parameter must be a sequence, found '{found}'")]
    StateNotSequence { found: String },

    #[error("the 'state' parameter must be the last parameter")]
    StateNotLast,

    #[error("work function has a parameter named 'node_path', but none named 'state'")]
    NodePathWithoutState,

    #[error("return type must be a sequence, found '{found}'")]
    ReturnTypeNotSequence { found: String },

    #[error("only applies to functions")]
    NotAFunction,

    #[error("functions annotated with #[main_function] cannot have return values")]
    MainFunctionReturnsValue,

    #[error("functions annotated with #[main_function] cannot be generic")]
    GenericMainFunction,

    #[error("work function names starting with \"__\" cannot end with \"__\"")]
    ReservedFunctionName,

    #[error("work functions cannot take a `self` receiver")]
    SelfReceiver,

    #[error("parameter patterns must be plain identifiers, found '{pattern}'")]
    UnsupportedPattern { pattern: String },

    #[error("invalid directive argument: {0}")]
    InvalidDirective(String),

    #[error("invalid #[arg] attribute: {0}")]
    InvalidArgument(String),
}

impl BindingError {
    /// Category of this error.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::FlagDefaultsToTrue { .. }
            | Self::MissingMetaFlagDefault { .. }
            | Self::UnlabeledFlag { .. }
            | Self::OptionalWithDefault { .. }
            | Self::NonEmptySequenceDefault { .. } => DiagnosticKind::TypeConstraintViolation,
            Self::InvalidLabel { .. } => DiagnosticKind::LabelSyntaxError,
            Self::DuplicateAlias { .. } => DiagnosticKind::LabelConflict,
            Self::ShadowGroupsNotLiteral => DiagnosticKind::ShadowGroupSyntaxError,
            Self::UnknownShadowedNames { .. } => DiagnosticKind::ShadowGroupUnknownName,
            Self::MissingNodePath { .. }
            | Self::StateReturnMismatch { .. }
            | Self::StateNotSequence { .. }
            | Self::StateNotLast
            | Self::NodePathWithoutState
            | Self::ReturnTypeNotSequence { .. } => DiagnosticKind::StateContractViolation,
            Self::NotAFunction
            | Self::MainFunctionReturnsValue
            | Self::GenericMainFunction
            | Self::ReservedFunctionName
            | Self::SelfReceiver
            | Self::UnsupportedPattern { .. }
            | Self::InvalidDirective(_)
            | Self::InvalidArgument(_) => DiagnosticKind::UsageError,
        }
    }
}

/// Declaration a diagnostic is reported against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "name", rename_all = "snake_case")]
pub enum DiagnosticTarget {
    /// The work function as a whole.
    Function,
    /// The directive (attribute) and its arguments.
    Directive,
    /// One parameter, by name.
    Parameter(String),
}

/// A finding plus the declaration it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub error: BindingError,
    #[serde(flatten)]
    pub target: DiagnosticTarget,
}

impl Diagnostic {
    /// Diagnostic reported against the work function.
    pub fn function(error: BindingError) -> Self {
        Self {
            error,
            target: DiagnosticTarget::Function,
        }
    }

    /// Diagnostic reported against the directive.
    pub fn directive(error: BindingError) -> Self {
        Self {
            error,
            target: DiagnosticTarget::Directive,
        }
    }

    /// Diagnostic reported against one parameter.
    pub fn parameter(name: impl Into<String>, error: BindingError) -> Self {
        Self {
            error,
            target: DiagnosticTarget::Parameter(name.into()),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.error.kind()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// Additive diagnostic collector for one compiler run.
///
/// # Examples
///
/// ```
/// use cmdbind_core::{BindingError, Diagnostic, Diagnostics};
///
/// let mut diagnostics = Diagnostics::default();
/// assert_eq!(diagnostics.finish(|| 42), Ok(42));
///
/// let mut diagnostics = Diagnostics::default();
/// diagnostics.push(Diagnostic::function(BindingError::StateNotLast));
/// assert_eq!(diagnostics.len(), 1);
/// assert!(diagnostics.finish(|| 42).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries.extend(diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Builds the run's output only when nothing was reported.
    pub fn finish<T>(self, build: impl FnOnce() -> T) -> Result<T, Vec<Diagnostic>> {
        if self.entries.is_empty() {
            Ok(build())
        } else {
            Err(self.entries)
        }
    }
}

fn name_or_names(names: &[String]) -> &'static str {
    if names.len() == 1 { "name" } else { "names" }
}

/// Joins names as `'a'`, `'a' and 'b'`, `'a', 'b' and 'c'`.
pub(crate) fn quoted_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| format!("'{name}'")).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}
