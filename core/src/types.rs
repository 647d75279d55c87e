//! Binding model type definitions.
//!
//! This module defines the syntax-free model the compiler works on: the
//! declared work function ([`FunctionDecl`], [`ParameterDecl`]) and the
//! derived artifacts ([`ParameterSpec`], [`LabelTriple`], [`ShadowGroup`],
//! [`StateThread`]). Every value is created fresh for one compiler run and
//! serializes with [`serde`] so the checker can print it.

use serde::{Deserialize, Serialize};

use crate::type_text::{normalize_type_text, sequence_of};

/// Label placeholder for parameters that take no command-line alias.
pub const POSITIONAL_LABEL: &str = "_";

/// Void-equivalent state element type.
pub const UNIT_TYPE: &str = "()";

/// Name of the chain-path parameter of a stateful command action.
pub const NODE_PATH_PARAMETER: &str = "node_path";

/// Name of the ancestor-state parameter of a stateful command action.
pub const STATE_PARAMETER: &str = "state";

/// One declared parameter of a work function.
///
/// Type and default text are normalised on construction, so two
/// declarations that differ only in token spacing compare equal.
///
/// # Examples
///
/// ```
/// use cmdbind_core::ParameterDecl;
///
/// let help = ParameterDecl::new("help", "MetaFlag")
///     .with_label("h__help")
///     .with_default("MetaFlag :: text (\"usage\")");
/// assert_eq!(help.label, "h__help");
/// assert_eq!(help.default.as_deref(), Some("MetaFlag::text(\"usage\")"));
///
/// let phrase = ParameterDecl::new("phrase", "String").positional();
/// assert_eq!(phrase.label, "_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    /// Identifier used to derive command-line aliases.
    pub label: String,
    /// Identifier of the parameter in generated code.
    pub name: String,
    /// Declared type text.
    pub type_text: String,
    /// Declared default expression text, if any.
    pub default: Option<String>,
}

impl ParameterDecl {
    /// Creates a parameter whose label is its name.
    pub fn new(name: impl Into<String>, type_text: &str) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            type_text: normalize_type_text(type_text),
            default: None,
        }
    }

    /// Overrides the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Marks the parameter as purely positional.
    pub fn positional(mut self) -> Self {
        self.label = POSITIONAL_LABEL.to_string();
        self
    }

    /// Sets the declared default expression.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(normalize_type_text(default));
        self
    }
}

/// A work function declaration as seen by the compiler.
///
/// `return_type` holds the *success* type: for a fallible function
/// returning `Result<T, E>` it is `T`, and a unit return is the empty
/// string.
///
/// # Examples
///
/// ```
/// use cmdbind_core::{FunctionDecl, ParameterDecl};
///
/// let decl = FunctionDecl::new("m1Greet")
///     .with_parameter(ParameterDecl::new("name", "String").positional())
///     .returning("()");
/// assert_eq!(decl.call_name(), "m1-greet");
/// assert!(decl.return_type.is_empty());
/// assert_eq!(decl.parameter_names(), vec!["name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Function identifier.
    pub name: String,
    /// Generic parameter clause text (empty when not generic).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generics: String,
    /// Visibility and qualifier text (e.g. `pub const`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub modifiers: String,
    /// Whether the function may suspend.
    #[serde(default)]
    pub is_async: bool,
    /// Whether the function may fail (returns `Result`).
    #[serde(default)]
    pub fallible: bool,
    /// Ordered parameter list.
    pub parameters: Vec<ParameterDecl>,
    /// Success return type text; empty for unit.
    #[serde(default)]
    pub return_type: String,
}

impl FunctionDecl {
    /// Creates a synchronous, infallible function with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generics: String::new(),
            modifiers: String::new(),
            is_async: false,
            fallible: false,
            parameters: Vec::new(),
            return_type: String::new(),
        }
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: ParameterDecl) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the success return type. `()` is stored as the empty string.
    pub fn returning(mut self, return_type: &str) -> Self {
        let normalized = normalize_type_text(return_type);
        self.return_type = if normalized == UNIT_TYPE {
            String::new()
        } else {
            normalized
        };
        self
    }

    /// Finds a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterDecl> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Returns parameter names in declaration order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Returns the kebab-case command name derived from the function name.
    pub fn call_name(&self) -> String {
        kebab_case(&self.name)
    }
}

/// Type category of a parameter, with its value type where one applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "type", rename_all = "snake_case")]
pub enum TypeCategory {
    /// A single value of the given type.
    Value(String),
    /// Boolean-like switch, false when absent.
    Flag,
    /// Informational flag with a fixed payload (help, version).
    MetaFlag,
    /// A value that may be absent.
    Optional(String),
    /// Zero or more repeated values.
    Array(String),
    /// Trailing run of values.
    Variadic(String),
}

impl TypeCategory {
    /// Short lowercase name, used in messages and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Flag => "flag",
            Self::MetaFlag => "meta flag",
            Self::Optional(_) => "optional",
            Self::Array(_) => "array",
            Self::Variadic(_) => "variadic",
        }
    }

    /// Returns the value or element type, if the category carries one.
    pub fn value_type(&self) -> Option<&str> {
        match self {
            Self::Value(ty) | Self::Optional(ty) | Self::Array(ty) | Self::Variadic(ty) => {
                Some(ty)
            }
            Self::Flag | Self::MetaFlag => None,
        }
    }
}

/// Classified parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub category: TypeCategory,
    pub default: Option<String>,
}

impl ParameterSpec {
    /// Whether the parameter takes no command-line alias.
    pub fn is_positional(&self) -> bool {
        self.label == POSITIONAL_LABEL || self.label.is_empty()
    }

    /// Whether the parameter is one of the chain wiring parameters.
    pub fn is_chain_wiring(&self) -> bool {
        self.name == NODE_PATH_PARAMETER || self.name == STATE_PARAMETER
    }
}

/// Up to three command-line aliases derived from one label.
///
/// Aliases are stored without their dash prefixes; [`spellings`] renders
/// them as they are typed on the command line.
///
/// [`spellings`]: LabelTriple::spellings
///
/// # Examples
///
/// ```
/// use cmdbind_core::LabelTriple;
///
/// let triple = LabelTriple {
///     short: None,
///     legacy: Some("count".into()),
///     long: Some("count".into()),
/// };
/// assert_eq!(triple.aliases(), vec!["count"]);
/// assert_eq!(triple.spellings(), vec!["-count", "--count"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTriple {
    /// Single character, typed with one dash.
    pub short: Option<String>,
    /// Multi-character, typed with one dash.
    pub legacy: Option<String>,
    /// Multi-character, typed with two dashes.
    pub long: Option<String>,
}

impl LabelTriple {
    /// Whether no alias was derived.
    pub fn is_empty(&self) -> bool {
        self.short.is_none() && self.legacy.is_none() && self.long.is_none()
    }

    /// Distinct alias texts claimed by this triple.
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = Vec::with_capacity(3);
        for alias in [&self.short, &self.legacy, &self.long].into_iter().flatten() {
            if !aliases.contains(&alias.as_str()) {
                aliases.push(alias);
            }
        }
        aliases
    }

    /// Aliases as typed on the command line.
    pub fn spellings(&self) -> Vec<String> {
        let short = self.short.as_ref().map(|s| format!("-{s}"));
        let legacy = self.legacy.as_ref().map(|s| format!("-{s}"));
        let long = self.long.as_ref().map(|s| format!("--{s}"));
        [short, legacy, long].into_iter().flatten().collect()
    }
}

/// Parameters that shadow each other; the last one given wins at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShadowGroup {
    pub names: Vec<String>,
}

impl ShadowGroup {
    /// Renders the group as the space-joined name string the runtime reads.
    pub fn render(&self) -> String {
        self.names.join(" ")
    }
}

/// Resolved state threading for a stateful command action.
///
/// # Examples
///
/// ```
/// use cmdbind_core::StateThread;
///
/// let thread = StateThread { element_type: "Widget".into(), synthesized: true };
/// assert_eq!(thread.node_path_type("ChainNode"), "Vec<ChainNode<Widget>>");
/// assert_eq!(thread.state_type(), "Vec<Widget>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateThread {
    /// Shared state element type `T`.
    pub element_type: String,
    /// Whether `node_path`/`state` were appended by the compiler.
    pub synthesized: bool,
}

impl StateThread {
    /// Type of the `node_path` parameter for this thread.
    pub fn node_path_type(&self, chain_node_type: &str) -> String {
        sequence_of(&format!("{chain_node_type}<{}>", self.element_type))
    }

    /// Type of the `state` parameter for this thread.
    pub fn state_type(&self) -> String {
        sequence_of(&self.element_type)
    }
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c == '_' || c == '-' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        } else if c.is_uppercase() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out.trim_end_matches('-').to_string()
}
