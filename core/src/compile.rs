//! The binding compiler pipeline.
//!
//! [`compile_binding`] runs every stage over one work function and either
//! returns the complete [`CompiledBinding`] or every diagnostic found.
//! Classification, label derivation, shadow groups and state threading are
//! independent and all run, so a function with several defects is reported
//! in one pass.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::classify_parameters;
use crate::config::{BindingConfig, assemble_config};
use crate::diagnostic::{BindingError, Diagnostic, Diagnostics};
use crate::labels::build_label_table;
use crate::options::CompilerOptions;
use crate::shadow::{ShadowGroupArg, resolve_shadow_groups};
use crate::state::thread_state;
use crate::types::{FunctionDecl, ParameterSpec, StateThread};

/// Directive a work function is annotated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// Generates the program entry point `main`.
    MainFunction,
    /// Generates `call`, invoked with an argument list.
    CallFunction,
    /// Generates `action` and `action_config` for command chains.
    CommandAction,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 3] = [
        DirectiveKind::MainFunction,
        DirectiveKind::CallFunction,
        DirectiveKind::CommandAction,
    ];

    /// Attribute name the directive is written with.
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::MainFunction => "main_function",
            Self::CallFunction => "call_function",
            Self::CommandAction => "command_action",
        }
    }

    /// Looks a directive up by attribute name.
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.attribute_name() == name)
    }

    /// Names of the generated peer functions.
    pub fn peer_names(self) -> &'static [&'static str] {
        match self {
            Self::MainFunction => &["main"],
            Self::CallFunction => &["call"],
            Self::CommandAction => &["action", "action_config"],
        }
    }

    /// Whether the directive threads chain state.
    pub fn threads_state(self) -> bool {
        self == Self::CommandAction
    }
}

/// Typed directive arguments.
///
/// # Examples
///
/// ```
/// use cmdbind_core::{Directive, DirectiveKind, ShadowGroupArg};
///
/// let directive = Directive::new(DirectiveKind::MainFunction)
///     .with_shadow_group(ShadowGroupArg::Literal("lower upper".into()));
/// assert_eq!(directive.runtime_path(), "::cmdbind");
/// assert_eq!(directive.shadow_groups.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// `shadow_groups = [...]` elements.
    #[serde(default)]
    pub shadow_groups: Vec<ShadowGroupArg>,
    /// Peers call the work function as `Self::name`.
    #[serde(default)]
    pub associated: bool,
    /// Path of the runtime crate referenced by generated code.
    #[serde(default)]
    pub runtime: Option<String>,
}

impl Directive {
    pub fn new(kind: DirectiveKind) -> Self {
        Self {
            kind,
            shadow_groups: Vec::new(),
            associated: false,
            runtime: None,
        }
    }

    pub fn with_shadow_group(mut self, arg: ShadowGroupArg) -> Self {
        self.shadow_groups.push(arg);
        self
    }

    /// Runtime crate path, `::cmdbind` unless overridden.
    pub fn runtime_path(&self) -> &str {
        self.runtime.as_deref().unwrap_or("::cmdbind")
    }
}

/// Successful compiler output for one work function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledBinding {
    pub kind: DirectiveKind,
    /// Kebab-case command name.
    pub call_name: String,
    /// The work function, with synthesized chain parameters appended.
    pub function: FunctionDecl,
    /// Command-line parameters, in declaration order.
    pub parameters: Vec<ParameterSpec>,
    pub config: BindingConfig,
    /// Chain state, for command actions.
    pub state: Option<StateThread>,
}

impl CompiledBinding {
    /// Finds a command-line parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|spec| spec.name == name)
    }
}

/// Compiles one annotated work function.
///
/// # Examples
///
/// ```
/// use cmdbind_core::*;
///
/// let decl = FunctionDecl::new("mf0Print")
///     .with_parameter(ParameterDecl::new("showIndex", "Flag").with_label("i"))
///     .with_parameter(ParameterDecl::new("count", "i32").with_default("1"))
///     .with_parameter(ParameterDecl::new("phrase", "String").positional())
///     .with_parameter(
///         ParameterDecl::new("help", "MetaFlag")
///             .with_label("h__help")
///             .with_default("MetaFlag::text(\"usage\")"),
///     );
/// let binding = compile_binding(
///     &decl,
///     &Directive::new(DirectiveKind::MainFunction),
///     &CompilerOptions::default(),
/// )
/// .unwrap();
///
/// let labels = &binding.config.labels;
/// assert_eq!(labels.get("showIndex").unwrap().short.as_deref(), Some("i"));
/// assert_eq!(labels.get("count").unwrap().legacy.as_deref(), Some("count"));
/// assert!(labels.get("phrase").unwrap().is_empty());
/// assert_eq!(labels.get("help").unwrap().long.as_deref(), Some("help"));
/// assert_eq!(binding.config.meta_flags.len(), 1);
/// ```
pub fn compile_binding(
    decl: &FunctionDecl,
    directive: &Directive,
    options: &CompilerOptions,
) -> Result<CompiledBinding, Vec<Diagnostic>> {
    let kind = directive.kind;
    let mut diagnostics = Diagnostics::default();

    diagnostics.extend(check_usage(decl, kind));

    let specs = classify_parameters(&decl.parameters, options, &mut diagnostics);
    let bound: Vec<ParameterSpec> = specs
        .into_iter()
        .filter(|spec| !(kind.threads_state() && spec.is_chain_wiring()))
        .collect();

    let labels = build_label_table(&bound, &options.label_separator, &mut diagnostics);

    let bound_names: Vec<&str> = bound.iter().map(|spec| spec.name.as_str()).collect();
    let shadow_groups = match resolve_shadow_groups(&directive.shadow_groups, &bound_names) {
        Ok(groups) => groups,
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            Vec::new()
        }
    };

    let mut function = decl.clone();
    let mut state = None;
    if kind.threads_state() {
        match thread_state(decl, options) {
            Ok(threaded) => {
                function.parameters = threaded.parameters;
                state = Some(threaded.thread);
            }
            Err(found) => diagnostics.extend(found),
        }
    }

    debug!(
        function = %decl.name,
        directive = kind.attribute_name(),
        parameters = bound.len(),
        diagnostics = diagnostics.len(),
        "compiled work function"
    );

    diagnostics.finish(|| CompiledBinding {
        kind,
        call_name: decl.call_name(),
        function,
        config: assemble_config(&bound, &shadow_groups, labels),
        parameters: bound,
        state,
    })
}

fn check_usage(decl: &FunctionDecl, kind: DirectiveKind) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if decl.name.len() > 4 && decl.name.starts_with("__") && decl.name.ends_with("__") {
        diagnostics.push(Diagnostic::function(BindingError::ReservedFunctionName));
    }

    if kind == DirectiveKind::MainFunction {
        if !decl.return_type.is_empty() {
            diagnostics.push(Diagnostic::function(
                BindingError::MainFunctionReturnsValue,
            ));
        }
        if !decl.generics.is_empty() {
            diagnostics.push(Diagnostic::function(BindingError::GenericMainFunction));
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DiagnosticKind, DiagnosticTarget};
    use crate::types::{LabelTriple, ParameterDecl, TypeCategory};

    fn compile(decl: &FunctionDecl, directive: &Directive) -> Result<CompiledBinding, Vec<Diagnostic>> {
        compile_binding(decl, directive, &CompilerOptions::default())
    }

    fn print_function() -> FunctionDecl {
        FunctionDecl::new("mf0Print")
            .with_parameter(ParameterDecl::new("showIndex", "Flag").with_label("i"))
            .with_parameter(ParameterDecl::new("count", "Int").with_default("1"))
            .with_parameter(ParameterDecl::new("phrase", "String").positional())
            .with_parameter(
                ParameterDecl::new("help", "MetaFlag")
                    .with_label("h__help")
                    .with_default("MetaFlag::help(HELP)"),
            )
    }

    fn greet_function() -> FunctionDecl {
        FunctionDecl::new("m1Greet")
            .with_parameter(ParameterDecl::new("upper", "Flag").with_label("u"))
            .with_parameter(ParameterDecl::new("lower", "Flag").with_label("l"))
            .with_parameter(ParameterDecl::new("name", "String").positional())
    }

    #[test]
    fn test_print_scenario_labels() {
        let binding = compile(&print_function(), &Directive::new(DirectiveKind::MainFunction)).unwrap();
        let labels = &binding.config.labels;

        assert_eq!(
            labels.get("showIndex"),
            Some(&LabelTriple {
                short: Some("i".into()),
                legacy: None,
                long: None
            })
        );
        assert_eq!(
            labels.get("count"),
            Some(&LabelTriple {
                short: None,
                legacy: Some("count".into()),
                long: Some("count".into())
            })
        );
        assert_eq!(labels.get("phrase"), Some(&LabelTriple::default()));
        assert_eq!(
            labels.get("help"),
            Some(&LabelTriple {
                short: Some("h".into()),
                legacy: None,
                long: Some("help".into())
            })
        );
        assert_eq!(binding.call_name, "mf0-print");
        assert_eq!(binding.config.meta_flags[0].default, "MetaFlag::help(HELP)");
        assert!(binding.state.is_none());
    }

    #[test]
    fn test_flag_defaulting_to_true_fails_generation() {
        let decl = FunctionDecl::new("shout")
            .with_parameter(ParameterDecl::new("upper", "Flag").with_label("u").with_default("true"));
        let errors = compile(&decl, &Directive::new(DirectiveKind::CallFunction)).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), DiagnosticKind::TypeConstraintViolation);
        assert_eq!(errors[0].target, DiagnosticTarget::Parameter("upper".into()));
    }

    #[test]
    fn test_shadow_groups_resolve_against_parameters() {
        let directive = Directive::new(DirectiveKind::MainFunction)
            .with_shadow_group(ShadowGroupArg::Literal("lower upper".into()));
        let binding = compile(&greet_function(), &directive).unwrap();
        assert_eq!(binding.config.shadow_groups, vec!["lower upper"]);

        let directive = Directive::new(DirectiveKind::MainFunction)
            .with_shadow_group(ShadowGroupArg::Literal("lower upperX".into()));
        let errors = compile(&greet_function(), &directive).unwrap_err();
        assert_eq!(
            errors,
            vec![Diagnostic::directive(BindingError::UnknownShadowedNames {
                names: vec!["upperX".into()]
            })]
        );
    }

    #[test]
    fn test_all_stages_report_together() {
        let decl = FunctionDecl::new("broken")
            .with_parameter(ParameterDecl::new("upper", "Flag").with_label("u").with_default("true"))
            .with_parameter(ParameterDecl::new("user", "String").with_label("u"))
            .with_parameter(ParameterDecl::new("path", "String").with_label("dry-run"))
            .returning("String");
        let directive = Directive::new(DirectiveKind::MainFunction)
            .with_shadow_group(ShadowGroupArg::Literal("upper missing".into()));
        let errors = compile(&decl, &directive).unwrap_err();

        let kinds: Vec<DiagnosticKind> = errors.iter().map(Diagnostic::kind).collect();
        assert!(kinds.contains(&DiagnosticKind::UsageError));
        assert!(kinds.contains(&DiagnosticKind::TypeConstraintViolation));
        assert!(kinds.contains(&DiagnosticKind::LabelSyntaxError));
        assert!(kinds.contains(&DiagnosticKind::LabelConflict));
        assert!(kinds.contains(&DiagnosticKind::ShadowGroupUnknownName));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_main_function_usage_rules() {
        let mut decl = greet_function().returning("i32");
        decl.generics = "<T>".into();
        let errors = compile(&decl, &Directive::new(DirectiveKind::MainFunction)).unwrap_err();
        assert_eq!(
            errors,
            vec![
                Diagnostic::function(BindingError::MainFunctionReturnsValue),
                Diagnostic::function(BindingError::GenericMainFunction),
            ]
        );

        // The same function is fine as a call peer.
        assert!(compile(&decl, &Directive::new(DirectiveKind::CallFunction)).is_ok());
    }

    #[test]
    fn test_reserved_function_names() {
        let decl = FunctionDecl::new("__run__");
        let errors = compile(&decl, &Directive::new(DirectiveKind::CallFunction)).unwrap_err();
        assert_eq!(errors[0].error, BindingError::ReservedFunctionName);

        assert!(compile(&FunctionDecl::new("__run"), &Directive::new(DirectiveKind::CallFunction)).is_ok());
    }

    #[test]
    fn test_command_action_synthesizes_state() {
        let decl = greet_function().returning("Vec<Widget>");
        let binding = compile(&decl, &Directive::new(DirectiveKind::CommandAction)).unwrap();

        let names = binding.function.parameter_names();
        assert_eq!(names, vec!["upper", "lower", "name", "node_path", "state"]);
        assert_eq!(binding.parameters.len(), 3);
        assert!(binding.config.labels.get("state").is_none());
        assert_eq!(
            binding.state,
            Some(StateThread {
                element_type: "Widget".into(),
                synthesized: true
            })
        );
    }

    #[test]
    fn test_command_action_recompiles_identically() {
        let decl = greet_function().returning("Vec<Widget>");
        let directive = Directive::new(DirectiveKind::CommandAction);
        let first = compile(&decl, &directive).unwrap();
        let second = compile(&first.function, &directive).unwrap();

        assert_eq!(second.function, first.function);
        assert_eq!(second.parameters, first.parameters);
        assert_eq!(second.config, first.config);
        assert_eq!(
            second.state.as_ref().map(|s| &s.element_type),
            first.state.as_ref().map(|s| &s.element_type)
        );
    }

    #[test]
    fn test_chain_parameters_are_not_shadowable() {
        let decl = FunctionDecl::new("refine")
            .with_parameter(ParameterDecl::new("node_path", "Vec<ChainNode<u8>>"))
            .with_parameter(ParameterDecl::new("state", "Vec<u8>"));
        let directive = Directive::new(DirectiveKind::CommandAction)
            .with_shadow_group(ShadowGroupArg::Literal("state".into()));
        let errors = compile(&decl, &directive).unwrap_err();
        assert_eq!(errors[0].kind(), DiagnosticKind::ShadowGroupUnknownName);
    }

    #[test]
    fn test_state_parameters_are_ordinary_outside_command_actions() {
        let decl = FunctionDecl::new("save")
            .with_parameter(ParameterDecl::new("state", "Vec<u8>"))
            .with_parameter(ParameterDecl::new("force", "Flag").with_label("f"));
        let binding = compile(&decl, &Directive::new(DirectiveKind::CallFunction)).unwrap();
        assert_eq!(
            binding.parameter("state").map(|p| &p.category),
            Some(&TypeCategory::Array("u8".into()))
        );
        assert!(binding.state.is_none());
    }

    #[test]
    fn test_directive_kind_lookup() {
        assert_eq!(
            DirectiveKind::from_attribute_name("command_action"),
            Some(DirectiveKind::CommandAction)
        );
        assert_eq!(DirectiveKind::from_attribute_name("derive"), None);
        assert_eq!(DirectiveKind::CommandAction.peer_names(), &["action", "action_config"]);
    }
}
