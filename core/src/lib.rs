//! Binding compiler for annotated command-line work functions.
//!
//! A work function declares its command-line interface through its
//! parameters: each parameter has a label (the aliases it is typed with), a
//! type (which decides how it is parsed) and an optional default. This crate
//! checks such a declaration and derives everything a runtime argument
//! parser needs:
//!
//! - [`classify_parameter`] puts each parameter in a [`TypeCategory`] and
//!   enforces the default-value rules of that category.
//! - [`derive_label_triple`] turns a label into short, legacy and long
//!   aliases; [`build_label_table`] also reports aliases claimed twice.
//! - [`resolve_shadow_groups`] validates groups of parameters where the
//!   last one given wins.
//! - [`thread_state`] resolves the chain state of a stateful command
//!   action, synthesizing its wiring parameters when they are omitted.
//! - [`assemble_config`] merges the results into a [`BindingConfig`].
//!
//! [`compile_binding`] runs all of it and reports every violation in one
//! pass through [`Diagnostics`]. With the `syn` feature, the [`lower`]
//! module turns `syn` signatures into the [`FunctionDecl`] model.
//!
//! # Example
//!
//! ```
//! use cmdbind_core::*;
//!
//! let decl = FunctionDecl::new("m1Greet")
//!     .with_parameter(ParameterDecl::new("upper", "Flag").with_label("u"))
//!     .with_parameter(ParameterDecl::new("lower", "Flag").with_label("l"))
//!     .with_parameter(ParameterDecl::new("name", "String").positional());
//! let directive = Directive::new(DirectiveKind::MainFunction)
//!     .with_shadow_group(ShadowGroupArg::Literal("lower upper".into()));
//!
//! let binding = compile_binding(&decl, &directive, &CompilerOptions::default()).unwrap();
//! assert_eq!(binding.call_name, "m1-greet");
//! assert_eq!(binding.config.shadow_groups, vec!["lower upper"]);
//! assert_eq!(binding.config.labels.get("upper").unwrap().spellings(), vec!["-u"]);
//! ```

mod classify;
mod compile;
mod config;
mod diagnostic;
mod labels;
#[cfg(feature = "syn")]
pub mod lower;
mod options;
mod shadow;
mod state;
mod type_text;
mod types;

pub use classify::{EMPTY_SEQUENCE_DEFAULTS, classify_parameter, classify_parameters, type_category};
pub use compile::{CompiledBinding, Directive, DirectiveKind, compile_binding};
pub use config::{BindingConfig, MetaFlagDefault, assemble_config};
pub use diagnostic::{BindingError, Diagnostic, DiagnosticKind, DiagnosticTarget, Diagnostics};
pub use labels::{LabelEntry, LabelTable, build_label_table, derive_label_triple, is_valid_label};
pub use options::CompilerOptions;
pub use shadow::{ShadowGroupArg, resolve_shadow_groups};
pub use state::{ThreadedSignature, thread_state};
pub use type_text::normalize_type_text;
pub use types::*;
