//! Attribute macros that bind work functions to the command line.
//!
//! Each directive checks the annotated work function with
//! [`cmdbind_core::compile_binding`]. On success the function is kept as
//! written and one or two peer functions are generated next to it; on
//! failure every diagnostic is reported at the declaration it refers to and
//! no peers are generated.
//!
//! Users should depend on the runtime crate, which re-exports these macros
//! together with the types the generated peers use.
//!
//! # Example
//!
//! ```ignore
//! use cmdbind::{Flag, MetaFlag, main_function};
//!
//! #[main_function(shadow_groups = ["lower upper"])]
//! fn greet(
//!     #[arg(label = u)] upper: Flag,
//!     #[arg(label = l)] lower: Flag,
//!     #[arg(label = h__help, default = MetaFlag::help(HELP))] help: MetaFlag,
//!     #[arg(positional)] name: String,
//! ) {
//!     // ...
//! }
//! ```
//!
//! `#[arg(...)]` is an inert helper attribute consumed by the directive; it
//! is removed from the work function before it is emitted.

use cmdbind_core::DirectiveKind;
use proc_macro::TokenStream;

mod emit;
mod expand;
mod tagged;

/// Generates the program entry point `main`, which parses the process
/// arguments and calls the work function.
///
/// The work function may not return a value.
#[proc_macro_attribute]
pub fn main_function(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand(DirectiveKind::MainFunction, attr.into(), item.into()).into()
}

/// Generates `call(args)`, which parses `args` and returns the work
/// function's result.
#[proc_macro_attribute]
pub fn call_function(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand(DirectiveKind::CallFunction, attr.into(), item.into()).into()
}

/// Generates `action` and `action_config` for a command in a chain.
///
/// `node_path` and `state` are appended to the generated `action` when the
/// work function does not declare them.
#[proc_macro_attribute]
pub fn command_action(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand(DirectiveKind::CommandAction, attr.into(), item.into()).into()
}

/// Builds a `Vec<String>` of `"name: value"` entries.
///
/// Values are rendered with their `Debug` impl, so strings keep their
/// quotes:
///
/// ```ignore
/// let upper = true;
/// let name = String::from("Bob");
/// assert_eq!(tagged_values!(upper, name), vec!["upper: true", "name: \"Bob\""]);
/// ```
///
/// Arguments that are not plain identifiers are skipped.
#[proc_macro]
pub fn tagged_values(input: TokenStream) -> TokenStream {
    tagged::expand(input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
