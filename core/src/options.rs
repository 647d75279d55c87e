//! Compiler options.
//!
//! The reserved type names and the label separator are configurable so a
//! runtime crate can rename its collaborator types. Options deserialize
//! with every field optional:
//!
//! ```yaml
//! flag_type: Switch
//! label_separator: "__"
//! ```

use serde::{Deserialize, Serialize};

/// Reserved names and separators recognised by the compiler.
///
/// # Examples
///
/// ```
/// use cmdbind_core::CompilerOptions;
///
/// let options = CompilerOptions::default();
/// assert_eq!(options.flag_type, "Flag");
/// assert_eq!(options.meta_flag_type, "MetaFlag");
/// assert_eq!(options.label_separator, "__");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Type name classified as a boolean-like flag.
    pub flag_type: String,
    /// Type name classified as a meta flag.
    pub meta_flag_type: String,
    /// Generic wrapper classified as a variadic.
    pub variadic_type: String,
    /// Generic chain node type used by stateful command actions.
    pub chain_node_type: String,
    /// Separator between the short and long parts of a label.
    pub label_separator: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            flag_type: "Flag".to_string(),
            meta_flag_type: "MetaFlag".to_string(),
            variadic_type: "Variadic".to_string(),
            chain_node_type: "ChainNode".to_string(),
            label_separator: "__".to_string(),
        }
    }
}
