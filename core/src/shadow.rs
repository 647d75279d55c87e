//! Shadow group resolution.
//!
//! A shadow group is a whitespace-separated list of parameter names that
//! shadow each other: only the last one given on the command line takes
//! effect. Resolution only validates membership; "last one wins" is applied
//! by the runtime.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::{ShadowGroupArg, resolve_shadow_groups};
//!
//! let groups = resolve_shadow_groups(
//!     &[ShadowGroupArg::Literal("lower upper".into())],
//!     &["lower", "upper", "name"],
//! )
//! .unwrap();
//! assert_eq!(groups[0].render(), "lower upper");
//!
//! let error = resolve_shadow_groups(
//!     &[ShadowGroupArg::Literal("lower upperX".into())],
//!     &["lower", "upper", "name"],
//! )
//! .unwrap_err();
//! assert_eq!(error.to_string(), "unrecognized shadowed parameter name: 'upperX'");
//! ```

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::diagnostic::{BindingError, Diagnostic};
use crate::types::ShadowGroup;

/// One `shadow_groups` element as written in the directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ShadowGroupArg {
    /// A string literal (its unquoted value).
    Literal(String),
    /// Any other expression (its source text).
    Expression(String),
}

/// Validates shadow group arguments against the declared parameter names.
///
/// Any non-literal argument aborts resolution before membership is
/// checked. Unknown names across all groups are reported together, sorted
/// and deduplicated, and no group is returned in that case. Strings with no
/// names in them contribute no group.
pub fn resolve_shadow_groups(
    args: &[ShadowGroupArg],
    parameter_names: &[&str],
) -> Result<Vec<ShadowGroup>, Diagnostic> {
    let mut literals = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            ShadowGroupArg::Literal(text) => literals.push(text.as_str()),
            ShadowGroupArg::Expression(_) => {
                return Err(Diagnostic::directive(BindingError::ShadowGroupsNotLiteral));
            }
        }
    }

    let known: HashSet<&str> = parameter_names.iter().copied().collect();
    let mut unknown: BTreeSet<&str> = BTreeSet::new();
    let mut groups = Vec::with_capacity(literals.len());

    for text in literals {
        let names: Vec<String> = text
            .split_whitespace()
            .inspect(|name| {
                if !known.contains(name) {
                    unknown.insert(*name);
                }
            })
            .map(String::from)
            .collect();
        if !names.is_empty() {
            groups.push(ShadowGroup { names });
        }
    }

    if !unknown.is_empty() {
        return Err(Diagnostic::directive(BindingError::UnknownShadowedNames {
            names: unknown.into_iter().map(String::from).collect(),
        }));
    }

    Ok(groups)
}
