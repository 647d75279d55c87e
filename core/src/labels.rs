//! Label derivation and alias conflict detection.
//!
//! A label becomes up to three aliases:
//!
//! | Label      | Short | Legacy  | Long    |
//! |------------|-------|---------|---------|
//! | `i`        | `i`   |         |         |
//! | `count`    |       | `count` | `count` |
//! | `h__help`  | `h`   |         | `help`  |
//! | `ab__all`  |       | `ab`    | `all`   |
//! | `h__`      | `h`   |         |         |
//! | `_`        |       |         |         |
//! | (empty)    |       |         |         |
//!
//! The label is split on the first occurrence of the separator only; the
//! remainder (which may itself contain the separator) is the long alias.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::derive_label_triple;
//!
//! let triple = derive_label_triple("h__help", "__");
//! assert_eq!(triple.short.as_deref(), Some("h"));
//! assert_eq!(triple.legacy, None);
//! assert_eq!(triple.long.as_deref(), Some("help"));
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::diagnostic::{BindingError, Diagnostic, Diagnostics};
use crate::types::{LabelTriple, POSITIONAL_LABEL, ParameterSpec};

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]*$").expect("static regex must compile"));

/// One row of the label table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub parameter: String,
    #[serde(flatten)]
    pub triple: LabelTriple,
}

/// Parameter name → aliases, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelTable {
    entries: Vec<LabelEntry>,
}

impl LabelTable {
    /// Looks up the aliases of a parameter.
    pub fn get(&self, parameter: &str) -> Option<&LabelTriple> {
        self.entries
            .iter()
            .find(|entry| entry.parameter == parameter)
            .map(|entry| &entry.triple)
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a label uses only ASCII letters, digits and `_`.
///
/// The empty label is accepted and derives no aliases.
pub fn is_valid_label(label: &str) -> bool {
    LABEL_RE.is_match(label)
}

/// Derives the alias triple of a (valid) label.
pub fn derive_label_triple(label: &str, separator: &str) -> LabelTriple {
    if label == POSITIONAL_LABEL {
        return LabelTriple::default();
    }

    match label.split_once(separator) {
        Some((head, tail)) => {
            let (short, legacy) = split_head(head);
            LabelTriple {
                short,
                legacy,
                long: (!tail.is_empty()).then(|| tail.to_string()),
            }
        }
        None => {
            let (short, legacy) = split_head(label);
            let long = legacy.clone();
            LabelTriple {
                short,
                legacy,
                long,
            }
        }
    }
}

fn split_head(head: &str) -> (Option<String>, Option<String>) {
    match head.chars().count() {
        0 => (None, None),
        1 => (Some(head.to_string()), None),
        _ => (None, Some(head.to_string())),
    }
}

/// Builds the label table for the given parameters.
///
/// Parameters with an invalid label are reported and left out of the
/// table. Every alias claimed by more than one parameter produces one
/// [`BindingError::DuplicateAlias`] naming all claimants.
pub fn build_label_table(
    specs: &[ParameterSpec],
    separator: &str,
    diagnostics: &mut Diagnostics,
) -> LabelTable {
    let mut table = LabelTable::default();
    let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for spec in specs {
        if !is_valid_label(&spec.label) {
            diagnostics.push(Diagnostic::parameter(
                &spec.name,
                BindingError::InvalidLabel {
                    parameter: spec.name.clone(),
                    label: spec.label.clone(),
                },
            ));
            continue;
        }

        let triple = derive_label_triple(&spec.label, separator);
        trace!(parameter = %spec.name, aliases = ?triple.spellings(), "derived aliases");
        for alias in triple.aliases() {
            claims
                .entry(alias.to_string())
                .or_default()
                .push(spec.name.clone());
        }
        table.entries.push(LabelEntry {
            parameter: spec.name.clone(),
            triple,
        });
    }

    for (alias, parameters) in claims {
        if parameters.len() > 1 {
            diagnostics.push(Diagnostic::function(BindingError::DuplicateAlias {
                alias,
                parameters,
            }));
        }
    }

    table
}
