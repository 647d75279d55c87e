//! Emitted configuration assembly.

use serde::{Deserialize, Serialize};

use crate::labels::LabelTable;
use crate::types::{ParameterSpec, ShadowGroup, TypeCategory};

/// Default payload of one meta flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFlagDefault {
    pub parameter: String,
    /// Default expression text.
    pub default: String,
}

/// Declarative configuration handed to the runtime by generated code.
///
/// # Examples
///
/// ```
/// use cmdbind_core::{LabelTable, ParameterSpec, ShadowGroup, TypeCategory, assemble_config};
///
/// let specs = vec![ParameterSpec {
///     name: "version".into(),
///     label: "v__version".into(),
///     category: TypeCategory::MetaFlag,
///     default: Some("MetaFlag::text(\"0.1.0\")".into()),
/// }];
/// let groups = vec![ShadowGroup { names: vec!["lower".into(), "upper".into()] }];
/// let config = assemble_config(&specs, &groups, LabelTable::default());
///
/// assert_eq!(config.meta_flags[0].parameter, "version");
/// assert_eq!(config.shadow_groups, vec!["lower upper"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Meta flag name → default payload, in declaration order.
    pub meta_flags: Vec<MetaFlagDefault>,
    /// Validated shadow groups, space-joined.
    pub shadow_groups: Vec<String>,
    /// Parameter name → aliases.
    pub labels: LabelTable,
}

/// Merges classified parameters, shadow groups and labels.
///
/// Only meta flags that carry a default contribute to the meta flag table.
pub fn assemble_config(
    specs: &[ParameterSpec],
    shadow_groups: &[ShadowGroup],
    labels: LabelTable,
) -> BindingConfig {
    let meta_flags = specs
        .iter()
        .filter(|spec| spec.category == TypeCategory::MetaFlag)
        .filter_map(|spec| {
            spec.default.as_ref().map(|default| MetaFlagDefault {
                parameter: spec.name.clone(),
                default: default.clone(),
            })
        })
        .collect();

    BindingConfig {
        meta_flags,
        shadow_groups: shadow_groups.iter().map(ShadowGroup::render).collect(),
        labels,
    }
}
