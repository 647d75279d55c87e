//! Parameter classification.
//!
//! Turns each declared parameter into a [`ParameterSpec`] and checks its
//! default against the rules of its type category. Every parameter is
//! classified even when an earlier one fails, so a function with several
//! defects is reported in full.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::{CompilerOptions, ParameterDecl, TypeCategory, classify_parameter};
//!
//! let options = CompilerOptions::default();
//! let (spec, diagnostics) = classify_parameter(&ParameterDecl::new("count", "i32"), &options);
//! assert_eq!(spec.category, TypeCategory::Value("i32".into()));
//! assert!(diagnostics.is_empty());
//!
//! // Flags may never default to true.
//! let upper = ParameterDecl::new("upper", "Flag").with_label("u").with_default("true");
//! let (_, diagnostics) = classify_parameter(&upper, &options);
//! assert_eq!(diagnostics.len(), 1);
//! ```

use crate::diagnostic::{BindingError, Diagnostic, Diagnostics};
use crate::options::CompilerOptions;
use crate::type_text::split_generic;
use crate::types::{POSITIONAL_LABEL, ParameterDecl, ParameterSpec, TypeCategory};

/// Default texts accepted for arrays and variadics.
pub const EMPTY_SEQUENCE_DEFAULTS: &[&str] = &["vec![]", "Vec::new()", "Default::default()"];

const TRUE_LITERAL: &str = "true";
const NONE_LITERAL: &str = "None";

/// Maps declared type text to its category.
pub fn type_category(type_text: &str, options: &CompilerOptions) -> TypeCategory {
    if let Some((head, inner)) = split_generic(type_text) {
        let inner = inner.to_string();
        if head == "Vec" {
            return TypeCategory::Array(inner);
        }
        if head == "Option" {
            return TypeCategory::Optional(inner);
        }
        if head == options.variadic_type {
            return TypeCategory::Variadic(inner);
        }
    }

    let last_segment = type_text.rsplit("::").next().unwrap_or(type_text);
    if last_segment == options.flag_type {
        TypeCategory::Flag
    } else if last_segment == options.meta_flag_type {
        TypeCategory::MetaFlag
    } else {
        TypeCategory::Value(type_text.to_string())
    }
}

/// Classifies one parameter, returning its spec and any violations.
pub fn classify_parameter(
    decl: &ParameterDecl,
    options: &CompilerOptions,
) -> (ParameterSpec, Vec<Diagnostic>) {
    let category = type_category(&decl.type_text, options);
    let default = decl.default.as_deref();
    let parameter = decl.name.clone();
    let mut errors = Vec::new();

    match &category {
        TypeCategory::Flag | TypeCategory::MetaFlag => {
            let is_flag = category == TypeCategory::Flag;
            if is_flag && default == Some(TRUE_LITERAL) {
                errors.push(BindingError::FlagDefaultsToTrue {
                    parameter: parameter.clone(),
                });
            }
            if !is_flag && default.is_none() {
                errors.push(BindingError::MissingMetaFlagDefault {
                    parameter: parameter.clone(),
                });
            }
            if decl.label == POSITIONAL_LABEL || decl.label.is_empty() {
                let type_name = if is_flag {
                    &options.flag_type
                } else {
                    &options.meta_flag_type
                };
                errors.push(BindingError::UnlabeledFlag {
                    parameter: parameter.clone(),
                    type_name: type_name.clone(),
                });
            }
        }
        TypeCategory::Optional(_) => {
            if default.is_some_and(|d| d != NONE_LITERAL) {
                errors.push(BindingError::OptionalWithDefault {
                    parameter: parameter.clone(),
                });
            }
        }
        TypeCategory::Array(_) | TypeCategory::Variadic(_) => {
            if default.is_some_and(|d| !EMPTY_SEQUENCE_DEFAULTS.contains(&d)) {
                let category = if matches!(category, TypeCategory::Array(_)) {
                    "arrays"
                } else {
                    "variadics"
                };
                errors.push(BindingError::NonEmptySequenceDefault {
                    parameter: parameter.clone(),
                    category: category.to_string(),
                });
            }
        }
        TypeCategory::Value(_) => {}
    }

    let spec = ParameterSpec {
        name: decl.name.clone(),
        label: decl.label.clone(),
        category,
        default: decl.default.clone(),
    };
    let diagnostics = errors
        .into_iter()
        .map(|error| Diagnostic::parameter(&parameter, error))
        .collect();
    (spec, diagnostics)
}

/// Classifies every parameter, accumulating violations.
pub fn classify_parameters(
    decls: &[ParameterDecl],
    options: &CompilerOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<ParameterSpec> {
    decls
        .iter()
        .map(|decl| {
            let (spec, found) = classify_parameter(decl, options);
            diagnostics.extend(found);
            spec
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;

    fn classify(decl: ParameterDecl) -> (ParameterSpec, Vec<Diagnostic>) {
        classify_parameter(&decl, &CompilerOptions::default())
    }

    #[test]
    fn test_type_category_mapping() {
        let options = CompilerOptions::default();
        assert_eq!(type_category("Flag", &options), TypeCategory::Flag);
        assert_eq!(type_category("cmdbind::MetaFlag", &options), TypeCategory::MetaFlag);
        assert_eq!(
            type_category("Option<u32>", &options),
            TypeCategory::Optional("u32".into())
        );
        assert_eq!(
            type_category("Vec<String>", &options),
            TypeCategory::Array("String".into())
        );
        assert_eq!(
            type_category("Variadic<PathBuf>", &options),
            TypeCategory::Variadic("PathBuf".into())
        );
        assert_eq!(
            type_category("HashMap<K,V>", &options),
            TypeCategory::Value("HashMap<K,V>".into())
        );
    }

    #[test]
    fn test_type_category_honours_renamed_types() {
        let options = CompilerOptions {
            flag_type: "Switch".into(),
            ..CompilerOptions::default()
        };
        assert_eq!(type_category("Switch", &options), TypeCategory::Flag);
        assert_eq!(
            type_category("Flag", &options),
            TypeCategory::Value("Flag".into())
        );
    }

    #[test]
    fn test_flag_defaults() {
        let (_, errors) = classify(ParameterDecl::new("upper", "Flag").with_label("u").with_default("true"));
        assert_eq!(
            errors,
            vec![Diagnostic::parameter(
                "upper",
                BindingError::FlagDefaultsToTrue {
                    parameter: "upper".into()
                }
            )]
        );

        let (_, errors) = classify(ParameterDecl::new("upper", "Flag").with_label("u").with_default("false"));
        assert!(errors.is_empty());

        let (_, errors) = classify(ParameterDecl::new("upper", "Flag").with_label("u"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_meta_flag_requires_default() {
        let (_, errors) = classify(ParameterDecl::new("help", "MetaFlag").with_label("h__help"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error.kind(), DiagnosticKind::TypeConstraintViolation);

        let (spec, errors) = classify(
            ParameterDecl::new("help", "MetaFlag")
                .with_label("h__help")
                .with_default("MetaFlag::text(\"usage\")"),
        );
        assert!(errors.is_empty());
        assert_eq!(spec.category, TypeCategory::MetaFlag);
    }

    #[test]
    fn test_unlabeled_flags_are_rejected() {
        let (_, errors) = classify(ParameterDecl::new("verbose", "Flag").positional());
        assert_eq!(
            errors,
            vec![Diagnostic::parameter(
                "verbose",
                BindingError::UnlabeledFlag {
                    parameter: "verbose".into(),
                    type_name: "Flag".into()
                }
            )]
        );

        // Both violations are reported for the same parameter.
        let (_, errors) = classify(ParameterDecl::new("help", "MetaFlag").positional());
        assert_eq!(errors.len(), 2);

        let (_, errors) = classify(ParameterDecl::new("verbose", "Flag").with_label(""));
        assert_eq!(errors[0].kind(), DiagnosticKind::TypeConstraintViolation);
    }

    #[test]
    fn test_optional_defaults() {
        let (_, errors) = classify(ParameterDecl::new("repeats", "Option<u32>").with_default("Some(3)"));
        assert_eq!(
            errors[0].error,
            BindingError::OptionalWithDefault {
                parameter: "repeats".into()
            }
        );

        let (_, errors) = classify(ParameterDecl::new("repeats", "Option<u32>").with_default("None"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_sequence_defaults() {
        let (_, errors) = classify(ParameterDecl::new("files", "Vec<String>").with_default("vec![]"));
        assert!(errors.is_empty());

        let (_, errors) = classify(ParameterDecl::new("files", "Vec<String>").with_default("Vec :: new ()"));
        assert!(errors.is_empty());

        let (_, errors) = classify(
            ParameterDecl::new("files", "Vec<String>").with_default("vec![\"a\".into()]"),
        );
        assert_eq!(
            errors[0].error,
            BindingError::NonEmptySequenceDefault {
                parameter: "files".into(),
                category: "arrays".into()
            }
        );

        let (_, errors) = classify(ParameterDecl::new("rest", "Variadic<String>").with_default("vec![1]"));
        assert!(errors[0].error.to_string().ends_with("variadics"));
    }

    #[test]
    fn test_classify_parameters_reports_every_parameter() {
        let decls = vec![
            ParameterDecl::new("upper", "Flag").with_label("u").with_default("true"),
            ParameterDecl::new("count", "i32").with_default("1"),
            ParameterDecl::new("help", "MetaFlag").with_label("h__help"),
        ];
        let mut diagnostics = Diagnostics::default();
        let specs = classify_parameters(&decls, &CompilerOptions::default(), &mut diagnostics);

        assert_eq!(specs.len(), 3);
        assert_eq!(diagnostics.len(), 2);
    }
}
