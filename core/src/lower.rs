//! Lowering from `syn` syntax trees to the binding model.
//!
//! Enabled with the `syn` feature. Parameters carry their label and default
//! in a helper attribute:
//!
//! ```text
//! #[main_function(shadow_groups = ["lower upper"])]
//! fn greet(
//!     #[arg(label = u)] upper: Flag,
//!     #[arg(label = l)] lower: Flag,
//!     #[arg(default = 1)] count: i32,
//!     #[arg(positional)] name: String,
//! ) { ... }
//! ```
//!
//! A parameter with no `label` uses its own name as the label.

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::ext::IdentExt;
use syn::parse::Parser;
use syn::{
    Attribute, Expr, ExprLit, FnArg, GenericArgument, Ident, Lit, LitStr, Meta, Pat, PatType,
    PathArguments, ReturnType, Signature, Type, Visibility,
};

use crate::compile::{CompiledBinding, Directive, DirectiveKind, compile_binding};
use crate::diagnostic::{BindingError, Diagnostic};
use crate::options::CompilerOptions;
use crate::shadow::ShadowGroupArg;
use crate::type_text::normalize_type_text;
use crate::types::{FunctionDecl, ParameterDecl};

/// Name of the per-parameter helper attribute.
pub const ARG_ATTRIBUTE: &str = "arg";

/// Parsed `#[arg(...)]` contents.
#[derive(Debug, Clone, Default)]
pub struct ArgAttribute {
    pub label: Option<String>,
    pub positional: bool,
    pub default: Option<Expr>,
}

/// Parses every `#[arg(...)]` attribute in `attrs`; later keys win.
pub fn parse_arg_attribute(attrs: &[Attribute]) -> syn::Result<ArgAttribute> {
    let mut parsed = ArgAttribute::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(ARG_ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("label") {
                let value = meta.value()?;
                let label = if value.peek(LitStr) {
                    value.parse::<LitStr>()?.value()
                } else {
                    value.call(Ident::parse_any)?.unraw().to_string()
                };
                parsed.label = Some(label);
                Ok(())
            } else if meta.path.is_ident("positional") {
                parsed.positional = true;
                Ok(())
            } else if meta.path.is_ident("default") {
                parsed.default = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else {
                Err(meta.error("expected `label`, `positional` or `default`"))
            }
        })?;
    }

    Ok(parsed)
}

/// Removes `#[arg(...)]` attributes from the signature's parameters.
pub fn strip_arg_attributes(sig: &mut Signature) {
    for input in sig.inputs.iter_mut() {
        if let FnArg::Typed(pat_type) = input {
            pat_type
                .attrs
                .retain(|attr| !attr.path().is_ident(ARG_ATTRIBUTE));
        }
    }
}

/// Splits a return type into its success type and whether it is a `Result`.
///
/// `-> Result<T, E>` (or any `Result<T, ..>` alias) gives `(Some(T), true)`;
/// no return type gives `(None, false)`.
pub fn success_type(output: &ReturnType) -> (Option<&Type>, bool) {
    match output {
        ReturnType::Default => (None, false),
        ReturnType::Type(_, ty) => match result_ok_type(ty) {
            Some(ok) => (Some(ok), true),
            None => (Some(ty.as_ref()), false),
        },
    }
}

fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Normalised source text of a type.
pub fn type_text(ty: &Type) -> String {
    token_text(ty)
}

fn token_text<T: ToTokens>(node: &T) -> String {
    normalize_type_text(&node.to_token_stream().to_string())
}

/// Lowers a function signature.
///
/// Unsupported parameters are reported and left out; the returned
/// declaration is always usable for further checking.
pub fn lower_function(sig: &Signature, vis: &Visibility) -> (FunctionDecl, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut decl = FunctionDecl::new(sig.ident.unraw().to_string());

    if !sig.generics.params.is_empty() {
        decl.generics = token_text(&sig.generics);
    }

    let mut modifiers = vis.to_token_stream();
    sig.constness.to_tokens(&mut modifiers);
    sig.unsafety.to_tokens(&mut modifiers);
    decl.modifiers = normalize_type_text(&modifiers.to_string());
    decl.is_async = sig.asyncness.is_some();

    let (success, fallible) = success_type(&sig.output);
    decl.fallible = fallible;
    if let Some(ty) = success {
        decl = decl.returning(&type_text(ty));
    }

    for input in &sig.inputs {
        match input {
            FnArg::Receiver(_) => {
                diagnostics.push(Diagnostic::function(BindingError::SelfReceiver));
            }
            FnArg::Typed(pat_type) => match lower_parameter(pat_type) {
                Ok(parameter) => decl.parameters.push(parameter),
                Err(diagnostic) => diagnostics.push(diagnostic),
            },
        }
    }

    (decl, diagnostics)
}

fn lower_parameter(pat_type: &PatType) -> Result<ParameterDecl, Diagnostic> {
    let ident = match pat_type.pat.as_ref() {
        Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => &pat.ident,
        other => {
            return Err(Diagnostic::function(BindingError::UnsupportedPattern {
                pattern: token_text(other),
            }));
        }
    };
    let name = ident.unraw().to_string();

    let arg = parse_arg_attribute(&pat_type.attrs).map_err(|err| {
        Diagnostic::parameter(&name, BindingError::InvalidArgument(err.to_string()))
    })?;

    let mut parameter = ParameterDecl::new(name, &type_text(&pat_type.ty));
    if let Some(label) = arg.label {
        parameter = parameter.with_label(label);
    }
    if arg.positional {
        parameter = parameter.positional();
    }
    if let Some(default) = &arg.default {
        parameter = parameter.with_default(&token_text(default));
    }
    Ok(parameter)
}

/// Directive named by an attribute, matched on its last path segment.
pub fn directive_kind(attr: &Attribute) -> Option<DirectiveKind> {
    let segment = attr.path().segments.last()?;
    DirectiveKind::from_attribute_name(&segment.ident.to_string())
}

/// Parses directive arguments: `shadow_groups = [...]`, `associated`,
/// `runtime = "path"`.
///
/// Shadow group elements are kept as written; non-literal elements are
/// reported later by shadow group resolution.
pub fn parse_directive(kind: DirectiveKind, args: TokenStream) -> syn::Result<Directive> {
    let mut directive = Directive::new(kind);

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("shadow_groups") {
            let expr: Expr = meta.value()?.parse()?;
            directive.shadow_groups = shadow_group_args(&expr);
            Ok(())
        } else if meta.path.is_ident("associated") {
            directive.associated = true;
            Ok(())
        } else if meta.path.is_ident("runtime") {
            let path: LitStr = meta.value()?.parse()?;
            directive.runtime = Some(path.value());
            Ok(())
        } else {
            Err(meta.error("expected `shadow_groups`, `associated` or `runtime`"))
        }
    });
    parser.parse2(args)?;

    Ok(directive)
}

/// Parses the directive written as an attribute on an item.
pub fn directive_from_attribute(kind: DirectiveKind, attr: &Attribute) -> syn::Result<Directive> {
    match &attr.meta {
        Meta::Path(_) => Ok(Directive::new(kind)),
        Meta::List(list) => parse_directive(kind, list.tokens.clone()),
        Meta::NameValue(name_value) => Err(syn::Error::new_spanned(
            name_value,
            "expected a parenthesized argument list",
        )),
    }
}

fn shadow_group_args(expr: &Expr) -> Vec<ShadowGroupArg> {
    match expr {
        Expr::Array(array) => array.elems.iter().map(shadow_group_arg).collect(),
        other => vec![shadow_group_arg(other)],
    }
}

fn shadow_group_arg(expr: &Expr) -> ShadowGroupArg {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(text),
            ..
        }) => ShadowGroupArg::Literal(text.value()),
        other => ShadowGroupArg::Expression(token_text(other)),
    }
}

/// Lowers and compiles one annotated function signature, reporting
/// lowering and compiler diagnostics together.
pub fn compile_signature(
    sig: &Signature,
    vis: &Visibility,
    directive: &Directive,
    options: &CompilerOptions,
) -> Result<CompiledBinding, Vec<Diagnostic>> {
    let (decl, mut diagnostics) = lower_function(sig, vis);
    match compile_binding(&decl, directive, options) {
        Ok(binding) if diagnostics.is_empty() => Ok(binding),
        Ok(_) => Err(diagnostics),
        Err(found) => {
            diagnostics.extend(found);
            Err(diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;
    use syn::{ItemFn, parse_quote};

    use crate::diagnostic::DiagnosticKind;
    use crate::types::TypeCategory;

    fn lower(item: ItemFn) -> (FunctionDecl, Vec<Diagnostic>) {
        lower_function(&item.sig, &item.vis)
    }

    #[test]
    fn test_lower_reads_arg_attributes() {
        let (decl, diagnostics) = lower(parse_quote! {
            pub fn mf0_print(
                #[arg(label = i)] show_index: Flag,
                #[arg(default = 1)] count: i32,
                #[arg(positional)] phrase: String,
                #[arg(label = "h__help", default = MetaFlag::text("usage"))] help: MetaFlag,
            ) {}
        });

        assert!(diagnostics.is_empty());
        assert_eq!(decl.name, "mf0_print");
        assert_eq!(decl.modifiers, "pub");
        assert_eq!(decl.parameters[0].label, "i");
        assert_eq!(decl.parameters[1].default.as_deref(), Some("1"));
        assert_eq!(decl.parameters[2].label, "_");
        assert_eq!(decl.parameters[3].label, "h__help");
        assert_eq!(
            decl.parameters[3].default.as_deref(),
            Some("MetaFlag::text(\"usage\")")
        );
    }

    #[test]
    fn test_lower_unwraps_result_and_async() {
        let (decl, _) = lower(parse_quote! {
            async fn build(size: u32) -> Result<Vec<Widget>, BuildError> { todo!() }
        });
        assert!(decl.is_async);
        assert!(decl.fallible);
        assert_eq!(decl.return_type, "Vec<Widget>");

        let (decl, _) = lower(parse_quote! {
            fn save() -> anyhow::Result<()> { Ok(()) }
        });
        assert!(decl.fallible);
        assert_eq!(decl.return_type, "");
    }

    #[test]
    fn test_lower_keeps_generics_text() {
        let (decl, _) = lower(parse_quote! {
            fn render<T: Display>(value: T) {}
        });
        assert_eq!(decl.generics, "<T:Display>");
    }

    #[test]
    fn test_lower_rejects_receivers_and_patterns() {
        let (decl, diagnostics) = lower(parse_quote! {
            fn run(&self, (a, b): (u8, u8), ok: bool) {}
        });
        assert_eq!(decl.parameter_names(), vec!["ok"]);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].error, BindingError::SelfReceiver);
        assert!(matches!(
            diagnostics[1].error,
            BindingError::UnsupportedPattern { .. }
        ));
    }

    #[test]
    fn test_lower_reports_unknown_arg_keys() {
        let (_, diagnostics) = lower(parse_quote! {
            fn run(#[arg(lable = x)] verbose: Flag) {}
        });
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::UsageError);
        assert_eq!(
            diagnostics[0].target,
            crate::diagnostic::DiagnosticTarget::Parameter("verbose".into())
        );
    }

    #[test]
    fn test_strip_arg_attributes() {
        let mut item: ItemFn = parse_quote! {
            fn run(#[arg(label = v)] #[allow(unused)] verbose: Flag) {}
        };
        strip_arg_attributes(&mut item.sig);
        let FnArg::Typed(pat_type) = &item.sig.inputs[0] else {
            panic!("expected typed argument");
        };
        assert_eq!(pat_type.attrs.len(), 1);
        assert!(pat_type.attrs[0].path().is_ident("allow"));
    }

    #[test]
    fn test_parse_directive_arguments() {
        let directive = parse_directive(
            DirectiveKind::MainFunction,
            quote!(shadow_groups = ["lower upper", GROUP], associated, runtime = "crate::rt"),
        )
        .unwrap();

        assert_eq!(
            directive.shadow_groups,
            vec![
                ShadowGroupArg::Literal("lower upper".into()),
                ShadowGroupArg::Expression("GROUP".into()),
            ]
        );
        assert!(directive.associated);
        assert_eq!(directive.runtime_path(), "crate::rt");

        assert!(parse_directive(DirectiveKind::CallFunction, quote!(bogus)).is_err());
    }

    #[test]
    fn test_directive_from_attribute() {
        let attr: Attribute = parse_quote!(#[cmdbind::command_action]);
        assert_eq!(directive_kind(&attr), Some(DirectiveKind::CommandAction));
        let directive = directive_from_attribute(DirectiveKind::CommandAction, &attr).unwrap();
        assert!(directive.shadow_groups.is_empty());

        let attr: Attribute = parse_quote!(#[derive(Debug)]);
        assert_eq!(directive_kind(&attr), None);
    }

    #[test]
    fn test_compile_signature_merges_diagnostics() {
        let item: ItemFn = parse_quote! {
            fn shout(&self, #[arg(label = u, default = true)] upper: Flag) {}
        };
        let errors = compile_signature(
            &item.sig,
            &item.vis,
            &Directive::new(DirectiveKind::CallFunction),
            &CompilerOptions::default(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 2);

        let item: ItemFn = parse_quote! {
            fn greet(#[arg(positional)] name: Option<String>) {}
        };
        let binding = compile_signature(
            &item.sig,
            &item.vis,
            &Directive::new(DirectiveKind::CallFunction),
            &CompilerOptions::default(),
        )
        .unwrap();
        assert_eq!(
            binding.parameters[0].category,
            TypeCategory::Optional("String".into())
        );
    }
}
