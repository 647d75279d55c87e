use cmdbind_core::lower::{compile_signature, parse_directive, strip_arg_attributes};
use cmdbind_core::{BindingError, CompilerOptions, Diagnostic, DiagnosticTarget, DirectiveKind};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::{FnArg, ItemFn, Pat, PatType, Signature};

use crate::emit::{PeerContext, peers};

/// Expands one directive. The work function is always emitted, with its
/// `#[arg]` helper attributes removed, so diagnostics never cascade into
/// "function not found" errors at call sites.
pub(crate) fn expand(kind: DirectiveKind, attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut function = match syn::parse2::<ItemFn>(item.clone()) {
        Ok(function) => function,
        Err(_) => {
            let error = syn::Error::new(Span::call_site(), BindingError::NotAFunction.to_string())
                .to_compile_error();
            return quote! { #error #item };
        }
    };

    let directive = match parse_directive(kind, attr.clone()) {
        Ok(directive) => directive,
        Err(err) => {
            strip_arg_attributes(&mut function.sig);
            let error = err.to_compile_error();
            return quote! { #error #function };
        }
    };

    let options = CompilerOptions::default();
    let compiled = compile_signature(&function.sig, &function.vis, &directive, &options);
    strip_arg_attributes(&mut function.sig);

    let generated = compiled
        .map_err(|diagnostics| diagnostics_error(&diagnostics, &function.sig, &attr))
        .and_then(|binding| {
            peers(&PeerContext {
                binding: &binding,
                directive: &directive,
                function: &function,
                options: &options,
            })
        });

    match generated {
        Ok(peers) => quote! { #function #peers },
        Err(error) => {
            let error = error.to_compile_error();
            quote! { #error #function }
        }
    }
}

fn diagnostics_error(diagnostics: &[Diagnostic], sig: &Signature, attr: &TokenStream) -> syn::Error {
    diagnostics
        .iter()
        .map(|diagnostic| {
            let message = diagnostic.to_string();
            match &diagnostic.target {
                DiagnosticTarget::Function => syn::Error::new(sig.ident.span(), message),
                DiagnosticTarget::Directive if !attr.is_empty() => {
                    syn::Error::new_spanned(attr, message)
                }
                DiagnosticTarget::Directive => syn::Error::new(Span::call_site(), message),
                DiagnosticTarget::Parameter(name) => match find_parameter(sig, name) {
                    Some(parameter) => syn::Error::new_spanned(parameter, message),
                    None => syn::Error::new(sig.ident.span(), message),
                },
            }
        })
        .reduce(|mut combined, error| {
            combined.combine(error);
            combined
        })
        .unwrap_or_else(|| syn::Error::new(sig.ident.span(), "binding failed"))
}

fn find_parameter<'a>(sig: &'a Signature, name: &str) -> Option<&'a PatType> {
    sig.inputs.iter().find_map(|input| match input {
        FnArg::Typed(pat_type) => match pat_type.pat.as_ref() {
            Pat::Ident(pat) if pat.ident.unraw() == name => Some(pat_type),
            _ => None,
        },
        FnArg::Receiver(_) => None,
    })
}
