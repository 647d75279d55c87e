//! Peer function generation.
//!
//! Generated code only talks to the runtime crate through
//! `PeerFunctionConfig`, `ParameterLabels`, `MetaFlagProtocol`,
//! `parse_arguments`, `ChainNode`, `Error`, `exit_with_error` and
//! `block_on`.

use cmdbind_core::{CompiledBinding, CompilerOptions, Directive, DirectiveKind, TypeCategory};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Expr, Ident, ItemFn, Path, Type};

/// Everything a peer needs to know about the binding it belongs to.
pub(crate) struct PeerContext<'a> {
    pub binding: &'a CompiledBinding,
    pub directive: &'a Directive,
    pub function: &'a ItemFn,
    pub options: &'a CompilerOptions,
}

pub(crate) fn peers(cx: &PeerContext<'_>) -> syn::Result<TokenStream> {
    match cx.binding.kind {
        DirectiveKind::MainFunction => main_peer(cx),
        DirectiveKind::CallFunction => call_peer(cx),
        DirectiveKind::CommandAction => {
            let config = action_config_peer(cx)?;
            let action = action_peer(cx)?;
            Ok(quote! { #config #action })
        }
    }
}

fn main_peer(cx: &PeerContext<'_>) -> syn::Result<TokenStream> {
    let rt = runtime(cx)?;
    let vis = &cx.function.vis;
    let prelude = prelude(cx, &rt)?;
    let invoke = invoke(cx, &rt, &[]);

    let run = if cx.binding.function.is_async {
        quote! {
            #rt::block_on(async move {
                #prelude
                #invoke;
                ::std::result::Result::Ok::<(), #rt::Error>(())
            })
        }
    } else {
        quote! {
            (|| -> ::std::result::Result<(), #rt::Error> {
                #prelude
                #invoke;
                ::std::result::Result::Ok(())
            })()
        }
    };

    Ok(quote! {
        #vis fn main() {
            let __args: ::std::vec::Vec<::std::string::String> = ::std::env::args().skip(1).collect();
            let __args = __args.as_slice();
            if let ::std::result::Result::Err(__error) = #run {
                #rt::exit_with_error(__error);
            }
        }
    })
}

fn call_peer(cx: &PeerContext<'_>) -> syn::Result<TokenStream> {
    let rt = runtime(cx)?;
    let vis = &cx.function.vis;
    let asyncness = &cx.function.sig.asyncness;
    let (impl_generics, _, where_clause) = cx.function.sig.generics.split_for_impl();
    let output = parse_type(&cx.binding.function.return_type)?;
    let prelude = prelude(cx, &rt)?;
    let invoke = invoke(cx, &rt, &[]);

    Ok(quote! {
        #vis #asyncness fn call #impl_generics (
            __args: &[::std::string::String],
        ) -> ::std::result::Result<#output, #rt::Error> #where_clause {
            #prelude
            ::std::result::Result::Ok(#invoke)
        }
    })
}

fn action_config_peer(cx: &PeerContext<'_>) -> syn::Result<TokenStream> {
    let rt = runtime(cx)?;
    let vis = &cx.function.vis;
    let config = config_expr(cx, &rt)?;

    Ok(quote! {
        #vis fn action_config() -> #rt::PeerFunctionConfig {
            #config
        }
    })
}

fn action_peer(cx: &PeerContext<'_>) -> syn::Result<TokenStream> {
    let rt = runtime(cx)?;
    let vis = &cx.function.vis;
    let asyncness = &cx.function.sig.asyncness;
    let (impl_generics, _, where_clause) = cx.function.sig.generics.split_for_impl();

    let Some(thread) = &cx.binding.state else {
        return Err(syn::Error::new(
            cx.function.sig.ident.span(),
            "command action compiled without a state thread",
        ));
    };
    let element = parse_type(&thread.element_type)?;
    let chain_node = ident(&cx.options.chain_node_type);

    let node_path = ident("node_path");
    let state = ident("state");
    let wiring = if thread.synthesized {
        Vec::new()
    } else {
        vec![node_path.clone(), state.clone()]
    };

    let prelude = prelude(cx, &rt)?;
    let invoke = invoke(cx, &rt, &wiring);
    let body = if cx.binding.function.return_type.is_empty() {
        quote! {
            #invoke;
            ::std::result::Result::Ok(::std::option::Option::None)
        }
    } else {
        quote! {
            let __output = #invoke;
            ::std::result::Result::Ok(::std::option::Option::Some(__output))
        }
    };

    Ok(quote! {
        #[allow(unused_variables)]
        #vis #asyncness fn action #impl_generics (
            __args: &[::std::string::String],
            #node_path: ::std::vec::Vec<#rt::#chain_node<#element>>,
            #state: ::std::vec::Vec<#element>,
        ) -> ::std::result::Result<
            ::std::option::Option<::std::vec::Vec<#element>>,
            #rt::Error,
        > #where_clause {
            #prelude
            #body
        }
    })
}

/// Builds the configuration, parses `__args` and binds every parameter.
fn prelude(cx: &PeerContext<'_>, rt: &Path) -> syn::Result<TokenStream> {
    let config = match cx.binding.kind {
        DirectiveKind::CommandAction => {
            let path = peer_path(cx, "action_config");
            quote! { #path() }
        }
        _ => config_expr(cx, rt)?,
    };
    let labels = labels_expr(cx, rt);

    let bindings = cx
        .binding
        .parameters
        .iter()
        .map(|spec| {
            let name = ident(&spec.name);
            let key = spec.name.as_str();
            let value = match &spec.category {
                TypeCategory::Value(_) => match &spec.default {
                    Some(default) => {
                        let default = parse_expr(default)?;
                        quote! { __values.value_or_else(#key, || #default)? }
                    }
                    None => quote! { __values.value(#key)? },
                },
                TypeCategory::Flag => quote! { __values.flag(#key)? },
                TypeCategory::MetaFlag => {
                    let default = parse_expr(spec.default.as_deref().unwrap_or_default())?;
                    quote! { #default }
                }
                TypeCategory::Optional(_) => quote! { __values.optional(#key)? },
                TypeCategory::Array(_) => quote! { __values.array(#key)? },
                TypeCategory::Variadic(_) => quote! { __values.variadic(#key)? },
            };
            Ok(quote! { let #name = #value; })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        let __config = #config;
        let __values = #rt::parse_arguments(&__config, #labels, __args)?;
        #(#bindings)*
    })
}

fn config_expr(cx: &PeerContext<'_>, rt: &Path) -> syn::Result<TokenStream> {
    let config = &cx.binding.config;
    let groups = &config.shadow_groups;
    let meta_flags = config
        .meta_flags
        .iter()
        .map(|flag| {
            let name = flag.parameter.as_str();
            let default = parse_expr(&flag.default)?;
            Ok(quote! {
                (#name, ::std::boxed::Box::new(#default) as ::std::boxed::Box<dyn #rt::MetaFlagProtocol>)
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        #rt::PeerFunctionConfig::new()
            .add_shadow_groups(&[#(#groups),*])
            .add_meta_flags(::std::vec![#(#meta_flags),*])
    })
}

fn labels_expr(cx: &PeerContext<'_>, rt: &Path) -> TokenStream {
    let entries = cx.binding.config.labels.entries().iter().map(|entry| {
        let name = entry.parameter.as_str();
        let short = option_str(entry.triple.short.as_deref());
        let legacy = option_str(entry.triple.legacy.as_deref());
        let long = option_str(entry.triple.long.as_deref());
        quote! { #rt::ParameterLabels::new(#name, #short, #legacy, #long) }
    });
    quote! { ::std::vec![#(#entries),*] }
}

/// Calls the work function with the bound parameters plus `extra`.
fn invoke(cx: &PeerContext<'_>, rt: &Path, extra: &[Ident]) -> TokenStream {
    let path = peer_path(cx, &cx.function.sig.ident.to_string());
    let args = cx
        .binding
        .parameters
        .iter()
        .map(|spec| ident(&spec.name))
        .chain(extra.iter().cloned());

    let mut call = quote! { #path(#(#args),*) };
    if cx.binding.function.is_async {
        call = quote! { #call.await };
    }
    if cx.binding.function.fallible {
        call = quote! { #call.map_err(#rt::Error::from_work_error)? };
    }
    call
}

fn peer_path(cx: &PeerContext<'_>, name: &str) -> TokenStream {
    let name = ident(name);
    if cx.directive.associated {
        quote! { Self::#name }
    } else {
        quote! { #name }
    }
}

fn runtime(cx: &PeerContext<'_>) -> syn::Result<Path> {
    syn::parse_str(cx.directive.runtime_path()).map_err(|err| {
        syn::Error::new(
            Span::call_site(),
            format!("invalid runtime path '{}': {err}", cx.directive.runtime_path()),
        )
    })
}

fn option_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote! { ::std::option::Option::Some(#value) },
        None => quote! { ::std::option::Option::None },
    }
}

fn ident(name: &str) -> Ident {
    syn::parse_str::<Ident>(name).unwrap_or_else(|_| Ident::new_raw(name, Span::call_site()))
}

fn parse_type(text: &str) -> syn::Result<Type> {
    if text.is_empty() {
        return Ok(syn::parse_quote!(()));
    }
    syn::parse_str(text)
}

fn parse_expr(text: &str) -> syn::Result<Expr> {
    syn::parse_str(text)
}
