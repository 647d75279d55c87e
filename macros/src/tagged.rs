use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, Ident, Token};

pub(crate) fn expand(input: TokenStream) -> syn::Result<TokenStream> {
    let args = Punctuated::<Expr, Token![,]>::parse_terminated.parse2(input)?;

    let entries = args.iter().filter_map(plain_ident).map(|ident| {
        let template = format!("{}: {{:?}}", ident.unraw());
        quote! { ::std::format!(#template, #ident) }
    });

    Ok(quote! {
        {
            let __tagged: ::std::vec::Vec<::std::string::String> = ::std::vec![#(#entries),*];
            __tagged
        }
    })
}

fn plain_ident(expr: &Expr) -> Option<&Ident> {
    match expr {
        Expr::Path(path) if path.qself.is_none() && path.attrs.is_empty() => path.path.get_ident(),
        _ => None,
    }
}
