use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, ItemFn, ItemStruct, Lit, LitStr, Meta, Token};

/// Expands `#[api_model]`: common derives, `ToSchema` behind the `server` feature and the
/// camelCase serde policy.
pub fn expand_api_model(args: TokenStream, input: ItemStruct) -> TokenStream {
    let rename_all = match parse_rename_all(args) {
        Ok(value) => value,
        Err(err) => return err.to_compile_error(),
    };

    let derives = super::derived_traits(&input.attrs);
    let mut missing = Vec::new();
    if !derives.contains("Debug") {
        missing.push(quote! { Debug });
    }
    if !derives.contains("Serialize") {
        missing.push(quote! { ::serde::Serialize });
    }
    if !derives.contains("Deserialize") {
        missing.push(quote! { ::serde::Deserialize });
    }
    let derive_attr = if missing.is_empty() { quote!() } else { quote! { #[derive(#(#missing),*)] } };

    let schema_attr = if derives.contains("ToSchema") {
        quote!()
    } else {
        quote! { #[cfg_attr(feature = "server", derive(::utoipa::ToSchema))] }
    };

    let has_serde_rename = input.attrs.iter().filter(|attr| attr.path().is_ident("serde")).any(|attr| {
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            found |= meta.path.is_ident("rename_all");
            if meta.input.peek(Token![=]) {
                let _: LitStr = meta.value()?.parse()?;
            }
            Ok(())
        });
        found
    });
    let rename_attr = if has_serde_rename {
        quote!()
    } else {
        let value = rename_all
            .unwrap_or_else(|| LitStr::new("camelCase", proc_macro2::Span::call_site()));
        quote! { #[serde(rename_all = #value)] }
    };

    quote! {
        #derive_attr
        #schema_attr
        #rename_attr
        #input
    }
}

/// Expands `#[api_handler]`: forwards the arguments to `utoipa::path` behind the `server`
/// feature and silences `unused_async` for extractor-only handlers.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[cfg_attr(feature = "server", ::utoipa::path(#args))]
        #vis #sig #block
    }
}

fn parse_rename_all(args: TokenStream) -> syn::Result<Option<LitStr>> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    let mut rename_all = None;

    for meta in metas {
        let Meta::NameValue(pair) = meta else {
            return Err(syn::Error::new_spanned(meta, "expected `rename_all = \"...\"`"));
        };
        if !pair.path.is_ident("rename_all") {
            return Err(syn::Error::new_spanned(pair.path, "unsupported argument; expected rename_all"));
        }
        if rename_all.is_some() {
            return Err(syn::Error::new_spanned(pair, "duplicate rename_all argument"));
        }
        let Expr::Lit(expr) = &pair.value else {
            return Err(syn::Error::new_spanned(&pair.value, "rename_all must be a string literal"));
        };
        let Lit::Str(value) = &expr.lit else {
            return Err(syn::Error::new_spanned(&pair.value, "rename_all must be a string literal"));
        };
        rename_all = Some(value.clone());
    }

    Ok(rename_all)
}
