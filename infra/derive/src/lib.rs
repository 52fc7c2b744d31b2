#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros shared by the Lovebird crates.
//!
//! * [`macro@lovebird_error`] turns a named-field enum into a `thiserror` error with
//!   `.context(...)` support.
//! * [`macro@api_model`] and [`macro@api_handler`] keep JSON DTOs and Axum handlers
//!   consistent with the `OpenAPI` document.
//!
//! Examples are `ignore`d here because a proc-macro crate cannot use its own macros;
//! see the consuming crates for real usage.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Defines a crate error enum.
///
/// # Injected Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * A companion `<Name>Ext` trait adding `.context(...)` to `Result<T, Name>` and to
///   `Result<T, Source>` for every variant wrapping a `source` error.
/// * `From<Source>` for every variant with a `source` field.
/// * `From<&'static str>` and `From<String>` when an `Internal { message, context }`
///   variant exists.
/// * A private `format_context` helper for the `#[error(...)]` strings.
///
/// # Requirements
///
/// Every variant uses named fields. Variants with a `source` field must also carry
/// `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[lovebird_derive::lovebird_error]
/// pub enum IdentityError {
///     #[error("Transport error{}: {source}", format_context(.context))]
///     Transport { source: reqwest::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal identity error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn refresh() -> Result<(), IdentityError> {
///     send().context("Refreshing the access token")?;
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn lovebird_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

/// Defines a JSON data transfer object.
///
/// Adds `Debug`, `Serialize` and `Deserialize` when missing, `utoipa::ToSchema` when the
/// consuming crate enables its `server` feature, and `#[serde(rename_all = "camelCase")]`
/// unless a `rename_all = "..."` argument overrides it.
///
/// ```rust,ignore
/// #[lovebird_derive::api_model]
/// pub struct SelfTestResponse {
///     pub ok: bool,
///     pub anon_key: SettingState,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Marks an Axum handler as an `OpenAPI` path.
///
/// Accepts the usual `utoipa::path` arguments. The path attribute is only emitted when the
/// consuming crate enables its `server` feature.
///
/// ```rust,ignore
/// #[lovebird_derive::api_handler(
///     get,
///     path = "/health",
///     responses((status = OK, body = HealthResponse)),
///     tag = "System"
/// )]
/// pub async fn health_handler() -> Json<HealthResponse> { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}
