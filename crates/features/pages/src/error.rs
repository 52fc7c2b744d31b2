use std::borrow::Cow;

/// A specialized [`PagesError`] enum of this crate.
#[lovebird_derive::lovebird_error]
pub enum PagesError {
    #[error("Template error{}: {source}", format_context(.context))]
    Template { source: minijinja::Error, context: Option<Cow<'static, str>> },

    /// The diagnostics HTTP client could not be built.
    #[error("Diagnostics client error{}: {source}", format_context(.context))]
    Http { source: reqwest::Error, context: Option<Cow<'static, str>> },

    #[error("Internal pages error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
