use lovebird_identity::IdentityError;
use lovebird_pages::PagesError;
use std::borrow::Cow;

/// A specialized [`LovebirdError`] enum of this crate.
#[lovebird_derive::lovebird_error]
pub enum LovebirdError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("State missing feature slice{}: {message}", format_context(.context))]
    MissingSlice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Identity slice failed{}: {source}", format_context(.context))]
    Identity { source: IdentityError, context: Option<Cow<'static, str>> },

    #[error("Pages slice failed{}: {source}", format_context(.context))]
    Pages { source: PagesError, context: Option<Cow<'static, str>> },
}
