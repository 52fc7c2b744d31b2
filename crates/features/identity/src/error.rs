use std::borrow::Cow;

/// A specialized [`IdentityError`] enum of this crate.
#[lovebird_derive::lovebird_error]
pub enum IdentityError {
    /// The identity settings are missing or unusable.
    #[error("Identity config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The identity service could not be reached or answered garbage.
    #[error("Identity transport error{}: {source}", format_context(.context))]
    Transport { source: reqwest::Error, context: Option<Cow<'static, str>> },

    /// The identity service rejected the request.
    #[error("Identity provider error{} ({status}): {message}", format_context(.context))]
    Provider { status: u16, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Identity URL error{}: {source}", format_context(.context))]
    Url { source: url::ParseError, context: Option<Cow<'static, str>> },

    #[error("Identity event error{}: {source}", format_context(.context))]
    Events { source: lovebird_event_bus::EventBusError, context: Option<Cow<'static, str>> },

    /// No sign-in is pending for this client (e.g. callback without a prior redirect).
    #[error("Identity flow error{}: {message}", format_context(.context))]
    Flow { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
