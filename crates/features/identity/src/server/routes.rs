use super::browser::BrowserId;
use crate::{Identity, SessionProvider};
use axum::extract::{FromRef, Query, State};
use axum::response::{IntoResponse, Redirect};
use lovebird_derive::api_handler;
use lovebird_domain::constants::{AUTH_TAG, DEFAULT_PROVIDER};
use serde::Deserialize;
use tracing::{info, warn};
use url::form_urlencoded;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(super) struct SignInQuery {
    /// OAuth provider name, `google` by default
    provider: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(super) struct CallbackQuery {
    /// Authorization code issued by the provider
    code: Option<String>,
    /// OAuth error code
    error: Option<String>,
    /// Human-readable OAuth error
    error_description: Option<String>,
}

/// `/?error=<message>`
fn home_with_error(message: &str) -> Redirect {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("/?error={encoded}"))
}

#[api_handler(
    get,
    path = "/auth/sign-in",
    params(SignInQuery),
    responses((status = SEE_OTHER, description = "Redirect to the OAuth provider, or back home with an error")),
    tag = AUTH_TAG,
)]
pub(super) async fn sign_in_handler(
    State(identity): State<Identity>,
    browser: BrowserId,
    Query(query): Query<SignInQuery>,
) -> impl IntoResponse {
    let provider = query.provider.as_deref().map(str::trim).filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PROVIDER);

    match identity.client(browser.as_str()).sign_in_with_provider(provider) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(err) => {
            warn!(client = browser.as_str(), error = %err, "Sign-in could not start");
            home_with_error(&err.to_string())
        },
    }
}

#[api_handler(
    get,
    path = "/auth/callback",
    params(CallbackQuery),
    responses((status = SEE_OTHER, description = "Back home, with an error flash on failure")),
    tag = AUTH_TAG,
)]
pub(super) async fn callback_handler(
    State(identity): State<Identity>,
    browser: BrowserId,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    if let Some(error) = query.error {
        let message = query.error_description.unwrap_or(error);
        warn!(client = browser.as_str(), %message, "Provider returned an error");
        return home_with_error(&message);
    }

    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return home_with_error("Anmeldung fehlgeschlagen: kein Code erhalten");
    };

    match identity.client(browser.as_str()).complete_sign_in(&code).await {
        Ok(session) => {
            info!(client = browser.as_str(), user = %session.user.id, "Sign-in completed");
            Redirect::to("/")
        },
        Err(err) => {
            warn!(client = browser.as_str(), error = %err, "Sign-in could not be completed");
            home_with_error(&err.to_string())
        },
    }
}

#[api_handler(
    post,
    path = "/auth/sign-out",
    responses((status = SEE_OTHER, description = "Session cleared; redirect home")),
    tag = AUTH_TAG,
)]
pub(super) async fn sign_out_handler(State(identity): State<Identity>, browser: BrowserId) -> impl IntoResponse {
    if let Err(err) = identity.client(browser.as_str()).sign_out().await {
        warn!(client = browser.as_str(), error = %err, "Sign-out reported an error");
    }
    Redirect::to("/")
}

/// `/auth/sign-in`, `/auth/callback` and `/auth/sign-out`.
///
/// Requires [`super::browser_session`] to be layered around the router.
pub fn identity_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    Identity: FromRef<S>,
{
    OpenApiRouter::<S>::new()
        .routes(routes!(sign_in_handler))
        .routes(routes!(callback_handler))
        .routes(routes!(sign_out_handler))
}
