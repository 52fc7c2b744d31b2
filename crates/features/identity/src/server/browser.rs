use crate::Identity;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use lovebird_domain::constants::BROWSER_COOKIE;
use lovebird_kernel::safe_nanoid;
use std::sync::Arc;
use tracing::{trace, warn};

const BROWSER_ID_LEN: usize = 24;

/// Opaque browser id from the `lb_sid` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserId(pub Arc<str>);

impl BrowserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BrowserId {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "browser session middleware is not installed"))
    }
}

/// Middleware: ensure every request carries a [`BrowserId`], issuing the cookie when new.
pub async fn browser_session(State(identity): State<Identity>, mut request: Request, next: Next) -> Response {
    let (id, issued) = match read_cookie(request.headers()) {
        Some(id) => (id, false),
        None => (Arc::<str>::from(safe_nanoid!(BROWSER_ID_LEN)), true),
    };
    request.extensions_mut().insert(BrowserId(Arc::clone(&id)));

    let mut response = next.run(request).await;

    if issued {
        let secure = if identity.secure_cookie { "; Secure" } else { "" };
        let cookie = format!(
            "{BROWSER_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{secure}",
            identity.cookie_max_age
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
                trace!(client = %id, "Browser cookie issued");
            },
            Err(err) => warn!(error = %err, "Browser cookie could not be encoded"),
        }
    }

    response
}

fn read_cookie(headers: &HeaderMap) -> Option<Arc<str>> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == BROWSER_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| is_valid_id(value))
        .map(Arc::from)
}

fn is_valid_id(value: &str) -> bool {
    (8..=64).contains(&value.len()) && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
