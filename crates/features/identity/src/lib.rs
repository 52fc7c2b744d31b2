//! Identity feature slice.
//!
//! Talks to a GoTrue-compatible identity service (`/auth/v1`), keeps one [`AuthClient`]
//! per browser and publishes session changes on the shared [`EventBus`].
//!
//! With the `server` feature the slice also provides the sign-in, callback and
//! sign-out routes plus the browser cookie middleware.

mod client;
mod error;
pub mod pkce;
mod provider;
mod registry;
#[cfg(feature = "server")]
pub mod server;
mod service;

pub use crate::client::{AuthClient, REFRESH_SKEW_SECS};
pub use crate::error::{IdentityError, IdentityErrorExt};
pub use crate::provider::SessionProvider;
pub use crate::registry::AuthClients;
pub use crate::service::{IdentityService, unix_now};

use lovebird_domain::config::AppConfig;
use lovebird_domain::constants::CALLBACK_PATH;
use lovebird_event_bus::EventBus;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug)]
pub struct IdentityInner {
    pub service: IdentityService,
    pub clients: AuthClients,
    /// Adds `Secure` to the browser cookie.
    pub secure_cookie: bool,
    /// Browser cookie lifetime in seconds.
    pub cookie_max_age: u64,
}

/// Identity feature state
#[derive(Debug, Clone)]
pub struct Identity {
    inner: Arc<IdentityInner>,
}

impl Deref for Identity {
    type Target = IdentityInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Identity {
    /// The session client for a browser, created on first use.
    #[must_use]
    pub fn client(&self, browser_id: &str) -> AuthClient {
        self.clients.get_or_create(browser_id)
    }
}

/// Initialize the identity feature.
///
/// Missing identity settings do not fail initialization; they are reported by the
/// health check and by [`IdentityService::endpoint`].
///
/// # Errors
/// Returns [`IdentityError::Transport`] if the HTTP client cannot be built.
pub fn init(config: &AppConfig, events: EventBus) -> Result<Identity, IdentityError> {
    let identity = &config.identity;
    let redirect_url = identity
        .redirect_url
        .clone()
        .unwrap_or_else(|| format!("{}{CALLBACK_PATH}", config.server.origin()));

    let service = IdentityService::new(identity, redirect_url)?;
    let clients = AuthClients::new(
        service.clone(),
        events,
        identity.session_cache_capacity,
        identity.session_idle(),
    );

    tracing::info!(redirect = service.redirect_url(), "Identity slice initialized");

    Ok(Identity {
        inner: Arc::new(IdentityInner {
            service,
            clients,
            secure_cookie: identity.secure_cookie,
            cookie_max_age: identity.session_idle_secs,
        }),
    })
}
