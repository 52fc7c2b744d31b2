use crate::error::{IdentityError, IdentityErrorExt};
use crate::pkce::Pkce;
use crate::provider::SessionProvider;
use crate::service::{IdentityService, unix_now};
use lovebird_domain::session::{AuthEvent, AuthStateChange, Session};
use lovebird_event_bus::{EventBus, Subscription};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Refresh the access token when it expires within this many seconds.
pub const REFRESH_SKEW_SECS: u64 = 30;

#[derive(Debug)]
struct ClientInner {
    id: Arc<str>,
    service: IdentityService,
    events: EventBus,
    changes: EventBus,
    session: RwLock<Option<Arc<Session>>>,
    pending: Mutex<Option<Pkce>>,
    refreshing: tokio::sync::Mutex<()>,
}

/// Session client for one browser.
///
/// Mirrors the provider's session in memory and publishes every transition as an
/// [`AuthStateChange`] tagged with this client's id, both on the shared bus and on a
/// channel of its own. Session listeners read the private channel, so traffic from
/// other browsers can never push this client's changes out of their buffer.
#[derive(Debug, Clone)]
pub struct AuthClient {
    inner: Arc<ClientInner>,
}

impl AuthClient {
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>, service: IdentityService, events: EventBus) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                id: id.into(),
                service,
                events,
                changes: EventBus::new(),
                session: RwLock::new(None),
                pending: Mutex::new(None),
                refreshing: tokio::sync::Mutex::new(()),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The mirrored session as is, without refreshing.
    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        self.inner.session.read().clone()
    }

    /// Whether a sign-in redirect is waiting for its callback.
    #[must_use]
    pub fn has_pending_sign_in(&self) -> bool {
        self.inner.pending.lock().is_some()
    }

    /// Finish the OAuth round trip with the code from the callback.
    ///
    /// # Errors
    /// Returns [`IdentityError::Flow`] if no sign-in was started by this client, or the
    /// provider's error if the exchange fails.
    pub async fn complete_sign_in(&self, auth_code: &str) -> Result<Arc<Session>, IdentityError> {
        let pkce = self.inner.pending.lock().take().ok_or_else(|| IdentityError::Flow {
            message: "no sign-in in progress".into(),
            context: Some("Completing the sign-in".into()),
        })?;

        let session = Arc::new(self.inner.service.exchange_code(auth_code, &pkce.verifier).await?);
        *self.inner.session.write() = Some(Arc::clone(&session));
        info!(client = %self.inner.id, user = %session.user.id, "Signed in");

        self.emit(AuthEvent::SignedIn, Some(Arc::clone(&session)))?;
        Ok(session)
    }

    fn emit(&self, event: AuthEvent, session: Option<Arc<Session>>) -> Result<(), IdentityError> {
        let change = Arc::new(AuthStateChange { client: Arc::clone(&self.inner.id), event, session });
        let listeners = self.inner.changes.publish_arc(Arc::clone(&change)).context("Publishing a session change")?;
        let reached = self.inner.events.publish_arc(change).context("Publishing a session change")?;
        debug!(client = %self.inner.id, %event, listeners, reached, "Session change published");
        Ok(())
    }

    async fn refresh(&self, stale: Arc<Session>) -> Result<Option<Arc<Session>>, IdentityError> {
        let _guard = self.inner.refreshing.lock().await;

        // Another caller may have refreshed or signed out while we waited.
        match self.session() {
            Some(current) if !Arc::ptr_eq(&current, &stale) => return Ok(Some(current)),
            None => return Ok(None),
            Some(_) => {},
        }

        match self.inner.service.refresh(&stale.refresh_token).await {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                *self.inner.session.write() = Some(Arc::clone(&fresh));
                self.emit(AuthEvent::TokenRefreshed, Some(Arc::clone(&fresh)))?;
                Ok(Some(fresh))
            },
            Err(err) => {
                warn!(client = %self.inner.id, error = %err, "Session refresh failed; signing out");
                *self.inner.session.write() = None;
                self.emit(AuthEvent::SignedOut, None)?;
                Err(err)
            },
        }
    }
}

impl SessionProvider for AuthClient {
    async fn current_session(&self) -> Result<Option<Arc<Session>>, IdentityError> {
        match self.session() {
            Some(session) if session.expires_within(unix_now(), REFRESH_SKEW_SECS) => self.refresh(session).await,
            session => Ok(session),
        }
    }

    fn on_session_change<H>(&self, handler: H) -> Result<Subscription, IdentityError>
    where
        H: FnMut(&AuthStateChange) + Send + 'static,
    {
        self.inner.changes.listen::<AuthStateChange, _>(handler).context("Subscribing to session changes")
    }

    fn sign_in_with_provider(&self, provider: &str) -> Result<Url, IdentityError> {
        let pkce = Pkce::generate();
        let url = self.inner.service.authorize_url(provider, &pkce.challenge)?;
        *self.inner.pending.lock() = Some(pkce);
        debug!(client = %self.inner.id, provider, "Sign-in started");
        Ok(url)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let session = self.inner.session.write().take();
        self.inner.pending.lock().take();

        if let Some(session) = session
            && let Err(err) = self.inner.service.logout(&session.access_token).await
        {
            warn!(client = %self.inner.id, error = %err, "Provider logout failed; local session cleared anyway");
        }

        info!(client = %self.inner.id, "Signed out");
        self.emit(AuthEvent::SignedOut, None)
    }
}
