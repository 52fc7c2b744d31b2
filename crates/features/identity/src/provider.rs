use crate::error::IdentityError;
use lovebird_domain::session::{AuthStateChange, Session};
use lovebird_event_bus::Subscription;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Session operations the views depend on.
///
/// [`crate::AuthClient`] talks to the identity service; tests substitute their own.
pub trait SessionProvider: Send + Sync {
    /// Resolve the current session, refreshing an expiring access token first.
    ///
    /// `Ok(None)` means signed out. Errors mean "unknown".
    fn current_session(&self) -> impl Future<Output = Result<Option<Arc<Session>>, IdentityError>> + Send;

    /// Register `handler` for every later session change of this client.
    ///
    /// Changes arrive in emission order; past changes are not replayed. Delivery stops
    /// once the returned handle is unsubscribed or dropped.
    ///
    /// # Errors
    /// Returns [`IdentityError::Events`] if the subscription cannot be created.
    fn on_session_change<H>(&self, handler: H) -> Result<Subscription, IdentityError>
    where
        H: FnMut(&AuthStateChange) + Send + 'static;

    /// Start an OAuth sign-in and return the provider URL the browser must visit.
    ///
    /// # Errors
    /// Returns [`IdentityError::Config`] when the identity endpoint is unusable.
    fn sign_in_with_provider(&self, provider: &str) -> Result<Url, IdentityError>;

    /// End the session. Completion is reported through [`SessionProvider::on_session_change`].
    fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>> + Send;
}
