//! Login view: `Loading` until the session is known, then `SignedOut` or `SignedIn`,
//! following every change pushed by the session provider.

use lovebird_domain::session::{AuthStateChange, Session};
use lovebird_event_bus::Subscription;
use lovebird_identity::SessionProvider;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Loading,
    SignedOut,
    SignedIn(Arc<Session>),
}

impl LoginState {
    fn from_session(session: Option<Arc<Session>>) -> Self {
        session.map_or(Self::SignedOut, Self::SignedIn)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::SignedOut => "signed_out",
            Self::SignedIn(_) => "signed_in",
        }
    }
}

/// Template input for the login page and card.
#[derive(Debug, Clone, Serialize)]
pub struct LoginModel {
    pub state: &'static str,
    pub greeting: Option<String>,
    pub email: Option<String>,
    pub provider: String,
    pub issues: Vec<&'static str>,
    pub flash: Option<String>,
}

#[derive(Debug)]
struct Cell {
    state: LoginState,
    mounted: bool,
}

/// Shared between the view, its fetch task and its subscription callback.
#[derive(Debug)]
struct Shared {
    cell: Mutex<Cell>,
    revision: watch::Sender<u64>,
}

impl Shared {
    /// Apply a transition. Fetch results only resolve `Loading`; changes always apply.
    /// Nothing applies after unmount.
    fn apply(&self, next: LoginState, from_fetch: bool) {
        let mut cell = self.cell.lock();
        if !cell.mounted || (from_fetch && cell.state != LoginState::Loading) {
            return;
        }
        debug!(from = cell.state.name(), to = next.name(), from_fetch, "Login view transition");
        cell.state = next;
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

/// A mounted login view for one browser.
///
/// Dropping the view unmounts it.
#[derive(Debug)]
pub struct LoginView {
    shared: Arc<Shared>,
    revisions: watch::Receiver<u64>,
    provider: String,
    issues: Vec<&'static str>,
    flash: Option<String>,
    fetch: Option<JoinHandle<()>>,
    subscription: Option<Subscription>,
}

impl LoginView {
    /// Mount without waiting: subscribe to changes first, then fetch the current session
    /// in the background, bounded by `timeout`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount<P>(session: &P, provider: impl Into<String>, issues: Vec<&'static str>, timeout: Duration) -> Self
    where
        P: SessionProvider + Clone + 'static,
    {
        let (revision, revisions) = watch::channel(0);
        let shared = Arc::new(Shared { cell: Mutex::new(Cell { state: LoginState::Loading, mounted: true }), revision });

        let listener = Arc::clone(&shared);
        let subscription = session
            .on_session_change(move |change: &AuthStateChange| {
                listener.apply(LoginState::from_session(change.session.clone()), false);
            })
            .inspect_err(|err| warn!(error = %err, "Login view could not subscribe to session changes"))
            .ok();

        let fetcher = Arc::clone(&shared);
        let session = session.clone();
        let fetch = tokio::spawn(async move {
            let state = match tokio::time::timeout(timeout, session.current_session()).await {
                Ok(Ok(current)) => LoginState::from_session(current),
                Ok(Err(err)) => {
                    warn!(error = %err, "Session lookup failed; showing sign-in");
                    LoginState::SignedOut
                },
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Session lookup timed out; showing sign-in");
                    LoginState::SignedOut
                },
            };
            fetcher.apply(state, true);
        });

        Self {
            shared,
            revisions,
            provider: provider.into(),
            issues,
            flash: None,
            fetch: Some(fetch),
            subscription,
        }
    }

    /// Attach a one-off message, e.g. an OAuth error from the callback.
    #[must_use]
    pub fn with_flash(mut self, flash: Option<String>) -> Self {
        self.flash = flash.filter(|message| !message.trim().is_empty());
        self
    }

    #[must_use]
    pub fn state(&self) -> LoginState {
        self.shared.cell.lock().state.clone()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.shared.cell.lock().mounted
    }

    /// A receiver that ticks on every applied transition.
    #[must_use]
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.revisions.clone()
    }

    /// Wait for the next transition. Returns `false` once no more can happen.
    pub async fn changed(&mut self) -> bool {
        self.is_mounted() && self.revisions.changed().await.is_ok()
    }

    /// Wait until the view has left `Loading`.
    pub async fn settled(&mut self) -> LoginState {
        loop {
            let state = self.state();
            if state != LoginState::Loading || !self.changed().await {
                return state;
            }
        }
    }

    /// `"Willkommen, <email>"` while signed in.
    #[must_use]
    pub fn greeting(&self) -> Option<String> {
        greeting(&self.state())
    }

    #[must_use]
    pub fn model(&self) -> LoginModel {
        let state = self.state();
        let email = match &state {
            LoginState::SignedIn(session) => session.email().map(str::to_owned),
            _ => None,
        };

        LoginModel {
            state: state.name(),
            greeting: greeting(&state),
            email,
            provider: self.provider.clone(),
            issues: self.issues.clone(),
            flash: self.flash.clone(),
        }
    }

    /// Stop the fetch and the subscription. Later deliveries are ignored.
    pub fn unmount(&mut self) {
        self.shared.cell.lock().mounted = false;
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl Drop for LoginView {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn greeting(state: &LoginState) -> Option<String> {
    match state {
        LoginState::SignedIn(session) => Some(format!("Willkommen, {}", session.user.display_name())),
        _ => None,
    }
}
