use lovebird_domain::session::{AuthEvent, AuthStateChange, Session, User};
use lovebird_event_bus::{EventBus, Subscription};
use lovebird_identity::{IdentityError, IdentityErrorExt, SessionProvider};
use lovebird_pages::Templates;
use lovebird_pages::view::{LoginState, LoginView};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use url::Url;

const CLIENT: &str = "browser-a";
const WAIT: Duration = Duration::from_secs(2);

/// Session provider with a scripted lookup and bus-driven changes.
#[derive(Clone)]
struct FakeProvider {
    events: EventBus,
    current: Option<Arc<Session>>,
    fail: bool,
    delay: Duration,
}

impl FakeProvider {
    fn new(events: &EventBus) -> Self {
        Self { events: events.clone(), current: None, fail: false, delay: Duration::ZERO }
    }

    fn emit(&self, event: AuthEvent, session: Option<Arc<Session>>) {
        self.events.publish(AuthStateChange { client: Arc::from(CLIENT), event, session }).expect("publish");
    }
}

impl SessionProvider for FakeProvider {
    async fn current_session(&self) -> Result<Option<Arc<Session>>, IdentityError> {
        sleep(self.delay).await;
        if self.fail {
            return Err(IdentityError::Internal { message: "lookup failed".into(), context: None });
        }
        Ok(self.current.clone())
    }

    fn on_session_change<H>(&self, handler: H) -> Result<Subscription, IdentityError>
    where
        H: FnMut(&AuthStateChange) + Send + 'static,
    {
        self.events
            .listen_where(|change: &AuthStateChange| &*change.client == CLIENT, handler)
            .context("Subscribing to fake session changes")
    }

    fn sign_in_with_provider(&self, provider: &str) -> Result<Url, IdentityError> {
        Ok(Url::parse(&format!("https://id.example.com/authorize?provider={provider}"))?)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }
}

fn session(email: &str) -> Arc<Session> {
    Arc::new(Session {
        access_token: "at".to_owned(),
        refresh_token: "rt".to_owned(),
        token_type: "bearer".to_owned(),
        expires_in: 3600,
        expires_at: None,
        user: User { id: "user-1".to_owned(), email: Some(email.to_owned()), role: None, aud: None },
    })
}

fn mount(provider: &FakeProvider, lookup_timeout: Duration) -> LoginView {
    LoginView::mount(provider, "google", Vec::new(), lookup_timeout)
}

fn card(view: &LoginView) -> String {
    Templates::new().expect("templates").login_card(&view.model()).expect("card")
}

#[tokio::test]
async fn loading_shows_neither_control() {
    let events = EventBus::new();
    let provider = FakeProvider { delay: Duration::from_secs(30), ..FakeProvider::new(&events) };
    let view = mount(&provider, Duration::from_secs(60));

    assert_eq!(view.state(), LoginState::Loading);
    let html = card(&view);
    assert!(html.contains("data-state=\"loading\""));
    assert!(!html.contains("Mit Google einloggen"));
    assert!(!html.contains("Ausloggen"));
}

#[tokio::test]
async fn absent_session_shows_sign_in() {
    let events = EventBus::new();
    let mut view = mount(&FakeProvider::new(&events), WAIT);

    assert_eq!(timeout(WAIT, view.settled()).await.expect("settled"), LoginState::SignedOut);
    assert_eq!(view.greeting(), None);

    let html = card(&view);
    assert!(html.contains("Mit Google einloggen"));
    assert!(html.contains("/auth/sign-in?provider=google"));
    assert!(!html.contains("Ausloggen"));
}

#[tokio::test]
async fn existing_session_shows_greeting() {
    let events = EventBus::new();
    let provider = FakeProvider { current: Some(session("x@y.org")), ..FakeProvider::new(&events) };
    let mut view = mount(&provider, WAIT);

    assert!(matches!(timeout(WAIT, view.settled()).await.expect("settled"), LoginState::SignedIn(_)));
    assert_eq!(view.greeting().as_deref(), Some("Willkommen, x@y.org"));
    assert_eq!(view.model().email.as_deref(), Some("x@y.org"));
}

#[tokio::test]
async fn sign_in_change_shows_greeting_and_sign_out() {
    let events = EventBus::new();
    let provider = FakeProvider::new(&events);
    let mut view = mount(&provider, WAIT);
    timeout(WAIT, view.settled()).await.expect("settled");

    provider.emit(AuthEvent::SignedIn, Some(session("a@b.com")));
    assert!(timeout(WAIT, view.changed()).await.expect("changed"));

    assert_eq!(view.greeting().as_deref(), Some("Willkommen, a@b.com"));
    let html = card(&view);
    assert!(html.contains("Willkommen, a@b.com"));
    assert!(html.contains("Ausloggen"));
    assert!(!html.contains("Mit Google einloggen"));
}

#[tokio::test]
async fn sign_out_change_returns_to_sign_in() {
    let events = EventBus::new();
    let provider = FakeProvider { current: Some(session("a@b.com")), ..FakeProvider::new(&events) };
    let mut view = mount(&provider, WAIT);
    timeout(WAIT, view.settled()).await.expect("settled");

    provider.sign_out().await.expect("sign out");
    assert!(timeout(WAIT, view.changed()).await.expect("changed"));
    assert_eq!(view.state(), LoginState::SignedOut);
}

#[tokio::test]
async fn changes_for_other_browsers_are_ignored() {
    let events = EventBus::new();
    let mut view = mount(&FakeProvider::new(&events), WAIT);
    timeout(WAIT, view.settled()).await.expect("settled");

    events
        .publish(AuthStateChange {
            client: Arc::from("browser-b"),
            event: AuthEvent::SignedIn,
            session: Some(session("b@b.com")),
        })
        .expect("publish");
    sleep(Duration::from_millis(100)).await;

    assert_eq!(view.state(), LoginState::SignedOut);
}

#[tokio::test]
async fn failed_lookup_shows_sign_in() {
    let events = EventBus::new();
    let provider = FakeProvider { fail: true, ..FakeProvider::new(&events) };
    let mut view = mount(&provider, WAIT);

    assert_eq!(timeout(WAIT, view.settled()).await.expect("settled"), LoginState::SignedOut);
}

#[tokio::test]
async fn slow_lookup_times_out_to_sign_in() {
    let events = EventBus::new();
    let provider = FakeProvider {
        current: Some(session("a@b.com")),
        delay: Duration::from_secs(30),
        ..FakeProvider::new(&events)
    };
    let mut view = mount(&provider, Duration::from_millis(50));

    assert_eq!(timeout(WAIT, view.settled()).await.expect("settled"), LoginState::SignedOut);
}

#[tokio::test]
async fn change_during_lookup_wins_over_late_result() {
    let events = EventBus::new();
    let provider = FakeProvider { delay: Duration::from_millis(200), ..FakeProvider::new(&events) };
    let mut view = mount(&provider, WAIT);

    provider.emit(AuthEvent::SignedIn, Some(session("a@b.com")));
    assert!(matches!(timeout(WAIT, view.settled()).await.expect("settled"), LoginState::SignedIn(_)));

    // The lookup resolves to "signed out" afterwards and must not override the change.
    sleep(Duration::from_millis(400)).await;
    assert!(matches!(view.state(), LoginState::SignedIn(_)));
}

#[tokio::test]
async fn unmounted_view_ignores_changes() {
    let events = EventBus::new();
    let provider = FakeProvider::new(&events);
    let mut view = mount(&provider, WAIT);
    timeout(WAIT, view.settled()).await.expect("settled");

    view.unmount();
    assert!(!view.is_mounted());
    assert!(!view.changed().await);

    provider.emit(AuthEvent::SignedIn, Some(session("a@b.com")));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(view.state(), LoginState::SignedOut);
}

#[tokio::test]
async fn unmount_during_lookup_keeps_loading() {
    let events = EventBus::new();
    let provider = FakeProvider { delay: Duration::from_millis(50), ..FakeProvider::new(&events) };
    let mut view = mount(&provider, WAIT);

    view.unmount();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(view.state(), LoginState::Loading);
}

#[tokio::test]
async fn dropped_view_tolerates_later_changes() {
    let events = EventBus::new();
    let provider = FakeProvider::new(&events);
    drop(mount(&provider, WAIT));

    provider.emit(AuthEvent::SignedIn, Some(session("a@b.com")));
    sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn page_shows_issues_and_escaped_flash() {
    let events = EventBus::new();
    let mut view = LoginView::mount(&FakeProvider::new(&events), "google", vec!["Fehlt: SERVICE_PUBLIC_KEY"], WAIT)
        .with_flash(Some("<b>Access denied</b>".to_owned()));
    timeout(WAIT, view.settled()).await.expect("settled");

    let html = Templates::new().expect("templates").login_page(&view.model()).expect("page");
    assert!(html.contains("Konfiguration unvollständig"));
    assert!(html.contains("Fehlt: SERVICE_PUBLIC_KEY"));
    assert!(html.contains("&lt;b&gt;Access denied"));
    assert!(!html.contains("<b>Access denied"));
    assert!(html.contains("Mit Google einloggen"));
}

#[tokio::test]
async fn blank_flash_is_dropped() {
    let events = EventBus::new();
    let view = mount(&FakeProvider::new(&events), WAIT).with_flash(Some("  ".to_owned()));
    assert_eq!(view.model().flash, None);
}
