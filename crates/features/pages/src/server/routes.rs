use crate::Pages;
use crate::view::{LoginState, LoginView, run_checks};
use axum::extract::{FromRef, Query, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use lovebird_derive::api_handler;
use lovebird_domain::constants::{DEFAULT_PROVIDER, PAGES_TAG};
use lovebird_identity::Identity;
use lovebird_identity::server::BrowserId;
use lovebird_kernel::health::check_health;
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error};
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const NO_STORE: (header::HeaderName, &str) = (header::CACHE_CONTROL, "no-store");

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(super) struct HomeQuery {
    /// Message shown above the login card
    error: Option<String>,
}

fn mount(pages: &Pages, identity: &Identity, browser: &BrowserId) -> LoginView {
    let client = identity.client(browser.as_str());
    LoginView::mount(&client, DEFAULT_PROVIDER, check_health(&pages.config.identity), pages.session_timeout())
}

fn html(result: Result<String, crate::PagesError>) -> Response {
    match result {
        Ok(body) => ([NO_STORE], Html(body)).into_response(),
        Err(err) => {
            error!(error = %err, "Page rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Seite konnte nicht erzeugt werden").into_response()
        },
    }
}

#[api_handler(
    get,
    path = "/",
    params(HomeQuery),
    responses((status = OK, description = "Login page")),
    tag = PAGES_TAG,
)]
pub(super) async fn home_handler(
    State(pages): State<Pages>,
    State(identity): State<Identity>,
    browser: BrowserId,
    Query(query): Query<HomeQuery>,
) -> Response {
    let mut view = mount(&pages, &identity, &browser).with_flash(query.error);
    let state = view.settled().await;
    debug!(client = browser.as_str(), state = state.name(), "Rendering login page");

    let page = pages.templates.login_page(&view.model());
    view.unmount();
    html(page)
}

#[api_handler(
    get,
    path = "/tests",
    responses((status = OK, description = "Smoke test results")),
    tag = PAGES_TAG,
)]
pub(super) async fn tests_handler(State(pages): State<Pages>, State(identity): State<Identity>) -> Response {
    let checks = run_checks(&pages.config.identity, &identity.service, &pages.probe).await;
    html(pages.templates.tests_page(&checks))
}

#[api_handler(
    get,
    path = "/auth/events",
    responses((status = OK, description = "Login card re-rendered after every session change")),
    tag = PAGES_TAG,
)]
pub(super) async fn events_handler(
    State(pages): State<Pages>,
    State(identity): State<Identity>,
    browser: BrowserId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let view = mount(&pages, &identity, &browser);
    debug!(client = browser.as_str(), "Login feed opened");

    // The stream owns the view; a closed connection drops both and unmounts.
    let stream = WatchStream::new(view.revisions()).filter_map(move |_| {
        if view.state() == LoginState::Loading {
            return None;
        }
        match pages.templates.login_card(&view.model()) {
            Ok(card) => Some(Ok(Event::default().event("login").data(card.replace('\r', "")))),
            Err(err) => {
                error!(error = %err, "Login card rendering failed");
                None
            },
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// `/`, `/tests` and `/auth/events`.
pub fn pages_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    Pages: FromRef<S>,
    Identity: FromRef<S>,
{
    OpenApiRouter::<S>::new()
        .routes(routes!(home_handler))
        .routes(routes!(tests_handler))
        .routes(routes!(events_handler))
}
