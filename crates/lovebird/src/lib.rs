//! Facade crate for Lovebird features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Add `lovebird` with the `server` feature.
//! - Call [`init`] once with the loaded [`AppConfig`](domain::config::AppConfig) and hand the
//!   resulting [`AppState`] to the router.

mod error;
mod state;

pub use crate::error::{LovebirdError, LovebirdErrorExt};
pub use crate::state::{AppState, AppStateBuilder, AppStateInner};
pub use lovebird_domain as domain;
pub use lovebird_event_bus as events;
pub use lovebird_kernel as kernel;

use lovebird_domain::config::AppConfig;
use lovebird_event_bus::EventBus;

#[cfg(feature = "server")]
pub mod server {
    use crate::AppState;
    use lovebird_identity::server::identity_router;
    use lovebird_kernel::server::system_router;
    use lovebird_pages::server::pages_router;
    use utoipa_axum::router::OpenApiRouter;

    pub use lovebird_identity::server::{BrowserId, browser_session};

    /// Every feature route, documented.
    ///
    /// Identity and pages routes expect [`browser_session`] to be layered around them.
    #[must_use]
    pub fn api_router() -> OpenApiRouter<AppState> {
        OpenApiRouter::new().merge(system_router()).merge(identity_router()).merge(pages_router())
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    pub use lovebird_identity as identity;
    pub use lovebird_pages as pages;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        "identity",
        "pages",
        #[cfg(feature = "server")]
        "server",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initialize all feature slices over one shared event bus.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub fn init(config: AppConfig) -> Result<AppState, LovebirdError> {
    let events = EventBus::new();
    let identity = features::identity::init(&config, events.clone()).context("Identity")?;
    let pages = features::pages::init(&config).context("Pages")?;

    let state = AppState::builder().config(config).events(events).identity(identity).pages(pages).build()?;
    tracing::info!(features = ?features::ENABLED, "Feature slices initialized");
    Ok(state)
}
