//! Pages feature slice: the login page, the self-test page and the live login feed.
//!
//! The views are independent of HTTP; the `server` feature adds the axum routes.

mod error;
#[cfg(feature = "server")]
pub mod server;
mod templates;
pub mod view;

pub use crate::error::{PagesError, PagesErrorExt};
pub use crate::templates::Templates;

use lovebird_domain::config::AppConfig;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use view::StatusProbe;

#[derive(Debug)]
pub struct PagesInner {
    pub config: AppConfig,
    pub templates: Templates,
    pub probe: StatusProbe,
}

impl PagesInner {
    /// Upper bound for the login view's session lookup.
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        self.config.identity.session_timeout()
    }
}

/// Pages feature state
#[derive(Debug, Clone)]
pub struct Pages {
    inner: Arc<PagesInner>,
}

impl Deref for Pages {
    type Target = PagesInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Initialize the pages feature.
///
/// # Errors
/// Returns [`PagesError::Template`] for a broken bundled template and
/// [`PagesError::Http`] if the diagnostics client cannot be built.
pub fn init(config: &AppConfig) -> Result<Pages, PagesError> {
    let templates = Templates::new()?;
    let probe = StatusProbe::new(config)?;

    tracing::info!(status_url = probe.url(), "Pages slice initialized");

    Ok(Pages { inner: Arc::new(PagesInner { config: config.clone(), templates, probe }) })
}
