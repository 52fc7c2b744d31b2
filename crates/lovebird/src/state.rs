use crate::error::LovebirdError;
use lovebird_domain::config::AppConfig;
use lovebird_event_bus::EventBus;
use lovebird_identity::Identity;
use lovebird_pages::Pages;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug)]
pub struct AppStateInner {
    pub config: AppConfig,
    pub events: EventBus,
    pub identity: Identity,
    pub pages: Pages,
}

/// Application state shared by every route.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(feature = "server")]
mod extract {
    use super::AppState;
    use axum::extract::FromRef;
    use lovebird_domain::config::AppConfig;
    use lovebird_event_bus::EventBus;
    use lovebird_identity::Identity;
    use lovebird_pages::Pages;

    impl FromRef<AppState> for AppConfig {
        fn from_ref(state: &AppState) -> Self {
            state.inner.config.clone()
        }
    }

    impl FromRef<AppState> for EventBus {
        fn from_ref(state: &AppState) -> Self {
            state.inner.events.clone()
        }
    }

    impl FromRef<AppState> for Identity {
        fn from_ref(state: &AppState) -> Self {
            state.inner.identity.clone()
        }
    }

    impl FromRef<AppState> for Pages {
        fn from_ref(state: &AppState) -> Self {
            state.inner.pages.clone()
        }
    }
}

#[derive(Debug, Default)]
pub struct AppStateBuilder {
    config: Option<AppConfig>,
    events: Option<EventBus>,
    identity: Option<Identity>,
    pages: Option<Pages>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    #[must_use]
    pub fn pages(mut self, pages: Pages) -> Self {
        self.pages = Some(pages);
        self
    }

    /// # Errors
    /// Returns [`LovebirdError::Validation`] without a config and
    /// [`LovebirdError::MissingSlice`] when a feature slice was not registered.
    pub fn build(self) -> Result<AppState, LovebirdError> {
        let config = self
            .config
            .ok_or_else(|| LovebirdError::Validation { message: "AppConfig not provided".into(), context: None })?;
        let identity = self
            .identity
            .ok_or_else(|| LovebirdError::MissingSlice { message: "identity".into(), context: None })?;
        let pages =
            self.pages.ok_or_else(|| LovebirdError::MissingSlice { message: "pages".into(), context: None })?;
        let events = self.events.unwrap_or_default();

        Ok(AppState { inner: Arc::new(AppStateInner { config, events, identity, pages }) })
    }
}
