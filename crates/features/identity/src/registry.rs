use crate::client::AuthClient;
use crate::service::IdentityService;
use lovebird_event_bus::EventBus;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Bounded, idle-expiring map from browser id to [`AuthClient`].
#[derive(Debug, Clone)]
pub struct AuthClients {
    cache: Cache<Arc<str>, AuthClient>,
    service: IdentityService,
    events: EventBus,
}

impl AuthClients {
    #[must_use]
    pub fn new(service: IdentityService, events: EventBus, capacity: u64, idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(idle)
            .eviction_listener(|id, _client, cause| {
                debug!(client = %id, ?cause, "Browser client evicted");
            })
            .build();
        Self { cache, service, events }
    }

    /// The client for `browser_id`, created on first use.
    #[must_use]
    pub fn get_or_create(&self, browser_id: &str) -> AuthClient {
        self.cache.get_with(Arc::from(browser_id), || {
            debug!(client = browser_id, "Creating browser client");
            AuthClient::new(browser_id, self.service.clone(), self.events.clone())
        })
    }
}
