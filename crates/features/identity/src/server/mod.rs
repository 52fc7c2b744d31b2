mod browser;
mod routes;

pub use browser::{BrowserId, browser_session};
pub use routes::identity_router;
