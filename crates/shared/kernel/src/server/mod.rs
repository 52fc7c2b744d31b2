mod health;
mod router;

pub use router::system_router;
pub use self_test::{SelfTestResponse, SettingState};
