pub mod diagnostics;
pub mod login;

pub use diagnostics::{CheckResult, StatusProbe, run_checks};
pub use login::{LoginModel, LoginState, LoginView};
