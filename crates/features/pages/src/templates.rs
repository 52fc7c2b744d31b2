use crate::error::{PagesError, PagesErrorExt};
use crate::view::{CheckResult, LoginModel};
use minijinja::{Environment, UndefinedBehavior, context};
use std::sync::Arc;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("login_card.html", include_str!("../templates/login_card.html")),
    ("tests.html", include_str!("../templates/tests.html")),
];

/// Compiled HTML templates. Output is HTML-escaped.
#[derive(Debug, Clone)]
pub struct Templates {
    env: Arc<Environment<'static>>,
}

impl Templates {
    /// # Errors
    /// Returns [`PagesError::Template`] if a bundled template fails to parse.
    pub fn new() -> Result<Self, PagesError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        for (name, source) in TEMPLATES {
            env.add_template(*name, *source).context(*name)?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    /// The full login page.
    ///
    /// # Errors
    /// Returns [`PagesError::Template`] on a rendering failure.
    pub fn login_page(&self, model: &LoginModel) -> Result<String, PagesError> {
        self.render("index.html", model)
    }

    /// Only the login card, as pushed over `/auth/events`.
    ///
    /// # Errors
    /// Returns [`PagesError::Template`] on a rendering failure.
    pub fn login_card(&self, model: &LoginModel) -> Result<String, PagesError> {
        self.render("login_card.html", model)
    }

    /// # Errors
    /// Returns [`PagesError::Template`] on a rendering failure.
    pub fn tests_page(&self, checks: &[CheckResult]) -> Result<String, PagesError> {
        self.render("tests.html", context! { checks })
    }

    fn render<S: serde::Serialize>(&self, name: &'static str, ctx: S) -> Result<String, PagesError> {
        self.env.get_template(name).and_then(|template| template.render(ctx)).context(name)
    }
}
