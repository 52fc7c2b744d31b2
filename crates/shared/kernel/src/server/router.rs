use super::{health, self_test};
use axum::extract::FromRef;
use axum::routing::any;
use lovebird_domain::config::AppConfig;
use utoipa_axum::router::{OpenApiRouter, UtoipaMethodRouter};
use utoipa_axum::routes;

/// `/health` and `/api/self-test`. The self-test answers every method.
pub fn system_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    AppConfig: FromRef<S>,
{
    let (schemas, paths, _): UtoipaMethodRouter<S> = routes!(self_test::self_test_handler);

    OpenApiRouter::<S>::new()
        .routes(routes!(health::health_handler))
        .routes((schemas, paths, any(self_test::self_test_handler)))
}
