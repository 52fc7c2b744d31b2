mod routes;

pub use routes::pages_router;
