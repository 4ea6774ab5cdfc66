use axum::{
    Router,
    routing::{get, post},
};

pub mod acls;
pub mod common;
pub mod devices;
pub mod files;
pub mod packages;
pub mod products;
pub mod roles;
pub mod session;
pub mod system;
pub mod users;

/// Endpoints reachable without a token (health, login, device check-ins, downloads).
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .route("/devices/report", post(devices::report))
        .route("/devices/upgrades", get(devices::upgrades))
        .route("/files/*key", get(files::download))
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/devices/logs", get(devices::list_logs))
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .nest("/acls", acls::router())
        .nest("/products", products::router())
        .nest("/packages", packages::router())
}
