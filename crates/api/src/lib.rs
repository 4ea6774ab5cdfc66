//! Console HTTP API: axum router, auth middleware and JSON mapping over the
//! `nova-infra` services.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
