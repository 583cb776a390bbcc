use axum::Router;

pub mod jobs;
pub mod system;

/// Router for all tenant-scoped endpoints.
pub fn router() -> Router {
    Router::new().nest("/jobs", jobs::router())
}
