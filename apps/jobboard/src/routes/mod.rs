pub mod health;
pub mod multipart;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::applications::handlers as applications;
use crate::identity::handlers as identity;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/signup", post(identity::handle_signup))
        .route("/verify", get(identity::handle_verify))
        .route("/signin", post(identity::handle_signin))
        .route("/me", get(identity::handle_me))
        .route("/updateProfile", post(identity::handle_update_profile))
        // Jobs
        .route("/jobs-data", get(jobs::handle_list_jobs))
        .route("/admin/jobs", post(jobs::handle_add_job))
        // Applications
        .route("/apply", post(applications::handle_apply))
        .route(
            "/admin/applications",
            get(applications::handle_list_applications),
        )
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
