use axum::{extract::State, http::StatusCode, Form, Json};

use crate::errors::AppError;
use crate::jobs::catalog::{add_job, list_jobs, NewJob};
use crate::models::job::Job;
use crate::session::Admin;
use crate::state::AppState;

/// POST /admin/jobs
pub async fn handle_add_job(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Form(req): Form<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = add_job(&state.store, req, &admin).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs-data
pub async fn handle_list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(list_jobs(&state.store).await)
}
