use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::applications::intake::{list_applications, submit, Submission, APPLICATION_FILE_FIELDS};
use crate::errors::AppError;
use crate::models::application::Application;
use crate::routes::multipart::read_multipart;
use crate::session::Admin;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub job_id: String,
    pub files: usize,
}

/// POST /apply
pub async fn handle_apply(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let mut form = read_multipart(multipart, &state.uploads, APPLICATION_FILE_FIELDS).await?;

    let application = submit(
        &state.store,
        Submission {
            job_id: form.take_or_empty("jobId"),
            name: form.take_or_empty("name"),
            address: form.take_or_empty("address"),
            phone: form.take_or_empty("phone"),
            id_number: form.take_or_empty("idNumber"),
            files: form.files,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            status: "submitted",
            job_id: application.job_id,
            files: application.files.len(),
        }),
    ))
}

/// GET /admin/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Admin(_): Admin,
) -> Json<Vec<Application>> {
    Json(list_applications(&state.store).await)
}
