use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Form, Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::identity::manager::{
    authenticate, profile, register, update_profile, verify, ProfileUpdate, RegistrationParams,
};
use crate::mailer::{send_verification, DeliveryStatus};
use crate::models::user::UserProfile;
use crate::routes::multipart::read_multipart;
use crate::session::{session_cookie, SignedIn};
use crate::state::AppState;

/// File field carrying the ID document on profile updates.
pub const ID_UPLOAD_FIELD: &str = "idUpload";

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub email: String,
    pub verification_email: DeliveryStatus,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub email: String,
    pub verified: bool,
}

#[derive(Serialize)]
pub struct SigninResponse {
    pub email: String,
}

/// POST /signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Form(req): Form<Credentials>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let token = register(
        &state.store,
        RegistrationParams {
            email: &req.email,
            password: &req.password,
            bcrypt_cost: state.config.bcrypt_cost,
            admin_email: &state.config.admin_email,
        },
    )
    .await?;

    let verification_email =
        send_verification(state.mailer.as_ref(), &state.config, &req.email, &token).await;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            email: req.email,
            verification_email,
        }),
    ))
}

/// GET /verify?token=
pub async fn handle_verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, AppError> {
    let email = verify(&state.store, &params.token).await?;
    Ok(Json(VerifyResponse {
        email,
        verified: true,
    }))
}

/// POST /signin
pub async fn handle_signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<Credentials>,
) -> Result<(CookieJar, Json<SigninResponse>), AppError> {
    let email = authenticate(&state.store, &req.email, &req.password).await?;
    let sid = state.sessions.bind(&email).await;
    Ok((jar.add(session_cookie(sid)), Json(SigninResponse { email })))
}

/// GET /me
pub async fn handle_me(
    State(state): State<AppState>,
    SignedIn(email): SignedIn,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(profile(&state.store, &email).await?))
}

/// POST /updateProfile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    SignedIn(email): SignedIn,
    multipart: Multipart,
) -> Result<Json<UserProfile>, AppError> {
    let mut form = read_multipart(multipart, &state.uploads, &[ID_UPLOAD_FIELD]).await?;

    let update = ProfileUpdate {
        phone: form.take("phone"),
        family_phone: form.take("familyPhone"),
        age: form.take("age"),
        address: form.take("address"),
        id_number: form.take("idNumber"),
        id_upload: form.files.remove(ID_UPLOAD_FIELD).map(|f| f.filename),
    };

    let user = update_profile(&state.store, &email, update).await?;
    Ok(Json(user.profile()))
}
