//! Cookie sessions and the request guards built on them.
//!
//! Sessions live in memory only: a restart signs everyone out. There is no
//! logout and no expiry.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::identity::manager::find_user;
use crate::models::user::Capability;
use crate::state::AppState;
use crate::store::RecordStore;

pub const SESSION_COOKIE: &str = "sid";

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStore {
    /// Opens a session for `email` and returns its id.
    pub async fn bind(&self, email: &str) -> String {
        let sid = Uuid::new_v4().simple().to_string();
        self.inner
            .write()
            .await
            .insert(sid.clone(), email.to_string());
        sid
    }

    pub async fn signed_in_email(&self, sid: &str) -> Option<String> {
        self.inner.read().await.get(sid).cloned()
    }
}

pub fn session_cookie(sid: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, sid))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn require_user(sessions: &SessionStore, sid: Option<&str>) -> Result<String, AppError> {
    match sid {
        Some(sid) => sessions
            .signed_in_email(sid)
            .await
            .ok_or(AppError::Unauthenticated),
        None => Err(AppError::Unauthenticated),
    }
}

/// Passes when the stored account for `email` may manage jobs.
pub async fn require_admin(store: &RecordStore, email: &str) -> Result<(), AppError> {
    match find_user(store, email).await {
        Some(user) if user.role.allows(Capability::ManageJobs) => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

/// Extractor for routes that need a signed-in user.
#[derive(Debug)]
pub struct SignedIn(pub String);

#[async_trait]
impl FromRequestParts<AppState> for SignedIn {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let sid = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        require_user(&state.sessions, sid.as_deref()).await.map(SignedIn)
    }
}

/// Extractor for administrator routes. Anonymous requests get 401, signed-in
/// users without the capability get 403.
#[derive(Debug)]
pub struct Admin(pub String);

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let SignedIn(email) = SignedIn::from_request_parts(parts, state).await?;
        require_admin(&state.store, &email).await?;
        Ok(Admin(email))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Request};
    use tempfile::TempDir;

    use super::*;
    use crate::config::Config;
    use crate::mailer::testing::RecordingMailer;
    use crate::models::user::{Role, User};
    use crate::store::Collection;
    use crate::uploads::UploadRelay;

    #[tokio::test]
    async fn test_bound_session_resolves_email() {
        let sessions = SessionStore::default();
        let sid = sessions.bind("ana@example.com").await;
        assert_eq!(
            require_user(&sessions, Some(&sid)).await.unwrap(),
            "ana@example.com"
        );
    }

    #[tokio::test]
    async fn test_missing_or_unknown_session_is_unauthenticated() {
        let sessions = SessionStore::default();
        assert!(matches!(
            require_user(&sessions, None).await.unwrap_err(),
            AppError::Unauthenticated
        ));
        assert!(matches!(
            require_user(&sessions, Some("forged")).await.unwrap_err(),
            AppError::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_distinct() {
        let sessions = SessionStore::default();
        let a = sessions.bind("ana@example.com").await;
        let b = sessions.bind("ana@example.com").await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_require_admin_checks_role() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();
        let mut admin = User::new_unverified(
            "boss@example.com".to_string(),
            "h".to_string(),
            "t".to_string(),
            Role::Admin,
        );
        admin.verified = true;
        let plain = User::new_unverified(
            "ana@example.com".to_string(),
            "h".to_string(),
            "t".to_string(),
            Role::User,
        );
        store.save(Collection::Users, &[admin, plain]).await.unwrap();

        assert!(require_admin(&store, "boss@example.com").await.is_ok());
        assert!(matches!(
            require_admin(&store, "ana@example.com").await.unwrap_err(),
            AppError::Forbidden
        ));
        assert!(matches!(
            require_admin(&store, "ghost@example.com").await.unwrap_err(),
            AppError::Forbidden
        ));
    }

    #[tokio::test]
    async fn test_admin_extractor_carries_email() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("data")).await.unwrap();
        let admin = User::new_unverified(
            "boss@example.com".to_string(),
            "h".to_string(),
            "t".to_string(),
            Role::Admin,
        );
        store.save(Collection::Users, &[admin]).await.unwrap();

        let state = AppState {
            store: Arc::new(store),
            uploads: Arc::new(UploadRelay::open(dir.path().join("uploads")).await.unwrap()),
            sessions: SessionStore::default(),
            mailer: Arc::new(RecordingMailer::default()),
            config: Config::for_tests(),
        };
        let sid = state.sessions.bind("boss@example.com").await;

        let request = Request::builder()
            .uri("/admin/jobs")
            .header(header::COOKIE, format!("{SESSION_COOKIE}={sid}"))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let Admin(email) = Admin::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(email, "boss@example.com");
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
