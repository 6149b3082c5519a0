use std::sync::Arc;

use crate::config::Config;
use crate::mailer::Mailer;
use crate::session::SessionStore;
use crate::store::RecordStore;
use crate::uploads::UploadRelay;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub uploads: Arc<UploadRelay>,
    pub sessions: SessionStore,
    /// Verification mail goes through this. `LogMailer` when no relay is configured.
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}
