mod applications;
mod config;
mod errors;
mod identity;
mod jobs;
mod mailer;
mod models;
mod routes;
mod session;
mod state;
mod store;
mod uploads;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::identity::manager::ensure_admin_role;
use crate::mailer::{LogMailer, Mailer, RelayMailer};
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::store::RecordStore;
use crate::uploads::UploadRelay;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board v{}", env!("CARGO_PKG_VERSION"));

    let store = RecordStore::open(&config.data_dir).await?;
    info!("Record store ready at {}", config.data_dir.display());
    ensure_admin_role(&store, &config.admin_email).await?;

    let uploads = UploadRelay::open(&config.upload_dir).await?;

    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => {
            info!("Sending mail through relay {url}");
            Arc::new(RelayMailer::new(url.clone(), config.mail_relay_token.clone())?)
        }
        None => {
            warn!("MAIL_RELAY_URL not set; verification emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = AppState {
        store: Arc::new(store),
        uploads: Arc::new(uploads),
        sessions: SessionStore::default(),
        mailer,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
