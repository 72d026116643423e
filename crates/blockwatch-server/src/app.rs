//! Application state wiring

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use blockwatch_core::{InMemoryContentRepository, InMemoryUserDirectory};
use blockwatch_moderation::{
    ContentScreen, ContentService, LexiconClassifier, MediaLocatorClassifier,
    ModerationOrchestrator,
};
use blockwatch_realtime::{ConnectionRegistry, NotificationDispatcher};

use crate::auth::HmacTokenAuthenticator;
use crate::blobs::FsBlobStore;
use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Live-connection registry
    pub registry: Arc<ConnectionRegistry>,

    /// Notification fan-out
    pub dispatcher: Arc<NotificationDispatcher>,

    /// Content creation and read surface
    pub service: Arc<ContentService>,

    /// User directory (in-memory for the development server)
    pub users: Arc<InMemoryUserDirectory>,

    /// Bearer-token verification
    pub auth: Arc<HmacTokenAuthenticator>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Initialize application state from configuration
    pub async fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        info!("Initializing application state");

        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(registry.clone()));
        let repo = Arc::new(InMemoryContentRepository::new());
        let users = Arc::new(InMemoryUserDirectory::new());

        let blobs = Arc::new(
            FsBlobStore::new(
                config.media.dir.clone(),
                config.media.public_base_url.clone(),
                config.media.max_upload_bytes,
            )
            .await?,
        );

        // Text screen honors a configured blocked-term override
        let text = match &config.moderation.blocked_terms {
            Some(terms) => LexiconClassifier::with_terms(terms.iter().cloned()),
            None => LexiconClassifier::new(),
        };
        let screen = ContentScreen::new(Arc::new(text), Arc::new(MediaLocatorClassifier::new()))
            .with_timeout(Duration::from_secs(config.moderation.timeout_secs));

        let orchestrator = Arc::new(
            ModerationOrchestrator::new(repo.clone(), screen, dispatcher.clone())
                .with_blob_store(blobs.clone()),
        );

        let service = Arc::new(
            ContentService::new(repo, users.clone(), dispatcher.clone(), orchestrator)
                .with_blob_store(blobs),
        );

        let auth = Arc::new(HmacTokenAuthenticator::new(&config.auth.secret));

        info!("Application state initialized");

        Ok(Self {
            config: Arc::new(config),
            registry,
            dispatcher,
            service,
            users,
            auth,
            metrics_handle,
        })
    }
}
