use std::sync::Arc;

use bizprofile_core::coordinator::ProfileUpdateCoordinator;
use bizprofile_core::gateway::{ProfileGateway, SourceFetcher};
use bizprofile_core::upload::UploadOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Holds only immutable configuration and stateless remote clients, so
/// concurrent requests never share mutable state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Remote business-profile API client.
    pub gateway: Arc<dyn ProfileGateway>,
    /// Downloader for `image_url` photo sources.
    pub fetcher: Arc<dyn SourceFetcher>,
}

impl AppState {
    pub fn coordinator(&self) -> ProfileUpdateCoordinator {
        ProfileUpdateCoordinator::new(Arc::clone(&self.gateway))
    }

    pub fn orchestrator(&self) -> UploadOrchestrator {
        UploadOrchestrator::new(Arc::clone(&self.gateway), Arc::clone(&self.fetcher))
            .with_max_bytes(self.config.max_photo_bytes)
    }
}
