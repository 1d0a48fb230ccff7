pub mod chat;
pub mod config;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod plagiarism;
pub mod recovery;
pub mod services;
pub mod session;
pub mod startup;
pub mod subscription;
pub mod utils;
pub mod workspace;

use config::Settings;
use plagiarism::PlagiarismBackend;
use services::{
    api_client::ApiClient, identity_client::IdentityClient, plagiarism_client::PlagiarismClient,
};
use session::IdentityProvider;
use std::sync::Arc;
use workspace::Workspaces;

/// Shared application state containing settings, service clients and the
/// per-user dashboards.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub identity: Arc<dyn IdentityProvider>,
    pub plagiarism: Arc<dyn PlagiarismBackend>,
    pub chat_api: ApiClient,
    pub workspaces: Workspaces,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let identity = Arc::new(IdentityClient::new(settings.identity.clone()));
        let plagiarism = Arc::new(PlagiarismClient::new(settings.plagiarism.clone()));
        Self::with_backends(settings, identity, plagiarism)
    }

    /// State with caller-supplied identity and plagiarism backends.
    pub fn with_backends(
        settings: Settings,
        identity: Arc<dyn IdentityProvider>,
        plagiarism: Arc<dyn PlagiarismBackend>,
    ) -> Self {
        let chat_api = ApiClient::new(settings.backend.api_base_url.clone());
        let workspaces = Workspaces::new(settings.navigation.clone());
        Self {
            settings: Arc::new(settings),
            identity,
            plagiarism,
            chat_api,
            workspaces,
        }
    }
}
