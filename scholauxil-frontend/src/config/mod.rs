use std::path::PathBuf;
use std::time::Duration;

use secrecy::Secret;
use serde::Deserialize;
use service_core::observability::TelemetrySettings;

use crate::navigation::NavigationSettings;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub identity: IdentitySettings,
    pub backend: BackendSettings,
    pub plagiarism: PlagiarismSettings,
    #[serde(default)]
    pub navigation: NavigationSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Where signed-out visitors are sent.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_session_inactivity_hours")]
    pub session_inactivity_hours: i64,
    /// Upper bound for chat uploads (document plus image).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl ServerSettings {
    /// How long an untouched session stays valid.
    pub fn session_idle_limit(&self) -> Duration {
        let hours = u64::try_from(self.session_inactivity_hours).unwrap_or(0).max(1);
        Duration::from_secs(hours * 3600)
    }
}

fn default_landing_path() -> String {
    "/".to_string()
}

fn default_session_inactivity_hours() -> i64 {
    24
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_static_dir() -> String {
    "scholauxil-frontend/static".to_string()
}

/// Firebase Identity Toolkit endpoints.
#[derive(Deserialize, Clone)]
pub struct IdentitySettings {
    /// Web API key of the Firebase project.
    pub api_key: Secret<String>,
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
    /// Secure Token service, used to refresh expired ID tokens.
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_identity_base_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_token_url() -> String {
    "https://securetoken.googleapis.com/v1".to_string()
}

/// Research-assistant API (chat completions).
#[derive(Deserialize, Clone)]
pub struct BackendSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    "https://backend-scholauxil.onrender.com/api".to_string()
}

#[derive(Deserialize, Clone)]
pub struct PlagiarismSettings {
    #[serde(default = "default_plagiarism_base_url")]
    pub base_url: String,
}

fn default_plagiarism_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn configuration_directory() -> Result<PathBuf, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;

    // Running from the crate directory or from the workspace root.
    if base_path.ends_with("scholauxil-frontend") {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join("scholauxil-frontend").join("config"))
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let configuration_directory = configuration_directory()?;

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
