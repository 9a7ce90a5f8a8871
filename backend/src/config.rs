//! Runtime configuration sourced from the environment.

use std::env;
use std::path::PathBuf;

/// Placeholder backend URL used when none is configured (development).
const DEFAULT_BACKEND_URL: &str = "https://your-project-url.backend.example";
/// Placeholder API key matching the placeholder URL.
const DEFAULT_API_KEY: &str = "your-public-anon-key";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted backend (row store + identity provider).
    pub backend_url: String,
    /// Public API key sent with every backend request.
    pub backend_api_key: String,
    /// Address the REST server binds to.
    pub listen_addr: String,
    /// Directory holding the local fallback cache.
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            backend_url: env::var("EXPENSE_BACKEND_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            backend_api_key: env::var("EXPENSE_BACKEND_API_KEY")
                .unwrap_or_else(|_| DEFAULT_API_KEY.to_string()),
            listen_addr: env::var("EXPENSE_LISTEN_ADDR")
                .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            data_dir: env::var("EXPENSE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
        }
    }

    /// True when real backend credentials were provided. With the
    /// placeholder credentials every primary-store call fails and the app
    /// runs entirely on the local fallback cache.
    pub fn is_configured(&self) -> bool {
        self.backend_url != DEFAULT_BACKEND_URL && self.backend_api_key != DEFAULT_API_KEY
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expense-tracker")
}
