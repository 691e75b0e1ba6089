//! Application configuration.

use kurbo::Size;
use memorybank_client::{ClientBuilder, DEFAULT_TIMEOUT, MemoryBankClient};
use memorybank_core::annotation::SessionConfig;
use memorybank_core::session::SessionContext;
use memorybank_core::storage::{FileStore, StorageResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding [`AppConfig::api_base_url`].
pub const API_BASE_URL_ENV: &str = "MEMORYBANK_API_BASE_URL";
/// Environment variable overriding [`AppConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "MEMORYBANK_DATA_DIR";
/// Environment variable overriding [`AppConfig::request_timeout`], in seconds.
pub const TIMEOUT_ENV: &str = "MEMORYBANK_TIMEOUT_SECS";

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the notes/graph/auth API.
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Directory of the session file. `None` uses the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// Page size used when a note does not say otherwise, in PDF points.
    pub page_size: Size,
    /// Initial page viewport scale.
    pub scale: f64,
    /// Viewport used for graph layout and SVG output.
    pub graph_size: Size,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            data_dir: None,
            page_size: Size::new(595.0, 842.0),
            scale: 1.0,
            graph_size: Size::new(800.0, 600.0),
        }
    }
}

impl AppConfig {
    /// Apply command-line (or environment, via clap) overrides.
    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        data_dir: Option<PathBuf>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = api_base_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = data_dir {
            self.data_dir = Some(dir);
        }
        if let Some(secs) = timeout_secs.filter(|s| *s > 0) {
            self.request_timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Annotation session parameters for a note with `page_count` pages.
    pub fn session_config(&self, page_count: u32) -> SessionConfig {
        SessionConfig {
            page_count: page_count.max(1),
            page_size: self.page_size,
            scale: self.scale,
            read_only: false,
        }
    }

    /// Open the key/value store that persists the login session.
    pub fn open_store(&self) -> StorageResult<FileStore> {
        match &self.data_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::default_location(),
        }
    }

    /// Build an API client bound to `session`.
    pub fn client(&self, session: Arc<dyn SessionContext>) -> memorybank_client::Result<MemoryBankClient> {
        ClientBuilder::new()
            .base_url(&self.api_base_url)
            .timeout(self.request_timeout)
            .user_agent(format!("memorybank/{}", env!("CARGO_PKG_VERSION")))
            .session(session)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.data_dir.is_none());
        assert!((config.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("https://notes.example.com/api/".to_string()),
            Some(PathBuf::from("/tmp/mb")),
            Some(5),
        );
        assert_eq!(config.api_base_url, "https://notes.example.com/api/");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/mb")));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_overrides_ignored() {
        let config = AppConfig::default().with_overrides(Some("  ".to_string()), None, Some(0));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_session_config_has_at_least_one_page() {
        let config = AppConfig::default();
        assert_eq!(config.session_config(0).page_count, 1);
        assert_eq!(config.session_config(7).page_count, 7);
    }

    #[test]
    fn test_open_store_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default().with_overrides(None, Some(dir.path().to_path_buf()), None);
        let store = config.open_store().unwrap();
        assert!(store.path().starts_with(dir.path()));
    }
}
