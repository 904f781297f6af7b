use std::path::{Path, PathBuf};

use dc_base::config::DEFAULT_THEME;
use dc_base::constants::{DEFAULT_BACKEND_URL, DEFAULT_SERVICES_URL, LOG_FILE, LOGS_DIR, SESSION_FILE, STORE_DIR};

/// Resolved runtime settings. Values come from the environment (with `.env`
/// loaded first) and are overridden by command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub services_url: String,
    pub store_dir: PathBuf,
    pub theme: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            services_url: DEFAULT_SERVICES_URL.to_string(),
            store_dir: PathBuf::from(STORE_DIR),
            theme: DEFAULT_THEME.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

/// Load `.env` from the working directory if present.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

impl Settings {
    pub fn new(
        backend_url: impl Into<String>,
        services_url: impl Into<String>,
        store_dir: impl Into<PathBuf>,
        theme: impl Into<String>,
        log_filter: impl Into<String>,
    ) -> Self {
        Self {
            backend_url: trim_base(backend_url.into()),
            services_url: trim_base(services_url.into()),
            store_dir: store_dir.into(),
            theme: theme.into(),
            log_filter: log_filter.into(),
        }
    }

    /// Full URL of a backend path such as `/api/chat`.
    pub fn backend_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_url, path)
    }

    /// Full URL of a sub-service path such as `/t1`.
    pub fn service_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.services_url, path)
    }

    pub fn session_path(&self) -> PathBuf {
        self.store_dir.join(SESSION_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.store_dir.join(LOGS_DIR).join(LOG_FILE)
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let s = Settings::new("http://agent:8000/", "http://svc/prod//", ".dcpilot", "foundry", "info");
        assert_eq!(s.backend_endpoint("/api/chat"), "http://agent:8000/api/chat");
        assert_eq!(s.service_endpoint("/t2"), "http://svc/prod/t2");
    }

    #[test]
    fn store_paths_live_under_store_dir() {
        let s = Settings { store_dir: PathBuf::from("/tmp/dc"), ..Settings::default() };
        assert_eq!(s.session_path(), PathBuf::from("/tmp/dc/session.json"));
        assert_eq!(s.log_path(), PathBuf::from("/tmp/dc/logs/dcpilot.log"));
    }
}
