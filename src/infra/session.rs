use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

/// Persists the session identifier in `<store>/session.json`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the stored id, generating and persisting one if absent.
    pub fn load_or_create(&self) -> Result<String, StoreError> {
        if let Some(id) = self.read()?.session_id.filter(|id| !id.trim().is_empty()) {
            return Ok(id);
        }
        self.regenerate()
    }

    /// Replace the stored id with a fresh one.
    pub fn regenerate(&self) -> Result<String, StoreError> {
        let id = generate_session_id();
        self.write(&SessionFile { session_id: Some(id.clone()) })?;
        tracing::info!(session = %id, "new session id");
        Ok(id)
    }

    fn read(&self) -> Result<SessionFile, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::default()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn write(&self, file: &SessionFile) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }
}

/// `session_<unix ms>_<9 random chars>`
pub fn generate_session_id() -> String {
    let ms = chrono::Utc::now().timestamp_millis();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", ms, &random[..9])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_expected_shape() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn load_or_create_is_stable_until_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        let first = store.load_or_create().unwrap();
        assert_eq!(store.load_or_create().unwrap(), first);

        let second = store.regenerate().unwrap();
        assert_ne!(second, first);
        assert_eq!(store.load_or_create().unwrap(), second);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(SessionStore::new(&path).load_or_create(), Err(StoreError::Json(_))));
    }
}
