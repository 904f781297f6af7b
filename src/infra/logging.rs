use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use super::error::StoreError;
use super::settings::Settings;

/// Install the global tracing subscriber.
///
/// The TUI owns the terminal, so events go to `<store>/logs/dcpilot.log`.
/// Headless commands may ask for stderr instead.
pub fn init(settings: &Settings, to_stderr: bool) -> Result<(), StoreError> {
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if to_stderr {
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| StoreError::Logging(e.to_string()));
    }

    let path = settings.log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).map_err(|e| StoreError::io(&path, e))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| StoreError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_the_failure() {
        let settings = Settings::default();
        let _ = init(&settings, true);
        let err = init(&settings, true).unwrap_err();
        assert!(matches!(err, StoreError::Logging(_)));
    }
}
