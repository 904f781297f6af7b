pub mod api;
pub mod decoder;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod session;
pub mod settings;
