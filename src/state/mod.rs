//! State types split into domain-focused modules.
//!
//! - `runtime`: State struct (session, transcript, input, ingestion status)
//! - `params`: ParamsEditor for the feature snapshot

pub mod params;
pub mod runtime;

pub use params::ParamsEditor;
pub use runtime::{Exchange, IngestView, State};
