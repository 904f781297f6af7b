pub mod actions;
mod app;
pub mod events;

pub use app::{App, Backends};
