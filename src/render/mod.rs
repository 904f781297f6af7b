//! Pure payload-to-fragment renderers and the surfaces that print fragments.

pub mod equipment;
pub mod fragment;
pub mod html;
pub mod importance;
pub mod markdown;
pub mod prediction;
pub mod retrieval;
pub mod summary;
pub mod text;
pub mod tracker;

pub use fragment::{Fragment, OutputRegion, RichText};
pub use summary::SessionSummary;
pub use tracker::RenderState;
