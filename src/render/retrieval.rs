use dc_base::types::{NarrativePayload, RetrievalPayload};

use super::fragment::{Citation, RetrievalView, RichText};
use super::markdown;

pub fn render(payload: &RetrievalPayload) -> RetrievalView {
    RetrievalView {
        answer: markdown::parse(&payload.answer),
        citations: payload
            .sources
            .iter()
            .map(|doc| Citation { title: doc.display_title().to_string(), kind: doc.display_kind().to_string() })
            .collect(),
        synthetic: payload.synthetic,
    }
}

/// Narrative summary shown at the top of the request's output.
pub fn render_narrative(payload: &NarrativePayload) -> RichText {
    markdown::parse(&payload.answer)
}
