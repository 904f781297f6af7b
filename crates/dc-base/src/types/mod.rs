//! Wire and domain types shared by the client crates.

mod event;
mod job;
mod payload;
mod request;

pub use event::{ResultKind, StreamEvent};
pub use job::{IngestJob, JobStatistics, JobStatus};
pub use payload::{
    ClassProbabilities, ImportancePayload, NarrativePayload, Prediction, PredictionPayload, QualityClass,
    RetrievalPayload, SourceDoc,
};
pub use request::{AgentRequest, FeatureSnapshot};

use serde::{Deserialize, Serialize};

/// What a question is asking for, as judged by the keyword heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Prediction,
    Explanation,
    Knowledge,
}
