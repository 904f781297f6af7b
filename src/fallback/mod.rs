//! Synchronous multi-call path used when the agent stream fails before any
//! result was rendered.

pub mod intent;

use dc_base::catalog;
use dc_base::constants::EXPLAIN_TOP_N;
use dc_base::types::{AgentRequest, ImportancePayload, Intent, PredictionPayload, RetrievalPayload};

use crate::infra::api::SubServices;

pub use intent::classify_intent;

/// Results of one fallback run. Failed sub-calls are replaced by labeled
/// placeholders unless every call in the chosen path failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome {
    pub intent: Intent,
    pub prediction: Option<PredictionPayload>,
    pub importance: Option<ImportancePayload>,
    pub retrieval: Option<RetrievalPayload>,
    /// Raw error detail of each failed sub-call
    pub failures: Vec<String>,
    pub total_failure: bool,
}

impl FallbackOutcome {
    fn new(intent: Intent) -> Self {
        Self { intent, prediction: None, importance: None, retrieval: None, failures: Vec::new(), total_failure: false }
    }

    pub fn apology(&self) -> String {
        format!("Sorry, the analysis could not be completed. ({})", self.failures.join("; "))
    }
}

pub fn run(
    services: &dyn SubServices,
    request: &AgentRequest,
    intent: Intent,
    last_prediction: Option<&PredictionPayload>,
) -> FallbackOutcome {
    tracing::info!(?intent, "running fallback pipeline");
    match intent {
        Intent::Prediction | Intent::Explanation => analyze(services, request, intent),
        Intent::Knowledge => lookup(services, request, last_prediction),
    }
}

/// predict, then explain with the prediction's latent features.
fn analyze(services: &dyn SubServices, request: &AgentRequest, intent: Intent) -> FallbackOutcome {
    let mut outcome = FallbackOutcome::new(intent);

    let prediction = match services.predict(&request.features) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "prediction call failed, using placeholder");
            outcome.failures.push(format!("prediction: {}", e));
            PredictionPayload::placeholder()
        }
    };

    let importance = match services.explain(&request.features, &prediction.latent_features, EXPLAIN_TOP_N) {
        Ok(i) => i,
        Err(e) => {
            tracing::warn!(error = %e, "explanation call failed, using placeholder");
            outcome.failures.push(format!("explanation: {}", e));
            ImportancePayload::placeholder(&catalog::feature_ids(), EXPLAIN_TOP_N)
        }
    };

    outcome.total_failure = outcome.failures.len() == 2;
    if !outcome.total_failure {
        outcome.prediction = Some(prediction);
        outcome.importance = Some(importance);
    }
    outcome
}

fn lookup(
    services: &dyn SubServices,
    request: &AgentRequest,
    last_prediction: Option<&PredictionPayload>,
) -> FallbackOutcome {
    let mut outcome = FallbackOutcome::new(Intent::Knowledge);
    match services.retrieve(&request.question, last_prediction) {
        Ok(r) => outcome.retrieval = Some(r),
        Err(e) => {
            tracing::warn!(error = %e, "retrieval call failed");
            outcome.failures.push(format!("retrieval: {}", e));
            outcome.total_failure = true;
        }
    }
    outcome
}
