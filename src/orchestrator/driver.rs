//! Blocking driver: runs one request to completion on the calling thread.
//! Used by the headless `ask` command.

use std::sync::atomic::AtomicBool;

use dc_base::types::PredictionPayload;

use super::worker::{PumpEnd, pump};
use super::{FailureDecision, Flow, RequestRun};
use crate::fallback;
use crate::infra::api::{AgentTransport, SubServices};
use crate::render::SessionSummary;

/// Drive `run` through streaming and, when needed, the fallback pipeline.
/// `on_progress` is called after every applied event.
pub fn run_blocking(
    transport: &dyn AgentTransport,
    services: &dyn SubServices,
    run: &mut RequestRun,
    last_prediction: Option<&PredictionPayload>,
    mut on_progress: impl FnMut(&RequestRun),
) -> Option<SessionSummary> {
    let decision = match transport.open_stream(run.request()) {
        Err(e) => run.on_stream_failure(&e.to_string()),
        Ok(mut body) => {
            run.on_stream_opened();
            on_progress(run);
            let cancel = AtomicBool::new(false);
            let mut flow = Flow::Continue;
            let end = pump(body.as_mut(), &cancel, |event| {
                flow = run.handle_event(event);
                on_progress(run);
                flow == Flow::Continue
            });
            match (flow, end) {
                (Flow::Finished, _) => {
                    let summary = run.finalize();
                    on_progress(run);
                    return summary;
                }
                (Flow::Failed(message), _) => run.on_stream_failure(&message),
                (Flow::Continue, Ok(PumpEnd::Eof)) => run.on_stream_failure("stream closed before completion"),
                (Flow::Continue, Ok(_)) => run.on_stream_failure("stream stopped"),
                (Flow::Continue, Err(e)) => run.on_stream_failure(&e.to_string()),
            }
        }
    };

    let summary = match decision {
        FailureDecision::SoftEnd => run.finalize(),
        FailureDecision::Fallback(intent) => {
            on_progress(run);
            let outcome = fallback::run(services, run.request(), intent, last_prediction);
            run.apply_fallback(outcome)
        }
    };
    on_progress(run);
    summary
}
