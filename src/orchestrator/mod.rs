//! Lifecycle of one submitted request.
//!
//! `RequestRun` is a plain state object owned by the event loop: worker
//! threads only do I/O and hand events back, so the timeline and the render
//! state are mutated from a single thread without locks.
//!
//! ```text
//! opening -> streaming -> finalizing   -> closed
//!                     \-> falling_back -> closed
//! ```

pub mod driver;
pub mod worker;

use std::time::Instant;

use dc_base::catalog;
use dc_base::types::{
    AgentRequest, ImportancePayload, Intent, PredictionPayload, ResultKind, RetrievalPayload, StreamEvent,
};

use crate::fallback::{FallbackOutcome, classify_intent};
use crate::render::fragment::{Notice, NoticeLevel};
use crate::render::{self, Fragment, OutputRegion, RenderState, SessionSummary, equipment, importance, prediction};
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Opening,
    Streaming,
    Finalizing,
    FallingBack,
    Closed,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Streaming => "streaming",
            Phase::Finalizing => "finalizing",
            Phase::FallingBack => "falling_back",
            Phase::Closed => "closed",
        }
    }

    /// Still waiting on the agent stream.
    pub fn accepts_events(self) -> bool {
        matches!(self, Phase::Opening | Phase::Streaming)
    }
}

/// The "working…" indicator at the top of the request's output.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveStatus {
    Live { message: String },
    Completed { elapsed_secs: f64 },
    Failed { message: String },
    /// Taken down when the fallback pipeline takes over.
    Removed,
}

impl LiveStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, LiveStatus::Live { .. })
    }
}

/// What the stream reader should do after an event was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    /// `done` received: stop reading and finalize.
    Finished,
    /// `error` received: stop reading and treat as a stream failure.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureDecision {
    /// Nothing was rendered: run the direct pipeline for this intent.
    Fallback(Intent),
    /// Something is already on screen: close quietly and keep it.
    SoftEnd,
}

/// Payloads that made it through the render gate, for the summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResults {
    pub prediction: Option<PredictionPayload>,
    pub importance: Option<ImportancePayload>,
    pub retrieval: Option<RetrievalPayload>,
}

pub struct RequestRun {
    id: u64,
    request: AgentRequest,
    phase: Phase,
    render: RenderState,
    timeline: Timeline,
    output: OutputRegion,
    live: LiveStatus,
    started: Instant,
    /// Elapsed seconds last reported by the agent itself
    agent_elapsed: Option<f64>,
    results: RunResults,
    error: Option<String>,
    fallback_used: bool,
    /// Real (non-placeholder) prediction not yet handed to the session
    fresh_prediction: Option<PredictionPayload>,
}

impl RequestRun {
    pub fn new(id: u64, request: AgentRequest) -> Self {
        tracing::info!(run = id, session = %request.session_id, "request submitted");
        Self {
            id,
            request,
            phase: Phase::Opening,
            render: RenderState::new(id),
            timeline: Timeline::new(),
            output: OutputRegion::new(),
            live: LiveStatus::Live { message: "Connecting to the agent".to_string() },
            started: Instant::now(),
            agent_elapsed: None,
            results: RunResults::default(),
            error: None,
            fallback_used: false,
            fresh_prediction: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> &AgentRequest {
        &self.request
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn output(&self) -> &OutputRegion {
        &self.output
    }

    pub fn live(&self) -> &LiveStatus {
        &self.live
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn results(&self) -> &RunResults {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Hand the latest real prediction to the session, at most once.
    pub fn take_fresh_prediction(&mut self) -> Option<PredictionPayload> {
        self.fresh_prediction.take()
    }

    pub fn on_stream_opened(&mut self) {
        if self.phase != Phase::Opening {
            return;
        }
        tracing::debug!(run = self.id, "stream opened");
        self.phase = Phase::Streaming;
        self.live = LiveStatus::Live { message: "Agent is working".to_string() };
    }

    /// Apply one decoded event. Events after the stream phase are ignored.
    pub fn handle_event(&mut self, event: StreamEvent) -> Flow {
        if !self.phase.accepts_events() {
            tracing::debug!(run = self.id, phase = self.phase.label(), "event ignored");
            return Flow::Continue;
        }
        if self.phase == Phase::Opening {
            self.phase = Phase::Streaming;
        }

        match event {
            StreamEvent::Status { message, elapsed } => {
                if elapsed.is_some() {
                    self.agent_elapsed = elapsed;
                }
                self.set_live_message(message);
            }
            StreamEvent::Thinking { message } => {
                self.timeline.on_thinking(&message);
                self.set_live_message(message);
            }
            StreamEvent::ToolStart { tool, input } => {
                self.timeline.on_tool_start(&tool, &input);
                if let Some(spec) = catalog::tool(&tool) {
                    self.set_live_message(format!("{}…", spec.title));
                }
            }
            StreamEvent::ToolEnd { tool, result } => {
                self.timeline.on_tool_end(&tool, &result);
            }
            StreamEvent::PredictionResult { data } => {
                self.timeline.on_result(ResultKind::Prediction);
                self.show_prediction(data);
            }
            StreamEvent::ImportanceResult { data } => {
                self.timeline.on_result(ResultKind::Importance);
                self.show_importance(data);
            }
            StreamEvent::RetrievalResult { data } => {
                self.timeline.on_result(ResultKind::Retrieval);
                self.show_retrieval(data);
            }
            StreamEvent::Narrative { data } => {
                self.timeline.on_narrative();
                if !data.answer.trim().is_empty() {
                    self.output.set_narrative(render::retrieval::render_narrative(&data));
                }
            }
            StreamEvent::Done { elapsed } => {
                if elapsed.is_some() {
                    self.agent_elapsed = elapsed;
                }
                self.timeline.on_done();
                self.phase = Phase::Finalizing;
                return Flow::Finished;
            }
            StreamEvent::Error { message } => {
                tracing::warn!(run = self.id, %message, "agent reported an error");
                self.timeline.on_error(&message);
                self.live = LiveStatus::Failed { message: message.clone() };
                self.error = Some(message.clone());
                return Flow::Failed(message);
            }
        }
        Flow::Continue
    }

    /// The stream could not be opened, broke, reported an error, or ended
    /// without `done`. Falls back only if nothing was rendered yet.
    pub fn on_stream_failure(&mut self, detail: &str) -> FailureDecision {
        if self.render.any_rendered() {
            tracing::info!(run = self.id, %detail, "stream ended early, keeping rendered results");
            return FailureDecision::SoftEnd;
        }
        let intent = classify_intent(&self.request.question);
        tracing::info!(run = self.id, %detail, ?intent, "stream failed before any result, falling back");
        self.phase = Phase::FallingBack;
        self.live = LiveStatus::Removed;
        self.output.clear();
        self.timeline.hide();
        FailureDecision::Fallback(intent)
    }

    /// Close the run and derive the session summary from what was rendered.
    pub fn finalize(&mut self) -> Option<SessionSummary> {
        if self.phase == Phase::Closed {
            return None;
        }
        if !self.timeline.is_halted() {
            self.timeline.on_done();
        }
        if !matches!(self.live, LiveStatus::Failed { .. }) {
            let elapsed_secs = self.agent_elapsed.unwrap_or_else(|| self.started.elapsed().as_secs_f64());
            self.live = LiveStatus::Completed { elapsed_secs };
        }
        self.phase = Phase::Closed;
        tracing::info!(run = self.id, rendered = self.render.any_rendered(), "request closed");
        self.summary()
    }

    /// Render the direct pipeline's results into the (cleared) output region.
    pub fn apply_fallback(&mut self, outcome: FallbackOutcome) -> Option<SessionSummary> {
        self.fallback_used = true;
        self.phase = Phase::Closed;
        self.live = LiveStatus::Removed;

        if outcome.total_failure {
            tracing::warn!(run = self.id, failures = ?outcome.failures, "fallback failed entirely");
            self.output.push(Fragment::Notice(Notice { level: NoticeLevel::Apology, text: outcome.apology() }));
            return None;
        }

        self.output.push(Fragment::Notice(Notice {
            level: NoticeLevel::Info,
            text: "The agent was unavailable, showing direct analysis results.".to_string(),
        }));
        if let Some(data) = outcome.prediction {
            self.show_prediction(data);
        }
        if let Some(data) = outcome.importance {
            self.show_importance(data);
        }
        if let Some(data) = outcome.retrieval {
            self.show_retrieval(data);
        }
        self.summary()
    }

    fn set_live_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !message.is_empty() && self.live.is_live() {
            self.live = LiveStatus::Live { message };
        }
    }

    fn show_prediction(&mut self, data: PredictionPayload) {
        if !self.render.should_render(ResultKind::Prediction) {
            tracing::debug!(run = self.id, "duplicate prediction result ignored");
            return;
        }
        self.output.push(Fragment::Prediction(prediction::render(&data)));
        if !data.synthetic {
            self.fresh_prediction = Some(data.clone());
        }
        self.results.prediction = Some(data);
    }

    fn show_importance(&mut self, data: ImportancePayload) {
        if !self.render.should_render(ResultKind::Importance) {
            tracing::debug!(run = self.id, "duplicate importance result ignored");
            return;
        }
        self.output.push(Fragment::Importance(importance::render(&data)));
        let cards = equipment::render(&data);
        if !cards.is_empty() {
            self.output.push(Fragment::Equipment(cards));
        }
        self.results.importance = Some(data);
    }

    fn show_retrieval(&mut self, data: RetrievalPayload) {
        if !self.render.should_render(ResultKind::Retrieval) {
            tracing::debug!(run = self.id, "duplicate retrieval result ignored");
            return;
        }
        self.output.push(Fragment::Retrieval(render::retrieval::render(&data)));
        self.results.retrieval = Some(data);
    }

    fn summary(&self) -> Option<SessionSummary> {
        render::summary::derive(
            self.results.prediction.as_ref(),
            self.results.importance.as_ref(),
            self.results.retrieval.as_ref(),
        )
    }
}
