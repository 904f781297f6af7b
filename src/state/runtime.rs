use dc_base::types::{AgentRequest, FeatureSnapshot, IngestJob, PredictionPayload};

use super::params::ParamsEditor;
use crate::orchestrator::RequestRun;
use crate::render::SessionSummary;

/// One question and the run that answers it.
pub struct Exchange {
    pub question: String,
    pub run: RequestRun,
}

/// Knowledge-base ingestion status shown in the sidebar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestView {
    pub job: Option<IngestJob>,
    /// Last start/poll failure, cleared by the next good update
    pub error: Option<String>,
}

/// Runtime state, owned by the event loop thread.
pub struct State {
    pub session_id: String,
    /// Snapshot copied into every request
    pub features: FeatureSnapshot,
    pub exchanges: Vec<Exchange>,
    /// Most recent real prediction, sent as context to retrieval
    pub last_prediction: Option<PredictionPayload>,
    /// Insight panel content from the last finished request
    pub summary: Option<SessionSummary>,
    pub next_run_id: u64,
    pub ingest: IngestView,
    pub input: String,
    /// Cursor position in input (byte index)
    pub input_cursor: usize,
    /// Lines scrolled up from the bottom of the conversation
    pub scroll_offset: u16,
    /// Maximum scroll offset (set by UI based on content height)
    pub max_scroll: u16,
    /// Open while the parameter editor overlay is shown
    pub params: Option<ParamsEditor>,
    /// One-line notice in the status bar
    pub status_message: Option<String>,
    pub spinner_frame: usize,
    pub dirty: bool,
}

impl State {
    pub fn new(session_id: String, features: FeatureSnapshot) -> Self {
        Self {
            session_id,
            features,
            exchanges: Vec::new(),
            last_prediction: None,
            summary: None,
            next_run_id: 1,
            ingest: IngestView::default(),
            input: String::new(),
            input_cursor: 0,
            scroll_offset: 0,
            max_scroll: 0,
            params: None,
            status_message: None,
            spinner_frame: 0,
            dirty: true,
        }
    }

    /// A request is in flight until its run is closed.
    pub fn is_busy(&self) -> bool {
        self.exchanges.last().is_some_and(|e| !e.run.is_closed())
    }

    /// Start a new exchange for `question`. Rejected while busy or when the
    /// question is blank.
    pub fn begin_request(&mut self, question: &str) -> Option<(u64, AgentRequest)> {
        let question = question.trim();
        if question.is_empty() || self.is_busy() {
            return None;
        }
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        let request = AgentRequest::new(question, self.features.clone(), self.session_id.clone());
        self.exchanges.push(Exchange { question: question.to_string(), run: RequestRun::new(run_id, request.clone()) });
        self.scroll_offset = 0;
        self.dirty = true;
        Some((run_id, request))
    }

    pub fn run_mut(&mut self, run_id: u64) -> Option<&mut RequestRun> {
        self.exchanges.iter_mut().map(|e| &mut e.run).find(|r| r.id() == run_id)
    }

    /// Move a run's newest real prediction into the session (last write wins).
    pub fn absorb_prediction(&mut self, run_id: u64) {
        if let Some(prediction) = self.run_mut(run_id).and_then(RequestRun::take_fresh_prediction) {
            self.last_prediction = Some(prediction);
        }
    }

    pub fn set_summary(&mut self, summary: Option<SessionSummary>) {
        if summary.is_some() {
            self.summary = summary;
        }
    }

    /// Fresh session: new id, empty transcript, no remembered results.
    pub fn new_conversation(&mut self, session_id: String) {
        self.session_id = session_id;
        self.exchanges.clear();
        self.last_prediction = None;
        self.summary = None;
        self.scroll_offset = 0;
        self.status_message = Some("Started a new conversation".to_string());
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use dc_base::types::StreamEvent;

    use super::*;

    fn state() -> State {
        State::new("session_a".into(), FeatureSnapshot::baseline())
    }

    fn prediction_event() -> StreamEvent {
        serde_json::from_str(
            r#"{"type":"prediction_result","data":{"prediction":{"class":"normal","probability":0.9}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn rejects_blank_and_concurrent_submissions() {
        let mut s = state();
        assert!(s.begin_request("   ").is_none());
        let (id, request) = s.begin_request(" defect? ").unwrap();
        assert_eq!(id, 1);
        assert_eq!(request.question, "defect?");
        assert_eq!(request.session_id, "session_a");
        assert!(s.is_busy());
        assert!(s.begin_request("again").is_none());
    }

    #[test]
    fn closed_run_frees_the_session() {
        let mut s = state();
        let (id, _) = s.begin_request("q").unwrap();
        let run = s.run_mut(id).unwrap();
        run.on_stream_opened();
        run.handle_event(prediction_event());
        run.finalize();
        s.absorb_prediction(id);
        assert!(!s.is_busy());
        assert!(s.last_prediction.is_some());
        assert_eq!(s.begin_request("next").map(|(id, _)| id), Some(2));
    }

    #[test]
    fn new_conversation_forgets_results() {
        let mut s = state();
        s.last_prediction = Some(PredictionPayload::placeholder());
        s.summary = Some(SessionSummary::default());
        s.begin_request("q");
        s.new_conversation("session_b".into());
        assert_eq!(s.session_id, "session_b");
        assert!(s.exchanges.is_empty());
        assert!(s.last_prediction.is_none());
        assert!(s.summary.is_none());
    }

    #[test]
    fn empty_summary_does_not_clear_previous() {
        let mut s = state();
        s.set_summary(Some(SessionSummary::default()));
        s.set_summary(None);
        assert!(s.summary.is_some());
    }
}
