use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::event;
use ratatui::prelude::*;

use dc_base::constants::{EVENT_POLL_MS, INGEST_POLL_SECS, RENDER_THROTTLE_MS};

use crate::app::actions::{Action, ActionResult, apply_action};
use crate::app::events::handle_event;
use crate::infra::api::{AgentTransport, SubServices};
use crate::infra::ingest::{IngestControl, IngestUpdate, JobWatcher, spawn_latest, spawn_start};
use crate::infra::session::SessionStore;
use crate::orchestrator::worker::{CancelHandle, StreamMessage, spawn_fallback, spawn_stream};
use crate::orchestrator::{FailureDecision, Flow};
use crate::render::SessionSummary;
use crate::state::State;
use crate::ui;

/// Spinner advance interval while a request is live
const SPINNER_MS: u64 = 120;

/// Network seams the app talks through.
pub struct Backends {
    pub transport: Arc<dyn AgentTransport>,
    pub services: Arc<dyn SubServices>,
    pub ingest: Arc<dyn IngestControl>,
}

pub struct App {
    pub state: State,
    backends: Backends,
    sessions: SessionStore,
    stream_tx: Sender<StreamMessage>,
    stream_rx: Receiver<StreamMessage>,
    ingest_tx: Sender<IngestUpdate>,
    ingest_rx: Receiver<IngestUpdate>,
    /// Reader of the in-flight stream, cancelled once the run no longer needs it
    cancel: Option<CancelHandle>,
    job_watcher: Option<JobWatcher>,
    started: Instant,
    last_render_ms: u64,
    last_spinner_ms: u64,
}

/// Outcome of applying one worker message to its run.
enum Step {
    Nothing,
    Closed(Option<SessionSummary>),
    Fallback(FailureDecision),
}

impl App {
    pub fn new(state: State, backends: Backends, sessions: SessionStore) -> Self {
        let (stream_tx, stream_rx) = mpsc::channel();
        let (ingest_tx, ingest_rx) = mpsc::channel();
        Self {
            state,
            backends,
            sessions,
            stream_tx,
            stream_rx,
            ingest_tx,
            ingest_rx,
            cancel: None,
            job_watcher: None,
            started: Instant::now(),
            last_render_ms: 0,
            last_spinner_ms: 0,
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        // Pick up a job that was still running when we last exited
        spawn_latest(Arc::clone(&self.backends.ingest), self.ingest_tx.clone());

        loop {
            let current_ms = self.now_ms();

            // === INPUT FIRST: Process user input with minimal latency ===
            if event::poll(Duration::ZERO)? {
                let evt = event::read()?;
                let Some(action) = handle_event(&evt, &self.state) else {
                    break;
                };
                self.handle_action(action);

                // Render immediately after input for instant feedback
                if self.state.dirty {
                    terminal.draw(|frame| ui::render(frame, &mut self.state))?;
                    self.state.dirty = false;
                    self.last_render_ms = current_ms;
                }
            }

            // === BACKGROUND PROCESSING ===
            self.process_stream_messages();
            self.process_ingest_updates();
            self.update_spinner(current_ms);

            if self.state.dirty && current_ms.saturating_sub(self.last_render_ms) >= RENDER_THROTTLE_MS {
                terminal.draw(|frame| ui::render(frame, &mut self.state))?;
                self.state.dirty = false;
                self.last_render_ms = current_ms;
            }

            // Adaptive poll: shorter while a request is in flight
            let poll_ms = if self.state.is_busy() || self.state.dirty { EVENT_POLL_MS } else { 50 };
            let _ = event::poll(Duration::from_millis(poll_ms))?;
        }

        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        Ok(())
    }

    pub fn handle_action(&mut self, action: Action) {
        match apply_action(&mut self.state, action) {
            ActionResult::Nothing => {}
            ActionResult::Submit(run_id) => self.start_stream(run_id),
            ActionResult::NewConversation => self.new_conversation(),
            ActionResult::StartIngestion => {
                if self.job_watcher.is_some() {
                    self.state.status_message = Some("An ingestion job is already running".to_string());
                } else {
                    self.state.status_message = Some("Starting knowledge base ingestion".to_string());
                    spawn_start(Arc::clone(&self.backends.ingest), self.ingest_tx.clone());
                }
            }
        }
    }

    fn start_stream(&mut self, run_id: u64) {
        let Some(request) = self.state.run_mut(run_id).map(|run| run.request().clone()) else {
            return;
        };
        let handle = spawn_stream(Arc::clone(&self.backends.transport), run_id, request, self.stream_tx.clone());
        self.cancel = Some(handle);
    }

    fn new_conversation(&mut self) {
        match self.sessions.regenerate() {
            Ok(session_id) => {
                tracing::info!(%session_id, "new conversation");
                self.state.new_conversation(session_id);
            }
            Err(e) => {
                tracing::error!(error = %e, "could not persist new session id");
                self.state.status_message = Some(format!("Could not start a new session: {}", e));
            }
        }
    }

    fn process_stream_messages(&mut self) {
        while let Ok(msg) = self.stream_rx.try_recv() {
            self.state.dirty = true;
            self.apply_stream_message(msg);
        }
    }

    fn apply_stream_message(&mut self, msg: StreamMessage) {
        let run_id = msg.run_id();
        let Some(run) = self.state.run_mut(run_id) else {
            // Conversation was reset while the worker was still running
            tracing::debug!(run = run_id, "message for a discarded run");
            return;
        };

        let step = match msg {
            StreamMessage::Opened { .. } => {
                run.on_stream_opened();
                Step::Nothing
            }
            StreamMessage::Event { event, .. } => match run.handle_event(event) {
                Flow::Continue => Step::Nothing,
                Flow::Finished => Step::Closed(run.finalize()),
                Flow::Failed(message) => Step::Fallback(run.on_stream_failure(&message)),
            },
            StreamMessage::Failed { error, .. } if run.phase().accepts_events() => {
                Step::Fallback(run.on_stream_failure(&error))
            }
            StreamMessage::Closed { .. } if run.phase().accepts_events() => {
                Step::Fallback(run.on_stream_failure("stream closed before completion"))
            }
            StreamMessage::Failed { .. } | StreamMessage::Closed { .. } => Step::Nothing,
            StreamMessage::Fallback { outcome, .. } => Step::Closed(run.apply_fallback(outcome)),
        };

        match step {
            Step::Nothing => {}
            Step::Closed(summary) => self.close_run(run_id, summary),
            Step::Fallback(FailureDecision::SoftEnd) => {
                let summary = self.state.run_mut(run_id).and_then(|run| run.finalize());
                self.close_run(run_id, summary);
            }
            Step::Fallback(FailureDecision::Fallback(intent)) => {
                if let Some(cancel) = self.cancel.take() {
                    cancel.cancel();
                }
                let Some(request) = self.state.run_mut(run_id).map(|run| run.request().clone()) else {
                    return;
                };
                spawn_fallback(
                    Arc::clone(&self.backends.services),
                    run_id,
                    request,
                    intent,
                    self.state.last_prediction.clone(),
                    self.stream_tx.clone(),
                );
            }
        }
        self.state.absorb_prediction(run_id);
    }

    fn close_run(&mut self, run_id: u64, summary: Option<SessionSummary>) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.state.absorb_prediction(run_id);
        self.state.set_summary(summary);
    }

    fn process_ingest_updates(&mut self) {
        while let Ok(update) = self.ingest_rx.try_recv() {
            self.state.dirty = true;
            match update {
                IngestUpdate::Job(job) => {
                    let watching = self.job_watcher.as_ref().is_some_and(|w| w.job_id() == job.job_id);
                    if job.status.is_running() && !watching {
                        self.job_watcher = Some(JobWatcher::spawn(
                            Arc::clone(&self.backends.ingest),
                            job.job_id.clone(),
                            Duration::from_secs(INGEST_POLL_SECS),
                            self.ingest_tx.clone(),
                        ));
                    } else if job.status.is_terminal() {
                        self.job_watcher = None;
                        self.state.status_message = Some(format!("Ingestion {}", job.status.label()));
                    }
                    self.state.ingest.job = Some(job);
                    self.state.ingest.error = None;
                }
                IngestUpdate::PollFailed { error, .. } | IngestUpdate::RequestFailed(error) => {
                    self.state.ingest.error = Some(error);
                }
            }
        }
    }

    fn update_spinner(&mut self, current_ms: u64) {
        if (self.state.is_busy() || self.job_watcher.is_some())
            && current_ms.saturating_sub(self.last_spinner_ms) >= SPINNER_MS
        {
            self.state.spinner_frame = self.state.spinner_frame.wrapping_add(1);
            self.last_spinner_ms = current_ms;
            self.state.dirty = true;
        }
    }
}
