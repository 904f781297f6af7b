//! Background threads for the network side of a request.
//!
//! Workers never touch UI state. They forward decoded events tagged with the
//! run id, and the event loop applies them to the matching `RequestRun`.

use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use dc_base::constants::STREAM_READ_CHUNK;
use dc_base::types::{AgentRequest, Intent, PredictionPayload, StreamEvent};

use crate::fallback::{self, FallbackOutcome};
use crate::infra::api::{AgentTransport, SubServices};
use crate::infra::decoder::EventDecoder;
use crate::infra::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpEnd {
    /// Body ended without the consumer asking to stop.
    Eof,
    /// Consumer returned false (terminal event or receiver gone).
    Stopped,
    Cancelled,
}

/// Read `body` to the end, feeding every decoded event to `on_event`
/// until it returns false.
pub fn pump(
    body: &mut dyn Read,
    cancel: &AtomicBool,
    mut on_event: impl FnMut(StreamEvent) -> bool,
) -> Result<PumpEnd, ApiError> {
    let mut decoder = EventDecoder::new();
    let mut buf = vec![0u8; STREAM_READ_CHUNK];
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Ok(PumpEnd::Cancelled);
        }
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ApiError::StreamRead(e.to_string())),
        };
        for event in decoder.push(&buf[..n]) {
            if !on_event(event) {
                return Ok(PumpEnd::Stopped);
            }
        }
    }
    for event in decoder.finish() {
        if !on_event(event) {
            return Ok(PumpEnd::Stopped);
        }
    }
    if decoder.malformed_count() > 0 {
        tracing::info!(skipped = decoder.malformed_count(), "stream finished with malformed records");
    }
    Ok(PumpEnd::Eof)
}

/// Messages from request workers to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Opened { run_id: u64 },
    Event { run_id: u64, event: StreamEvent },
    /// Could not open, or the body broke mid-read.
    Failed { run_id: u64, error: String },
    /// Body ended without a terminal event.
    Closed { run_id: u64 },
    Fallback { run_id: u64, outcome: FallbackOutcome },
}

impl StreamMessage {
    pub fn run_id(&self) -> u64 {
        match self {
            StreamMessage::Opened { run_id }
            | StreamMessage::Event { run_id, .. }
            | StreamMessage::Failed { run_id, .. }
            | StreamMessage::Closed { run_id }
            | StreamMessage::Fallback { run_id, .. } => *run_id,
        }
    }
}

/// Stops a stream reader at its next chunk boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

/// Open the agent stream on a background thread and forward its events.
/// The reader stops on its own after `done` or `error`.
pub fn spawn_stream(
    transport: Arc<dyn AgentTransport>,
    run_id: u64,
    request: AgentRequest,
    tx: Sender<StreamMessage>,
) -> CancelHandle {
    let handle = CancelHandle::default();
    let flag = Arc::clone(&handle.flag);
    thread::spawn(move || {
        let mut body = match transport.open_stream(&request) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(run = run_id, error = %e, "could not open agent stream");
                let _ = tx.send(StreamMessage::Failed { run_id, error: e.to_string() });
                return;
            }
        };
        if tx.send(StreamMessage::Opened { run_id }).is_err() {
            return;
        }

        let end = pump(body.as_mut(), &flag, |event| {
            let terminal = event.is_terminal();
            tx.send(StreamMessage::Event { run_id, event }).is_ok() && !terminal
        });
        match end {
            Ok(PumpEnd::Eof) => {
                let _ = tx.send(StreamMessage::Closed { run_id });
            }
            Ok(PumpEnd::Stopped | PumpEnd::Cancelled) => {}
            Err(e) => {
                tracing::warn!(run = run_id, error = %e, "agent stream broke");
                let _ = tx.send(StreamMessage::Failed { run_id, error: e.to_string() });
            }
        }
    });
    handle
}

/// Run the direct pipeline on a background thread.
pub fn spawn_fallback(
    services: Arc<dyn SubServices>,
    run_id: u64,
    request: AgentRequest,
    intent: Intent,
    last_prediction: Option<PredictionPayload>,
    tx: Sender<StreamMessage>,
) {
    thread::spawn(move || {
        let outcome = fallback::run(services.as_ref(), &request, intent, last_prediction.as_ref());
        let _ = tx.send(StreamMessage::Fallback { run_id, outcome });
    });
}
