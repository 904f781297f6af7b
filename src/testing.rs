//! In-memory fakes for the network seams.

use std::io::{self, Read};
use std::sync::Mutex;

use dc_base::types::{AgentRequest, FeatureSnapshot, ImportancePayload, PredictionPayload, RetrievalPayload};

use crate::infra::api::{AgentTransport, SubServices};
use crate::infra::error::ApiError;

/// Serves a body in fixed-size chunks, optionally failing after `fail_after` bytes.
pub struct ChunkedBody {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    fail_after: Option<usize>,
}

impl Read for ChunkedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(limit) = self.fail_after
            && self.pos >= limit
        {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
        }
        let mut end = (self.pos + self.chunk).min(self.data.len());
        if let Some(limit) = self.fail_after {
            end = end.min(limit);
        }
        let n = (end - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

pub enum TransportScript {
    Body { data: String, chunk: usize, fail_after: Option<usize> },
    Refuse(ApiError),
}

pub struct FakeTransport {
    script: Mutex<Option<TransportScript>>,
    pub requests: Mutex<Vec<AgentRequest>>,
}

impl FakeTransport {
    pub fn body(events: &[&str]) -> Self {
        Self::with(TransportScript::Body { data: sse(events), chunk: 11, fail_after: None })
    }

    /// Stream that resets after delivering `events`.
    pub fn broken(events: &[&str]) -> Self {
        let data = sse(events);
        let len = data.len();
        Self::with(TransportScript::Body { data, chunk: 11, fail_after: Some(len) })
    }

    pub fn refuse(status: u16) -> Self {
        Self::with(TransportScript::Refuse(ApiError::Status { status, body: "unavailable".into() }))
    }

    fn with(script: TransportScript) -> Self {
        Self { script: Mutex::new(Some(script)), requests: Mutex::new(Vec::new()) }
    }
}

/// `data: ` framing with blank-line separators, like the agent sends.
pub fn sse(events: &[&str]) -> String {
    events.iter().map(|e| format!("data: {}\n\n", e)).collect()
}

impl AgentTransport for FakeTransport {
    fn open_stream(&self, request: &AgentRequest) -> Result<Box<dyn Read + Send>, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().take() {
            Some(TransportScript::Body { data, chunk, fail_after }) => {
                Ok(Box::new(ChunkedBody { data: data.into_bytes(), pos: 0, chunk, fail_after }))
            }
            Some(TransportScript::Refuse(e)) => Err(e),
            None => Err(ApiError::Network("stream already consumed".into())),
        }
    }
}

pub struct FakeServices {
    pub prediction: Result<PredictionPayload, String>,
    pub importance: Result<ImportancePayload, String>,
    pub retrieval: Result<RetrievalPayload, String>,
    pub calls: Mutex<Vec<String>>,
    pub retrieve_context: Mutex<Option<PredictionPayload>>,
    pub explain_latent: Mutex<Vec<f64>>,
}

impl FakeServices {
    pub fn healthy() -> Self {
        Self {
            prediction: Ok(serde_json::from_str(
                r#"{"prediction":{"class":"defect","probability":0.82},"latent_features":[0.5,-0.2]}"#,
            )
            .unwrap()),
            importance: Ok(ImportancePayload {
                top_features: vec![("Process_Pressure".into(), 0.3), ("Sensor_Flow".into(), 0.2)],
                synthetic: false,
            }),
            retrieval: Ok(RetrievalPayload { answer: "Keep pressure at **140-160**.".into(), ..Default::default() }),
            calls: Mutex::new(Vec::new()),
            retrieve_context: Mutex::new(None),
            explain_latent: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            prediction: Err("connection refused".into()),
            importance: Err("connection refused".into()),
            retrieval: Err("connection refused".into()),
            ..Self::healthy()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SubServices for FakeServices {
    fn predict(&self, _features: &FeatureSnapshot) -> Result<PredictionPayload, ApiError> {
        self.calls.lock().unwrap().push("predict".into());
        self.prediction.clone().map_err(ApiError::Network)
    }

    fn explain(
        &self,
        _features: &FeatureSnapshot,
        latent_features: &[f64],
        _top_n: usize,
    ) -> Result<ImportancePayload, ApiError> {
        self.calls.lock().unwrap().push("explain".into());
        *self.explain_latent.lock().unwrap() = latent_features.to_vec();
        self.importance.clone().map_err(ApiError::Network)
    }

    fn retrieve(&self, _query: &str, last_prediction: Option<&PredictionPayload>) -> Result<RetrievalPayload, ApiError> {
        self.calls.lock().unwrap().push("retrieve".into());
        *self.retrieve_context.lock().unwrap() = last_prediction.cloned();
        self.retrieval.clone().map_err(ApiError::Network)
    }
}

pub fn request(question: &str) -> AgentRequest {
    AgentRequest::new(question, FeatureSnapshot::baseline(), "session_test")
}
