//! HTTP seams: the streaming agent endpoint and the directly callable
//! sub-services used by the fallback pipeline.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Value, json};

use dc_base::constants::{CHAT_PATH, EXPLAIN_PATH, PREDICT_PATH, RETRIEVE_PATH, SERVICE_TIMEOUT_SECS};
use dc_base::types::{AgentRequest, FeatureSnapshot, ImportancePayload, PredictionPayload, RetrievalPayload};

use super::error::ApiError;
use super::settings::Settings;

/// Opens the agent's event stream for one request.
pub trait AgentTransport: Send + Sync {
    /// Returns the raw response body once a success status was received.
    fn open_stream(&self, request: &AgentRequest) -> Result<Box<dyn Read + Send>, ApiError>;
}

/// Direct, non-streaming calls to the three sub-services.
pub trait SubServices: Send + Sync {
    fn predict(&self, features: &FeatureSnapshot) -> Result<PredictionPayload, ApiError>;

    fn explain(
        &self,
        features: &FeatureSnapshot,
        latent_features: &[f64],
        top_n: usize,
    ) -> Result<ImportancePayload, ApiError>;

    fn retrieve(&self, query: &str, last_prediction: Option<&PredictionPayload>) -> Result<RetrievalPayload, ApiError>;
}

/// reqwest-backed client for the agent backend and the sub-services.
pub struct HttpAgentClient {
    settings: Settings,
    /// No timeout: a stalled stream only blocks its own request.
    stream_client: Client,
    service_client: Client,
}

impl HttpAgentClient {
    pub fn new(settings: Settings) -> Result<Self, ApiError> {
        let stream_client = Client::builder().timeout(None::<Duration>).build()?;
        let service_client = service_client()?;
        Ok(Self { settings, stream_client, service_client })
    }
}

/// Client used for the short request/response calls.
pub fn service_client() -> Result<Client, ApiError> {
    Ok(Client::builder().timeout(Duration::from_secs(SERVICE_TIMEOUT_SECS)).build()?)
}

impl AgentTransport for HttpAgentClient {
    fn open_stream(&self, request: &AgentRequest) -> Result<Box<dyn Read + Send>, ApiError> {
        let url = self.settings.backend_endpoint(CHAT_PATH);
        tracing::debug!(%url, session = %request.session_id, "opening agent stream");
        let response = self
            .stream_client
            .post(&url)
            .header("accept", "text/event-stream")
            .header("content-type", "application/json")
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok(Box::new(response))
    }
}

impl SubServices for HttpAgentClient {
    fn predict(&self, features: &FeatureSnapshot) -> Result<PredictionPayload, ApiError> {
        let url = self.settings.service_endpoint(PREDICT_PATH);
        let value = post_json(&self.service_client, &url, &json!({ "features": features }))?;
        Ok(serde_json::from_value(value)?)
    }

    fn explain(
        &self,
        features: &FeatureSnapshot,
        latent_features: &[f64],
        top_n: usize,
    ) -> Result<ImportancePayload, ApiError> {
        let url = self.settings.service_endpoint(EXPLAIN_PATH);
        let body = json!({
            "features": features,
            "latent_features": latent_features,
            "top_n": top_n,
            "generate_chart": false,
        });
        let value = post_json(&self.service_client, &url, &body)?;
        Ok(serde_json::from_value(value)?)
    }

    fn retrieve(&self, query: &str, last_prediction: Option<&PredictionPayload>) -> Result<RetrievalPayload, ApiError> {
        let url = self.settings.service_endpoint(RETRIEVE_PATH);
        let mut body = json!({ "query": query });
        if let Some(prediction) = last_prediction {
            body["context"] = json!({ "last_prediction": prediction });
        }
        let value = post_json(&self.service_client, &url, &body)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// POST a JSON body and return the unwrapped JSON result.
pub fn post_json<B: Serialize + ?Sized>(client: &Client, url: &str, body: &B) -> Result<Value, ApiError> {
    let response = client.post(url).header("content-type", "application/json").json(body).send()?;
    let status = response.status();
    let text = response.text().map_err(|e| ApiError::StreamRead(e.to_string()))?;
    if !status.is_success() {
        return Err(ApiError::Status { status: status.as_u16(), body: text });
    }
    let value: Value = serde_json::from_str(&text)?;
    unwrap_envelope(value)
}

/// Sub-services may wrap their result in `{ "body": <object | json string> }`.
/// A truthy `error` field marks a service-reported failure.
pub fn unwrap_envelope(value: Value) -> Result<Value, ApiError> {
    let inner = match value.get("body") {
        Some(Value::String(s)) => serde_json::from_str(s)?,
        Some(obj @ Value::Object(_)) => obj.clone(),
        _ => value,
    };

    match inner.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(inner),
        Some(err) => {
            let detail = inner
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| err.as_str().map(str::to_string))
                .unwrap_or_else(|| err.to_string());
            Err(ApiError::Service(detail))
        }
    }
}
