use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::{ImportancePayload, NarrativePayload, PredictionPayload, RetrievalPayload};

/// One decoded record from the agent's event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Status {
        #[serde(default)]
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elapsed: Option<f64>,
    },
    Thinking {
        #[serde(default)]
        message: String,
    },
    ToolStart {
        tool: String,
        #[serde(default)]
        input: Value,
    },
    ToolEnd {
        tool: String,
        #[serde(default)]
        result: Value,
    },
    #[serde(alias = "t1_result")]
    PredictionResult { data: PredictionPayload },
    #[serde(alias = "t2_result")]
    ImportanceResult { data: ImportancePayload },
    #[serde(alias = "t3_result")]
    RetrievalResult { data: RetrievalPayload },
    #[serde(alias = "ai_response")]
    Narrative {
        #[serde(default)]
        data: NarrativePayload,
    },
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elapsed: Option<f64>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

/// Result kinds gated by the per-request render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Prediction,
    Importance,
    Retrieval,
}

impl ResultKind {
    /// Tool whose completion produces this result.
    pub fn tool_name(self) -> &'static str {
        match self {
            ResultKind::Prediction => "predict_quality",
            ResultKind::Importance => "analyze_feature_importance",
            ResultKind::Retrieval => "search_knowledge_base",
        }
    }
}

impl StreamEvent {
    pub fn result_kind(&self) -> Option<ResultKind> {
        match self {
            StreamEvent::PredictionResult { .. } => Some(ResultKind::Prediction),
            StreamEvent::ImportanceResult { .. } => Some(ResultKind::Importance),
            StreamEvent::RetrievalResult { .. } => Some(ResultKind::Retrieval),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }

    /// Elapsed seconds reported by the agent, when the record carries one.
    pub fn elapsed(&self) -> Option<f64> {
        match self {
            StreamEvent::Status { elapsed, .. } | StreamEvent::Done { elapsed } => *elapsed,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> StreamEvent {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn legacy_tags_decode_as_result_kinds() {
        let ev = parse(r#"{"type":"t1_result","data":{"prediction":{"class":"defect","probability":0.82}}}"#);
        assert_eq!(ev.result_kind(), Some(ResultKind::Prediction));

        let ev = parse(r#"{"type":"t2_result","data":{"top_features":[["Sensor_Flow",0.4]]}}"#);
        assert_eq!(ev.result_kind(), Some(ResultKind::Importance));

        let ev = parse(r#"{"type":"t3_result","data":{"answer":"ok","sources":[]}}"#);
        assert_eq!(ev.result_kind(), Some(ResultKind::Retrieval));

        let ev = parse(r#"{"type":"ai_response","data":{"answer":"**hi**"}}"#);
        assert!(matches!(ev, StreamEvent::Narrative { ref data } if data.answer == "**hi**"));
    }

    #[test]
    fn tool_events_keep_raw_input_and_output() {
        let ev = parse(r#"{"type":"tool_start","tool":"search_knowledge_base","input":{"query":"flash"}}"#);
        match ev {
            StreamEvent::ToolStart { tool, input } => {
                assert_eq!(tool, "search_knowledge_base");
                assert_eq!(input["query"], "flash");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn done_and_error_are_terminal() {
        assert!(parse(r#"{"type":"done","elapsed":3.2}"#).is_terminal());
        assert!(parse(r#"{"type":"error"}"#).is_terminal());
        assert!(!parse(r#"{"type":"status","message":"x"}"#).is_terminal());
        assert_eq!(parse(r#"{"type":"done","elapsed":3.2}"#).elapsed(), Some(3.2));
    }
}
