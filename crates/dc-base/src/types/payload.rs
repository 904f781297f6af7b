use serde::{Deserialize, Serialize};

/// Binary quality label produced by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityClass {
    Defect,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub normal: f64,
    pub defect: f64,
}

/// Classification result. `probability` is the probability of `class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class: QualityClass,
    pub probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_probabilities: Option<ClassProbabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_percent: Option<String>,
}

impl Prediction {
    /// Per-class probabilities, derived as a two-class complement when the
    /// service did not send them.
    pub fn class_probabilities(&self) -> ClassProbabilities {
        if let Some(probs) = self.class_probabilities {
            return probs;
        }
        match self.class {
            QualityClass::Defect => ClassProbabilities { normal: 1.0 - self.probability, defect: self.probability },
            QualityClass::Normal => ClassProbabilities { normal: self.probability, defect: 1.0 - self.probability },
        }
    }

    /// Probability of the predicted class.
    pub fn predicted_probability(&self) -> f64 {
        let probs = self.class_probabilities();
        match self.class {
            QualityClass::Defect => probs.defect,
            QualityClass::Normal => probs.normal,
        }
    }
}

/// Prediction result together with the intermediate (latent) features the
/// explanation service consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPredictionPayload")]
pub struct PredictionPayload {
    pub prediction: Prediction,
    #[serde(default)]
    pub latent_features: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
    /// Set on locally substituted placeholder results.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

/// The service sends either `{prediction: {...}, latent_features: [...]}` or
/// the bare prediction object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPredictionPayload {
    Wrapped {
        prediction: Prediction,
        #[serde(default)]
        latent_features: Vec<f64>,
        #[serde(default)]
        model_version: Option<String>,
        #[serde(default)]
        processing_time_ms: Option<f64>,
        #[serde(default)]
        synthetic: bool,
    },
    Bare(Prediction),
}

impl From<RawPredictionPayload> for PredictionPayload {
    fn from(raw: RawPredictionPayload) -> Self {
        match raw {
            RawPredictionPayload::Wrapped { prediction, latent_features, model_version, processing_time_ms, synthetic } => {
                Self { prediction, latent_features, model_version, processing_time_ms, synthetic }
            }
            RawPredictionPayload::Bare(prediction) => Self {
                prediction,
                latent_features: Vec::new(),
                model_version: None,
                processing_time_ms: None,
                synthetic: false,
            },
        }
    }
}

impl PredictionPayload {
    /// Neutral stand-in used when the prediction service cannot be reached.
    pub fn placeholder() -> Self {
        Self {
            prediction: Prediction {
                class: QualityClass::Normal,
                probability: 0.5,
                class_probabilities: None,
                confidence: Some("unavailable".to_string()),
                probability_percent: None,
            },
            latent_features: Vec::new(),
            model_version: Some("placeholder".to_string()),
            processing_time_ms: None,
            synthetic: true,
        }
    }
}

/// Ranked `(feature id, score)` pairs, highest score first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportancePayload {
    #[serde(default)]
    pub top_features: Vec<(String, f64)>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl ImportancePayload {
    /// Deterministic stand-in: the leading catalog features with evenly
    /// decreasing scores.
    pub fn placeholder(feature_ids: &[String], top_n: usize) -> Self {
        let top_features =
            feature_ids.iter().take(top_n).enumerate().map(|(i, id)| (id.clone(), 0.15 - i as f64 * 0.012)).collect();
        Self { top_features, synthetic: true }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "type", alias = "source_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(alias = "content_preview", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SourceDoc {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().or(self.uri.as_deref()).unwrap_or("Document")
    }

    pub fn display_kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("Knowledge Base")
    }
}

/// Narrative answer plus the documents it was grounded on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalPayload {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceDoc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl RetrievalPayload {
    pub fn placeholder(detail: &str) -> Self {
        Self {
            answer: format!("Sorry, the knowledge base could not be reached ({}).", detail),
            sources: Vec::new(),
            synthetic: true,
        }
    }
}

/// Final synthesized answer text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NarrativePayload {
    #[serde(default)]
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_complement_when_breakdown_missing() {
        let p: Prediction = serde_json::from_str(r#"{"class":"defect","probability":0.82}"#).unwrap();
        let probs = p.class_probabilities();
        assert!((probs.defect - 0.82).abs() < 1e-9);
        assert!((probs.normal - 0.18).abs() < 1e-9);
        assert!((p.predicted_probability() - 0.82).abs() < 1e-9);
    }

    #[test]
    fn normal_class_probability_is_the_normal_share() {
        let p: Prediction = serde_json::from_str(r#"{"class":"normal","probability":0.7}"#).unwrap();
        assert!((p.class_probabilities().defect - 0.3).abs() < 1e-9);
        assert!((p.predicted_probability() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn explicit_breakdown_wins() {
        let p: Prediction = serde_json::from_str(
            r#"{"class":"defect","probability":0.6,"class_probabilities":{"normal":0.25,"defect":0.75}}"#,
        )
        .unwrap();
        assert!((p.predicted_probability() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn payload_accepts_wrapped_and_bare_forms() {
        let wrapped: PredictionPayload = serde_json::from_str(
            r#"{"prediction":{"class":"normal","probability":0.9},"latent_features":[0.1,0.2]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.latent_features.len(), 2);

        let bare: PredictionPayload = serde_json::from_str(r#"{"class":"defect","probability":0.8}"#).unwrap();
        assert_eq!(bare.prediction.class, QualityClass::Defect);
        assert!(bare.latent_features.is_empty());
    }

    #[test]
    fn importance_reads_pairs() {
        let imp: ImportancePayload =
            serde_json::from_str(r#"{"top_features":[["Process_Pressure",0.3],["Sensor_Flow",0.1]]}"#).unwrap();
        assert_eq!(imp.top_features[0], ("Process_Pressure".to_string(), 0.3));
    }

    #[test]
    fn source_display_fallbacks() {
        let doc = SourceDoc { uri: Some("s3://kb/guide.pdf".into()), ..Default::default() };
        assert_eq!(doc.display_title(), "s3://kb/guide.pdf");
        assert_eq!(doc.display_kind(), "Knowledge Base");
        assert_eq!(SourceDoc::default().display_title(), "Document");
    }

    #[test]
    fn retrieval_service_source_fields_are_read() {
        let payload: RetrievalPayload = serde_json::from_str(
            r#"{"answer":"ok","sources":[{"title":"a.pdf","uri":"s3://kb/a.pdf","content_preview":"Reflow temp 650","source_type":"S3"}]}"#,
        )
        .unwrap();
        let doc = &payload.sources[0];
        assert_eq!(doc.content.as_deref(), Some("Reflow temp 650"));
        assert_eq!(doc.display_kind(), "S3");
    }
}
