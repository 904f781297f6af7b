//! Session-level insight summary derived when a request finishes.

use dc_base::catalog;
use dc_base::constants::{SOURCE_SNIPPET_CHARS, SUMMARY_FACTORS, SUMMARY_SOURCES};
use dc_base::types::{ImportancePayload, PredictionPayload, QualityClass, RetrievalPayload};

use super::importance::relative_width;
use super::prediction::{class_label, percent};

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSummary {
    pub class: QualityClass,
    pub label: &'static str,
    pub probability: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorSummary {
    pub feature: String,
    pub label: String,
    /// Relative to the top factor, 0..=100
    pub relative_percent: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorNote {
    pub feature: String,
    pub name: String,
    pub unit: String,
    pub range: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSummary {
    pub prediction: Option<PredictionSummary>,
    pub factors: Vec<FactorSummary>,
    pub sensors: Vec<SensorNote>,
    pub sources: Vec<SourceSummary>,
    /// Total sources returned, including those not listed
    pub source_count: usize,
}

impl SessionSummary {
    pub fn is_empty(&self) -> bool {
        self.prediction.is_none() && self.factors.is_empty() && self.sources.is_empty()
    }
}

/// Build the summary from whatever results the request produced.
/// Returns `None` when there is nothing to show.
pub fn derive(
    prediction: Option<&PredictionPayload>,
    importance: Option<&ImportancePayload>,
    retrieval: Option<&RetrievalPayload>,
) -> Option<SessionSummary> {
    let mut summary = SessionSummary::default();

    if let Some(payload) = prediction {
        let p = &payload.prediction;
        summary.prediction = Some(PredictionSummary {
            class: p.class,
            label: class_label(p.class),
            probability: p.probability_percent.clone().unwrap_or_else(|| percent(p.predicted_probability())),
        });
    }

    if let Some(payload) = importance {
        let top: Vec<&(String, f64)> = payload.top_features.iter().take(SUMMARY_FACTORS).collect();
        let max = top.first().map(|(_, score)| *score).unwrap_or(0.0);
        summary.factors = top
            .iter()
            .map(|(feature, score)| FactorSummary {
                feature: feature.clone(),
                label: catalog::feature_label(feature).to_string(),
                relative_percent: relative_width(*score, max),
            })
            .collect();
        summary.sensors = top
            .iter()
            .filter_map(|(feature, _)| {
                catalog::sensor(feature).map(|s| SensorNote {
                    feature: feature.clone(),
                    name: s.name.clone(),
                    unit: s.unit.clone(),
                    range: s.range.clone(),
                })
            })
            .collect();
    }

    if let Some(payload) = retrieval {
        summary.source_count = payload.sources.len();
        summary.sources = payload
            .sources
            .iter()
            .take(SUMMARY_SOURCES)
            .map(|doc| SourceSummary {
                title: doc.display_title().to_string(),
                snippet: snippet(doc.content.as_deref().unwrap_or_default()),
            })
            .collect();
    }

    if summary.is_empty() { None } else { Some(summary) }
}

fn snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SOURCE_SNIPPET_CHARS).collect();
    if chars.next().is_some() { format!("{}…", head) } else { head }
}

#[cfg(test)]
mod tests {
    use dc_base::types::SourceDoc;

    use super::*;

    #[test]
    fn empty_inputs_give_no_summary() {
        assert!(derive(None, None, None).is_none());
        assert!(derive(None, Some(&ImportancePayload::default()), None).is_none());
    }

    #[test]
    fn prediction_and_factors() {
        let prediction: PredictionPayload =
            serde_json::from_str(r#"{"class":"defect","probability":0.82}"#).unwrap();
        let importance = ImportancePayload {
            top_features: vec![
                ("Sensor_Flow".into(), 0.4),
                ("Process_Pressure".into(), 0.2),
                ("Sensor_Noise".into(), 0.1),
                ("Process_HoldTime".into(), 0.05),
                ("Process_CycleTime".into(), 0.04),
                ("Process_ShotSize".into(), 0.03),
            ],
            synthetic: false,
        };
        let summary = derive(Some(&prediction), Some(&importance), None).unwrap();
        let p = summary.prediction.unwrap();
        assert_eq!(p.label, "Defect");
        assert_eq!(p.probability, "82.0%");
        assert_eq!(summary.factors.len(), 5);
        assert_eq!(summary.factors[1].relative_percent, 50);
        let sensors: Vec<&str> = summary.sensors.iter().map(|s| s.feature.as_str()).collect();
        assert_eq!(sensors, vec!["Sensor_Flow", "Sensor_Noise"]);
        assert_eq!(summary.sensors[0].unit, "L/min");
    }

    #[test]
    fn sources_are_capped_and_snipped() {
        let long = "x".repeat(200);
        let retrieval = RetrievalPayload {
            answer: String::new(),
            sources: (0..5)
                .map(|i| SourceDoc { title: Some(format!("doc {}", i)), content: Some(long.clone()), ..Default::default() })
                .collect(),
            synthetic: false,
        };
        let summary = derive(None, None, Some(&retrieval)).unwrap();
        assert_eq!(summary.sources.len(), 3);
        assert_eq!(summary.source_count, 5);
        assert_eq!(summary.sources[0].snippet.chars().count(), 81);
    }
}
