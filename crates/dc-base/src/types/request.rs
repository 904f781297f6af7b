use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CATALOG;

/// Numeric process/sensor parameters keyed by catalog feature id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSnapshot(BTreeMap<String, f64>);

impl FeatureSnapshot {
    /// The canonical sample baseline for every catalog feature.
    pub fn baseline() -> Self {
        Self(CATALOG.features.iter().map(|f| (f.id.clone(), f.baseline)).collect())
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn set(&mut self, id: &str, value: f64) {
        self.0.insert(id.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Fill every catalog feature missing from this snapshot with its baseline value.
    pub fn completed(mut self) -> Self {
        for feature in &CATALOG.features {
            self.0.entry(feature.id.clone()).or_insert(feature.baseline);
        }
        self
    }
}

impl FromIterator<(String, f64)> for FeatureSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One user submission. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub question: String,
    pub features: FeatureSnapshot,
    pub session_id: String,
}

impl AgentRequest {
    pub fn new(question: impl Into<String>, features: FeatureSnapshot, session_id: impl Into<String>) -> Self {
        Self { question: question.into(), features: features.completed(), session_id: session_id.into() }
    }
}
