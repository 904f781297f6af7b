use std::f64::consts::PI;

use dc_base::constants::GAUGE_RADIUS;
use dc_base::types::{PredictionPayload, QualityClass};

use super::fragment::PredictionView;

pub fn class_label(class: QualityClass) -> &'static str {
    match class {
        QualityClass::Defect => "Defect",
        QualityClass::Normal => "Normal",
    }
}

/// Percentage with one decimal place, from a 0..=1 fraction.
pub fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub fn render(payload: &PredictionPayload) -> PredictionView {
    let prediction = &payload.prediction;
    let probs = prediction.class_probabilities();
    let fraction = prediction.predicted_probability().clamp(0.0, 1.0);

    let circumference = 2.0 * PI * GAUGE_RADIUS;
    let arc_length = fraction * circumference;

    PredictionView {
        class: prediction.class,
        class_label: class_label(prediction.class),
        fraction,
        defect_percent: percent(probs.defect),
        normal_percent: percent(probs.normal),
        gauge_percent: percent(fraction),
        circumference,
        arc_length,
        dash_offset: circumference - arc_length,
        confidence: prediction.confidence.clone(),
        model_version: payload.model_version.clone(),
        synthetic: payload.synthetic,
    }
}
