//! Lookups over the embedded domain catalog.

use crate::config::{CATALOG, EquipmentSpec, IntentRule, SensorSpec, ToolSpec};

/// Feature ids in canonical snapshot order.
pub fn feature_ids() -> Vec<String> {
    CATALOG.features.iter().map(|f| f.id.clone()).collect()
}

/// Human-readable label for a feature, or the id itself when unknown.
pub fn feature_label(id: &str) -> &str {
    CATALOG.features.iter().find(|f| f.id == id).map(|f| f.label.as_str()).unwrap_or(id)
}

pub fn baseline(id: &str) -> Option<f64> {
    CATALOG.features.iter().find(|f| f.id == id).map(|f| f.baseline)
}

pub fn equipment_key_for(feature_id: &str) -> Option<&'static str> {
    CATALOG.feature_equipment.get(feature_id).map(|s| s.as_str())
}

pub fn equipment(key: &str) -> Option<&'static EquipmentSpec> {
    CATALOG.equipment.get(key)
}

pub fn sensor(feature_id: &str) -> Option<&'static SensorSpec> {
    CATALOG.sensors.get(feature_id)
}

/// Recognized tool by agent tool name.
pub fn tool(name: &str) -> Option<&'static ToolSpec> {
    CATALOG.tools.iter().find(|t| t.name == name)
}

/// Recognized tool by timeline stage id.
pub fn tool_for_stage(stage: &str) -> Option<&'static ToolSpec> {
    CATALOG.tools.iter().find(|t| t.stage == stage)
}

pub fn intent_rules() -> &'static [IntentRule] {
    &CATALOG.intents
}

pub fn sample_questions() -> &'static [String] {
    &CATALOG.sample_questions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fall_back_to_id() {
        assert_eq!(feature_label("Process_Pressure"), "Injection pressure");
        assert_eq!(feature_label("Mystery"), "Mystery");
    }

    #[test]
    fn tools_resolve_by_name_and_stage() {
        assert_eq!(tool("predict_quality").map(|t| t.stage.as_str()), Some("predict"));
        assert_eq!(tool_for_stage("search").map(|t| t.name.as_str()), Some("search_knowledge_base"));
        assert!(tool("rm_rf").is_none());
    }

    #[test]
    fn sensors_only_cover_sensor_features() {
        assert!(sensor("Sensor_Flow").is_some());
        assert!(sensor("Process_Pressure").is_none());
    }
}
