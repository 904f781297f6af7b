use serde_json::json;

use super::*;

fn statuses(timeline: &Timeline) -> Vec<(&str, StageStatus)> {
    timeline.stages().iter().map(|s| (s.id.as_str(), s.status)).collect()
}

#[test]
fn starts_with_active_thinking() {
    let timeline = Timeline::new();
    assert_eq!(statuses(&timeline), vec![(THINKING, StageStatus::Active)]);
    assert!(!timeline.is_halted());
}

#[test]
fn full_happy_path() {
    let mut t = Timeline::new();
    t.on_thinking("Classifying the question");
    t.on_tool_start("predict_quality", &json!({"features": {"a": 1.0, "b": 2.0}}));
    assert_eq!(
        statuses(&t),
        vec![(THINKING, StageStatus::Completed), ("predict", StageStatus::Active)]
    );
    assert_eq!(t.stage("predict").unwrap().input_summary.as_deref(), Some("2 parameters sent"));

    t.on_tool_end("predict_quality", &json!({"prediction": {"class": "defect", "probability": 0.82}}));
    assert_eq!(t.stage("predict").unwrap().output_summary.as_deref(), Some("Defect probability 82.0%"));
    assert_eq!(t.stage(RESPONSE).unwrap().status, StageStatus::Pending);

    t.on_tool_start("search_knowledge_base", &json!({"query": "porosity"}));
    let ids: Vec<&str> = t.stages().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![THINKING, "predict", "search", RESPONSE]);
    assert_eq!(t.stage("search").unwrap().input_summary.as_deref(), Some("query: \"porosity\""));

    t.on_tool_end("search_knowledge_base", &json!({"sources": [{}, {}]}));
    t.on_narrative();
    assert_eq!(t.stage(RESPONSE).unwrap().status, StageStatus::Active);

    t.on_done();
    assert!(t.stages().iter().all(|s| s.status == StageStatus::Completed));
    assert!(t.is_hidden());
    assert!(t.is_halted());
}

#[test]
fn unrecognized_tools_are_ignored() {
    let mut t = Timeline::new();
    t.on_tool_start("delete_everything", &json!({}));
    t.on_tool_end("delete_everything", &json!({}));
    assert_eq!(t.stages().len(), 1);
    assert_eq!(t.stage(THINKING).unwrap().status, StageStatus::Active);
}

#[test]
fn completed_tool_is_not_reactivated() {
    let mut t = Timeline::new();
    t.on_tool_start("predict_quality", &json!({}));
    t.on_tool_end("predict_quality", &json!({}));
    t.on_tool_start("predict_quality", &json!({}));
    assert_eq!(t.stage("predict").unwrap().status, StageStatus::Completed);
    assert_eq!(t.stages().iter().filter(|s| s.id == "predict").count(), 1);
}

#[test]
fn error_marks_active_stage_and_halts() {
    let mut t = Timeline::new();
    t.on_tool_start("analyze_feature_importance", &json!({"latent_features": [0.1, 0.2]}));
    t.on_error("explainer crashed");
    let stage = t.stage("analyze").unwrap();
    assert_eq!(stage.status, StageStatus::Error);
    assert!(stage.description.contains("explainer crashed"));

    t.on_tool_end("analyze_feature_importance", &json!({}));
    t.on_narrative();
    t.on_done();
    assert_eq!(t.stage("analyze").unwrap().status, StageStatus::Error);
    assert!(t.stage(RESPONSE).is_none());
    assert!(!t.is_hidden());
}

#[test]
fn error_without_active_stage_marks_pending_response() {
    let mut t = Timeline::new();
    t.on_tool_start("predict_quality", &json!({}));
    t.on_tool_end("predict_quality", &json!({}));
    assert_eq!(t.stage(RESPONSE).unwrap().status, StageStatus::Pending);

    t.on_error("synthesis failed");
    let response = t.stage(RESPONSE).unwrap();
    assert_eq!(response.status, StageStatus::Error);
    assert!(response.description.contains("synthesis failed"));
    assert_eq!(t.stage("predict").unwrap().status, StageStatus::Completed);
    assert!(t.is_halted());
}

#[test]
fn result_event_completes_producing_stage() {
    let mut t = Timeline::new();
    t.on_tool_start("search_knowledge_base", &json!({"query": "q"}));
    t.on_result(ResultKind::Retrieval);
    assert_eq!(t.stage("search").unwrap().status, StageStatus::Completed);
}

#[test]
fn statuses_are_monotonic_under_any_sequence() {
    let tools = ["predict_quality", "analyze_feature_importance", "search_knowledge_base", "other"];
    let mut t = Timeline::new();
    let mut seen: std::collections::HashMap<String, StageStatus> = std::collections::HashMap::new();
    for step in 0..40 {
        let tool = tools[step % tools.len()];
        match step % 5 {
            0 => t.on_tool_start(tool, &json!({})),
            1 => t.on_tool_end(tool, &json!({})),
            2 => t.on_narrative(),
            3 => t.on_result(ResultKind::Importance),
            _ => t.on_tool_start(tools[(step + 1) % tools.len()], &json!({})),
        }
        for stage in t.stages() {
            if let Some(prev) = seen.get(&stage.id) {
                assert!(!(prev.is_final() && *prev != stage.status), "{} left {:?}", stage.id, prev);
            }
            seen.insert(stage.id.clone(), stage.status);
        }
    }
}

#[test]
fn narrative_without_tools_adds_response() {
    let mut t = Timeline::new();
    t.on_narrative();
    assert_eq!(
        statuses(&t),
        vec![(THINKING, StageStatus::Completed), (RESPONSE, StageStatus::Active)]
    );
}
