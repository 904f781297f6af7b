//! Visible sequence of agent stages for one request.
//!
//! `thinking` is always first. Recognized tools append their own stage on
//! first use, and a `response` stage is added once the narrative is on its
//! way. Statuses only move forward: nothing leaves `Completed` or `Error`.

use serde_json::Value;

use dc_base::catalog;
use dc_base::types::ResultKind;

use crate::render::prediction::{class_label, percent};

pub const THINKING: &str = "thinking";
pub const RESPONSE: &str = "response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
    Error,
}

impl StageStatus {
    pub fn is_final(self) -> bool {
        matches!(self, StageStatus::Completed | StageStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: String,
    pub title: String,
    pub status: StageStatus,
    pub description: String,
    pub input_summary: Option<String>,
    pub output_summary: Option<String>,
}

impl Stage {
    fn new(id: &str, title: &str, status: StageStatus, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status,
            description: description.to_string(),
            input_summary: None,
            output_summary: None,
        }
    }

    /// Move to `to` unless that would go backwards. Returns whether it moved.
    fn transition(&mut self, to: StageStatus) -> bool {
        if self.status.is_final() || to == StageStatus::Pending || self.status == to {
            return false;
        }
        self.status = to;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    stages: Vec<Stage>,
    halted: bool,
    hidden: bool,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            stages: vec![Stage::new(THINKING, "Analyzing question", StageStatus::Active, "Working out what is being asked")],
            halted: false,
            hidden: false,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// No further mutation after `done` or `error`.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn on_thinking(&mut self, message: &str) {
        if self.halted || message.is_empty() {
            return;
        }
        if let Some(stage) = self.stage_mut(THINKING)
            && !stage.status.is_final()
        {
            stage.description = message.to_string();
        }
    }

    pub fn on_tool_start(&mut self, tool: &str, input: &Value) {
        if self.halted {
            return;
        }
        let Some(spec) = catalog::tool(tool) else {
            tracing::debug!(%tool, "ignoring unrecognized tool");
            return;
        };
        self.complete_active_except(&spec.stage);

        let summary = input_summary(tool, input);
        match self.stage_index(&spec.stage) {
            Some(idx) => {
                let stage = &mut self.stages[idx];
                // A completed stage stays completed on a retried start.
                if stage.transition(StageStatus::Active) || stage.status == StageStatus::Active {
                    stage.description = spec.description.clone();
                    stage.input_summary = summary;
                }
            }
            None => {
                let mut stage = Stage::new(&spec.stage, &spec.title, StageStatus::Active, &spec.description);
                stage.input_summary = summary;
                match self.stage_index(RESPONSE) {
                    Some(pos) => self.stages.insert(pos, stage),
                    None => self.stages.push(stage),
                }
            }
        }
    }

    pub fn on_tool_end(&mut self, tool: &str, result: &Value) {
        if self.halted {
            return;
        }
        let Some(spec) = catalog::tool(tool) else {
            return;
        };
        let idx = match self.stage_index(&spec.stage) {
            Some(idx) => idx,
            None => {
                let stage = Stage::new(&spec.stage, &spec.title, StageStatus::Pending, &spec.description);
                let pos = self.stage_index(RESPONSE).unwrap_or(self.stages.len());
                self.stages.insert(pos, stage);
                pos
            }
        };
        let stage = &mut self.stages[idx];
        if stage.transition(StageStatus::Completed) {
            stage.description = format!("{} done", spec.title);
            stage.output_summary = output_summary(tool, result);
        }
        if self.stage_index(RESPONSE).is_none() {
            self.stages.push(Stage::new(RESPONSE, "Writing answer", StageStatus::Pending, "Waiting for the answer"));
        }
    }

    /// A result event implies its producing tool has finished.
    pub fn on_result(&mut self, kind: ResultKind) {
        if self.halted {
            return;
        }
        if let Some(spec) = catalog::tool(kind.tool_name())
            && let Some(stage) = self.stage_mut(&spec.stage)
        {
            stage.transition(StageStatus::Completed);
        }
    }

    pub fn on_narrative(&mut self) {
        if self.halted {
            return;
        }
        self.complete_active_except(RESPONSE);
        if self.stage_index(RESPONSE).is_none() {
            self.stages.push(Stage::new(RESPONSE, "Writing answer", StageStatus::Pending, ""));
        }
        if let Some(stage) = self.stage_mut(RESPONSE)
            && stage.transition(StageStatus::Active)
        {
            stage.description = "Composing the answer".to_string();
        }
    }

    pub fn on_done(&mut self) {
        if self.halted {
            return;
        }
        for stage in self.stages.iter_mut().filter(|s| s.status == StageStatus::Active) {
            stage.transition(StageStatus::Completed);
        }
        if let Some(stage) = self.stage_mut(RESPONSE) {
            stage.transition(StageStatus::Completed);
        }
        self.halted = true;
        self.hidden = true;
    }

    /// Mark the active stage failed with the message and freeze the timeline.
    pub fn on_error(&mut self, message: &str) {
        if self.halted {
            return;
        }
        // Prefer the active stage, else the latest one still pending
        let target = match self.stages.iter().rposition(|s| s.status == StageStatus::Active) {
            Some(i) => Some(i),
            None => self.stages.iter().rposition(|s| !s.status.is_final()),
        };
        if let Some(stage) = target.map(|i| &mut self.stages[i]) {
            stage.transition(StageStatus::Error);
            stage.description = format!("Error: {}", message);
        }
        self.halted = true;
    }

    /// Freeze and hide without touching stage statuses (fallback takes over the output).
    pub fn hide(&mut self) {
        self.halted = true;
        self.hidden = true;
    }

    fn stage_index(&self, id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == id)
    }

    fn stage_mut(&mut self, id: &str) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.id == id)
    }

    fn complete_active_except(&mut self, id: &str) {
        for stage in self.stages.iter_mut().filter(|s| s.status == StageStatus::Active && s.id != id) {
            stage.transition(StageStatus::Completed);
        }
    }
}

fn input_summary(tool: &str, input: &Value) -> Option<String> {
    match tool {
        "predict_quality" => {
            let count = input.get("features").and_then(Value::as_object).map(|m| m.len()).unwrap_or(0);
            Some(format!("{} parameters sent", count))
        }
        "analyze_feature_importance" => {
            let count = input.get("latent_features").and_then(Value::as_array).map(|a| a.len());
            Some(match count {
                Some(n) if n > 0 => format!("{} latent features", n),
                _ => "latent features".to_string(),
            })
        }
        "search_knowledge_base" => {
            input.get("query").and_then(Value::as_str).map(|q| format!("query: \"{}\"", q))
        }
        _ => None,
    }
}

fn output_summary(tool: &str, result: &Value) -> Option<String> {
    match tool {
        "predict_quality" => {
            let prediction = result.get("prediction").unwrap_or(result);
            let class = prediction.get("class").and_then(|c| serde_json::from_value(c.clone()).ok())?;
            let probability = prediction
                .get("probability_percent")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| prediction.get("probability").and_then(Value::as_f64).map(percent))?;
            Some(format!("{} probability {}", class_label(class), probability))
        }
        "analyze_feature_importance" => {
            let n = result.get("top_features").and_then(Value::as_array).map(|a| a.len()).unwrap_or(0);
            Some(format!("top {} factors", n))
        }
        "search_knowledge_base" => {
            let n = result.get("sources").and_then(Value::as_array).map(|a| a.len()).unwrap_or(0);
            Some(format!("{} documents", n))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests;
