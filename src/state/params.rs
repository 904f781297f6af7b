use dc_base::catalog;
use dc_base::types::FeatureSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamRow {
    pub id: String,
    pub label: String,
    pub value: f64,
}

/// Overlay editor over the feature snapshot, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsEditor {
    pub rows: Vec<ParamRow>,
    pub selected: usize,
    /// Text being typed for the selected row
    pub editing: Option<String>,
    pub error: Option<String>,
}

impl ParamsEditor {
    pub fn from_snapshot(snapshot: &FeatureSnapshot) -> Self {
        let rows = catalog::feature_ids()
            .into_iter()
            .map(|id| {
                let value = snapshot.get(&id).or_else(|| catalog::baseline(&id)).unwrap_or_default();
                ParamRow { label: catalog::feature_label(&id).to_string(), id, value }
            })
            .collect();
        Self { rows, selected: 0, editing: None, error: None }
    }

    pub fn to_snapshot(&self) -> FeatureSnapshot {
        self.rows.iter().map(|r| (r.id.clone(), r.value)).collect()
    }

    pub fn select_next(&mut self) {
        if self.editing.is_none() && self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        if self.editing.is_none() {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    pub fn begin_edit(&mut self) {
        if let Some(row) = self.rows.get(self.selected) {
            self.editing = Some(row.value.to_string());
            self.error = None;
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(text) = self.editing.as_mut()
            && (c.is_ascii_digit() || c == '.' || c == '-')
        {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.editing.as_mut() {
            text.pop();
        }
    }

    /// Parse and store the typed value. Leaves editing open on bad input.
    pub fn commit_edit(&mut self) {
        let Some(text) = self.editing.as_ref() else {
            return;
        };
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                if let Some(row) = self.rows.get_mut(self.selected) {
                    row.value = value;
                }
                self.editing = None;
                self.error = None;
            }
            _ => self.error = Some(format!("'{}' is not a number", text)),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.error = None;
    }

    pub fn reset_all(&mut self) {
        for row in &mut self.rows {
            if let Some(baseline) = catalog::baseline(&row.id) {
                row.value = baseline;
            }
        }
        self.editing = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_flow_back_into_the_snapshot() {
        let mut editor = ParamsEditor::from_snapshot(&FeatureSnapshot::baseline());
        assert_eq!(editor.rows.len(), 30);
        let id = editor.rows[0].id.clone();

        editor.begin_edit();
        editor.editing = Some(String::new());
        for c in "1x5.5".chars() {
            editor.push_char(c);
        }
        editor.commit_edit();
        assert!(editor.editing.is_none());
        assert_eq!(editor.to_snapshot().get(&id), Some(15.5));
    }

    #[test]
    fn invalid_input_keeps_editing() {
        let mut editor = ParamsEditor::from_snapshot(&FeatureSnapshot::baseline());
        editor.begin_edit();
        editor.editing = Some("-".into());
        editor.commit_edit();
        assert!(editor.editing.is_some());
        assert!(editor.error.is_some());
        editor.cancel_edit();
        assert!(editor.error.is_none());
    }

    #[test]
    fn reset_restores_baseline() {
        let mut editor = ParamsEditor::from_snapshot(&FeatureSnapshot::baseline());
        editor.rows[2].value = -1.0;
        editor.reset_all();
        assert_eq!(editor.to_snapshot(), FeatureSnapshot::baseline());
    }

    #[test]
    fn selection_is_clamped() {
        let mut editor = ParamsEditor::from_snapshot(&FeatureSnapshot::baseline());
        editor.select_prev();
        assert_eq!(editor.selected, 0);
        for _ in 0..100 {
            editor.select_next();
        }
        assert_eq!(editor.selected, 29);
    }
}
