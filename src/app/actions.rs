use dc_base::constants::SCROLL_ARROW_AMOUNT;

use crate::state::{ParamsEditor, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    InputChar(char),
    InsertNewline,
    InputBackspace,
    InputDelete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    InputSubmit,
    PasteText(String),
    ClearInput,
    NewConversation,
    ToggleParams,
    StartIngestion,
    ScrollUp(u16),
    ScrollDown(u16),
    ParamsUp,
    ParamsDown,
    ParamsEdit,
    ParamsChar(char),
    ParamsBackspace,
    ParamsCommit,
    ParamsCancel,
    ParamsResetAll,
    None,
}

/// Side effects the App must perform after a state change.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Nothing,
    /// Open the agent stream for this run
    Submit(u64),
    NewConversation,
    StartIngestion,
}

pub fn apply_action(state: &mut State, action: Action) -> ActionResult {
    state.dirty = true;
    match action {
        Action::InputChar(c) => {
            state.input.insert(state.input_cursor, c);
            state.input_cursor += c.len_utf8();
        }
        Action::InsertNewline => {
            state.input.insert(state.input_cursor, '\n');
            state.input_cursor += 1;
        }
        Action::PasteText(text) => {
            state.input.insert_str(state.input_cursor, &text);
            state.input_cursor += text.len();
        }
        Action::InputBackspace => {
            if let Some(prev) = prev_boundary(&state.input, state.input_cursor) {
                state.input.replace_range(prev..state.input_cursor, "");
                state.input_cursor = prev;
            }
        }
        Action::InputDelete => {
            if let Some(next) = next_boundary(&state.input, state.input_cursor) {
                state.input.replace_range(state.input_cursor..next, "");
            }
        }
        Action::CursorLeft => {
            if let Some(prev) = prev_boundary(&state.input, state.input_cursor) {
                state.input_cursor = prev;
            }
        }
        Action::CursorRight => {
            if let Some(next) = next_boundary(&state.input, state.input_cursor) {
                state.input_cursor = next;
            }
        }
        Action::CursorHome => state.input_cursor = 0,
        Action::CursorEnd => state.input_cursor = state.input.len(),
        Action::ClearInput => {
            state.input.clear();
            state.input_cursor = 0;
        }
        Action::InputSubmit => {
            if state.is_busy() {
                state.status_message = Some("Still working on the previous question".to_string());
                return ActionResult::Nothing;
            }
            let question = std::mem::take(&mut state.input);
            state.input_cursor = 0;
            if let Some((run_id, _)) = state.begin_request(&question) {
                state.status_message = None;
                return ActionResult::Submit(run_id);
            }
        }
        Action::NewConversation => {
            if state.is_busy() {
                state.status_message = Some("Wait for the current answer to finish".to_string());
                return ActionResult::Nothing;
            }
            return ActionResult::NewConversation;
        }
        Action::StartIngestion => return ActionResult::StartIngestion,
        Action::ToggleParams => match state.params.take() {
            Some(editor) => {
                state.features = editor.to_snapshot();
                state.status_message = Some("Process parameters updated".to_string());
            }
            None => state.params = Some(ParamsEditor::from_snapshot(&state.features)),
        },
        Action::ScrollUp(n) => state.scroll_offset = state.scroll_offset.saturating_add(n).min(state.max_scroll),
        Action::ScrollDown(n) => state.scroll_offset = state.scroll_offset.saturating_sub(n),
        Action::ParamsUp => with_editor(state, ParamsEditor::select_prev),
        Action::ParamsDown => with_editor(state, ParamsEditor::select_next),
        Action::ParamsEdit => with_editor(state, ParamsEditor::begin_edit),
        Action::ParamsChar(c) => with_editor(state, |e| e.push_char(c)),
        Action::ParamsBackspace => with_editor(state, ParamsEditor::backspace),
        Action::ParamsCommit => with_editor(state, ParamsEditor::commit_edit),
        Action::ParamsCancel => with_editor(state, ParamsEditor::cancel_edit),
        Action::ParamsResetAll => with_editor(state, ParamsEditor::reset_all),
        Action::None => state.dirty = false,
    }
    ActionResult::Nothing
}

/// Mouse wheel scroll uses the arrow amount.
pub fn wheel_action(up: bool) -> Action {
    if up { Action::ScrollUp(SCROLL_ARROW_AMOUNT) } else { Action::ScrollDown(SCROLL_ARROW_AMOUNT) }
}

fn with_editor(state: &mut State, f: impl FnOnce(&mut ParamsEditor)) {
    if let Some(editor) = state.params.as_mut() {
        f(editor);
    }
}

fn prev_boundary(s: &str, cursor: usize) -> Option<usize> {
    s[..cursor].char_indices().next_back().map(|(i, _)| i)
}

fn next_boundary(s: &str, cursor: usize) -> Option<usize> {
    s[cursor..].chars().next().map(|c| cursor + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use dc_base::types::FeatureSnapshot;

    use super::*;

    fn state() -> State {
        State::new("session_t".into(), FeatureSnapshot::baseline())
    }

    fn type_text(state: &mut State, text: &str) {
        for c in text.chars() {
            apply_action(state, Action::InputChar(c));
        }
    }

    #[test]
    fn editing_handles_multibyte_input() {
        let mut s = state();
        type_text(&mut s, "압력?");
        apply_action(&mut s, Action::CursorLeft);
        apply_action(&mut s, Action::InputBackspace);
        assert_eq!(s.input, "압?");
        apply_action(&mut s, Action::CursorHome);
        apply_action(&mut s, Action::InputDelete);
        assert_eq!(s.input, "?");
    }

    #[test]
    fn submit_starts_a_run_and_clears_input() {
        let mut s = state();
        type_text(&mut s, "defect?");
        assert_eq!(apply_action(&mut s, Action::InputSubmit), ActionResult::Submit(1));
        assert!(s.input.is_empty());
        assert_eq!(s.exchanges.len(), 1);
    }

    #[test]
    fn submit_while_busy_keeps_input() {
        let mut s = state();
        type_text(&mut s, "first");
        apply_action(&mut s, Action::InputSubmit);
        type_text(&mut s, "second");
        assert_eq!(apply_action(&mut s, Action::InputSubmit), ActionResult::Nothing);
        assert_eq!(s.input, "second");
        assert_eq!(s.exchanges.len(), 1);
        assert_eq!(apply_action(&mut s, Action::NewConversation), ActionResult::Nothing);
    }

    #[test]
    fn closing_the_editor_applies_the_snapshot() {
        let mut s = state();
        apply_action(&mut s, Action::ToggleParams);
        apply_action(&mut s, Action::ParamsDown);
        apply_action(&mut s, Action::ParamsEdit);
        s.params.as_mut().unwrap().editing = Some(String::new());
        for c in "42".chars() {
            apply_action(&mut s, Action::ParamsChar(c));
        }
        apply_action(&mut s, Action::ParamsCommit);
        let id = s.params.as_ref().unwrap().rows[1].id.clone();
        apply_action(&mut s, Action::ToggleParams);
        assert!(s.params.is_none());
        assert_eq!(s.features.get(&id), Some(42.0));
    }

    #[test]
    fn scroll_is_bounded() {
        let mut s = state();
        s.max_scroll = 5;
        apply_action(&mut s, Action::ScrollUp(10));
        assert_eq!(s.scroll_offset, 5);
        apply_action(&mut s, Action::ScrollDown(10));
        assert_eq!(s.scroll_offset, 0);
    }
}
