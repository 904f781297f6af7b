use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEventKind};

use dc_base::constants::{SCROLL_ARROW_AMOUNT, SCROLL_PAGE_AMOUNT};

use crate::app::actions::{Action, wheel_action};
use crate::state::State;

/// Map a terminal event to an action. `None` means quit.
pub fn handle_event(event: &Event, state: &State) -> Option<Action> {
    match event {
        Event::Key(key) => {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

            // Global Ctrl shortcuts (always handled first)
            if ctrl {
                match key.code {
                    KeyCode::Char('q') => return None,
                    KeyCode::Char('n') => return Some(Action::NewConversation),
                    KeyCode::Char('p') => return Some(Action::ToggleParams),
                    KeyCode::Char('k') => return Some(Action::StartIngestion),
                    KeyCode::Char('u') => return Some(Action::ClearInput),
                    _ => {}
                }
            }

            // Parameter editor handles its own keys when open
            if let Some(editor) = &state.params {
                return Some(handle_params_key(key, editor.editing.is_some()));
            }

            let has_modifier = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SHIFT | KeyModifiers::ALT);
            let action = match key.code {
                KeyCode::Enter if has_modifier => Action::InsertNewline,
                KeyCode::Enter => Action::InputSubmit,
                KeyCode::Char(c) if !ctrl => Action::InputChar(c),
                KeyCode::Backspace => Action::InputBackspace,
                KeyCode::Delete => Action::InputDelete,
                KeyCode::Left => Action::CursorLeft,
                KeyCode::Right => Action::CursorRight,
                KeyCode::Home => Action::CursorHome,
                KeyCode::End => Action::CursorEnd,
                KeyCode::Up => Action::ScrollUp(SCROLL_ARROW_AMOUNT),
                KeyCode::Down => Action::ScrollDown(SCROLL_ARROW_AMOUNT),
                KeyCode::PageUp => Action::ScrollUp(SCROLL_PAGE_AMOUNT),
                KeyCode::PageDown => Action::ScrollDown(SCROLL_PAGE_AMOUNT),
                _ => Action::None,
            };
            Some(action)
        }
        // Normalize line endings: terminals may send \r\n or \r instead of \n
        Event::Paste(text) => {
            let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
            Some(Action::PasteText(normalized))
        }
        Event::Mouse(mouse) => Some(match mouse.kind {
            MouseEventKind::ScrollUp => wheel_action(true),
            MouseEventKind::ScrollDown => wheel_action(false),
            _ => Action::None,
        }),
        _ => Some(Action::None),
    }
}

fn handle_params_key(key: &KeyEvent, editing: bool) -> Action {
    if editing {
        return match key.code {
            KeyCode::Enter => Action::ParamsCommit,
            KeyCode::Esc => Action::ParamsCancel,
            KeyCode::Backspace => Action::ParamsBackspace,
            KeyCode::Char(c) => Action::ParamsChar(c),
            _ => Action::None,
        };
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Action::ParamsUp,
        KeyCode::Down | KeyCode::Char('j') => Action::ParamsDown,
        KeyCode::Enter => Action::ParamsEdit,
        KeyCode::Char('r') => Action::ParamsResetAll,
        KeyCode::Esc => Action::ToggleParams,
        _ => Action::None,
    }
}
