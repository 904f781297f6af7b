mod conversation;
mod fragments;
pub mod helpers;
mod input;
mod params;
mod sidebar;

use ratatui::{prelude::*, widgets::Block};

use dc_base::config::theme;
use dc_base::constants::{SIDEBAR_WIDTH, STATUS_BAR_HEIGHT};

use crate::state::State;

pub fn render(frame: &mut Frame, state: &mut State) {
    let area = frame.area();

    // Fill base background
    frame.render_widget(Block::default().style(Style::default().bg(theme::bg_base())), area);

    // Main layout: body + footer (no header)
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_BAR_HEIGHT)])
        .split(area);

    render_body(frame, state, main_layout[0]);
    input::render_status_bar(frame, state, main_layout[1]);

    if let Some(editor) = &state.params {
        params::render_params(frame, editor, area);
    }
}

fn render_body(frame: &mut Frame, state: &mut State, area: Rect) {
    // Body layout: main content + insight sidebar
    let body_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(SIDEBAR_WIDTH)])
        .split(area);

    render_main_content(frame, state, body_layout[0]);
    sidebar::render_sidebar(frame, state, body_layout[1]);
}

fn render_main_content(frame: &mut Frame, state: &mut State, area: Rect) {
    // Input grows with content
    let input_lines = state.input.lines().count().max(1);
    let input_height = (input_lines as u16 + 2).clamp(3, 8);

    let content_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(input_height)])
        .split(area);

    conversation::render_conversation(frame, state, content_layout[0]);
    input::render_input(frame, state, content_layout[1]);
}
