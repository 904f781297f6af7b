use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use dc_base::config::theme;

use super::helpers::spinner;
use crate::state::State;

pub fn render_input(frame: &mut Frame, state: &State, area: Rect) {
    let busy = state.is_busy();
    let border_color = if busy { theme::border() } else { theme::accent_dim() };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme::bg_surface()))
        .title(Span::styled(" Question ", Style::default().fg(theme::text_secondary())));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = if state.input.is_empty() {
        Text::from(Span::styled(
            if busy { "Waiting for the current answer…" } else { "Type a question and press Enter" },
            Style::default().fg(theme::text_muted()).italic(),
        ))
    } else {
        Text::from(state.input.lines().map(|l| Line::from(l.to_string())).collect::<Vec<_>>())
            .style(Style::default().fg(theme::text()))
    };
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);

    if state.params.is_none() {
        let (row, col) = cursor_position(&state.input, state.input_cursor);
        let x = inner.x.saturating_add(col).min(inner.right().saturating_sub(1));
        let y = inner.y.saturating_add(row).min(inner.bottom().saturating_sub(1));
        frame.set_cursor_position(Position::new(x, y));
    }
}

/// Row and display column of the byte cursor, ignoring soft wraps.
fn cursor_position(input: &str, cursor: usize) -> (u16, u16) {
    use unicode_width::UnicodeWidthStr;
    let before = &input[..cursor.min(input.len())];
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().unwrap_or_default().width();
    (saturate(row), saturate(col))
}

fn saturate(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

pub fn render_status_bar(frame: &mut Frame, state: &State, area: Rect) {
    let base_style = Style::default().bg(theme::bg_base()).fg(theme::text_muted());
    let mut spans = vec![Span::styled(" ", base_style)];

    if let Some(run) = state.exchanges.last().map(|e| &e.run).filter(|r| !r.is_closed()) {
        let label = if run.fallback_used() || !run.phase().accepts_events() { "FALLBACK" } else { "STREAMING" };
        spans.push(Span::styled(
            format!(" {} {} ", spinner(state.spinner_frame), label),
            Style::default().fg(theme::bg_base()).bg(theme::success()).bold(),
        ));
    } else {
        spans.push(Span::styled(" READY ", Style::default().fg(theme::bg_base()).bg(theme::text_muted()).bold()));
    }
    spans.push(Span::styled(" ", base_style));

    if let Some(message) = &state.status_message {
        spans.push(Span::styled(format!(" {} ", message), Style::default().fg(theme::text()).bg(theme::bg_elevated())));
        spans.push(Span::styled(" ", base_style));
    }

    let help = " Enter ask · Ctrl+P params · Ctrl+N new · Ctrl+K ingest · Ctrl+Q quit ";
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let pad = (area.width as usize).saturating_sub(used + help.chars().count());
    spans.push(Span::styled(" ".repeat(pad), base_style));
    spans.push(Span::styled(help, base_style));

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base_style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_lines_and_wide_chars() {
        assert_eq!(cursor_position("abc", 2), (0, 2));
        assert_eq!(cursor_position("ab\n압력", 9), (1, 4));
    }

    #[test]
    fn cursor_saturates_on_huge_input() {
        let long = "x".repeat(70_000);
        assert_eq!(cursor_position(&long, long.len()), (0, u16::MAX));
    }
}
