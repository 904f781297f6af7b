use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use dc_base::catalog;
use dc_base::config::theme;

use crate::state::ParamsEditor;

/// Centered overlay listing every process parameter.
pub fn render_params(frame: &mut Frame, editor: &ParamsEditor, area: Rect) {
    let width = area.width.saturating_sub(8).min(64);
    let height = area.height.saturating_sub(4);
    let popup = Rect::new(area.x + (area.width - width) / 2, area.y + (area.height - height) / 2, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme::accent()))
        .style(Style::default().bg(theme::bg_elevated()))
        .title(Span::styled(" Process parameters ", Style::default().fg(theme::accent()).bold()));
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let visible = inner.height.saturating_sub(2) as usize;
    let first = editor.selected.saturating_sub(visible.saturating_sub(1));

    let mut lines: Vec<Line> = editor
        .rows
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(i, row)| {
            let selected = i == editor.selected;
            let value = match (&editor.editing, selected) {
                (Some(text), true) => format!("{}▏", text),
                _ => format!("{}", row.value),
            };
            let changed = catalog::baseline(&row.id).is_some_and(|b| b != row.value);
            let style = if selected {
                Style::default().fg(theme::bg_base()).bg(theme::accent())
            } else if changed {
                Style::default().fg(theme::warning())
            } else {
                Style::default().fg(theme::text())
            };
            Line::from(vec![Span::styled(format!(" {:<32} {:>12} ", row.label, value), style)])
        })
        .collect();

    lines.push(Line::from(""));
    let footer = match &editor.error {
        Some(error) => Span::styled(format!(" {}", error), Style::default().fg(theme::error())),
        None => Span::styled(
            " ↑↓ select · Enter edit · r reset all · Esc close",
            Style::default().fg(theme::text_muted()),
        ),
    };
    lines.push(Line::from(footer));

    frame.render_widget(Paragraph::new(lines), inner);
}
