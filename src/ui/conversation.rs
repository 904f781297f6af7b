use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use dc_base::catalog;
use dc_base::config::{icons, theme};

use super::fragments::region_lines;
use super::helpers::{count_wrapped_lines, spinner};
use crate::orchestrator::{LiveStatus, RequestRun};
use crate::state::State;
use crate::timeline::{Stage, StageStatus};

pub fn render_conversation(frame: &mut Frame, state: &mut State, area: Rect) {
    let base_style = Style::default().bg(theme::bg_surface());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme::border()))
        .style(base_style)
        .title(Span::styled(
            if state.is_busy() { " Diagnosis ● " } else { " Diagnosis " },
            Style::default().fg(theme::accent()).bold(),
        ))
        .title_alignment(Alignment::Left);

    let content_area = block.inner(area);
    frame.render_widget(block, area);

    let mut text: Vec<Line> = Vec::new();

    if state.exchanges.is_empty() {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "  Ask about defect risk, its causes, or process guidance. Try:",
            Style::default().fg(theme::text_muted()).italic(),
        )));
        for question in catalog::sample_questions() {
            text.push(Line::from(Span::styled(
                format!("    · {}", question),
                Style::default().fg(theme::text_secondary()),
            )));
        }
    } else {
        for exchange in &state.exchanges {
            text.push(Line::from(vec![
                Span::styled(icons::msg_user(), Style::default().fg(theme::user())),
                Span::styled(exchange.question.clone(), Style::default().fg(theme::text()).bold()),
            ]));
            text.push(Line::from(""));
            text.extend(run_lines(&exchange.run, state.spinner_frame));
        }
    }

    // Scroll is measured from the bottom so new output stays in view
    let width = content_area.width as usize;
    let total: usize = text.iter().map(|l| count_wrapped_lines(l, width)).sum();
    let max_scroll = total.saturating_sub(content_area.height as usize).min(u16::MAX as usize) as u16;
    state.max_scroll = max_scroll;
    state.scroll_offset = state.scroll_offset.min(max_scroll);
    let scroll = max_scroll - state.scroll_offset;

    let paragraph = Paragraph::new(text).style(base_style).wrap(Wrap { trim: false }).scroll((scroll, 0));
    frame.render_widget(paragraph, content_area);
}

fn run_lines(run: &RequestRun, spinner_frame: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match run.live() {
        LiveStatus::Live { message } => lines.push(Line::from(vec![
            Span::styled(format!("{} ", spinner(spinner_frame)), Style::default().fg(theme::accent())),
            Span::styled(message.clone(), Style::default().fg(theme::text_secondary()).italic()),
        ])),
        LiveStatus::Completed { elapsed_secs } => lines.push(Line::from(vec![
            Span::styled(icons::msg_assistant(), Style::default().fg(theme::assistant())),
            Span::styled(format!("Completed in {:.1}s", elapsed_secs), Style::default().fg(theme::text_muted())),
        ])),
        LiveStatus::Failed { message } => lines.push(Line::from(vec![
            Span::styled(icons::msg_error(), Style::default().fg(theme::error())),
            Span::styled(message.clone(), Style::default().fg(theme::error())),
        ])),
        LiveStatus::Removed => {}
    }

    if !run.timeline().is_hidden() {
        lines.extend(run.timeline().stages().iter().map(stage_line));
    }
    if !lines.is_empty() {
        lines.push(Line::from(""));
    }

    lines.extend(region_lines(run.output()));
    lines
}

fn stage_line(stage: &Stage) -> Line<'static> {
    let (icon, color) = match stage.status {
        StageStatus::Pending => (icons::stage_pending(), theme::text_muted()),
        StageStatus::Active => (icons::stage_active(), theme::accent()),
        StageStatus::Completed => (icons::stage_completed(), theme::success()),
        StageStatus::Error => (icons::stage_failed(), theme::error()),
    };
    let mut spans = vec![
        Span::raw("  "),
        Span::styled(icon, Style::default().fg(color)),
        Span::styled(stage.title.clone(), Style::default().fg(theme::text())),
    ];
    if !stage.description.is_empty() {
        spans.push(Span::styled(format!("  {}", stage.description), Style::default().fg(theme::text_muted())));
    }
    for detail in [&stage.input_summary, &stage.output_summary].into_iter().flatten() {
        spans.push(Span::styled(format!("  [{}]", detail), Style::default().fg(theme::text_secondary())));
    }
    Line::from(spans)
}
