use ratatui::{prelude::*, widgets::Paragraph};

use dc_base::config::{chars, theme};
use dc_base::types::QualityClass;

use super::helpers::{format_timestamp, spinner, truncate_string, wrap_text};
use crate::render::SessionSummary;
use crate::state::{IngestView, State};

pub fn render_sidebar(frame: &mut Frame, state: &State, area: Rect) {
    let base_style = Style::default().bg(theme::bg_base());
    let width = area.width.saturating_sub(4) as usize;

    let mut lines: Vec<Line> = vec![section("INSIGHT"), Line::from("")];
    match &state.summary {
        Some(summary) => lines.extend(summary_lines(summary, width)),
        None => lines.push(Line::from(Span::styled(
            "  Results appear here once an answer completes.",
            Style::default().fg(theme::text_muted()).italic(),
        ))),
    }

    lines.push(Line::from(""));
    lines.push(section("KNOWLEDGE BASE"));
    lines.push(Line::from(""));
    lines.extend(ingest_lines(&state.ingest, state.spinner_frame));

    lines.push(Line::from(""));
    lines.push(section("SESSION"));
    lines.push(Line::from(Span::styled(
        format!("  {}", truncate_string(&state.session_id, width)),
        Style::default().fg(theme::text_secondary()),
    )));

    frame.render_widget(Paragraph::new(lines).style(base_style), area);
}

fn section(title: &str) -> Line<'static> {
    Line::from(vec![Span::raw("  "), Span::styled(title.to_string(), Style::default().fg(theme::text_muted()).bold())])
}

fn summary_lines(summary: &SessionSummary, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(p) = &summary.prediction {
        let color = if p.class == QualityClass::Defect { theme::error() } else { theme::success() };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(p.label.to_string(), Style::default().fg(color).bold()),
            Span::styled(format!("  {}", p.probability), Style::default().fg(theme::text())),
        ]));
        lines.push(Line::from(""));
    }

    if !summary.factors.is_empty() {
        lines.push(Line::from(Span::styled("  Top factors", Style::default().fg(theme::text_secondary()))));
        for factor in &summary.factors {
            let filled = (factor.relative_percent as usize * 10).div_ceil(100);
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(chars::BLOCK_FULL.repeat(filled), Style::default().fg(theme::accent())),
                Span::styled(chars::BLOCK_LIGHT.repeat(10 - filled.min(10)), Style::default().fg(theme::border())),
                Span::styled(
                    format!(" {}", truncate_string(&factor.label, width.saturating_sub(12))),
                    Style::default().fg(theme::text()),
                ),
            ]));
        }
        lines.push(Line::from(""));
    }

    for sensor in &summary.sensors {
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", chars::DOT), Style::default().fg(theme::warning())),
            Span::styled(truncate_string(&sensor.name, width.saturating_sub(2)), Style::default().fg(theme::text())),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    normal {} {}", sensor.range, sensor.unit),
            Style::default().fg(theme::text_muted()),
        )));
    }

    if summary.source_count > 0 {
        lines.push(Line::from(Span::styled(
            format!("  Sources ({})", summary.source_count),
            Style::default().fg(theme::text_secondary()),
        )));
        for source in &summary.sources {
            lines.push(Line::from(Span::styled(
                format!("  {} {}", chars::ARROW_RIGHT, truncate_string(&source.title, width.saturating_sub(2))),
                Style::default().fg(theme::text()),
            )));
            for row in wrap_text(&source.snippet, width.saturating_sub(2)).into_iter().take(2) {
                lines.push(Line::from(Span::styled(format!("    {}", row), Style::default().fg(theme::text_muted()))));
            }
        }
    }
    lines
}

fn ingest_lines(view: &IngestView, spinner_frame: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match &view.job {
        None => lines.push(Line::from(Span::styled(
            "  No ingestion job. Ctrl+K starts one.",
            Style::default().fg(theme::text_muted()),
        ))),
        Some(job) => {
            let (prefix, color) = if job.status.is_running() {
                (format!("{} ", spinner(spinner_frame)), theme::accent())
            } else if job.status.is_terminal() && job.error.is_none() {
                ("✓ ".to_string(), theme::success())
            } else {
                ("✗ ".to_string(), theme::error())
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {}", prefix), Style::default().fg(color)),
                Span::styled(job.status.label().to_string(), Style::default().fg(color).bold()),
            ]));
            let stats = &job.statistics;
            lines.push(Line::from(Span::styled(
                format!(
                    "    {} scanned · {} indexed · {} failed",
                    stats.documents_scanned, stats.documents_indexed, stats.documents_failed
                ),
                Style::default().fg(theme::text_secondary()),
            )));
            if let Some(started) = &job.started_at {
                lines.push(Line::from(Span::styled(
                    format!("    started {}", format_timestamp(started)),
                    Style::default().fg(theme::text_muted()),
                )));
            }
            if let Some(error) = &job.error {
                lines.push(Line::from(Span::styled(format!("    {}", error), Style::default().fg(theme::error()))));
            }
        }
    }
    if let Some(error) = &view.error {
        lines.push(Line::from(Span::styled(format!("  ! {}", error), Style::default().fg(theme::warning()))));
    }
    lines
}
