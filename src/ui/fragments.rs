//! Fragment tree to styled terminal lines.

use ratatui::prelude::*;

use dc_base::config::{chars, theme};
use dc_base::types::QualityClass;

use crate::render::fragment::{Block, Inline, NoticeLevel, PredictionView};
use crate::render::text::bar;
use crate::render::{Fragment, OutputRegion, RichText};

const INDENT: &str = "  ";

pub fn region_lines(region: &OutputRegion) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(narrative) = region.narrative() {
        lines.extend(rich_lines(narrative));
        lines.push(Line::from(""));
    }
    for fragment in region.fragments() {
        lines.extend(fragment_lines(fragment));
        lines.push(Line::from(""));
    }
    lines
}

fn heading(title: &str, synthetic: bool) -> Line<'static> {
    let mut spans = vec![
        Span::raw(INDENT),
        Span::styled(title.to_string(), Style::default().fg(theme::accent()).bold()),
    ];
    if synthetic {
        spans.push(Span::styled(" (placeholder)", Style::default().fg(theme::warning()).italic()));
    }
    Line::from(spans)
}

fn class_color(class: QualityClass) -> Color {
    match class {
        QualityClass::Defect => theme::error(),
        QualityClass::Normal => theme::success(),
    }
}

fn prediction_lines(view: &PredictionView) -> Vec<Line<'static>> {
    let color = class_color(view.class);
    let mut lines = vec![
        heading("Quality prediction", view.synthetic),
        Line::from(vec![
            Span::raw(INDENT),
            Span::styled(view.class_label.to_string(), Style::default().fg(color).bold()),
            Span::raw("  "),
            Span::styled(bar((view.fraction * 100.0).round() as u32), Style::default().fg(color)),
            Span::styled(format!(" {}", view.gauge_percent), Style::default().fg(theme::text()).bold()),
        ]),
        Line::from(vec![
            Span::raw(INDENT),
            Span::styled(
                format!("defect {}  ·  normal {}", view.defect_percent, view.normal_percent),
                Style::default().fg(theme::text_secondary()),
            ),
        ]),
    ];
    let meta: Vec<String> = [
        view.confidence.as_ref().map(|c| format!("confidence {}", c)),
        view.model_version.as_ref().map(|v| format!("model {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !meta.is_empty() {
        lines.push(Line::from(vec![
            Span::raw(INDENT),
            Span::styled(meta.join("  ·  "), Style::default().fg(theme::text_muted())),
        ]));
    }
    lines
}

pub fn fragment_lines(fragment: &Fragment) -> Vec<Line<'static>> {
    match fragment {
        Fragment::Prediction(view) => prediction_lines(view),
        Fragment::Importance(view) => {
            let mut lines = vec![heading("Key factors", view.synthetic)];
            for row in &view.rows {
                let (marker, color) =
                    if row.top { (chars::STAR, theme::warning()) } else { (" ", theme::accent_dim()) };
                lines.push(Line::from(vec![
                    Span::raw(INDENT),
                    Span::styled(format!("{}{:>2}. ", marker, row.rank), Style::default().fg(color)),
                    Span::styled(format!("{:<24} ", row.label), Style::default().fg(theme::text())),
                    Span::styled(bar(row.width_percent), Style::default().fg(color)),
                    Span::styled(format!(" {}", row.value), Style::default().fg(theme::text_secondary())),
                ]));
            }
            lines
        }
        Fragment::Equipment(cards) => {
            let mut lines = vec![heading("Related equipment", false)];
            for card in cards {
                lines.push(Line::from(vec![
                    Span::raw(INDENT),
                    Span::styled(format!("{} ", chars::ARROW_RIGHT), Style::default().fg(theme::accent())),
                    Span::styled(card.name.clone(), Style::default().fg(theme::text()).bold()),
                    Span::styled(format!(" ({})", card.name_en), Style::default().fg(theme::text_muted())),
                ]));
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(card.description.clone(), Style::default().fg(theme::text_secondary())),
                ]));
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled("Action: ", Style::default().fg(theme::warning())),
                    Span::styled(card.action.clone(), Style::default().fg(theme::text())),
                ]));
            }
            lines
        }
        Fragment::Retrieval(view) => {
            let mut lines = vec![heading("Knowledge base", view.synthetic)];
            lines.extend(rich_lines(&view.answer));
            if !view.citations.is_empty() {
                lines.push(Line::from(vec![
                    Span::raw(INDENT),
                    Span::styled("Sources", Style::default().fg(theme::text_muted()).bold()),
                ]));
                for (i, citation) in view.citations.iter().enumerate() {
                    lines.push(Line::from(vec![
                        Span::raw(INDENT),
                        Span::styled(format!("[{}] ", i + 1), Style::default().fg(theme::accent_dim())),
                        Span::styled(citation.title.clone(), Style::default().fg(theme::text())),
                        Span::styled(format!("  {}", citation.kind), Style::default().fg(theme::text_muted())),
                    ]));
                }
            }
            lines
        }
        Fragment::Notice(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => theme::text_muted(),
                NoticeLevel::Apology => theme::error(),
            };
            vec![Line::from(vec![
                Span::raw(INDENT),
                Span::styled(notice.text.clone(), Style::default().fg(color).italic()),
            ])]
        }
    }
}

fn inline_spans(inlines: &[Inline], base: Style) -> Vec<Span<'static>> {
    inlines
        .iter()
        .map(|inline| {
            let mut style = base;
            if inline.style.strong {
                style = style.bold();
            }
            if inline.style.emphasis {
                style = style.italic();
            }
            if inline.style.code {
                style = style.fg(theme::accent()).bg(theme::bg_elevated());
            }
            Span::styled(inline.text.replace('\n', " "), style)
        })
        .collect()
}

fn prefixed(prefix: String, spans: Vec<Span<'static>>) -> Line<'static> {
    let mut all = vec![Span::raw(prefix)];
    all.extend(spans);
    Line::from(all)
}

pub fn rich_lines(text: &RichText) -> Vec<Line<'static>> {
    let body = Style::default().fg(theme::text());
    text.blocks
        .iter()
        .flat_map(|block| match block {
            Block::Paragraph(inlines) => vec![prefixed(INDENT.to_string(), inline_spans(inlines, body))],
            Block::Heading { inlines, .. } => {
                vec![prefixed(INDENT.to_string(), inline_spans(inlines, body.fg(theme::accent()).bold()))]
            }
            Block::ListItem { depth, marker, inlines } => vec![prefixed(
                format!("{}{}{} ", INDENT, "  ".repeat(*depth), marker),
                inline_spans(inlines, body),
            )],
            Block::Quote(inlines) => {
                vec![prefixed(format!("{}│ ", INDENT), inline_spans(inlines, body.fg(theme::text_secondary())))]
            }
            Block::Code(code) => code
                .lines()
                .map(|l| {
                    Line::from(vec![
                        Span::raw("    "),
                        Span::styled(l.to_string(), Style::default().fg(theme::accent()).bg(theme::bg_elevated())),
                    ])
                })
                .collect(),
            Block::Rule => vec![Line::from(Span::styled(
                format!("{}{}", INDENT, chars::HORIZONTAL.repeat(20)),
                Style::default().fg(theme::border()),
            ))],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markdown;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn markup_stays_literal() {
        let lines = rich_lines(&markdown::parse("<b>hi</b> **there**"));
        let joined: String = lines.iter().map(text_of).collect();
        assert!(joined.contains("<b>"));
        assert!(joined.contains("there"));
    }

    #[test]
    fn list_items_are_indented_by_depth() {
        let lines = rich_lines(&markdown::parse("- a\n  - b"));
        assert!(text_of(&lines[0]).starts_with("  "));
        assert!(text_of(&lines[1]).len() > text_of(&lines[0]).len());
    }
}
