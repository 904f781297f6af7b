//! Plain-text surface used by the headless `ask` command.

use dc_base::config::chars;

use super::fragment::{Block, Fragment, NoticeLevel, OutputRegion, RichText, inline_text};
use super::summary::SessionSummary;
use crate::timeline::{Stage, StageStatus};

const BAR_WIDTH: usize = 20;

pub fn bar(width_percent: u32) -> String {
    let filled = (width_percent.min(100) as usize * BAR_WIDTH).div_ceil(100);
    format!("{}{}", chars::BLOCK_FULL.repeat(filled), chars::BLOCK_LIGHT.repeat(BAR_WIDTH - filled))
}

pub fn stage_line(stage: &Stage) -> String {
    let mark = match stage.status {
        StageStatus::Pending => "[ ]",
        StageStatus::Active => "[~]",
        StageStatus::Completed => "[x]",
        StageStatus::Error => "[!]",
    };
    let mut line = format!("{} {}", mark, stage.title);
    if !stage.description.is_empty() {
        line.push_str(&format!(": {}", stage.description));
    }
    for detail in [&stage.input_summary, &stage.output_summary].into_iter().flatten() {
        line.push_str(&format!(" ({})", detail));
    }
    line
}

pub fn region_lines(region: &OutputRegion) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(narrative) = region.narrative() {
        lines.extend(rich_lines(narrative));
        lines.push(String::new());
    }
    for fragment in region.fragments() {
        lines.extend(fragment_lines(fragment));
        lines.push(String::new());
    }
    lines
}

fn tag(synthetic: bool) -> &'static str {
    if synthetic { " [placeholder]" } else { "" }
}

pub fn fragment_lines(fragment: &Fragment) -> Vec<String> {
    match fragment {
        Fragment::Prediction(view) => vec![
            format!("Quality prediction: {}{}", view.class_label, tag(view.synthetic)),
            format!("  {} {}", bar((view.fraction * 100.0).round() as u32), view.gauge_percent),
            format!("  defect {} / normal {}", view.defect_percent, view.normal_percent),
        ],
        Fragment::Importance(view) => {
            let mut lines = vec![format!("Key factors{}", tag(view.synthetic))];
            for row in &view.rows {
                let star = if row.top { chars::STAR } else { " " };
                lines.push(format!(
                    "  {}{:>2}. {:<28} {} {}",
                    star,
                    row.rank,
                    row.label,
                    bar(row.width_percent),
                    row.value
                ));
            }
            lines
        }
        Fragment::Equipment(cards) => {
            let mut lines = vec!["Related equipment".to_string()];
            for card in cards {
                lines.push(format!("  {} {} ({})", chars::ARROW_RIGHT, card.name, card.name_en));
                lines.push(format!("    {}", card.description));
                lines.push(format!("    Action: {}", card.action));
            }
            lines
        }
        Fragment::Retrieval(view) => {
            let mut lines = vec![format!("Knowledge base{}", tag(view.synthetic))];
            lines.extend(rich_lines(&view.answer));
            if !view.citations.is_empty() {
                lines.push("Sources:".to_string());
                for (i, c) in view.citations.iter().enumerate() {
                    lines.push(format!("  [{}] {} ({})", i + 1, c.title, c.kind));
                }
            }
            lines
        }
        Fragment::Notice(notice) => {
            let prefix = match notice.level {
                NoticeLevel::Info => "Note",
                NoticeLevel::Apology => "Sorry",
            };
            vec![format!("{}: {}", prefix, notice.text)]
        }
    }
}

pub fn rich_lines(text: &RichText) -> Vec<String> {
    let mut lines = Vec::new();
    for block in &text.blocks {
        match block {
            Block::Paragraph(inlines) => lines.extend(inline_text(inlines).lines().map(str::to_string)),
            Block::Heading { inlines, .. } => lines.push(inline_text(inlines).to_uppercase()),
            Block::ListItem { depth, marker, inlines } => {
                lines.push(format!("{}{} {}", "  ".repeat(*depth), marker, inline_text(inlines)))
            }
            Block::Quote(inlines) => lines.push(format!("> {}", inline_text(inlines))),
            Block::Code(code) => lines.extend(code.lines().map(|l| format!("    {}", l))),
            Block::Rule => lines.push(chars::HORIZONTAL.repeat(BAR_WIDTH)),
        }
    }
    lines
}

pub fn summary_lines(summary: &SessionSummary) -> Vec<String> {
    let mut lines = vec!["== Insight ==".to_string()];
    if let Some(p) = &summary.prediction {
        lines.push(format!("Prediction: {} ({})", p.label, p.probability));
    }
    if !summary.factors.is_empty() {
        lines.push("Top factors:".to_string());
        for f in &summary.factors {
            lines.push(format!("  {:<28} {:>3}%", f.label, f.relative_percent));
        }
    }
    for s in &summary.sensors {
        lines.push(format!("  sensor {}: {} [{} {}]", s.feature, s.name, s.range, s.unit));
    }
    if summary.source_count > 0 {
        lines.push(format!("Sources ({}):", summary.source_count));
        for s in &summary.sources {
            lines.push(format!("  {}: {}", s.title, s.snippet));
        }
    }
    lines
}
