//! HTML surface for the fragment tree. Every text field is escaped.

use std::fmt::Write;

use super::fragment::{
    Block, EquipmentCard, Fragment, ImportanceView, Inline, NoticeLevel, OutputRegion, PredictionView, RetrievalView,
    RichText,
};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone page with one section per question.
pub fn document(title: &str, exchanges: &[(&str, &OutputRegion)]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>\n",
        escape(title)
    );
    for (question, region) in exchanges {
        let _ = write!(out, "<section class=\"exchange\">\n<p class=\"question\">{}</p>\n", escape(question));
        out.push_str(&region_html(region));
        out.push_str("</section>\n");
    }
    out.push_str("</body></html>\n");
    out
}

/// Narrative summary first, then fragments in arrival order.
pub fn region_html(region: &OutputRegion) -> String {
    let mut out = String::new();
    if let Some(narrative) = region.narrative() {
        let _ = writeln!(out, "<div class=\"summary\">{}</div>", rich_html(narrative));
    }
    for fragment in region.fragments() {
        out.push_str(&fragment_html(fragment));
    }
    out
}

pub fn fragment_html(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Prediction(view) => prediction_html(view),
        Fragment::Importance(view) => importance_html(view),
        Fragment::Equipment(cards) => equipment_html(cards),
        Fragment::Retrieval(view) => retrieval_html(view),
        Fragment::Notice(notice) => {
            let class = match notice.level {
                NoticeLevel::Info => "notice",
                NoticeLevel::Apology => "notice apology",
            };
            format!("<div class=\"{}\">{}</div>\n", class, escape(&notice.text))
        }
    }
}

fn synthetic_badge(synthetic: bool) -> &'static str {
    if synthetic { " <span class=\"badge\">placeholder</span>" } else { "" }
}

fn prediction_html(view: &PredictionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<div class=\"prediction\">");
    let _ = writeln!(
        out,
        "<svg width=\"100\" height=\"100\" viewBox=\"0 0 100 100\">\
         <circle cx=\"50\" cy=\"50\" r=\"42\" fill=\"none\" stroke-width=\"8\" class=\"track\"/>\
         <circle cx=\"50\" cy=\"50\" r=\"42\" fill=\"none\" stroke-width=\"8\" class=\"fill\" \
         stroke-dasharray=\"{:.2}\" stroke-dashoffset=\"{:.2}\" transform=\"rotate(-90 50 50)\"/></svg>",
        view.circumference, view.dash_offset
    );
    let _ = writeln!(
        out,
        "<div class=\"verdict\">{}{}</div><div class=\"gauge\">{}</div>",
        escape(view.class_label),
        synthetic_badge(view.synthetic),
        escape(&view.gauge_percent)
    );
    let _ = writeln!(
        out,
        "<ul><li>Defect {}</li><li>Normal {}</li></ul>",
        escape(&view.defect_percent),
        escape(&view.normal_percent)
    );
    if let Some(model) = &view.model_version {
        let _ = writeln!(out, "<div class=\"model\">{}</div>", escape(model));
    }
    out.push_str("</div>\n");
    out
}

fn importance_html(view: &ImportanceView) -> String {
    let mut out = format!("<div class=\"importance\">{}\n", synthetic_badge(view.synthetic));
    for row in &view.rows {
        let _ = writeln!(
            out,
            "<div class=\"factor{}\"><span class=\"rank\">{}</span> <span class=\"label\">{}</span> \
             <span class=\"bar\" style=\"width: {}%\"></span> <span class=\"value\">{}</span></div>",
            if row.top { " top" } else { "" },
            row.rank,
            escape(&row.label),
            row.width_percent,
            escape(&row.value)
        );
    }
    out.push_str("</div>\n");
    out
}

fn equipment_html(cards: &[EquipmentCard]) -> String {
    let mut out = String::from("<div class=\"equipment\">\n");
    for card in cards {
        let _ = writeln!(
            out,
            "<div class=\"card\"><h4>{} <small>{}</small></h4><p>{}</p><p class=\"action\">{}</p></div>",
            escape(&card.name),
            escape(&card.name_en),
            escape(&card.description),
            escape(&card.action)
        );
    }
    out.push_str("</div>\n");
    out
}

fn retrieval_html(view: &RetrievalView) -> String {
    let mut out = format!("<div class=\"retrieval\">{}\n", synthetic_badge(view.synthetic));
    out.push_str(&rich_html(&view.answer));
    if !view.citations.is_empty() {
        out.push_str("<ol class=\"citations\">\n");
        for citation in &view.citations {
            let _ = writeln!(
                out,
                "<li>{} <span class=\"kind\">{}</span></li>",
                escape(&citation.title),
                escape(&citation.kind)
            );
        }
        out.push_str("</ol>\n");
    }
    out.push_str("</div>\n");
    out
}

pub fn rich_html(text: &RichText) -> String {
    let mut out = String::new();
    let mut in_list = false;
    for block in &text.blocks {
        let is_item = matches!(block, Block::ListItem { .. });
        if is_item && !in_list {
            out.push_str("<ul>");
        } else if !is_item && in_list {
            out.push_str("</ul>");
        }
        in_list = is_item;

        match block {
            Block::Paragraph(inlines) => {
                let _ = write!(out, "<p>{}</p>", inlines_html(inlines));
            }
            Block::Heading { level, inlines } => {
                let _ = write!(out, "<h{0}>{1}</h{0}>", level, inlines_html(inlines));
            }
            Block::ListItem { depth, inlines, .. } => {
                let _ = write!(out, "<li class=\"depth-{}\">{}</li>", depth, inlines_html(inlines));
            }
            Block::Quote(inlines) => {
                let _ = write!(out, "<blockquote>{}</blockquote>", inlines_html(inlines));
            }
            Block::Code(code) => {
                let _ = write!(out, "<pre><code>{}</code></pre>", escape(code));
            }
            Block::Rule => out.push_str("<hr>"),
        }
    }
    if in_list {
        out.push_str("</ul>");
    }
    out.push('\n');
    out
}

fn inlines_html(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        let mut text = escape(&inline.text).replace('\n', "<br>");
        if inline.style.code {
            text = format!("<code>{}</code>", text);
        }
        if inline.style.emphasis {
            text = format!("<em>{}</em>", text);
        }
        if inline.style.strong {
            text = format!("<strong>{}</strong>", text);
        }
        out.push_str(&text);
    }
    out
}

#[cfg(test)]
mod tests {
    use dc_base::types::{NarrativePayload, RetrievalPayload, SourceDoc};

    use super::*;
    use crate::render::{markdown, retrieval};

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(escape("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn script_never_appears_unescaped() {
        let mut region = OutputRegion::new();
        region.set_narrative(retrieval::render_narrative(&NarrativePayload {
            answer: "Hi <script>alert('x')</script> **there**".into(),
        }));
        region.push(Fragment::Retrieval(retrieval::render(&RetrievalPayload {
            answer: "<iframe src=evil>".into(),
            sources: vec![SourceDoc { title: Some("<b>doc</b>".into()), ..Default::default() }],
            synthetic: false,
        })));
        let html = document("<title>", &[("<q>", &region)]);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<iframe"));
        assert!(!html.contains("<b>doc"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<strong>there</strong>"));
    }

    #[test]
    fn list_items_are_wrapped() {
        let html = rich_html(&markdown::parse("- a\n- b\n\nend"));
        assert_eq!(html.matches("<ul>").count(), 1);
        assert!(html.contains("</ul><p>end</p>"));
    }
}
