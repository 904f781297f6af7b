//! Surface-independent presentation tree produced by the renderers.
//!
//! The terminal UI, the plain-text printer and the HTML exporter all consume
//! these types; none of them see raw payloads.

use dc_base::types::QualityClass;

// =============================================================================
// RICH TEXT (sanitized markdown)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InlineStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub code: bool,
}

/// A run of literal text. Never interpreted as markup by any surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Inline {
    pub text: String,
    pub style: InlineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, inlines: Vec<Inline> },
    ListItem { depth: usize, marker: String, inlines: Vec<Inline> },
    Quote(Vec<Inline>),
    Code(String),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichText {
    pub blocks: Vec<Block>,
}

impl RichText {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Concatenated text of every block, one line per block.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Paragraph(inlines) | Block::Quote(inlines) | Block::Heading { inlines, .. } => {
                    inline_text(inlines)
                }
                Block::ListItem { marker, inlines, .. } => format!("{} {}", marker, inline_text(inlines)),
                Block::Code(code) => code.clone(),
                Block::Rule => "---".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn inline_text(inlines: &[Inline]) -> String {
    inlines.iter().map(|i| i.text.as_str()).collect()
}

// =============================================================================
// RESULT VIEWS
// =============================================================================

/// Circular gauge geometry plus formatted percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionView {
    pub class: QualityClass,
    pub class_label: &'static str,
    /// Probability of the predicted class, 0..=1
    pub fraction: f64,
    pub defect_percent: String,
    pub normal_percent: String,
    pub gauge_percent: String,
    pub circumference: f64,
    /// Filled arc length
    pub arc_length: f64,
    /// Stroke dash offset (`circumference - arc_length`)
    pub dash_offset: f64,
    pub confidence: Option<String>,
    pub model_version: Option<String>,
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceRow {
    pub rank: usize,
    pub feature: String,
    pub label: String,
    pub score: f64,
    /// Bar width relative to the largest score, 0..=100
    pub width_percent: u32,
    /// Score times 100 with one decimal, e.g. `"30.0%"`
    pub value: String,
    pub top: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceView {
    pub rows: Vec<ImportanceRow>,
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentCard {
    pub key: String,
    pub name: String,
    pub name_en: String,
    pub description: String,
    pub action: String,
    /// Top features that pointed at this subsystem
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub title: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalView {
    pub answer: RichText,
    pub citations: Vec<Citation>,
    pub synthetic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Apology,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// One rendered piece of a request's output region.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Prediction(PredictionView),
    Importance(ImportanceView),
    Equipment(Vec<EquipmentCard>),
    Retrieval(RetrievalView),
    Notice(Notice),
}

// =============================================================================
// OUTPUT REGION
// =============================================================================

/// The fragments belonging to one request, with a single narrative summary
/// slot kept at the top.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputRegion {
    narrative: Option<RichText>,
    fragments: Vec<Fragment>,
}

impl OutputRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the summary. There is never more than one.
    pub fn set_narrative(&mut self, text: RichText) {
        self.narrative = Some(text);
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    pub fn narrative(&self) -> Option<&RichText> {
        self.narrative.as_ref()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.narrative.is_none() && self.fragments.is_empty()
    }

    pub fn clear(&mut self) {
        self.narrative = None;
        self.fragments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> RichText {
        RichText {
            blocks: vec![Block::Paragraph(vec![Inline { text: text.into(), style: InlineStyle::default() }])],
        }
    }

    #[test]
    fn narrative_is_replaced_not_duplicated() {
        let mut region = OutputRegion::new();
        region.push(Fragment::Notice(Notice { level: NoticeLevel::Info, text: "x".into() }));
        region.set_narrative(para("first"));
        region.set_narrative(para("second"));
        assert_eq!(region.narrative().map(|n| n.plain_text()), Some("second".to_string()));
        assert_eq!(region.fragments().len(), 1);
    }

    #[test]
    fn clear_empties_region() {
        let mut region = OutputRegion::new();
        region.set_narrative(para("a"));
        region.clear();
        assert!(region.is_empty());
    }
}
