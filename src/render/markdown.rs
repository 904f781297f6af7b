//! Markdown to [`RichText`] using pulldown-cmark.
//!
//! Raw HTML in the source is kept as literal text, so nothing the agent or a
//! retrieved document sends can reach a surface as live markup.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::fragment::{Block, Inline, InlineStyle, RichText};

pub fn parse(source: &str) -> RichText {
    let mut builder = Builder::default();
    for event in Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH) {
        builder.event(event);
    }
    builder.finish()
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    strong: usize,
    emphasis: usize,
    heading: Option<u8>,
    /// Next number per open list; `None` for bullet lists
    lists: Vec<Option<u64>>,
    item: Option<(usize, String)>,
    quote_depth: usize,
    code: Option<String>,
}

impl Builder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code.as_mut() {
                Some(code) => code.push_str(&text),
                None => self.push_text(&text, false),
            },
            Event::Code(text) => self.push_text(&text, true),
            Event::Html(text) | Event::InlineHtml(text) => self.push_text(&text, false),
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(done) => self.push_text(if done { "[x] " } else { "[ ] " }, false),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(heading_level(level));
            }
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}.", n);
                        *n += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                self.item = Some((depth, marker));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::HtmlBlock => self.flush(),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.blocks.push(Block::Code(code.trim_end_matches('\n').to_string()));
                }
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        let style = InlineStyle { strong: self.strong > 0, emphasis: self.emphasis > 0, code };
        match self.inlines.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.inlines.push(Inline { text: text.to_string(), style }),
        }
    }

    /// Close the pending run of inlines as a block of the current kind.
    fn flush(&mut self) {
        if self.inlines.is_empty() {
            return;
        }
        let inlines = std::mem::take(&mut self.inlines);
        let block = if let Some(level) = self.heading.take() {
            Block::Heading { level, inlines }
        } else if let Some((depth, marker)) = self.item.take() {
            Block::ListItem { depth, marker, inlines }
        } else if self.quote_depth > 0 {
            Block::Quote(inlines)
        } else {
            Block::Paragraph(inlines)
        };
        self.blocks.push(block);
    }

    fn finish(mut self) -> RichText {
        self.flush();
        if let Some(code) = self.code.take() {
            self.blocks.push(Block::Code(code));
        }
        RichText { blocks: self.blocks }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
