//! Markdown outline used by the scoring criteria.
//!
//! The document is reduced to its headings and a flat list of body blocks,
//! each tagged with the heading it sits under.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 1 to 6
    pub level: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    ListItem,
    CodeBlock { language: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Prose text, or the raw content of a code block
    pub text: String,
    /// Inline code spans inside the block
    pub inline_code: Vec<String>,
    /// Index of the nearest preceding heading; `None` before the first heading
    pub section: Option<usize>,
}

impl Block {
    pub fn words(&self) -> usize {
        match self.kind {
            BlockKind::CodeBlock { .. } => 0,
            _ => count_words(&self.text),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self.kind, BlockKind::CodeBlock { .. })
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Headings and body blocks of a markdown document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOutline {
    pub headings: Vec<Heading>,
    pub blocks: Vec<Block>,
}

#[derive(Default)]
struct OpenBlock {
    text: String,
    inline_code: Vec<String>,
}

impl OpenBlock {
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push_break(&mut self) {
        self.text.push(' ');
    }
}

impl DocumentOutline {
    pub fn parse(markdown: &str) -> Self {
        let mut outline = DocumentOutline::default();

        let mut heading: Option<(usize, String)> = None;
        let mut paragraph: Option<OpenBlock> = None;
        let mut items: Vec<OpenBlock> = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading = Some((level as usize, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = heading.take() {
                        outline.headings.push(Heading {
                            level,
                            text: text.trim().to_string(),
                        });
                    }
                }
                Event::Start(Tag::Paragraph) if items.is_empty() => {
                    paragraph = Some(OpenBlock::default());
                }
                Event::End(TagEnd::Paragraph) => {
                    if let Some(block) = paragraph.take() {
                        outline.close(BlockKind::Paragraph, block);
                    }
                }
                Event::Start(Tag::Item) => items.push(OpenBlock::default()),
                Event::End(TagEnd::Item) => {
                    if let Some(block) = items.pop() {
                        outline.close(BlockKind::ListItem, block);
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_ascii_lowercase()),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((language, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((language, content)) = code.take() {
                        outline.close(
                            BlockKind::CodeBlock { language },
                            OpenBlock {
                                text: content,
                                inline_code: Vec::new(),
                            },
                        );
                    }
                }
                Event::Text(text) => {
                    if let Some((_, content)) = code.as_mut() {
                        content.push_str(&text);
                    } else if let Some((_, title)) = heading.as_mut() {
                        title.push_str(&text);
                    } else if let Some(item) = items.last_mut() {
                        item.push_text(&text);
                    } else if let Some(block) = paragraph.as_mut() {
                        block.push_text(&text);
                    }
                }
                Event::Code(span) => {
                    if let Some((_, title)) = heading.as_mut() {
                        title.push_str(&span);
                    } else if let Some(block) = items.last_mut().or(paragraph.as_mut()) {
                        block.push_text(&span);
                        block.inline_code.push(span.to_string());
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some((_, title)) = heading.as_mut() {
                        title.push(' ');
                    } else if let Some(block) = items.last_mut().or(paragraph.as_mut()) {
                        block.push_break();
                    }
                }
                _ => {}
            }
        }

        outline
    }

    fn close(&mut self, kind: BlockKind, block: OpenBlock) {
        let empty_prose = !matches!(kind, BlockKind::CodeBlock { .. }) && block.text.trim().is_empty();
        if empty_prose && block.inline_code.is_empty() {
            return;
        }
        self.blocks.push(Block {
            kind,
            text: block.text,
            inline_code: block.inline_code,
            section: self.headings.len().checked_sub(1),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.headings.is_empty() && self.blocks.is_empty()
    }

    /// Headings enclosing `section`, innermost first
    pub fn ancestry(&self, section: Option<usize>) -> Vec<&Heading> {
        let Some(index) = section else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut level = usize::MAX;
        for heading in self.headings[..=index].iter().rev() {
            if heading.level < level {
                chain.push(heading);
                level = heading.level;
            }
        }
        chain
    }

    /// Whether any heading around `section` satisfies `predicate`
    pub fn under(&self, section: Option<usize>, predicate: impl Fn(&str) -> bool) -> bool {
        self.ancestry(section)
            .iter()
            .any(|heading| predicate(&heading.text))
    }

    /// Blocks inside the section opened by heading `index`, subsections included
    pub fn section_blocks(&self, index: usize) -> impl Iterator<Item = &Block> {
        let end = self.section_end(index);
        self.blocks
            .iter()
            .filter(move |block| block.section.is_some_and(|s| s >= index && s < end))
    }

    /// Whether heading `index` has nested sub-headings
    pub fn has_subheadings(&self, index: usize) -> bool {
        self.section_end(index) > index + 1
    }

    /// Index of the first heading after `index` that closes its section
    fn section_end(&self, index: usize) -> usize {
        let level = self.headings[index].level;
        self.headings[index + 1..]
            .iter()
            .position(|heading| heading.level <= level)
            .map_or(self.headings.len(), |offset| index + 1 + offset)
    }

    pub fn code_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|block| block.is_code())
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .filter(|block| block.kind == BlockKind::Paragraph)
    }

    /// Prose words across headings, paragraphs and list items
    pub fn word_count(&self) -> usize {
        let heading_words: usize = self.headings.iter().map(|h| count_words(&h.text)).sum();
        let body_words: usize = self.blocks.iter().map(Block::words).sum();
        heading_words + body_words
    }
}
