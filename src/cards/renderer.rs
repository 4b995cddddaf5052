//! Renders a rich document into a [`ForwardCard`].

use rand::Rng;

use crate::cards::model::{CardBlock, ForwardCard, ThemePalette};
use crate::document::{InlineElement, RichDocument, extract_title};

/// Body used when a document renders to nothing.
pub const NO_CONTENT: &str = "(no content)";

/// Source of the theme index for each render.
pub trait ThemePicker: Send + Sync {
    /// Index into a palette of `len` themes (`len > 0`).
    fn pick(&self, len: usize) -> usize;
}

/// Uniform draw from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTheme;

impl ThemePicker for RandomTheme {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always the same palette slot.
#[derive(Debug, Clone, Copy)]
pub struct FixedTheme(pub usize);

impl ThemePicker for FixedTheme {
    fn pick(&self, _len: usize) -> usize {
        self.0
    }
}

/// Builds forward cards from documents. Holds no mutable state.
pub struct CardRenderer {
    palette: ThemePalette,
    picker: Box<dyn ThemePicker>,
}

impl CardRenderer {
    pub fn new(palette: ThemePalette, picker: Box<dyn ThemePicker>) -> Self {
        Self { palette, picker }
    }

    /// Renderer over the default palette with a random theme per card.
    pub fn random() -> Self {
        Self::new(ThemePalette::default(), Box::new(RandomTheme))
    }

    pub fn render(&self, doc: &RichDocument) -> ForwardCard {
        let theme = self.palette.get(self.picker.pick(self.palette.len()));
        ForwardCard {
            theme: theme.to_string(),
            header_title: extract_title(doc),
            blocks: render_blocks(doc),
        }
    }
}

/// Walk the document, accumulating markdown and flushing it around images.
///
/// Lines with text or link content are newline-separated; the separator is
/// only emitted once more markdown follows, so blocks never end in `\n`.
pub fn render_blocks(doc: &RichDocument) -> Vec<CardBlock> {
    let mut blocks = Vec::new();
    let mut markdown = String::new();
    let mut pending_newline = false;

    for line in &doc.lines {
        let mut line_has_markdown = false;
        for element in line {
            match element {
                InlineElement::Image { key } => {
                    if !markdown.is_empty() {
                        blocks.push(CardBlock::text(std::mem::take(&mut markdown)));
                    }
                    pending_newline = false;
                    blocks.push(CardBlock::image(key.as_str()));
                }
                InlineElement::TextRun { text, bold } => {
                    if pending_newline {
                        markdown.push('\n');
                        pending_newline = false;
                    }
                    if *bold {
                        markdown.push_str(&format!("**{text}**"));
                    } else {
                        markdown.push_str(text);
                    }
                    line_has_markdown = true;
                }
                InlineElement::Link { text, href } => {
                    if pending_newline {
                        markdown.push('\n');
                        pending_newline = false;
                    }
                    markdown.push_str(&format!("[{text}]({href})"));
                    line_has_markdown = true;
                }
            }
        }
        if line_has_markdown && !markdown.is_empty() {
            pending_newline = true;
        }
    }

    if !markdown.is_empty() {
        blocks.push(CardBlock::text(markdown));
    }
    if blocks.is_empty() {
        blocks.push(CardBlock::text(NO_CONTENT));
    }
    blocks
}
