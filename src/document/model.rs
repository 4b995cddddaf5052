//! Rich document model and the single decode routine shared by the
//! submission predicate and the submission handler.
//!
//! Raw form: `{"title": "...", "content": [[{"tag": "text"|"img"|"a", ...}]]}`.
//! Elements with any other tag (mentions, emoji, media) are dropped.

use serde::Deserialize;

use crate::error::DecodeError;

/// One inline element of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineElement {
    TextRun { text: String, bold: bool },
    Image { key: String },
    Link { text: String, href: String },
}

impl InlineElement {
    /// Plain (non-bold) text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextRun {
            text: text.into(),
            bold: false,
        }
    }

    /// Bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::TextRun {
            text: text.into(),
            bold: true,
        }
    }

    pub fn image(key: impl Into<String>) -> Self {
        Self::Image { key: key.into() }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self::Link {
            text: text.into(),
            href: href.into(),
        }
    }
}

/// A line is an ordered run of inline elements; it may be empty.
pub type Line = Vec<InlineElement>;

/// A decoded rich-text document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichDocument {
    /// The top-level `title` field of the payload (not the extracted title).
    pub declared_title: String,
    pub lines: Vec<Line>,
}

impl RichDocument {
    pub fn new(declared_title: impl Into<String>, lines: Vec<Line>) -> Self {
        Self {
            declared_title: declared_title.into(),
            lines,
        }
    }
}

// ── Wire form ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    title: String,
    content: Vec<Vec<RawElement>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "tag")]
enum RawElement {
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(default)]
        style: Vec<String>,
    },
    #[serde(rename = "img")]
    Img { image_key: String },
    #[serde(rename = "a")]
    Anchor { text: String, href: String },
    #[serde(other)]
    Unsupported,
}

impl RawElement {
    fn into_inline(self) -> Option<InlineElement> {
        match self {
            Self::Text { text, style } => Some(InlineElement::TextRun {
                bold: style.iter().any(|s| s == "bold"),
                text,
            }),
            Self::Img { image_key } => Some(InlineElement::Image { key: image_key }),
            Self::Anchor { text, href } => Some(InlineElement::Link { text, href }),
            Self::Unsupported => None,
        }
    }
}

/// Decode raw post content into a [`RichDocument`].
///
/// Pure and idempotent; the same bytes always yield the same document.
pub fn decode(raw: impl AsRef<[u8]>) -> Result<RichDocument, DecodeError> {
    let raw: RawDocument = serde_json::from_slice(raw.as_ref())?;
    let lines = raw
        .content
        .into_iter()
        .map(|line| line.into_iter().filter_map(RawElement::into_inline).collect())
        .collect();
    Ok(RichDocument {
        declared_title: raw.title,
        lines,
    })
}
