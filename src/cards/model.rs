//! Forward card data model: the presentation document rebroadcast to group
//! chats, and its interactive-card wire form.

use serde::{Serialize, Serializer};

use crate::error::ConfigError;

/// Alt text attached to every image element.
const IMAGE_ALT: &str = "image";

/// Header templates offered by the Lark card schema, in palette order.
pub const DEFAULT_THEMES: &[&str] = &[
    "blue",
    "wathet",
    "turquoise",
    "green",
    "yellow",
    "orange",
    "red",
    "carmine",
    "violet",
    "purple",
    "indigo",
    "grey",
];

/// Fixed, ordered, non-empty list of theme tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePalette(Vec<String>);

impl ThemePalette {
    pub fn new(themes: Vec<String>) -> Result<Self, ConfigError> {
        if themes.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "CARD_THEMES".into(),
                message: "theme palette must not be empty".into(),
            });
        }
        Ok(Self(themes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Theme at `index`, wrapping around the palette.
    pub fn get(&self, index: usize) -> &str {
        &self.0[index % self.0.len()]
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self(DEFAULT_THEMES.iter().map(|t| t.to_string()).collect())
    }
}

/// A single block of card body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardBlock {
    /// Lark-flavoured markdown.
    Text { markdown: String },
    Image { key: String },
}

impl CardBlock {
    pub fn text(markdown: impl Into<String>) -> Self {
        Self::Text {
            markdown: markdown.into(),
        }
    }

    pub fn image(key: impl Into<String>) -> Self {
        Self::Image { key: key.into() }
    }
}

/// A card rebuilt from a submission for rebroadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardCard {
    pub theme: String,
    pub header_title: String,
    pub blocks: Vec<CardBlock>,
}

// ── Wire form ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct WireCard<'a> {
    config: WireConfig,
    header: WireHeader<'a>,
    elements: Vec<WireElement<'a>>,
}

#[derive(Serialize)]
struct WireConfig {
    wide_screen_mode: bool,
}

#[derive(Serialize)]
struct WireHeader<'a> {
    template: &'a str,
    title: PlainText<'a>,
}

#[derive(Serialize)]
struct PlainText<'a> {
    content: &'a str,
    tag: &'static str,
}

impl<'a> PlainText<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            tag: "plain_text",
        }
    }
}

#[derive(Serialize)]
struct LarkMarkdown<'a> {
    tag: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
enum WireElement<'a> {
    Div {
        text: LarkMarkdown<'a>,
    },
    Img {
        img_key: &'a str,
        alt: PlainText<'a>,
    },
}

impl<'a> From<&'a CardBlock> for WireElement<'a> {
    fn from(block: &'a CardBlock) -> Self {
        match block {
            CardBlock::Text { markdown } => Self::Div {
                text: LarkMarkdown {
                    tag: "lark_md",
                    content: markdown,
                },
            },
            CardBlock::Image { key } => Self::Img {
                img_key: key,
                alt: PlainText::new(IMAGE_ALT),
            },
        }
    }
}

impl Serialize for ForwardCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireCard {
            config: WireConfig {
                wide_screen_mode: true,
            },
            header: WireHeader {
                template: &self.theme,
                title: PlainText::new(&self.header_title),
            },
            elements: self.blocks.iter().map(WireElement::from).collect(),
        }
        .serialize(serializer)
    }
}
