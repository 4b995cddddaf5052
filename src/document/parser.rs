//! Title/body extraction for submissions.

use crate::document::model::{InlineElement, Line, RichDocument};
use crate::error::ParseError;

/// Title used when the first line carries no text.
pub const UNTITLED: &str = "Untitled Submission";

/// Title and plain-text body of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubmission {
    pub title: String,
    pub body_text: String,
}

/// Concatenated text of a line's text runs; images and links are ignored.
fn line_text(line: &Line) -> String {
    line.iter()
        .filter_map(|element| match element {
            InlineElement::TextRun { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Extract the title: first non-empty bold run of the first line, else the
/// first line's text, else [`UNTITLED`].
pub fn extract_title(doc: &RichDocument) -> String {
    let Some(first) = doc.lines.first() else {
        return UNTITLED.to_string();
    };

    let bold = first.iter().find_map(|element| match element {
        InlineElement::TextRun { text, bold: true } if !text.is_empty() => Some(text.clone()),
        _ => None,
    });
    if let Some(title) = bold {
        return title;
    }

    let text = line_text(first);
    if text.is_empty() {
        UNTITLED.to_string()
    } else {
        text
    }
}

/// Extract the body: every line's text, newline-joined, no trailing newline.
pub fn extract_body(doc: &RichDocument) -> String {
    doc.lines.iter().map(line_text).collect::<Vec<_>>().join("\n")
}

/// Parse a document into a submission. Fails when the body has no text.
pub fn parse_submission(doc: &RichDocument) -> Result<ParsedSubmission, ParseError> {
    let body_text = extract_body(doc);
    if body_text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(ParsedSubmission {
        title: extract_title(doc),
        body_text,
    })
}
