//! Rich-text ("post") documents: the typed model, its decoder, and the
//! submission title/body extraction rules.

pub mod model;
pub mod parser;

pub use model::{InlineElement, Line, RichDocument, decode};
pub use parser::{ParsedSubmission, UNTITLED, extract_body, extract_title, parse_submission};
