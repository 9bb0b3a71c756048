//! Parses a Markdown document laid out as a title, a description and a list
//! of articles.
//!
//! ```text
//! # Title
//!
//! Description paragraphs.
//!
//! ## Jetpacks
//!
//! ## First article
//!
//! Article body, may contain fenced code.
//! ```
//!
//! Everything between the title and the divider line is the description.
//! Every heading after the divider starts a new article whose body runs until
//! the next article heading or the end of input.

mod error;
mod heading;
mod line;
mod section;
mod state;

pub use error::{ParseError, ParseResult};
pub use heading::parse_heading;
pub use line::{LineRecord, LineScanner};
pub use section::{is_fence, parse_body, BodyEnd, ParsedBody};

use serde::{Deserialize, Serialize};
use state::Assembler;
use std::io::{BufRead, Cursor};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "mainTitle")]
    pub title: String,
    #[serde(rename = "mainDescription")]
    pub description: String,
    #[serde(rename = "articles")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(rename = "bodyMarkdown")]
    pub body: String,
}

/// Markers that shape the document grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Prefix of the document title line.
    pub title_prefix: String,
    /// Line that closes the description. Matched as a prefix.
    pub divider: String,
    /// Prefix of every article heading. Also ends the previous article body.
    pub section_prefix: String,
    /// Marker that opens and closes a verbatim code block.
    pub fence_marker: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            title_prefix: "# ".to_string(),
            divider: "## Jetpacks".to_string(),
            section_prefix: "## ".to_string(),
            fence_marker: "```".to_string(),
        }
    }
}

impl ParserOptions {
    pub fn with_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    pub fn with_divider(mut self, divider: impl Into<String>) -> Self {
        self.divider = divider.into();
        self
    }

    pub fn with_section_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.section_prefix = prefix.into();
        self
    }

    pub fn with_fence_marker(mut self, marker: impl Into<String>) -> Self {
        self.fence_marker = marker.into();
        self
    }
}

/// Parses a complete document from `reader`.
///
/// Any structural problem aborts the parse; there is no partial result.
pub fn parse_document<R: BufRead>(reader: R, options: &ParserOptions) -> ParseResult<Document> {
    let mut scanner = LineScanner::new(reader);
    Assembler::new(options).run(&mut scanner)
}

pub fn parse_str(input: &str, options: &ParserOptions) -> ParseResult<Document> {
    parse_document(Cursor::new(input.as_bytes()), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_service_field_names() {
        let document = Document {
            title: "T".to_string(),
            description: "D\n".to_string(),
            sections: vec![Section {
                title: "A".to_string(),
                body: "b\n".to_string(),
            }],
        };

        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "mainTitle": "T",
                "mainDescription": "D\n",
                "articles": [{ "title": "A", "bodyMarkdown": "b\n" }],
            })
        );
    }

    #[test]
    fn options_builders_override_defaults() {
        let options = ParserOptions::default()
            .with_section_prefix("### ")
            .with_divider("## Articles");

        assert_eq!(options.title_prefix, "# ");
        assert_eq!(options.divider, "## Articles");
        assert_eq!(options.section_prefix, "### ");
        assert_eq!(options.fence_marker, "```");
    }
}
