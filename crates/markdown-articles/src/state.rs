use crate::error::{ParseError, ParseResult};
use crate::heading::parse_heading;
use crate::line::LineScanner;
use crate::section::{parse_body, BodyEnd};
use crate::{Document, ParserOptions, Section};
use std::io::BufRead;
use std::mem;

/// Where the assembler is in the title / description / articles grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    ExpectTitle,
    ExpectDescription,
    ExpectArticleHeading,
    ExpectArticleBody { title: String },
    Done,
}

pub struct Assembler<'o> {
    options: &'o ParserOptions,
    stage: Stage,
    builder: DocumentBuilder,
}

impl<'o> Assembler<'o> {
    pub fn new(options: &'o ParserOptions) -> Self {
        Self {
            options,
            stage: Stage::ExpectTitle,
            builder: DocumentBuilder::default(),
        }
    }

    pub fn run<R: BufRead>(mut self, scanner: &mut LineScanner<R>) -> ParseResult<Document> {
        scanner.advance()?;

        loop {
            let next = match mem::replace(&mut self.stage, Stage::Done) {
                Stage::ExpectTitle => {
                    self.builder.title = parse_heading(scanner, &self.options.title_prefix)?;
                    Stage::ExpectDescription
                }
                Stage::ExpectDescription => {
                    scanner.skip_blank_run()?;
                    let parsed =
                        parse_body(scanner, &self.options.divider, &self.options.fence_marker)?;
                    if parsed.end == BodyEnd::Exhausted {
                        return Err(ParseError::MissingDivider {
                            divider: self.options.divider.clone(),
                        });
                    }
                    self.builder.description = parsed.body;
                    // The divider line itself is not kept.
                    scanner.advance()?;
                    Stage::ExpectArticleHeading
                }
                Stage::ExpectArticleHeading => {
                    scanner.skip_blank_run()?;
                    if scanner.is_exhausted() {
                        Stage::Done
                    } else {
                        let title = parse_heading(scanner, &self.options.section_prefix)?;
                        Stage::ExpectArticleBody { title }
                    }
                }
                Stage::ExpectArticleBody { title } => {
                    scanner.skip_blank_run()?;
                    let parsed = parse_body(
                        scanner,
                        &self.options.section_prefix,
                        &self.options.fence_marker,
                    )?;
                    self.builder.push_section(title, parsed.body);
                    match parsed.end {
                        BodyEnd::Heading => Stage::ExpectArticleHeading,
                        BodyEnd::Exhausted => Stage::Done,
                    }
                }
                Stage::Done => break,
            };
            self.stage = next;
        }

        Ok(self.builder.finish())
    }
}

#[derive(Default)]
struct DocumentBuilder {
    title: String,
    description: String,
    sections: Vec<Section>,
}

impl DocumentBuilder {
    fn push_section(&mut self, title: String, body: String) {
        self.sections.push(Section { title, body });
    }

    fn finish(self) -> Document {
        Document {
            title: self.title,
            description: self.description,
            sections: self.sections,
        }
    }
}
