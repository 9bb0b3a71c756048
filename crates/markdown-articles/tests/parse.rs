use markdown_articles::{parse_document, parse_str, Document, ParseError, ParserOptions, Section};
use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;

fn parse_fixture(name: &str, options: &ParserOptions) -> Result<Document, ParseError> {
    let path = PathBuf::from("tests/markdown").join(name);
    let file = File::open(path).unwrap();
    parse_document(BufReader::new(file), options)
}

fn section(title: &str, body: &str) -> Section {
    Section {
        title: title.to_string(),
        body: body.to_string(),
    }
}

const DESCRIPTION: &str = "Yep, you guessed it; this is for testing.\n\n";

#[test]
fn should_parse_title_description_and_articles() {
    // Given
    let input = "# T\n\nD\n\n## Jetpacks\n\n## A1\n\nbody1\n\n## A2\n\nbody2\n";

    // When
    let document = parse_str(input, &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(
        document,
        Document {
            title: "T".to_string(),
            description: "D\n\n".to_string(),
            sections: vec![section("A1", "body1\n\n"), section("A2", "body2\n")],
        }
    );
}

#[test]
fn should_capture_last_article_at_end_of_input() {
    // When
    let document = parse_fixture("two_articles.md", &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(document.title, "Test Jetpack Articles");
    assert_eq!(document.description, DESCRIPTION);
    assert_eq!(
        document.sections,
        vec![
            section("Test article 1", "The first test article\n\n"),
            section("Test article 2", "The second test article\n"),
        ]
    );
}

#[test]
fn should_skip_blank_line_padding() {
    // When
    let document = parse_fixture("padded_blank_lines.md", &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(document.description, DESCRIPTION);
    assert_eq!(
        document.sections,
        vec![section(
            "Test article 4",
            "### The first test article\n\nWould you believe it?\n\n"
        )]
    );
}

#[test]
fn should_treat_whitespace_only_lines_as_blank() {
    // Given
    let input = "# T\n \t\nD\n## Jetpacks\n\t\n## A\n  \n\t\nbody\n";

    // When
    let document = parse_str(input, &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(
        document,
        Document {
            title: "T".to_string(),
            description: "D\n".to_string(),
            sections: vec![section("A", "body\n")],
        }
    );
}

#[test]
fn should_keep_headings_inside_code_blocks_in_body() {
    // When
    let document = parse_fixture("heading_in_code_block.md", &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(document.sections.len(), 1);
    assert_eq!(
        document.sections[0].body,
        "### The first test article\n\nWould you believe it?\n\n```\n\n\
         This is a test to handle code blocks,\n\n\
         ## This mock heading should not be mistaken as an actual heading\n\n```\n\n"
    );
}

#[test]
fn should_fail_when_divider_is_missing() {
    // When
    let err = parse_fixture("missing_divider.md", &ParserOptions::default()).unwrap_err();

    // Then
    assert!(matches!(err, ParseError::MissingDivider { ref divider } if divider == "## Jetpacks"));
    assert!(err.is_structural());
}

#[test]
fn should_accept_document_without_articles() {
    // When
    let document = parse_fixture("no_articles.md", &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(document.description, "Nothing published yet.\n\n");
    assert!(document.sections.is_empty());
}

#[test]
fn should_honor_configured_section_depth() {
    // Given
    let options = ParserOptions::default().with_section_prefix("### ");

    // When
    let document = parse_fixture("nested_articles.md", &options).unwrap();

    // Then
    assert_eq!(
        document.sections,
        vec![
            section("First", "## Not an article boundary\n\n"),
            section("Second", "```sh\n### not a boundary either\n```\n"),
        ]
    );
}

#[test]
fn should_return_same_document_for_same_input() {
    // Given
    let options = ParserOptions::default();

    // When
    let first = parse_fixture("heading_in_code_block.md", &options).unwrap();
    let second = parse_fixture("heading_in_code_block.md", &options).unwrap();

    // Then
    assert_eq!(first, second);
}

#[test]
fn should_keep_article_count_and_order() {
    // Given
    let mut input = String::from("# Title\n\nAbout.\n\n## Jetpacks\n");
    for idx in 0..25 {
        input.push_str(&format!("\n## Article {idx}\n\nBody {idx}.\n"));
    }

    // When
    let document = parse_str(&input, &ParserOptions::default()).unwrap();

    // Then
    let titles: Vec<_> = document.sections.iter().map(|s| s.title.clone()).collect();
    let expected: Vec<_> = (0..25).map(|idx| format!("Article {idx}")).collect();
    assert_eq!(titles, expected);
    assert_eq!(document.sections[24].body, "Body 24.\n");
}

#[test]
fn should_reject_stray_text_before_title() {
    // Given
    let input = "preamble\n# Title\n\n## Jetpacks\n";

    // When
    let err = parse_str(input, &ParserOptions::default()).unwrap_err();

    // Then
    match err {
        ParseError::UnexpectedLine { line, found, .. } => {
            assert_eq!(line, 1);
            assert_eq!(found, "preamble");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn should_reject_empty_input() {
    let err = parse_str("", &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedEof { .. }));
}

#[test]
fn should_keep_empty_article_followed_by_another() {
    // Given
    let input = "# T\n\n## Jetpacks\n\n## Empty\n\n## Full\nText\n";

    // When
    let document = parse_str(input, &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(document.description, "");
    assert_eq!(
        document.sections,
        vec![section("Empty", ""), section("Full", "Text\n")]
    );
}

#[test]
fn should_handle_windows_line_endings() {
    // Given
    let input = "# T\r\n\r\nD\r\n## Jetpacks\r\n## A\r\nbody\r\n";

    // When
    let document = parse_str(input, &ParserOptions::default()).unwrap();

    // Then
    assert_eq!(document.title, "T");
    assert_eq!(document.description, "D\n");
    assert_eq!(document.sections, vec![section("A", "body\n")]);
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream dropped"))
    }
}

impl BufRead for FailingReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream dropped"))
    }

    fn consume(&mut self, _amt: usize) {}
}

#[test]
fn should_surface_reader_failures_as_io_errors() {
    // When
    let err = parse_document(FailingReader, &ParserOptions::default()).unwrap_err();

    // Then
    assert!(matches!(err, ParseError::Io(_)));
    assert!(!err.is_structural());
}
