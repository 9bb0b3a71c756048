use crate::error::{ParseError, ParseResult};
use crate::line::LineScanner;
use std::io::BufRead;

/// Finds the next heading that starts with `prefix` and returns its title.
///
/// Blank and whitespace-only lines before the heading are skipped. Any other
/// line that does not carry the prefix is rejected rather than passed over.
/// On success the scanner is left on the line after the heading.
pub fn parse_heading<R: BufRead>(scanner: &mut LineScanner<R>, prefix: &str) -> ParseResult<String> {
    scanner.skip_blank_run()?;

    let line = scanner.current().ok_or_else(|| ParseError::UnexpectedEof {
        expected: describe_heading(prefix),
    })?;

    let title = match line.text.strip_prefix(prefix) {
        Some(rest) => rest.to_string(),
        None => {
            return Err(ParseError::UnexpectedLine {
                line: line.number,
                expected: describe_heading(prefix),
                found: line.text.clone(),
            })
        }
    };

    scanner.advance()?;
    Ok(title)
}

fn describe_heading(prefix: &str) -> String {
    format!("heading starting with {prefix:?}")
}
