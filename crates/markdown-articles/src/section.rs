use crate::error::ParseResult;
use crate::line::LineScanner;
use std::io::BufRead;

/// How a body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEnd {
    /// A terminating heading is pending on the scanner.
    Heading,
    /// The input ran out. This is how the last article of a document ends.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBody {
    pub body: String,
    pub end: BodyEnd,
}

/// Collects lines until a top-level line starts with `terminator`.
///
/// Each collected line is followed by a single `\n`. Lines inside a fenced
/// block (opened and closed by `fence_marker`) never terminate the body. The
/// terminating line itself stays pending on the scanner.
pub fn parse_body<R: BufRead>(
    scanner: &mut LineScanner<R>,
    terminator: &str,
    fence_marker: &str,
) -> ParseResult<ParsedBody> {
    let mut context = BodyContext::new(fence_marker);

    loop {
        let Some(line) = scanner.current() else {
            return Ok(context.finish(BodyEnd::Exhausted));
        };

        if !context.in_code && line.text.starts_with(terminator) {
            return Ok(context.finish(BodyEnd::Heading));
        }

        context.push(&line.text);
        scanner.advance()?;
    }
}

struct BodyContext<'a> {
    fence_marker: &'a str,
    in_code: bool,
    body: String,
}

impl<'a> BodyContext<'a> {
    fn new(fence_marker: &'a str) -> Self {
        Self {
            fence_marker,
            in_code: false,
            body: String::new(),
        }
    }

    fn push(&mut self, text: &str) {
        if is_fence(text, self.fence_marker) {
            self.in_code = !self.in_code;
        }
        self.body.push_str(text);
        self.body.push('\n');
    }

    fn finish(self, end: BodyEnd) -> ParsedBody {
        ParsedBody {
            body: self.body,
            end,
        }
    }
}

/// A fence line starts with the marker after at most three columns of indent.
/// Anything after the marker (a language tag, usually) is ignored.
pub fn is_fence(line: &str, fence_marker: &str) -> bool {
    if fence_marker.is_empty() {
        return false;
    }

    let (indent_width, rest) = split_indent(line);
    indent_width <= 3 && rest.starts_with(fence_marker)
}

fn split_indent(line: &str) -> (usize, &str) {
    let mut width = 0usize;

    for (idx, ch) in line.char_indices() {
        match ch {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => return (width, &line[idx..]),
        }
    }

    (width, "")
}
