use std::io::{self, BufRead};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub text: String,
    pub number: usize,
}

impl LineRecord {
    /// True when the line holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Forward-only cursor over the lines of a reader.
///
/// The scanner holds at most one pending line. Callers prime it with
/// [`LineScanner::advance`] and inspect the pending line through
/// [`LineScanner::current`]; a line stays pending until the next `advance`.
pub struct LineScanner<R> {
    reader: R,
    buffer: String,
    current: Option<LineRecord>,
    line_number: usize,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            current: None,
            line_number: 0,
        }
    }

    /// Moves to the next line. Returns `Ok(false)` once the input is exhausted.
    pub fn advance(&mut self) -> io::Result<bool> {
        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            self.current = None;
            return Ok(false);
        }

        let mut line = self.buffer.clone();

        if line.ends_with('\n') {
            line.pop();

            if line.ends_with('\r') {
                line.pop();
            }
        }

        self.line_number += 1;
        self.current = Some(LineRecord {
            text: line,
            number: self.line_number,
        });
        Ok(true)
    }

    pub fn current(&self) -> Option<&LineRecord> {
        self.current.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    /// Number of the last line read, or the count of lines once exhausted.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Advances past blank and whitespace-only lines, stopping on the first
    /// line with content or at end of input.
    pub fn skip_blank_run(&mut self) -> io::Result<()> {
        while self.current.as_ref().is_some_and(LineRecord::is_blank) {
            self.advance()?;
        }
        Ok(())
    }
}
