use std::io;
use thiserror::Error;

/// Reasons a document failed to parse.
///
/// Every variant except [`ParseError::Io`] is structural: the input does not
/// follow the title / description / articles layout. No partial document is
/// ever returned alongside an error.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input while looking for {expected}")]
    UnexpectedEof { expected: String },

    #[error("line {line}: expected {expected}, found {found:?}")]
    UnexpectedLine {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("divider {divider:?} not found before end of input")]
    MissingDivider { divider: String },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// True for failures caused by the shape of the input rather than the reader.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
