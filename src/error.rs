use std::fmt;
use thiserror::Error;

/// A 0-based position in the message text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// 0-based line number
    pub line: usize,
    /// 0-based column (character offset within the line)
    pub column: usize,
    /// 0-based absolute byte offset from the start of input
    pub offset: usize,
}

/// A parse error with span information (begin..end).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Machine-readable error code, e.g. `unclosed-tag`.
    pub code: &'static str,
    pub message: String,
    /// Start of the offending region
    pub begin: Position,
    /// End of the offending region (exclusive)
    pub end: Position,
}

impl ParseError {
    pub fn new(code: &'static str, message: String, begin: Position, end: Position) -> Self {
        ParseError {
            code,
            message,
            begin,
            end,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.begin == self.end {
            write!(
                f,
                "{}:{}: {} ({})",
                self.begin.line, self.begin.column, self.message, self.code
            )
        } else {
            write!(
                f,
                "{}:{}-{}:{}: {} ({})",
                self.begin.line,
                self.begin.column,
                self.end.line,
                self.end.column,
                self.message,
                self.code
            )
        }
    }
}

impl std::error::Error for ParseError {}

/// Failure of the template compiler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A `#` was reached with no enclosing plural value in scope.
    #[error("Pound sign used outside of plural/select element")]
    PoundOutsideContext,
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Parse(err) => err.code,
            CompileError::PoundOutsideContext => "pound-outside-context",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize, offset: usize) -> Position {
        Position {
            line,
            column,
            offset,
        }
    }

    #[test]
    fn display_point_error() {
        let err = ParseError::new(
            "unclosed-tag",
            "Unclosed tag <b>".to_string(),
            pos(0, 3, 3),
            pos(0, 3, 3),
        );
        assert_eq!(err.to_string(), "0:3: Unclosed tag <b> (unclosed-tag)");
    }

    #[test]
    fn display_span_error() {
        let err = ParseError::new(
            "duplicate-option",
            "Duplicate option \"a\"".to_string(),
            pos(1, 2, 10),
            pos(1, 5, 13),
        );
        assert_eq!(
            err.to_string(),
            "1:2-1:5: Duplicate option \"a\" (duplicate-option)"
        );
    }

    #[test]
    fn compile_error_wraps_parse_error() {
        let parse = ParseError::new(
            "empty-argument",
            "Empty argument".to_string(),
            pos(0, 0, 0),
            pos(0, 2, 2),
        );
        let err: CompileError = parse.clone().into();
        assert_eq!(err.code(), "empty-argument");
        assert_eq!(err.to_string(), parse.to_string());
        assert_eq!(
            CompileError::PoundOutsideContext.to_string(),
            "Pound sign used outside of plural/select element"
        );
    }
}
