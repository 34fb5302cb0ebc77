//! The parser's closed error taxonomy.
//!
//! Parser errors are collected, never fatal: [`crate::parser::parse`] always
//! returns a complete [`crate::ast::Ast`] alongside a (possibly empty)
//! `Vec<ParseError>`. Each error carries enough context — span, source
//! line, and the token it was reported against — to render a precise
//! diagnostic without re-walking the token stream.

use gotmpl_base::Span;
use std::fmt;

/// The fixed set of syntax failures the parser can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A lexer-level failure (unterminated string or comment) promoted
    /// into the parser's error list.
    Syntax { detail: String },
    /// `if`/`range`/`with` with an empty pipe.
    MissingValue { keyword: &'static str },
    /// `{{end}}` with no matching open block.
    UnexpectedEnd,
    /// The file ended with one or more blocks still open. Always the last
    /// error in the list when present.
    UnexpectedEof,
    /// An action's `{{` was never followed by a closing `}}`/`-}}`.
    UnclosedDelimiter,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::Syntax { detail } => write!(f, "syntax error: {detail}"),
            ParseErrorKind::MissingValue { keyword } => write!(f, "missing value for {keyword}"),
            ParseErrorKind::UnexpectedEnd => write!(f, "unexpected {{{{end}}}}"),
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of file, unclosed block"),
            ParseErrorKind::UnclosedDelimiter => write!(f, "unclosed action delimiter"),
        }
    }
}

/// One reported parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub line: u32,
    /// The exact text of the token the error was reported against, when
    /// one exists (absent for e.g. `UnexpectedEof`, which has no token).
    pub surrounding_token: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, line: u32, surrounding_token: Option<String>) -> Self {
        ParseError { kind, span, line, surrounding_token }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{} (line {})", self.kind, self.span.offset, self.span.end(), self.line)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_span_and_line() {
        let err = ParseError::new(ParseErrorKind::UnexpectedEnd, Span::new(20, 8), 2, Some("{{end}}".into()));
        let rendered = err.to_string();
        assert!(rendered.contains("20..28"));
        assert!(rendered.contains("line 2"));
    }

    #[test]
    fn missing_value_names_the_keyword() {
        let err = ParseErrorKind::MissingValue { keyword: "if" };
        assert_eq!(err.to_string(), "missing value for if");
    }
}
