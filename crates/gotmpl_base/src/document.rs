//! Byte offset ↔ line/column conversion over immutable template text.
//!
//! A [`Document`] wraps the raw UTF-8 bytes of one opened template file and
//! a precomputed line-start index, giving O(log N) conversion between byte
//! offsets and 1-based `(line, column)` pairs. Offsets are 0-based
//! everywhere inside the core; only [`Document::offset_to_line_col`] and
//! [`Document::line_col_to_offset`] cross into the 1-based convention used
//! at the editor-facing boundary.
//!
//! Columns count bytes (not UTF-16 or codepoints) after the preceding
//! newline, plus one. This keeps the conversion a pure function of the byte
//! index, with no dependency on any transport-level position encoding.

use crate::span::Span;
use std::fmt;

/// A document is immutable once constructed; edits produce a new `Document`
/// rather than mutating this one in place (see [`Document::replace`]).
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    /// Byte offset of each line start. `line_starts[0]` is always 0.
    line_starts: Vec<u32>,
}

/// Errors produced when a caller asks about a position outside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
    /// The requested byte offset or line exceeds the document's bounds.
    RangeOutOfBounds,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::RangeOutOfBounds => write!(f, "position is out of the document's range"),
        }
    }
}

impl std::error::Error for DocumentError {}

impl Document {
    /// Builds a document over `text`, indexing every line start.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        log::trace!("indexed document: {} bytes, {} lines", text.len(), line_starts.len());
        Document { text, line_starts }
    }

    /// Replaces this document's text wholesale, re-indexing line starts.
    ///
    /// Matches §3's lifecycle contract: edits invalidate the AST and
    /// semantic model as a unit, never patch them incrementally.
    pub fn replace(&mut self, text: impl Into<String>) {
        *self = Document::new(text);
    }

    /// The document's full source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the document in bytes.
    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the raw bytes covered by `span`, or `None` if it runs past
    /// the end of the document.
    pub fn slice(&self, span: Span) -> Option<&str> {
        self.text.get(span.offset as usize..span.end().min(self.len()) as usize)
    }

    /// Converts a byte offset to a 1-based `(line, column)` pair.
    ///
    /// For empty text, offset 0 maps to `(1, 1)`.
    pub fn offset_to_line_col(&self, offset: u32) -> Result<(u32, u32), DocumentError> {
        if offset as usize > self.text.len() {
            return Err(DocumentError::RangeOutOfBounds);
        }
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line_idx];
        let column = offset - line_start + 1;
        Ok((line_idx as u32 + 1, column))
    }

    /// Converts a 1-based `(line, column)` pair back to a byte offset.
    pub fn line_col_to_offset(&self, line: u32, column: u32) -> Result<u32, DocumentError> {
        if line == 0 || column == 0 {
            return Err(DocumentError::RangeOutOfBounds);
        }
        let line_idx = (line - 1) as usize;
        let line_start = *self
            .line_starts
            .get(line_idx)
            .ok_or(DocumentError::RangeOutOfBounds)?;
        let line_end = self
            .line_starts
            .get(line_idx + 1)
            .copied()
            .unwrap_or_else(|| self.len());
        let offset = line_start + (column - 1);
        if offset > line_end {
            return Err(DocumentError::RangeOutOfBounds);
        }
        Ok(offset)
    }

    /// Byte offset of the start of `line` (1-based). Clamps to the
    /// document length if `line` is out of bounds.
    pub fn line_start_offset(&self, line: u32) -> u32 {
        self.line_starts
            .get((line.saturating_sub(1)) as usize)
            .copied()
            .unwrap_or_else(|| self.len())
    }

    /// Returns `true` if `a` and `b` overlap, delegating to [`Span::overlaps`].
    ///
    /// Exposed alongside the document so callers needn't import `Span`
    /// separately for the common "does this span cover the caret" check.
    pub fn overlap(&self, a: Span, b: Span) -> bool {
        a.overlaps(&b)
    }
}
