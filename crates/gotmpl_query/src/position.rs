//! Byte-offset ↔ `lsp_types::Position` conversion.
//!
//! [`gotmpl_base::Document`] already tracks 1-based, byte-counted
//! `(line, column)` pairs; LSP wants 0-based lines and UTF-16 code unit
//! columns. This module is the one place that bridges the two.

use gotmpl_base::{Document, Span};
use lsp_types::{Position, Range};

pub fn to_position(document: &Document, offset: u32) -> Position {
    let offset = offset.min(document.len());
    let (line, _byte_column) = document
        .offset_to_line_col(offset)
        .unwrap_or((1, 1));
    let line_start = document.line_start_offset(line);
    let character = document
        .slice(Span::from_range(line_start, offset))
        .map(|prefix| prefix.encode_utf16().count() as u32)
        .unwrap_or(0);
    Position { line: line - 1, character }
}

pub fn to_range(document: &Document, span: Span) -> Range {
    Range { start: to_position(document, span.offset), end: to_position(document, span.end()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_offsets() {
        let doc = Document::new("hello world");
        assert_eq!(to_position(&doc, 0), Position { line: 0, character: 0 });
        assert_eq!(to_position(&doc, 5), Position { line: 0, character: 5 });
    }

    #[test]
    fn multi_line_offsets() {
        let doc = Document::new("abc\ndef\nghi");
        assert_eq!(to_position(&doc, 4), Position { line: 1, character: 0 });
        assert_eq!(to_position(&doc, 7), Position { line: 1, character: 3 });
    }

    #[test]
    fn multibyte_utf8_counts_utf16_units() {
        let doc = Document::new("café\nworld");
        assert_eq!(to_position(&doc, 3), Position { line: 0, character: 3 });
        let world_offset = doc.text().find("world").unwrap() as u32;
        assert_eq!(to_position(&doc, world_offset), Position { line: 1, character: 0 });
    }

    #[test]
    fn range_covers_a_span() {
        let doc = Document::new("{{.Name}}");
        let range = to_range(&doc, Span::new(2, 5));
        assert_eq!(range.start, Position { line: 0, character: 2 });
        assert_eq!(range.end, Position { line: 0, character: 7 });
    }
}
