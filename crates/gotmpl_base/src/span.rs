//! Source location tracking for diagnostics and hover.
//!
//! A [`Span`] represents a contiguous region of template source text using
//! byte offsets. Every token, AST node, and diagnostic in gotmpl carries a
//! span so editor requests can be answered precisely.
//!
//! # Byte Offsets
//!
//! Spans store a 0-based start offset and a length, both in bytes — not
//! characters. This matches Rust's string slicing semantics:
//! `&source[span.offset as usize..span.end() as usize]` extracts the text.
//!
//! # Example
//!
//! ```
//! use gotmpl_base::Span;
//!
//! let source = "{{.Name}}";
//! let span = Span::new(2, 5);
//!
//! assert_eq!(&source[span.offset as usize..span.end() as usize], ".Name");
//! assert_eq!(span.length, 5);
//! ```

/// A half-open byte range `[offset, offset + length)` in document text.
///
/// Spans are `Copy` and cheap to pass around. Use [`Span::merge`] to combine
/// spans when building compound nodes — the span of an `if` block is the
/// merge of its opening delimiter and its matching `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first byte (inclusive).
    pub offset: u32,
    /// Length of the span in bytes.
    pub length: u32,
}

impl Span {
    /// Creates a span from a byte offset and length.
    ///
    /// No validation is performed; `offset + length` may overflow a real
    /// document's length.
    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Creates a zero-length span at `offset`.
    pub fn point(offset: u32) -> Self {
        Self { offset, length: 0 }
    }

    /// Creates a span from inclusive `start`/exclusive `end` byte offsets.
    pub fn from_range(start: u32, end: u32) -> Self {
        Self {
            offset: start,
            length: end.saturating_sub(start),
        }
    }

    /// Byte offset one past the last byte covered by this span.
    pub fn end(&self) -> u32 {
        self.offset + self.length
    }

    /// Returns `true` if this span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Creates a span covering from the start of `self` to the end of `other`.
    pub fn merge(self, other: Span) -> Span {
        let start = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Span::from_range(start, end)
    }

    /// Returns `true` if `self` and `other` overlap.
    ///
    /// Two spans overlap iff either endpoint of one lies within the other's
    /// closed range. A zero-length span at offset `o` overlaps `[s, e)` iff
    /// `s <= o <= e`. This definition is symmetric: `a.overlaps(b) ==
    /// b.overlaps(a)`.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.offset <= other.end() && other.offset <= self.end()
    }

    /// Returns `true` if `offset` falls inside this span, under the same
    /// closed-range convention used by [`Span::overlaps`].
    pub fn contains_offset(&self, offset: u32) -> bool {
        self.overlaps(&Span::point(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_new_stores_offset_and_length() {
        let span = Span::new(5, 10);
        assert_eq!(span.offset, 5);
        assert_eq!(span.length, 10);
        assert_eq!(span.end(), 15);
    }

    #[test]
    fn span_default_is_zero() {
        let span = Span::default();
        assert_eq!(span.offset, 0);
        assert_eq!(span.length, 0);
    }

    #[test]
    fn span_from_range_computes_length() {
        let span = Span::from_range(5, 10);
        assert_eq!(span.offset, 5);
        assert_eq!(span.length, 5);
    }

    #[test]
    fn span_merge_combines_ranges() {
        let a = Span::new(5, 5); // [5, 10)
        let b = Span::new(8, 7); // [8, 15)
        let merged = a.merge(b);
        assert_eq!(merged.offset, 5);
        assert_eq!(merged.end(), 15);
    }

    #[test]
    fn span_is_empty_for_zero_length() {
        let empty = Span::new(5, 0);
        assert!(empty.is_empty());

        let nonempty = Span::new(5, 5);
        assert!(!nonempty.is_empty());
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = Span::new(0, 5); // [0, 5)
        let b = Span::new(3, 5); // [3, 8)
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
        assert!(a.overlaps(&b));

        let c = Span::new(10, 5); // [10, 15)
        assert_eq!(a.overlaps(&c), c.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn zero_length_span_overlaps_enclosing_span() {
        let caret = Span::point(5);
        let field = Span::new(2, 5); // [2, 7)
        assert!(caret.overlaps(&field));
        assert!(field.overlaps(&caret));
    }

    #[test]
    fn zero_length_span_overlaps_at_either_endpoint() {
        let field = Span::new(2, 5); // [2, 7)
        assert!(Span::point(2).overlaps(&field));
        assert!(Span::point(7).overlaps(&field));
        assert!(!Span::point(8).overlaps(&field));
        assert!(!Span::point(1).overlaps(&field));
    }

    #[test]
    fn contains_offset_matches_overlaps() {
        let field = Span::new(2, 5);
        assert!(field.contains_offset(2));
        assert!(field.contains_offset(7));
        assert!(!field.contains_offset(8));
    }
}
