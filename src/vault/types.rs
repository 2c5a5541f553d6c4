//! Core types for located link syntax.
//!
//! This module contains the fundamental types shared by the parser, the
//! rewriter and the annotator:
//! - `Span`: a byte range into one immutable text snapshot
//! - `SyntaxKind`: which link grammar an occurrence was written in
//! - `Occurrence`: one located link or embed

use std::ops::Range;

use ropey::Rope;
use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into a text snapshot.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    /// Creates a `Span` from a character offset range using the rope for byte calculation.
    ///
    /// Out of range offsets are clamped to the end of the text.
    pub fn from_char_range(rope: &Rope, range: Range<usize>) -> Span {
        let len = rope.len_chars();
        let start = rope.char_to_byte(range.start.min(len));
        let end = rope.char_to_byte(range.end.min(len));

        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The slice of `text` this span covers, if it lies on char boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// Trait for types that cover a span of the document.
pub trait Spanned {
    fn span(&self) -> &Span;

    fn includes(&self, other: &impl Spanned) -> bool {
        let outer = self.span();
        let inner = other.span();

        outer.start <= inner.start && outer.end >= inner.end
    }
}

impl Spanned for Span {
    fn span(&self) -> &Span {
        self
    }
}

/// The link grammar an occurrence was written in.
///
/// The kinds differ in how much of the span is replaceable target text and
/// how much is fixed decoration.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    /// `![[target|suffix]]`
    EmbeddedResource,
    /// `[[target|suffix]]`
    WikiLink,
    /// `[alt](target)` or `![alt](target)`
    InlineReference,
}

impl SyntaxKind {
    /// Byte widths of the fixed opening and closing markers, for the wiki grammars.
    pub fn decoration(&self) -> Option<(usize, usize)> {
        match self {
            SyntaxKind::EmbeddedResource => Some((3, 2)),
            SyntaxKind::WikiLink => Some((2, 2)),
            SyntaxKind::InlineReference => None,
        }
    }
}

/// One located link or embed inside a text body.
///
/// `raw_link` is the link text as written between the delimiters, including
/// any `|`-separated suffix; `span` covers the entire construct.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub raw_link: String,
    pub span: Span,
    pub kind: SyntaxKind,
}

impl Occurrence {
    pub fn new(raw_link: impl Into<String>, span: impl Into<Span>, kind: SyntaxKind) -> Occurrence {
        Occurrence {
            raw_link: raw_link.into(),
            span: span.into(),
            kind,
        }
    }
}

impl Spanned for Occurrence {
    fn span(&self) -> &Span {
        &self.span
    }
}
