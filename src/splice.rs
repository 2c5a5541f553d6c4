//! Offset splicing: apply a batch of range replacements to one text snapshot.
//!
//! Every edit's offsets refer to the *original* base string. Edits are placed
//! left to right to decide which ones are unambiguous, then applied from the
//! rightmost to the leftmost so an applied edit never shifts the offsets of one
//! still waiting.

use std::borrow::Cow;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vault::Span;

/// Replace `base[start..end]` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

impl Edit {
    pub fn new(start: usize, end: usize, new_text: impl Into<String>) -> Edit {
        Edit {
            start,
            end,
            new_text: new_text.into(),
        }
    }

    pub fn replace(span: Span, new_text: impl Into<String>) -> Edit {
        Edit::new(span.start, span.end, new_text)
    }

    /// A zero-width edit inserting `new_text` at `offset`.
    pub fn insert(offset: usize, new_text: impl Into<String>) -> Edit {
        Edit::new(offset, offset, new_text)
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    fn fits(&self, base: &str) -> bool {
        self.start <= self.end
            && self.end <= base.len()
            && base.is_char_boundary(self.start)
            && base.is_char_boundary(self.end)
    }
}

/// Apply all `edits` to `base` as if simultaneously.
///
/// Returns `Cow::Borrowed(base)` when nothing was applied, so callers can skip
/// a write. Edits that are out of bounds, off a char boundary, or overlap an
/// edit placed before them are skipped. Among edits sharing a start offset the
/// one earlier in `edits` is placed first.
pub fn splice<'a>(base: &'a str, edits: impl IntoIterator<Item = Edit>) -> Cow<'a, str> {
    let sorted = edits
        .into_iter()
        .filter(|edit| {
            let fits = edit.fits(base);
            if !fits {
                debug!(start = edit.start, end = edit.end, "skipping edit outside of text");
            }
            fits
        })
        // sorted_by_key is stable: equal keys keep their batch order
        .sorted_by_key(|edit| (edit.start, edit.end))
        .collect_vec();

    let mut placed: Vec<Edit> = Vec::with_capacity(sorted.len());
    for edit in sorted {
        match placed.last() {
            Some(prev) if edit.start < prev.end => {
                debug!(
                    start = edit.start,
                    end = edit.end,
                    "skipping edit overlapping an earlier one"
                );
            }
            _ => placed.push(edit),
        }
    }

    if placed.is_empty() {
        return Cow::Borrowed(base);
    }

    let mut text = base.to_string();
    for edit in placed.iter().rev() {
        text.replace_range(edit.start..edit.end, &edit.new_text);
    }

    Cow::Owned(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edits_borrows() {
        let out = splice("unchanged", vec![]);
        assert!(matches!(out, Cow::Borrowed("unchanged")));
    }

    #[test]
    fn test_edits_apply_against_original_offsets() {
        let base = "one two three";
        let edits = vec![
            Edit::new(0, 3, "1"),
            Edit::new(8, 13, "THREE!"),
            Edit::new(4, 7, "second"),
        ];
        assert_eq!(splice(base, edits), "1 second THREE!");
    }

    #[test]
    fn test_insertions() {
        let base = "ab";
        let edits = vec![Edit::insert(1, "x"), Edit::insert(1, "y"), Edit::insert(2, "!")];
        assert_eq!(splice(base, edits), "axyb!");
    }

    #[test]
    fn test_insert_then_replace_at_same_offset() {
        let edits = vec![Edit::new(0, 1, "A"), Edit::insert(0, ">")];
        // the zero-width insert sorts first and both are placed
        assert_eq!(splice("abc", edits), ">Abc");
    }

    #[test]
    fn test_overlapping_edits_are_skipped() {
        let base = "0123456789";
        let edits = vec![Edit::new(2, 6, "X"), Edit::new(4, 8, "Y"), Edit::new(8, 9, "Z")];
        assert_eq!(splice(base, edits), "01X67Z9");
    }

    #[test]
    fn test_identical_start_first_in_batch_wins() {
        let edits = vec![Edit::new(1, 3, "first"), Edit::new(1, 3, "second")];
        assert_eq!(splice("abcd", edits), "afirstd");
    }

    #[test]
    fn test_invalid_edits_are_skipped() {
        let base = "héllo";
        let edits = vec![
            Edit::new(2, 3, "x"),   // inside the two-byte é
            Edit::new(4, 2, "x"),   // inverted
            Edit::new(3, 99, "x"),  // out of bounds
        ];
        assert!(matches!(splice(base, edits), Cow::Borrowed(_)));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let base = "héllo wörld";
        let edits = vec![Edit::new(0, 6, "hi"), Edit::new(7, 13, "there")];
        assert_eq!(splice(base, edits), "hi there");
    }
}
