//! Merging generated blocks (transcriptions, OCR text) back into a document.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use ropey::Rope;

use crate::splice::{splice, Edit};
use crate::vault::Span;

/// Insert `block` on its own line directly below the line that ends `span`.
///
/// The rest of the document is left byte-identical.
pub fn insert_below(text: &str, span: Span, block: &str) -> String {
    let block = block.trim_end_matches('\n');
    if block.is_empty() || span.end > text.len() {
        return text.to_string();
    }

    let rope = Rope::from_str(text);
    let line = rope.byte_to_line(span.end);
    let next_line_start = if line + 1 < rope.len_lines() {
        Some(rope.line_to_byte(line + 1))
    } else {
        None
    };

    let edit = match next_line_start {
        // the line after is only reachable through a trailing newline
        Some(offset) if offset <= text.len() && text[..offset].ends_with('\n') => {
            Edit::insert(offset, format!("{block}\n"))
        }
        _ => Edit::insert(text.len(), format!("\n{block}\n")),
    };

    splice(text, [edit]).into_owned()
}

/// Append `block` to the end of `text`, separated by one blank line.
pub fn append_block(text: &str, block: &str) -> String {
    let block = block.trim_matches('\n');
    if block.is_empty() {
        return text.to_string();
    }

    let separator = match text.trim_end_matches(' ') {
        "" => "",
        t if t.ends_with("\n\n") => "",
        t if t.ends_with('\n') => "\n",
        _ => "\n\n",
    };

    splice(text, [Edit::insert(text.len(), format!("{separator}{block}\n"))]).into_owned()
}

/// Read the document a block is merged into. A missing document reads as empty;
/// any other failure, including non UTF-8 content, is an error.
pub fn read_document(path: &Path) -> anyhow::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_document_missing_is_empty() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let text = read_document(&temp_dir.path().join("new.md")).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_read_document_rejects_non_utf8() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("note.md");
        std::fs::write(&path, b"caf\xe9 latin-1 body\n").unwrap();

        assert!(read_document(&path).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"caf\xe9 latin-1 body\n");
    }

    #[test]
    fn test_insert_below_middle_line() {
        let text = "intro\n![[scan.jpg]]\noutro\n";
        let out = insert_below(text, Span::new(6, 19), "> transcript");
        assert_eq!(out, "intro\n![[scan.jpg]]\n> transcript\noutro\n");
    }

    #[test]
    fn test_insert_below_last_line_without_newline() {
        let text = "![[scan.jpg]]";
        let out = insert_below(text, Span::new(0, 13), "text\n");
        assert_eq!(out, "![[scan.jpg]]\ntext\n");
    }

    #[test]
    fn test_insert_below_last_line_with_newline() {
        let text = "![[scan.jpg]]\n";
        let out = insert_below(text, Span::new(0, 13), "text");
        assert_eq!(out, "![[scan.jpg]]\ntext\n");
    }

    #[test]
    fn test_insert_below_out_of_range() {
        assert_eq!(insert_below("abc", Span::new(0, 10), "x"), "abc");
    }

    #[test]
    fn test_append_block() {
        assert_eq!(append_block("", "new"), "new\n");
        assert_eq!(append_block("body", "new"), "body\n\nnew\n");
        assert_eq!(append_block("body\n", "new"), "body\n\nnew\n");
        assert_eq!(append_block("body\n\n", "\nnew\n"), "body\n\nnew\n");
    }
}
