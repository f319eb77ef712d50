use std::fmt::Write;

use serde::Serialize;

/// Section title used when no heading could be inferred for a page.
pub const UNKNOWN_SECTION: &str = "Unknown Section";

/// Text of one non-empty page with its inferred structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// 1-based position of the page in the source document.
    pub page_number: u32,
    pub raw_text: String,
    pub word_count: usize,
    pub section_title: String,
}

/// A retrievable passage. `text` is always `page.raw_text[start_offset..start_offset + text.len()]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub source_page: u32,
    pub section_title: String,
    /// Length of `text` in characters.
    pub char_length: usize,
    /// Byte offset of `text` within the source page.
    pub start_offset: usize,
}

impl Chunk {
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.text.len()
    }
}

/// Concatenate every page behind a `--- Page N ---` marker.
#[must_use]
pub fn full_text(pages: &[PageRecord]) -> String {
    let mut out = String::new();
    for page in pages {
        let _ = write!(out, "\n--- Page {} ---\n{}\n", page.page_number, page.raw_text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32, text: &str) -> PageRecord {
        PageRecord {
            page_number: n,
            raw_text: text.into(),
            word_count: text.split_whitespace().count(),
            section_title: UNKNOWN_SECTION.into(),
        }
    }

    #[test]
    fn full_text_marks_pages() {
        let text = full_text(&[page(1, "alpha"), page(3, "gamma")]);
        assert_eq!(text, "\n--- Page 1 ---\nalpha\n\n--- Page 3 ---\ngamma\n");
    }

    #[test]
    fn full_text_of_nothing_is_empty() {
        assert!(full_text(&[]).is_empty());
    }

    #[test]
    fn end_offset_uses_byte_length() {
        let chunk = Chunk {
            id: 0,
            text: "héllo".into(),
            source_page: 1,
            section_title: UNKNOWN_SECTION.into(),
            char_length: 5,
            start_offset: 4,
        };
        assert_eq!(chunk.end_offset(), 10);
    }
}
