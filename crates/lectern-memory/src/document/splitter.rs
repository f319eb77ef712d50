use std::collections::VecDeque;
use std::ops::Range;

use super::{Chunk, PageRecord, SplitterError};

/// Separators tried in order; `""` falls back to fixed-width character windows.
const SEPARATORS: &[&str] = &["\n\n", "\n", ".", "!", "?", ",", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of the same page.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
        }
    }
}

/// Recursive separator-based splitter. Every chunk is a contiguous slice of its page.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    config: SplitterConfig,
}

/// A contiguous byte range of the source text and its length in chars.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(config: SplitterConfig) -> Result<Self, SplitterError> {
        if config.chunk_size == 0 {
            return Err(SplitterError::ZeroChunkSize);
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(SplitterError::OverlapTooLarge {
                size: config.chunk_size,
                overlap: config.chunk_overlap,
            });
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> SplitterConfig {
        self.config
    }

    /// Chunk every page in order. Ids are assigned sequentially from 0 across the whole document.
    #[must_use]
    pub fn split_pages(&self, pages: &[PageRecord]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for span in self.spans(&page.raw_text) {
                let text = &page.raw_text[span.clone()];
                chunks.push(Chunk {
                    id: chunks.len(),
                    text: text.to_owned(),
                    source_page: page.page_number,
                    section_title: page.section_title.clone(),
                    char_length: text.chars().count(),
                    start_offset: span.start,
                });
            }
        }
        tracing::debug!(pages = pages.len(), chunks = chunks.len(), "document split");
        chunks
    }

    #[must_use]
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.spans(text).into_iter().map(|r| &text[r]).collect()
    }

    /// Byte ranges of the chunks of `text`, trimmed of surrounding whitespace.
    /// Whitespace-only windows are dropped.
    #[must_use]
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut pieces = Vec::new();
        atomize(text, 0, SEPARATORS, self.config.chunk_size, &mut pieces);

        let mut spans: Vec<Range<usize>> = self
            .merge(&pieces)
            .into_iter()
            .filter_map(|range| trim_range(text, range))
            .collect();
        spans.dedup();
        spans
    }

    fn merge(&self, pieces: &[Piece]) -> Vec<Range<usize>> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut out = Vec::new();
        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            if total + piece.chars > size && !window.is_empty() {
                out.push(window_range(&window));
                while total > overlap || (total + piece.chars > size && total > 0) {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= front.chars;
                }
            }
            window.push_back(piece);
            total += piece.chars;
        }

        if !window.is_empty() {
            out.push(window_range(&window));
        }
        out
    }
}

fn window_range(window: &VecDeque<Piece>) -> Range<usize> {
    let start = window.front().map_or(0, |p| p.start);
    let end = window.back().map_or(start, |p| p.end);
    start..end
}

/// Break `text` into pieces no longer than `size` chars, keeping each separator
/// attached to the piece before it so pieces tile the text without gaps.
fn atomize(text: &str, base: usize, separators: &[&str], size: usize, out: &mut Vec<Piece>) {
    if text.is_empty() {
        return;
    }
    let Some(idx) = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
    else {
        char_windows(text, base, size, out);
        return;
    };
    let sep = separators[idx];
    if sep.is_empty() {
        char_windows(text, base, size, out);
        return;
    }
    let rest = &separators[idx + 1..];

    let mut cursor = 0;
    let emit = |start: usize, end: usize, out: &mut Vec<Piece>| {
        let slice = &text[start..end];
        let chars = slice.chars().count();
        if chars > size {
            atomize(slice, base + start, rest, size, out);
        } else {
            out.push(Piece {
                start: base + start,
                end: base + end,
                chars,
            });
        }
    };
    for (pos, matched) in text.match_indices(sep) {
        let end = pos + matched.len();
        emit(cursor, end, out);
        cursor = end;
    }
    if cursor < text.len() {
        emit(cursor, text.len(), out);
    }
}

fn char_windows(text: &str, base: usize, size: usize, out: &mut Vec<Piece>) {
    let mut start = 0;
    let mut chars = 0;
    for (i, _) in text.char_indices() {
        if chars == size {
            out.push(Piece {
                start: base + start,
                end: base + i,
                chars,
            });
            start = i;
            chars = 0;
        }
        chars += 1;
    }
    if chars > 0 {
        out.push(Piece {
            start: base + start,
            end: base + text.len(),
            chars,
        });
    }
}

fn trim_range(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[range.clone()];
    let trimmed_start = slice.trim_start();
    if trimmed_start.is_empty() {
        return None;
    }
    let start = range.start + (slice.len() - trimmed_start.len());
    let end = start + trimmed_start.trim_end().len();
    Some(start..end)
}
