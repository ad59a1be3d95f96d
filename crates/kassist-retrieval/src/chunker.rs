//! Fixed-size text chunking with overlap and boundary snapping.
//!
//! Windows of `chunk_size` characters are cut from the text. A window that
//! does not reach the end of the text is shortened to end just after the last
//! sentence or word boundary (`.`, newline or space) inside it, so chunks
//! rarely split a word. Consecutive windows overlap by `chunk_overlap`
//! characters.
//!
//! All sizes and offsets are measured in Unicode scalar values, not bytes.

use crate::error::{Error, Result};

/// A chunk of a larger text together with its position in that text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextChunk {
    /// Position of this chunk in the sequence (0, 1, 2, ...).
    pub index: usize,
    /// Trimmed chunk text.
    pub content: String,
    /// Character offset of the first character of `content` (inclusive).
    pub start_char: usize,
    /// Character offset just past the last character of `content` (exclusive).
    pub end_char: usize,
}

/// Splits text into overlapping chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker. `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split `text` into chunks.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        // Byte offset of every char, plus a sentinel for the end of the text
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        let mut chunks = Vec::new();

        if total <= self.chunk_size {
            push_trimmed(text, &bounds, 0, total, &mut chunks);
            return chunks;
        }

        let mut start = 0usize;
        loop {
            let mut end = (start + self.chunk_size).min(total);

            if end < total {
                if let Some(boundary) = (start + 1..end).rev().find(|&i| is_boundary(chars[i])) {
                    end = boundary + 1;
                }
            }

            push_trimmed(text, &bounds, start, end, &mut chunks);

            if end >= total {
                break;
            }

            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }
}

fn is_boundary(c: char) -> bool {
    matches!(c, '.' | '\n' | ' ')
}

/// Push the trimmed window `[start, end)` (char offsets) unless it is blank.
fn push_trimmed(
    text: &str,
    bounds: &[usize],
    start: usize,
    end: usize,
    chunks: &mut Vec<TextChunk>,
) {
    let raw = &text[bounds[start]..bounds[end]];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }

    let leading = raw.chars().take_while(|c| c.is_whitespace()).count();
    let start_char = start + leading;

    chunks.push(TextChunk {
        index: chunks.len(),
        content: trimmed.to_string(),
        start_char,
        end_char: start_char + trimmed.chars().count(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn slice_chars(text: &str, start: usize, end: usize) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[rstest]
    #[case(0, 0)]
    #[case(100, 100)]
    #[case(100, 150)]
    fn test_invalid_configuration(#[case] size: usize, #[case] overlap: usize) {
        assert!(TextChunker::new(size, overlap).is_err());
    }

    #[test]
    fn test_empty_and_blank_text() {
        let chunker = TextChunker::new(100, 20).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk("  Hello world.  ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello world.");
        assert_eq!(chunks[0].start_char, 2);
        assert_eq!(chunks[0].end_char, 14);
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let text = "a".repeat(2500);
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!((chunks[0].start_char, chunks[0].end_char), (0, 1000));
        assert_eq!((chunks[1].start_char, chunks[1].end_char), (800, 1800));
        assert_eq!((chunks[2].start_char, chunks[2].end_char), (1600, 2500));
    }

    #[test]
    fn test_snaps_to_word_boundary() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunker = TextChunker::new(20, 5).unwrap();
        let chunks = chunker.chunk(text);

        assert!(chunks.len() > 1);
        // Every non-final chunk ends on a whole word
        for chunk in &chunks[..chunks.len() - 1] {
            let next_char = text.chars().nth(chunk.end_char);
            assert!(
                matches!(next_char, Some(' ') | None),
                "chunk {:?} split a word",
                chunk.content
            );
        }
    }

    #[test]
    fn test_prefers_sentence_boundary_inside_window() {
        let text = format!("{}. {}", "x".repeat(30), "y".repeat(60));
        let chunker = TextChunker::new(50, 10).unwrap();
        let chunks = chunker.chunk(&text);

        // Last boundary in the first window is the space after the period
        assert_eq!(chunks[0].content, format!("{}.", "x".repeat(30)));
    }

    #[test]
    fn test_offsets_match_content() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let chunker = TextChunker::new(120, 30).unwrap();

        for chunk in chunker.chunk(&text) {
            assert_eq!(
                slice_chars(&text, chunk.start_char, chunk.end_char),
                chunk.content
            );
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "word ".repeat(500);
        let chunker = TextChunker::new(100, 20).unwrap();
        let chunks = chunker.chunk(&text);

        for pair in chunks.windows(2) {
            assert!(pair[1].start_char < pair[0].end_char);
            assert!(pair[1].start_char > pair[0].start_char);
        }
    }

    #[test]
    fn test_indices_are_contiguous() {
        let text = "Sentence number one. ".repeat(200);
        let chunker = TextChunker::new(200, 50).unwrap();
        let chunks = chunker.chunk(&text);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_no_duplicate_tail_chunk() {
        let text = "b".repeat(1500);
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.last().unwrap().end_char, 1500);
    }

    #[test]
    fn test_terminates_with_boundary_right_after_start() {
        // A boundary right after `start` with a large overlap must still advance
        let text = "a bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb c ".repeat(10);
        let chunker = TextChunker::new(10, 9).unwrap();
        let chunks = chunker.chunk(&text);

        assert!(!chunks.is_empty());
        assert!(chunks.len() <= text.chars().count());
        assert_eq!(
            chunks.last().unwrap().end_char,
            text.trim_end().chars().count()
        );
    }

    #[test]
    fn test_multibyte_text_offsets_are_characters() {
        let text = "héllo wörld ünïcode ".repeat(20);
        let chunker = TextChunker::new(30, 5).unwrap();
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 30);
            assert_eq!(
                slice_chars(&text, chunk.start_char, chunk.end_char),
                chunk.content
            );
        }
    }
}
