//! Text Chunker: splits uploaded context into line-bounded slices.
//!
//! Boundaries are aligned to the end of the document: the last chunk always
//! holds the most recent `max_lines` lines and the first chunk takes whatever
//! is left over. When `max_chunks` is set, only the most recent chunks are
//! kept. Chunks borrow from the original text and come out oldest first.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingError {
    #[error("Context is empty")]
    EmptyContext,

    #[error("Chunk bound must be at least one line")]
    InvalidBound,
}

/// A contiguous, line-bounded slice of the context document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextChunk<'a> {
    /// Position within the plan, 0-based.
    pub index: usize,
    /// Line number of the first line in the document, 0-based.
    pub first_line: usize,
    pub line_count: usize,
    pub text: &'a str,
}

/// Precomputed line offsets plus the chunking bounds. Iterating the plan is
/// lazy and can be repeated.
#[derive(Debug, Clone)]
pub struct ChunkPlan<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
    max_lines: usize,
    /// Chunks dropped from the front by the `max_chunks` cap.
    skipped: usize,
    kept: usize,
}

impl<'a> ChunkPlan<'a> {
    pub fn new(
        text: &'a str,
        max_lines: usize,
        max_chunks: Option<usize>,
    ) -> Result<Self, ChunkingError> {
        if max_lines == 0 || max_chunks == Some(0) {
            return Err(ChunkingError::InvalidBound);
        }

        let line_starts = line_starts(text);
        let total = line_starts.len().div_ceil(max_lines);
        let kept = max_chunks.map_or(total, |cap| total.min(cap));

        Ok(Self {
            text,
            line_starts,
            max_lines,
            skipped: total - kept,
            kept,
        })
    }

    pub fn len(&self) -> usize {
        self.kept
    }

    pub fn is_empty(&self) -> bool {
        self.kept == 0
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn chunks(&self) -> Chunks<'_, 'a> {
        Chunks {
            plan: self,
            next: 0,
        }
    }

    fn chunk(&self, index: usize) -> ContextChunk<'a> {
        let lines = self.line_starts.len();
        let total = self.skipped + self.kept;
        let from_end = total - 1 - (self.skipped + index);
        let end_line = lines - from_end * self.max_lines;
        let first_line = end_line.saturating_sub(self.max_lines);

        let start = self.line_starts[first_line];
        let end = self
            .line_starts
            .get(end_line)
            .copied()
            .unwrap_or(self.text.len());
        let slice = &self.text[start..end];

        ContextChunk {
            index,
            first_line,
            line_count: end_line - first_line,
            text: slice.strip_suffix('\n').unwrap_or(slice),
        }
    }
}

impl<'p, 'a> IntoIterator for &'p ChunkPlan<'a> {
    type Item = ContextChunk<'a>;
    type IntoIter = Chunks<'p, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks()
    }
}

#[derive(Debug, Clone)]
pub struct Chunks<'p, 'a> {
    plan: &'p ChunkPlan<'a>,
    next: usize,
}

impl<'a> Iterator for Chunks<'_, 'a> {
    type Item = ContextChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.plan.kept {
            return None;
        }
        let chunk = self.plan.chunk(self.next);
        self.next += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.kept - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_, '_> {}

/// Byte offset of the start of every line. A trailing newline does not open
/// a new line; empty text has no lines.
fn line_starts(text: &str) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }
    std::iter::once(0)
        .chain(
            text.match_indices('\n')
                .map(|(i, _)| i + 1)
                .filter(|&start| start < text.len()),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(n: usize) -> String {
        (1..=n)
            .map(|i| format!("[{i:04}] alice: message {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let text = numbered_lines(10);
        let plan = ChunkPlan::new(&text, 500, None).unwrap();
        let chunks: Vec<_> = plan.chunks().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].line_count, 10);
        assert_eq!(chunks[0].first_line, 0);
    }

    #[test]
    fn test_1200_lines_bound_500_gives_three_tail_aligned_chunks() {
        let text = numbered_lines(1200);
        let plan = ChunkPlan::new(&text, 500, None).unwrap();
        let chunks: Vec<_> = plan.chunks().collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(|c| c.line_count).collect::<Vec<_>>(),
            vec![200, 500, 500]
        );
        assert!(chunks.iter().all(|c| c.text.lines().count() <= 500));

        let last = chunks.last().unwrap();
        assert!(last.text.starts_with("[0701]"));
        assert!(last.text.ends_with("message 1200"));
        assert!(chunks[0].text.starts_with("[0001]"));
    }

    #[test]
    fn test_chunks_reassemble_to_original() {
        let text = numbered_lines(1234);
        let plan = ChunkPlan::new(&text, 100, None).unwrap();
        let joined = plan
            .chunks()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(joined, text);
    }

    #[test]
    fn test_every_chunk_is_contiguous_slice_of_document() {
        let text = numbered_lines(333);
        let plan = ChunkPlan::new(&text, 40, None).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        for chunk in &plan {
            let expected = lines[chunk.first_line..chunk.first_line + chunk.line_count].join("\n");
            assert_eq!(chunk.text, expected);
        }
    }

    #[test]
    fn test_max_chunks_keeps_most_recent() {
        let text = numbered_lines(1200);
        let plan = ChunkPlan::new(&text, 500, Some(1)).unwrap();
        let chunks: Vec<_> = plan.chunks().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].first_line, 700);
        assert!(chunks[0].text.ends_with("message 1200"));
    }

    #[test]
    fn test_plan_is_restartable() {
        let text = numbered_lines(50);
        let plan = ChunkPlan::new(&text, 7, None).unwrap();
        let first: Vec<_> = plan.chunks().collect();
        let second: Vec<_> = plan.chunks().collect();
        assert_eq!(first, second);
        assert_eq!(plan.chunks().len(), 8);
    }

    #[test]
    fn test_trailing_newline_does_not_add_a_line() {
        let plan = ChunkPlan::new("a\nb\n", 1, None).unwrap();
        let texts: Vec<_> = plan.chunks().map(|c| c.text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_blank_lines_are_counted() {
        let plan = ChunkPlan::new("a\n\nb", 2, None).unwrap();
        assert_eq!(plan.line_count(), 3);
        let texts: Vec<_> = plan.chunks().map(|c| c.text).collect();
        assert_eq!(texts, vec!["a", "\nb"]);
    }

    #[test]
    fn test_empty_text_yields_zero_chunks() {
        let plan = ChunkPlan::new("", 500, None).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.chunks().count(), 0);
    }

    #[test]
    fn test_zero_bound_is_rejected() {
        assert_eq!(
            ChunkPlan::new("abc", 0, None).unwrap_err(),
            ChunkingError::InvalidBound
        );
        assert_eq!(
            ChunkPlan::new("abc", 10, Some(0)).unwrap_err(),
            ChunkingError::InvalidBound
        );
    }
}
