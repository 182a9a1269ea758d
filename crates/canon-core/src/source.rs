use serde::Serialize;

use crate::diagnostics::Position;

/// A contiguous byte range `[start, end)` in a [`SourceBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} past end {end}");
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: SourceSpan) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Two spans overlap when they share at least one byte. Two empty spans at the
    /// same offset also count, since their insertion order would be ambiguous.
    pub fn overlaps(&self, other: SourceSpan) -> bool {
        if self.is_empty() && other.is_empty() {
            return self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }
}

/// The text of one file plus a line-start table.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (idx, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn slice(&self, span: SourceSpan) -> &str {
        &self.text[span.start..span.end]
    }

    /// 1-based line number of `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// 0-based byte column of `offset` within its line.
    pub fn column_of(&self, offset: usize) -> usize {
        offset - self.line_start(self.line_of(offset))
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line.saturating_sub(1).min(self.line_starts.len() - 1)]
    }

    /// Text of a 1-based line, without its line terminator.
    pub fn source_line(&self, line: usize) -> &str {
        let start = self.line_start(line);
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text[start..end].trim_end_matches('\r')
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indentation_of(&self, offset: usize) -> &str {
        let line = self.source_line(self.line_of(offset));
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }

    pub fn first_line(&self, span: SourceSpan) -> usize {
        self.line_of(span.start)
    }

    /// Line of the last byte of `span` (the start line for empty spans).
    pub fn last_line(&self, span: SourceSpan) -> usize {
        if span.is_empty() {
            return self.line_of(span.start);
        }
        self.line_of(span.end - 1)
    }

    pub fn is_single_line(&self, span: SourceSpan) -> bool {
        self.first_line(span) == self.last_line(span)
    }

    pub fn position(&self, offset: usize) -> Position {
        Position {
            line: self.line_of(offset) as u32,
            col: self.column_of(offset) as u32 + 1,
            offset: Some(offset as u64),
        }
    }
}
