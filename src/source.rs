//! Source positions and the per-file line-offset table.
//!
//! All locations in the analyzer use 1-based lines and 0-based columns.
//! [`SourceView`] builds the line-offset table once per file and provides
//! bidirectional mapping between [`Position`]s and byte offsets, plus access
//! to individual line texts. The fix applicator and the parser lowering both
//! go through this table so offsets are computed exactly once per file.

use serde::{Deserialize, Serialize};

/// A point in a source file: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line:   usize,
    pub column: usize
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column
        }
    }

    /// Fallback position for reports whose node carries no location.
    pub fn file_start() -> Self {
        Self {
            line:   1,
            column: 0
        }
    }
}

/// A half-open span between two positions, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Position,
    pub end:   Position
}

impl SourceRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end
        }
    }
}

/// Line-offset view over an immutable source text.
///
/// Construction scans the text once for newline offsets; every subsequent
/// mapping is a binary search or an index lookup.
#[derive(Debug)]
pub struct SourceView<'a> {
    text:        &'a str,
    line_starts: Vec<usize>
}

impl<'a> SourceView<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter_map(|(index, byte)| (byte == b'\n').then_some(index + 1))
        );
        Self {
            text,
            line_starts
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a 1-based line without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        if line == 0 || line > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end)
    }

    /// Byte offset of a position, or `None` if it lies outside the file.
    ///
    /// A column may address the line's trailing newline, and on the final
    /// line one past the last byte (end of file).
    pub fn offset_at(&self, position: Position) -> Option<usize> {
        if position.line == 0 || position.line > self.line_starts.len() {
            return None;
        }
        let line_start = self.line_starts[position.line - 1];
        let line_end = self
            .line_starts
            .get(position.line)
            .copied()
            .unwrap_or(self.text.len());
        let offset = line_start + position.column;
        (offset <= line_end).then_some(offset)
    }

    /// Position of a byte offset, clamped to the end of the file.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index
        };
        Position {
            line,
            column: offset - self.line_starts[line - 1]
        }
    }

    /// Byte span of a range, or `None` if either endpoint is out of bounds
    /// or the endpoints are inverted.
    pub fn range_to_offsets(&self, range: &SourceRange) -> Option<(usize, usize)> {
        let start = self.offset_at(range.start)?;
        let end = self.offset_at(range.end)?;
        (start <= end).then_some((start, end))
    }

    /// Range covering a pair of byte offsets.
    pub fn range_at(&self, start: usize, end: usize) -> SourceRange {
        SourceRange {
            start: self.position_at(start),
            end:   self.position_at(end)
        }
    }

    /// Source text covered by a range.
    pub fn slice(&self, range: &SourceRange) -> Option<&'a str> {
        let (start, end) = self.range_to_offsets(range)?;
        self.text.get(start..end)
    }
}
