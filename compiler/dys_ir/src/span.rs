//! Source location spans.
//!
//! Spans are byte ranges into the program text. Scripts report positions the
//! way the host expects them: 1-based lines and 0-based UTF-8 byte columns,
//! so `LineIndex` converts a span into a `SourceRange` on demand.

use std::fmt;

/// Source location span.
///
/// Layout: 8 bytes total
/// - start: u32 - byte offset from file start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Dummy span for synthesized nodes.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Create from a byte range, saturating offsets that do not fit in `u32`.
    #[inline]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Span {
            start: u32::try_from(range.start).unwrap_or(u32::MAX),
            end: u32::try_from(range.end).unwrap_or(u32::MAX),
        }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Merge two spans to create one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shift both offsets by `base`.
    ///
    /// Used when a fragment of the source (an f-string field) is lexed on its
    /// own and its spans must point back into the enclosing program.
    #[inline]
    #[must_use]
    pub fn offset_by(self, base: u32) -> Span {
        Span {
            start: self.start.saturating_add(base),
            end: self.end.saturating_add(base),
        }
    }

    /// Convert to a `std::ops::Range`.
    #[inline]
    pub fn to_range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Line/column range of a node, in the host's reporting convention.
///
/// Field order makes the derived `Ord` sort by start position first, which is
/// the order coverage reports use.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRange {
    /// 1-based start line.
    pub lineno: u32,
    /// 0-based byte column of the start.
    pub col_offset: u32,
    /// 1-based end line.
    pub end_lineno: u32,
    /// 0-based byte column of the end (exclusive).
    pub end_col_offset: u32,
}

/// Offsets of line starts, for span to line/column conversion.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build the index for `source`.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(u32::try_from(offset + 1).unwrap_or(u32::MAX));
            }
        }
        LineIndex { line_starts }
    }

    /// Number of lines in the indexed source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into `(line, column)`, line 1-based.
    pub fn position(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        let column = offset - self.line_starts[line];
        (u32::try_from(line + 1).unwrap_or(u32::MAX), column)
    }

    /// Convert a span into a `SourceRange`.
    pub fn locate(&self, span: Span) -> SourceRange {
        let (lineno, col_offset) = self.position(span.start);
        let (end_lineno, end_col_offset) = self.position(span.end);
        SourceRange {
            lineno,
            col_offset,
            end_lineno,
            end_col_offset,
        }
    }
}

#[cfg(test)]
mod tests;
