use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a source file within a [`SourceMap`](crate::source::SourceMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct FileId(pub u32);

impl FileId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A position expressed as 1-based line/column pairs plus the byte offset it
/// was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    #[inline]
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A contiguous region within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
pub struct Span {
    pub file_id: FileId,
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[inline]
    pub fn new(file_id: FileId, start: Position, end: Position) -> Self {
        Self { file_id, start, end }
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        debug_assert_eq!(self.file_id, other.file_id);
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };
        Span {
            file_id: self.file_id,
            start,
            end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A span that is absent / unknown (used for synthesized nodes).
pub const DUMMY_SPAN: Span = Span {
    file_id: FileId(0),
    start: Position {
        line: 0,
        column: 0,
        offset: 0,
    },
    end: Position {
        line: 0,
        column: 0,
        offset: 0,
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_span_covers_both_ends() {
        let a = Span::new(FileId(0), Position::new(1, 1, 0), Position::new(1, 3, 2));
        let b = Span::new(FileId(0), Position::new(2, 1, 10), Position::new(2, 4, 13));
        let joined = b.to(a);
        assert_eq!(joined.start.offset, 0);
        assert_eq!(joined.end.offset, 13);
        assert_eq!(joined.to_string(), "1:1-2:4");
    }
}
