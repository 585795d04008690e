/// A half-open range into the original script text.
///
/// Offsets are tracked in two encodings at lex time: byte offsets for
/// string-based highlighters and UTF-16 code-unit offsets for embedding UIs
/// that address text the UTF-16 way. Neither is derived from the other on
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// UTF-16 code-unit offset of the first character.
    pub utf16_start: usize,
    /// UTF-16 code-unit offset one past the last character.
    pub utf16_end: usize,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column (in characters) of the first character.
    pub column: usize,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        utf16_start: usize,
        utf16_end: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            start,
            end,
            utf16_start,
            utf16_end,
            line,
            column,
        }
    }

    /// Span covering both `self` and `other`; line/column are taken from
    /// whichever starts first.
    pub fn merge(&self, other: &Span) -> Span {
        let (line, column) = if self.start <= other.start {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };

        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            utf16_start: self.utf16_start.min(other.utf16_start),
            utf16_end: self.utf16_end.max(other.utf16_end),
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::new(0, 0, 0, 0, 1, 1)
    }
}
