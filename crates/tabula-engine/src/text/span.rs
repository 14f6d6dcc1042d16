use serde::Serialize;

/// A byte range `[start, end)` into a source line or file.
///
/// Cells, assignments and rows are all tracked as spans so the scanner can
/// hand out sub-strings without copying them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Slices `text` with this span.
    ///
    /// Callers must only use spans produced against the same text.
    pub fn slice(self, text: &str) -> &str {
        &text[self.start..self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_len() {
        let sp = Span::new(2, 5);
        assert_eq!(sp.slice("a=123;"), "123");
        assert_eq!(sp.len(), 3);
        assert!(!sp.is_empty());
    }

    #[test]
    fn inverted_span_is_empty() {
        let sp = Span::new(5, 2);
        assert_eq!(sp.len(), 0);
        assert!(sp.is_empty());
    }
}
