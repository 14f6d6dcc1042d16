use xi_rope::Rope;

use super::span::Span;

/// A single line of the input file with its byte span.
#[derive(Debug, Clone)]
pub struct LineRef {
    /// 1-based line number, used in error messages.
    pub number: usize,
    /// Byte span of this line in the file (includes the newline if present).
    pub span: Span,
    /// The raw line text including its line terminator.
    pub text: String,
}

impl LineRef {
    /// The line text without its `\n` / `\r\n` terminator.
    pub fn content(&self) -> &str {
        self.text.trim_end_matches(['\r', '\n'])
    }
}

/// Returns an iterator over lines with their byte spans.
///
/// Uses `lines_raw` to preserve newline characters so spans stay exact across
/// `\r\n` files.
pub fn lines_with_spans(rope: &Rope) -> impl Iterator<Item = LineRef> + '_ {
    let mut offset = 0usize;
    rope.lines_raw(..).enumerate().map(move |(idx, line)| {
        let start = offset;
        offset += line.len();
        LineRef {
            number: idx + 1,
            span: Span { start, end: offset },
            text: line.into_owned(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_cover_the_whole_input() {
        let rope = Rope::from("a\tb\r\n\nc");
        let lines: Vec<_> = lines_with_spans(&rope).collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].span, Span::new(0, 5));
        assert_eq!(lines[0].content(), "a\tb");
        assert_eq!(lines[1].content(), "");
        assert_eq!(lines[2].number, 3);
        assert_eq!(lines[2].span, Span::new(6, 7));
    }

    #[test]
    fn empty_input_has_no_lines() {
        let rope = Rope::from("");
        assert_eq!(lines_with_spans(&rope).count(), 0);
    }
}
