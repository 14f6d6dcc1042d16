use crate::text::Span;

/// How a row is split into cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    Tab,
    Space,
    /// Runs of whitespace; leading and trailing whitespace is dropped.
    Whitespace,
    Literal(String),
}

impl Separator {
    /// Parses a schema separator token. Returns `None` for an empty token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "" => None,
            "TAB" | "\t" => Some(Separator::Tab),
            "SPACE" | " " => Some(Separator::Space),
            "WHITESPACE" => Some(Separator::Whitespace),
            other => Some(Separator::Literal(other.to_string())),
        }
    }

    /// Replaces the contents of `cells` with the cell spans of `line`.
    pub fn split_into(&self, line: &str, cells: &mut Vec<Span>) {
        cells.clear();
        match self {
            Separator::Tab => split_on(line, "\t", cells),
            Separator::Space => split_on(line, " ", cells),
            Separator::Literal(sep) => split_on(line, sep, cells),
            Separator::Whitespace => split_whitespace(line, cells),
        }
    }
}

fn split_on(line: &str, sep: &str, cells: &mut Vec<Span>) {
    let mut begin = 0;
    while let Some(idx) = line[begin..].find(sep) {
        cells.push(Span::new(begin, begin + idx));
        begin += idx + sep.len();
    }
    cells.push(Span::new(begin, line.len()));
}

fn split_whitespace(line: &str, cells: &mut Vec<Span>) {
    let mut start = None;
    for (idx, ch) in line.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                cells.push(Span::new(s, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        cells.push(Span::new(s, line.len()));
    }
}
