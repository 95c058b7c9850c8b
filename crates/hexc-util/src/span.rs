//! Source locations.

/// Identifies the source file a [`Span`] belongs to. Hexenwerk reads a
/// single stream from stdin, so `FileId::STDIN` is the only value ever
/// produced today; the type exists so `Span` does not need to change shape
/// if multi-file input is added later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

impl FileId {
    pub const STDIN: FileId = FileId(0);
}

/// A 1-based line/column location.
///
/// The lexer stamps every token with the `(line, col)` it started at;
/// diagnostics carry the same pair so they can be printed as
/// `line:col: Error: message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub file: FileId,
}

impl Span {
    pub const DUMMY: Span = Span { line: 0, col: 0, file: FileId::STDIN };

    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col, file: FileId::STDIN }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_line_colon_col() {
        let span = Span::new(4, 12);
        assert_eq!(span.to_string(), "4:12");
    }
}
