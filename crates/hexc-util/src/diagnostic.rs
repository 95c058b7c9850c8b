//! Diagnostic collection and formatting.
//!
//! Every phase of the compiler reports failures through a [`Handler`]
//! rather than printing directly, so the driver decides when and how
//! diagnostics reach the user, and so a single run can surface more than
//! one error.

use crate::span::Span;
use std::cell::RefCell;
use std::fmt;

/// Severity of a diagnostic.
///
/// Hexenwerk's phases currently only ever emit [`Level::Error`]; the other
/// variants exist so the format and the `Handler` do not need to change
/// shape if a warning pass is added later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Note => "Note",
            Level::Help => "Help",
        };
        write!(f, "{s}")
    }
}

/// A single reported problem, tied to the source location that produced it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    /// Start building an error-level diagnostic.
    pub fn error(message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Level::Error, message.into())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.level, self.message)
    }
}

/// Fluent builder for a [`Diagnostic`].
pub struct DiagnosticBuilder {
    level: Level,
    message: String,
    span: Span,
}

impl DiagnosticBuilder {
    fn new(level: Level, message: String) -> Self {
        Self { level, message, span: Span::DUMMY }
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic { level: self.level, message: self.message, span: self.span }
    }

    /// Build and push onto `handler` in one step.
    pub fn emit(self, handler: &Handler) {
        handler.emit(self.build());
    }
}

/// Collects diagnostics for one compiler invocation.
///
/// `Handler` is accessed through a shared reference throughout the lexer,
/// parser and lowerer, so collected diagnostics live behind a `RefCell`
/// rather than requiring `&mut Handler` everywhere.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.level == Level::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.borrow().iter().filter(|d| d.level == Level::Error).count()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Writes every collected diagnostic to stderr, one per line, in
    /// `line:col: Level: message` format.
    pub fn print_all(&self) {
        for diagnostic in self.diagnostics.borrow().iter() {
            eprintln!("{diagnostic}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_line_col_level_message() {
        let diag = Diagnostic::error("unexpected token").span(Span::new(3, 7)).build();
        assert_eq!(diag.to_string(), "3:7: Error: unexpected token");
    }

    #[test]
    fn handler_tracks_error_count() {
        let handler = Handler::new();
        Diagnostic::error("one").span(Span::new(1, 1)).emit(&handler);
        Diagnostic::error("two").span(Span::new(2, 1)).emit(&handler);
        assert_eq!(handler.error_count(), 2);
        assert!(handler.has_errors());
    }

    #[test]
    fn fresh_handler_has_no_errors() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
    }
}
