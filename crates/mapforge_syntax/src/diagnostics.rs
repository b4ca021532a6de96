//! Diagnostics and error reporting for mapping sources.
//!
//! [`CompileError`] is the one error value shared by the lexer, the parser and name resolution. Rendering goes
//! through `miette` so the CLI gets labelled source snippets; [`format_error`] is the plain-text fallback used in
//! logs and tests.

use miette::{LabeledSpan, MietteDiagnostic, NamedSource, Report};

use crate::ast::Span;

/// A compile-time error with location information
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl CompileError {
    pub fn new(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Error,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn syntax(message: String, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            ..Self::new(message, span)
        }
    }

    pub fn resolution(message: String, span: Span) -> Self {
        Self {
            kind: ErrorKind::Resolution,
            ..Self::new(message, span)
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            kind: ErrorKind::Warning,
            ..Self::new(message, span)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        !matches!(self.kind, ErrorKind::Warning)
    }

    /// Build a `miette` report pointing into `source`.
    pub fn to_report(&self, file_name: &str, source: &str) -> Report {
        let severity = if self.is_error() {
            miette::Severity::Error
        } else {
            miette::Severity::Warning
        };
        let mut diagnostic = MietteDiagnostic::new(self.message.clone())
            .with_severity(severity)
            .with_label(LabeledSpan::at(clamp_span(self.span, source), self.kind.to_string()));
        let help: Vec<&str> = self.notes.iter().chain(self.hints.iter()).map(String::as_str).collect();
        if !help.is_empty() {
            diagnostic = diagnostic.with_help(help.join("\n"));
        }
        Report::new(diagnostic).with_source_code(NamedSource::new(file_name, source.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    Syntax,
    Resolution,
    Warning,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Error => write!(f, "error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Resolution => write!(f, "resolution error"),
            ErrorKind::Warning => write!(f, "warning"),
        }
    }
}

/// Keep a span inside the source so `miette` never indexes past the end.
pub fn clamp_span(span: Span, source: &str) -> std::ops::Range<usize> {
    let start = span.start.min(source.len());
    let end = span.end.clamp(start, source.len());
    start..end
}

/// Format an error as plain text: header, `file:line:col`, the offending line and a caret.
pub fn format_error(file_name: &str, source: &str, error: &CompileError) -> String {
    let (line_num, col_num, line_text) = line_info(source, error.span.start);
    let width = line_num.to_string().len();
    let underline = error.span.end.saturating_sub(error.span.start).clamp(1, line_text.len().max(1));

    let mut out = format!("{}: {}\n", error.kind, error.message);
    out.push_str(&format!("  --> {file_name}:{line_num}:{col_num}\n"));
    out.push_str(&format!("  {:>width$} |\n", ""));
    out.push_str(&format!("  {line_num:>width$} | {line_text}\n"));
    out.push_str(&format!(
        "  {:>width$} | {}{}\n",
        "",
        " ".repeat(col_num.saturating_sub(1)),
        "^".repeat(underline)
    ));
    for note in &error.notes {
        out.push_str(&format!("  = note: {note}\n"));
    }
    for hint in &error.hints {
        out.push_str(&format!("  = hint: {hint}\n"));
    }
    out
}

/// Line number, column number (both 1-based) and line text for a byte offset.
pub fn line_info(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    (line_num, offset - line_start + 1, &source[line_start..line_end])
}

// ============================================================================
// Error catalog
// ============================================================================

/// Constructors for common errors, so wording stays consistent across passes.
pub mod errors {
    use super::*;

    pub fn unknown_type(name: &str, span: Span) -> CompileError {
        CompileError::resolution(format!("Unknown type '{name}'"), span)
            .with_hint("Did you forget to import it or declare it in this namespace?")
    }

    pub fn ambiguous_type(name: &str, candidates: &[String], span: Span) -> CompileError {
        CompileError::resolution(format!("Type '{name}' is ambiguous"), span)
            .with_note(format!("candidates: {}", candidates.join(", ")))
            .with_hint("Import the type explicitly or use its qualified path")
    }

    pub fn wrong_type_argument_count(name: &str, expected: usize, found: usize, span: Span) -> CompileError {
        CompileError::resolution(
            format!("Type '{name}' takes {expected} type argument(s), found {found}"),
            span,
        )
    }

    pub fn duplicate_namespace(span: Span) -> CompileError {
        CompileError::syntax("A module may declare at most one namespace".to_string(), span)
    }

    pub fn duplicate_member(class: &str, member: &str, span: Span) -> CompileError {
        CompileError::new(format!("Class '{class}' already declares '{member}'"), span)
    }

    pub fn duplicate_type(name: &str, span: Span) -> CompileError {
        CompileError::resolution(format!("Type '{name}' is declared more than once"), span)
            .with_note("the first declaration is used")
    }

    pub fn bad_decorator_arguments(name: &str, span: Span) -> CompileError {
        CompileError::new(format!("Decorator '@{name}' expects exactly one type argument"), span)
            .with_hint(format!("Write it as @{name}(SourceType)"))
    }
}
