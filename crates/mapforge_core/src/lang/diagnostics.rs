//! Diagnostic code vocabulary.
//!
//! Mapping diagnostics carry a stable `SM####` code. The codes and their trigger conditions are part of the
//! compiler's external surface: build pipelines filter and suppress on them, so an id never changes its code.
//!
//! ## Examples
//! ```rust
//! use mapforge_core::lang::diagnostics::{self, DiagnosticId};
//!
//! assert_eq!(diagnostics::code(DiagnosticId::NoReturn), "SM0002");
//! assert_eq!(diagnostics::from_code("SM0004"), Some(DiagnosticId::InvalidVariableReference));
//! ```

/// Stable identifier for a mapping diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticId {
    InvalidFirstParameter,
    NoReturn,
    UnsupportedStatement,
    InvalidVariableReference,
    UntranslatableExpression,
    UnsupportedControlFlow,
    OutOfOrderLocal,
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// Metadata for a diagnostic code.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticInfo {
    pub id: DiagnosticId,
    pub code: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    /// When the analyzer reports this code.
    pub trigger: &'static str,
}

/// Registry of diagnostic codes, in [`DiagnosticId`] declaration order.
pub const DIAGNOSTICS: &[DiagnosticInfo] = &[
    DiagnosticInfo {
        id: DiagnosticId::InvalidFirstParameter,
        code: "SM0001",
        title: "Invalid first parameter",
        severity: Severity::Error,
        trigger: "factory's first parameter is missing or not the source type",
    },
    DiagnosticInfo {
        id: DiagnosticId::NoReturn,
        code: "SM0002",
        title: "Missing return statement",
        severity: Severity::Error,
        trigger: "factory body's last statement is not a return of an object construction",
    },
    DiagnosticInfo {
        id: DiagnosticId::UnsupportedStatement,
        code: "SM0003",
        title: "Unsupported statement",
        severity: Severity::Error,
        trigger: "a non-declaration statement reads the source parameter directly",
    },
    DiagnosticInfo {
        id: DiagnosticId::InvalidVariableReference,
        code: "SM0004",
        title: "Invalid variable reference",
        severity: Severity::Error,
        trigger: "a statement reads a local that was already marked as consuming the source parameter",
    },
    DiagnosticInfo {
        id: DiagnosticId::UntranslatableExpression,
        code: "SM0005",
        title: "Untranslatable expression",
        severity: Severity::Error,
        trigger: "an expression cannot be represented as a translatable expression tree",
    },
    DiagnosticInfo {
        id: DiagnosticId::UnsupportedControlFlow,
        code: "SM0006",
        title: "Unsupported control flow",
        severity: Severity::Error,
        trigger: "a factory body contains a loop or a return before its final statement",
    },
    DiagnosticInfo {
        id: DiagnosticId::OutOfOrderLocal,
        code: "SM0007",
        title: "Local used out of order",
        severity: Severity::Error,
        trigger: "a local is read before its declaration, or changed after a source-derived variable read it",
    },
];

/// The `SM####` code.
pub fn code(id: DiagnosticId) -> &'static str {
    info_for(id).code
}

/// Full metadata.
pub fn info_for(id: DiagnosticId) -> &'static DiagnosticInfo {
    &DIAGNOSTICS[id as usize]
}

/// Lookup by code.
pub fn from_code(code: &str) -> Option<DiagnosticId> {
    DIAGNOSTICS.iter().find(|d| d.code == code).map(|d| d.id)
}
