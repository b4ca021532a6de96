//! Mapping diagnostics: coded, factory-scoped validation failures.
//!
//! A [`MapDiagnostic`] never aborts the pass. The analyzer reports it, drops the one offending factory and moves
//! on. Codes come from the `mapforge_core::lang::diagnostics` registry; messages name the type, the method and the
//! offending identifier so the problem can be found without further tooling.

use std::fmt;

use mapforge_core::lang::diagnostics::{self as registry, DiagnosticId, Severity};
use mapforge_syntax::ast::Span;
use mapforge_syntax::diagnostics::clamp_span;
use miette::{LabeledSpan, MietteDiagnostic, NamedSource, Report};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDiagnostic {
    pub id: DiagnosticId,
    pub message: String,
    pub span: Span,
    /// Index of the module the span points into.
    pub module: usize,
}

impl MapDiagnostic {
    pub fn new(id: DiagnosticId, message: String, span: Span, module: usize) -> Self {
        Self {
            id,
            message,
            span,
            module,
        }
    }

    /// The stable `SM####` code.
    pub fn code(&self) -> &'static str {
        registry::code(self.id)
    }

    pub fn is_error(&self) -> bool {
        registry::info_for(self.id).severity == Severity::Error
    }

    pub fn to_report(&self, file_name: &str, source: &str) -> Report {
        let info = registry::info_for(self.id);
        let severity = match info.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        };
        let diagnostic = MietteDiagnostic::new(self.message.clone())
            .with_code(info.code)
            .with_severity(severity)
            .with_label(LabeledSpan::at(clamp_span(self.span, source), info.title))
            .with_help(format!("{} is reported when {}", info.code, info.trigger));
        Report::new(diagnostic).with_source_code(NamedSource::new(file_name, source.to_string()))
    }
}

impl fmt::Display for MapDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message)
    }
}

impl std::error::Error for MapDiagnostic {}

/// Where a diagnostic is reported: the method being analyzed.
#[derive(Debug, Clone, Copy)]
pub struct FactorySite<'a> {
    pub target: &'a str,
    pub method: &'a str,
    pub module: usize,
}

impl FactorySite<'_> {
    fn diagnostic(&self, id: DiagnosticId, message: String, span: Span) -> MapDiagnostic {
        MapDiagnostic::new(id, message, span, self.module)
    }

    pub fn invalid_first_parameter(&self, source: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::InvalidFirstParameter,
            format!(
                "First parameter type of method '{}.{}' should be the source type '{source}'",
                self.target, self.method
            ),
            span,
        )
    }

    pub fn no_return(&self, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::NoReturn,
            format!("Missing return statement in method '{}.{}'", self.target, self.method),
            span,
        )
    }

    /// SM0002 variant for a terminal construction of the wrong type.
    pub fn wrong_return_type(&self, built: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::NoReturn,
            format!(
                "Missing return statement in method '{}.{}': the final statement builds '{built}' instead of '{}'",
                self.target, self.method, self.target
            ),
            span,
        )
    }

    pub fn unsupported_statement(&self, source_param: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::UnsupportedStatement,
            format!(
                "Invalid statement in method '{}.{}': only variables can access the source parameter '{source_param}'",
                self.target, self.method
            ),
            span,
        )
    }

    pub fn invalid_variable_reference(&self, variable: &str, source_param: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::InvalidVariableReference,
            format!(
                "Cannot access variable '{variable}' in method '{}.{}': the variable uses the source parameter \
                 '{source_param}', which can only be accessed once",
                self.target, self.method
            ),
            span,
        )
    }

    /// SM0007: a local read before its `let`.
    pub fn read_before_declaration(&self, local: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::OutOfOrderLocal,
            format!(
                "Cannot access variable '{local}' in method '{}.{}': the variable is declared later in the method",
                self.target, self.method
            ),
            span,
        )
    }

    /// SM0007: a local changed after a source variable captured it.
    pub fn changed_after_staging(&self, local: &str, variable: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::OutOfOrderLocal,
            format!(
                "Cannot change variable '{local}' in method '{}.{}': source variable '{variable}' already read it",
                self.target, self.method
            ),
            span,
        )
    }

    pub fn untranslatable(&self, expr: &str, reason: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::UntranslatableExpression,
            format!(
                "Expression '{expr}' in method '{}.{}' cannot be translated: {reason}",
                self.target, self.method
            ),
            span,
        )
    }

    pub fn unsupported_control_flow(&self, what: &str, span: Span) -> MapDiagnostic {
        self.diagnostic(
            DiagnosticId::UnsupportedControlFlow,
            format!("Unsupported control flow in method '{}.{}': {what}", self.target, self.method),
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: FactorySite<'static> = FactorySite {
        target: "UserDto",
        method: "map",
        module: 0,
    };

    #[test]
    fn test_messages_name_type_method_and_identifier() {
        let d = SITE.invalid_variable_reference("name", "user", Span::new(3, 7));
        assert_eq!(d.code(), "SM0004");
        assert_eq!(
            d.to_string(),
            "SM0004: Cannot access variable 'name' in method 'UserDto.map': the variable uses the source parameter \
             'user', which can only be accessed once"
        );
        assert_eq!(
            SITE.unsupported_statement("user", Span::default()).message,
            "Invalid statement in method 'UserDto.map': only variables can access the source parameter 'user'"
        );
    }

    #[test]
    fn test_out_of_order_locals_share_a_code() {
        let early = SITE.read_before_declaration("s", Span::default());
        let late = SITE.changed_after_staging("s", "n", Span::default());
        assert_eq!((early.code(), late.code()), ("SM0007", "SM0007"));
        assert_eq!(
            late.message,
            "Cannot change variable 's' in method 'UserDto.map': source variable 'n' already read it"
        );
    }

    #[test]
    fn test_wrong_return_type_keeps_no_return_code() {
        let d = SITE.wrong_return_type("Other", Span::default());
        assert_eq!(d.code(), "SM0002");
        assert!(d.is_error());
    }

    #[test]
    fn test_report_survives_out_of_range_span() {
        let d = SITE.no_return(Span::new(100, 200));
        let report = d.to_report("a.map", "class A:\n");
        assert!(report.to_string().contains("Missing return statement"));
    }
}
