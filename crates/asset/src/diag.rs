//! Non-fatal parse diagnostics.
//! Drivers never log directly; they report here and the caller decides what
//! to do with it (collect, forward to `log`, or drop).

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Directive symbol the driver does not handle. The line is ignored.
    UnknownDirective,
    /// Line failed to decode and was skipped under `ErrorPolicy::Skip`.
    SkippedLine,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,
    pub kind: DiagnosticKind,
    /// Directive symbol or offending token.
    pub token: String,
    pub message: String,
}

impl Diagnostic {
    pub fn unknown_directive(line: usize, symbol: &str) -> Self {
        Self {
            line,
            kind: DiagnosticKind::UnknownDirective,
            token: symbol.to_owned(),
            message: format!("Unhandled directive '{symbol}'"),
        }
    }

    pub fn skipped_line(line: usize, token: &str, err: &dyn std::error::Error) -> Self {
        Self {
            line,
            kind: DiagnosticKind::SkippedLine,
            token: token.to_owned(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Collects every diagnostic in report order.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped_lines(&self) -> usize {
        self.count(DiagnosticKind::SkippedLine)
    }

    pub fn unknown_directives(&self) -> usize {
        self.count(DiagnosticKind::UnknownDirective)
    }

    fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::UnknownDirective => {
                log::warn!("Line {}: unhandled directive '{}'", diagnostic.line, diagnostic.token)
            }
            DiagnosticKind::SkippedLine => log::warn!(
                "Line {}: skipped ({}) near '{}'",
                diagnostic.line,
                diagnostic.message,
                diagnostic.token
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_counts_by_kind() {
        let mut diags = Diagnostics::new();
        diags.report(Diagnostic::unknown_directive(1, "g"));
        diags.report(Diagnostic::unknown_directive(2, "s"));
        let err = objcore::decode_int("x").unwrap_err();
        diags.report(Diagnostic::skipped_line(3, "x", &err));

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.unknown_directives(), 2);
        assert_eq!(diags.skipped_lines(), 1);
        assert_eq!(
            diags.iter().last().map(ToString::to_string).as_deref(),
            Some("line 3: Invalid numeric token 'x'")
        );
    }

    #[test]
    fn sink_through_mut_ref() {
        fn feed(mut sink: impl DiagnosticSink) {
            sink.report(Diagnostic::unknown_directive(7, "illum"));
        }
        let mut diags = Diagnostics::new();
        feed(&mut diags);
        assert_eq!(diags.unknown_directives(), 1);
    }
}
