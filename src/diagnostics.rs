//! The diagnostics infrastructure engine for Uni.

use std::borrow::Cow;
use std::io::{self, Write};
use std::ops::Range;

use ariadne::{Config, Label as ReportLabel, Report, ReportKind, Source};

/// Byte range in the source text.
pub type Span = Range<usize>;

/// Static, human-readable message for an error kind.
pub trait AsStr {
    fn as_str(&self) -> &'static str;
}

/// A secondary annotation pointing at a part of the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub span: Span,
    pub message: Cow<'static, str>,
}

/// A fatal error reported by the scanner, the parser or the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Primary location of the problem.
    pub span: Span,
    /// Phase that produced the diagnostic (e.g. "syntax", "runtime").
    pub code: &'static str,
    /// Human-readable message describing the issue.
    pub message: &'static str,
    pub labels: Vec<Label>,
}

/// Accumulates diagnostics so the caller decides how and when to report them.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn emit(&mut self, span: Span, code: &'static str, message: &'static str, labels: Vec<Label>) {
        self.diagnostics.push(Diagnostic { span, code, message, labels });
    }

    /// Prints every diagnostic to stderr with colors.
    pub fn report(&self, src: &str, filename: &str) {
        let mut stderr = io::stderr().lock();
        self.write_to(src, filename, true, &mut stderr).ok();
    }

    /// Renders every diagnostic to a `String` without ANSI codes.
    pub fn render(&self, src: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        self.write_to(src, filename, false, &mut buf).ok();
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn write_to(
        &self,
        src: &str,
        filename: &str,
        color: bool,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        for diag in &self.diagnostics {
            let mut report = Report::build(ReportKind::Error, (filename, diag.span.clone()))
                .with_code(diag.code)
                .with_message(diag.message)
                .with_config(Config::default().with_color(color));
            for label in &diag.labels {
                report = report.with_label(
                    ReportLabel::new((filename, label.span.clone())).with_message(&label.message),
                );
            }
            report.finish().write((filename, Source::from(src)), &mut *writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_message_and_source() {
        let src = "var x = 1 $ 2";
        let mut diags = Diagnostics::default();
        diags.emit(
            10..11,
            "syntax",
            "Unexpected character",
            vec![Label { span: 10..11, message: "this character is not part of the language".into() }],
        );
        let out = diags.render(src, "<test>");
        assert!(out.contains("Unexpected character"));
        assert!(out.contains("var x = 1 $ 2"));
    }
}
