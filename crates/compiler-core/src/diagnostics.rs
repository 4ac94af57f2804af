//! Diagnostic handler: a process-scoped-per-call accumulator with one
//! list per severity, built on a closed error-code enum with a
//! `From<Code> for &'static str` table.

use crate::span::{LineIndex, Span};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

/// Stable numeric diagnostic code, part of the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    WarningUnexpectedCharacter,
    WarningUnclosedHtmlTag,
    WarningUnterminatedHtmlComment,
    WarningInvalidSpread,
    WarningDirectiveNotSupported,
    WarningUnmatchedCloseTag,
    ErrorUnterminatedString,
    ErrorUnterminatedJsComment,
    ErrorFragmentShorthandAttrs,
}

impl DiagnosticCode {
    pub fn severity(self) -> Severity {
        use DiagnosticCode::*;
        match self {
            ErrorUnterminatedString | ErrorUnterminatedJsComment | ErrorFragmentShorthandAttrs => {
                Severity::Error
            }
            _ => Severity::Warning,
        }
    }
}

impl From<DiagnosticCode> for &'static str {
    fn from(val: DiagnosticCode) -> Self {
        use DiagnosticCode::*;
        match val {
            WarningUnexpectedCharacter => "WARNING_UNEXPECTED_CHARACTER",
            WarningUnclosedHtmlTag => "WARNING_UNCLOSED_HTML_TAG",
            WarningUnterminatedHtmlComment => "WARNING_UNTERMINATED_HTML_COMMENT",
            WarningInvalidSpread => "WARNING_INVALID_SPREAD",
            WarningDirectiveNotSupported => "WARNING_DIRECTIVE_NOT_SUPPORTED",
            WarningUnmatchedCloseTag => "WARNING_UNMATCHED_CLOSE_TAG",
            ErrorUnterminatedString => "ERROR_UNTERMINATED_STRING",
            ErrorUnterminatedJsComment => "ERROR_UNTERMINATED_JS_COMMENT",
            ErrorFragmentShorthandAttrs => "ERROR_FRAGMENT_SHORTHAND_ATTRS",
        }
    }
}
impl From<&DiagnosticCode> for &'static str {
    fn from(val: &DiagnosticCode) -> Self {
        Into::<&str>::into(*val)
    }
}
impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub range: Span,
    pub text: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, range: Span, text: impl Into<String>) -> Self {
        Self {
            code,
            range,
            text: text.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Location as it appears on the public diagnostics surface.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicDiagnostic {
    pub code: String,
    pub severity: u8,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub location: Location,
}

/// Collects diagnostics for a single pipeline run, then converts them to
/// the public shape once, amortizing the line-index build across every
/// diagnostic raised for that source.
#[derive(Debug, Default)]
pub struct DiagnosticHandler {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.code.severity() == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Moves every diagnostic out of `other` and into `self`, preserving
    /// relative order. Used to merge the tokenizer's and tree
    /// constructor's handlers into the one the facade returns.
    pub fn append(&mut self, mut other: DiagnosticHandler) {
        self.diagnostics.append(&mut other.diagnostics);
    }

    /// Converts every collected diagnostic to its public shape, using one
    /// shared [`LineIndex`] for the whole source.
    pub fn into_public(self, source: &str, filename: &str) -> Vec<PublicDiagnostic> {
        let index = LineIndex::new(source);
        self.diagnostics
            .into_iter()
            .map(|d| {
                let (line, column) = index.line_col(d.range.start);
                PublicDiagnostic {
                    code: d.code.to_string(),
                    severity: d.code.severity() as u8,
                    text: d.text,
                    hint: d.hint,
                    location: Location {
                        file: filename.to_string(),
                        line,
                        column,
                        length: d.range.len(),
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn severity_mapping() {
        assert_eq!(
            DiagnosticCode::ErrorUnterminatedString.severity(),
            Severity::Error
        );
        assert_eq!(
            DiagnosticCode::WarningInvalidSpread.severity(),
            Severity::Warning
        );
    }

    #[test]
    fn into_public_computes_line_col_once() {
        let mut handler = DiagnosticHandler::new();
        handler.push(Diagnostic::new(
            DiagnosticCode::WarningUnclosedHtmlTag,
            Span::new(6, 10),
            "unclosed tag",
        ));
        let out = handler.into_public("hello\n<div", "test.cmp");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].location.line, 2);
        assert_eq!(out[0].location.column, 1);
        assert_eq!(out[0].code, "WARNING_UNCLOSED_HTML_TAG");
    }
}
