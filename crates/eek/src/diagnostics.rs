use crate::position::Span;
use crate::source::SourceMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: Option<String>,
}

impl Label {
    pub fn new(span: Span, message: impl Into<Option<String>>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A compiler message attached to a location in the assembled source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub primary: Option<Label>,
    pub secondary: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            primary: None,
            secondary: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_primary(mut self, span: Span, message: impl Into<Option<String>>) -> Self {
        self.primary = Some(Label::new(span, message));
        self
    }

    pub fn add_secondary(mut self, span: Span, message: impl Into<Option<String>>) -> Self {
        self.secondary.push(Label::new(span, message));
        self
    }

    pub fn add_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Render the diagnostic together with the offending source line and a
    /// caret marker underneath it.
    pub fn render(&self, sources: &SourceMap) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}", self.headline());
        if let Some(primary) = &self.primary {
            if let Some(file) = sources.get(primary.span.file_id) {
                let _ = write!(out, "\n --> {}:{}", file.name, primary.span.start);
                if let Some(line) = file.line_text(primary.span.start.line) {
                    let gutter = primary.span.start.line.to_string();
                    let pad = " ".repeat(gutter.len());
                    let column = primary.span.start.column.saturating_sub(1) as usize;
                    let width = if primary.span.end.line == primary.span.start.line {
                        (primary.span.end.column.saturating_sub(primary.span.start.column) as usize)
                            .max(1)
                    } else {
                        1
                    };
                    let _ = write!(out, "\n{pad} |\n{gutter} | {line}\n{pad} | ");
                    let _ = write!(out, "{}{}", " ".repeat(column), "^".repeat(width));
                    if let Some(message) = &primary.message {
                        let _ = write!(out, " {message}");
                    }
                }
            }
        }
        for note in &self.notes {
            let _ = write!(out, "\n  = note: {note}");
        }
        out
    }

    fn headline(&self) -> String {
        match &self.code {
            Some(code) => format!("{}[{code}]: {}", self.severity, self.message),
            None => format!("{}: {}", self.severity, self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())?;
        if let Some(primary) = &self.primary {
            write!(f, " at {}", primary.span.start)?;
            if let Some(msg) = &primary.message {
                write!(f, " ({msg})")?;
            }
        }
        for label in &self.secondary {
            write!(
                f,
                "; {} at {}",
                label.message.as_deref().unwrap_or("related location"),
                label.span.start
            )?;
        }
        for note in &self.notes {
            write!(f, "; note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Failure reported by the formula toolchain (lexer, parser, type checker).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
}

impl CompileError {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::error(message).into()
    }

    pub fn at(span: Span, message: impl Into<String>) -> Self {
        Diagnostic::error(message).with_primary(span, None).into()
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            CompileError::Diagnostic(diagnostic) => Some(diagnostic),
            CompileError::Message(_) => None,
        }
    }

    /// The bare message without location or severity decoration.
    pub fn message(&self) -> &str {
        match self {
            CompileError::Message(message) => message,
            CompileError::Diagnostic(diagnostic) => &diagnostic.message,
        }
    }
}

pub type CompileResult<T, E = CompileError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceMap;

    #[test]
    fn render_points_at_the_offending_column() {
        let sources = SourceMap::single("formula.eek", "x := 1\ny := x +* 2\n");
        let file = sources.get(crate::position::FileId(0)).map(|f| f.span(14, 15));
        let span = file.unwrap_or_default();
        let rendered = Diagnostic::error("unexpected `*`")
            .with_code("E0101")
            .with_primary(span, Some("here".to_string()))
            .render(&sources);
        assert!(rendered.starts_with("error[E0101]: unexpected `*`"));
        assert!(rendered.contains("--> formula.eek:2:8"));
        assert!(rendered.contains("2 | y := x +* 2"));
        assert!(rendered.contains("       ^ here"));
    }

    #[test]
    fn display_is_single_line() {
        let err = CompileError::error("undefined: foo");
        assert_eq!(err.to_string(), "error: undefined: foo");
        assert_eq!(err.message(), "undefined: foo");
    }

    #[test]
    fn diagnostic_is_the_error_source() {
        let err = CompileError::from(Diagnostic::error("missing return").with_code("E0200"));
        let source = std::error::Error::source(&err).map(|source| source.to_string());
        assert_eq!(source.as_deref(), Some("error[E0200]: missing return"));
    }
}
