use crate::parser::ast::NodeId;
use crate::span::{LineCol, Span};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the front-end or of the tool around the checker. The checker itself never fails.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("Resolve error: {msg}")]
    Resolve { msg: String, span: Span },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },

    #[error("I/O error: {msg}")]
    Io { msg: String, path: PathBuf },
}

impl CompileError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn resolve(msg: impl Into<String>, span: Span) -> Self {
        Self::Resolve { msg: msg.into(), span }
    }

    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    pub fn io(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Io { msg: msg.into(), path }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Syntax { span, .. } | CompileError::Resolve { span, .. } => Some(*span),
            CompileError::Config { .. } | CompileError::Io { .. } => None,
        }
    }
}

/// The four marker mismatches the checker reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    DeclMissingAnnotation,
    DeclSuperfluousAnnotation,
    StmtMissingAnnotation,
    StmtSuperfluousAnnotation,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::DeclMissingAnnotation => "decl-missing-annotation",
            Category::DeclSuperfluousAnnotation => "decl-superfluous-annotation",
            Category::StmtMissingAnnotation => "stmt-missing-annotation",
            Category::StmtSuperfluousAnnotation => "stmt-superfluous-annotation",
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Category::DeclMissingAnnotation | Category::StmtMissingAnnotation)
    }

    /// Fixed message for this category, naming the marker spelling.
    pub fn message(self, marker: &str) -> String {
        let subject = match self {
            Category::DeclMissingAnnotation | Category::DeclSuperfluousAnnotation => "declaration",
            Category::StmtMissingAnnotation | Category::StmtSuperfluousAnnotation => "statement",
        };
        if self.is_missing() {
            format!("{subject} may throw, add '[[{marker}]]'")
        } else {
            format!("{subject} cannot throw, remove '[[{marker}]]'")
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The node the diagnostic is about: the wrapper for a superfluous statement marker.
    pub node: NodeId,
    pub span: Span,
    pub category: Category,
    pub message: String,
}

impl Diagnostic {
    pub fn new(node: NodeId, span: Span, category: Category, marker: &str) -> Self {
        Self { node, span, category, message: category.message(marker) }
    }
}

/// Diagnostic flattened with its file and position, as emitted by `--format json`.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic<'a> {
    pub file: &'a str,
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
    pub category: Category,
    pub message: &'a str,
}

impl<'a> JsonDiagnostic<'a> {
    pub fn from_diagnostic(file: &'a str, source: &str, diag: &'a Diagnostic) -> Self {
        let pos = LineCol::of(source, diag.span.start);
        Self {
            file,
            line: pos.line,
            column: pos.column,
            start: diag.span.start,
            end: diag.span.end,
            category: diag.category,
            message: &diag.message,
        }
    }
}

/// `file:line:col: category: message`, one line per diagnostic.
pub fn format_short(filename: &str, source: &str, diags: &[Diagnostic]) -> String {
    let mut out = String::new();
    for d in diags {
        let pos = LineCol::of(source, d.span.start);
        out.push_str(&format!(
            "{filename}:{}:{}: {}: {}\n",
            pos.line, pos.column, d.category, d.message
        ));
    }
    out
}

/// Render diagnostics with ariadne into `out`.
pub fn render_diagnostics(
    filename: &str,
    source: &str,
    diags: &[Diagnostic],
    color: bool,
    out: &mut impl std::io::Write,
) -> std::io::Result<()> {
    use ariadne::{Config, Label, Report, ReportKind, Source};

    let name = filename.to_string();
    for d in diags {
        Report::build(ReportKind::Warning, name.clone(), d.span.start)
            .with_config(Config::default().with_color(color))
            .with_code(d.category.as_str())
            .with_message(&d.message)
            .with_label(Label::new((name.clone(), d.span.start..d.span.end)).with_message(&d.message))
            .finish()
            .write((name.clone(), Source::from(source)), &mut *out)?;
    }
    Ok(())
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(source: &str, filename: &str, err: &CompileError) {
    use ariadne::{Config, Label, Report, ReportKind, Source};
    use std::io::IsTerminal;

    match err {
        CompileError::Syntax { msg, span } | CompileError::Resolve { msg, span } => {
            let kind_str = match err {
                CompileError::Syntax { .. } => "syntax",
                _ => "resolve",
            };
            let name = filename.to_string();
            let printed = Report::build(ReportKind::Error, name.clone(), span.start)
                .with_config(Config::default().with_color(std::io::stderr().is_terminal()))
                .with_message(format!("{kind_str} error"))
                .with_label(Label::new((name.clone(), span.start..span.end)).with_message(msg))
                .finish()
                .eprint((name, Source::from(source)));
            if printed.is_err() {
                eprintln!("error [{filename}]: {err}");
            }
        }
        CompileError::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        CompileError::Io { msg, path } => {
            eprintln!("error[io]: {msg}");
            eprintln!("  --> {}", path.display());
        }
    }
}
