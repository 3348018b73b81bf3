use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The statement boundary that caught a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Object,
    Assign,
    Log,
    Condition,
    Input,
    Loop,
    Runtime,
}

impl ErrorKind {
    /// Short tag used in plain-text renderings, e.g. `[AssignError]`.
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Object => "ObjectParseError",
            ErrorKind::Assign => "AssignError",
            ErrorKind::Log => "LogError",
            ErrorKind::Condition => "CondError",
            ErrorKind::Input => "InputError",
            ErrorKind::Loop => "LoopError",
            ErrorKind::Runtime => "RuntimeError",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "Syntax Error",
            ErrorKind::Object => "Object Error",
            ErrorKind::Assign => "Assignment Error",
            ErrorKind::Log => "Log Error",
            ErrorKind::Condition => "Condition Error",
            ErrorKind::Input => "Input Error",
            ErrorKind::Loop => "Loop Error",
            ErrorKind::Runtime => "Runtime Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::Syntax => Color::Yellow,
            ErrorKind::Object | ErrorKind::Assign => Color::Blue,
            ErrorKind::Log | ErrorKind::Condition | ErrorKind::Loop => Color::Magenta,
            ErrorKind::Input => Color::Cyan,
            ErrorKind::Runtime => Color::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PnaError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl PnaError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn syntax_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Syntax, span, message, help)
    }

    pub fn runtime_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Runtime, span, message, help)
    }

    /// Re-tags an evaluator failure with the statement that caught it.
    pub fn caught_by(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Plain one-line form: `[AssignError] message`.
    pub fn render_plain(&self) -> String {
        format!("[{}] {}", self.kind.tag(), self.message)
    }

    pub fn report(&self, source: &str, filename: Option<&str>) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<repl>");
        let color = self.kind.color();

        // ariadne wants the label inside the source it is printed against
        let end = self.span.end.min(source.len());
        let start = self.span.start.min(end);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", self.kind.title().fg(color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .print((filename, Source::from(source)))
    }
}

impl fmt::Display for PnaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PnaError {}
