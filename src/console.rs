use crate::error::PnaError;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Output and input channels of a running script.
pub trait Console {
    /// Emits one line of program output (`log`).
    fn write_line(&mut self, text: &str);

    /// Shows `prompt` if given and blocks for one line of input. `Ok(None)`
    /// means the input is exhausted.
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>>;

    /// Emits a recoverable diagnostic.
    fn report(&mut self, error: &PnaError);
}

/// Console over the process stdin/stdout. Diagnostics are rendered with
/// ariadne against the source the console was created for.
pub struct StdConsole {
    source: String,
    filename: Option<String>,
}

impl StdConsole {
    pub fn new(source: &str, filename: Option<&str>) -> Self {
        Self {
            source: source.to_string(),
            filename: filename.map(str::to_string),
        }
    }

    /// Points diagnostics at a new source text (REPL entries).
    pub fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }
}

impl Console for StdConsole {
    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>> {
        if let Some(prompt) = prompt {
            print!("{} ", prompt);
            io::stdout().flush()?;
        }

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn report(&mut self, error: &PnaError) {
        if let Err(io_error) = error.report(&self.source, self.filename.as_deref()) {
            tracing::warn!(%io_error, "could not render diagnostic");
            eprintln!("{}", error.render_plain());
        }
    }
}

/// In-memory console: queued input lines, captured output and diagnostics.
#[derive(Debug, Default)]
pub struct CapturedConsole {
    pub output: Vec<String>,
    pub prompts: Vec<Option<String>>,
    pub diagnostics: Vec<PnaError>,
    input: VecDeque<String>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Diagnostics in their plain `[Tag] message` form.
    pub fn diagnostic_lines(&self) -> Vec<String> {
        self.diagnostics.iter().map(PnaError::render_plain).collect()
    }
}

impl Console for CapturedConsole {
    fn write_line(&mut self, text: &str) {
        self.output.push(text.to_string());
    }

    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>> {
        self.prompts.push(prompt.map(str::to_string));
        Ok(self.input.pop_front())
    }

    fn report(&mut self, error: &PnaError) {
        self.diagnostics.push(error.clone());
    }
}
