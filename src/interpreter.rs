use crate::console::Console;
use crate::environment::{Environment, Object};
use crate::error::{ErrorKind, PnaError, Span};
use crate::evaluator::Evaluator;
use crate::lexer::is_number_literal;
use crate::options::Options;
use crate::value::Value;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A trimmed, non-empty, non-comment source line and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub span: Span,
}

/// How a statement list finished. `Break`/`Continue` travel outwards until a
/// loop consumes them; `Fatal` stops the whole run.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break(Span),
    Continue(Span),
    Fatal(PnaError),
}

/// Splits source text into dispatchable lines: trimmed, blank lines and
/// `#` / `//` comments dropped.
pub fn normalize(source: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut offset = 0;

    for raw in source.split('\n') {
        let text = raw.trim();
        if !text.is_empty() && !text.starts_with('#') && !text.starts_with("//") {
            let start = offset + (raw.len() - raw.trim_start().len());
            lines.push(Line {
                text: text.to_string(),
                span: Span::new(start, start + text.len()),
            });
        }
        offset += raw.len() + 1;
    }

    lines
}

pub struct Interpreter<C: Console> {
    env: Environment,
    rng: StdRng,
    options: Options,
    console: C,
}

impl<C: Console> Interpreter<C> {
    pub fn new(console: C) -> Self {
        Self::with_options(console, Options::default())
    }

    pub fn with_options(console: C, options: Options) -> Self {
        let rng = options.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            env: Environment::new(),
            rng,
            options,
            console,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    /// Runs a whole program. Recoverable failures are reported through the
    /// console; the error result is for what stops the run: a `break` or
    /// `continue` with no loop around it, or a fatal input failure.
    pub fn run(&mut self, source: &str) -> Result<(), PnaError> {
        let lines = normalize(source);
        match self.execute(&lines) {
            Flow::Normal => Ok(()),
            Flow::Break(span) => Err(stray_signal(span, "break")),
            Flow::Continue(span) => Err(stray_signal(span, "continue")),
            Flow::Fatal(error) => Err(error),
        }
    }

    pub fn evaluate(&mut self, expr: &str, span: &Span) -> Result<Value, PnaError> {
        Evaluator::new(&self.env, &mut self.rng, self.options.substitution).evaluate(expr, span)
    }

    /// Dispatches a statement list. Nested blocks come back here with their
    /// own line slice and the same environment.
    #[tracing::instrument(level = "trace", skip_all, fields(lines = lines.len()))]
    pub fn execute(&mut self, lines: &[Line]) -> Flow {
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            let text = line.text.as_str();

            i = if let Some(name) = object_header(text) {
                self.object_literal(name, lines, i)
            } else if let Some((name, field, rhs)) = property_target(text) {
                self.assign_property(name, field, rhs, line);
                i + 1
            } else if let Some((name, rhs)) = assignment_target(text) {
                self.assign(name, rhs, line);
                i + 1
            } else if let Some(expr) = text.strip_prefix("log ") {
                self.log(expr.trim(), line);
                i + 1
            } else if text.starts_with("cond") {
                match self.conditional(lines, i) {
                    (Flow::Normal, next) => next,
                    (flow, _) => return flow,
                }
            } else if text.starts_with("input ") {
                match self.input(line) {
                    Flow::Normal => i + 1,
                    flow => return flow,
                }
            } else if text.starts_with("loop") {
                match self.repeat(lines, i) {
                    (Flow::Normal, next) => next,
                    (flow, _) => return flow,
                }
            } else if text == "break" {
                return Flow::Break(line.span.clone());
            } else if text == "continue" {
                return Flow::Continue(line.span.clone());
            } else {
                tracing::debug!(line = text, "ignoring unrecognized line");
                i + 1
            };
        }

        Flow::Normal
    }

    fn report(&mut self, error: PnaError) {
        tracing::debug!(kind = ?error.kind, message = %error.message, "recovered from statement failure");
        self.console.report(&error);
    }

    /// `name: {` ... `}`. Returns the index after the closing brace.
    fn object_literal(&mut self, name: &str, lines: &[Line], header: usize) -> usize {
        let mut object = Object::new();
        let mut i = header + 1;

        while i < lines.len() && lines[i].text != "}" {
            let line = &lines[i];
            i += 1;

            let Some((key, raw)) = object_entry(&line.text) else {
                self.report(PnaError::new_with_help(
                    ErrorKind::Object,
                    line.span.clone(),
                    format!("Malformed object entry: {}", line.text),
                    "Object entries look like: key: value".to_string(),
                ));
                continue;
            };

            let value = match self.evaluate(raw, &line.span) {
                Ok(value) => value,
                Err(error) => {
                    self.report(error.caught_by(ErrorKind::Object));
                    Value::String(raw.to_string())
                }
            };
            object.insert(key.to_string(), value);
        }

        tracing::debug!(name, fields = object.len(), "bound object literal");
        self.env.assign_object(name, object);
        (i + 1).min(lines.len())
    }

    fn assign_property(&mut self, name: &str, field: &str, rhs: &str, line: &Line) {
        let Some(rhs) = assignment_value(rhs) else {
            self.report(missing_value(line));
            return;
        };
        match self.evaluate(rhs, &line.span) {
            Ok(value) => self.env.assign_field(name, field, value),
            Err(error) => self.report(error.caught_by(ErrorKind::Assign)),
        }
    }

    fn assign(&mut self, name: &str, rhs: &str, line: &Line) {
        let Some(rhs) = assignment_value(rhs) else {
            self.report(missing_value(line));
            return;
        };
        match self.evaluate(rhs, &line.span) {
            Ok(value) => self.env.assign(name, value),
            Err(error) => self.report(error.caught_by(ErrorKind::Assign)),
        }
    }

    fn log(&mut self, expr: &str, line: &Line) {
        match self.evaluate(expr, &line.span) {
            Ok(value) => self.console.write_line(&value.to_string()),
            Err(error) => self.report(error.caught_by(ErrorKind::Log)),
        }
    }

    /// `cond (expr) -> {` then-lines `}` [`else -> {` else-lines `}`] `end`.
    fn conditional(&mut self, lines: &[Line], header: usize) -> (Flow, usize) {
        let line = &lines[header];
        let Some(condition) = block_header(&line.text, "cond") else {
            self.report(PnaError::syntax_error_with_help(
                line.span.clone(),
                format!("Invalid cond syntax: {}", line.text),
                "Conditionals are written as: cond (condition) -> {".to_string(),
            ));
            return (Flow::Normal, header + 1);
        };

        let then_start = header + 1;
        let then_end = scan_block(lines, then_start, |text| text == "}" || text == "end");
        let mut next = then_end;
        if is_line(lines, next, "}") {
            next += 1;
        }

        let mut else_range = None;
        if lines.get(next).is_some_and(|l| is_else_header(&l.text)) {
            let else_start = next + 1;
            let else_end = scan_block(lines, else_start, |text| text == "}");
            else_range = Some(else_start..else_end);
            next = else_end;
            if is_line(lines, next, "}") {
                next += 1;
            }
        }

        if is_line(lines, next, "end") {
            next += 1;
        } else {
            self.report(missing_end(line, "cond"));
        }

        let should_run = match self.evaluate(condition, &line.span) {
            Ok(value) => value.is_truthy(),
            Err(error) => {
                self.report(error.caught_by(ErrorKind::Condition));
                false
            }
        };
        tracing::debug!(condition, should_run, "cond");

        let flow = if should_run {
            self.execute(&lines[then_start..then_end])
        } else if let Some(range) = else_range {
            self.execute(&lines[range])
        } else {
            Flow::Normal
        };
        (flow, next)
    }

    /// `loop (expr) -> {` body `end`.
    fn repeat(&mut self, lines: &[Line], header: usize) -> (Flow, usize) {
        let line = &lines[header];
        let Some(condition) = block_header(&line.text, "loop") else {
            self.report(PnaError::syntax_error_with_help(
                line.span.clone(),
                format!("Invalid loop syntax: {}", line.text),
                "Loops are written as: loop (condition) -> {".to_string(),
            ));
            return (Flow::Normal, header + 1);
        };

        let body_start = header + 1;
        let body_end = scan_block(lines, body_start, |text| text == "end");
        let next = if body_end < lines.len() {
            body_end + 1
        } else {
            self.report(missing_end(line, "loop"));
            body_end
        };
        let body = &lines[body_start..body_end];

        let mut iterations = 0usize;
        loop {
            let keep_going = match self.evaluate(condition, &line.span) {
                Ok(value) => value.is_truthy(),
                Err(error) => {
                    self.report(error.caught_by(ErrorKind::Loop));
                    false
                }
            };
            if !keep_going {
                break;
            }

            iterations += 1;
            match self.execute(body) {
                Flow::Normal | Flow::Continue(_) => {}
                Flow::Break(_) => break,
                fatal @ Flow::Fatal(_) => return (fatal, next),
            }
        }

        tracing::debug!(condition, iterations, "loop finished");
        (Flow::Normal, next)
    }

    /// `input "prompt" -> name` or `-> name.field`.
    fn input(&mut self, line: &Line) -> Flow {
        let Some((prompt, name, field)) = input_target(&line.text) else {
            self.report(PnaError::new_with_help(
                ErrorKind::Input,
                line.span.clone(),
                format!("Invalid input syntax: {}", line.text),
                "Input is written as: input \"prompt\" -> name".to_string(),
            ));
            return Flow::Normal;
        };

        let prompt = if prompt == "NO" { None } else { Some(prompt) };
        let raw = match self.console.read_line(prompt) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return Flow::Fatal(PnaError::new(
                    ErrorKind::Input,
                    line.span.clone(),
                    "Input ended while waiting for a line".to_string(),
                ))
            }
            Err(io_error) => {
                return Flow::Fatal(PnaError::new(
                    ErrorKind::Input,
                    line.span.clone(),
                    format!("Could not read input: {}", io_error),
                ))
            }
        };

        let value = coerce_input(&raw);
        match field {
            Some(field) => self.env.assign_field(name, field, value),
            None => self.env.assign(name, value),
        }
        Flow::Normal
    }
}

/// Whether `text` is dispatched as a statement rather than ignored.
pub fn is_statement(text: &str) -> bool {
    object_header(text).is_some()
        || property_target(text).is_some()
        || assignment_target(text).is_some()
        || text.starts_with("log ")
        || text.starts_with("cond")
        || text.starts_with("input ")
        || text.starts_with("loop")
        || text == "break"
        || text == "continue"
}

fn stray_signal(span: Span, keyword: &str) -> PnaError {
    PnaError::runtime_error_with_help(
        span,
        format!("'{}' outside of a loop", keyword),
        "break and continue only work inside a loop block.".to_string(),
    )
}

fn missing_end(line: &Line, keyword: &str) -> PnaError {
    PnaError::syntax_error_with_help(
        line.span.clone(),
        format!("Missing 'end' for {}", keyword),
        format!("Close every {} block with a line containing only 'end'.", keyword),
    )
}

fn missing_value(line: &Line) -> PnaError {
    PnaError::new(
        ErrorKind::Assign,
        line.span.clone(),
        format!("Missing value in assignment: {}", line.text),
    )
}

fn is_line(lines: &[Line], index: usize, text: &str) -> bool {
    lines.get(index).is_some_and(|line| line.text == text)
}

/// Input is numeric when it is an integer or a plain decimal.
fn coerce_input(raw: &str) -> Value {
    if is_number_literal(raw) {
        if let Ok(n) = raw.parse::<f64>() {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits a leading `\w+` run off `text`.
fn leading_word(text: &str) -> Option<(&str, &str)> {
    let end = text.find(|c: char| !is_word_char(c)).unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    Some(text.split_at(end))
}

/// `name: {`
fn object_header(text: &str) -> Option<&str> {
    let (name, rest) = leading_word(text)?;
    let rest = rest.strip_prefix(':')?;
    (rest.trim_start() == "{").then_some(name)
}

/// `key: value` with an optional trailing comma.
fn object_entry(text: &str) -> Option<(&str, &str)> {
    let (key, rest) = leading_word(text)?;
    let rest = rest.trim_start().strip_prefix(':')?;
    let value = assignment_value(rest)?;
    Some((key, value))
}

/// `name.field : rhs`
fn property_target(text: &str) -> Option<(&str, &str, &str)> {
    let (name, rest) = leading_word(text)?;
    let (field, rest) = leading_word(rest.strip_prefix('.')?)?;
    let rhs = rest.trim_start().strip_prefix(':')?;
    Some((name, field, rhs))
}

/// `name : rhs`
fn assignment_target(text: &str) -> Option<(&str, &str)> {
    let (name, rest) = leading_word(text)?;
    let rhs = rest.trim_start().strip_prefix(':')?;
    Some((name, rhs))
}

/// Trims the right-hand side and drops one trailing comma. `None` when
/// nothing is left.
fn assignment_value(rhs: &str) -> Option<&str> {
    let rhs = rhs.trim();
    let rhs = match rhs.strip_suffix(',') {
        Some(stripped) if !stripped.trim().is_empty() => stripped.trim_end(),
        _ => rhs,
    };
    (!rhs.is_empty()).then_some(rhs)
}

/// `keyword (condition) -> {`, returning the condition text.
fn block_header<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    let rest = text.strip_prefix(keyword)?.trim_start().strip_prefix('(')?;
    let rest = rest.strip_suffix('{')?.trim_end();
    let rest = rest.strip_suffix("->")?.trim_end();
    rest.strip_suffix(')')
}

/// `else -> {`
fn is_else_header(text: &str) -> bool {
    text.strip_prefix("else")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix("->"))
        .is_some_and(|rest| rest.trim_start() == "{")
}

/// `input "prompt" -> name[.field]`
fn input_target(text: &str) -> Option<(&str, &str, Option<&str>)> {
    let rest = text.strip_prefix("input")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('"')?;
    let close = rest.rfind('"')?;
    let prompt = &rest[..close];

    let target = rest[close + 1..].trim_start().strip_prefix("->")?.trim_start();
    let (name, rest) = leading_word(target)?;
    if rest.is_empty() {
        return Some((prompt, name, None));
    }
    let (field, rest) = leading_word(rest.strip_prefix('.')?)?;
    rest.is_empty().then_some((prompt, name, Some(field)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    End,
    Brace,
}

/// Tracks which blocks are open while walking lines.
#[derive(Debug, Default)]
pub struct BlockTracker {
    open: Vec<Closer>,
}

impl BlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, text: &str) {
        if block_header(text, "cond").is_some() || block_header(text, "loop").is_some() {
            self.open.push(Closer::End);
        } else if object_header(text).is_some() {
            self.open.push(Closer::Brace);
        } else {
            let closes = matches!(
                (self.open.last(), text),
                (Some(Closer::End), "end") | (Some(Closer::Brace), "}")
            );
            if closes {
                self.open.pop();
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn is_balanced(&self) -> bool {
        self.open.is_empty()
    }
}

/// Index of the first line from `start` that ends the block, skipping over
/// nested blocks. `lines.len()` when the block runs off the end.
fn scan_block(lines: &[Line], start: usize, is_terminator: impl Fn(&str) -> bool) -> usize {
    let mut tracker = BlockTracker::new();
    let mut i = start;
    while i < lines.len() {
        let text = lines[i].text.as_str();
        if tracker.is_balanced() && is_terminator(text) {
            break;
        }
        tracker.feed(text);
        i += 1;
    }
    tracing::trace!(start, end = i, "scanned block");
    i
}
