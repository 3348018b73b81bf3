use crate::console::StdConsole;
use crate::error::PnaError;
use crate::interpreter::Interpreter;
use crate::options::Options;

/// Runs a whole script against stdin/stdout.
///
/// Statement-level failures are reported as they happen and the run goes on.
/// The returned error is the one that stopped the run; it has already been
/// reported when this returns.
pub fn run(source: &str, filename: Option<&str>, options: Options) -> Result<(), PnaError> {
    let console = StdConsole::new(source, filename);
    let mut interpreter = Interpreter::with_options(console, options);

    interpreter.run(source).map_err(|error| {
        tracing::debug!(kind = ?error.kind, "run stopped");
        if let Err(io_error) = error.report(source, filename) {
            tracing::warn!(%io_error, "could not render diagnostic");
            eprintln!("{}", error.render_plain());
        }
        error
    })
}
