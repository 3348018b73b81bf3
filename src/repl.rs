use crate::console::{Console, StdConsole};
use crate::error::Span;
use crate::interpreter::{is_statement, BlockTracker, Interpreter};
use crate::options::Options;
use std::io::{self, Write};

/// Interactive session. Lines of an open block are buffered and run together
/// once the block closes; variables persist between entries.
pub fn start(options: Options) {
    println!("PNA Interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+C to quit");
    println!();

    let mut interpreter = Interpreter::with_options(StdConsole::new("", None), options);
    let mut buffer = String::new();
    let mut tracker = BlockTracker::new();

    loop {
        print!("{}", if tracker.is_balanced() { "> " } else { "... " });
        if let Err(error) = io::stdout().flush() {
            eprintln!("Error writing prompt: {}", error);
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if tracker.is_balanced() {
                    if line.is_empty() {
                        continue;
                    }
                    if line == "exit" || line == "quit" {
                        println!("Goodbye!");
                        break;
                    }
                }

                buffer.push_str(line);
                buffer.push('\n');
                tracker.feed(line);

                if tracker.is_balanced() {
                    run_repl_entry(&buffer, &mut interpreter);
                    buffer.clear();
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_repl_entry(source: &str, interpreter: &mut Interpreter<StdConsole>) {
    interpreter.console_mut().set_source(source);

    let entry = source.trim();
    if entry.starts_with('#') || entry.starts_with("//") {
        return;
    }

    // A lone expression shows its value
    if !entry.contains('\n') && !is_statement(entry) {
        match interpreter.evaluate(entry, &Span::new(0, entry.len())) {
            Ok(value) => println!("{}", value),
            Err(error) => interpreter.console_mut().report(&error),
        }
        return;
    }

    if let Err(error) = interpreter.run(source) {
        interpreter.console_mut().report(&error);
    }
}
