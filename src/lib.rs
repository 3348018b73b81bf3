// PNA Language Interpreter Library
//
// Core of the interpreter for PNA, a small line-oriented scripting language:
// each line is an assignment, object declaration, conditional or loop block,
// `log` or `input` statement, evaluated straight from its source text.

// Public modules
pub mod builtins;
pub mod console;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod options;
pub mod repl;
pub mod runner;
pub mod substitute;
pub mod value;

// Re-export commonly used items
pub use console::{CapturedConsole, Console, StdConsole};
pub use environment::{Binding, Environment, Object};
pub use error::{ErrorKind, PnaError, Span};
pub use evaluator::Evaluator;
pub use interpreter::{Flow, Interpreter, Line};
pub use lexer::{Lexer, Operator, Token};
pub use options::{Options, SubstitutionMode};
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::run;
