use clap::{Arg, Command};
use pna::{repl, runner, Options, SubstitutionMode};
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    init_tracing();

    let matches = Command::new("pna")
        .about("Interpreter for the PNA scripting language")
        .arg(
            Arg::new("file")
                .help("The .pna script to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .help("Seed for random, randint and choice")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("textual-substitution")
                .long("textual-substitution")
                .help("Rewrite variables into expression text before tokenizing")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let mut options = Options::default();
    if let Some(seed) = matches.get_one::<u64>("seed") {
        options = options.with_seed(*seed);
    }
    if matches.get_flag("textual-substitution") {
        options = options.with_substitution(SubstitutionMode::Textual);
    }

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => run_file(file_path, options),
        _ => repl::start(options),
    }
}

fn run_file(path: &str, options: Options) {
    if !path.ends_with(".pna") {
        eprintln!("Only .pna files are supported.");
        process::exit(1);
    }

    let path = Path::new(path);
    if !path.exists() {
        eprintln!("{} not found.", path.display());
        process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            if runner::run(&source, Some(&filename), options).is_err() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

/// Logs to stderr when `RUST_LOG` is set, e.g. `RUST_LOG=pna=debug`.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}
