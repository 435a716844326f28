use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use teenyjvm::runtime::DEFAULT_MAX_CALL_DEPTH;
use teenyjvm::{run_class_file, RuntimeConfig};

/// Run the `main` method of a compiled Java class.
#[derive(Parser, Debug)]
#[command(name = "teenyjvm", version, about, long_about = None)]
struct Args {
    /// Path to the .class file
    path: PathBuf,

    /// Maximum nesting of method calls before the run is aborted
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = RuntimeConfig {
        max_call_depth: args.max_call_depth,
    };
    match run_class_file(&args.path, io::stdout().lock(), config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("teenyjvm: {}: {err}", args.path.display());
            ExitCode::FAILURE
        }
    }
}
