//! CLI tool for lowering let statements
//!
//! Usage: letlower [options] <unit.json>
//!
//! Options:
//!   --options <file>   JSON compiler options, overriding those of the unit
//!
//! Prints the required runtime headers followed by the emitted lines.
//! Set RUST_LOG=letlower=trace to see every dispatch decision.

use letlower::{CompilationUnit, CompilerOptions};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// CLI configuration
struct Config {
    unit_path: PathBuf,
    options_path: Option<PathBuf>,
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("letlower", |s| s.as_str());

    let mut options_path: Option<PathBuf> = None;
    let mut unit_arg: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        let Some(arg) = args.get(i) else {
            break;
        };
        if arg == "--options" {
            i += 1;
            options_path = Some(PathBuf::from(
                args.get(i)
                    .ok_or_else(|| "--options requires a file".to_string())?,
            ));
        } else if arg.starts_with('-') {
            return Err(format!("Unknown option: {}", arg));
        } else {
            unit_arg = Some(arg);
        }
        i += 1;
    }

    let unit_arg = unit_arg
        .ok_or_else(|| format!("Usage: {} [--options <file>] <unit.json>", program_name))?;

    Ok(Config {
        unit_path: PathBuf::from(unit_arg),
        options_path,
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args()?;

    let source = fs::read_to_string(&config.unit_path)
        .map_err(|e| format!("Cannot read {}: {}", config.unit_path.display(), e))?;
    let mut unit = CompilationUnit::from_json(&source)
        .map_err(|e| format!("Invalid unit {}: {}", config.unit_path.display(), e))?;

    if let Some(path) = &config.options_path {
        let options = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        unit.options = serde_json::from_str::<CompilerOptions>(&options)
            .map_err(|e| format!("Invalid options {}: {}", path.display(), e))?;
    }

    let compiled = unit.compile()?;
    for header in &compiled.headers {
        println!("#include \"{}.h\"", header);
    }
    if !compiled.headers.is_empty() {
        println!();
    }
    for line in &compiled.lines {
        println!("{}", line);
    }

    Ok(())
}
