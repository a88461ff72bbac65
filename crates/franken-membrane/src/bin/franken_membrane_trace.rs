#![forbid(unsafe_code)]

//! Run a scripted membrane session and print the JSON trace report.
//!
//! Exit semantics:
//! - `0` => every step succeeded
//! - `2` => at least one step failed (report still emitted)
//! - `1` => CLI/runtime failure

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use frankenengine_membrane::trace_script::{TraceScript, run_script};

#[derive(Debug)]
struct CliArgs {
    input: PathBuf,
    out_path: Option<PathBuf>,
    summary_only: bool,
    print_help: bool,
}

fn main() {
    match run() {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn Error>> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.print_help {
        return Ok(0);
    }

    let text = fs::read_to_string(&args.input)
        .map_err(|error| format!("failed to read script `{}`: {error}", args.input.display()))?;
    let script = TraceScript::from_json(&text)?;
    let report = run_script(&script)?;

    let encoded = if args.summary_only {
        serde_json::to_string_pretty(&report.summary)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    if let Some(out_path) = &args.out_path {
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(out_path, encoded.as_bytes())?;
    }

    println!("{encoded}");

    if report.summary.failed_steps == 0 { Ok(0) } else { Ok(2) }
}

fn parse_args<I>(args: I) -> Result<CliArgs, Box<dyn Error>>
where
    I: IntoIterator<Item = String>,
{
    let mut input = None::<PathBuf>;
    let mut out_path = None::<PathBuf>;
    let mut summary_only = false;
    let mut print_help_flag = false;

    let mut iter = args.into_iter().peekable();
    if iter.peek().map(String::as_str) == Some("run") {
        iter.next();
    }
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--input" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "missing value for --input".to_string())?;
                input = Some(PathBuf::from(value));
            }
            "--out" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "missing value for --out".to_string())?;
                out_path = Some(PathBuf::from(value));
            }
            "--summary" => {
                summary_only = true;
            }
            "--help" | "-h" => {
                print_help();
                print_help_flag = true;
            }
            other => {
                return Err(format!("unknown argument `{other}`").into());
            }
        }
    }

    let input = if print_help_flag {
        PathBuf::new()
    } else {
        input.ok_or_else(|| "--input is required".to_string())?
    };

    Ok(CliArgs {
        input,
        out_path,
        summary_only,
        print_help: print_help_flag,
    })
}

fn print_help() {
    println!(
        "Usage: cargo run -p frankenengine-membrane --bin franken_membrane_trace -- \\
  run --input <path> [--out <path>] [--summary]\n\
\n\
Loads `{{config?, data, steps}}`, runs every step through a reactive and a read-only\n\
wrapper of `data`, and prints the trace report (or only its summary).\n\
Exit code 2 indicates that at least one step failed."
    );
}
