use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use jobkit::{convert, init_logging, JobInput};

/// Default optimizer tolerance, in document units.
const DEFAULT_TOLERANCE: f64 = 0.08;

struct Args {
    input: PathBuf,
    optimize: bool,
    tolerance: f64,
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut optimize = true;
    let mut tolerance = DEFAULT_TOLERANCE;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-optimize" => optimize = false,
            "--tolerance" => {
                let value = args.next().context("--tolerance requires a value")?;
                tolerance = value
                    .parse()
                    .with_context(|| format!("bad tolerance: {value}"))?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            other => bail!("unexpected argument: {other}"),
        }
    }

    let Some(input) = input else {
        print_usage();
        bail!("missing input file");
    };
    Ok(Args {
        input,
        optimize,
        tolerance,
    })
}

fn print_usage() {
    eprintln!("usage: jobkit [--no-optimize] [--tolerance <units>] <file>");
    eprintln!();
    eprintln!("Converts an SVG, DXF, G-code or native job file into the");
    eprintln!("canonical job document, printed as JSON on stdout.");
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let job = convert(JobInput::Text(text), args.optimize, args.tolerance)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = init_logging() {
        eprintln!("failed to initialize logging: {err}");
    }
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
