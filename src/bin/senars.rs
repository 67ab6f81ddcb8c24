//! `senars` — a thin CLI wrapper around the kernel (spec.md §6): feed it
//! Narsese, run cycles, print what got derived. Not part of the kernel's
//! core surface; the language-model bridge, REPL, and monitoring layer
//! this binary might otherwise grow into are out of scope and live
//! outside this crate.

use std::process::ExitCode;

use nar::{Nar, NarsError};

struct Args {
    cycles: u32,
    input_path: Option<String>,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut cycles = 10;
    let mut input_path = None;
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--cycles=") {
            cycles = value.parse().map_err(|_| format!("invalid --cycles value '{value}'"))?;
        } else if arg == "--cycles" {
            let value = iter.next().ok_or("--cycles requires a value")?;
            cycles = value.parse().map_err(|_| format!("invalid --cycles value '{value}'"))?;
        } else if let Some(value) = arg.strip_prefix("--input=") {
            input_path = Some(value.to_string());
        } else if arg == "--input" {
            input_path = Some(iter.next().ok_or("--input requires a value")?.clone());
        } else if arg.starts_with("--lm") {
            // Language-model bridge mode: out of scope for this kernel,
            // accepted and ignored so scripts written against the wider
            // system don't fail to launch.
        } else {
            return Err(format!("unrecognized argument '{arg}'"));
        }
    }
    Ok(Args { cycles, input_path })
}

fn run() -> Result<(), (ExitCode, String)> {
    env_logger::init();
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw).map_err(|e| (ExitCode::from(2), e))?;

    let mut nar = Nar::default();

    let source = match &args.input_path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| (ExitCode::from(1), format!("reading '{path}': {e}")))?,
        None => concat!(
            "<cat --> animal>.\n",
            "<dog --> animal>.\n",
            "<cat --> furry>.\n",
        )
        .to_string(),
    };

    nar.input_all(&source).map_err(|e| match e {
        NarsError::Parse { line, col, reason } => {
            (ExitCode::from(2), format!("parse error at line {line}, col {col}: {reason}"))
        }
        other => (ExitCode::from(1), other.to_string()),
    })?;

    let stats = nar.stats();
    println!("senars: loaded {} concept(s)", stats.memory.focus_concepts + stats.memory.long_term_concepts);

    nar.run_cycles(args.cycles);

    let stats = nar.stats();
    println!(
        "senars: ran {} cycle(s); {} concept(s), {} belief(s)",
        args.cycles,
        stats.memory.focus_concepts + stats.memory.long_term_concepts,
        nar.beliefs(None).len(),
    );
    for belief in nar.beliefs(None) {
        println!("  {belief}");
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err((code, message)) => {
            eprintln!("senars: {message}");
            code
        }
    }
}
