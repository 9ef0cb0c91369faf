mod repl;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use synth_ast::Value;
use synth_engine::{Dictionary, ProveJsonResponse};

#[derive(Parser)]
#[command(name = "synth")]
#[command(about = "Derive arithmetic expressions over a base digit string")]
#[command(version)]
struct Cli {
    /// Base digit string; non-digit characters are stripped
    base: String,

    /// Fixed seed for the search diversification (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prove one or more target values and print the expressions
    Prove {
        /// Target values (integers or rationals like 5/7)
        #[arg(allow_negative_numbers = true)]
        targets: Vec<String>,
        /// Maximum recursion depth; unbounded when omitted
        #[arg(short, long)]
        depth: Option<u64>,
        /// Emit a JSON response envelope per target
        #[arg(long)]
        json: bool,
        /// Re-evaluate each proof through the parser and verify it
        #[arg(long)]
        check: bool,
        /// Print improving partial proofs as sub-derivations land
        #[arg(long)]
        progress: bool,
    },
    /// Export the dictionary contents as JSON pairs
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Interactive session (default when no subcommand is given)
    Repl,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let dict = match build(&cli) {
        Ok(dict) => dict,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Commands::Prove {
            targets,
            depth,
            json,
            check,
            progress,
        }) => run_prove(dict, &targets, depth, json, check, progress),
        Some(Commands::Export { output }) => run_export(&dict, output.as_deref()),
        Some(Commands::Repl) | None => match repl::Repl::new(dict).run() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn build(cli: &Cli) -> Result<Dictionary, synth_engine::EngineError> {
    match cli.seed {
        Some(seed) => Dictionary::build_seeded(&cli.base, seed),
        None => Dictionary::build(&cli.base),
    }
}

fn run_prove(
    mut dict: Dictionary,
    targets: &[String],
    depth: Option<u64>,
    json: bool,
    check: bool,
    progress: bool,
) -> ExitCode {
    let mut status = ExitCode::SUCCESS;
    for target in targets {
        let mut report = |partial: &str| println!("  ... {partial}");
        let on_progress: Option<&mut dyn FnMut(&str)> =
            if progress && !json { Some(&mut report) } else { None };

        match dict.prove_with(target, depth, on_progress) {
            Ok(proof) => {
                if check {
                    if let Err(reason) = verify(target, &proof) {
                        eprintln!("error: proof verification failed for {target}: {reason}");
                        status = ExitCode::FAILURE;
                        continue;
                    }
                }
                if json {
                    print_json(&ProveJsonResponse::ok(dict.base(), target, proof));
                } else {
                    println!("{target} = {proof}");
                }
            }
            Err(e) => {
                if json {
                    print_json(&ProveJsonResponse::err(dict.base(), target, &e));
                } else {
                    eprintln!("error: {e}");
                }
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}

fn verify(target: &str, proof: &str) -> Result<(), String> {
    let expected = Value::parse(target).map_err(|e| e.to_string())?;
    let got = synth_parser::evaluate_str(proof).map_err(|e| e.to_string())?;
    if got == expected {
        Ok(())
    } else {
        Err(format!("evaluates to {got}, expected {expected}"))
    }
}

fn print_json(response: &ProveJsonResponse) {
    match serde_json::to_string(response) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: cannot serialize response: {e}"),
    }
}

fn run_export(dict: &Dictionary, output: Option<&std::path::Path>) -> ExitCode {
    let pairs = dict.export_pairs();
    let json = match serde_json::to_string_pretty(&pairs) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot serialize dictionary: {e}");
            return ExitCode::FAILURE;
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, json) {
                eprintln!("error: cannot write {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
            println!("exported {} entries to {}", pairs.len(), path.display());
            ExitCode::SUCCESS
        }
        None => {
            println!("{json}");
            ExitCode::SUCCESS
        }
    }
}
