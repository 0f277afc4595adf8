use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gnomish::analysis::{self, ScopeKind, SymbolTable};
use gnomish::ast::Expr;
use gnomish::interpreter::Interpreter;
use gnomish::methods::MethodRegistry;
use gnomish::prelude::{self, Transcript};
use gnomish::{fmt, wire};

/// Analyze and run Gnomish programs stored in the wire format.
#[derive(Parser, Debug)]
#[command(name = "gnomish")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze and run a program, printing its output and result
    Run {
        /// Path to a JSON wire-format program
        file: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze a program and print its type
    Check { file: PathBuf },
    /// Print a program as an S-expression
    Sexp { file: PathBuf },
}

fn load(path: &Path) -> anyhow::Result<Expr<()>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    wire::from_str(&text).with_context(|| format!("failed to load {}", path.display()))
}

/// A program scope below the shared prelude, the way a host would set one up.
fn environment() -> (SymbolTable, MethodRegistry) {
    let base_symbols = Arc::new(prelude::standard_symbols());
    let base_methods = prelude::standard_methods();
    (
        SymbolTable::derive(base_symbols, ScopeKind::named("program")),
        MethodRegistry::derive(base_methods),
    )
}

fn main() -> anyhow::Result<()> {
    if let Ok(filter) = EnvFilter::try_from_env("GNOMISH_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, json } => {
            let program = load(&file)?;
            let (mut symbols, methods) = environment();
            let analyzed = analysis::analyze(&program, &mut symbols, &methods)?;

            let mut transcript = Transcript::new();
            let value = Interpreter::with_host(&mut transcript).run(&analyzed)?;
            for line in transcript.lines() {
                println!("{}", line);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&value.to_json())?);
            } else {
                println!("{}", value);
            }
        }
        Commands::Check { file } => {
            let program = load(&file)?;
            let (mut symbols, methods) = environment();
            let analyzed = analysis::analyze(&program, &mut symbols, &methods)?;
            println!("{}", analyzed.info().ty);
        }
        Commands::Sexp { file } => {
            let program = load(&file)?;
            println!("{}", fmt::to_sexp(&program));
        }
    }

    Ok(())
}
