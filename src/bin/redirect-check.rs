use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use redirect_gateway::routing::validation::lint;
use redirect_gateway::routing::{resolve_in, RedirectOutcome, RoutingTable};

#[derive(Parser)]
#[command(name = "redirect-check")]
#[command(about = "Offline checks for redirect-gateway routing files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a routing file and report rules that can never redirect
    Validate { file: PathBuf },
    /// Show the decision the gateway would make for a host and path
    Resolve {
        file: PathBuf,
        host: String,
        path: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => validate(&file),
        Commands::Resolve { file, host, path } => resolve(&file, &host, &path),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn load(file: &Path) -> Result<RoutingTable, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(file).map_err(|e| format!("{}: {}", file.display(), e))?;
    let table = RoutingTable::parse(&bytes).map_err(|e| format!("{}: {}", file.display(), e))?;
    Ok(table)
}

fn validate(file: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let table = load(file)?;
    println!("{}: {} hosts, {} rules", file.display(), table.len(), table.rule_count());

    let issues = lint(&table);
    for issue in &issues {
        println!("warning: {}", issue);
    }

    Ok(if issues.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn resolve(file: &Path, host: &str, path: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let table = load(file)?;

    let outcome = resolve_in(&table, host, path);
    match &outcome {
        RedirectOutcome::Redirect { location, .. } => {
            println!("{} {}", outcome.status().as_u16(), location);
            Ok(ExitCode::SUCCESS)
        }
        RedirectOutcome::NoRoute(reason) => {
            println!("{} ({})", outcome.status().as_u16(), reason.as_str());
            Ok(ExitCode::from(1))
        }
    }
}
