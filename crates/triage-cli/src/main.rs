//! Triage CLI binary entrypoint.
//!
//! This is the main entry point for the `triage` command-line tool.

use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use triage_cli::cli::{Cli, Commands};
use triage_cli::commands::analyze::read_document;
use triage_cli::commands::{AnalyzeCommand, ThresholdsCommand};
use triage_cli::output::OutputFormat;
use triage_cli::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);

    match cli.command {
        Commands::Analyze(args) => {
            let cmd = AnalyzeCommand::from_args(&args)?;
            let document = read_document(args.input_path())?;
            // The output file is only opened once there is a report to put in it.
            let report = cmd.run(&document)?;

            match &args.output {
                Some(path) => {
                    let file = File::create(path).map_err(|source| CliError::File {
                        path: path.clone(),
                        source,
                    })?;
                    cmd.write_report(&report, &mut BufWriter::new(file), &format)?;
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    cmd.write_report(&report, &mut stdout, &format)?;
                }
            }
        }
        Commands::Thresholds(args) => {
            let cmd = ThresholdsCommand::from_args(&args)?;
            let mut stdout = io::stdout().lock();
            cmd.execute(&mut stdout, &format)?;
        }
    }

    Ok(())
}
