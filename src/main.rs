//! Command line entry point.
//!
//! Parses the arguments, runs the command and writes its report to stdout or to the requested
//! file. Logging is initialised first so every later step can emit diagnostics.

use std::{
    io::{self, BufWriter},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use fragility::{
    cli::{render_report, run_cli, Cli},
    io::write_file,
    logging,
};

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to execute command")?;

    match &summary.output {
        Some(path) => write_file(path, |writer| render_report(&summary.report, writer))
            .with_context(|| format!("failed to write `{}`", path.display()))?,
        None => {
            let stdout = io::stdout();
            render_report(&summary.report, BufWriter::new(stdout.lock()))
                .context("failed to render report")?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        error!(error = format!("{err:#}"), "command execution failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
