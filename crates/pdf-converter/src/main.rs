// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdf-converter — command-line entry point.
//
// Loads `.env`, initialises logging on stderr, reads the configuration from
// the environment and runs the requested subcommand.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use pdf_converter::{ConverterConfig, ConverterError};
use pdf_converter_core::human_errors::humanize_error;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConverterConfig::from_env();
    tracing::debug!(?config, "configuration loaded");

    match cli::run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print the failure and a plain-English hint to stderr.
fn report(err: &ConverterError) {
    tracing::error!(error = %err, "command failed");
    eprintln!("[ERROR] Conversion failed: {err}");
    let human = humanize_error(err);
    eprintln!("        {} {}", human.message, human.suggestion);
    if human.retriable {
        eprintln!("        Running the command again may succeed.");
    }
}
