// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet`: the Control API client CLI (spec.md §6). Connects over the
//! daemon's Unix-domain socket by default, or a bearer-authenticated
//! loopback TCP port if `FLEETD_HOST` is set.

mod client;
mod color;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use exit_error::ExitError;

use client::DaemonClient;
use commands::{exposure, job, sandbox, session, status, workspace};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "fleet", version, about = "Control client for the sandbox fleet daemon", styles = color::styles())]
struct Cli {
    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create and inspect jobs
    Job(job::JobArgs),
    /// Sandbox lifecycle
    Sandbox(sandbox::SandboxArgs),
    /// Workspace lifecycle
    Workspace(workspace::WorkspaceArgs),
    /// Session resume/stop/fork/doctor
    Session(session::SessionArgs),
    /// Publish/unpublish sandbox ports
    Exposure(exposure::ExposureArgs),
    /// Daemon metrics and background-task health
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };

    if let Err(err) = run(cli.command, format).await {
        if let Some(exit_err) = err.downcast_ref::<ExitError>() {
            eprintln!("{}", exit_err.message);
            std::process::exit(exit_err.code);
        }
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command, format: OutputFormat) -> anyhow::Result<()> {
    let client = DaemonClient::from_env()?;

    match command {
        Command::Job(args) => job::handle(args.command, &client, format).await,
        Command::Sandbox(args) => sandbox::handle(args.command, &client, format).await,
        Command::Workspace(args) => workspace::handle(args.command, &client, format).await,
        Command::Session(args) => session::handle(args.command, &client, format).await,
        Command::Exposure(args) => exposure::handle(args.command, &client, format).await,
        Command::Status => status::handle(&client, format).await,
    }
}
