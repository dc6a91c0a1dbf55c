// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet session` - resume/stop/fork/doctor (spec.md §6 `/v1/sessions`).

use anyhow::Result;
use clap::{Args, Subcommand};
use fleetd_core::{DoctorSection, Session};
use fleetd_wire::requests::{ForkSessionRequest, ResumeSessionRequest};
use serde::Deserialize;

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Reattach (or rebind) a session to a live sandbox
    Resume {
        id: String,
        /// Override the profile used if a rebind is needed
        #[arg(long)]
        profile: Option<String>,
    },
    /// Stop the session's current sandbox, keeping the binding
    Stop { id: String },
    /// Fork the session's workspace into a new session
    Fork { id: String, name: String },
    /// Run a diagnostic bundle against the session
    Doctor { id: String },
}

#[derive(Debug, Deserialize)]
struct SessionWithSandbox {
    #[serde(flatten)]
    session: Session,
}

#[derive(Debug, Deserialize, serde::Serialize)]
struct DoctorReport {
    sections: Vec<DoctorSection>,
}

pub async fn handle(command: SessionCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SessionCommand::Resume { id, profile } => {
            let request = ResumeSessionRequest { profile };
            let result: SessionWithSandbox = client.post(&format!("/v1/sessions/{id}/resume"), &request).await?;
            print_session(format, &result.session)?;
        }
        SessionCommand::Stop { id } => {
            let result: SessionWithSandbox = client.post_empty(&format!("/v1/sessions/{id}/stop")).await?;
            print_session(format, &result.session)?;
        }
        SessionCommand::Fork { id, name } => {
            let request = ForkSessionRequest { name };
            let forked: Session = client.post(&format!("/v1/sessions/{id}/fork"), &request).await?;
            print_session(format, &forked)?;
        }
        SessionCommand::Doctor { id } => {
            let report: DoctorReport = client.post_empty(&format!("/v1/sessions/{id}/doctor")).await?;
            format_or_json(format, &report, || {
                for section in &report.sections {
                    let marker = if section.ok { color::status("running") } else { color::status("failed") };
                    println!("{} {}: {}", marker, section.title, section.body);
                }
            })?;
        }
    }
    Ok(())
}

fn print_session(format: OutputFormat, session: &Session) -> Result<()> {
    format_or_json(format, session, || {
        println!("{} {}", color::header("Session:"), session.id);
        println!("  {} {}", color::context("Workspace:"), session.workspace_id);
        println!("  {} {}", color::context("Profile:"), session.profile);
        if let Some(vmid) = session.current_vmid {
            println!("  {} {}", color::context("Current sandbox:"), vmid);
        }
    })
}
