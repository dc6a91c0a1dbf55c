// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet exposure` - publish/unpublish sandbox ports (spec.md §6
//! `/v1/exposures`).

use anyhow::Result;
use clap::{Args, Subcommand};
use fleetd_core::Exposure;
use fleetd_wire::requests::CreateExposureRequest;

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct ExposureArgs {
    #[command(subcommand)]
    pub command: ExposureCommand,
}

#[derive(Subcommand)]
pub enum ExposureCommand {
    /// Publish a sandbox port through a named exposure
    Create { name: String, vmid: u32, port: u16 },
    /// Tear down an exposure by name
    Destroy { name: String },
}

pub async fn handle(command: ExposureCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        ExposureCommand::Create { name, vmid, port } => {
            let request = CreateExposureRequest { name, vmid, port };
            let exposure: Exposure = client.post("/v1/exposures", &request).await?;
            format_or_json(format, &exposure, || {
                println!("{} {}", color::header("Exposure:"), exposure.name);
                println!("  {} {}", color::context("URL:"), exposure.url);
                println!("  {} {}", color::context("Sandbox:"), exposure.vmid);
            })?;
        }
        ExposureCommand::Destroy { name } => {
            client.delete(&format!("/v1/exposures/{name}")).await?;
            println!("{} {name}", color::header("Exposure destroyed:"));
        }
    }
    Ok(())
}
