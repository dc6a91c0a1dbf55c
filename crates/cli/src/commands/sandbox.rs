// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet sandbox` - sandbox lifecycle (spec.md §6 `/v1/sandboxes`).

use anyhow::Result;
use clap::{Args, Subcommand};
use fleetd_core::Sandbox;
use fleetd_wire::requests::{
    CreateSandboxRequest, DestroySandboxRequest, RenewSandboxLeaseRequest, RevertSandboxRequest,
};
use fleetd_wire::responses::{EventsPage, RevertResult};

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct SandboxArgs {
    #[command(subcommand)]
    pub command: SandboxCommand,
}

#[derive(Subcommand)]
pub enum SandboxCommand {
    /// Create a sandbox, optionally provisioning it immediately
    Create {
        name: String,
        #[arg(long)]
        profile: String,
        #[arg(long)]
        keepalive: Option<bool>,
        /// Clone, configure and boot the VM before returning
        #[arg(long)]
        provision: bool,
    },
    /// Start a stopped sandbox
    Start { vmid: u32 },
    /// Stop a running sandbox
    Stop { vmid: u32 },
    /// Destroy a sandbox
    Destroy {
        vmid: u32,
        /// Bypass the destroy-compatible-state gate
        #[arg(long)]
        force: bool,
    },
    /// Roll back to the clean snapshot
    Revert {
        vmid: u32,
        #[arg(long)]
        force: bool,
        /// Restart the sandbox after reverting
        #[arg(long)]
        restart: bool,
    },
    /// Bump `last_used_at` (resets idle-stop eligibility)
    Touch { vmid: u32 },
    /// Extend the sandbox's lease
    RenewLease { vmid: u32, ttl_seconds: u64 },
    /// List recorded events for a sandbox
    Events {
        vmid: u32,
        #[arg(long)]
        after: Option<String>,
        #[arg(long)]
        tail: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

pub async fn handle(command: SandboxCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        SandboxCommand::Create { name, profile, keepalive, provision } => {
            let request = CreateSandboxRequest { name, profile, keepalive, provision: Some(provision) };
            let sandbox: Sandbox = client.post("/v1/sandboxes", &request).await?;
            print_sandbox(format, &sandbox)?;
        }
        SandboxCommand::Start { vmid } => {
            let sandbox: Sandbox = client.post_empty(&format!("/v1/sandboxes/{vmid}/start")).await?;
            print_sandbox(format, &sandbox)?;
        }
        SandboxCommand::Stop { vmid } => {
            let sandbox: Sandbox = client.post_empty(&format!("/v1/sandboxes/{vmid}/stop")).await?;
            print_sandbox(format, &sandbox)?;
        }
        SandboxCommand::Destroy { vmid, force } => {
            let request = DestroySandboxRequest { force };
            let sandbox: Sandbox = client.post(&format!("/v1/sandboxes/{vmid}/destroy"), &request).await?;
            print_sandbox(format, &sandbox)?;
        }
        SandboxCommand::Revert { vmid, force, restart } => {
            let request = RevertSandboxRequest { force, restart };
            let result: RevertResult = client.post(&format!("/v1/sandboxes/{vmid}/revert"), &request).await?;
            format_or_json(format, &result, || {
                println!(
                    "{} {} from snapshot {} (was_running={}, restarted={})",
                    color::header("Reverted sandbox"),
                    result.sandbox.vmid,
                    result.snapshot,
                    result.was_running,
                    result.restarted
                );
            })?;
        }
        SandboxCommand::Touch { vmid } => {
            let sandbox: Sandbox = client.post_empty(&format!("/v1/sandboxes/{vmid}/touch")).await?;
            print_sandbox(format, &sandbox)?;
        }
        SandboxCommand::RenewLease { vmid, ttl_seconds } => {
            let request = RenewSandboxLeaseRequest { ttl_seconds };
            let sandbox: Sandbox = client.post(&format!("/v1/sandboxes/{vmid}/lease/renew"), &request).await?;
            print_sandbox(format, &sandbox)?;
        }
        SandboxCommand::Events { vmid, after, tail, limit } => {
            let mut query = Vec::new();
            if let Some(after) = after {
                query.push(format!("after={after}"));
            }
            if let Some(tail) = tail {
                query.push(format!("tail={tail}"));
            }
            if let Some(limit) = limit {
                query.push(format!("limit={limit}"));
            }
            let path = if query.is_empty() {
                format!("/v1/sandboxes/{vmid}/events")
            } else {
                format!("/v1/sandboxes/{vmid}/events?{}", query.join("&"))
            };
            let page: EventsPage = client.get(&path).await?;
            format_or_json(format, &page, || {
                for event in &page.events {
                    println!("[{}] {} {}", event.timestamp, event.id, event.kind);
                }
            })?;
        }
    }
    Ok(())
}

fn print_sandbox(format: OutputFormat, sandbox: &Sandbox) -> Result<()> {
    format_or_json(format, sandbox, || {
        println!("{} {}", color::header("Sandbox:"), sandbox.vmid);
        println!("  {} {}", color::context("Name:"), sandbox.name);
        println!("  {} {}", color::context("State:"), color::status(&sandbox.state.to_string()));
        println!("  {} {}", color::context("Profile:"), sandbox.profile);
        if !sandbox.ip.is_empty() {
            println!("  {} {}", color::context("IP:"), sandbox.ip);
        }
    })
}
