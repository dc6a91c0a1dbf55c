// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet workspace` - workspace lifecycle (spec.md §6 `/v1/workspaces`).

use anyhow::Result;
use clap::{Args, Subcommand};
use fleetd_adapters::FsckOutcome;
use fleetd_core::Workspace;
use fleetd_wire::requests::{
    AttachWorkspaceRequest, CheckWorkspaceRequest, CreateWorkspaceRequest, CreateWorkspaceSnapshotRequest,
    ForkWorkspaceRequest, RebindWorkspaceRequest,
};
use fleetd_wire::responses::RebindResult;

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub command: WorkspaceCommand,
}

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// Create a workspace volume
    Create { name: String, storage: String, size_gb: u32 },
    /// Fetch a workspace by ID or name
    Get { id: String },
    /// Attach a workspace to a sandbox
    Attach { id: String, vmid: u32 },
    /// Detach a workspace from its current sandbox
    Detach { id: String },
    /// Run an fsck against the workspace's volume
    Check {
        id: String,
        #[arg(long)]
        repair: bool,
    },
    /// Fork a workspace's volume into a new one
    Fork {
        id: String,
        name: String,
        #[arg(long)]
        from_snapshot: Option<String>,
    },
    /// Swap a workspace onto a freshly provisioned sandbox
    Rebind {
        id: String,
        #[arg(long)]
        profile: String,
        #[arg(long)]
        ttl_minutes: Option<u32>,
        /// Keep the previous sandbox running instead of destroying it
        #[arg(long)]
        keep_old: bool,
    },
    /// Snapshot the workspace's current volume state
    Snapshot { id: String, name: String },
    /// Restore the workspace's volume from a named snapshot
    Restore { id: String, name: String },
}

pub async fn handle(command: WorkspaceCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        WorkspaceCommand::Create { name, storage, size_gb } => {
            let request = CreateWorkspaceRequest { name, storage, size_gb };
            let workspace: Workspace = client.post("/v1/workspaces", &request).await?;
            print_workspace(format, &workspace)?;
        }
        WorkspaceCommand::Get { id } => {
            let workspace: Workspace = client.get(&format!("/v1/workspaces/{id}")).await?;
            print_workspace(format, &workspace)?;
        }
        WorkspaceCommand::Attach { id, vmid } => {
            let request = AttachWorkspaceRequest { vmid };
            let workspace: Workspace = client.post(&format!("/v1/workspaces/{id}/attach"), &request).await?;
            print_workspace(format, &workspace)?;
        }
        WorkspaceCommand::Detach { id } => {
            let workspace: Workspace = client.post_empty(&format!("/v1/workspaces/{id}/detach")).await?;
            print_workspace(format, &workspace)?;
        }
        WorkspaceCommand::Check { id, repair } => {
            let request = CheckWorkspaceRequest { repair };
            let outcome: FsckOutcome = client.post(&format!("/v1/workspaces/{id}/check"), &request).await?;
            format_or_json(format, &outcome, || {
                println!(
                    "{} status={:?} reboot_required={} exit_code={}",
                    color::header("fsck:"),
                    outcome.status,
                    outcome.reboot_required,
                    outcome.exit_code
                );
            })?;
        }
        WorkspaceCommand::Fork { id, name, from_snapshot } => {
            let request = ForkWorkspaceRequest { name, from_snapshot };
            let workspace: Workspace = client.post(&format!("/v1/workspaces/{id}/fork"), &request).await?;
            print_workspace(format, &workspace)?;
        }
        WorkspaceCommand::Rebind { id, profile, ttl_minutes, keep_old } => {
            let request = RebindWorkspaceRequest { profile, ttl_minutes, keep_old };
            let result: RebindResult = client.post(&format!("/v1/workspaces/{id}/rebind"), &request).await?;
            format_or_json(format, &result, || {
                println!(
                    "{} workspace {} now bound to sandbox {} (was {:?})",
                    color::header("Rebound"),
                    result.workspace.id,
                    result.sandbox.vmid,
                    result.old_vmid
                );
            })?;
        }
        WorkspaceCommand::Snapshot { id, name } => {
            let request = CreateWorkspaceSnapshotRequest { name: name.clone() };
            client.post_no_content(&format!("/v1/workspaces/{id}/snapshots"), &request).await?;
            println!("{} {name}", color::header("Snapshot created:"));
        }
        WorkspaceCommand::Restore { id, name } => {
            client.post_no_content_empty(&format!("/v1/workspaces/{id}/snapshots/{name}/restore")).await?;
            println!("{} {name}", color::header("Restored from snapshot:"));
        }
    }
    Ok(())
}

fn print_workspace(format: OutputFormat, workspace: &Workspace) -> Result<()> {
    format_or_json(format, workspace, || {
        println!("{} {}", color::header("Workspace:"), workspace.id);
        println!("  {} {}", color::context("Name:"), workspace.name);
        println!("  {} {}", color::context("Storage:"), workspace.storage);
        println!("  {} {}", color::context("Size (GB):"), workspace.size_gb);
        if let Some(vmid) = workspace.attached_vm {
            println!("  {} {}", color::context("Attached to:"), vmid);
        }
    })
}
