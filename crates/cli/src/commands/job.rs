// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet job` - create and inspect jobs (spec.md §6 `/v1/jobs`).

use anyhow::Result;
use clap::{Args, Subcommand};
use fleetd_core::Job;
use fleetd_wire::requests::{CreateJobRequest, WorkspaceCreateSpec};

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Submit a new job
    Create {
        /// Git URL the sandbox will clone
        repo_url: String,
        /// Profile name resolved from the profiles directory
        #[arg(long)]
        profile: String,
        /// Task description/instructions for the guest runner
        #[arg(long)]
        task: String,
        /// Git ref to check out (default: main)
        #[arg(long = "ref")]
        git_ref: Option<String>,
        /// "dangerous" or "safe" (default: dangerous)
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        ttl_minutes: Option<u32>,
        #[arg(long)]
        keepalive: Option<bool>,
        /// Attach to an existing workspace by ID
        #[arg(long, conflicts_with_all = ["create_workspace_storage", "create_workspace_size_gb"])]
        workspace_id: Option<String>,
        /// Create a workspace inline: storage backend name
        #[arg(long, requires = "create_workspace_size_gb")]
        create_workspace_storage: Option<String>,
        /// Create a workspace inline: size in GB
        #[arg(long)]
        create_workspace_size_gb: Option<u32>,
        /// How long to block waiting for provisioning before returning
        #[arg(long)]
        wait_seconds: Option<u64>,
        /// Bind (or auto-create) a session by this ID
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Fetch a job by ID
    Get {
        id: String,
        /// Include the last N events for this job (max 1000)
        #[arg(long)]
        events_tail: Option<u32>,
    },
}

pub async fn handle(command: JobCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        JobCommand::Create {
            repo_url,
            profile,
            task,
            git_ref,
            mode,
            ttl_minutes,
            keepalive,
            workspace_id,
            create_workspace_storage,
            create_workspace_size_gb,
            wait_seconds,
            session_id,
        } => {
            let workspace_create = match (create_workspace_storage, create_workspace_size_gb) {
                (Some(storage), Some(size_gb)) => {
                    Some(WorkspaceCreateSpec { name: format!("job-{task}"), storage, size_gb })
                }
                _ => None,
            };
            let request = CreateJobRequest {
                repo_url,
                git_ref,
                profile,
                task,
                mode,
                ttl_minutes,
                keepalive,
                workspace_id,
                workspace_create,
                workspace_wait_seconds: wait_seconds,
                session_id,
            };
            let job: Job = client.post("/v1/jobs", &request).await?;
            print_job(format, &job)?;
        }
        JobCommand::Get { id, events_tail } => {
            let path = match events_tail {
                Some(tail) => format!("/v1/jobs/{id}?events_tail={tail}"),
                None => format!("/v1/jobs/{id}"),
            };
            let job: serde_json::Value = client.get(&path).await?;
            format_or_json(format, &job, || println!("{}", serde_json::to_string_pretty(&job).unwrap_or_default()))?;
        }
    }
    Ok(())
}

fn print_job(format: OutputFormat, job: &Job) -> Result<()> {
    format_or_json(format, job, || {
        println!("{} {}", color::header("Job:"), job.id);
        println!("  {} {}", color::context("Status:"), color::status(&job.status.to_string()));
        println!("  {} {}", color::context("Profile:"), job.profile);
        println!("  {} {}", color::context("Repo:"), job.repo_url);
        println!("  {} {}", color::context("Ref:"), job.git_ref);
        if let Some(vmid) = job.sandbox_vmid {
            println!("  {} {}", color::context("Sandbox:"), vmid);
        }
    })
}
