// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet status` - daemon metrics/task-health snapshot (spec.md §9).

use anyhow::Result;
use fleetd_wire::responses::StatusResponse;

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};

pub async fn handle(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let status: StatusResponse = client.get("/v1/status").await?;
    format_or_json(format, &status, || {
        println!("{}", color::header("Background tasks:"));
        for (name, health) in &status.tasks {
            println!("  {name}: {:?}", health);
        }
        if !status.recent_failures.is_empty() {
            println!("{}", color::header("Recent failures:"));
            for failure in &status.recent_failures {
                println!("  [{}] {}: {}", failure.timestamp, failure.kind, failure.message);
            }
        }
    })
}
