// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message-bus scope allow-list (spec.md §4.5: "Allow-list of scopes for
//! message bus: `{job, workspace, session}`"). Sandbox-scoped messages are
//! not part of the bus; sandbox state is observed exclusively through the
//! sandbox event stream (spec.md §6, `GET /v1/sandboxes/{vmid}/events`),
//! per the open-question decision recorded in DESIGN.md.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusScope {
    Job,
    Workspace,
    Session,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0:?} is not an allowed message-bus scope")]
pub struct InvalidBusScope(pub String);

impl BusScope {
    pub const ALL: [BusScope; 3] = [BusScope::Job, BusScope::Workspace, BusScope::Session];
}

impl fmt::Display for BusScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BusScope::Job => "job",
            BusScope::Workspace => "workspace",
            BusScope::Session => "session",
        };
        f.write_str(s)
    }
}

impl FromStr for BusScope {
    type Err = InvalidBusScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job" => Ok(BusScope::Job),
            "workspace" => Ok(BusScope::Workspace),
            "session" => Ok(BusScope::Session),
            other => Err(InvalidBusScope(other.to_string())),
        }
    }
}
