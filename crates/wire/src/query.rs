// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query-string parsing rules the Control API surface owns (spec.md
//! §4.5): non-negative integer bounds and mutually exclusive parameter
//! pairs.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query parameter {0:?} must be a non-negative integer")]
    InvalidInt(&'static str),

    #[error("{0:?} and {1:?} are mutually exclusive")]
    MutuallyExclusive(&'static str, &'static str),
}

/// `GET /v1/sandboxes/{vmid}/events?after=&tail=&limit=` (spec.md §6:
/// "tail/after mutually exclusive; defaults 200/max 1000").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventsQuery {
    pub after: Option<String>,
    pub tail: Option<u32>,
    pub limit: u32,
}

const DEFAULT_LIMIT: u32 = 200;
const MAX_LIMIT: u32 = 1000;

pub fn parse_events_query(
    after: Option<&str>,
    tail: Option<&str>,
    limit: Option<&str>,
) -> Result<EventsQuery, QueryError> {
    if after.is_some() && tail.is_some() {
        return Err(QueryError::MutuallyExclusive("after", "tail"));
    }

    let tail = tail.map(|v| parse_nonneg(v, "tail")).transpose()?;
    let limit = match limit {
        Some(v) => parse_nonneg(v, "limit")?.min(MAX_LIMIT),
        None => DEFAULT_LIMIT,
    };

    Ok(EventsQuery { after: after.map(str::to_string), tail, limit })
}

fn parse_nonneg(raw: &str, field: &'static str) -> Result<u32, QueryError> {
    raw.parse::<u32>().map_err(|_| QueryError::InvalidInt(field))
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
