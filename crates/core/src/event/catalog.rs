// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The compile-time event schema table (spec.md §4.4).
//!
//! Every event `kind` the system ever records has exactly one row here.
//! Recording an unlisted kind is refused outright — the catalog is the
//! contract between writers and the projections that later read events
//! back, so it is deliberately closed rather than extensible at runtime.

/// One catalog row: the shape a given event `kind` must conform to.
#[derive(Debug, Clone, Copy)]
pub struct EventSchema {
    pub domain: &'static str,
    pub stage: &'static str,
    pub schema_version: u32,
    pub required_fields: &'static [&'static str],
    pub optional_fields: &'static [&'static str],
    pub description: &'static str,
}

macro_rules! catalog {
    ($( $kind:literal => { domain: $domain:literal, stage: $stage:literal, required: [$($req:literal),* $(,)?], optional: [$($opt:literal),* $(,)?], desc: $desc:literal $(,)? } ),+ $(,)?) => {
        /// `(kind, schema)` rows, in declaration order.
        pub static CATALOG: &[(&str, EventSchema)] = &[
            $(
                ($kind, EventSchema {
                    domain: $domain,
                    stage: $stage,
                    schema_version: 1,
                    required_fields: &[$($req),*],
                    optional_fields: &[$($opt),*],
                    description: $desc,
                }),
            )+
        ];
    };
}

catalog! {
    "sandbox.state" => {
        domain: "sandbox",
        stage: "transition",
        required: ["vmid", "from_state", "to_state"],
        optional: ["reason"],
        desc: "A sandbox's SandboxState changed.",
    },
    "sandbox.provision.failed" => {
        domain: "sandbox",
        stage: "provision",
        required: ["vmid", "message"],
        optional: ["backend_error"],
        desc: "Sandbox provisioning failed before reaching READY.",
    },
    "sandbox.timeout" => {
        domain: "sandbox",
        stage: "provision",
        required: ["vmid"],
        optional: ["stage"],
        desc: "Sandbox provisioning exceeded the provision timeout.",
    },
    "sandbox.destroyed" => {
        domain: "sandbox",
        stage: "teardown",
        required: ["vmid"],
        optional: ["forced"],
        desc: "A sandbox was destroyed.",
    },
    "sandbox.start.completed" => {
        domain: "sandbox",
        stage: "start",
        required: ["vmid"],
        optional: ["duration_ms"],
        desc: "A stopped sandbox was started back up.",
    },
    "sandbox.start.failed" => {
        domain: "sandbox",
        stage: "start",
        required: ["vmid", "message"],
        optional: [],
        desc: "Starting a stopped sandbox failed.",
    },
    "sandbox.revert.started" => {
        domain: "sandbox",
        stage: "revert",
        required: ["vmid"],
        optional: ["force"],
        desc: "A sandbox revert-to-clean-snapshot began.",
    },
    "sandbox.revert.completed" => {
        domain: "sandbox",
        stage: "revert",
        required: ["vmid"],
        optional: ["was_running", "restarted"],
        desc: "A sandbox revert-to-clean-snapshot completed.",
    },
    "sandbox.revert.failed" => {
        domain: "sandbox",
        stage: "revert",
        required: ["vmid", "message"],
        optional: [],
        desc: "A sandbox revert-to-clean-snapshot failed.",
    },
    "sandbox.lease" => {
        domain: "sandbox",
        stage: "lease",
        required: ["vmid", "lease_expires"],
        optional: [],
        desc: "A sandbox's own keepalive lease was renewed.",
    },
    "sandbox.idle_stop" => {
        domain: "sandbox",
        stage: "idle",
        required: ["vmid"],
        optional: ["idle_minutes"],
        desc: "A RUNNING sandbox was stopped by the idle-stop scanner.",
    },
    "sandbox.ip_pending" => {
        domain: "sandbox",
        stage: "provision",
        required: ["vmid"],
        optional: [],
        desc: "Guest IP discovery has not yet succeeded; provisioning continues.",
    },
    "sandbox.slo.ready" => {
        domain: "sandbox",
        stage: "provision",
        required: ["vmid", "duration_ms"],
        optional: [],
        desc: "A sandbox reached READY; duration since provisioning began.",
    },
    "sandbox.slo.ssh_ready" => {
        domain: "sandbox",
        stage: "provision",
        required: ["vmid"],
        optional: ["duration_ms"],
        desc: "SSH probe succeeded against a running sandbox.",
    },
    "sandbox.slo.ssh_failed" => {
        domain: "sandbox",
        stage: "provision",
        required: ["vmid"],
        optional: ["message"],
        desc: "SSH probe failed against a running sandbox.",
    },
    "workspace.lease.acquired" => {
        domain: "workspace",
        stage: "lease",
        required: ["workspace_id", "owner"],
        optional: ["ttl_seconds"],
        desc: "A workspace lease was acquired.",
    },
    "workspace.lease.denied" => {
        domain: "workspace",
        stage: "lease",
        required: ["workspace_id", "owner"],
        optional: ["held_by"],
        desc: "A workspace lease acquisition attempt was denied.",
    },
    "workspace.lease.renewed" => {
        domain: "workspace",
        stage: "lease",
        required: ["workspace_id", "owner"],
        optional: ["ttl_seconds"],
        desc: "A held workspace lease was renewed.",
    },
    "workspace.lease.released" => {
        domain: "workspace",
        stage: "lease",
        required: ["workspace_id", "owner"],
        optional: [],
        desc: "A workspace lease was released.",
    },
    "workspace.attached" => {
        domain: "workspace",
        stage: "attach",
        required: ["workspace_id", "vmid"],
        optional: [],
        desc: "A workspace was attached to a sandbox.",
    },
    "workspace.detached" => {
        domain: "workspace",
        stage: "attach",
        required: ["workspace_id", "vmid"],
        optional: [],
        desc: "A workspace was detached from a sandbox.",
    },
    "job.running" => {
        domain: "job",
        stage: "run",
        required: ["job_id"],
        optional: ["vmid"],
        desc: "A job transitioned to RUNNING.",
    },
    "job.slo.start" => {
        domain: "job",
        stage: "run",
        required: ["job_id"],
        optional: [],
        desc: "A job's SLO clock started (first RUNNING observation).",
    },
    "job.report" => {
        domain: "job",
        stage: "report",
        required: ["job_id", "status"],
        optional: ["result"],
        desc: "A job reported a terminal or intermediate status from inside the sandbox.",
    },
    "job.completed" => {
        domain: "job",
        stage: "report",
        required: ["job_id"],
        optional: ["vmid"],
        desc: "A job run completed successfully.",
    },
    "job.failed" => {
        domain: "job",
        stage: "report",
        required: ["job_id", "message"],
        optional: ["vmid"],
        desc: "A job run failed.",
    },
    "job.timeout" => {
        domain: "job",
        stage: "report",
        required: ["job_id"],
        optional: ["vmid"],
        desc: "A job run exceeded its TTL.",
    },
    "exposure.published" => {
        domain: "exposure",
        stage: "publish",
        required: ["name", "vmid", "port"],
        optional: ["url"],
        desc: "An exposure was published.",
    },
    "exposure.failed" => {
        domain: "exposure",
        stage: "publish",
        required: ["name", "message"],
        optional: [],
        desc: "An exposure publish or unpublish attempt failed.",
    },
    "exposure.unpublished" => {
        domain: "exposure",
        stage: "publish",
        required: ["name"],
        optional: [],
        desc: "An exposure was unpublished.",
    },
}

/// Look up the schema for `kind`, if the catalog has a row for it.
pub fn schema_for(kind: &str) -> Option<&'static EventSchema> {
    CATALOG.iter().find(|(k, _)| *k == kind).map(|(_, schema)| schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_row_has_a_unique_kind() {
        let mut seen = std::collections::HashSet::new();
        for (kind, _) in CATALOG {
            assert!(seen.insert(*kind), "duplicate catalog kind: {kind}");
        }
    }

    #[test]
    fn known_kind_resolves() {
        let schema = schema_for("sandbox.state").expect("sandbox.state is cataloged");
        assert_eq!(schema.domain, "sandbox");
        assert_eq!(schema.required_fields, &["vmid", "from_state", "to_state"]);
    }

    #[test]
    fn unknown_kind_resolves_to_none() {
        assert!(schema_for("nonsense.kind").is_none());
    }
}
