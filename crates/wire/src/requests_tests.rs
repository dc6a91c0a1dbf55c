// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn create_job_request_rejects_unknown_fields() {
    let raw = r#"{"repo_url":"x","profile":"default","task":"y","bogus":true}"#;
    let err = serde_json::from_str::<CreateJobRequest>(raw).unwrap_err();
    assert!(err.to_string().contains("unknown field"));
}

#[test]
fn create_job_request_minimal_body_parses() {
    let raw = r#"{"repo_url":"https://example.invalid/r.git","profile":"default","task":"run it"}"#;
    let req: CreateJobRequest = serde_json::from_str(raw).expect("parses");
    assert_eq!(req.git_ref, None);
    assert_eq!(req.mode, None);
}

#[test]
fn destroy_sandbox_request_defaults_force_false() {
    let req: DestroySandboxRequest = serde_json::from_str("{}").expect("parses");
    assert!(!req.force);
}
