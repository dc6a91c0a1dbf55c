//! Test helpers for the black-box specs: spawn `fleetd` against an
//! isolated state directory, drive it with the `fleet` CLI, assert on
//! stdout/stderr/exit code.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output};
use std::time::{Duration, Instant};

pub const WAIT_MAX_MS: u64 = 5000;
const POLL_INTERVAL_MS: u64 = 20;

/// Returns the path to a compiled workspace binary, checking llvm-cov's
/// target directory first (matches how this pack's sibling forks locate
/// binaries under coverage instrumentation).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn fleetd_binary() -> PathBuf {
    binary_path("fleetd")
}

fn fleet_binary() -> PathBuf {
    binary_path("fleet")
}

/// Poll `condition` until it returns true or `timeout_ms` elapses.
pub fn wait_for<F: FnMut() -> bool>(timeout_ms: u64, mut condition: F) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
    false
}

/// Builds a `fleetd` fixture: an isolated state directory, optional
/// profile `*.toml` files written before startup (profiles load once at
/// boot, so they must exist first), and optional auth/TCP settings.
pub struct DaemonBuilder {
    state_dir: tempfile::TempDir,
    profiles: Vec<(String, String)>,
    auth_token: Option<String>,
    tcp_port: Option<u16>,
}

impl DaemonBuilder {
    pub fn new() -> Self {
        Self {
            state_dir: tempfile::tempdir().unwrap(),
            profiles: Vec::new(),
            auth_token: None,
            tcp_port: None,
        }
    }

    pub fn profile(mut self, name: &str, body: &str) -> Self {
        self.profiles.push((name.to_string(), body.to_string()));
        self
    }

    pub fn auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn tcp_port(mut self, port: u16) -> Self {
        self.tcp_port = Some(port);
        self
    }

    pub fn start(self) -> Daemon {
        let profiles_dir = self.state_dir.path().join("profiles");
        std::fs::create_dir_all(&profiles_dir).unwrap();
        for (name, body) in &self.profiles {
            std::fs::write(profiles_dir.join(format!("{name}.toml")), body).unwrap();
        }

        let mut cmd = Command::new(fleetd_binary());
        cmd.env("FLEETD_STATE_DIR", self.state_dir.path());
        cmd.env("RUST_LOG", "warn");
        cmd.env_remove("FLEETD_HOST");
        if let Some(token) = &self.auth_token {
            cmd.env("FLEETD_AUTH_TOKEN", token);
        } else {
            cmd.env_remove("FLEETD_AUTH_TOKEN");
        }
        if let Some(port) = self.tcp_port {
            cmd.env("FLEETD_TCP_PORT", port.to_string());
        }
        cmd.stdout(std::process::Stdio::null());
        cmd.stderr(std::process::Stdio::null());

        let child = cmd.spawn().expect("fleetd should spawn");
        let socket_path = self.state_dir.path().join("fleetd.sock");
        let ready = wait_for(WAIT_MAX_MS, || socket_path.exists());
        assert!(ready, "fleetd should create its socket within {WAIT_MAX_MS}ms");

        Daemon { child, state_dir: self.state_dir, auth_token: self.auth_token, tcp_port: self.tcp_port }
    }
}

impl Default for DaemonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running `fleetd` instance scoped to one test. Killed on drop.
pub struct Daemon {
    child: Child,
    state_dir: tempfile::TempDir,
    auth_token: Option<String>,
    tcp_port: Option<u16>,
}

impl Daemon {
    pub fn state_dir(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn socket_path(&self) -> PathBuf {
        self.state_dir.path().join("fleetd.sock")
    }

    /// Builds a `fleet` CLI invocation targeting this daemon.
    pub fn fleet(&self) -> FleetCmd {
        let mut cmd = FleetCmd::new();
        cmd.env("FLEETD_STATE_DIR", self.state_dir.path());
        cmd.env_remove("FLEETD_HOST");
        if let Some(token) = &self.auth_token {
            cmd.env("FLEETD_AUTH_TOKEN", token);
        }
        cmd
    }

    /// Builds a `fleet` CLI invocation that talks over loopback TCP
    /// instead of the Unix socket (requires `DaemonBuilder::tcp_port`).
    pub fn fleet_tcp(&self) -> FleetCmd {
        let port = self.tcp_port.expect("daemon must be started with a tcp_port");
        let mut cmd = FleetCmd::new();
        cmd.env("FLEETD_HOST", "127.0.0.1");
        cmd.env("FLEETD_PORT", port.to_string());
        if let Some(token) = &self.auth_token {
            cmd.env("FLEETD_AUTH_TOKEN", token);
        }
        cmd
    }

    /// Same as `fleet_tcp`, but deliberately omits the auth token even if
    /// one was configured, for negative auth tests.
    pub fn fleet_tcp_no_token(&self) -> FleetCmd {
        let port = self.tcp_port.expect("daemon must be started with a tcp_port");
        let mut cmd = FleetCmd::new();
        cmd.env("FLEETD_HOST", "127.0.0.1");
        cmd.env("FLEETD_PORT", port.to_string());
        cmd.env_remove("FLEETD_AUTH_TOKEN");
        cmd
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Fluent builder for one `fleet` CLI invocation.
pub struct FleetCmd {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    env_removes: Vec<String>,
}

impl FleetCmd {
    fn new() -> Self {
        Self { args: Vec::new(), envs: Vec::new(), env_removes: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn json(self) -> Self {
        self.args(&["--json"])
    }

    fn env(&mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) {
        self.envs.push((key.to_string(), value.as_ref().to_string_lossy().into_owned()));
    }

    fn env_remove(&mut self, key: &str) {
        self.env_removes.push(key.to_string());
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(fleet_binary());
        cmd.args(&self.args);
        for key in &self.env_removes {
            cmd.env_remove(key);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("fleet should run");
        assert!(
            output.status.success(),
            "expected `fleet` to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("fleet should run");
        assert!(
            !output.status.success(),
            "expected `fleet` to fail, but it passed\nstdout: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Parses stdout as JSON (requires the invocation used `.json()`).
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout())
            .unwrap_or_else(|e| panic!("stdout was not valid JSON ({e}): {}", self.stdout()))
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        assert!(self.stdout().contains(expected), "stdout does not contain '{expected}'\nstdout: {}", self.stdout());
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        assert!(self.stderr().contains(expected), "stderr does not contain '{expected}'\nstderr: {}", self.stderr());
        self
    }
}

pub const STUB_PROFILE: &str = r#"
template = "ubuntu-24.04"
cores = 2
memory_mb = 2048
bridge = "vmbr0"
default_ttl_minutes = 30
"#;
