// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DaemonClient`: issues one HTTP/1.1 request per call against the
//! Control API (spec.md §6), either over the daemon's Unix-domain
//! socket or, if `FLEETD_HOST` names one, a bearer-authenticated
//! loopback TCP connection. One connect-handshake-request-drop cycle
//! per call rather than a pooled client — this CLI is a short-lived
//! process issuing at most a handful of requests per invocation.

use std::path::PathBuf;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Request;
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpStream, UnixStream};

use fleetd_wire::responses::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connecting to {0}: {1}")]
    Connect(String, std::io::Error),
    #[error("http handshake: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("sending request: {0}")]
    Send(#[source] hyper::Error),
    #[error("reading response body: {0}")]
    Body(#[source] hyper::Error),
    #[error("decoding response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("building request for {0}: {1}")]
    Build(String, hyper::http::Error),
    #[error("{status}: {message}")]
    Api { status: u16, message: String, details: Option<serde_json::Value> },
}

enum Target {
    Unix(PathBuf),
    Tcp { host: String, port: u16, token: Option<String> },
}

pub struct DaemonClient {
    target: Target,
}

impl DaemonClient {
    /// Resolves the target from the environment the same way
    /// `fleetd-daemon::config` resolves the daemon's own state dir:
    /// `FLEETD_HOST`/`FLEETD_PORT` pick loopback TCP, otherwise the Unix
    /// socket under the daemon's state dir (`FLEETD_STATE_DIR` >
    /// `XDG_STATE_HOME/fleetd` > `~/.local/state/fleetd`).
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(host) = std::env::var("FLEETD_HOST") {
            let port: u16 = std::env::var("FLEETD_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(7890);
            let token = std::env::var("FLEETD_AUTH_TOKEN").ok().filter(|s| !s.is_empty());
            return Ok(Self { target: Target::Tcp { host, port, token } });
        }

        if let Ok(path) = std::env::var("FLEETD_SOCKET") {
            return Ok(Self { target: Target::Unix(PathBuf::from(path)) });
        }

        let state_dir = if let Ok(dir) = std::env::var("FLEETD_STATE_DIR") {
            PathBuf::from(dir)
        } else if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            PathBuf::from(xdg).join("fleetd")
        } else {
            let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
            PathBuf::from(home).join(".local/state/fleetd")
        };
        Ok(Self { target: Target::Unix(state_dir.join("fleetd.sock")) })
    }

    async fn connect(&self) -> Result<hyper::client::conn::http1::SendRequest<Full<Bytes>>, ClientError> {
        match &self.target {
            Target::Unix(path) => {
                let stream = UnixStream::connect(path)
                    .await
                    .map_err(|e| ClientError::Connect(path.display().to_string(), e))?;
                let (sender, conn) =
                    hyper::client::conn::http1::handshake(TokioIo::new(stream)).await.map_err(ClientError::Handshake)?;
                tokio::spawn(async move {
                    let _ = conn.await;
                });
                Ok(sender)
            }
            Target::Tcp { host, port, .. } => {
                let addr = format!("{host}:{port}");
                let stream = TcpStream::connect(&addr).await.map_err(|e| ClientError::Connect(addr, e))?;
                let (sender, conn) =
                    hyper::client::conn::http1::handshake(TokioIo::new(stream)).await.map_err(ClientError::Handshake)?;
                tokio::spawn(async move {
                    let _ = conn.await;
                });
                Ok(sender)
            }
        }
    }

    fn bearer(&self) -> Option<&str> {
        match &self.target {
            Target::Tcp { token, .. } => token.as_deref(),
            Target::Unix(_) => None,
        }
    }

    fn host_header(&self) -> &str {
        match &self.target {
            Target::Unix(_) => "localhost",
            Target::Tcp { host, .. } => host,
        }
    }

    async fn raw(&self, method: &str, path: &str, body: Option<Vec<u8>>) -> Result<(u16, Vec<u8>), ClientError> {
        let mut sender = self.connect().await?;
        let body_bytes = body.unwrap_or_default();
        let has_body = !body_bytes.is_empty();

        let mut builder =
            Request::builder().method(method).uri(path).header(hyper::header::HOST, self.host_header());
        if has_body {
            builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
        }
        if let Some(token) = self.bearer() {
            builder = builder.header(hyper::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request =
            builder.body(Full::new(Bytes::from(body_bytes))).map_err(|e| ClientError::Build(path.to_string(), e))?;

        let response = sender.send_request(request).await.map_err(ClientError::Send)?;
        let status = response.status().as_u16();
        let body = response.into_body().collect().await.map_err(ClientError::Body)?.to_bytes();
        Ok((status, body.to_vec()))
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let encoded = body.map(|b| serde_json::to_vec(b)).transpose().map_err(ClientError::Decode)?;
        let (status, bytes) = self.raw(method, path, encoded).await?;
        Self::decode(status, &bytes)
    }

    fn decode<T: DeserializeOwned>(status: u16, bytes: &[u8]) -> Result<T, ClientError> {
        if status >= 400 {
            let parsed: Result<ErrorResponse, _> = serde_json::from_slice(bytes);
            return match parsed {
                Ok(err) => Err(ClientError::Api { status, message: err.error, details: err.details }),
                Err(_) => Err(ClientError::Api {
                    status,
                    message: String::from_utf8_lossy(bytes).into_owned(),
                    details: None,
                }),
            };
        }
        serde_json::from_slice(bytes).map_err(ClientError::Decode)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.call::<(), T>("GET", path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.call("POST", path, Some(body)).await
    }

    /// `POST` with no request body — every optional-body route still
    /// needs a `{}` so axum's `Json` extractor sees valid JSON.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.call::<serde_json::Value, T>("POST", path, Some(&serde_json::json!({}))).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let (status, bytes) = self.raw("DELETE", path, None).await?;
        if status >= 400 {
            return Self::decode::<()>(status, &bytes);
        }
        Ok(())
    }

    /// `POST` that returns `201`/`204` with no JSON body (workspace
    /// snapshot create/restore).
    pub async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        let encoded = serde_json::to_vec(body).map_err(ClientError::Decode)?;
        let (status, bytes) = self.raw("POST", path, Some(encoded)).await?;
        if status >= 400 {
            return Self::decode::<()>(status, &bytes);
        }
        Ok(())
    }

    /// `POST` with no request body, returning no JSON body either
    /// (`restore_snapshot` takes only path params).
    pub async fn post_no_content_empty(&self, path: &str) -> Result<(), ClientError> {
        let (status, bytes) = self.raw("POST", path, None).await?;
        if status >= 400 {
            return Self::decode::<()>(status, &bytes);
        }
        Ok(())
    }
}
