// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetd`: binds the Control API (spec.md §6) to a Unix-domain socket
//! and, optionally, a bearer-authenticated loopback TCP port.

use std::io::ErrorKind;

use fleetd_daemon::{api, auth, config, profiles, profiles::DirectoryProfileStore, tasks, AppState, DaemonConfig};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::{TcpListener, UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("another fleetd is already listening on {0}")]
    AlreadyRunning(std::path::PathBuf),

    #[error("creating state directory {0:?}: {1}")]
    CreateDir(std::path::PathBuf, std::io::Error),

    #[error("removing stale socket {0:?}: {1}")]
    RemoveStaleSocket(std::path::PathBuf, std::io::Error),

    #[error("binding unix socket {0:?}: {1}")]
    BindUnix(std::path::PathBuf, std::io::Error),

    #[error("binding tcp listener on port {0}: {1}")]
    BindTcp(u16, std::io::Error),

    #[error(transparent)]
    LoadProfiles(#[from] profiles::LoadProfilesError),

    #[error("installing shutdown signal handler: {0}")]
    Signal(std::io::Error),
}

#[tokio::main]
async fn main() {
    let filter = config::log_filter();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run().await {
        error!(%err, "fleetd failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = DaemonConfig::from_env()?;
    std::fs::create_dir_all(&config.state_dir).map_err(|e| StartupError::CreateDir(config.state_dir.clone(), e))?;

    // No flock here (no collaborator in this workspace provides one):
    // probe the existing socket by connecting as a client first. A
    // successful connect means a daemon is already serving it; anything
    // else (including a clean connection refused) means the file is
    // stale and safe to unlink before we bind over it.
    reject_if_already_running(&config.socket_path).await?;
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)
            .map_err(|e| StartupError::RemoveStaleSocket(config.socket_path.clone(), e))?;
    }

    let profiles = DirectoryProfileStore::load(&config.profiles_dir)?;
    let state = AppState::new(&config, profiles.into_map());
    std::fs::create_dir_all(&state.artifacts_dir)
        .map_err(|e| StartupError::CreateDir(state.artifacts_dir.clone(), e))?;

    let shutdown = CancellationToken::new();
    tasks::spawn_background_tasks(state.clone(), config.scan_interval, shutdown.clone());

    let unix_listener =
        UnixListener::bind(&config.socket_path).map_err(|e| StartupError::BindUnix(config.socket_path.clone(), e))?;
    info!(socket = %config.socket_path.display(), "listening on unix socket");

    let router = api::router(state.clone());
    let unix_task = tokio::spawn(serve_unix(unix_listener, router.clone(), shutdown.clone()));

    let tcp_task = if let Some(port) = config.tcp_port {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.map_err(|e| StartupError::BindTcp(port, e))?;
        info!(port, "listening on loopback tcp");
        let tcp_router = router.layer(axum::middleware::from_fn_with_state(state.clone(), auth::require_bearer));
        Some(tokio::spawn(serve_tcp(listener, tcp_router, shutdown.clone())))
    } else {
        None
    };

    wait_for_shutdown_signal().await.map_err(StartupError::Signal)?;
    info!("shutdown signal received");
    shutdown.cancel();

    let _ = unix_task.await;
    if let Some(task) = tcp_task {
        let _ = task.await;
    }
    let _ = std::fs::remove_file(&config.socket_path);
    Ok(())
}

/// Connects to `path` as a plain client; a successful connect means a
/// daemon is already bound there.
async fn reject_if_already_running(path: &std::path::Path) -> Result<(), StartupError> {
    match UnixStream::connect(path).await {
        Ok(_) => Err(StartupError::AlreadyRunning(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::ConnectionRefused => Ok(()),
        Err(_) => Ok(()),
    }
}

async fn serve_unix(listener: UnixListener, router: axum::Router, shutdown: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => return,
        };
        let (stream, _addr) = match accepted {
            Ok(pair) => pair,
            Err(err) => {
                warn!(%err, "failed to accept unix connection");
                continue;
            }
        };
        let mut tower_service = router.clone();
        tokio::spawn(async move {
            let socket = TokioIo::new(stream);
            let hyper_service = hyper::service::service_fn(
                move |request: axum::http::Request<hyper::body::Incoming>| tower_service.call(request),
            );
            if let Err(err) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(socket, hyper_service)
                .await
            {
                warn!(%err, "error serving unix connection");
            }
        });
    }
}

async fn serve_tcp(listener: TcpListener, router: axum::Router, shutdown: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => return,
        };
        let (stream, _addr) = match accepted {
            Ok(pair) => pair,
            Err(err) => {
                warn!(%err, "failed to accept tcp connection");
                continue;
            }
        };
        let mut tower_service = router.clone();
        tokio::spawn(async move {
            let socket = TokioIo::new(stream);
            let hyper_service = hyper::service::service_fn(
                move |request: axum::http::Request<hyper::body::Incoming>| tower_service.call(request),
            );
            if let Err(err) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(socket, hyper_service)
                .await
            {
                warn!(%err, "error serving tcp connection");
            }
        });
    }
}

async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?.recv().await;
        Ok::<(), std::io::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::io::Result<()>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}
