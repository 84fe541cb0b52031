//! Server lifecycle management
//!
//! Owns the endpoint and moves it through Stopped, Starting, Running, and
//! Stopping. Transitions are serialized under one lock so a concurrent start
//! and stop cannot interleave; a failed bind lands back in Stopped with no
//! listener left behind.

use crate::endpoint::Endpoint;
use chisel_foundation::config::ServerConfig;
use chisel_foundation::{ChiselError, ChiselResult};
use chisel_handlers::Dispatcher;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Externally observable lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// A running endpoint's control surface
struct RunningEndpoint {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_loop: JoinHandle<()>,
}

struct Inner {
    state: LifecycleState,
    running: Option<RunningEndpoint>,
}

/// Manages one server instance's lifecycle
///
/// Each instance owns its own state; two lifecycles can run side by side on
/// different ports.
pub struct ServerLifecycle {
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
    inner: Mutex<Inner>,
}

impl ServerLifecycle {
    pub fn new(dispatcher: Arc<Dispatcher>, config: ServerConfig) -> Self {
        Self {
            dispatcher,
            config,
            inner: Mutex::new(Inner {
                state: LifecycleState::Stopped,
                running: None,
            }),
        }
    }

    /// Start the endpoint, binding the configured host and port
    ///
    /// Starting an already running server is not an error: it logs a warning
    /// and returns the existing address without opening a second listener.
    pub async fn start(&self) -> ChiselResult<SocketAddr> {
        let mut inner = self.inner.lock().await;

        if let Some(running) = &inner.running {
            warn!(addr = %running.addr, "Server already running, ignoring start");
            return Ok(running.addr);
        }

        inner.state = LifecycleState::Starting;
        info!(
            host = %self.config.host,
            port = self.config.port,
            "Starting server"
        );

        let endpoint = match Endpoint::bind(
            &self.config.host,
            self.config.port,
            self.config.max_clients,
            self.dispatcher.clone(),
        )
        .await
        {
            Ok(endpoint) => endpoint,
            Err(e) => {
                inner.state = LifecycleState::Stopped;
                return Err(e);
            }
        };

        let addr = match endpoint.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                inner.state = LifecycleState::Stopped;
                return Err(e);
            }
        };
        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let accept_loop = tokio::spawn(endpoint.run(shutdown_rx, grace));

        inner.running = Some(RunningEndpoint {
            addr,
            shutdown_tx,
            accept_loop,
        });
        inner.state = LifecycleState::Running;
        info!(addr = %addr, "Server running");
        Ok(addr)
    }

    /// Stop the endpoint, draining in-flight connections
    ///
    /// The accept loop closes its listener first so no new work arrives,
    /// gives connected clients the configured grace period, then aborts
    /// whatever is still open. This returns only once the accept loop (and
    /// with it every connection task) has fully terminated, so a server that
    /// reports Stopped is no longer serving anyone.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;

        let running = match inner.running.take() {
            Some(running) => running,
            None => {
                debug!("Stop requested but server is not running, ignoring");
                return;
            }
        };

        inner.state = LifecycleState::Stopping;
        info!(addr = %running.addr, "Stopping server");

        if running.shutdown_tx.send(true).is_err() {
            // accept loop already gone, nothing to signal
            debug!("Accept loop already terminated");
        }
        if let Err(e) = running.accept_loop.await {
            warn!(error = %e, "Accept loop task failed during shutdown");
        }

        inner.state = LifecycleState::Stopped;
        info!("Server stopped");
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == LifecycleState::Running
    }

    /// Address of the running endpoint, if any
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().await.running.as_ref().map(|r| r.addr)
    }
}

impl Drop for ServerLifecycle {
    fn drop(&mut self) {
        // abort rather than leak the accept loop if stop() was never called
        if let Ok(inner) = self.inner.try_lock() {
            if let Some(running) = &inner.running {
                running.accept_loop.abort();
            }
        }
    }
}

/// Helper for callers that only have a bind error to inspect
pub fn is_bind_failure(err: &ChiselError) -> bool {
    matches!(err, ChiselError::Bind { .. })
}
