//! TCP endpoint serving newline-delimited JSON
//!
//! One request line in, one response line out. Each connection gets its own
//! task; each request gets a span carrying a fresh request id so nested logs
//! are attributable without plumbing.

use chisel_foundation::{logging, ChiselError, ChiselResult, RpcMessage, RpcResponse};
use chisel_handlers::Dispatcher;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};

const PARSE_ERROR: i32 = -32700;

/// Idle connections are closed after this long without a request
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection guard that tracks active connections
///
/// Increments the counter on creation, decrements on drop. Used to enforce
/// the max_clients limit.
struct ConnectionGuard {
    counter: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A bound TCP endpoint, ready to run its accept loop
pub struct Endpoint {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    max_clients: Option<usize>,
    active_connections: Arc<AtomicUsize>,
}

impl Endpoint {
    /// Bind the listening socket
    ///
    /// Binding is the only fallible step of startup; failures surface as
    /// `ChiselError::Bind` so the lifecycle can report them.
    pub async fn bind(
        host: &str,
        port: u16,
        max_clients: Option<usize>,
        dispatcher: Arc<Dispatcher>,
    ) -> ChiselResult<Self> {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ChiselError::bind(format!("Failed to bind to {}: {}", addr, e)))?;

        info!(addr = %addr, "Endpoint bound");

        Ok(Self {
            listener,
            dispatcher,
            max_clients,
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address the listener actually bound (resolves port 0)
    pub fn local_addr(&self) -> ChiselResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until the shutdown signal fires, then drain
    ///
    /// Connection tasks live in a `JoinSet` owned by this loop. On shutdown
    /// the listener closes first, connected clients get `grace` to finish,
    /// and whatever is still open afterwards is aborted. When this future
    /// completes, no connection is being served.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>, grace: Duration) {
        info!("Endpoint accepting connections");
        let mut connections: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            self.accept(stream, addr, &mut connections, shutdown.clone())
                        }
                        Err(e) => error!(error = %e, "Failed to accept connection"),
                    }
                }
                // reap finished connection tasks as they complete
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                _ = shutdown.changed() => {
                    info!("Endpoint stopping, no longer accepting connections");
                    break;
                }
            }
        }

        drop(self.listener);
        drain_connections(connections, grace).await;
    }

    fn accept(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        connections: &mut JoinSet<()>,
        shutdown: watch::Receiver<bool>,
    ) {
        if let Some(max_clients) = self.max_clients {
            let current = self.active_connections.load(Ordering::SeqCst);
            if current >= max_clients {
                warn!(
                    current_connections = current,
                    max_clients,
                    client_addr = %addr,
                    "Max clients limit reached, rejecting connection"
                );
                // dropping the stream closes the socket
                return;
            }
        }

        debug!(client_addr = %addr, "New connection");
        let dispatcher = self.dispatcher.clone();
        let counter = self.active_connections.clone();

        connections.spawn(async move {
            let _guard = ConnectionGuard::new(counter);
            if let Err(e) = handle_connection(stream, dispatcher, shutdown).await {
                debug!(client_addr = %addr, error = %e, "Connection closed with error");
            }
        });
    }
}

/// Wait up to `grace` for connection tasks to finish, then abort the rest
async fn drain_connections(mut connections: JoinSet<()>, grace: Duration) {
    if connections.is_empty() {
        return;
    }
    let deadline = tokio::time::sleep(grace);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            finished = connections.join_next() => {
                if finished.is_none() {
                    return;
                }
            }
            _ = &mut deadline => {
                warn!(
                    remaining = connections.len(),
                    grace_secs = grace.as_secs(),
                    "Shutdown grace period elapsed, dropping remaining connections"
                );
                connections.shutdown().await;
                return;
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let mut line = String::new();
        let bytes_read = tokio::select! {
            read = tokio::time::timeout(IDLE_TIMEOUT, reader.read_line(&mut line)) => {
                match read {
                    Ok(result) => result?,
                    Err(_) => {
                        info!("Closing idle connection");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                debug!("Closing connection for shutdown");
                break;
            }
        };

        if bytes_read == 0 {
            debug!("Client disconnected");
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcMessage>(line) {
            Ok(RpcMessage::Request(request)) => {
                let request_id = uuid::Uuid::new_v4().to_string();
                let span = logging::request_span(&request_id, "tcp");
                dispatcher.dispatch(request).instrument(span).await
            }
            Ok(_) => {
                debug!("Ignoring non-request message");
                continue;
            }
            Err(e) => RpcResponse::err(None, PARSE_ERROR, format!("Parse error: {}", e)),
        };

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_guard_tracks_connections() {
        let counter = Arc::new(AtomicUsize::new(0));

        {
            let _guard1 = ConnectionGuard::new(counter.clone());
            let _guard2 = ConnectionGuard::new(counter.clone());
            assert_eq!(counter.load(Ordering::SeqCst), 2);
        }

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
