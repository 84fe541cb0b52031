//! chisel-server: TCP endpoint and server lifecycle
//!
//! Serves the tool protocol over newline-delimited JSON on a loopback TCP
//! socket. The lifecycle manager owns the listening endpoint and moves it
//! through Stopped, Starting, Running, and Stopping without ever leaving a
//! half-open listener behind.

pub mod endpoint;
pub mod lifecycle;

use chisel_engine::Executor;
use chisel_foundation::AppConfig;
use chisel_handlers::{AppState, Dispatcher};
use chisel_model::{DocumentLocks, TextCodeModel};
use std::sync::Arc;
use std::time::Duration;

pub use lifecycle::{LifecycleState, ServerLifecycle};

/// Wire the bundled text backend, executor, and dispatcher together
pub fn create_dispatcher(config: &AppConfig) -> Arc<Dispatcher> {
    let model = Arc::new(TextCodeModel::new());
    create_dispatcher_with_model(config, model)
}

/// Wire a dispatcher around an explicit backend
pub fn create_dispatcher_with_model(
    config: &AppConfig,
    model: Arc<dyn chisel_model::CodeModel>,
) -> Arc<Dispatcher> {
    let locks = Arc::new(DocumentLocks::new());
    let executor = Arc::new(Executor::new(
        model.clone(),
        locks,
        Duration::from_secs(config.server.request_timeout_secs),
    ));
    Arc::new(Dispatcher::new(Arc::new(AppState { executor, model })))
}
