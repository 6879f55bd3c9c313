use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Routes domain messages into whatever `tracing` subscriber is installed.
struct ConsoleBridge;

impl DomainLogger for ConsoleBridge {
    fn info(&self, msg: &str) { tracing::info!(target: "nodal_nav", "{}", msg); }
    fn warn(&self, msg: &str) { tracing::warn!(target: "nodal_nav", "{}", msg); }
    fn error(&self, msg: &str) { tracing::error!(target: "nodal_nav", "{}", msg); }
}

/// Initialize a console-backed DomainLogger (useful as a fallback)
pub fn init_console_logger() -> DynLogger {
    Arc::new(ConsoleBridge {})
}
