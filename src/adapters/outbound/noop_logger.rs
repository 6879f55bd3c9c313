use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::{Arc, Mutex};

struct NoOp;

impl DomainLogger for NoOp {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// No-op logger useful as default in unit tests
pub fn init_noop_logger() -> DynLogger {
    Arc::new(NoOp {})
}

/// Keeps every message in memory as `LEVEL:message`, for asserting on diagnostics.
#[derive(Default)]
pub struct CaptureLogger {
    messages: Mutex<Vec<String>>,
}

impl CaptureLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }

    fn push(&self, level: &str, msg: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(format!("{}:{}", level, msg));
        }
    }
}

impl DomainLogger for CaptureLogger {
    fn info(&self, msg: &str) { self.push("INFO", msg); }
    fn warn(&self, msg: &str) { self.push("WARN", msg); }
    fn error(&self, msg: &str) { self.push("ERR", msg); }
}
