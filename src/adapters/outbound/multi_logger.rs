use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards every message to each of its sinks in order.
pub struct MultiLogger {
    sinks: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<DynLogger>) -> Self {
        Self { sinks }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        for sink in &self.sinks {
            sink.info(msg);
        }
    }

    fn warn(&self, msg: &str) {
        for sink in &self.sinks {
            sink.warn(msg);
        }
    }

    fn error(&self, msg: &str) {
        for sink in &self.sinks {
            sink.error(msg);
        }
    }
}

/// Console output, plus a log file when one is configured and `fast_log` starts.
///
/// `fast_log` claims the global `log` backend, so call this before installing a
/// `tracing` subscriber that would bridge `log` records itself.
pub fn init_combined_logger(file: Option<&str>, level: log::LevelFilter) -> Arc<MultiLogger> {
    let console = crate::adapters::outbound::init_console_logger();
    let Some(path) = file else {
        return Arc::new(MultiLogger::new(vec![console]));
    };
    match crate::adapters::outbound::file_logger::init_file_logger(path, level) {
        Ok(file_logger) => Arc::new(MultiLogger::new(vec![file_logger, console])),
        Err(e) => {
            console.warn(&e);
            Arc::new(MultiLogger::new(vec![console]))
        }
    }
}
