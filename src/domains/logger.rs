use crate::common::DomainError;
use std::sync::Arc;

/// Logging port the navigation core reports through.
/// Implementations must never fail from the caller's point of view.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);

    /// Report a diagnostic at the level its severity calls for.
    fn report(&self, diagnostic: &DomainError) {
        if diagnostic.is_recoverable() {
            self.warn(&diagnostic.to_string());
        } else {
            self.error(&diagnostic.to_string());
        }
    }
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Rolling file output via `fast_log`, which also installs itself as the `log` backend.
pub struct FileLogger;

impl FileLogger {
    pub fn init(path: &str, level: log::LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
        fast_log::init(fast_log::config::Config::new().console().file(path).level(level))?;
        Ok(())
    }
}

/// Parse a level name from configuration, falling back to `Info`.
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}
