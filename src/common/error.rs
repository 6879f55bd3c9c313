use crate::domains::navigation::codec::CodecError;
use crate::domains::navigation::geometry::GridPoint;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Structural limit exceeded: {operation} stopped after {limit} iterations")]
    StructuralLimitExceeded { operation: String, limit: usize },

    #[error("No route found from {from} to {to}")]
    NoRouteFound { from: GridPoint, to: GridPoint },

    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("Unmatched result: no agent stands at {position}")]
    UnmatchedResult { position: GridPoint },

    #[error("A batch path job is already in flight")]
    JobInFlight,

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

impl DomainError {
    pub fn limit(operation: &str, limit: usize) -> Self {
        DomainError::StructuralLimitExceeded {
            operation: operation.to_string(),
            limit,
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        DomainError::DegenerateInput { reason: reason.into() }
    }

    /// Conditions the core recovers from with a default value. Everything else
    /// is surfaced as an error-level diagnostic.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::NoRouteFound { .. }
                | DomainError::DegenerateInput { .. }
                | DomainError::UnmatchedResult { .. }
                | DomainError::JobInFlight
        )
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::SerializationError(e.to_string())
    }
}

impl From<bincode::Error> for DomainError {
    fn from(e: bincode::Error) -> Self {
        DomainError::SerializationError(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
