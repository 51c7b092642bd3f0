//! Ingestion error types

pub use contracts::HandlerError;

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, HandlerError>;
