mod error;

pub use error::{CommandError, ConfigError, ExportError, QueryError};

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for query session operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for command parsing
pub type ParseResult<T> = Result<T, CommandError>;
