use thiserror::Error;

/// Errors raised while turning a `csv` command line into an export request.
///
/// Every variant maps to the `SYNTAX_ERROR` result code; nothing has been
/// executed or written when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("missing destination file name")]
    MissingDestination,

    #[error("missing query text after destination '{0}'")]
    MissingQuery(String),

    #[error("invalid value '{value}' for option '{option}' (expected one of: {expected})")]
    InvalidOptionValue {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("option '{option}' expects exactly one character, got '{value}'")]
    InvalidCharacter { option: String, value: String },

    #[error("delimiter and quote character must differ (both are '{0}')")]
    ConflictingCharacters(char),
}

/// Errors reported by a query session or its row cursor.
///
/// The message carried by each variant is the collaborator's own text and is
/// shown to the user verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("{0}")]
    Submission(String),

    #[error("{0}")]
    Fetch(String),

    #[error("{0}")]
    Close(String),
}

/// Errors that abort a running export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("You need a valid session for this command.")]
    NoSession,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Short classification used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::NoSession => "session",
            ExportError::Query(_) => "query",
            ExportError::Io(_) => "io",
        }
    }
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
