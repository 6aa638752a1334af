use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::CommandError;

/// Whether fields are quoted only when needed or unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    #[default]
    Normal,
    Always,
}

/// What happens to data rows that would encode as an entirely blank line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyLinePolicy {
    /// Blank rows are dropped from the output.
    #[default]
    Ignore,
    /// Blank rows are written as empty lines.
    Use,
}

/// Whether leading or trailing whitespace forces a field to be quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurroundingSpacesPolicy {
    #[default]
    NeedsQuotes,
    Ignore,
}

impl FromStr for QuoteMode {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(QuoteMode::Normal),
            "always" => Ok(QuoteMode::Always),
            _ => Err(CommandError::InvalidOptionValue {
                option: "quote-mode".to_string(),
                value: s.to_string(),
                expected: "always, normal",
            }),
        }
    }
}

impl FromStr for EmptyLinePolicy {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(EmptyLinePolicy::Ignore),
            "use" => Ok(EmptyLinePolicy::Use),
            _ => Err(CommandError::InvalidOptionValue {
                option: "empty-lines".to_string(),
                value: s.to_string(),
                expected: "ignore, use",
            }),
        }
    }
}

impl FromStr for SurroundingSpacesPolicy {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "need-quotes" => Ok(SurroundingSpacesPolicy::NeedsQuotes),
            "ignore" => Ok(SurroundingSpacesPolicy::Ignore),
            _ => Err(CommandError::InvalidOptionValue {
                option: "surrounding-spaces".to_string(),
                value: s.to_string(),
                expected: "need-quotes, ignore",
            }),
        }
    }
}

/// Immutable set of rules governing how rows are encoded as delimited text.
///
/// Built through [`FormattingPolicyBuilder`](super::policy::FormattingPolicyBuilder);
/// fields are private so a policy cannot change once an export has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingPolicy {
    pub(crate) delimiter: char,
    pub(crate) quote_char: char,
    pub(crate) quote_mode: QuoteMode,
    pub(crate) end_of_line: String,
    pub(crate) empty_line_policy: EmptyLinePolicy,
    pub(crate) surrounding_spaces_policy: SurroundingSpacesPolicy,
}

impl FormattingPolicy {
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote_char(&self) -> char {
        self.quote_char
    }

    pub fn quote_mode(&self) -> QuoteMode {
        self.quote_mode
    }

    pub fn end_of_line(&self) -> &str {
        &self.end_of_line
    }

    pub fn empty_line_policy(&self) -> EmptyLinePolicy {
        self.empty_line_policy
    }

    pub fn surrounding_spaces_policy(&self) -> SurroundingSpacesPolicy {
        self.surrounding_spaces_policy
    }
}

impl Default for FormattingPolicy {
    fn default() -> Self {
        super::policy::FormattingPolicyBuilder::new().build()
    }
}

/// A single column value as produced by a row source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Text form of the value, `None` for SQL `NULL`.
    ///
    /// Blobs are rendered as lowercase hex.
    pub fn to_field(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Blob(bytes) => Some(hex::encode(bytes)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One row of a result set, in column order.
pub type Row = Vec<Value>;

/// Everything needed to run one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub destination: PathBuf,
    pub include_headers: bool,
    pub query: String,
    pub policy: FormattingPolicy,
}

/// Metrics for a finished export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    /// Rows yielded by the source, including blank rows the policy dropped.
    pub rows: u64,
    pub rows_skipped: u64,
    pub bytes_written: u64,
    #[serde(serialize_with = "serialize_opt_millis")]
    pub first_row: Option<Duration>,
    #[serde(serialize_with = "serialize_millis")]
    pub total: Duration,
}

impl ExportOutcome {
    /// Timings are only meaningful once a row has been written.
    pub fn has_timings(&self) -> bool {
        self.first_row.is_some()
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

fn serialize_opt_millis<S: serde::Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&(d.as_millis() as u64)),
        None => s.serialize_none(),
    }
}

/// Result code of a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    Success,
    ExecFailed,
    SyntaxError,
}

impl CommandStatus {
    /// Process exit code used by the command-line front end.
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::ExecFailed => 1,
            CommandStatus::SyntaxError => 2,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Success => write!(f, "SUCCESS"),
            CommandStatus::ExecFailed => write!(f, "EXEC_FAILED"),
            CommandStatus::SyntaxError => write!(f, "SYNTAX_ERROR"),
        }
    }
}
