//! Export the rows of a query into a delimited text file, and decide whether
//! interactive statement text is ready to be submitted.
//!
//! The `csv` command is the entry point:
//!
//! ```text
//! csv [headers=on|off] [quote-char=X] [quote-mode=always|normal]
//!     [delim-char=X] [empty-lines=ignore|use]
//!     [surrounding-spaces=need-quotes|ignore]
//!     <destination-path> <query-text...>
//! ```
//!
//! Queries run through a [`QuerySession`]; user-facing text goes to a
//! [`MessageSink`]. Both are passed explicitly, there is no global session.

// Public modules
pub mod config;
pub mod domains;
pub mod errors;
pub mod messages;

pub use config::{AppConfig, ExportSettings};
pub use domains::export::{
    CommandReport, CommandStatus, CsvCommand, ExportOutcome, ExportRequest, ExportService,
    FormattingPolicy, FormattingPolicyBuilder, QuerySession, RowCursor, SqliteQuerySession,
};
pub use domains::statement::is_complete;
pub use messages::{BufferSink, ConsoleSink, MessageSink};
