pub mod types;
pub mod policy;
pub mod writers;
pub mod repository;
pub mod service;
pub mod command;
pub mod timing;

pub use command::{parse_parameters, CommandReport, CsvCommand, COMMAND_NAME};
pub use policy::FormattingPolicyBuilder;
pub use repository::{QuerySession, RowCursor, SqliteQuerySession};
pub use service::ExportService;
pub use types::{
    CommandStatus, EmptyLinePolicy, ExportOutcome, ExportRequest, FormattingPolicy, QuoteMode,
    Row, SurroundingSpacesPolicy, Value,
};
pub use writers::{RowEncoder, StreamingCsvWriter, WriterStats};
