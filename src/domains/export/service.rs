use crate::config::ExportSettings;
use crate::domains::export::repository::{QuerySession, RowCursor};
use crate::domains::export::types::{ExportOutcome, ExportRequest};
use crate::domains::export::writers::StreamingCsvWriter;
use crate::errors::{ExportError, ExportResult};
use std::time::Instant;
use tokio::fs::File;
use tokio::io::BufWriter;

/// Streams the rows of one query into a delimited text file.
///
/// Rows are pulled, encoded and written one at a time, so memory use depends
/// on the row width and not on the size of the result. The cursor is closed
/// and the file handle dropped on every exit path.
#[derive(Debug, Clone, Default)]
pub struct ExportService {
    settings: ExportSettings,
}

impl ExportService {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Run `request` against `session`.
    ///
    /// The destination is only created once the query has been accepted, so a
    /// query rejected by the database leaves any existing file untouched.
    pub async fn export(
        &self,
        session: &mut dyn QuerySession,
        request: &ExportRequest,
    ) -> ExportResult<ExportOutcome> {
        log::debug!("Submitting export query for {}", request.destination.display());
        let mut cursor = session.execute_query(&request.query).await?;

        let result = self.write_rows(cursor.as_mut(), request).await;

        if let Err(e) = cursor.close().await {
            // never mask the outcome being reported
            log::warn!("Ignoring failure while closing cursor: {}", e);
        }

        match &result {
            Ok(outcome) => log::info!(
                "Exported {} rows ({} skipped, {} bytes) to {}",
                outcome.rows,
                outcome.rows_skipped,
                outcome.bytes_written,
                request.destination.display()
            ),
            Err(e) => log::warn!(
                "Export to {} failed ({}): {}",
                request.destination.display(),
                e.kind(),
                e
            ),
        }
        result
    }

    async fn write_rows(
        &self,
        cursor: &mut dyn RowCursor,
        request: &ExportRequest,
    ) -> ExportResult<ExportOutcome> {
        let columns = cursor.column_names().to_vec();

        let file = File::create(&request.destination).await?;
        let started = Instant::now();
        let mut writer = StreamingCsvWriter::new(
            BufWriter::with_capacity(self.settings.write_buffer_size, file),
            request.policy.clone(),
        );

        if request.include_headers {
            writer.write_header(&columns).await?;
        }

        let mut rows: u64 = 0;
        let mut first_row = None;
        loop {
            let row = match cursor.next_row().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    // keep what was already encoded
                    if let Err(flush_err) = writer.flush().await {
                        log::debug!("Ignoring flush failure after fetch error: {}", flush_err);
                    }
                    return Err(ExportError::Query(e));
                }
            };

            rows += 1;
            if writer.write_row(&row).await? && first_row.is_none() {
                first_row = Some(started.elapsed());
            }
        }

        writer.flush().await?;
        let total = started.elapsed();
        let stats = writer.stats();

        if stats.rows_skipped > 0 {
            log::debug!("Dropped {} blank rows", stats.rows_skipped);
        }

        Ok(ExportOutcome {
            rows,
            rows_skipped: stats.rows_skipped,
            bytes_written: stats.bytes_written,
            first_row,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::export::policy::FormattingPolicyBuilder;
    use crate::domains::export::repository::tests::ScriptedSession;
    use crate::domains::export::repository::SqliteQuerySession;
    use crate::domains::export::types::{EmptyLinePolicy, FormattingPolicy, QuoteMode, Value};
    use crate::errors::QueryError;
    use std::path::Path;
    use tempfile::TempDir;

    fn request(path: &Path, query: &str, include_headers: bool, policy: FormattingPolicy) -> ExportRequest {
        ExportRequest {
            destination: path.to_path_buf(),
            include_headers,
            query: query.to_string(),
            policy,
        }
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_exports_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut session = ScriptedSession::new(
            &["id", "name"],
            vec![
                vec![Value::Integer(1), Value::from("a,b")],
                vec![Value::Integer(2), Value::Null],
            ],
        );

        let outcome = ExportService::default()
            .export(
                &mut session,
                &request(&path, "SELECT id, name FROM t", true, FormattingPolicy::default()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.rows, 2);
        assert!(outcome.first_row.is_some());
        assert!(outcome.first_row.unwrap() <= outcome.total);
        assert_eq!(read(&path), "id,name\n1,\"a,b\"\n2,\n");
        assert_eq!(outcome.bytes_written, read(&path).len() as u64);
        assert!(session.closed);
        assert_eq!(session.executed, vec!["SELECT id, name FROM t".to_string()]);
    }

    #[tokio::test]
    async fn test_zero_rows_is_success_without_timings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        let mut session = ScriptedSession::new(&["id"], Vec::new());

        let outcome = ExportService::default()
            .export(&mut session, &request(&path, "SELECT id", true, FormattingPolicy::default()))
            .await
            .unwrap();

        assert_eq!(outcome.rows, 0);
        assert!(!outcome.has_timings());
        assert_eq!(read(&path), "id\n");
    }

    #[tokio::test]
    async fn test_headers_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut session = ScriptedSession::new(&["id"], vec![vec![Value::Integer(7)]]);

        let outcome = ExportService::default()
            .export(&mut session, &request(&path, "SELECT id", false, FormattingPolicy::default()))
            .await
            .unwrap();

        assert_eq!(outcome.rows, 1);
        assert_eq!(read(&path), "7\n");
    }

    #[tokio::test]
    async fn test_existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old content that is longer than the export\n").unwrap();
        let mut session = ScriptedSession::new(&["x"], vec![vec![Value::Integer(1)]]);

        ExportService::default()
            .export(&mut session, &request(&path, "SELECT x", true, FormattingPolicy::default()))
            .await
            .unwrap();

        assert_eq!(read(&path), "x\n1\n");
    }

    #[tokio::test]
    async fn test_rejected_query_leaves_destination_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "previous export\n").unwrap();
        let mut session = ScriptedSession::failing("near \"SELEC\": syntax error");

        let err = ExportService::default()
            .export(&mut session, &request(&path, "SELEC 1", true, FormattingPolicy::default()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "near \"SELEC\": syntax error");
        assert_eq!(read(&path), "previous export\n");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_partial_output_and_closes_cursor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut session = ScriptedSession::new(&["n"], Vec::new());
        session.rows = vec![
            Ok(vec![Value::Integer(1)]),
            Err(QueryError::Fetch("connection lost".into())),
            Ok(vec![Value::Integer(3)]),
        ];

        let err = ExportService::default()
            .export(&mut session, &request(&path, "SELECT n", true, FormattingPolicy::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Query(QueryError::Fetch(_))));
        assert_eq!(err.to_string(), "connection lost");
        assert!(session.closed);
        assert_eq!(read(&path), "n\n1\n");
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_success() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut session = ScriptedSession::new(&["n"], vec![vec![Value::Integer(1)]]);
        session.close_error = Some("cursor already gone".into());

        let outcome = ExportService::default()
            .export(&mut session, &request(&path, "SELECT n", true, FormattingPolicy::default()))
            .await
            .unwrap();

        assert_eq!(outcome.rows, 1);
        assert!(session.closed);
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");
        let mut session = ScriptedSession::new(&["n"], vec![vec![Value::Integer(1)]]);

        let err = ExportService::default()
            .export(&mut session, &request(&path, "SELECT n", true, FormattingPolicy::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Io(_)));
        assert!(session.closed);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_write_failure_midway_is_io_error() {
        let rows: Vec<_> = (0..1_000).map(|i| vec![Value::Integer(i)]).collect();
        let mut session = ScriptedSession::new(&["n"], rows);

        let service = ExportService::new(ExportSettings { write_buffer_size: 16 });
        let err = service
            .export(&mut session, &request(Path::new("/dev/full"), "SELECT n", true, FormattingPolicy::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Io(_)));
        assert!(session.closed);
    }

    #[tokio::test]
    async fn test_blank_rows_follow_empty_line_policy() {
        let dir = TempDir::new().unwrap();
        let rows = vec![
            vec![Value::from("a")],
            vec![Value::Null],
            vec![Value::from("")],
            vec![Value::from("b")],
        ];

        let ignored = dir.path().join("ignored.csv");
        let mut session = ScriptedSession::new(&["v"], rows.clone());
        let outcome = ExportService::default()
            .export(&mut session, &request(&ignored, "SELECT v", false, FormattingPolicy::default()))
            .await
            .unwrap();
        assert_eq!(outcome.rows, 4);
        assert_eq!(outcome.rows_skipped, 2);
        assert_eq!(read(&ignored), "a\nb\n");

        let used = dir.path().join("used.csv");
        let mut session = ScriptedSession::new(&["v"], rows);
        let policy = FormattingPolicyBuilder::new().empty_lines(EmptyLinePolicy::Use).build();
        let outcome = ExportService::default()
            .export(&mut session, &request(&used, "SELECT v", false, policy))
            .await
            .unwrap();
        assert_eq!(outcome.rows_skipped, 0);
        assert_eq!(read(&used), "a\n\n\nb\n");
    }

    #[tokio::test]
    async fn test_all_null_wide_rows_are_exported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.csv");
        let mut session = ScriptedSession::new(
            &["a", "b"],
            vec![
                vec![Value::Integer(1), Value::Integer(2)],
                vec![Value::Null, Value::Null],
                vec![Value::Integer(3), Value::Integer(4)],
            ],
        );

        let outcome = ExportService::default()
            .export(&mut session, &request(&path, "SELECT a, b", true, FormattingPolicy::default()))
            .await
            .unwrap();

        assert_eq!(outcome.rows, 3);
        assert_eq!(outcome.rows_skipped, 0);
        assert_eq!(read(&path), "a,b\n1,2\n,\n3,4\n");
    }

    #[tokio::test]
    async fn test_small_buffer_streams_many_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.csv");
        let rows: Vec<_> = (0..5_000).map(|i| vec![Value::Integer(i), Value::from("x y")]).collect();
        let mut session = ScriptedSession::new(&["i", "s"], rows);

        let service = ExportService::new(ExportSettings { write_buffer_size: 16 });
        let outcome = service
            .export(&mut session, &request(&path, "SELECT i, s", true, FormattingPolicy::default()))
            .await
            .unwrap();

        assert_eq!(outcome.rows, 5_000);
        let content = read(&path);
        assert_eq!(content.lines().count(), 5_001);
        assert!(content.ends_with("4999,x y\n"));
    }

    #[tokio::test]
    async fn test_sqlite_export_parses_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        let mut session = SqliteQuerySession::connect("sqlite::memory:").await.unwrap();
        session
            .execute_batch(
                "CREATE TABLE people (id INTEGER, name TEXT, note TEXT);
                 INSERT INTO people VALUES (1, 'Ada', 'said \"hi\"');
                 INSERT INTO people VALUES (2, 'Grace', 'line1\nline2');
                 INSERT INTO people VALUES (3, 'Linus', NULL);",
            )
            .await
            .unwrap();

        let policy = FormattingPolicyBuilder::new()
            .delimiter(';')
            .quote_mode(QuoteMode::Always)
            .build();
        let outcome = ExportService::default()
            .export(
                &mut session,
                &request(&path, "SELECT id, name, note FROM people ORDER BY id", true, policy),
            )
            .await
            .unwrap();
        assert_eq!(outcome.rows, 3);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_path(&path)
            .unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["id", "name", "note"]);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][2], "said \"hi\"");
        assert_eq!(&records[1][2], "line1\nline2");
        assert_eq!(&records[2][2], "");
        assert!(read(&path).ends_with("\"3\";\"Linus\";\n"));
    }

    #[tokio::test]
    async fn test_sqlite_rejected_query_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never.csv");
        let mut session = SqliteQuerySession::connect("sqlite::memory:").await.unwrap();

        let err = ExportService::default()
            .export(
                &mut session,
                &request(&path, "SELECT * FROM no_such_table", true, FormattingPolicy::default()),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no such table"));
        assert!(!path.exists());
    }
}
