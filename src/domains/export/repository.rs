use crate::domains::export::types::{Row, Value};
use crate::errors::{QueryError, QueryResult};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Executor, Row as _, Statement, TypeInfo, ValueRef};

/// A live connection able to run queries for an export.
#[async_trait]
pub trait QuerySession: Send {
    /// Submit `sql` and return a cursor positioned before the first row.
    ///
    /// Implementations must report malformed SQL here rather than on the first
    /// fetch, so callers can fail before touching any output.
    async fn execute_query<'a>(&'a mut self, sql: &'a str) -> QueryResult<Box<dyn RowCursor + 'a>>;
}

/// Forward-only cursor over the rows of one query.
#[async_trait]
pub trait RowCursor: Send {
    /// Column labels in result order.
    fn column_names(&self) -> &[String];

    /// Next row, or `None` once the result is exhausted.
    async fn next_row(&mut self) -> QueryResult<Option<Row>>;

    /// Release the cursor. Calling it more than once is harmless.
    async fn close(&mut self) -> QueryResult<()>;
}

/// [`QuerySession`] backed by a single SQLite connection.
pub struct SqliteQuerySession {
    conn: SqliteConnection,
}

impl SqliteQuerySession {
    pub async fn connect(database_url: &str) -> QueryResult<Self> {
        let conn = SqliteConnection::connect(database_url)
            .await
            .map_err(|e| QueryError::Submission(database_message(&e)))?;
        log::debug!("Opened SQLite session for {}", database_url);
        Ok(Self { conn })
    }

    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self { conn }
    }

    /// Run a statement that produces no rows, e.g. setup DDL.
    pub async fn execute_batch(&mut self, sql: &str) -> QueryResult<u64> {
        let result = (&mut self.conn)
            .execute(sql)
            .await
            .map_err(|e| QueryError::Submission(database_message(&e)))?;
        Ok(result.rows_affected())
    }

    pub async fn close(self) -> QueryResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| QueryError::Close(database_message(&e)))
    }
}

#[async_trait]
impl QuerySession for SqliteQuerySession {
    async fn execute_query<'a>(&'a mut self, sql: &'a str) -> QueryResult<Box<dyn RowCursor + 'a>> {
        let columns: Vec<String> = {
            let statement = (&mut self.conn)
                .prepare(sql)
                .await
                .map_err(|e| QueryError::Submission(database_message(&e)))?;
            statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect()
        };

        let rows = sqlx::query(sql).fetch(&mut self.conn);
        Ok(Box::new(SqliteRowCursor {
            columns,
            rows: Some(rows),
        }))
    }
}

struct SqliteRowCursor<'a> {
    columns: Vec<String>,
    rows: Option<BoxStream<'a, Result<SqliteRow, sqlx::Error>>>,
}

#[async_trait]
impl<'a> RowCursor for SqliteRowCursor<'a> {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> QueryResult<Option<Row>> {
        let Some(rows) = self.rows.as_mut() else {
            return Ok(None);
        };

        match rows.next().await {
            Some(Ok(row)) => {
                let values = (0..row.len())
                    .map(|idx| decode_value(&row, idx))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| QueryError::Fetch(database_message(&e)))?;
                Ok(Some(values))
            }
            Some(Err(e)) => Err(QueryError::Fetch(database_message(&e))),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> QueryResult<()> {
        // dropping the stream finalizes the statement
        self.rows = None;
        Ok(())
    }
}

fn decode_value(row: &SqliteRow, idx: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" => Value::Integer(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" => Value::Real(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => Value::Text(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}

/// The database's own message when there is one, so users see it verbatim.
fn database_message(error: &sqlx::Error) -> String {
    match error {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}
