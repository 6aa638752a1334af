use crate::domains::export::types::{
    EmptyLinePolicy, FormattingPolicy, QuoteMode, SurroundingSpacesPolicy, Value,
};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encodes header and data rows as delimited text under a [`FormattingPolicy`].
#[derive(Debug, Clone)]
pub struct RowEncoder {
    policy: FormattingPolicy,
}

impl RowEncoder {
    pub fn new(policy: FormattingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FormattingPolicy {
        &self.policy
    }

    /// True when `row` would encode as nothing but the line terminator: no
    /// columns, or a single field that is `NULL` or an unquoted empty value.
    pub fn is_blank(&self, row: &[Value]) -> bool {
        match row {
            [] => true,
            [value] => match value.to_field() {
                None => true,
                Some(text) => text.is_empty() && !self.needs_quotes(&text),
            },
            _ => false,
        }
    }

    /// Append the encoded column-name row, including the line terminator.
    pub fn encode_header(&self, names: &[String], out: &mut String) {
        self.encode_fields(names.iter().map(|n| Some(n.as_str())), out);
    }

    /// Append the encoded data row, including the line terminator.
    pub fn encode_row(&self, row: &[Value], out: &mut String) {
        let fields: Vec<Option<String>> = row.iter().map(Value::to_field).collect();
        self.encode_fields(fields.iter().map(|f| f.as_deref()), out);
    }

    fn encode_fields<'a>(&self, fields: impl Iterator<Item = Option<&'a str>>, out: &mut String) {
        for (idx, field) in fields.enumerate() {
            if idx > 0 {
                out.push(self.policy.delimiter);
            }
            // NULL is always an empty, unquoted field
            if let Some(text) = field {
                self.encode_field(text, out);
            }
        }
        out.push_str(&self.policy.end_of_line);
    }

    fn encode_field(&self, text: &str, out: &mut String) {
        if !self.needs_quotes(text) {
            out.push_str(text);
            return;
        }

        let quote = self.policy.quote_char;
        out.reserve(text.len() + 2);
        out.push(quote);
        for c in text.chars() {
            if c == quote {
                out.push(quote);
            }
            out.push(c);
        }
        out.push(quote);
    }

    /// Decide whether a non-null field has to be wrapped in quote characters.
    pub fn needs_quotes(&self, text: &str) -> bool {
        let policy = &self.policy;
        if policy.quote_mode == QuoteMode::Always {
            return true;
        }

        let contains_special = text.chars().any(|c| {
            c == policy.delimiter || c == policy.quote_char || c == '\r' || c == '\n'
        });
        if contains_special {
            return true;
        }
        if !policy.end_of_line.is_empty() && text.contains(policy.end_of_line.as_str()) {
            return true;
        }

        policy.surrounding_spaces_policy == SurroundingSpacesPolicy::NeedsQuotes
            && (text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace))
    }
}

/// Counters kept by a [`StreamingCsvWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub rows_written: u64,
    pub rows_skipped: u64,
    pub bytes_written: u64,
}

/// Writes encoded rows to an async sink one at a time.
///
/// Only the row currently being encoded is held in memory; the line buffer is
/// reused between rows.
pub struct StreamingCsvWriter<W: AsyncWrite + Unpin + Send> {
    inner: W,
    encoder: RowEncoder,
    line: String,
    stats: WriterStats,
}

impl<W: AsyncWrite + Unpin + Send> StreamingCsvWriter<W> {
    pub fn new(writer: W, policy: FormattingPolicy) -> Self {
        Self {
            inner: writer,
            encoder: RowEncoder::new(policy),
            line: String::with_capacity(256),
            stats: WriterStats::default(),
        }
    }

    pub async fn write_header(&mut self, names: &[String]) -> io::Result<()> {
        self.line.clear();
        self.encoder.encode_header(names, &mut self.line);
        self.write_line().await
    }

    /// Write one data row. Returns `false` when the empty-line policy dropped it.
    pub async fn write_row(&mut self, row: &[Value]) -> io::Result<bool> {
        if self.encoder.policy().empty_line_policy() == EmptyLinePolicy::Ignore
            && self.encoder.is_blank(row)
        {
            self.stats.rows_skipped += 1;
            return Ok(false);
        }

        self.line.clear();
        self.encoder.encode_row(row, &mut self.line);
        self.write_line().await?;
        self.stats.rows_written += 1;
        Ok(true)
    }

    async fn write_line(&mut self) -> io::Result<()> {
        self.inner.write_all(self.line.as_bytes()).await?;
        self.stats.bytes_written += self.line.len() as u64;
        Ok(())
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
