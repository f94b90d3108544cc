//! JSONL reading operations.
//!
//! [`JsonlReader`] reads one record per line from any async reader and tracks
//! line numbers for diagnostics. [`read_jsonl_resilient`] is the convenience
//! entry point used to load snapshot files.

use crate::error::{Error, Result};
use crate::warning::Warning;
use serde::de::DeserializeOwned;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// Blank lines are skipped silently; they are common at the end of files
/// produced by shell tooling.
///
/// # Examples
///
/// ```no_run
/// use tributary_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("nodes.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// let mut warnings = Vec::new();
/// while let Some(record) = reader.next_resilient::<serde_json::Value>(&mut warnings).await? {
///     println!("{record}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// 1-based number of the last line read, 0 before the first read.
    line_number: usize,
    buffer: String,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::new(),
        }
    }

    /// Returns the number of the last line read (0 before any reads).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next non-blank line, returning `None` at end of input.
    async fn next_line(&mut self) -> Result<Option<&str>> {
        loop {
            self.buffer.clear();
            let read = match self.reader.read_line(&mut self.buffer).await {
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Err(Error::InvalidFormat(format!(
                        "line {}: content is not valid UTF-8",
                        self.line_number + 1
                    )));
                }
                Err(e) => return Err(e.into()),
            };
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if !self.buffer.trim().is_empty() {
                return Ok(Some(self.buffer.trim()));
            }
        }
    }

    /// Reads and deserializes the next record, failing on the first bad line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the line cannot be deserialized into `T`,
    /// or an I/O error from the underlying reader.
    pub async fn next_strict<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.next_line().await? {
            Some(line) => Ok(Some(serde_json::from_str(line)?)),
            None => Ok(None),
        }
    }

    /// Reads the next record, skipping bad lines and recording them in `warnings`.
    ///
    /// Lines that are not JSON become [`Warning::MalformedJson`]; lines that are
    /// JSON but do not match `T` become [`Warning::SkippedLine`].
    ///
    /// # Errors
    ///
    /// Only I/O failures and non-UTF-8 content are returned as errors.
    pub async fn next_resilient<T: DeserializeOwned>(
        &mut self,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<T>> {
        loop {
            let Some(line) = self.next_line().await? else {
                return Ok(None);
            };
            let value: serde_json::Value = match serde_json::from_str(line) {
                Ok(value) => value,
                Err(e) => {
                    warnings.push(Warning::MalformedJson {
                        line_number: self.line_number,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            match serde_json::from_value(value) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => warnings.push(Warning::SkippedLine {
                    line_number: self.line_number,
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// Reads every record of a JSONL file, collecting warnings for bad lines.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read, or if it contains
/// bytes that are not UTF-8.
///
/// # Examples
///
/// ```no_run
/// use tributary_jsonl::read_jsonl_resilient;
///
/// # async fn example() -> tributary_jsonl::Result<()> {
/// let (records, warnings) =
///     read_jsonl_resilient::<serde_json::Value, _>(".tributary/edges.jsonl").await?;
/// println!("{} records, {} warnings", records.len(), warnings.len());
/// # Ok(())
/// # }
/// ```
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).await?;
    let mut reader = JsonlReader::new(file);
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    while let Some(record) = reader.next_resilient(&mut warnings).await? {
        records.push(record);
    }

    if !warnings.is_empty() {
        tracing::debug!(
            path = %path.display(),
            warnings = warnings.len(),
            "Skipped unreadable JSONL lines"
        );
    }

    Ok((records, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: String,
    }

    #[tokio::test]
    async fn skips_blank_lines_but_counts_them() {
        let data = Cursor::new(b"{\"id\":\"a\"}\n\n{\"id\":\"b\"}\n".to_vec());
        let mut reader = JsonlReader::new(data);

        let first: Row = reader.next_strict().await.unwrap().unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(reader.line_number(), 1);

        let second: Row = reader.next_strict().await.unwrap().unwrap();
        assert_eq!(second.id, "b");
        assert_eq!(reader.line_number(), 3);

        assert!(reader.next_strict::<Row>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resilient_read_separates_syntax_and_shape_errors() {
        let data = Cursor::new(b"{\"id\":\"a\"}\n{broken\n{\"name\":\"x\"}\n{\"id\":\"d\"}\n".to_vec());
        let mut reader = JsonlReader::new(data);
        let mut warnings = Vec::new();
        let mut rows = Vec::new();

        while let Some(row) = reader.next_resilient::<Row>(&mut warnings).await.unwrap() {
            rows.push(row);
        }

        assert_eq!(rows.len(), 2);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind(), "malformed_json");
        assert_eq!(warnings[0].line_number(), 2);
        assert_eq!(warnings[1].kind(), "skipped_line");
        assert_eq!(warnings[1].line_number(), 3);
    }

    #[tokio::test]
    async fn strict_read_fails_on_bad_line() {
        let data = Cursor::new(b"not json\n".to_vec());
        let mut reader = JsonlReader::new(data);
        let result = reader.next_strict::<Row>().await;
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_format_error() {
        let data = Cursor::new(vec![0xff, 0xfe, b'\n']);
        let mut reader = JsonlReader::new(data);
        let mut warnings = Vec::new();
        let result = reader.next_resilient::<Row>(&mut warnings).await;
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }
}
