//! Non-fatal problems found while reading JSON Lines.
//!
//! A graph snapshot exported by an ingestion job can contain a truncated
//! line or a record written by an older schema. Those lines are skipped and
//! reported as a [`Warning`] so the caller can surface them without losing
//! the rest of the file.
//!
//! # Examples
//!
//! ```
//! use tributary_jsonl::Warning;
//!
//! let warning = Warning::MalformedJson {
//!     line_number: 5,
//!     error: "EOF while parsing an object".to_string(),
//! };
//! assert_eq!(warning.line_number(), 5);
//! assert_eq!(warning.kind(), "malformed_json");
//! ```

use std::fmt;

/// A non-fatal warning raised while reading a JSONL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The line is not valid JSON.
    MalformedJson {
        /// The 1-based line number.
        line_number: usize,
        /// The parser's description of the problem.
        error: String,
    },

    /// The line is valid JSON but does not have the expected record shape.
    SkippedLine {
        /// The 1-based line number.
        line_number: usize,
        /// Why the record was rejected.
        reason: String,
    },
}

impl Warning {
    /// Returns the 1-based line number the warning refers to.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a stable identifier for the warning kind.
    ///
    /// ```
    /// use tributary_jsonl::Warning;
    ///
    /// let warning = Warning::SkippedLine {
    ///     line_number: 3,
    ///     reason: "missing field `id`".to_string(),
    /// };
    /// assert_eq!(warning.kind(), "skipped_line");
    /// ```
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => write!(f, "line {line_number}: skipped: {reason}"),
        }
    }
}

impl std::error::Error for Warning {}
