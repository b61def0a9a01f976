// Error type shared by the reader and writer halves

use std::io;
use thiserror::Error;

/// Everything that can go wrong while tokenizing or encoding CSV.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid control characters or options, raised at construction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A row's field count differs from the first row's.
    #[error("Row {line} has {found} fields, but first row had {expected} fields")]
    FieldCountMismatch {
        line: u64,
        found: usize,
        expected: usize,
    },

    /// I/O failure from the source or sink.
    #[error("IO error when {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A single field did not fit into the maximum buffer.
    #[error(
        "maximum buffer size {max} is not enough to read data of a single field when {context}. \
         Typically, this happens if quotation started but did not end within this buffer's \
         maximum boundary"
    )]
    BufferOverflow { context: String, max: usize },

    /// A materialized field is not valid UTF-8.
    #[error("invalid UTF-8 in record starting at line {line}: {source}")]
    Utf8 {
        line: u64,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The writer was used after `close()`.
    #[error("writer is already closed")]
    Closed,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a sink error raised while writing.
    pub(crate) fn write(source: io::Error) -> Self {
        Error::Io {
            context: "writing".to_string(),
            source,
        }
    }
}

/// Describe the record being read for error messages.
///
/// Before the first row completes there is no earlier line to cite.
pub(crate) fn record_context(rows_completed: u64, starting_line: u64) -> String {
    if rows_completed == 0 {
        "reading first record".to_string()
    } else {
        format!("reading record starting at line {}", starting_line)
    }
}
