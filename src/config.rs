// Reader and writer configuration
//
// Plain structs with RFC 4180 defaults. Control characters are validated
// once, when a reader or writer is constructed.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

pub const DEFAULT_FIELD_SEPARATOR: u8 = b',';
pub const DEFAULT_QUOTE_CHARACTER: u8 = b'"';
pub const DEFAULT_COMMENT_CHARACTER: u8 = b'#';
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 8192;

/// How rows starting with the comment character are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStrategy {
    /// Comment character is ordinary data.
    #[default]
    None,
    /// Commented rows are detected and dropped.
    Skip,
    /// Commented rows are detected and returned with `is_comment` set.
    Read,
}

/// When the writer encloses a field in quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStrategy {
    /// Only when the content requires it.
    #[default]
    Required,
    /// Like `Required`, plus empty strings are written as `""`.
    Empty,
    /// Every field, including nulls.
    Always,
}

/// Row terminator written after each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineDelimiter {
    Lf,
    Cr,
    #[default]
    CrLf,
}

impl LineDelimiter {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineDelimiter::Lf => b"\n",
            LineDelimiter::Cr => b"\r",
            LineDelimiter::CrLf => b"\r\n",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineDelimiter::Lf => "\n",
            LineDelimiter::Cr => "\r",
            LineDelimiter::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineDelimiter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "\r\n" => Ok(LineDelimiter::CrLf),
            "\n" => Ok(LineDelimiter::Lf),
            "\r" => Ok(LineDelimiter::Cr),
            other => Err(Error::Config(format!("Unknown line delimiter: {:?}", other))),
        }
    }
}

/// Options recognized by [`CsvReader`](crate::CsvReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub field_separator: u8,
    pub quote_character: u8,
    pub comment_character: u8,
    pub comment_strategy: CommentStrategy,
    pub skip_empty_rows: bool,
    pub error_on_different_field_count: bool,
    /// Treat a quote that is not followed by separator/CR/LF as literal data.
    /// Not RFC 4180 conformant.
    pub ignore_invalid_quote_chars: bool,
    /// Zero-based columns that are returned as empty strings without being
    /// materialized.
    pub ignore_columns: Vec<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            field_separator: DEFAULT_FIELD_SEPARATOR,
            quote_character: DEFAULT_QUOTE_CHARACTER,
            comment_character: DEFAULT_COMMENT_CHARACTER,
            comment_strategy: CommentStrategy::None,
            skip_empty_rows: true,
            error_on_different_field_count: false,
            ignore_invalid_quote_chars: false,
            ignore_columns: Vec::new(),
        }
    }
}

impl ReaderConfig {
    pub fn validate(&self) -> Result<()> {
        validate_control_chars(
            self.field_separator,
            self.quote_character,
            self.comment_character,
        )
    }
}

/// Options recognized by [`CsvWriter`](crate::CsvWriter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub field_separator: u8,
    pub quote_character: u8,
    pub comment_character: u8,
    pub quote_strategy: QuoteStrategy,
    pub line_delimiter: LineDelimiter,
    /// Size of the internal output buffer; 0 writes straight to the sink and
    /// flushes it after every row.
    pub buffer_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            field_separator: DEFAULT_FIELD_SEPARATOR,
            quote_character: DEFAULT_QUOTE_CHARACTER,
            comment_character: DEFAULT_COMMENT_CHARACTER,
            quote_strategy: QuoteStrategy::Required,
            line_delimiter: LineDelimiter::CrLf,
            buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
        }
    }
}

impl WriterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_control_chars(
            self.field_separator,
            self.quote_character,
            self.comment_character,
        )
    }
}

fn validate_control_chars(separator: u8, quote: u8, comment: u8) -> Result<()> {
    for (name, c) in [
        ("field_separator", separator),
        ("quote_character", quote),
        ("comment_character", comment),
    ] {
        if c == CR || c == LF {
            return Err(Error::Config(format!("{} must not be a newline char", name)));
        }
        if !c.is_ascii() {
            return Err(Error::Config(format!(
                "{} must be an ASCII character, got byte 0x{:02x}",
                name, c
            )));
        }
    }
    if separator == quote || separator == comment || quote == comment {
        return Err(Error::Config(format!(
            "Control characters must differ (field_separator={:?}, quote_character={:?}, comment_character={:?})",
            separator as char, quote as char, comment as char
        )));
    }
    Ok(())
}
