// Row policy layer over the tokenizer
//
// Pull-based: each advance parses rows until one survives the comment,
// empty-row and field-count rules. Two ways to consume:
//   - `Iterator` yields owned rows (fresh allocation per row)
//   - `read_row` lends one reused row; the borrow ends at the next advance

use crate::config::{CommentStrategy, ReaderConfig};
use crate::core::buffer::Buffer;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::tokenizer::Tokenizer;
use log::debug;
use std::io::Read;

/// Reads CSV rows from an in-memory string or a streamed source.
///
/// ```
/// use streamcsv::{CsvReader, ReaderConfig};
///
/// let mut reader = CsvReader::from_str("a,b\n\"c,d\",e\n", ReaderConfig::default()).unwrap();
/// let row = reader.next().unwrap().unwrap();
/// assert_eq!(row.fields(), &["a", "b"]);
/// let row = reader.next().unwrap().unwrap();
/// assert_eq!(&row[0], "c,d");
/// assert!(reader.next().is_none());
/// ```
pub struct CsvReader<'a> {
    tokenizer: Tokenizer<'a>,
    config: ReaderConfig,
    first_field_count: Option<usize>,
}

impl<'a> CsvReader<'a> {
    /// Read from a string without copying it into an intermediate buffer.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(data: &'a str, config: ReaderConfig) -> Result<Self> {
        Self::from_slice(data.as_bytes(), config)
    }

    /// Read from an in-memory byte slice. Fields must be valid UTF-8.
    pub fn from_slice(data: &'a [u8], config: ReaderConfig) -> Result<Self> {
        Self::with_buffer(Buffer::borrowed(data), config)
    }

    /// Read incrementally from any byte source.
    pub fn from_reader<R: Read + 'a>(source: R, config: ReaderConfig) -> Result<Self> {
        Self::with_buffer(Buffer::streamed(source), config)
    }

    pub(crate) fn with_buffer(buffer: Buffer<'a>, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(CsvReader {
            tokenizer: Tokenizer::new(buffer, &config),
            config,
            first_field_count: None,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Owned rows, without giving up the reader (e.g. to `close()` it
    /// afterwards).
    pub fn rows(&mut self) -> &mut Self {
        self
    }

    /// Advance to the next row and lend it.
    ///
    /// The returned row is reused: its storage is overwritten by the next
    /// call, which the borrow checker enforces. Use the `Iterator` impl to
    /// keep rows around.
    pub fn read_row(&mut self) -> Result<Option<&Row>> {
        if self.advance()? {
            Ok(Some(self.tokenizer.row()))
        } else {
            Ok(None)
        }
    }

    /// Release the source. Idempotent; later reads report end of stream.
    pub fn close(&mut self) {
        self.tokenizer.close();
    }

    fn advance(&mut self) -> Result<bool> {
        loop {
            if !self.tokenizer.next_row()? {
                return Ok(false);
            }
            let row = self.tokenizer.row();

            if self.config.comment_strategy == CommentStrategy::Skip && row.is_comment() {
                continue;
            }

            if row.is_empty() {
                if self.config.skip_empty_rows {
                    continue;
                }
            } else if self.config.error_on_different_field_count {
                let found = row.field_count();
                match self.first_field_count {
                    None => self.first_field_count = Some(found),
                    Some(expected) if expected != found => {
                        let line = row.original_line_number();
                        debug!(
                            "field count mismatch at line {}: {} vs {}",
                            line, found, expected
                        );
                        return Err(Error::FieldCountMismatch {
                            line,
                            found,
                            expected,
                        });
                    }
                    Some(_) => {}
                }
            }
            return Ok(true);
        }
    }
}

impl Iterator for CsvReader<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => Some(Ok(self.tokenizer.take_row())),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
