// Row tokenizer: the quote/comment-aware state machine
//
// Single pass over the buffer window. Fields are handed to the RowBuilder as
// soon as their end is seen; the tokenizer only returns to its caller at a
// row break or when the buffer needs refilling. The scan loop keeps position
// and status in locals and writes them back once per call.

use crate::config::{CommentStrategy, ReaderConfig, CR, LF};
use crate::core::buffer::{Buffer, FetchError};
use crate::core::scanner::{find_data_end, find_line_end, find_quoted_end};
use crate::error::{record_context, Error, Result};
use crate::row::{Row, RowBuilder};
use std::ops::BitOr;

/// OR-combinable scan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status(u8);

impl Status {
    pub const RESET: Status = Status(0);
    pub const DATA_COLUMN: Status = Status(1);
    pub const QUOTED_COLUMN: Status = Status(2);
    pub const QUOTED_MODE: Status = Status(4);
    pub const NEW_FIELD: Status = Status(8);
    pub const COMMENTED_ROW: Status = Status(16);
    pub const LAST_CHAR_WAS_CR: Status = Status(32);
    /// Lenient mode: a quote ended the window, close-or-literal is decided
    /// by the next byte.
    pub const QUOTE_PENDING: Status = Status(64);

    #[inline]
    pub fn contains(self, other: Status) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn insert(&mut self, other: Status) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Status) {
        self.0 &= !other.0;
    }
}

impl BitOr for Status {
    type Output = Status;

    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

pub struct Tokenizer<'a> {
    buffer: Buffer<'a>,
    rows: RowBuilder,
    status: Status,
    finished: bool,
    separator: u8,
    quote: u8,
    comment: u8,
    comments_enabled: bool,
    lenient: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(buffer: Buffer<'a>, config: &ReaderConfig) -> Self {
        Tokenizer {
            buffer,
            rows: RowBuilder::new(
                config.quote_character,
                config.ignore_invalid_quote_chars,
                config.ignore_columns.clone(),
            ),
            status: Status::RESET,
            finished: false,
            separator: config.field_separator,
            quote: config.quote_character,
            comment: config.comment_character,
            comments_enabled: config.comment_strategy != CommentStrategy::None,
            lenient: config.ignore_invalid_quote_chars,
        }
    }

    /// Parse the next row. Returns false once the stream is exhausted.
    ///
    /// On success the row is available through [`row`](Self::row) until the
    /// next call. Any error finishes the tokenizer.
    pub fn next_row(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        match self.fetch_and_read() {
            Ok(produced) => Ok(produced),
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    pub fn row(&self) -> &Row {
        self.rows.current()
    }

    pub fn take_row(&mut self) -> Row {
        self.rows.take_current()
    }

    /// Release the source; later calls report end of stream.
    pub fn close(&mut self) {
        self.buffer.close();
        self.finished = true;
    }

    fn fetch_and_read(&mut self) -> Result<bool> {
        loop {
            if self.buffer.len == self.buffer.pos {
                // cursor reached current end of data -- need to fetch
                let eof = self.buffer.fetch_data().map_err(|e| self.fetch_error(e))?;
                if eof {
                    self.finish_stream()?;
                    break;
                }
            }
            if !self.consume()? {
                break;
            }
        }
        Ok(self.rows.finish_row())
    }

    fn finish_stream(&mut self) -> Result<()> {
        let (begin, pos) = (self.buffer.begin, self.buffer.pos);
        if begin < pos || self.rows.is_comment_mode() {
            let quoted = self.status.contains(Status::QUOTED_COLUMN);
            self.rows.add(&self.buffer.data()[begin..pos], quoted)?;
        } else if self.status.contains(Status::NEW_FIELD) {
            self.rows.add_empty_field();
        }
        self.finished = true;
        Ok(())
    }

    fn fetch_error(&self, err: FetchError) -> Error {
        let context = record_context(self.rows.rows_completed(), self.rows.line());
        match err {
            FetchError::Io(source) => Error::Io { context, source },
            FetchError::Overflow(max) => Error::BufferOverflow { context, max },
        }
    }

    /// Scan `[pos, len)`. Returns true if more data is needed to finish the
    /// row, false if a row break was reached.
    fn consume(&mut self) -> Result<bool> {
        let (sep, quote, comment) = (self.separator, self.quote, self.comment);
        let (comments_enabled, lenient) = (self.comments_enabled, self.lenient);
        let len = self.buffer.len;
        let buf = &self.buffer.data()[..len];
        let rows = &mut self.rows;
        let mut pos = self.buffer.pos;
        let mut begin = self.buffer.begin;
        let mut status = self.status;

        let more_data_needed = 'outer: {
            'mode_check: while pos < len {
                if status.contains(Status::QUOTED_MODE) {
                    if status.contains(Status::QUOTE_PENDING) {
                        status.remove(Status::QUOTE_PENDING);
                        if is_field_end(buf[pos], sep) {
                            status.remove(Status::QUOTED_MODE);
                            continue 'mode_check;
                        }
                    }
                    // we're in quotes
                    while pos < len {
                        let c = buf[pos];
                        pos += 1;
                        if c == quote {
                            status.remove(Status::LAST_CHAR_WAS_CR);
                            if !lenient {
                                status.remove(Status::QUOTED_MODE);
                            } else {
                                match buf.get(pos) {
                                    Some(&next) if is_field_end(next, sep) => {
                                        status.remove(Status::QUOTED_MODE)
                                    }
                                    Some(_) => {}
                                    // end of stream closes; a refill may not
                                    None => status.insert(Status::QUOTE_PENDING),
                                }
                            }
                            continue 'mode_check;
                        } else if c == CR {
                            status.insert(Status::LAST_CHAR_WAS_CR);
                            rows.inc_lines();
                        } else if c == LF {
                            if status.contains(Status::LAST_CHAR_WAS_CR) {
                                status.remove(Status::LAST_CHAR_WAS_CR);
                            } else {
                                rows.inc_lines();
                            }
                        } else {
                            status.remove(Status::LAST_CHAR_WAS_CR);
                            pos = find_quoted_end(buf, pos, quote);
                        }
                    }
                } else if status.contains(Status::COMMENTED_ROW) {
                    let end = find_line_end(buf, pos);
                    if end == len {
                        pos = len;
                        continue;
                    }
                    rows.add(&buf[begin..end], false)?;
                    self.status = if buf[end] == CR {
                        Status::LAST_CHAR_WAS_CR
                    } else {
                        Status::RESET
                    };
                    pos = end + 1;
                    begin = pos;
                    break 'outer false;
                } else {
                    // we're not in quotes
                    while pos < len {
                        let c = buf[pos];
                        pos += 1;
                        if c == sep {
                            rows.add(&buf[begin..pos - 1], status.contains(Status::QUOTED_COLUMN))?;
                            status = Status::NEW_FIELD;
                            begin = pos;
                        } else if c == CR {
                            rows.add(&buf[begin..pos - 1], status.contains(Status::QUOTED_COLUMN))?;
                            self.status = Status::LAST_CHAR_WAS_CR;
                            begin = pos;
                            break 'outer false;
                        } else if c == LF {
                            if !status.contains(Status::LAST_CHAR_WAS_CR) {
                                rows.add(&buf[begin..pos - 1], status.contains(Status::QUOTED_COLUMN))?;
                                self.status = Status::RESET;
                                begin = pos;
                                break 'outer false;
                            }
                            // second half of CRLF
                            status = Status::RESET;
                            begin = pos;
                        } else if comments_enabled
                            && c == comment
                            && (status == Status::RESET || status == Status::LAST_CHAR_WAS_CR)
                        {
                            begin = pos;
                            status = Status::COMMENTED_ROW;
                            rows.enable_comment_mode();
                            continue 'mode_check;
                        } else if c == quote && !status.contains(Status::DATA_COLUMN) {
                            status = Status::QUOTED_COLUMN | Status::QUOTED_MODE;
                            continue 'mode_check;
                        } else if !status.contains(Status::QUOTED_COLUMN) {
                            // normal unquoted data
                            status = Status::DATA_COLUMN;
                            pos = find_data_end(buf, pos, sep);
                        }
                        // else: field data after closing quote
                    }
                }
            }
            self.status = status;
            true
        };

        self.buffer.pos = pos;
        self.buffer.begin = begin;
        Ok(more_data_needed)
    }
}

/// Lenient mode: only a quote followed by separator, CR or LF closes.
#[inline]
fn is_field_end(next: u8, sep: u8) -> bool {
    next == sep || next == CR || next == LF
}
