// CSV field encoding: quoting decision and escape doubling
//
// One scan per field decides whether quotes are needed and remembers where
// the first quote character sits. Escaping then hops from quote to quote
// with memchr, copying the runs in between as whole slices.

use crate::config::{QuoteStrategy, WriterConfig, CR, LF};
use crate::core::scanner::find_quote;
use std::io;

/// Destination for encoded bytes.
pub trait Output {
    fn put(&mut self, byte: u8) -> io::Result<()>;
    fn put_slice(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl Output for Vec<u8> {
    #[inline]
    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.push(byte);
        Ok(())
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Per-writer encoding settings.
#[derive(Debug, Clone, Copy)]
pub struct FieldEncoder {
    separator: u8,
    quote: u8,
    comment: u8,
    strategy: QuoteStrategy,
}

impl FieldEncoder {
    pub fn new(config: &WriterConfig) -> Self {
        FieldEncoder {
            separator: config.field_separator,
            quote: config.quote_character,
            comment: config.comment_character,
            strategy: config.quote_strategy,
        }
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// Decide whether `value` must be quoted.
    ///
    /// Also returns the position of the first quote character; a value
    /// containing one is always quoted, whatever the strategy.
    #[inline]
    pub fn needs_quoting(&self, value: &[u8], first_field: bool) -> (bool, Option<usize>) {
        let mut needs_quotes = self.strategy == QuoteStrategy::Always;
        for (i, &c) in value.iter().enumerate() {
            if c == self.quote {
                return (true, Some(i));
            }
            if !needs_quotes
                && (c == self.separator
                    || c == LF
                    || c == CR
                    || (first_field && i == 0 && c == self.comment))
            {
                needs_quotes = true;
            }
        }
        (needs_quotes, None)
    }

    /// Encode one field. `None` is a null value.
    pub fn write_field<O: Output>(
        &self,
        out: &mut O,
        value: Option<&str>,
        first_field: bool,
    ) -> io::Result<()> {
        let value = match value {
            None => {
                if self.strategy == QuoteStrategy::Always {
                    out.put(self.quote)?;
                    out.put(self.quote)?;
                }
                return Ok(());
            }
            Some(v) => v.as_bytes(),
        };

        if value.is_empty() {
            if self.strategy != QuoteStrategy::Required {
                out.put(self.quote)?;
                out.put(self.quote)?;
            }
            return Ok(());
        }

        let (needs_quotes, first_quote) = self.needs_quoting(value, first_field);
        if needs_quotes {
            out.put(self.quote)?;
        }
        match first_quote {
            Some(pos) => self.write_escaped(out, value, pos)?,
            None => out.put_slice(value)?,
        }
        if needs_quotes {
            out.put(self.quote)?;
        }
        Ok(())
    }

    /// Write `value` with every quote doubled, starting from the known first
    /// quote at `next`.
    fn write_escaped<O: Output>(&self, out: &mut O, value: &[u8], mut next: usize) -> io::Result<()> {
        let mut start = 0;
        loop {
            out.put_slice(&value[start..=next])?;
            out.put(self.quote)?;
            start = next + 1;
            match find_quote(value, start, self.quote) {
                Some(pos) => next = pos,
                None => break,
            }
        }
        if start < value.len() {
            out.put_slice(&value[start..])?;
        }
        Ok(())
    }

    /// Write comment text after the comment character, splitting embedded
    /// line breaks into separate comment lines. CRLF counts as one break.
    pub fn write_comment_body<O: Output>(
        &self,
        out: &mut O,
        comment: &[u8],
        delimiter: &[u8],
    ) -> io::Result<()> {
        let mut start = 0;
        let mut last_char_was_cr = false;
        for (i, &c) in comment.iter().enumerate() {
            if c == CR {
                out.put_slice(&comment[start..i])?;
                out.put_slice(delimiter)?;
                out.put(self.comment)?;
                start = i + 1;
                last_char_was_cr = true;
            } else if c == LF {
                if last_char_was_cr {
                    last_char_was_cr = false;
                    start += 1;
                } else {
                    out.put_slice(&comment[start..i])?;
                    out.put_slice(delimiter)?;
                    out.put(self.comment)?;
                    start = i + 1;
                }
            } else {
                last_char_was_cr = false;
            }
        }
        if start < comment.len() {
            out.put_slice(&comment[start..])?;
        }
        Ok(())
    }
}
