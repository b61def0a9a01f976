// CSV writer with an internal staging buffer
//
// Rows are encoded field by field straight into a byte buffer of
// `buffer_size` bytes, which drains into the sink when it fills up, on
// `flush()` and on `close()`. A write that would reach the end of the buffer
// drains it first; a value at least as large as the whole buffer bypasses
// it. With `buffer_size == 0` every write goes straight to the sink and the
// sink is flushed after each row.

use crate::config::WriterConfig;
use crate::encode::{FieldEncoder, Output};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::io::{self, Write};

#[derive(Debug)]
struct Staging<W: Write> {
    sink: W,
    buf: Vec<u8>,
    cap: usize,
    /// Where the line being written starts in `buf`.
    line_start: usize,
}

impl<W: Write> Staging<W> {
    fn drain(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            trace!("draining {} buffered bytes", self.buf.len());
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
            self.line_start = 0;
        }
        Ok(())
    }
}

impl<W: Write> Output for Staging<W> {
    #[inline]
    fn put(&mut self, byte: u8) -> io::Result<()> {
        if self.cap == 0 {
            return self.sink.write_all(&[byte]);
        }
        if self.buf.len() == self.cap {
            self.drain()?;
        }
        self.buf.push(byte);
        Ok(())
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.cap == 0 {
            return self.sink.write_all(bytes);
        }
        if self.buf.len() + bytes.len() >= self.cap {
            self.drain()?;
            if bytes.len() >= self.cap {
                return self.sink.write_all(bytes);
            }
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

/// Writes rows and comments as CSV.
///
/// ```
/// use streamcsv::{CsvWriter, LineDelimiter, WriterConfig};
///
/// let config = WriterConfig {
///     line_delimiter: LineDelimiter::Lf,
///     ..Default::default()
/// };
/// let mut out = Vec::new();
/// let mut writer = CsvWriter::new(&mut out, config).unwrap();
/// writer.write_row(["a", "b,c"]).unwrap();
/// writer.close().unwrap();
/// drop(writer);
/// assert_eq!(out, b"a,\"b,c\"\n");
/// ```
#[derive(Debug)]
pub struct CsvWriter<W: Write> {
    out: Option<Staging<W>>,
    encoder: FieldEncoder,
    config: WriterConfig,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(sink: W, config: WriterConfig) -> Result<Self> {
        config.validate()?;
        let cap = config.buffer_size;
        Ok(CsvWriter {
            out: Some(Staging {
                sink,
                buf: Vec::with_capacity(cap),
                cap,
                line_start: 0,
            }),
            encoder: FieldEncoder::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write one row followed by the line delimiter.
    pub fn write_row<I, S>(&mut self, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_record(fields.into_iter().map(Some))
    }

    /// Write one row where `None` marks a null value.
    ///
    /// Nulls only differ from empty strings under `QuoteStrategy::Empty`,
    /// which quotes empty strings but leaves nulls bare.
    pub fn write_row_nullable<I, S>(&mut self, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        self.write_record(fields)
    }

    fn write_record<I, S>(&mut self, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        self.write_line(|encoder, out| {
            let mut first = true;
            for field in fields {
                if !first {
                    out.put(encoder.separator())?;
                }
                let value: Option<&str> = field.as_ref().map(|s| s.as_ref());
                encoder.write_field(&mut *out, value, first)?;
                first = false;
            }
            Ok(())
        })
    }

    /// Write a comment line. Line breaks inside `comment` start new comment
    /// lines.
    pub fn write_comment(&mut self, comment: &str) -> Result<&mut Self> {
        let comment_character = self.config.comment_character;
        let delimiter = self.config.line_delimiter.as_bytes();
        self.write_line(|encoder, out| {
            out.put(comment_character)?;
            encoder.write_comment_body(out, comment.as_bytes(), delimiter)
        })
    }

    /// Write one logical line followed by the delimiter.
    ///
    /// If the sink fails, the part of the line still staged is discarded so
    /// a later flush cannot emit half a line. Bytes that already reached the
    /// sink (always the case with `buffer_size == 0`) cannot be taken back.
    fn write_line<F>(&mut self, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&FieldEncoder, &mut Staging<W>) -> io::Result<()>,
    {
        let encoder = self.encoder;
        let delimiter = self.config.line_delimiter.as_bytes();
        let out = self.out.as_mut().ok_or(Error::Closed)?;
        out.line_start = out.buf.len();

        let result: io::Result<()> = (|| {
            body(&encoder, &mut *out)?;
            out.put_slice(delimiter)?;
            if out.cap == 0 {
                out.sink.flush()?;
            }
            Ok(())
        })();

        if let Err(e) = result {
            let keep = out.line_start;
            out.buf.truncate(keep);
            return Err(Error::write(e));
        }
        Ok(self)
    }

    /// Drain buffered output and flush the sink.
    pub fn flush(&mut self) -> Result<()> {
        let out = self.out.as_mut().ok_or(Error::Closed)?;
        out.drain().map_err(Error::write)?;
        out.sink.flush().map_err(Error::write)
    }

    /// Flush and release the sink. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            debug!("closing CSV writer");
            out.drain().map_err(Error::write)?;
            out.sink.flush().map_err(Error::write)?;
        }
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn into_inner(mut self) -> Result<W> {
        let mut out = self.out.take().ok_or(Error::Closed)?;
        out.drain().map_err(Error::write)?;
        out.sink.flush().map_err(Error::write)?;
        Ok(out.sink)
    }
}

impl<W: Write> Drop for CsvWriter<W> {
    fn drop(&mut self) {
        // errors on drop are ignored, call close() to observe them
        if let Some(out) = self.out.as_mut() {
            let _ = out.drain();
            let _ = out.sink.flush();
        }
    }
}
