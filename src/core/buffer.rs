// Buffer manager for the streaming tokenizer
//
// Owns the byte window the tokenizer scans. Cursors satisfy
// begin <= pos <= len <= capacity: [begin, pos) is the span of the field in
// progress, [pos, len) is data not yet scanned.
//
// In-memory input is scanned in place and never refilled. Streamed input
// is read in fixed chunks; the unconsumed window is relocated to the front
// when the tail runs short, and the array doubles (up to a ceiling) when the
// window itself is too large.

use log::{debug, trace};
use std::io::{self, Read};

/// Bytes requested from the source per read.
pub const READ_SIZE: usize = 8192;

/// Hard ceiling for buffer growth. A single field must fit in here.
pub const MAX_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Why `fetch_data` failed.
#[derive(Debug)]
pub enum FetchError {
    Io(io::Error),
    /// Growing past the ceiling would be required; carries the ceiling.
    Overflow(usize),
}

enum Storage<'a> {
    /// Whole input already in memory.
    Borrowed(&'a [u8]),
    /// Growable window over a pull source.
    Streamed {
        buf: Vec<u8>,
        source: Box<dyn Read + 'a>,
    },
    /// Source released by `close()`.
    Closed,
}

pub struct Buffer<'a> {
    storage: Storage<'a>,
    pub begin: usize,
    pub pos: usize,
    pub len: usize,
    read_size: usize,
    max_size: usize,
}

impl<'a> Buffer<'a> {
    /// Scan an in-memory slice directly, without copying.
    pub fn borrowed(data: &'a [u8]) -> Self {
        Buffer {
            storage: Storage::Borrowed(data),
            begin: 0,
            pos: 0,
            len: data.len(),
            read_size: READ_SIZE,
            max_size: MAX_BUFFER_SIZE,
        }
    }

    /// Buffer a pull source with the default chunk size and ceiling.
    pub fn streamed<R: Read + 'a>(source: R) -> Self {
        Self::with_limits(source, READ_SIZE, MAX_BUFFER_SIZE)
    }

    /// Buffer a pull source with explicit chunk size and ceiling.
    pub(crate) fn with_limits<R: Read + 'a>(source: R, read_size: usize, max_size: usize) -> Self {
        let read_size = read_size.max(1);
        Buffer {
            storage: Storage::Streamed {
                buf: vec![0; read_size],
                source: Box::new(source),
            },
            begin: 0,
            pos: 0,
            len: 0,
            read_size,
            max_size: max_size.max(read_size),
        }
    }

    /// Everything currently held; only `[..len]` is meaningful.
    #[inline]
    pub fn data(&self) -> &[u8] {
        match &self.storage {
            Storage::Borrowed(data) => data,
            Storage::Streamed { buf, .. } => buf,
            Storage::Closed => &[],
        }
    }

    pub fn capacity(&self) -> usize {
        self.data().len()
    }

    /// Refill from the source. Returns `Ok(true)` once the stream is exhausted.
    pub fn fetch_data(&mut self) -> Result<bool, FetchError> {
        let read_size = self.read_size;
        let max_size = self.max_size;
        let (buf, source) = match &mut self.storage {
            Storage::Borrowed(_) | Storage::Closed => return Ok(true),
            Storage::Streamed { buf, source } => (buf, source),
        };

        if self.begin < self.pos {
            // unconsumed data that has to survive the refill
            if read_size > buf.len() - self.pos {
                let len_to_copy = self.pos - self.begin;
                if read_size > buf.len() - len_to_copy {
                    extend_and_relocate(buf, self.begin, self.pos, read_size, max_size)?;
                } else {
                    trace!("relocating {} buffered bytes to front", len_to_copy);
                    buf.copy_within(self.begin..self.pos, 0);
                }
                self.pos -= self.begin;
                self.begin = 0;
            }
        } else {
            // all data was consumed -- nothing to relocate
            self.begin = 0;
            self.pos = 0;
        }

        let target = &mut buf[self.pos..self.pos + read_size];
        let cnt = loop {
            match source.read(target) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FetchError::Io(e)),
            }
        };
        if cnt == 0 {
            return Ok(true);
        }
        self.len = self.pos + cnt;
        Ok(false)
    }

    /// Release the source. Idempotent.
    pub fn close(&mut self) {
        if !matches!(self.storage, Storage::Closed) {
            debug!("closing CSV source");
        }
        self.storage = Storage::Closed;
        self.begin = 0;
        self.pos = 0;
        self.len = 0;
    }
}

/// Grow `buf` by doubling until the window `[begin, pos)` plus one chunk
/// fits, moving the window to the front of the new array.
fn extend_and_relocate(
    buf: &mut Vec<u8>,
    begin: usize,
    pos: usize,
    read_size: usize,
    max_size: usize,
) -> Result<(), FetchError> {
    let window = pos - begin;
    let mut new_size = buf.len();
    while read_size > new_size - window {
        new_size *= 2;
        if new_size > max_size {
            return Err(FetchError::Overflow(max_size));
        }
    }
    debug!("growing CSV read buffer from {} to {} bytes", buf.len(), new_size);
    let mut new_buf = vec![0; new_size];
    new_buf[..window].copy_from_slice(&buf[begin..pos]);
    *buf = new_buf;
    Ok(())
}
