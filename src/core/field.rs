// Field materialization: raw span -> final string value
//
// Unquoted spans are copied verbatim. Quoted spans lose their opening quote
// and have quote escapes collapsed by a single in-place shift pass. The
// target String's allocation is recycled so a reused row does not allocate
// per field once it has warmed up.

use std::string::FromUtf8Error;

/// Collapse quote escapes of a quoted field body in place.
///
/// `buf` is the span after the opening quote. Every quote that is not the
/// second half of a doubled pair is dropped; the remaining bytes are shifted
/// left over the gaps. Returns the number of dropped bytes, so the compacted
/// value is `buf[..buf.len() - shift]`.
pub fn compact_quotes(buf: &mut [u8], quote: u8) -> usize {
    let mut shift = 0;
    let mut escape = false;

    for i in 0..buf.len() {
        let c = buf[i];
        if c == quote {
            if !escape {
                shift += 1;
                escape = true;
                continue;
            }
            escape = false;
        }
        if shift > 0 {
            buf[i - shift] = c;
        }
    }

    shift
}

/// Materialize `span` into `out`, replacing its previous contents.
///
/// `quoted` means the span started with the quote character. With `lenient`
/// set, embedded quotes are literal and only the final character (the
/// presumed closing quote) is stripped.
pub fn materialize_into(
    out: &mut String,
    span: &[u8],
    quoted: bool,
    quote: u8,
    lenient: bool,
) -> Result<(), FromUtf8Error> {
    let mut bytes = std::mem::take(out).into_bytes();
    bytes.clear();

    if !quoted {
        bytes.extend_from_slice(span);
    } else {
        let body = &span[1.min(span.len())..];
        bytes.extend_from_slice(body);
        if lenient {
            let end = last_char_start(&bytes);
            bytes.truncate(end);
        } else {
            let shift = compact_quotes(&mut bytes, quote);
            let len = bytes.len() - shift;
            bytes.truncate(len);
        }
    }

    *out = String::from_utf8(bytes)?;
    Ok(())
}

/// Materialize `span` into a freshly allocated String.
pub fn materialize(
    span: &[u8],
    quoted: bool,
    quote: u8,
    lenient: bool,
) -> Result<String, FromUtf8Error> {
    let mut out = String::new();
    materialize_into(&mut out, span, quoted, quote, lenient)?;
    Ok(out)
}

/// Byte offset where the last UTF-8 character of `bytes` begins.
fn last_char_start(bytes: &[u8]) -> usize {
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        // continuation bytes are 0b10xx_xxxx
        if bytes[i] & 0xC0 != 0x80 {
            return i;
        }
    }
    0
}
