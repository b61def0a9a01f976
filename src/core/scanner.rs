// Byte-level fast-forward helpers for the tokenizer.
//
// Each helper returns the index of the next control byte at or after `from`,
// or `input.len()` when the rest of the slice is plain data.

use crate::config::{CR, LF};
use memchr::{memchr, memchr2, memchr3};

/// Skip unquoted data: stop at separator, CR or LF.
#[inline]
pub fn find_data_end(input: &[u8], from: usize, separator: u8) -> usize {
    match memchr3(separator, LF, CR, &input[from..]) {
        Some(i) => from + i,
        None => input.len(),
    }
}

/// Skip quoted data: stop at quote, CR or LF.
#[inline]
pub fn find_quoted_end(input: &[u8], from: usize, quote: u8) -> usize {
    match memchr3(quote, LF, CR, &input[from..]) {
        Some(i) => from + i,
        None => input.len(),
    }
}

/// Skip comment text: stop at CR or LF.
#[inline]
pub fn find_line_end(input: &[u8], from: usize) -> usize {
    match memchr2(LF, CR, &input[from..]) {
        Some(i) => from + i,
        None => input.len(),
    }
}

/// Position of the next quote character, if any.
#[inline]
pub fn find_quote(input: &[u8], from: usize, quote: u8) -> Option<usize> {
    memchr(quote, &input[from..]).map(|i| from + i)
}
