// Core primitives for CSV tokenizing

pub mod buffer;
pub mod field;
pub mod scanner;

pub use buffer::{Buffer, FetchError, MAX_BUFFER_SIZE, READ_SIZE};
pub use field::{compact_quotes, materialize, materialize_into};
pub use scanner::*;
