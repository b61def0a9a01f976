// streamcsv - Streaming CSV tokenizer and writer
//
// Reading side, bottom up:
//   core::buffer   bounded byte window over an in-memory slice or a Read source
//   tokenizer      quote- and comment-aware state machine over the window
//   core::field    field materialization with in-place quote compaction
//   row            row assembly with storage reuse
//   reader         comment / empty-row / field-count policies, public API
//
// Writing side:
//   encode         quoting decision and escape doubling
//   writer         buffered sink, rows and comment lines

pub mod config;
pub mod core;
mod encode;
mod error;
mod reader;
mod row;
mod tokenizer;
mod writer;

pub use config::{CommentStrategy, LineDelimiter, QuoteStrategy, ReaderConfig, WriterConfig};
pub use error::{Error, Result};
pub use reader::CsvReader;
pub use row::Row;
pub use writer::CsvWriter;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
