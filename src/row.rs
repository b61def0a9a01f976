// Rows and the builder that accumulates them
//
// The builder materializes fields into a recycled Vec<String>. When a row is
// finished, the working fields are swapped into `current`; whatever `current`
// held before becomes the next row's scratch space. A consumer that only
// borrows `current` therefore gets allocation reuse for free, while one that
// takes it gets a fresh row every time.

use crate::core::field::materialize_into;
use crate::error::{Error, Result};
use std::ops::Index;

/// One logical CSV record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    original_line_number: u64,
    fields: Vec<String>,
    comment: bool,
    empty: bool,
}

impl Row {
    /// Build a row by hand, e.g. for comparisons in tests.
    pub fn new(original_line_number: u64, fields: Vec<String>, comment: bool) -> Self {
        let empty = !comment && fields.len() == 1 && fields[0].is_empty();
        Row {
            original_line_number,
            fields,
            comment,
            empty,
        }
    }

    /// Line (1-based) where this row starts. Multi-line rows report their
    /// first line.
    pub fn original_line_number(&self) -> u64 {
        self.original_line_number
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// True for rows that started with the comment character.
    pub fn is_comment(&self) -> bool {
        self.comment
    }

    /// True for a non-comment row consisting of exactly one empty field.
    ///
    /// A blank line and a line holding a single empty value (e.g. `""`)
    /// are indistinguishable here.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

impl Index<usize> for Row {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.fields[index]
    }
}

/// Accumulates the fields of the row in progress.
pub struct RowBuilder {
    fields: Vec<String>,
    idx: usize,
    current: Row,
    lines: u64,
    original_line_number: u64,
    comment_mode: bool,
    rows_completed: u64,
    quote: u8,
    lenient: bool,
    ignore_columns: Vec<usize>,
}

impl RowBuilder {
    pub fn new(quote: u8, lenient: bool, ignore_columns: Vec<usize>) -> Self {
        RowBuilder {
            fields: Vec::with_capacity(32),
            idx: 0,
            current: Row::default(),
            lines: 1,
            original_line_number: 1,
            comment_mode: false,
            rows_completed: 0,
            quote,
            lenient,
            ignore_columns,
        }
    }

    /// Materialize `span` as the next field.
    pub fn add(&mut self, span: &[u8], quoted: bool) -> Result<()> {
        if !self.comment_mode && self.ignore_columns.contains(&self.idx) {
            self.add_empty_field();
            return Ok(());
        }
        let (quote, lenient, line) = (self.quote, self.lenient, self.original_line_number);
        let target = self.next_slot();
        materialize_into(target, span, quoted, quote, lenient)
            .map_err(|source| Error::Utf8 { line, source })
    }

    pub fn add_empty_field(&mut self) {
        self.next_slot().clear();
    }

    fn next_slot(&mut self) -> &mut String {
        if self.idx == self.fields.len() {
            self.fields.push(String::new());
        }
        let slot = &mut self.fields[self.idx];
        self.idx += 1;
        slot
    }

    pub fn enable_comment_mode(&mut self) {
        self.comment_mode = true;
    }

    pub fn is_comment_mode(&self) -> bool {
        self.comment_mode
    }

    pub fn inc_lines(&mut self) {
        self.lines += 1;
    }

    /// Starting line of the row in progress.
    pub fn line(&self) -> u64 {
        self.original_line_number
    }

    pub fn rows_completed(&self) -> u64 {
        self.rows_completed
    }

    /// Close the row in progress. Returns false if it had no fields.
    pub fn finish_row(&mut self) -> bool {
        let produced = self.idx > 0;
        if produced {
            std::mem::swap(&mut self.current.fields, &mut self.fields);
            self.current.fields.truncate(self.idx);
            self.current.original_line_number = self.original_line_number;
            self.current.comment = self.comment_mode;
            self.current.empty = !self.comment_mode
                && self.idx == 1
                && self.current.fields[0].is_empty();
            self.rows_completed += 1;
        }
        self.idx = 0;
        self.original_line_number += self.lines;
        self.lines = 1;
        self.comment_mode = false;
        produced
    }

    /// The most recently finished row.
    pub fn current(&self) -> &Row {
        &self.current
    }

    /// Move the most recently finished row out, leaving an empty one behind.
    pub fn take_current(&mut self) -> Row {
        std::mem::take(&mut self.current)
    }
}
