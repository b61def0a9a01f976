// Cross-path conformance tests
//
// Each scenario runs through every way the reader can ingest data: the
// in-memory fast path, a streamed source with the default chunk size, and a
// source that hands out one byte per read. A new scenario automatically
// tests all three. Failures pinpoint which path diverges.

use std::io::{self, Cursor, Read};

use streamcsv::{CommentStrategy, CsvReader, Error, ReaderConfig, Row};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Hands out a single byte per read, so every token straddles a refill.
struct OneByte<'a>(&'a [u8]);

impl Read for OneByte<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.0.is_empty() || out.is_empty() {
            return Ok(0);
        }
        out[0] = self.0[0];
        self.0 = &self.0[1..];
        Ok(1)
    }
}

fn collect(reader: CsvReader<'_>) -> Vec<Row> {
    reader.collect::<Result<_, _>>().unwrap()
}

/// Parse `input` through all three paths, assert they agree, and return the
/// rows.
fn parse_all_paths(input: &[u8], config: &ReaderConfig) -> Vec<Row> {
    let in_memory = collect(CsvReader::from_slice(input, config.clone()).unwrap());

    let streamed = collect(CsvReader::from_reader(Cursor::new(input.to_vec()), config.clone()).unwrap());
    assert_eq!(streamed, in_memory, "FAILED: streamed");

    let one_byte = collect(CsvReader::from_reader(OneByte(input), config.clone()).unwrap());
    assert_eq!(one_byte, in_memory, "FAILED: one_byte");

    in_memory
}

fn fields(rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter().map(|r| r.fields().to_vec()).collect()
}

// ---------------------------------------------------------------------------
// Conformance macro
// ---------------------------------------------------------------------------

/// Runs a scenario through all ingestion paths and asserts they produce
/// `expected`. With `lines`, also checks each row's starting line.
macro_rules! conformance {
    ($name:ident, input: $input:expr, expected: $expected:expr) => {
        conformance!($name, input: $input, config: ReaderConfig::default(), expected: $expected);
    };
    ($name:ident, input: $input:expr, config: $config:expr, expected: $expected:expr) => {
        #[test]
        fn $name() {
            let input: &[u8] = $input;
            let config: ReaderConfig = $config;
            let expected: Vec<Vec<&str>> = $expected;
            let expected_strings: Vec<Vec<String>> = expected
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect();

            let rows = parse_all_paths(input, &config);
            assert_eq!(fields(&rows), expected_strings);
        }
    };
    ($name:ident, input: $input:expr, expected: $expected:expr, lines: $lines:expr) => {
        #[test]
        fn $name() {
            let input: &[u8] = $input;
            let expected: Vec<Vec<&str>> = $expected;
            let lines: Vec<u64> = $lines;
            let expected_strings: Vec<Vec<String>> = expected
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect();

            let rows = parse_all_paths(input, &ReaderConfig::default());
            assert_eq!(fields(&rows), expected_strings);
            let got_lines: Vec<u64> = rows.iter().map(Row::original_line_number).collect();
            assert_eq!(got_lines, lines, "FAILED: line numbers");
        }
    };
}

// ---------------------------------------------------------------------------
// Scenario: basic shapes
// ---------------------------------------------------------------------------

conformance!(
    simple_two_rows,
    input: b"a,b,c\n1,2,3\n",
    expected: vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]
);

conformance!(
    two_plain_fields,
    input: b"D,D",
    expected: vec![vec!["D", "D"]]
);

conformance!(
    empty_input,
    input: b"",
    expected: vec![]
);

conformance!(
    lone_separator,
    input: b",",
    expected: vec![vec!["", ""]]
);

conformance!(
    trailing_separator,
    input: b"a,\nb,",
    expected: vec![vec!["a", ""], vec!["b", ""]]
);

conformance!(
    no_trailing_newline,
    input: b"a,b\nc,d",
    expected: vec![vec!["a", "b"], vec!["c", "d"]]
);

conformance!(
    utf8_fields,
    input: "ä,\"ö,ü\"\n€\n".as_bytes(),
    expected: vec![vec!["ä", "ö,ü"], vec!["€"]]
);

// ---------------------------------------------------------------------------
// Scenario: quoting
// ---------------------------------------------------------------------------

conformance!(
    quoted_field_with_comma,
    input: b"a,\"b,c\",d\n",
    expected: vec![vec!["a", "b,c", "d"]]
);

conformance!(
    only_escaped_quote,
    input: b"\"A\"\"B\"",
    expected: vec![vec!["A\"B"]]
);

conformance!(
    escaped_doubled_quotes,
    input: b"a,\"say \"\"hi\"\"\",c\n",
    expected: vec![vec!["a", "say \"hi\"", "c"]]
);

conformance!(
    empty_quoted_fields,
    input: b"\"\",\"\"\n",
    expected: vec![vec!["", ""]]
);

conformance!(
    quote_inside_unquoted_field,
    input: b"a\"b,c",
    expected: vec![vec!["a\"b", "c"]]
);

conformance!(
    data_after_closing_quote,
    input: b"\"ab\"cd,e",
    expected: vec![vec!["abcd", "e"]]
);

// ---------------------------------------------------------------------------
// Scenario: line breaks and line numbers
// ---------------------------------------------------------------------------

conformance!(
    crlf_line_endings,
    input: b"a,b\r\nc,d\r\n",
    expected: vec![vec!["a", "b"], vec!["c", "d"]],
    lines: vec![1, 2]
);

conformance!(
    mixed_line_endings,
    input: b"a\rb\nc\r\nd",
    expected: vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]],
    lines: vec![1, 2, 3, 4]
);

conformance!(
    skipped_empty_lines_still_counted,
    input: b"a\n\n\r\n\rb",
    expected: vec![vec!["a"], vec!["b"]],
    lines: vec![1, 5]
);

conformance!(
    multiline_quoted_field,
    input: b"a,\"line1\nline2\",c\nd\n",
    expected: vec![vec!["a", "line1\nline2", "c"], vec!["d"]],
    lines: vec![1, 3]
);

conformance!(
    quoted_crlf_counts_once,
    input: b"\"x\r\ny\r\nz\"\nw",
    expected: vec![vec!["x\r\ny\r\nz"], vec!["w"]],
    lines: vec![1, 4]
);

conformance!(
    quoted_cr_before_row_break,
    input: b"\"x\r\"\ny",
    expected: vec![vec!["x\r"], vec!["y"]],
    lines: vec![1, 3]
);

// ---------------------------------------------------------------------------
// Scenario: row policies
// ---------------------------------------------------------------------------

conformance!(
    empty_rows_kept,
    input: b"a\n\nb\n\"\"\n",
    config: ReaderConfig {
        skip_empty_rows: false,
        ..Default::default()
    },
    expected: vec![vec!["a"], vec![""], vec!["b"], vec![""]]
);

conformance!(
    comments_read,
    input: b"#c1\na,b\n#c2,\"x\"\r\n#",
    config: ReaderConfig {
        comment_strategy: CommentStrategy::Read,
        ..Default::default()
    },
    expected: vec![vec!["c1"], vec!["a", "b"], vec!["c2,\"x\""], vec![""]]
);

conformance!(
    comments_skipped,
    input: b"A\n;B,C\nD",
    config: ReaderConfig {
        comment_strategy: CommentStrategy::Skip,
        comment_character: b';',
        ..Default::default()
    },
    expected: vec![vec!["A"], vec!["D"]]
);

conformance!(
    comment_char_only_at_row_start,
    input: b"a#b,#c\n",
    config: ReaderConfig {
        comment_strategy: CommentStrategy::Skip,
        ..Default::default()
    },
    expected: vec![vec!["a#b", "#c"]]
);

conformance!(
    custom_control_characters,
    input: b"'a;b';c\n'it''s';d\n",
    config: ReaderConfig {
        field_separator: b';',
        quote_character: b'\'',
        ..Default::default()
    },
    expected: vec![vec!["a;b", "c"], vec!["it's", "d"]]
);

conformance!(
    ignored_columns,
    input: b"a,b,c\n1,\"2\",3\n",
    config: ReaderConfig {
        ignore_columns: vec![1],
        ..Default::default()
    },
    expected: vec![vec!["a", "", "c"], vec!["1", "", "3"]]
);

// ---------------------------------------------------------------------------
// Scenario: lenient quotes
// ---------------------------------------------------------------------------

fn lenient() -> ReaderConfig {
    ReaderConfig {
        ignore_invalid_quote_chars: true,
        ..Default::default()
    }
}

conformance!(
    lenient_embedded_quote,
    input: b"\"ab\" cd\",x\n",
    config: lenient(),
    expected: vec![vec!["ab\" cd", "x"]]
);

conformance!(
    lenient_quote_then_more_rows,
    input: b"\"Contains \" in cell\",x\n\"ok\"",
    config: lenient(),
    expected: vec![vec!["Contains \" in cell", "x"], vec!["ok"]]
);

conformance!(
    lenient_doubled_quote_kept_literal,
    input: b"\"a\"\r\n\"b\"\"c\",\"d\"",
    config: lenient(),
    expected: vec![vec!["a"], vec!["b\"\"c", "d"]]
);

conformance!(
    lenient_quote_before_line_break,
    input: b"\"x \"y\"\r\"z\"\n",
    config: lenient(),
    expected: vec![vec!["x \"y"], vec!["z"]]
);

// ---------------------------------------------------------------------------
// Scenario: chunk boundaries and buffer limits
// ---------------------------------------------------------------------------

#[test]
fn quoted_field_straddling_chunk_boundary() {
    // starts before the first 8192-byte chunk ends and finishes after it
    let value = format!("{}\"{}", "x".repeat(8000), "y\n".repeat(300));
    let input = format!("head\n\"{}\",tail\nlast\n", value.replace('"', "\"\""));
    let rows = parse_all_paths(input.as_bytes(), &ReaderConfig::default());

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].fields(), &[value, "tail".to_string()]);
    assert_eq!(rows[1].original_line_number(), 2);
    assert_eq!(rows[2].original_line_number(), 303);

    // same value within a single chunk
    let short = "\"a\"\"b\",tail\n";
    let rows = parse_all_paths(short.as_bytes(), &ReaderConfig::default());
    assert_eq!(rows[0].fields(), &["a\"b".to_string(), "tail".to_string()]);
}

#[test]
fn field_count_mismatch() {
    let config = ReaderConfig {
        error_on_different_field_count: true,
        ..Default::default()
    };
    let mut reader = CsvReader::from_str("foo\nbar,\"baz\nbax\"", config).unwrap();
    assert_eq!(reader.next().unwrap().unwrap().fields(), &["foo".to_string()]);
    let err = reader.next().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "Row 2 has 2 fields, but first row had 1 fields");
}

fn unterminated(prefix: &str) -> Vec<u8> {
    let mut input = prefix.as_bytes().to_vec();
    input.push(b'"');
    input.resize(input.len() + streamcsv::core::MAX_BUFFER_SIZE + 1024, b'x');
    input
}

#[test]
fn overflow_on_first_record() {
    let input = unterminated("");
    let mut reader = CsvReader::from_reader(Cursor::new(input), ReaderConfig::default()).unwrap();
    let err = reader.next().unwrap().unwrap_err();
    assert!(matches!(err, Error::BufferOverflow { max, .. } if max == 8 * 1024 * 1024));
    assert_eq!(
        err.to_string(),
        "maximum buffer size 8388608 is not enough to read data of a single field when reading \
         first record. Typically, this happens if quotation started but did not end within this \
         buffer's maximum boundary"
    );
    assert!(reader.next().is_none());
}

#[test]
fn overflow_on_later_record() {
    let input = unterminated("a\nb,c\n");
    let mut reader = CsvReader::from_reader(Cursor::new(input), ReaderConfig::default()).unwrap();
    assert_eq!(reader.next().unwrap().unwrap().fields(), &["a".to_string()]);
    assert_eq!(reader.next().unwrap().unwrap().field_count(), 2);
    let err = reader.next().unwrap().unwrap_err();
    assert_eq!(
        err.to_string(),
        "maximum buffer size 8388608 is not enough to read data of a single field when reading \
         record starting at line 3. Typically, this happens if quotation started but did not end \
         within this buffer's maximum boundary"
    );
}

#[test]
fn in_memory_input_is_not_bounded() {
    // the fast path scans the caller's slice and never grows a buffer
    let input = unterminated("");
    let rows = collect(CsvReader::from_slice(&input, ReaderConfig::default()).unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0].len(), input.len() - 1);
}
