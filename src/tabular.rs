//! Resilient parser for comma-separated inventory tables.
//!
//! Inventory sheets are maintained by hand in spreadsheet software and
//! exported as CSV. Descriptions routinely contain commas, quotes, and line
//! breaks, so the parser has to cope with quoted fields spanning several
//! physical lines, and it must never give up on a malformed row.
//!
//! ## Stages
//!
//! ```text
//! raw text ─► logical records ─► fields ─► Record (header → value)
//! ```
//!
//! 1. **Logical records**: physical lines are joined while the running count
//!    of quote characters is odd. An escaped quote (`""`) contributes two
//!    quotes, so it never changes parity.
//! 2. **Fields**: a quote toggles in-quotes mode, `""` inside quotes yields a
//!    literal quote, commas and newlines inside quotes are content.
//! 3. **Records**: values are zipped against the header by position. Missing
//!    trailing values become empty strings, extra values are ignored, and
//!    rows whose values are all blank are dropped.
//!
//! ## Recovery
//!
//! A quoted field that is still open at end of input is closed implicitly at
//! EOF: the remainder of the text becomes part of that record. The parser
//! records a [`Diagnostic::UnterminatedQuote`] so callers can surface it, but
//! the rows are still returned.

use std::sync::Arc;

const QUOTE: char = '"';
const DELIMITER: char = ',';

/// One table row mapped from header name to value.
///
/// Columns are shared between all records of a table. Unquoted whitespace
/// around values is dropped; quoted content is kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<String>,
    line: usize,
}

impl Record {
    /// Build a record from explicit column/value pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let (columns, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(c, v)| (c.to_string(), v.to_string()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
            line: 0,
        }
    }

    /// 1-based physical line where the record starts in its table text, or 0
    /// for records not parsed from text.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Value of `column`, or `None` when the table has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].as_str())
    }

    /// Value of `column`, defaulting to the empty string for absent columns.
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    /// Non-empty value of `column`, if any.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|v| !v.is_empty())
    }

    /// Column/value pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.is_empty())
    }
}

/// Expected header set for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Columns without which rows cannot be interpreted.
    pub required: Vec<String>,
    /// Columns that are understood when present.
    pub optional: Vec<String>,
}

impl Schema {
    pub fn new<S: AsRef<str>>(required: &[S], optional: &[S]) -> Self {
        Self {
            required: required.iter().map(|s| s.as_ref().to_string()).collect(),
            optional: optional.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    fn knows(&self, column: &str) -> bool {
        self.required.iter().chain(&self.optional).any(|c| c == column)
    }
}

/// Result of checking a table header against a [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCheck {
    /// Required columns absent from the header.
    pub missing_required: Vec<String>,
    /// Header columns the schema does not mention.
    pub unknown_columns: Vec<String>,
}

impl SchemaCheck {
    pub fn is_clean(&self) -> bool {
        self.missing_required.is_empty() && self.unknown_columns.is_empty()
    }
}

/// Non-fatal problems found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A quoted field was still open at end of input. `line` is the 1-based
    /// physical line where the affected record started.
    UnterminatedQuote { line: usize },
    /// A row carried more values than the header has columns.
    ExtraValues {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// A fully parsed table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
    pub schema: SchemaCheck,
}

/// A record as it appears in the text, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogicalRecord {
    /// 1-based physical line of the first line in the record.
    line: usize,
    text: String,
    terminated: bool,
}

/// Parse raw table text into ordered records.
///
/// Never fails; see the [module docs](self) for recovery rules.
pub fn parse_records(text: &str) -> Vec<Record> {
    parse_with(text, None).records
}

/// Parse raw table text and check its header against `schema`.
pub fn parse_table(text: &str, schema: &Schema) -> ParsedTable {
    parse_with(text, Some(schema))
}

fn parse_with(text: &str, schema: Option<&Schema>) -> ParsedTable {
    let mut logical = logical_records(text).into_iter();
    let mut diagnostics = Vec::new();

    // First non-blank logical record is the header
    let Some(header) = logical.by_ref().find(|r| !r.text.trim().is_empty()) else {
        return ParsedTable::default();
    };
    if !header.terminated {
        diagnostics.push(Diagnostic::UnterminatedQuote { line: header.line });
    }
    let headers = split_fields(&header.text);
    let columns: Arc<[String]> = headers.clone().into();

    let mut records = Vec::new();
    for row in logical {
        if !row.terminated {
            diagnostics.push(Diagnostic::UnterminatedQuote { line: row.line });
        }
        let mut values = split_fields(&row.text);
        if values.len() > columns.len() {
            diagnostics.push(Diagnostic::ExtraValues {
                line: row.line,
                expected: columns.len(),
                found: values.len(),
            });
        }
        values.resize(columns.len(), String::new());
        let record = Record {
            columns: Arc::clone(&columns),
            values,
            line: row.line,
        };
        if !record.is_blank() {
            records.push(record);
        }
    }

    for diagnostic in &diagnostics {
        tracing::warn!(?diagnostic, "table parse recovered from malformed input");
    }

    let schema = schema
        .map(|s| check_header(&headers, s))
        .unwrap_or_default();

    ParsedTable {
        headers,
        records,
        diagnostics,
        schema,
    }
}

/// Compare a parsed header against a schema.
pub fn check_header(headers: &[String], schema: &Schema) -> SchemaCheck {
    SchemaCheck {
        missing_required: schema
            .required
            .iter()
            .filter(|c| !headers.contains(c))
            .cloned()
            .collect(),
        unknown_columns: headers
            .iter()
            .filter(|h| !h.is_empty() && !schema.knows(h))
            .cloned()
            .collect(),
    }
}

/// Join physical lines into logical records using quote parity.
fn logical_records(text: &str) -> Vec<LogicalRecord> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut buf = String::new();
    let mut start_line = 0;
    let mut quotes = 0usize;
    let mut open = false;

    for (idx, raw) in text.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if open {
            buf.push('\n');
        } else {
            start_line = idx + 1;
        }
        buf.push_str(line);
        quotes += line.chars().filter(|&c| c == QUOTE).count();

        if quotes % 2 == 0 {
            records.push(LogicalRecord {
                line: start_line,
                text: std::mem::take(&mut buf),
                terminated: true,
            });
            quotes = 0;
            open = false;
        } else {
            open = true;
        }
    }

    // Unterminated quote: the record runs to EOF
    if open {
        records.push(LogicalRecord {
            line: start_line,
            text: buf,
            terminated: false,
        });
    }

    records
}

/// Tokenize one logical record into field values.
///
/// Whitespace outside quotes at either end of a field is dropped. Quoted
/// content is kept verbatim, except that a quote left open at end of input
/// loses its trailing whitespace.
pub fn split_fields(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    // Length of `current` through its last quoted or non-blank character
    let mut keep = 0;
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            QUOTE if in_quotes && chars.peek() == Some(&QUOTE) => {
                current.push(QUOTE);
                chars.next();
                keep = current.len();
            }
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => {
                current.truncate(keep);
                fields.push(std::mem::take(&mut current));
                keep = 0;
            }
            c if !in_quotes && c.is_whitespace() => {
                if !current.is_empty() {
                    current.push(c);
                }
            }
            _ => {
                current.push(c);
                keep = current.len();
            }
        }
    }
    if in_quotes {
        keep = current.trim_end().len();
    }
    current.truncate(keep);
    fields.push(current);

    fields
}
