//! Line-oriented CSV utilities for the sample manifest and score logs.
//!
//! Streaming read/write without loading entire files into memory. The
//! format is RFC 4180: fields containing commas, quotes or newlines are
//! quoted, and inner quotes are doubled. Quoted fields may span physical
//! lines; the reader stitches them back together.

use anyhow::{anyhow, Result};
use std::borrow::Cow;
use std::io::{BufRead, Write};

/// Quote a single field if it needs quoting, otherwise pass it through.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        let mut out = String::with_capacity(field.len() + 2);
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
        Cow::Owned(out)
    } else {
        Cow::Borrowed(field)
    }
}

/// Write one record terminated by `\n`.
pub fn write_record<W: Write, S: AsRef<str>>(w: &mut W, fields: &[S]) -> std::io::Result<()> {
    let mut first = true;
    for f in fields {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        w.write_all(escape_field(f.as_ref()).as_bytes())?;
    }
    w.write_all(b"\n")
}

/// Outcome of parsing one logical record.
enum Parsed {
    Fields(Vec<String>),
    /// The input ended inside a quoted field; the caller should append
    /// the next physical line and retry.
    NeedsMore,
}

/// Parse a logical record. Quotes are only special at field start; a
/// quote in the middle of an unquoted field is taken literally.
fn parse_record(raw: &str) -> Parsed {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = raw.chars().peekable();

    loop {
        field.clear();
        // Quoted field
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
            if !closed {
                return Parsed::NeedsMore;
            }
            fields.push(std::mem::take(&mut field));
            match chars.next() {
                Some(',') => continue,
                None => return Parsed::Fields(fields),
                // Garbage after a closing quote; keep it, lenient.
                Some(c) => {
                    let tail: String = chars.by_ref().collect();
                    let last = fields.last_mut().unwrap();
                    last.push(c);
                    last.push_str(&tail);
                    return Parsed::Fields(fields);
                }
            }
        }
        // Unquoted field
        loop {
            match chars.next() {
                Some(',') => break,
                Some(c) => field.push(c),
                None => {
                    fields.push(field);
                    return Parsed::Fields(fields);
                }
            }
        }
        fields.push(std::mem::take(&mut field));
    }
}

/// Iterator over CSV records.
///
/// Parses records lazily, yielding one `Result<Vec<String>>` per logical
/// record. Empty lines are skipped.
pub struct CsvRecords<R: BufRead> {
    reader: R,
    line_buffer: String,
    record_buffer: String,
    line_number: usize,
}

impl<R: BufRead> CsvRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::new(),
            record_buffer: String::new(),
            line_number: 0,
        }
    }

    /// Current physical line number (1-indexed, for error messages).
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for CsvRecords<R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.record_buffer.clear();
        loop {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => {
                    if self.record_buffer.is_empty() {
                        return None;
                    }
                    // EOF inside a quoted field
                    return Some(Err(anyhow!(
                        "unterminated quoted field at end of input (record starting before line {})",
                        self.line_number + 1
                    )));
                }
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.line_buffer.trim_end_matches(['\n', '\r']);
                    if self.record_buffer.is_empty() {
                        if line.trim().is_empty() {
                            continue;
                        }
                        self.record_buffer.push_str(line);
                    } else {
                        // Continuation of a quoted field: the newline is data.
                        self.record_buffer.push('\n');
                        self.record_buffer.push_str(line);
                    }
                    match parse_record(&self.record_buffer) {
                        Parsed::Fields(fields) => return Some(Ok(fields)),
                        Parsed::NeedsMore => continue,
                    }
                }
                Err(e) => {
                    return Some(Err(anyhow!(
                        "I/O error at line {}: {}",
                        self.line_number + 1,
                        e
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn parse_all(input: &str) -> Vec<Vec<String>> {
        CsvRecords::new(BufReader::new(input.as_bytes()))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn plain_records() {
        let rows = parse_all("a,b,c\nd,e,f\n");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
    }

    #[test]
    fn skips_blank_lines() {
        let rows = parse_all("a,b\n\n\nc,d\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn quoted_fields_with_commas_and_quotes() {
        let rows = parse_all("\"hello, world\",\"say \"\"hi\"\"\"\n");
        assert_eq!(rows, vec![vec!["hello, world", "say \"hi\""]]);
    }

    #[test]
    fn quoted_field_spanning_lines() {
        let rows = parse_all("\"line one\nline two\",x\n");
        assert_eq!(rows, vec![vec!["line one\nline two", "x"]]);
    }

    #[test]
    fn empty_fields_survive() {
        let rows = parse_all("a,,c\n");
        assert_eq!(rows, vec![vec!["a", "", "c"]]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let result: Result<Vec<_>> =
            CsvRecords::new(BufReader::new("\"never closed\n".as_bytes())).collect();
        assert!(result.is_err());
    }

    #[test]
    fn escape_round_trip() {
        let fields = ["plain", "with,comma", "with \"quote\"", "multi\nline", ""];
        let mut buf = Vec::new();
        write_record(&mut buf, &fields).unwrap();
        let rows = parse_all(std::str::from_utf8(&buf).unwrap());
        assert_eq!(rows, vec![fields.iter().map(|s| s.to_string()).collect::<Vec<_>>()]);
    }
}
