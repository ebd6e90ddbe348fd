//! Row reader for the post dump.
//!
//! Quoting and field splitting are left to `csv_core`. Unlike `csv::Reader`,
//! a blank line is not skipped: it comes back as a row with no fields, so
//! the header slot and the short-row check see it like any other row.

use std::io::{BufRead, BufReader, Read};

use csv_core::{ReadRecordResult, Reader as CoreReader, ReaderBuilder};

use crate::mr::Result;

/// One input row, fields kept as raw bytes.
#[derive(Debug, Clone)]
pub struct Row {
    fields: Vec<u8>,
    ends: Vec<usize>,
    len: usize,
    line: u64,
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

impl Row {
    pub fn new() -> Self {
        Self {
            fields: vec![0; 4096],
            ends: vec![0; 16],
            len: 0,
            line: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Line the row starts on, counting from 1.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        let start = if index == 0 { 0 } else { self.ends[index - 1] };
        Some(&self.fields[start..self.ends[index]])
    }
}

pub struct RowReader<R> {
    input: BufReader<R>,
    core: CoreReader,
    /// `\n` bytes consumed here rather than by `core`.
    lines: u64,
    /// The last row ended on `\r`; a `\n` right after it is part of the same terminator.
    after_cr: bool,
}

impl<R: Read> RowReader<R> {
    pub fn new(input: R, delimiter: u8) -> Self {
        Self {
            input: BufReader::new(input),
            core: ReaderBuilder::new().delimiter(delimiter).build(),
            lines: 0,
            after_cr: false,
        }
    }

    /// Number of line breaks consumed so far.
    fn line(&self) -> u64 {
        self.core.line() + self.lines
    }

    /// Reads the next row into `row`. Returns `false` at end of input.
    pub fn read_row(&mut self, row: &mut Row) -> Result<bool> {
        row.len = 0;
        loop {
            let first = self.input.fill_buf()?.first().copied();
            let after_cr = std::mem::take(&mut self.after_cr);
            match first {
                None => return Ok(false),
                Some(b'\n') if after_cr => {
                    self.input.consume(1);
                    self.lines += 1;
                }
                Some(b @ (b'\n' | b'\r')) => {
                    row.line = self.line() + 1;
                    self.input.consume(1);
                    if b == b'\n' {
                        self.lines += 1;
                    } else {
                        self.after_cr = true;
                    }
                    return Ok(true);
                }
                Some(_) => break,
            }
        }

        row.line = self.line() + 1;
        let (mut outlen, mut endlen) = (0, 0);
        loop {
            let (res, nin, nout, nend, last) = {
                let input = self.input.fill_buf()?;
                let (res, nin, nout, nend) = self.core.read_record(
                    input,
                    &mut row.fields[outlen..],
                    &mut row.ends[endlen..],
                );
                (res, nin, nout, nend, input[..nin].last().copied())
            };
            self.input.consume(nin);
            outlen += nout;
            endlen += nend;
            match res {
                ReadRecordResult::InputEmpty => {}
                ReadRecordResult::OutputFull => {
                    let len = row.fields.len();
                    row.fields.resize(len * 2, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = row.ends.len();
                    row.ends.resize(len * 2, 0);
                }
                ReadRecordResult::Record => {
                    row.len = endlen;
                    self.after_cr = last == Some(b'\r');
                    return Ok(true);
                }
                ReadRecordResult::End => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &[u8]) -> Vec<(u64, Vec<String>)> {
        let mut reader = RowReader::new(input, b'\t');
        let mut row = Row::new();
        let mut rows = Vec::new();
        while reader.read_row(&mut row).unwrap() {
            let fields = (0..row.len())
                .map(|i| String::from_utf8(row.get(i).unwrap().to_vec()).unwrap())
                .collect();
            rows.push((row.line(), fields));
        }
        rows
    }

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn splits_fields() {
        assert_eq!(
            read_all(b"a\tb\tc\n1\t\t3\n"),
            [(1, fields(&["a", "b", "c"])), (2, fields(&["1", "", "3"]))]
        );
    }

    #[test]
    fn last_row_may_be_unterminated() {
        assert_eq!(read_all(b"a\nb"), [(1, fields(&["a"])), (2, fields(&["b"]))]);
        assert!(read_all(b"").is_empty());
    }

    #[test]
    fn blank_lines_are_empty_rows() {
        assert_eq!(
            read_all(b"\na\n\n\nb\n"),
            [
                (1, fields(&[])),
                (2, fields(&["a"])),
                (3, fields(&[])),
                (4, fields(&[])),
                (5, fields(&["b"])),
            ]
        );
    }

    #[test]
    fn crlf_terminators() {
        assert_eq!(
            read_all(b"a\tb\r\n\r\nc\r\n"),
            [(1, fields(&["a", "b"])), (2, fields(&[])), (3, fields(&["c"]))]
        );
    }

    #[test]
    fn quoted_field_spans_lines() {
        assert_eq!(
            read_all(b"1\t\"x\ny\"\n2\tz\n"),
            [(1, fields(&["1", "x\ny"])), (3, fields(&["2", "z"]))]
        );
    }

    #[test]
    fn grows_past_initial_buffers() {
        let long = "w".repeat(10_000);
        let wide = vec!["f"; 40].join("\t");
        let input = format!("{long}\n{wide}\n");
        let rows = read_all(input.as_bytes());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, [long]);
        assert_eq!(rows[1].1.len(), 40);
    }

    #[test]
    fn get_past_end() {
        let mut reader = RowReader::new(&b"a\tb\n"[..], b'\t');
        let mut row = Row::new();
        assert!(reader.read_row(&mut row).unwrap());
        assert_eq!(row.get(1), Some(&b"b"[..]));
        assert_eq!(row.get(2), None);
        assert!(!reader.read_row(&mut row).unwrap());
    }
}
