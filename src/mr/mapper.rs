//! Map phase driver: forum post dump in, `(word, 1, post_id)` rows out.
//!
//! Rows are processed strictly one after another. A body whose markup can't
//! be decoded costs that row; a token that can't be decoded costs only that
//! token. Anything else (short rows, broken streams) ends the run.

use std::io::{Read, Write};

use crate::app::{html, index};
use crate::mr::emitter::PostingEmitter;
use crate::mr::rows::{Row, RowReader};
use crate::mr::{Error, Result};

/// Column layout of the post dump and the output format.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    pub delimiter: u8,
    pub id_field: usize,
    pub body_field: usize,
    pub output_delimiter: u8,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            id_field: 0,
            body_field: 4,
            output_delimiter: b'\t',
        }
    }
}

/// What happened during a run. Diagnostic only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapSummary {
    /// Data rows read, header excluded.
    pub rows: u64,
    pub skipped_rows: u64,
    pub skipped_tokens: u64,
    pub emitted: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Mapper {
    config: MapperConfig,
}

impl Mapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Maps every post in `input` and writes the postings to `output`.
    ///
    /// The first row is a header and is never looked at, even when it is blank.
    pub fn run<R: Read, W: Write>(&self, input: R, output: W) -> Result<MapSummary> {
        let mut reader = RowReader::new(input, self.config.delimiter);
        let mut emitter = PostingEmitter::new(output, self.config.output_delimiter);
        let mut summary = MapSummary::default();

        let mut row = Row::new();
        if reader.read_row(&mut row)? {
            log::debug!("header: {} field(s)", row.len());
        }
        while reader.read_row(&mut row)? {
            summary.rows += 1;
            self.map_row(&row, &mut emitter, &mut summary)?;
        }

        emitter.flush()?;
        summary.emitted = emitter.emitted();
        Ok(summary)
    }

    fn map_row<W: Write>(
        &self,
        record: &Row,
        emitter: &mut PostingEmitter<W>,
        summary: &mut MapSummary,
    ) -> Result<()> {
        let row = record.line();
        let body = field(record, self.config.body_field)?;

        let text = match html::strip_tags(body) {
            Ok(text) => text,
            Err(e) if e.is_decode() => {
                log::error!("row {row}: skipping post body: {e}");
                summary.skipped_rows += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let post_id = field(record, self.config.id_field)?;
        let before = emitter.emitted();
        for word in index::words(&text) {
            match word {
                Ok(word) => emitter.emit(&word, post_id)?,
                Err(e) if e.is_decode() => {
                    log::error!("row {row}: skipping token: {e}");
                    summary.skipped_tokens += 1;
                }
                Err(e) => return Err(e),
            }
        }
        log::trace!(
            "row {row}: {} posting(s) for post {:?}",
            emitter.emitted() - before,
            String::from_utf8_lossy(post_id)
        );
        Ok(())
    }
}

fn field(record: &Row, index: usize) -> Result<&[u8]> {
    record.get(index).ok_or(Error::MissingField {
        row: record.line(),
        index,
        len: record.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[u8]) -> (String, MapSummary) {
        let mut out = Vec::new();
        let summary = Mapper::default().run(input, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn default_layout() {
        let config = MapperConfig::default();
        assert_eq!(config.id_field, 0);
        assert_eq!(config.body_field, 4);
        assert_eq!(config.delimiter, b'\t');
    }

    #[test]
    fn header_only() {
        let (out, summary) = run(b"id\ta\tb\tc\tbody\n");
        assert_eq!(out, "");
        assert_eq!(summary, MapSummary::default());
    }

    #[test]
    fn empty_input() {
        let (out, summary) = run(b"");
        assert_eq!(out, "");
        assert_eq!(summary.rows, 0);
    }

    #[test]
    fn maps_one_post() {
        let (out, summary) = run(b"h\th\th\th\th\n42\tu1\tt1\t2020-01-01\t<p>The Quick Brown Fox!</p>\n");
        assert_eq!(
            out,
            "\"quick\"\t\"1\"\t\"42\"\n\"brown\"\t\"1\"\t\"42\"\n\"fox\"\t\"1\"\t\"42\"\n"
        );
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.emitted, 3);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let (out, _) = run(b"h\n7\ta\tb\tc\tword\textra\tmore\n");
        assert_eq!(out, "\"word\"\t\"1\"\t\"7\"\n");
    }

    #[test]
    fn short_row_is_fatal() {
        let mut out = Vec::new();
        let err = Mapper::default()
            .run(&b"h\th\th\th\th\n1\tonly\tthree\n"[..], &mut out)
            .unwrap_err();
        match err {
            Error::MissingField { row, index, len } => {
                assert_eq!(row, 2);
                assert_eq!(index, 4);
                assert_eq!(len, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_columns() {
        let config = MapperConfig {
            delimiter: b',',
            id_field: 1,
            body_field: 0,
            output_delimiter: b',',
        };
        let mut out = Vec::new();
        Mapper::new(config)
            .run(&b"body,id\nrust,9\n"[..], &mut out)
            .unwrap();
        assert_eq!(out, b"\"rust\",\"1\",\"9\"\n");
    }
}
