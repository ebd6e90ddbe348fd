use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::mr::Result;

/// Every posting counts a single occurrence; summing is left to the reducer.
pub const COUNT: u32 = 1;

/// Writes postings as tab-separated rows with every field quoted:
/// `"word"	"1"	"post_id"`.
pub struct PostingEmitter<W: Write> {
    writer: csv::Writer<W>,
    count: Vec<u8>,
    emitted: u64,
}

impl<W: Write> PostingEmitter<W> {
    pub fn new(out: W, delimiter: u8) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .quote(b'"')
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(out);
        Self {
            writer,
            count: COUNT.to_string().into_bytes(),
            emitted: 0,
        }
    }

    pub fn emit(&mut self, word: &str, post_id: &[u8]) -> Result<()> {
        self.writer
            .write_record([word.as_bytes(), self.count.as_slice(), post_id])?;
        self.emitted += 1;
        Ok(())
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}
