use std::str::Utf8Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Bytes that had to be read as text were not valid UTF-8.
    /// `offset` counts from the start of the scanned text: the raw body for
    /// markup, the stripped body for tokens.
    #[error("cannot decode byte {byte:#04x} at offset {offset}")]
    Decode {
        offset: usize,
        byte: u8,
        #[source]
        source: Utf8Error,
    },

    #[error("row {row} has {len} field(s), field {index} is required")]
    MissingField { row: u64, index: usize, len: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds a `Decode` error for `bytes`, which start at `base` inside the field.
    pub(crate) fn decode(bytes: &[u8], base: usize, source: Utf8Error) -> Self {
        let at = source.valid_up_to();
        Error::Decode {
            offset: base + at,
            byte: bytes.get(at).copied().unwrap_or_default(),
            source,
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode { .. })
    }
}
