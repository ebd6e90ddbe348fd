//! Forgiving HTML tag stripper.
//!
//! The body is scanned as a stream of markup constructs and data segments.
//! Only data segments survive; tags, comments, declarations, processing
//! instructions and entity references are dropped without substitution.
//! Nothing here validates the document: unbalanced tags are fine, and a
//! construct left open at the end of input is dropped.

use crate::mr::{Error, Result};

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: [&[u8]; 2] = [b"script", b"style"];

/// Iterator over the data segments of `html`, in document order.
///
/// Yields an error once, the first time a markup construct is not valid
/// UTF-8, and then stops.
pub struct Fragments<'a> {
    src: &'a [u8],
    pos: usize,
    raw_text: Option<&'static [u8]>,
    failed: bool,
}

impl<'a> Fragments<'a> {
    pub fn new(html: &'a [u8]) -> Self {
        Self {
            src: html,
            pos: 0,
            raw_text: None,
            failed: false,
        }
    }

    /// Returns the end of the markup construct starting at `start`, or
    /// `None` when the `<` there is plain text.
    fn markup_end(&mut self, start: usize) -> Result<Option<usize>> {
        let src = self.src;
        let rest = &src[start..];
        let len = src.len();

        let end = if rest.starts_with(b"<!--") {
            match find(&src[start + 4..], b"-->") {
                Some(i) => start + 4 + i + 3,
                None => len,
            }
        } else if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
            match find_byte(&src[start + 2..], b'>') {
                Some(i) => start + 2 + i + 1,
                None => len,
            }
        } else if rest.len() > 2 && rest[1] == b'/' && rest[2].is_ascii_alphabetic() {
            match find_byte(&src[start + 2..], b'>') {
                Some(i) => start + 2 + i + 1,
                None => len,
            }
        } else if rest.len() > 1 && rest[1].is_ascii_alphabetic() {
            match tag_close(&src[start + 1..]) {
                Some(i) => {
                    let end = start + 1 + i + 1;
                    let tag = &src[start + 1..end];
                    if !tag.ends_with(b"/>") {
                        self.raw_text = raw_text_element(tag);
                    }
                    end
                }
                None => len,
            }
        } else {
            return Ok(None);
        };

        let markup = &src[start..end];
        std::str::from_utf8(markup).map_err(|e| Error::decode(markup, start, e))?;
        log::trace!("dropped markup {:?}", String::from_utf8_lossy(markup));
        Ok(Some(end))
    }

    /// Returns the end of the entity or character reference at `start`, if any.
    fn reference_end(&self, start: usize) -> Option<usize> {
        let src = self.src;
        let mut i = start + 1;
        if src.get(i) == Some(&b'#') {
            i += 1;
            let hex = matches!(src.get(i), Some(b'x' | b'X'));
            if hex {
                i += 1;
            }
            let digits = src[i..]
                .iter()
                .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
                .count();
            if digits == 0 {
                return None;
            }
            i += digits;
        } else {
            if !src.get(i).is_some_and(u8::is_ascii_alphabetic) {
                return None;
            }
            i += src[i..]
                .iter()
                .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.'))
                .count();
        }
        if src.get(i) == Some(&b';') {
            i += 1;
        }
        Some(i)
    }

    fn next_data(&mut self) -> &'a [u8] {
        let start = self.pos;
        let end = self.src[start + 1..]
            .iter()
            .position(|&b| matches!(b, b'<' | b'&'))
            .map_or(self.src.len(), |i| start + 1 + i);
        self.pos = end;
        &self.src[start..end]
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.pos < self.src.len() {
            let start = self.pos;

            if let Some(element) = self.raw_text.take() {
                // Raw text runs up to the matching end tag; unterminated, it is dropped.
                match find_end_tag(&self.src[start..], element) {
                    Some(0) => continue,
                    Some(i) => {
                        self.pos = start + i;
                        return Some(Ok(&self.src[start..start + i]));
                    }
                    None => {
                        self.pos = self.src.len();
                        return None;
                    }
                }
            }

            match self.src[start] {
                b'<' => match self.markup_end(start) {
                    Ok(Some(end)) => {
                        self.pos = end;
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                },
                b'&' => {
                    if let Some(end) = self.reference_end(start) {
                        self.pos = end;
                        continue;
                    }
                }
                _ => {}
            }
            return Some(Ok(self.next_data()));
        }
        None
    }
}

/// Removes all markup from `html`, keeping the text between tags.
pub fn strip_tags(html: &[u8]) -> Result<Vec<u8>> {
    let mut text = Vec::with_capacity(html.len());
    for fragment in Fragments::new(html) {
        text.extend_from_slice(fragment?);
    }
    Ok(text)
}

fn find_byte(hay: &[u8], needle: u8) -> Option<usize> {
    hay.iter().position(|&b| b == needle)
}

fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}

/// Position of the `>` closing a start tag, skipping over quoted attribute values.
fn tag_close(tag: &[u8]) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in tag.iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn raw_text_element(tag: &[u8]) -> Option<&'static [u8]> {
    let name_len = tag
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let name = &tag[..name_len];
    RAW_TEXT_ELEMENTS
        .into_iter()
        .find(|e| e.eq_ignore_ascii_case(name))
}

/// Finds `</element` (any case) in `hay`.
fn find_end_tag(hay: &[u8], element: &[u8]) -> Option<usize> {
    let n = element.len() + 2;
    hay.windows(n).position(|w| {
        w.starts_with(b"</") && w[2..].eq_ignore_ascii_case(element)
    })
}
