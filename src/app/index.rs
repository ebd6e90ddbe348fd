use std::sync::LazyLock;

use regex::{bytes, Regex};

use crate::app::stopwords;
use crate::mr::{Error, Result};

/// Each match is exactly one delimiter byte, so two delimiters in a row give an empty token.
static DELIMITER: LazyLock<bytes::Regex> = LazyLock::new(|| {
    bytes::Regex::new(r#"(?-u:[\s.!?:;"()<>\[\]#$=\-/,])"#).expect("delimiter pattern is valid")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_]+$").expect("word pattern is valid"));

/// Splits markup-free `text` into the words worth indexing.
///
/// Stop words and tokens that are not made of ASCII word characters are
/// skipped silently. A token that is not valid UTF-8 yields an `Err` and
/// iteration carries on with the next token.
pub fn words(text: &[u8]) -> Words<'_> {
    Words {
        tokens: DELIMITER.split(text),
        offset: 0,
    }
}

pub struct Words<'a> {
    tokens: bytes::Split<'static, 'a>,
    offset: usize,
}

impl<'a> Iterator for Words<'a> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        for token in self.tokens.by_ref() {
            let offset = self.offset;
            self.offset += token.len() + 1;

            if stopwords::is_stop_word(token) {
                continue;
            }
            let token = match std::str::from_utf8(token) {
                Ok(token) => token,
                Err(e) => return Some(Err(Error::decode(token, offset, e))),
            };
            if WORD.is_match(token) {
                return Some(Ok(token.to_ascii_lowercase()));
            }
            log::trace!("not a word: {token:?}");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(text: &[u8]) -> Vec<String> {
        words(text).filter_map(|w| w.ok()).collect()
    }

    #[test]
    fn splits_on_every_delimiter() {
        assert_eq!(map(b"one,two.three"), ["one", "two", "three"]);
        assert_eq!(
            map(b"a1!b1?c1:d1;e1\"f1(g1)h1<i1>j1[k1]l1#m1$n1=o1-p1/q1,r1 s1\tt1\nu1\rv1"),
            [
                "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1", "i1", "j1", "k1", "l1", "m1",
                "n1", "o1", "p1", "q1", "r1", "s1", "t1", "u1", "v1"
            ]
        );
    }

    #[test]
    fn empty_tokens_are_dropped() {
        assert_eq!(map(b"  fox...!!  dog  "), ["fox", "dog"]);
        assert!(map(b"").is_empty());
        assert!(map(b" ,.;").is_empty());
    }

    #[test]
    fn stop_words_are_dropped_in_any_case() {
        assert!(map(b"and the of").is_empty());
        assert_eq!(map(b"The Quick Brown Fox!"), ["quick", "brown", "fox"]);
        assert_eq!(map(b"THE fox tHe"), ["fox"]);
    }

    #[test]
    fn case_is_folded() {
        assert_eq!(map(b"Dog dog DOG"), ["dog", "dog", "dog"]);
    }

    #[test]
    fn non_word_tokens_are_dropped() {
        assert_eq!(map("café don't x+y under_score".as_bytes()), ["under_score"]);
        assert_eq!(map(b"foo@bar.com"), ["com"]);
    }

    #[test]
    fn numbers_are_words() {
        assert_eq!(map(b"2020 version 1.5"), ["2020", "version", "1", "5"]);
    }

    #[test]
    fn undecodable_token_is_reported_and_skipped() {
        let items: Vec<_> = words(b"good caf\xe9 word").collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), "good");
        match &items[1] {
            Err(Error::Decode { offset, byte, .. }) => {
                assert_eq!(*offset, 8);
                assert_eq!(*byte, 0xe9);
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert_eq!(items[2].as_ref().unwrap(), "word");
    }
}
