//! Bencode decoder following the BitTorrent protocol specification.
//!
//! Bencode supports four data types:
//! - Byte strings: `<length>:<contents>` (e.g. `4:spam`)
//! - Integers: `i<number>e` (e.g. `i42e`)
//! - Lists: `l<bencoded values>e` (e.g. `l4:spami42ee`)
//! - Dictionaries: `d<bencoded string><bencoded value>e` (e.g. `d3:bar4:spam3:fooi42ee`)
//!
//! Input is treated as raw bytes throughout; the `pieces` blob in a torrent
//! file is a concatenation of SHA-1 digests and is not valid UTF-8.

use crate::error::{Error, Result};

use super::bvalue::BValue;

/// Nesting bound; depth in real torrents is in the single digits.
const MAX_DEPTH: usize = 1024;

/// A streaming decoder for bencoded data.
///
/// The decoder maintains its position in the input slice and parses values
/// incrementally, which lets callers record the byte span a value occupied.
#[derive(Debug)]
pub struct Decoder<'a> {
    input: &'a [u8],
    position: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder over the given input bytes.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            depth: 0,
        }
    }

    /// Parses the complete input into a single value.
    ///
    /// Trailing bytes after the value are an error at the top level.
    pub fn parse(&mut self) -> Result<BValue> {
        let value = self.parse_value()?;
        if self.position != self.input.len() {
            return Err(Error::BencodeInvalid(format!(
                "trailing bytes at offset {}",
                self.position
            )));
        }
        Ok(value)
    }

    /// Current byte offset into the input.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Returns the next byte without consuming it.
    pub(crate) fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    /// Consumes and returns the next byte.
    pub(crate) fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    /// Parses one bencoded value based on its prefix:
    /// - 'i' for integers
    /// - 'l' for lists
    /// - 'd' for dictionaries
    /// - digit for strings
    pub(crate) fn parse_value(&mut self) -> Result<BValue> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::BencodeInvalid(format!(
                "nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        let value = match self.peek() {
            Some(b'i') => BValue::Integer(self.parse_integer()?),
            Some(b'l') => self.parse_list()?,
            Some(b'd') => self.parse_dict()?,
            Some(b) if b.is_ascii_digit() => BValue::String(self.parse_string()?),
            Some(b) => {
                return Err(Error::BencodeInvalid(format!(
                    "unhandled prefix 0x{:02x} at offset {}",
                    b, self.position
                )))
            }
            None => return Err(Error::BencodeTruncated("expected a value".into())),
        };
        self.depth -= 1;
        Ok(value)
    }

    /// Parses a bencoded integer of the form `i<number>e`.
    ///
    /// Canonical form only: no leading zeros (except `0` itself), no `-0`,
    /// no `+` sign, and the value must fit in an `i64`.
    fn parse_integer(&mut self) -> Result<i64> {
        self.bump(); // consume 'i'
        let start = self.position;
        while matches!(self.peek(), Some(b) if b != b'e') {
            self.position += 1;
        }
        if self.bump() != Some(b'e') {
            return Err(Error::BencodeTruncated("integer missing terminator".into()));
        }

        let raw = &self.input[start..self.position - 1];
        let digits = raw.strip_prefix(b"-").unwrap_or(raw);
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(Error::BencodeBadInteger(format!(
                "{:?} is not a decimal number",
                String::from_utf8_lossy(raw)
            )));
        }
        if digits.len() > 1 && digits[0] == b'0' {
            return Err(Error::BencodeBadInteger("leading zeros".into()));
        }
        if raw[0] == b'-' && digits[0] == b'0' {
            return Err(Error::BencodeBadInteger("negative zero".into()));
        }

        // All bytes are '-' or ASCII digits at this point.
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| Error::BencodeBadInteger("does not fit in 64 bits".into()))
    }

    /// Parses a bencoded string of the form `<length>:<contents>`.
    ///
    /// The contents are returned as raw bytes.
    fn parse_string(&mut self) -> Result<Vec<u8>> {
        let start = self.position;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.position += 1;
        }
        let length_digits = &self.input[start..self.position];
        match self.bump() {
            Some(b':') => {}
            Some(_) => return Err(Error::BencodeBadString("missing ':' after length".into())),
            None => return Err(Error::BencodeTruncated("string missing ':'".into())),
        }

        // Length digits are ASCII by construction.
        let length = std::str::from_utf8(length_digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| Error::BencodeBadString("unparseable length".into()))?;

        let remaining = self.input.len() - self.position;
        if remaining < length {
            return Err(Error::BencodeBadString(format!(
                "length {} exceeds remaining input ({} bytes)",
                length, remaining
            )));
        }
        let bytes = self.input[self.position..self.position + length].to_vec();
        self.position += length;
        Ok(bytes)
    }

    /// Parses a bencoded list of the form `l<bencoded values>e`.
    fn parse_list(&mut self) -> Result<BValue> {
        self.bump(); // consume 'l'
        let mut values = Vec::new();

        loop {
            match self.peek() {
                Some(b'e') => {
                    self.bump();
                    return Ok(BValue::List(values));
                }
                Some(_) => values.push(self.parse_value()?),
                None => return Err(Error::BencodeBadList("missing terminator".into())),
            }
        }
    }

    /// Parses a bencoded dictionary of the form `d<bencoded string><bencoded value>e`.
    ///
    /// Keys must be strings. Entries are kept in the order they appear.
    fn parse_dict(&mut self) -> Result<BValue> {
        self.bump(); // consume 'd'
        let mut entries = Vec::new();

        loop {
            match self.peek() {
                Some(b'e') => {
                    self.bump();
                    return Ok(BValue::Dict(entries));
                }
                Some(b) if b.is_ascii_digit() => {}
                Some(_) => return Err(Error::BencodeBadDict("key is not a string".into())),
                None => return Err(Error::BencodeBadDict("missing terminator".into())),
            }

            let key = self.parse_string()?;
            match self.peek() {
                Some(b'e') | None => {
                    return Err(Error::BencodeBadDict(format!(
                        "key {:?} has no value",
                        String::from_utf8_lossy(&key)
                    )))
                }
                Some(_) => {}
            }
            let value = self.parse_value()?;
            entries.push((key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Result<BValue> {
        Decoder::new(input).parse()
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            decode(b"5:hello").unwrap(),
            BValue::String(b"hello".to_vec())
        );
        assert_eq!(decode(b"0:").unwrap(), BValue::String(vec![]));
        assert_eq!(
            decode(b"13:Hello, World!").unwrap(),
            BValue::String(b"Hello, World!".to_vec())
        );
    }

    #[test]
    fn test_parse_string_raw_bytes() {
        assert_eq!(
            decode(b"3:\x00\xff\x10").unwrap(),
            BValue::String(vec![0x00, 0xff, 0x10])
        );
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(decode(b"i42e").unwrap(), BValue::Integer(42));
        assert_eq!(decode(b"i-52e").unwrap(), BValue::Integer(-52));
        assert_eq!(decode(b"i0e").unwrap(), BValue::Integer(0));
        assert_eq!(
            decode(b"i4294967300e").unwrap(),
            BValue::Integer(4294967300)
        );
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            decode(b"l5:helloi52ee").unwrap(),
            BValue::List(vec![
                BValue::String(b"hello".to_vec()),
                BValue::Integer(52)
            ])
        );
        assert_eq!(decode(b"le").unwrap(), BValue::List(vec![]));
        assert_eq!(
            decode(b"lli4eei5ee").unwrap(),
            BValue::List(vec![
                BValue::List(vec![BValue::Integer(4)]),
                BValue::Integer(5)
            ])
        );
    }

    #[test]
    fn test_parse_dict() {
        assert_eq!(
            decode(b"d3:foo3:bar5:helloi52ee").unwrap(),
            BValue::Dict(vec![
                (b"foo".to_vec(), BValue::String(b"bar".to_vec())),
                (b"hello".to_vec(), BValue::Integer(52)),
            ])
        );
        assert_eq!(decode(b"de").unwrap(), BValue::Dict(vec![]));
    }

    #[test]
    fn test_dict_preserves_insertion_order() {
        // Keys out of lexicographic order still come back in input order.
        let value = decode(b"d3:zzzi1e3:aaai2ee").unwrap();
        assert_eq!(
            value,
            BValue::Dict(vec![
                (b"zzz".to_vec(), BValue::Integer(1)),
                (b"aaa".to_vec(), BValue::Integer(2)),
            ])
        );
    }

    #[test]
    fn test_bad_integers() {
        assert!(matches!(
            decode(b"i-0e").unwrap_err(),
            Error::BencodeBadInteger(_)
        ));
        assert!(matches!(
            decode(b"i03e").unwrap_err(),
            Error::BencodeBadInteger(_)
        ));
        assert!(matches!(
            decode(b"i42abce").unwrap_err(),
            Error::BencodeBadInteger(_)
        ));
        assert!(matches!(
            decode(b"i+42e").unwrap_err(),
            Error::BencodeBadInteger(_)
        ));
        assert!(matches!(
            decode(b"ie").unwrap_err(),
            Error::BencodeBadInteger(_)
        ));
        assert!(matches!(
            decode(b"i9223372036854775808e").unwrap_err(),
            Error::BencodeBadInteger(_)
        ));
        assert!(matches!(
            decode(b"i42").unwrap_err(),
            Error::BencodeTruncated(_)
        ));
    }

    #[test]
    fn test_bad_strings() {
        assert!(matches!(
            decode(b"5:hell").unwrap_err(),
            Error::BencodeBadString(_)
        ));
        assert!(matches!(
            decode(b"4spam").unwrap_err(),
            Error::BencodeBadString(_)
        ));
        assert!(matches!(
            decode(b"42").unwrap_err(),
            Error::BencodeTruncated(_)
        ));
    }

    #[test]
    fn test_bad_lists() {
        assert!(matches!(
            decode(b"li523e").unwrap_err(),
            Error::BencodeBadList(_)
        ));
        assert!(matches!(
            decode(b"l5:hello").unwrap_err(),
            Error::BencodeBadList(_)
        ));
    }

    #[test]
    fn test_bad_dicts() {
        // Key without a value.
        assert!(matches!(
            decode(b"d1:ae").unwrap_err(),
            Error::BencodeBadDict(_)
        ));
        // Non-string key.
        assert!(matches!(
            decode(b"di1ei2ee").unwrap_err(),
            Error::BencodeBadDict(_)
        ));
        assert!(matches!(
            decode(b"d3:fooi1ed3:bari2ee").unwrap_err(),
            Error::BencodeBadDict(_)
        ));
        // Missing terminator.
        assert!(matches!(
            decode(b"d1:ai1e").unwrap_err(),
            Error::BencodeBadDict(_)
        ));
    }

    #[test]
    fn test_unknown_prefix() {
        assert!(matches!(
            decode(b"x42e").unwrap_err(),
            Error::BencodeInvalid(_)
        ));
        assert!(matches!(
            decode(b"").unwrap_err(),
            Error::BencodeTruncated(_)
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected_at_top_level() {
        assert!(matches!(
            decode(b"i42etrailing").unwrap_err(),
            Error::BencodeInvalid(_)
        ));
        assert!(matches!(
            decode(b"5:helloi1e").unwrap_err(),
            Error::BencodeInvalid(_)
        ));
    }

    #[test]
    fn test_depth_guard() {
        let mut input = Vec::new();
        input.extend(std::iter::repeat(b'l').take(2000));
        input.extend(std::iter::repeat(b'e').take(2000));
        assert!(matches!(
            decode(&input).unwrap_err(),
            Error::BencodeInvalid(_)
        ));
    }
}
