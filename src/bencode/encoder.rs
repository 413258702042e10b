//! Bencode encoder.
//!
//! The encoding rules are:
//! - Strings are length-prefixed base10 followed by a colon and the raw bytes
//! - Integers are 'i' followed by the number in base10 followed by 'e'
//! - Lists are 'l' followed by their elements followed by 'e'
//! - Dictionaries are 'd' followed by alternating keys and values followed by 'e'
//!
//! Dictionary entries are written in stored order, so re-encoding a decoded
//! value reproduces the input bytes exactly. Callers building dictionaries
//! from scratch insert keys in sorted order to stay conformant.

use super::bvalue::BValue;

/// An encoder for converting values into bencode bytes.
pub struct Encoder {
    output: Vec<u8>,
}

impl Encoder {
    /// Creates a new encoder with an empty output buffer.
    pub fn new() -> Self {
        Self { output: Vec::new() }
    }

    /// Encodes a value and returns the bencoded bytes.
    pub fn encode(mut self, value: &BValue) -> Vec<u8> {
        self.encode_value(value);
        self.output
    }

    fn encode_value(&mut self, value: &BValue) {
        match value {
            BValue::Integer(n) => self.encode_integer(*n),
            BValue::String(s) => self.encode_string(s),
            BValue::List(list) => self.encode_list(list),
            BValue::Dict(entries) => self.encode_dict(entries),
        }
    }

    /// Encodes an integer in the format: i<number>e
    fn encode_integer(&mut self, n: i64) {
        self.output.push(b'i');
        self.output.extend_from_slice(n.to_string().as_bytes());
        self.output.push(b'e');
    }

    /// Encodes a string in the format: <length>:<bytes>
    fn encode_string(&mut self, s: &[u8]) {
        self.output.extend_from_slice(s.len().to_string().as_bytes());
        self.output.push(b':');
        self.output.extend_from_slice(s);
    }

    /// Encodes a list in the format: l<bencoded values>e
    fn encode_list(&mut self, list: &[BValue]) {
        self.output.push(b'l');
        for item in list {
            self.encode_value(item);
        }
        self.output.push(b'e');
    }

    /// Encodes a dictionary in the format: d<bencoded string><bencoded value>e
    fn encode_dict(&mut self, entries: &[(Vec<u8>, BValue)]) {
        self.output.push(b'd');
        for (key, value) in entries {
            self.encode_string(key);
            self.encode_value(value);
        }
        self.output.push(b'e');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &BValue) -> Vec<u8> {
        Encoder::new().encode(value)
    }

    #[test]
    fn test_encode_string() {
        assert_eq!(encode(&BValue::String(b"hello".to_vec())), b"5:hello");
        assert_eq!(encode(&BValue::String(vec![])), b"0:");
    }

    #[test]
    fn test_encode_integer() {
        assert_eq!(encode(&BValue::Integer(42)), b"i42e");
        assert_eq!(encode(&BValue::Integer(-52)), b"i-52e");
        assert_eq!(encode(&BValue::Integer(0)), b"i0e");
    }

    #[test]
    fn test_encode_list() {
        let value = BValue::List(vec![
            BValue::String(b"hello".to_vec()),
            BValue::Integer(52),
        ]);
        assert_eq!(encode(&value), b"l5:helloi52ee");
    }

    #[test]
    fn test_encode_dict() {
        let value = BValue::Dict(vec![
            (b"bar".to_vec(), BValue::String(b"spam".to_vec())),
            (b"foo".to_vec(), BValue::Integer(42)),
        ]);
        assert_eq!(encode(&value), b"d3:bar4:spam3:fooi42ee");
    }
}
