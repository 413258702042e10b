use crate::error::Result;

pub use bvalue::BValue;

mod bvalue;
pub(crate) mod decoder;
mod encoder;

/// Bencode codec facade.
#[derive(Debug, Clone, Copy)]
pub struct Bencode;

impl Bencode {
    /// Decodes a complete bencoded byte slice into a value.
    ///
    /// The whole input must be consumed; trailing bytes are an error.
    pub fn decode(input: &[u8]) -> Result<BValue> {
        decoder::Decoder::new(input).parse()
    }

    /// Encodes a value into bencoded bytes.
    pub fn encode(value: &BValue) -> Vec<u8> {
        encoder::Encoder::new().encode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_encode_roundtrip() {
        // Re-encoding a decoded value must reproduce the input byte for byte,
        // including dictionaries whose keys are not sorted.
        let inputs: Vec<&[u8]> = vec![
            b"i42e",
            b"4:spam",
            b"l4:spami42ee",
            b"d3:bar4:spam3:fooi42ee",
            b"d3:zoo4:spam3:abci42ee",
            b"d4:dictd1:x1:y1:zi42ee4:listl1:a1:b1:cee",
        ];

        for input in inputs {
            let decoded = Bencode::decode(input).unwrap();
            assert_eq!(Bencode::encode(&decoded), input);
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let values = vec![
            BValue::Integer(-7),
            BValue::String(vec![0x00, 0x13, 0xff]),
            BValue::List(vec![BValue::Integer(1), BValue::String(b"two".to_vec())]),
            BValue::Dict(vec![
                (b"a".to_vec(), BValue::List(vec![])),
                (b"b".to_vec(), BValue::Dict(vec![])),
            ]),
        ];

        for value in values {
            let encoded = Bencode::encode(&value);
            assert_eq!(Bencode::decode(&encoded).unwrap(), value);
        }
    }
}
