/// A bencode value as defined in the BitTorrent specification.
///
/// Bencode supports four types of values:
/// - Byte strings (arbitrary bytes, not necessarily UTF-8)
/// - Integers
/// - Lists
/// - Dictionaries
///
/// Dictionary entries keep the order they appeared in the input, so a decoded
/// value re-encodes to the exact bytes it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum BValue {
    /// An integer value, can be positive or negative.
    /// Example: `i42e` represents 42
    Integer(i64),

    /// A byte string, prefixed with its length.
    /// Example: `4:spam` represents "spam"
    String(Vec<u8>),

    /// A list of BValue elements.
    /// Example: `l4:spami42ee` represents ["spam", 42]
    List(Vec<BValue>),

    /// A dictionary mapping byte-string keys to values, in insertion order.
    /// Example: `d3:bar4:spam3:fooi42ee` represents {"bar": "spam", "foo": 42}
    Dict(Vec<(Vec<u8>, BValue)>),
}

impl BValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            BValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            BValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(Vec<u8>, BValue)]> {
        match self {
            BValue::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a dictionary entry by raw key.
    pub fn get(&self, key: &[u8]) -> Option<&BValue> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Projects the value into JSON for display.
    ///
    /// Byte strings that are not printable ASCII are rendered as lowercase
    /// hex, since JSON strings cannot carry arbitrary bytes.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            BValue::Integer(n) => serde_json::Value::Number((*n).into()),
            BValue::String(s) => {
                if s.iter().any(|&b| !(32..127).contains(&b)) {
                    serde_json::Value::String(hex::encode(s))
                } else {
                    serde_json::Value::String(String::from_utf8_lossy(s).into_owned())
                }
            }
            BValue::List(list) => {
                serde_json::Value::Array(list.iter().map(|v| v.to_json()).collect())
            }
            BValue::Dict(entries) => {
                let obj = entries
                    .iter()
                    .map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), v.to_json()))
                    .collect();
                serde_json::Value::Object(obj)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dict_lookup() {
        let dict = BValue::Dict(vec![
            (b"foo".to_vec(), BValue::String(b"bar".to_vec())),
            (b"hello".to_vec(), BValue::Integer(52)),
        ]);
        assert_eq!(dict.get(b"hello"), Some(&BValue::Integer(52)));
        assert_eq!(dict.get(b"missing"), None);
    }

    #[test]
    fn test_to_json() {
        let value = BValue::List(vec![
            BValue::String(b"hello".to_vec()),
            BValue::Integer(52),
        ]);
        assert_eq!(value.to_json(), json!(["hello", 52]));
    }

    #[test]
    fn test_to_json_binary_string_is_hexed() {
        let value = BValue::String(vec![0x00, 0xff, 0x10]);
        assert_eq!(value.to_json(), json!("00ff10"));
    }
}
