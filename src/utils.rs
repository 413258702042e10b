use sha1::{Digest, Sha1};

/// SHA-1 digest of a byte slice.
pub fn sha1(bytes: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Percent-encodes a byte slice for use in tracker query strings.
///
/// Unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through, everything
/// else becomes `%XX` with uppercase hex digits.
pub fn url_encode(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 3);
    for &byte in bytes {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
