//! BitTorrent metainfo file parser.
//!
//! A torrent file (also known as a metainfo file) is a bencoded dictionary
//! containing:
//!
//! - `announce`: URL of the tracker that coordinates peers
//! - `info`: core metadata about the file:
//!   - `name`: suggested filename
//!   - `length`: total size in bytes (single-file torrents only)
//!   - `piece length`: number of bytes per piece
//!   - `pieces`: concatenated SHA-1 hashes of all pieces
//!
//! The parser records the exact byte span the `info` value occupied in the
//! source file. The swarm identifier (`info_hash`) is the SHA-1 of those
//! original bytes, never of a re-encoding: a source dictionary with unsorted
//! keys would re-encode differently and change the hash.
//!
//! Multi-file torrents have a different `info` structure and are not
//! supported.

use std::fmt;
use std::path::Path;

use crate::bencode::decoder::Decoder;
use crate::bencode::BValue;
use crate::error::{Error, Result};
use crate::utils;

/// Length of a SHA-1 digest in bytes.
const SHA1_LEN: usize = 20;

/// A parsed metainfo file.
///
/// Frozen after parse; peer sessions and the tracker client share it
/// read-only.
#[derive(Debug, Clone)]
pub struct Torrent {
    /// URL of the tracker server.
    pub announce: String,
    /// Core metadata about the torrent content.
    pub info: TorrentInfo,
    /// The `info` value exactly as it appeared in the source file.
    info_raw: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TorrentInfo {
    pub name: String,
    pub length: usize,
    pub piece_length: usize,
    pub pieces: Vec<u8>,
}

impl Torrent {
    /// Reads and parses a torrent file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(Error::MetainfoIoError)?;
        Self::from_bytes(&bytes)
    }

    /// Parses a torrent file from its raw bytes.
    ///
    /// Walks the top-level dictionary with the streaming decoder so the byte
    /// range of the `info` value can be captured alongside the parsed form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(bytes);
        if decoder.peek() != Some(b'd') {
            return Err(Error::MetainfoMalformed(
                "top-level value is not a dictionary".into(),
            ));
        }
        decoder.bump();

        let mut announce = None;
        let mut info = None;
        loop {
            match decoder.peek() {
                Some(b'e') => {
                    decoder.bump();
                    break;
                }
                Some(b) if b.is_ascii_digit() => {}
                Some(_) => return Err(Error::BencodeBadDict("key is not a string".into())),
                None => return Err(Error::BencodeBadDict("missing terminator".into())),
            }

            let key = match decoder.parse_value()? {
                BValue::String(key) => key,
                _ => return Err(Error::BencodeBadDict("key is not a string".into())),
            };
            let start = decoder.position();
            let value = decoder.parse_value()?;
            let end = decoder.position();

            match key.as_slice() {
                b"announce" => {
                    let raw = value.as_bytes().ok_or_else(|| {
                        Error::MetainfoMalformed("announce is not a string".into())
                    })?;
                    let url = String::from_utf8(raw.to_vec()).map_err(|_| {
                        Error::MetainfoMalformed("announce is not valid UTF-8".into())
                    })?;
                    announce = Some(url);
                }
                b"info" => info = Some((value, bytes[start..end].to_vec())),
                _ => {}
            }
        }
        if decoder.position() != bytes.len() {
            return Err(Error::BencodeInvalid(format!(
                "trailing bytes at offset {}",
                decoder.position()
            )));
        }

        let announce =
            announce.ok_or_else(|| Error::MetainfoMalformed("missing announce".into()))?;
        let (info_value, info_raw) =
            info.ok_or_else(|| Error::MetainfoMalformed("missing info dictionary".into()))?;
        let info = TorrentInfo::from_value(&info_value)?;

        Ok(Self {
            announce,
            info,
            info_raw,
        })
    }

    /// SHA-1 of the bencoded `info` dictionary, as it appeared in the source.
    ///
    /// Used raw in peer handshakes and percent-encoded in tracker queries.
    pub fn info_hash(&self) -> [u8; 20] {
        utils::sha1(&self.info_raw)
    }

    /// The info hash as 40 lowercase hex characters.
    pub fn info_hash_hex(&self) -> String {
        hex::encode(self.info_hash())
    }
}

impl TorrentInfo {
    fn from_value(value: &BValue) -> Result<Self> {
        if value.as_dict().is_none() {
            return Err(Error::MetainfoMalformed("info is not a dictionary".into()));
        }

        let name_raw = value
            .get(b"name")
            .and_then(BValue::as_bytes)
            .ok_or_else(|| Error::MetainfoMalformed("missing info.name".into()))?;
        let name = String::from_utf8(name_raw.to_vec())
            .map_err(|_| Error::MetainfoMalformed("info.name is not valid UTF-8".into()))?;

        let length = value
            .get(b"length")
            .and_then(BValue::as_integer)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| Error::MetainfoMalformed("missing info.length".into()))?;

        let piece_length = value
            .get(b"piece length")
            .and_then(BValue::as_integer)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| Error::MetainfoMalformed("missing info.piece length".into()))?;
        if piece_length == 0 {
            return Err(Error::MetainfoMalformed("piece length is zero".into()));
        }

        let pieces = value
            .get(b"pieces")
            .and_then(BValue::as_bytes)
            .ok_or_else(|| Error::MetainfoMalformed("missing info.pieces".into()))?
            .to_vec();
        if pieces.len() % SHA1_LEN != 0 {
            return Err(Error::MetainfoMalformed(format!(
                "pieces length {} is not a multiple of {}",
                pieces.len(),
                SHA1_LEN
            )));
        }

        let expected_pieces = length.div_ceil(piece_length);
        if expected_pieces != pieces.len() / SHA1_LEN {
            return Err(Error::MetainfoMalformed(format!(
                "{} bytes in {}-byte pieces needs {} hashes, found {}",
                length,
                piece_length,
                expected_pieces,
                pieces.len() / SHA1_LEN
            )));
        }

        Ok(Self {
            name,
            length,
            piece_length,
            pieces,
        })
    }

    /// The per-piece SHA-1 hashes, in piece order.
    pub fn piece_hashes(&self) -> Vec<[u8; 20]> {
        self.pieces
            .chunks_exact(SHA1_LEN)
            .map(|chunk| chunk.try_into().unwrap())
            .collect()
    }

    pub fn total_pieces(&self) -> usize {
        self.pieces.len() / SHA1_LEN
    }

    /// Actual length of the given piece.
    ///
    /// Every piece is `piece length` bytes except the last, which covers the
    /// remainder of the file.
    pub fn piece_size(&self, piece_index: usize) -> Result<usize> {
        let total = self.total_pieces();
        if piece_index >= total {
            return Err(Error::PieceBadIndex(piece_index));
        }
        if piece_index == total - 1 {
            Ok(self.length - (total - 1) * self.piece_length)
        } else {
            Ok(self.piece_length)
        }
    }
}

impl fmt::Display for Torrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tracker URL: {}", self.announce)?;
        writeln!(f, "Length: {}", self.info.length)?;
        writeln!(f, "Info Hash: {}", self.info_hash_hex())?;
        writeln!(f, "Piece Length: {}", self.info.piece_length)?;
        write!(f, "Piece Hashes:")?;
        for hash in self.info.piece_hashes() {
            write!(f, "\n{}", hex::encode(hash))?;
        }
        Ok(())
    }
}
