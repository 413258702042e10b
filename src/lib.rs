//! A minimal BitTorrent v1 leecher.
//!
//! Given a `.torrent` metainfo file, the crate decodes it, asks the HTTP
//! tracker for peers, talks the peer wire protocol over TCP, and assembles
//! the file piece by piece, verifying every piece against the SHA-1 hashes
//! embedded in the metainfo.

pub mod bencode;
pub mod error;
pub mod torrent;
pub mod utils;

/// Protocol identifier sent in every handshake.
pub const PROTOCOL: &str = "BitTorrent protocol";
/// Fixed client id presented to trackers and peers.
pub const PEER_ID: [u8; 20] = *b"00112233445566778899";
/// Port advertised to the tracker.
pub const DEFAULT_PORT: u16 = 6881;
