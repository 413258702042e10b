//! Structured error kinds for the client.
//!
//! Every fallible operation in the crate returns one of these kinds rather
//! than a free-form string. Each layer converts transport-level failures into
//! its own kind, so a socket read failure surfaces as [`Error::PeerRecv`] and
//! never as a raw OS error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid bencode: {0}")]
    BencodeInvalid(String),

    #[error("bencode input ended unexpectedly: {0}")]
    BencodeTruncated(String),

    #[error("malformed bencode integer: {0}")]
    BencodeBadInteger(String),

    #[error("malformed bencode string: {0}")]
    BencodeBadString(String),

    #[error("malformed bencode list: {0}")]
    BencodeBadList(String),

    #[error("malformed bencode dictionary: {0}")]
    BencodeBadDict(String),

    #[error("malformed metainfo: {0}")]
    MetainfoMalformed(String),

    #[error("could not read metainfo file")]
    MetainfoIoError(#[source] std::io::Error),

    #[error("bad tracker url: {0}")]
    TrackerBadUrl(String),

    #[error("tracker request failed")]
    TrackerHttpFailed(#[source] reqwest::Error),

    #[error("malformed tracker response: {0}")]
    TrackerMalformedResponse(String),

    #[error("tracker rejected announce: {0}")]
    TrackerRejected(String),

    #[error("peer socket error: {0}")]
    PeerSocket(String),

    #[error("could not connect to peer")]
    PeerConnect(#[source] std::io::Error),

    #[error("could not send to peer")]
    PeerSend(#[source] std::io::Error),

    #[error("could not receive from peer: {0}")]
    PeerRecv(String),

    #[error("handshake mismatch: {0}")]
    PeerHandshakeMismatch(String),

    #[error("expected bitfield, got {0}")]
    PeerExpectedBitfield(String),

    #[error("unknown peer message id {0}")]
    PeerUnknownMessage(u8),

    #[error("peer choked mid-piece")]
    PeerChokedMidPiece,

    #[error("piece index {0} out of range")]
    PieceBadIndex(usize),

    #[error("piece {0} failed hash verification")]
    PieceHashMismatch(usize),

    #[error("no usable peers")]
    NoUsablePeers,

    #[error("output file error")]
    OutputIoError(#[source] std::io::Error),
}
