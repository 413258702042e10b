//! Peer wire protocol messages.
//!
//! Every message after the handshake is framed as a big-endian `u32` length
//! followed by `length` bytes: one id byte and the payload. A zero-length
//! frame is a keep-alive and carries neither.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    KeepAlive,
    Choke,
    Unchoke,
    Interested,
    NotInterested,
    Have(u32),
    Bitfield(Vec<u8>),
    Request {
        index: u32,
        begin: u32,
        length: u32,
    },
    Piece {
        index: u32,
        begin: u32,
        block: Vec<u8>,
    },
    Cancel {
        index: u32,
        begin: u32,
        length: u32,
    },
}

impl Message {
    /// Short name for logs and error details.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::KeepAlive => "keep-alive",
            Message::Choke => "choke",
            Message::Unchoke => "unchoke",
            Message::Interested => "interested",
            Message::NotInterested => "not_interested",
            Message::Have(_) => "have",
            Message::Bitfield(_) => "bitfield",
            Message::Request { .. } => "request",
            Message::Piece { .. } => "piece",
            Message::Cancel { .. } => "cancel",
        }
    }

    /// Serializes the message including its length prefix.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        let id: u8 = match self {
            Message::KeepAlive => return 0u32.to_be_bytes().to_vec(),
            Message::Choke => 0,
            Message::Unchoke => 1,
            Message::Interested => 2,
            Message::NotInterested => 3,
            Message::Have(index) => {
                payload.extend_from_slice(&index.to_be_bytes());
                4
            }
            Message::Bitfield(bits) => {
                payload.extend_from_slice(bits);
                5
            }
            Message::Request {
                index,
                begin,
                length,
            } => {
                payload.extend_from_slice(&index.to_be_bytes());
                payload.extend_from_slice(&begin.to_be_bytes());
                payload.extend_from_slice(&length.to_be_bytes());
                6
            }
            Message::Piece {
                index,
                begin,
                block,
            } => {
                payload.extend_from_slice(&index.to_be_bytes());
                payload.extend_from_slice(&begin.to_be_bytes());
                payload.extend_from_slice(block);
                7
            }
            Message::Cancel {
                index,
                begin,
                length,
            } => {
                payload.extend_from_slice(&index.to_be_bytes());
                payload.extend_from_slice(&begin.to_be_bytes());
                payload.extend_from_slice(&length.to_be_bytes());
                8
            }
        };

        let mut out = Vec::with_capacity(5 + payload.len());
        out.extend_from_slice(&(payload.len() as u32 + 1).to_be_bytes());
        out.push(id);
        out.extend_from_slice(&payload);
        out
    }

    /// Parses a frame body (id byte plus payload, without the length prefix).
    ///
    /// An empty body is the keep-alive frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Some((&id, payload)) = bytes.split_first() else {
            return Ok(Message::KeepAlive);
        };

        let message = match id {
            0 => Message::Choke,
            1 => Message::Unchoke,
            2 => Message::Interested,
            3 => Message::NotInterested,
            4 => Message::Have(read_u32(payload, 0)?),
            5 => Message::Bitfield(payload.to_vec()),
            6 => Message::Request {
                index: read_u32(payload, 0)?,
                begin: read_u32(payload, 4)?,
                length: read_u32(payload, 8)?,
            },
            7 => {
                let index = read_u32(payload, 0)?;
                let begin = read_u32(payload, 4)?;
                let block = payload
                    .get(8..)
                    .ok_or_else(|| Error::PeerRecv("truncated piece payload".into()))?
                    .to_vec();
                Message::Piece {
                    index,
                    begin,
                    block,
                }
            }
            8 => Message::Cancel {
                index: read_u32(payload, 0)?,
                begin: read_u32(payload, 4)?,
                length: read_u32(payload, 8)?,
            },
            other => return Err(Error::PeerUnknownMessage(other)),
        };
        Ok(message)
    }
}

fn read_u32(payload: &[u8], offset: usize) -> Result<u32> {
    payload
        .get(offset..offset + 4)
        .map(|bytes| u32::from_be_bytes(bytes.try_into().unwrap()))
        .ok_or_else(|| Error::PeerRecv("truncated message payload".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let messages = vec![
            (Message::KeepAlive, vec![0, 0, 0, 0]),
            (Message::Choke, vec![0, 0, 0, 1, 0]),
            (Message::Unchoke, vec![0, 0, 0, 1, 1]),
            (Message::Interested, vec![0, 0, 0, 1, 2]),
            (Message::NotInterested, vec![0, 0, 0, 1, 3]),
            (Message::Have(42), vec![0, 0, 0, 5, 4, 0, 0, 0, 42]),
            (
                Message::Bitfield(vec![1, 2, 3]),
                vec![0, 0, 0, 4, 5, 1, 2, 3],
            ),
            (
                Message::Request {
                    index: 1,
                    begin: 2,
                    length: 16384,
                },
                vec![0, 0, 0, 13, 6, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 64, 0],
            ),
            (
                Message::Piece {
                    index: 1,
                    begin: 2,
                    block: vec![0xaa, 0xbb],
                },
                vec![0, 0, 0, 11, 7, 0, 0, 0, 1, 0, 0, 0, 2, 0xaa, 0xbb],
            ),
            (
                Message::Cancel {
                    index: 1,
                    begin: 2,
                    length: 3,
                },
                vec![0, 0, 0, 13, 8, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3],
            ),
        ];

        for (message, expected_bytes) in messages {
            assert_eq!(message.to_bytes(), expected_bytes);
            assert_eq!(Message::from_bytes(&expected_bytes[4..]).unwrap(), message);
        }
    }

    #[test]
    fn test_empty_body_is_keep_alive() {
        assert_eq!(Message::from_bytes(&[]).unwrap(), Message::KeepAlive);
    }

    #[test]
    fn test_unknown_id_rejected() {
        assert!(matches!(
            Message::from_bytes(&[9]).unwrap_err(),
            Error::PeerUnknownMessage(9)
        ));
        assert!(matches!(
            Message::from_bytes(&[0xff, 1, 2]).unwrap_err(),
            Error::PeerUnknownMessage(0xff)
        ));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        assert!(matches!(
            Message::from_bytes(&[4, 0, 0]).unwrap_err(),
            Error::PeerRecv(_)
        ));
        assert!(matches!(
            Message::from_bytes(&[6, 0, 0, 0, 1, 0, 0, 0, 2]).unwrap_err(),
            Error::PeerRecv(_)
        ));
        assert!(matches!(
            Message::from_bytes(&[7, 0, 0, 0, 1]).unwrap_err(),
            Error::PeerRecv(_)
        ));
    }
}
