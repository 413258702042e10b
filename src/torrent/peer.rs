//! Peer session: TCP handshake, choke/interest state, and the per-piece
//! block transfer loop.
//!
//! A session owns exactly one socket and is never shared. The socket is
//! closed when the session drops, on every exit path.

use std::net::SocketAddrV4;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{Error, Result};
use crate::utils;
use crate::{PEER_ID, PROTOCOL};

use super::message::Message;
use super::metainfo::Torrent;

/// Transfer unit within a piece: 16 KiB.
pub const BLOCK_SIZE: usize = 16 * 1024;

pub type PeerId = [u8; 20];

#[derive(Debug)]
pub struct Peer {
    addr: SocketAddrV4,
    torrent: Arc<Torrent>,
    stream: Option<TcpStream>,
    /// Remote peer id, learned during the handshake.
    pub peer_id: Option<PeerId>,
    bitfield: Option<Vec<u8>>,
    am_choked: bool,
}

impl Peer {
    pub fn new(addr: SocketAddrV4, torrent: Arc<Torrent>) -> Self {
        Self {
            addr,
            torrent,
            stream: None,
            peer_id: None,
            bitfield: None,
            am_choked: true,
        }
    }

    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    /// Opens the TCP connection.
    pub async fn connect(&mut self) -> Result<()> {
        debug!("connecting to peer {}", self.addr);
        let stream = TcpStream::connect(self.addr)
            .await
            .map_err(Error::PeerConnect)?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Exchanges the fixed 68-byte handshake and records the remote peer id.
    ///
    /// Accepted iff the protocol prefix and the info hash both match.
    pub async fn handshake(&mut self) -> Result<()> {
        let info_hash = self.torrent.info_hash();
        let stream = self.stream_mut()?;

        let mut message = Vec::with_capacity(68);
        message.push(PROTOCOL.len() as u8);
        message.extend_from_slice(PROTOCOL.as_bytes());
        message.extend_from_slice(&[0u8; 8]);
        message.extend_from_slice(&info_hash);
        message.extend_from_slice(&PEER_ID);
        stream.write_all(&message).await.map_err(Error::PeerSend)?;

        let mut response = [0u8; 68];
        stream
            .read_exact(&mut response)
            .await
            .map_err(|e| Error::PeerRecv(e.to_string()))?;

        if response[0] as usize != PROTOCOL.len() || response[1..20] != *PROTOCOL.as_bytes() {
            return Err(Error::PeerHandshakeMismatch(
                "unexpected protocol prefix".into(),
            ));
        }
        if response[28..48] != info_hash {
            return Err(Error::PeerHandshakeMismatch("info hash differs".into()));
        }

        let mut peer_id = [0u8; 20];
        peer_id.copy_from_slice(&response[48..68]);
        self.peer_id = Some(peer_id);
        debug!("handshake complete with {}", self.addr);
        Ok(())
    }

    /// The remote peer id as lowercase hex.
    pub fn peer_id_hex(&self) -> Option<String> {
        self.peer_id.map(hex::encode)
    }

    /// Reads the peer's bitfield, which must be its first real message.
    ///
    /// Keep-alives before it are ignored. Bit `i` is the MSB of byte `i/8`;
    /// bits beyond the last piece must be zero.
    pub async fn recv_bitfield(&mut self) -> Result<()> {
        loop {
            match self.receive_message().await? {
                Message::KeepAlive => continue,
                Message::Bitfield(bits) => {
                    let total = self.torrent.info.total_pieces();
                    let stray = bits
                        .iter()
                        .enumerate()
                        .flat_map(|(i, byte)| (0..8).map(move |bit| (i * 8 + bit, byte & (0x80 >> bit))))
                        .any(|(index, set)| set != 0 && index >= total);
                    if stray {
                        return Err(Error::PeerRecv(
                            "bitfield has bits set beyond the last piece".into(),
                        ));
                    }
                    self.bitfield = Some(bits);
                    return Ok(());
                }
                other => return Err(Error::PeerExpectedBitfield(other.kind().into())),
            }
        }
    }

    /// Whether the peer advertised the given piece.
    pub fn has_piece(&self, index: usize) -> bool {
        match &self.bitfield {
            Some(bits) => bits
                .get(index / 8)
                .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0),
            None => false,
        }
    }

    /// Declares interest and waits until the peer unchokes us.
    pub async fn ensure_unchoked(&mut self) -> Result<()> {
        if !self.am_choked {
            return Ok(());
        }
        self.send_message(&Message::Interested).await?;
        loop {
            match self.receive_message().await? {
                Message::Unchoke => {
                    self.am_choked = false;
                    return Ok(());
                }
                msg => debug!("ignoring {} while waiting for unchoke", msg.kind()),
            }
        }
    }

    /// Downloads and verifies one piece.
    ///
    /// All block requests are written up front; responses are drained into a
    /// buffer indexed by their `begin` offset, so arrival order does not
    /// matter. The assembled piece is hash-checked before it is returned.
    pub async fn download_piece(&mut self, piece_index: usize) -> Result<Vec<u8>> {
        let piece_len = self.torrent.info.piece_size(piece_index)?;
        if !self.has_piece(piece_index) {
            debug!("peer {} did not advertise piece {}", self.addr, piece_index);
        }

        let mut begin = 0;
        while begin < piece_len {
            let length = BLOCK_SIZE.min(piece_len - begin);
            self.send_message(&Message::Request {
                index: piece_index as u32,
                begin: begin as u32,
                length: length as u32,
            })
            .await?;
            begin += length;
        }

        let mut buf = vec![0u8; piece_len];
        let mut received = 0;
        while received < piece_len {
            match self.receive_message().await? {
                Message::Piece {
                    index,
                    begin,
                    block,
                } => {
                    if index as usize != piece_index {
                        return Err(Error::PeerRecv(format!(
                            "got piece {} while downloading piece {}",
                            index, piece_index
                        )));
                    }
                    let begin = begin as usize;
                    let end = begin
                        .checked_add(block.len())
                        .filter(|&end| end <= piece_len)
                        .ok_or_else(|| {
                            Error::PeerRecv(format!(
                                "block at {}+{} overruns a {}-byte piece",
                                begin,
                                block.len(),
                                piece_len
                            ))
                        })?;
                    buf[begin..end].copy_from_slice(&block);
                    received += block.len();
                }
                Message::Choke => return Err(Error::PeerChokedMidPiece),
                Message::KeepAlive | Message::Have(_) => continue,
                msg => debug!("ignoring {} mid-piece", msg.kind()),
            }
        }

        if utils::sha1(&buf) != self.torrent.info.piece_hashes()[piece_index] {
            return Err(Error::PieceHashMismatch(piece_index));
        }
        Ok(buf)
    }

    /// Writes one framed message to the peer.
    pub async fn send_message(&mut self, message: &Message) -> Result<()> {
        let bytes = message.to_bytes();
        self.stream_mut()?
            .write_all(&bytes)
            .await
            .map_err(Error::PeerSend)
    }

    /// Reads one framed message, looping internally until the length prefix
    /// and the full body have arrived.
    pub async fn receive_message(&mut self) -> Result<Message> {
        let stream = self.stream_mut()?;

        let mut len_bytes = [0u8; 4];
        stream
            .read_exact(&mut len_bytes)
            .await
            .map_err(|e| Error::PeerRecv(e.to_string()))?;
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len == 0 {
            return Ok(Message::KeepAlive);
        }

        let mut body = vec![0u8; len];
        stream
            .read_exact(&mut body)
            .await
            .map_err(|e| Error::PeerRecv(e.to_string()))?;
        Message::from_bytes(&body)
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::PeerSocket("not connected".into()))
    }
}
