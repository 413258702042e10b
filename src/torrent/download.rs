//! Download orchestration.
//!
//! Announces to the tracker, selects the first peer that survives the full
//! connect / handshake / bitfield / unchoke sequence, then pulls pieces
//! sequentially, appending each verified piece to the output file in
//! ascending index order. Any error after selection aborts the download.

use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{Error, Result};

use super::metainfo::Torrent;
use super::peer::Peer;
use super::tracker;

pub struct Downloader {
    /// Shared read-only metainfo.
    torrent: Arc<Torrent>,
    /// Candidate peers, in tracker order.
    peers: Vec<std::net::SocketAddrV4>,
}

impl Downloader {
    /// Contacts the tracker and prepares a download.
    pub async fn new(torrent: Torrent) -> Result<Self> {
        let tracker_info = tracker::get_peers(&torrent).await?;
        info!(
            "tracker returned {} peers (interval {}s)",
            tracker_info.peers.len(),
            tracker_info.interval
        );
        if tracker_info.peers.is_empty() {
            return Err(Error::NoUsablePeers);
        }

        Ok(Self {
            torrent: Arc::new(torrent),
            peers: tracker_info.peers,
        })
    }

    /// Downloads and verifies a single piece.
    pub async fn download_piece(&self, piece_index: usize) -> Result<Vec<u8>> {
        let mut peer = self.select_peer().await?;
        peer.download_piece(piece_index).await
    }

    /// Downloads the whole file to `output`.
    ///
    /// The file is opened once in truncate mode and receives pieces
    /// 0..N in order, so its bytes are exactly the torrent content.
    pub async fn download_all(&self, output: impl AsRef<Path>) -> Result<()> {
        let mut peer = self.select_peer().await?;
        let mut file = File::create(output).await.map_err(Error::OutputIoError)?;

        let total = self.torrent.info.total_pieces();
        for piece_index in 0..total {
            info!("downloading piece {}/{}", piece_index + 1, total);
            let piece = peer.download_piece(piece_index).await?;
            file.write_all(&piece).await.map_err(Error::OutputIoError)?;
        }
        file.flush().await.map_err(Error::OutputIoError)?;

        info!(
            "download complete: {} pieces, {} bytes",
            total, self.torrent.info.length
        );
        Ok(())
    }

    /// Walks the peer list until one completes the whole setup sequence.
    /// Per-peer failures are logged and the next candidate is tried.
    async fn select_peer(&self) -> Result<Peer> {
        for &addr in &self.peers {
            let mut peer = Peer::new(addr, Arc::clone(&self.torrent));
            match Self::prepare_peer(&mut peer).await {
                Ok(()) => {
                    info!("selected peer {}", addr);
                    return Ok(peer);
                }
                Err(e) => warn!("peer {} unusable: {}", addr, e),
            }
        }
        Err(Error::NoUsablePeers)
    }

    async fn prepare_peer(peer: &mut Peer) -> Result<()> {
        peer.connect().await?;
        peer.handshake().await?;
        peer.recv_bitfield().await?;
        peer.ensure_unchoked().await
    }
}
