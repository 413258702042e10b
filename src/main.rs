use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use bitleech::bencode::Bencode;
use bitleech::error::Error;
use bitleech::torrent::download::Downloader;
use bitleech::torrent::metainfo::Torrent;
use bitleech::torrent::peer::Peer;
use bitleech::torrent::tracker;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Decode { input } => {
            let value = Bencode::decode(input.as_bytes())?;
            println!("{}", value.to_json());
        }
        cli::Command::Info { path } => {
            let torrent = Torrent::from_file(path)?;
            println!("{}", torrent);
        }
        cli::Command::Peers { path } => {
            let torrent = Torrent::from_file(path)?;
            let tracker_info = tracker::get_peers(&torrent).await?;
            for peer in tracker_info.peers {
                println!("{}", peer);
            }
        }
        cli::Command::Handshake { path, peer } => {
            let torrent = Torrent::from_file(path)?;
            let addr = peer
                .parse()
                .map_err(|e| Error::PeerSocket(format!("{}: {}", peer, e)))?;

            let mut peer = Peer::new(addr, Arc::new(torrent));
            peer.connect().await?;
            peer.handshake().await?;
            let peer_id = peer
                .peer_id_hex()
                .ok_or_else(|| anyhow::anyhow!("no peer id received"))?;
            println!("Peer ID: {}", peer_id);
        }
        cli::Command::DownloadPiece {
            output,
            path,
            piece_index,
        } => {
            let torrent = Torrent::from_file(path)?;
            let downloader = Downloader::new(torrent).await?;
            let piece = downloader.download_piece(piece_index).await?;
            tokio::fs::write(&output, piece)
                .await
                .map_err(Error::OutputIoError)?;
            info!("piece {} saved to {}", piece_index, output.display());
        }
        cli::Command::Download { output, path } => {
            let torrent = Torrent::from_file(path)?;
            let downloader = Downloader::new(torrent).await?;
            downloader.download_all(&output).await?;
            info!("saved to {}", output.display());
        }
    }

    Ok(())
}
