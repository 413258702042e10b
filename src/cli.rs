use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line arguments for the BitTorrent client
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a bencoded string and print it as JSON
    Decode {
        /// The bencoded value to decode
        input: String,
    },
    /// Print tracker URL, length, info hash and piece hashes of a torrent
    Info {
        /// Path to the torrent file
        path: PathBuf,
    },
    /// Print the peers reported by the tracker, one ip:port per line
    Peers {
        /// Path to the torrent file
        path: PathBuf,
    },
    /// Handshake with a peer and print its peer id
    Handshake {
        /// Path to the torrent file
        path: PathBuf,
        /// Peer address as ip:port
        peer: String,
    },
    /// Download a single verified piece
    #[command(name = "download_piece")]
    DownloadPiece {
        /// Where to write the piece bytes
        #[arg(short)]
        output: PathBuf,
        /// Path to the torrent file
        path: PathBuf,
        /// Zero-based piece index
        piece_index: usize,
    },
    /// Download the complete file
    Download {
        /// Where to write the file
        #[arg(short)]
        output: PathBuf,
        /// Path to the torrent file
        path: PathBuf,
    },
}

impl Args {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
