//! Tracker communication and peer discovery.
//!
//! A single announce: HTTP GET against the metainfo's `announce` URL, then
//! decode the bencoded body into the re-announce interval and the compact
//! peer list (6 bytes per peer: IPv4 address and big-endian port).

use std::net::{Ipv4Addr, SocketAddrV4};

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::bencode::{BValue, Bencode};
use crate::error::{Error, Result};
use crate::utils;
use crate::{DEFAULT_PORT, PEER_ID};

use super::metainfo::Torrent;

/// What the tracker told us.
#[derive(Debug)]
pub struct TrackerInfo {
    /// Seconds to wait between announces. Advisory; the single-shot
    /// download never re-announces.
    pub interval: u64,
    /// Swarm peers, in the order the tracker listed them.
    pub peers: Vec<SocketAddrV4>,
}

/// Plain query parameters of the announce request. The binary parameters
/// (`info_hash`, `peer_id`) are percent-encoded separately.
#[derive(Debug, Serialize)]
struct TrackerRequest {
    port: u16,
    uploaded: u64,
    downloaded: u64,
    left: u64,
    compact: u8,
}

/// Announces to the torrent's tracker and returns the peer list.
pub async fn get_peers(torrent: &Torrent) -> Result<TrackerInfo> {
    let url = build_announce_url(torrent)?;
    debug!("announcing to {}", url);

    let response = reqwest::get(url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(Error::TrackerHttpFailed)?;
    let body: Bytes = response.bytes().await.map_err(Error::TrackerHttpFailed)?;

    parse_tracker_response(&body)
}

fn build_announce_url(torrent: &Torrent) -> Result<String> {
    reqwest::Url::parse(&torrent.announce)
        .map_err(|e| Error::TrackerBadUrl(format!("{}: {}", torrent.announce, e)))?;

    let request = TrackerRequest {
        port: DEFAULT_PORT,
        uploaded: 0,
        downloaded: 0,
        left: torrent.info.length as u64,
        compact: 1,
    };
    let params =
        serde_urlencoded::to_string(&request).map_err(|e| Error::TrackerBadUrl(e.to_string()))?;

    Ok(format!(
        "{}?{}&info_hash={}&peer_id={}",
        torrent.announce,
        params,
        utils::url_encode(&torrent.info_hash()),
        utils::url_encode(&PEER_ID),
    ))
}

fn parse_tracker_response(body: &[u8]) -> Result<TrackerInfo> {
    let value = Bencode::decode(body).map_err(|e| Error::TrackerMalformedResponse(e.to_string()))?;
    if value.as_dict().is_none() {
        return Err(Error::TrackerMalformedResponse(
            "response is not a dictionary".into(),
        ));
    }

    if let Some(reason) = value.get(b"failure reason") {
        let reason = reason
            .as_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_else(|| "unspecified".into());
        return Err(Error::TrackerRejected(reason));
    }

    let interval = value
        .get(b"interval")
        .and_then(BValue::as_integer)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| Error::TrackerMalformedResponse("missing interval".into()))?;

    let peers_blob = value
        .get(b"peers")
        .and_then(BValue::as_bytes)
        .ok_or_else(|| Error::TrackerMalformedResponse("missing compact peer list".into()))?;
    if peers_blob.len() % 6 != 0 {
        return Err(Error::TrackerMalformedResponse(format!(
            "compact peer list length {} is not a multiple of 6",
            peers_blob.len()
        )));
    }

    let peers = peers_blob
        .chunks_exact(6)
        .map(|chunk| {
            let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
            let port = u16::from_be_bytes([chunk[4], chunk[5]]);
            SocketAddrV4::new(ip, port)
        })
        .collect();

    Ok(TrackerInfo { interval, peers })
}
