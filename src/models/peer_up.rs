use std::net::IpAddr;

/// Peer Up notification, emitted once per successfully decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerUpEvent {
    /// Identity of the peer record current when the event was decoded.
    pub peer_hash_id: [u8; 16],
    pub timestamp_secs: u32,
    /// Local address of the monitored router's side of the BGP session.
    pub local_ip: IpAddr,
    pub local_port: u16,
    pub remote_port: u16,
}
