use std::net::{IpAddr, Ipv4Addr};

/// The BGP peer the current message concerns.
///
/// One instance lives on each session and is overwritten as every
/// peer-bearing message arrives; its identity is the (peer address, route
/// distinguisher) pair. The `hash_id` is opaque to the decoder and assigned
/// through the storage sink before any dependent record is built.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerEntry {
    /// Opaque identity assigned by the storage layer.
    pub hash_id: [u8; 16],
    pub peer_addr: IpAddr,
    pub is_ipv4: bool,
    /// Peer AS number, widened from the 4-byte wire field.
    pub peer_as: i64,
    pub peer_bgp_id: Ipv4Addr,
    /// Route distinguisher, formatted by its type field.
    pub peer_rd: String,
    pub is_l3vpn: bool,
    /// v3 only: whether routes are reported before inbound policy.
    pub is_pre_policy: bool,
    /// Advertised timestamp, or wall-clock time when the wire field is zero.
    pub timestamp_secs: u32,
}

impl Default for PeerEntry {
    fn default() -> Self {
        PeerEntry {
            hash_id: [0u8; 16],
            peer_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            is_ipv4: true,
            peer_as: 0,
            peer_bgp_id: Ipv4Addr::UNSPECIFIED,
            peer_rd: String::new(),
            is_l3vpn: false,
            is_pre_policy: true,
            timestamp_secs: 0,
        }
    }
}

impl PeerEntry {
    /// Hex rendering of the AS field, two 16-bit halves.
    pub fn peer_as_hex(&self) -> String {
        format!(
            "0x{:04x}{:04x}",
            (self.peer_as >> 16) & 0xffff,
            self.peer_as & 0xffff
        )
    }
}
