use crate::error::ParserBmpError;
use crate::models::PeerEntry;
use crate::parser::utils::{format_route_distinguisher, v4_mapped_suffix, ReadUtils};
use bytes::{Buf, Bytes};
use chrono::Utc;
use log::debug;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// v3 common header length after the version byte.
pub const BMP_HDRV3_LEN: usize = 5;
/// v1/v2 common header length after the version byte.
pub const BMP_HDRV1V2_LEN: usize = 43;
/// v3 per-peer header length.
pub const BMP_PEER_HDR_LEN: usize = 42;

/// Peer type value marking an L3VPN peer.
const PEER_TYPE_L3VPN: u8 = 1;
/// Peer flag: V bit, address is IPv6.
const PEER_FLAG_V: u8 = 0x80;
/// Peer flag: L bit, routes are post-policy (v3) or Loc-RIB (v1/v2).
const PEER_FLAG_L: u8 = 0x40;

/// BMP message type, as carried in the v3 common header and the v1/v2
/// fixed header.
///
/// ```text
///       *  Type = 0: Route Monitoring
///       *  Type = 1: Statistics Report
///       *  Type = 2: Peer Down Notification
///       *  Type = 3: Peer Up Notification
///       *  Type = 4: Initiation Message
///       *  Type = 5: Termination Message
/// ```
///
/// Values outside this set are not rejected outright: the session logs
/// them, drains the declared body, and resumes at the next common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum BmpMsgType {
    RouteMonitoring = 0,
    StatisticsReport = 1,
    PeerDownNotification = 2,
    PeerUpNotification = 3,
    InitiationMessage = 4,
    TerminationMessage = 5,
}

/// Decoded v3 common header.
///
/// ```text
///       0                   1                   2                   3
///       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |    Version    |   Msg. Type   |        Message Length
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///                      |
///      +-+-+-+-+-+-+-+-+
/// ```
///
/// The wire length field counts the whole message including the version
/// byte and this header; `body_len` has both already subtracted, so it is
/// the number of bytes still to be consumed for the current message.
#[derive(Debug, Clone, Copy)]
pub struct BmpCommonHeader {
    pub version: u8,
    pub msg_type: u8,
    pub body_len: u32,
}

/// Parse the five v3 common-header bytes that follow the version byte.
pub fn parse_v3_common_header(data: &mut Bytes) -> Result<BmpCommonHeader, ParserBmpError> {
    let msg_type = data.read_u8()?;
    let msg_len = data.read_u32()?;

    let body_len = msg_len
        .checked_sub(1 + BMP_HDRV3_LEN as u32)
        .ok_or(ParserBmpError::CorruptedBmpMessage)?;

    debug!("BMP v3: type = {:#x} len = {}", msg_type, msg_len);

    Ok(BmpCommonHeader {
        version: 3,
        msg_type,
        body_len,
    })
}

/// Parse the v3 per-peer header into the session's current peer record.
///
/// ```text
///       0                   1                   2                   3
///       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |   Peer Type   |  Peer Flags   |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |         Peer Distinguisher (present based on peer type)       |
///      |                                                               |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                 Peer Address (16 bytes)                       |
///      ~                                                               ~
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                           Peer AS                             |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                         Peer BGP ID                           |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                    Timestamp (seconds)                        |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                  Timestamp (microseconds)                     |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
pub fn parse_per_peer_header(data: &mut Bytes, peer: &mut PeerEntry) -> Result<(), ParserBmpError> {
    let (peer_type, peer_flags) = parse_peer_fields(data, peer)?;

    peer.is_pre_policy = peer_flags & PEER_FLAG_L == 0;
    peer.is_l3vpn = peer_type == PEER_TYPE_L3VPN;

    if peer.is_pre_policy {
        debug!("{}: msg is for PRE-POLICY Adj-RIB-In", peer.peer_addr);
    } else {
        debug!("{}: msg is for POST-POLICY Adj-RIB-In", peer.peer_addr);
    }

    Ok(())
}

/// Parse the v1/v2 fixed header that follows the version byte. It carries
/// the message type together with the same embedded peer block the v3
/// per-peer header uses; there is no length field, the body length is
/// implicit in the message type.
///
/// Returns the message type byte.
pub fn parse_v1v2_common_header(
    data: &mut Bytes,
    peer: &mut PeerEntry,
) -> Result<u8, ParserBmpError> {
    let msg_type = data.read_u8()?;
    let (_peer_type, peer_flags) = parse_peer_fields(data, peer)?;

    // pre/post-policy tracking arrived with v3
    if peer_flags & PEER_FLAG_L == 0 {
        debug!("{}: msg is for Adj-RIB-In", peer.peer_addr);
    } else {
        debug!("{}: msg is for Loc-RIB", peer.peer_addr);
    }

    peer.is_l3vpn = msg_type == 1;

    Ok(msg_type)
}

/// Decode the peer block shared by the v1/v2 fixed header and the v3
/// per-peer header: type, flags, distinguisher, address, AS, BGP ID and
/// timestamp. Returns the raw type and flag bytes for the version-specific
/// callers to interpret.
fn parse_peer_fields(data: &mut Bytes, peer: &mut PeerEntry) -> Result<(u8, u8), ParserBmpError> {
    let peer_type = data.read_u8()?;
    let peer_flags = data.read_u8()?;

    let mut peer_dist_id = [0u8; 8];
    data.read_n_bytes(8)?.copy_to_slice(&mut peer_dist_id);

    let mut peer_addr = [0u8; 16];
    data.read_n_bytes(16)?.copy_to_slice(&mut peer_addr);

    peer.is_ipv4 = peer_flags & PEER_FLAG_V == 0;
    peer.peer_addr = if peer.is_ipv4 {
        IpAddr::V4(v4_mapped_suffix(&peer_addr))
    } else {
        IpAddr::V6(Ipv6Addr::from(peer_addr))
    };

    peer.peer_rd = format_route_distinguisher(&peer_dist_id);
    peer.peer_as = data.read_u32()? as i64;
    peer.peer_bgp_id = Ipv4Addr::from(data.read_u32()?);

    let ts_secs = data.read_u32()?;
    let _ts_usecs = data.read_u32()?;
    peer.timestamp_secs = if ts_secs != 0 {
        ts_secs
    } else {
        Utc::now().timestamp() as u32
    };

    debug!(
        "peer address = {} AS = {} RD = {}",
        peer.peer_addr,
        peer.peer_as_hex(),
        peer.peer_rd
    );

    Ok((peer_type, peer_flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn encode_peer_block(flags: u8, addr: &[u8; 16], asn: u32, ts: u32) -> BytesMut {
        let mut data = BytesMut::new();
        data.put_u8(0); // peer type
        data.put_u8(flags);
        data.put_slice(&[0u8; 8]); // distinguisher
        data.put_slice(addr);
        data.put_u32(asn);
        data.put_slice(&[192, 168, 0, 1]); // BGP ID
        data.put_u32(ts);
        data.put_u32(0); // microseconds
        data
    }

    #[test]
    fn test_parse_v3_common_header() {
        let mut data = BytesMut::new();
        data.put_u8(1); // stats report
        data.put_u32(48);

        let header = parse_v3_common_header(&mut data.freeze()).unwrap();
        assert_eq!(header.msg_type, 1);
        assert_eq!(header.body_len, 42);
    }

    #[test]
    fn test_v3_length_below_header_size() {
        let mut data = BytesMut::new();
        data.put_u8(1);
        data.put_u32(4);

        assert!(matches!(
            parse_v3_common_header(&mut data.freeze()),
            Err(ParserBmpError::CorruptedBmpMessage)
        ));
    }

    #[test]
    fn test_parse_peer_header_ipv4() {
        let mut addr = [0u8; 16];
        addr[10] = 0xFF;
        addr[11] = 0xFF;
        addr[12..].copy_from_slice(&[10, 0, 0, 1]);

        let mut peer = PeerEntry::default();
        let mut data = encode_peer_block(0, &addr, 65000, 1700000000).freeze();
        parse_per_peer_header(&mut data, &mut peer).unwrap();

        assert!(peer.is_ipv4);
        assert_eq!(peer.peer_addr.to_string(), "10.0.0.1");
        assert_eq!(peer.peer_as, 65000);
        assert_eq!(peer.peer_as_hex(), "0x0000fde8");
        assert_eq!(peer.peer_bgp_id.to_string(), "192.168.0.1");
        assert_eq!(peer.timestamp_secs, 1700000000);
        assert!(peer.is_pre_policy);
        assert!(!peer.is_l3vpn);
    }

    #[test]
    fn test_parse_peer_header_ipv6_post_policy() {
        let addr: [u8; 16] = [
            0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x42,
        ];

        let mut peer = PeerEntry::default();
        let mut data = encode_peer_block(PEER_FLAG_V | PEER_FLAG_L, &addr, 3356, 1).freeze();
        parse_per_peer_header(&mut data, &mut peer).unwrap();

        assert!(!peer.is_ipv4);
        assert_eq!(peer.peer_addr.to_string(), "2001:db8::42");
        assert!(!peer.is_pre_policy);
    }

    #[test]
    fn test_zero_timestamp_falls_back_to_now() {
        let mut peer = PeerEntry::default();
        let mut data = encode_peer_block(0, &[0u8; 16], 1, 0).freeze();
        parse_per_peer_header(&mut data, &mut peer).unwrap();

        let now = Utc::now().timestamp() as u32;
        assert!(now - peer.timestamp_secs < 5);
    }

    #[test]
    fn test_parse_v1v2_header_marks_l3vpn_from_type() {
        let mut peer = PeerEntry::default();
        let mut data = BytesMut::new();
        data.put_u8(1); // stats report
        data.extend_from_slice(&encode_peer_block(0, &[0u8; 16], 13335, 5));

        let msg_type = parse_v1v2_common_header(&mut data.freeze(), &mut peer).unwrap();
        assert_eq!(msg_type, 1);
        assert!(peer.is_l3vpn);
        assert_eq!(peer.peer_as, 13335);
    }

    #[test]
    fn test_truncated_peer_header() {
        let mut peer = PeerEntry::default();
        let mut data = Bytes::from_static(&[0, 0, 1, 2, 3]);
        assert!(matches!(
            parse_per_peer_header(&mut data, &mut peer),
            Err(ParserBmpError::CorruptedBmpMessage)
        ));
    }
}
