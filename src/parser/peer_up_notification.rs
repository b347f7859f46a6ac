use crate::error::ParserBmpError;
use crate::io::ByteSource;
use crate::models::{PeerEntry, PeerUpEvent};
use crate::parser::utils::v4_mapped_suffix;
use bytes::Buf;
use log::warn;
use std::net::{IpAddr, Ipv6Addr};

/// Fixed part of a Peer Up body: 16-byte local address plus both ports.
pub const BMP_PEER_UP_FIXED_LEN: usize = 20;

/// Decode the fixed part of a Peer Up notification.
///
/// The local address is interpreted with the same V-flag rule as the peer
/// address: the current peer's address family decides. Bytes past the fixed
/// part (the embedded OPEN PDUs) are left in the source for the caller.
///
/// For v3 messages `body_len` is the declared body size after the per-peer
/// header; when it cannot hold the fixed part the body is drained so the
/// stream stays aligned on the next message, and no event is returned.
pub fn parse_peer_up_notification<B: ByteSource>(
    source: &mut B,
    peer: &PeerEntry,
    body_len: Option<u32>,
) -> Result<Option<PeerUpEvent>, ParserBmpError> {
    if let Some(len) = body_len {
        if (len as usize) < BMP_PEER_UP_FIXED_LEN {
            warn!(
                "{}: peer up header too short ({} of {} bytes), skipping message",
                peer.peer_addr, len, BMP_PEER_UP_FIXED_LEN
            );
            source.drain(len as usize)?;
            return Ok(None);
        }
    }

    let mut local_addr = [0u8; 16];
    source
        .read_exact(16)
        .map_err(ParserBmpError::into_mid_message)?
        .copy_to_slice(&mut local_addr);

    let local_ip = if peer.is_ipv4 {
        IpAddr::V4(v4_mapped_suffix(&local_addr))
    } else {
        IpAddr::V6(Ipv6Addr::from(local_addr))
    };

    let local_port = source.read_u16()?;
    let remote_port = source.read_u16()?;

    Ok(Some(PeerUpEvent {
        peer_hash_id: peer.hash_id,
        timestamp_secs: peer.timestamp_secs,
        local_ip,
        local_port,
        remote_port,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::StreamSource;
    use bytes::{BufMut, BytesMut};

    fn v4_mapped(a: u8, b: u8, c: u8, d: u8) -> [u8; 16] {
        let mut addr = [0u8; 16];
        addr[10] = 0xFF;
        addr[11] = 0xFF;
        addr[12..].copy_from_slice(&[a, b, c, d]);
        addr
    }

    #[test]
    fn test_parse_peer_up_ipv4() {
        let mut data = BytesMut::new();
        data.put_slice(&v4_mapped(10, 0, 0, 2));
        data.put_u16(179);
        data.put_u16(46953);

        let peer = PeerEntry {
            hash_id: [7u8; 16],
            timestamp_secs: 1700000000,
            ..Default::default()
        };

        let mut source = StreamSource::new(data.as_ref());
        let event = parse_peer_up_notification(&mut source, &peer, Some(20))
            .unwrap()
            .unwrap();
        assert_eq!(event.local_ip.to_string(), "10.0.0.2");
        assert_eq!(event.local_port, 179);
        assert_eq!(event.remote_port, 46953);
        assert_eq!(event.peer_hash_id, [7u8; 16]);
        assert_eq!(event.timestamp_secs, 1700000000);
    }

    #[test]
    fn test_short_body_is_drained() {
        let mut data = BytesMut::new();
        data.put_slice(&[0xAA; 10]); // declared body, too small
        data.put_u8(0x42); // first byte of the next message

        let mut source = StreamSource::new(data.as_ref());
        let result =
            parse_peer_up_notification(&mut source, &PeerEntry::default(), Some(10)).unwrap();
        assert!(result.is_none());
        assert_eq!(source.read_u8().unwrap(), 0x42);
    }
}
