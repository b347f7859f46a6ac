use crate::error::ParserBmpError;
use crate::io::ByteSource;
use crate::models::{PeerEntry, StatsReport};
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};

/// Stats counter types recognized by the collector.
///
/// Each maps to one slot of [`StatsReport`]; anything else is consumed and
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum BmpStatsType {
    PrefixesRejected = 0,
    DuplicatePrefix = 1,
    DuplicateWithdraw = 2,
    InvalidClusterList = 3,
    InvalidAsPathLoop = 4,
    InvalidOriginatorId = 5,
    InvalidAsConfedLoop = 6,
    RoutesAdjRibIn = 7,
    RoutesLocRib = 8,
    #[num_enum(catch_all)]
    Other(u16) = 65535,
}

/// Decode a Statistics Report body: a 4-byte counter count followed by that
/// many (type, length, value) records.
///
/// Values of length 4 or 8 land in the slot named by their type tag; any
/// other length is skipped without aborting the message. The aggregated
/// report carries the identity of the current peer record.
pub fn parse_stats_report<B: ByteSource>(
    source: &mut B,
    peer: &PeerEntry,
) -> Result<StatsReport, ParserBmpError> {
    let stats_count = source.read_u32()?;

    debug!("{}: stats report count: {}", peer.peer_addr, stats_count);

    let mut stats = StatsReport {
        peer_hash_id: peer.hash_id,
        ..Default::default()
    };

    for i in 0..stats_count {
        let stat_type = source.read_u16()?;
        let stat_len = source.read_u16()?;

        debug!("stats {}: type = {} len = {}", i, stat_type, stat_len);

        match stat_len {
            4 | 8 => {
                let value = if stat_len == 4 {
                    source.read_u32()? as u64
                } else {
                    source.read_u64()?
                };
                match BmpStatsType::from(stat_type) {
                    BmpStatsType::PrefixesRejected => stats.prefixes_rejected = value as u32,
                    BmpStatsType::DuplicatePrefix => stats.known_dup_prefixes = value as u32,
                    BmpStatsType::DuplicateWithdraw => stats.known_dup_withdraws = value as u32,
                    BmpStatsType::InvalidClusterList => stats.invalid_cluster_list = value as u32,
                    BmpStatsType::InvalidAsPathLoop => stats.invalid_as_path_loop = value as u32,
                    BmpStatsType::InvalidOriginatorId => stats.invalid_originator_id = value as u32,
                    BmpStatsType::InvalidAsConfedLoop => stats.invalid_as_confed_loop = value as u32,
                    BmpStatsType::RoutesAdjRibIn => stats.routes_adj_rib_in = value,
                    BmpStatsType::RoutesLocRib => stats.routes_loc_rib = value,
                    BmpStatsType::Other(_) => {}
                }
            }
            _ => {
                debug!(
                    "skipping stats counter {}: length {} is not expected",
                    stat_type, stat_len
                );
                source.drain(stat_len as usize)?;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::StreamSource;
    use bytes::{BufMut, BytesMut};

    #[test]
    fn test_counter_and_gauge() {
        let mut data = BytesMut::new();
        data.put_u32(2);
        data.put_u16(0); // prefixes rejected
        data.put_u16(4);
        data.put_u32(7);
        data.put_u16(7); // routes in Adj-RIB-In
        data.put_u16(8);
        data.put_u64(42);

        let mut source = StreamSource::new(data.as_ref());
        let stats = parse_stats_report(&mut source, &PeerEntry::default()).unwrap();
        assert_eq!(stats.prefixes_rejected, 7);
        assert_eq!(stats.routes_adj_rib_in, 42);
        assert_eq!(stats.known_dup_prefixes, 0);
    }

    #[test]
    fn test_unknown_type_is_consumed() {
        let mut data = BytesMut::new();
        data.put_u32(2);
        data.put_u16(500);
        data.put_u16(4);
        data.put_u32(0xDEADBEEF);
        data.put_u16(8); // routes in Loc-RIB
        data.put_u16(8);
        data.put_u64(11);

        let mut source = StreamSource::new(data.as_ref());
        let stats = parse_stats_report(&mut source, &PeerEntry::default()).unwrap();
        assert_eq!(stats.routes_loc_rib, 11);
    }

    #[test]
    fn test_unexpected_length_is_skipped() {
        let mut data = BytesMut::new();
        data.put_u32(2);
        data.put_u16(0);
        data.put_u16(6); // neither 4 nor 8
        data.put_slice(&[1, 2, 3, 4, 5, 6]);
        data.put_u16(2); // duplicate withdraws
        data.put_u16(4);
        data.put_u32(3);

        let mut source = StreamSource::new(data.as_ref());
        let stats = parse_stats_report(&mut source, &PeerEntry::default()).unwrap();
        assert_eq!(stats.prefixes_rejected, 0);
        assert_eq!(stats.known_dup_withdraws, 3);
    }

    #[test]
    fn test_zero_length_counter() {
        let mut data = BytesMut::new();
        data.put_u32(1);
        data.put_u16(0);
        data.put_u16(0);

        let mut source = StreamSource::new(data.as_ref());
        let stats = parse_stats_report(&mut source, &PeerEntry::default()).unwrap();
        assert_eq!(stats, StatsReport::default());
    }

    #[test]
    fn test_truncated_counter_value() {
        let mut data = BytesMut::new();
        data.put_u32(1);
        data.put_u16(0);
        data.put_u16(4);
        data.put_u16(0); // only half the value

        let mut source = StreamSource::new(data.as_ref());
        assert!(parse_stats_report(&mut source, &PeerEntry::default()).is_err());
    }
}
