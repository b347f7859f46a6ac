/// Aggregated Statistics Report, one per message.
///
/// Counters the message did not carry stay zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsReport {
    /// Identity of the peer record current when the report was decoded.
    pub peer_hash_id: [u8; 16],
    pub prefixes_rejected: u32,
    pub known_dup_prefixes: u32,
    pub known_dup_withdraws: u32,
    pub invalid_cluster_list: u32,
    pub invalid_as_path_loop: u32,
    pub invalid_originator_id: u32,
    pub invalid_as_confed_loop: u32,
    pub routes_adj_rib_in: u64,
    pub routes_loc_rib: u64,
}
