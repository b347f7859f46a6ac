//! Wire-format parsers for the BMP common headers, the per-peer header and
//! the message bodies the collector consumes directly.
//!
//! <https://datatracker.ietf.org/doc/html/draft-ietf-grow-bmp-07>

pub use headers::*;
pub use initiation_message::*;
pub use peer_up_notification::*;
pub use stats_report::*;
pub use termination_message::*;
pub use utils::{format_route_distinguisher, v4_mapped_suffix, ReadUtils};

pub(crate) mod headers;
pub(crate) mod initiation_message;
pub(crate) mod peer_up_notification;
pub(crate) mod stats_report;
pub(crate) mod termination_message;
pub(crate) mod utils;
