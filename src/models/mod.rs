//! Record types filled in by the decoder and handed to the storage sink.

pub use peer::*;
pub use peer_up::*;
pub use router::*;
pub use stats::*;

pub(crate) mod peer;
pub(crate) mod peer_up;
pub(crate) mod router;
pub(crate) mod stats;
