/*!
`bmp_collector` decodes the BGP Monitoring Protocol (BMP) byte stream that a
monitored router sends to a collector, covering protocol versions 1, 2 and 3
(draft-ietf-grow-bmp-04 through -07).

The crate wraps one reliable, ordered byte source per TCP connection and
turns it into typed records: per-peer metadata, peer up events, statistics
reports, and session initiation/termination information. BGP PDUs carried
inside Route Monitoring and Peer Down messages are *not* parsed here; the
decoder hands the envelope and the remaining byte count to the caller so a
downstream BGP decoder can take over.

# Example

Decoding messages from a live TCP connection:

```no_run
use bmp_collector::{BmpRecord, BmpSession, ByteSource, ParserBmpError, StreamSource, StorageSink};
use bmp_collector::{PeerEntry, PeerUpEvent, RouterEntry, StatsReport};
use std::net::TcpStream;

struct PrintSink;

impl StorageSink for PrintSink {
    fn assign_peer_hash(&self, peer: &mut PeerEntry) {
        // derive an identity from (peer address, route distinguisher)
    }
    fn update_router(&self, router: &RouterEntry) {
        println!("router {} ({})", router.name, router.descr);
    }
    fn add_stats_report(&self, stats: &StatsReport) {
        println!("stats: {} rejected prefixes", stats.prefixes_rejected);
    }
    fn add_peer_up_event(&self, event: &PeerUpEvent) {
        println!("peer up: {}:{}", event.local_ip, event.local_port);
    }
}

let stream = TcpStream::connect("10.0.0.1:5000").unwrap();
let source = StreamSource::new(stream);
let mut session = BmpSession::new(source, PrintSink, "10.0.0.1");

loop {
    match session.recv_message() {
        Ok(BmpRecord::RouteMonitoring { remaining: Some(_) }) => {
            // hand the BGP UPDATE PDU to a BGP parser
            let _pdu = session.take_body().unwrap();
        }
        Ok(BmpRecord::RouteMonitoring { remaining: None }) => {
            // v1/v2 declares no length; the BGP PDU frames itself
            let header = session.source_mut().read_exact(18).unwrap();
            let pdu_len = u16::from_be_bytes([header[16], header[17]]) as usize;
            session.source_mut().drain(pdu_len - 18).unwrap();
        }
        Ok(record) => println!("{:?}", record),
        Err(ParserBmpError::ConnectionClosed) => break,
        Err(e) => {
            eprintln!("session error: {}", e);
            break;
        }
    }
}
```
*/

pub mod error;
pub mod io;
pub mod models;
pub mod parser;
pub mod session;

pub use crate::error::ParserBmpError;
pub use crate::io::{ByteSource, StreamSource};
pub use crate::models::{PeerEntry, PeerUpEvent, RouterEntry, StatsReport};
pub use crate::parser::BmpMsgType;
pub use crate::session::{BmpRecord, BmpSession, SessionState, StorageSink};
