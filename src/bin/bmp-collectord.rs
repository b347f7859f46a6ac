//! Minimal BMP collector daemon: accepts router connections, decodes their
//! message streams and logs the resulting records. Storage behind the sink
//! trait is left to real deployments.

use bmp_collector::{
    BmpRecord, BmpSession, ByteSource, ParserBmpError, PeerEntry, PeerUpEvent, RouterEntry,
    StatsReport, StorageSink, StreamSource,
};
use log::{error, info};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::{TcpListener, TcpStream};
use std::thread;

struct LogSink;

impl StorageSink for LogSink {
    fn assign_peer_hash(&self, peer: &mut PeerEntry) {
        let mut hasher = DefaultHasher::new();
        peer.peer_addr.hash(&mut hasher);
        peer.peer_rd.hash(&mut hasher);
        let digest = hasher.finish().to_be_bytes();
        peer.hash_id[..8].copy_from_slice(&digest);
        peer.hash_id[8..].copy_from_slice(&digest);
    }

    fn update_router(&self, router: &RouterEntry) {
        info!(
            "router {}: name={:?} descr={:?}",
            router.src_addr, router.name, router.descr
        );
    }

    fn add_stats_report(&self, stats: &StatsReport) {
        info!(
            "stats: rejected={} adj-rib-in={} loc-rib={}",
            stats.prefixes_rejected, stats.routes_adj_rib_in, stats.routes_loc_rib
        );
    }

    fn add_peer_up_event(&self, event: &PeerUpEvent) {
        info!(
            "peer up: local {}:{} remote port {}",
            event.local_ip, event.local_port, event.remote_port
        );
    }
}

/// Read one self-framed BGP PDU (marker, length, payload) and discard it.
/// Used for v1/v2 bodies, which the session cannot skip itself.
fn consume_bgp_pdu<B: ByteSource>(source: &mut B) -> Result<usize, ParserBmpError> {
    let header = source.read_exact(18)?;
    let pdu_len = u16::from_be_bytes([header[16], header[17]]) as usize;
    if pdu_len < 19 {
        return Err(ParserBmpError::CorruptedBmpMessage);
    }
    source.drain(pdu_len - 18)?;
    Ok(pdu_len)
}

fn handle_connection(stream: TcpStream) {
    let src_addr = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(e) => {
            error!("failed to resolve peer address: {}", e);
            return;
        }
    };
    info!("{}: connection accepted", src_addr);

    let mut session = BmpSession::new(StreamSource::new(stream), LogSink, src_addr.clone());
    loop {
        match session.recv_message() {
            Ok(BmpRecord::RouteMonitoring { remaining: Some(_) }) => {
                // a BGP UPDATE parser would take over here
                match session.take_body() {
                    Ok(pdu) => info!("{}: route monitoring, {} byte PDU", src_addr, pdu.len()),
                    Err(e) => {
                        error!("{}: {}", src_addr, e);
                        break;
                    }
                }
            }
            Ok(BmpRecord::RouteMonitoring { remaining: None }) => {
                // v1/v2 declares no length; the BGP PDU frames itself
                match consume_bgp_pdu(session.source_mut()) {
                    Ok(len) => info!("{}: route monitoring, {} byte PDU", src_addr, len),
                    Err(e) => {
                        error!("{}: {}", src_addr, e);
                        break;
                    }
                }
            }
            Ok(BmpRecord::PeerDown { remaining: None }) => {
                error!(
                    "{}: v1/v2 peer down carries an unframed body this daemon cannot skip, closing",
                    src_addr
                );
                break;
            }
            Ok(BmpRecord::Termination) => {
                let router = session.router();
                info!(
                    "{}: session terminated: {} ({})",
                    src_addr, router.term_reason_text, router.term_reason_code
                );
            }
            Ok(record) => info!("{}: {:?}", src_addr, record),
            Err(ParserBmpError::ConnectionClosed) => {
                info!("{}: connection closed", src_addr);
                break;
            }
            Err(e) => {
                error!("{}: {}", src_addr, e);
                break;
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let listen_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:5000".to_string());
    let listener = TcpListener::bind(&listen_addr)
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", listen_addr, e));
    info!("listening on {}", listen_addr);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                thread::spawn(move || handle_connection(stream));
            }
            Err(e) => error!("error accepting connection: {}", e),
        }
    }
}
