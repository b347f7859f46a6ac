//! Per-connection decoding session.
//!
//! One [`BmpSession`] owns one byte source and processes messages strictly
//! in arrival order; the surrounding listener may run many sessions in
//! parallel, one per connection, sharing nothing but the storage sink.

use crate::error::ParserBmpError;
use crate::io::ByteSource;
use crate::models::{PeerEntry, PeerUpEvent, RouterEntry, StatsReport};
use crate::parser::{
    parse_initiation_message, parse_peer_up_notification, parse_per_peer_header,
    parse_stats_report, parse_termination_message, parse_v1v2_common_header,
    parse_v3_common_header, BmpMsgType, BMP_HDRV1V2_LEN, BMP_HDRV3_LEN, BMP_PEER_HDR_LEN,
    BMP_PEER_UP_FIXED_LEN, INIT_TERM_MAX_LEN,
};
use bytes::{Buf, Bytes};
use log::{debug, warn};

/// Destination for completed records.
///
/// Implementations are shared across sessions running on different threads,
/// so every method takes `&self`; interior synchronization is the
/// implementor's concern. All methods are idempotent at the contract level.
pub trait StorageSink {
    /// Fill in `peer.hash_id` from the peer's identity (address, route
    /// distinguisher). Called after every parsed peer header, before any
    /// record referencing the peer is built.
    fn assign_peer_hash(&self, peer: &mut PeerEntry);
    fn update_router(&self, router: &RouterEntry);
    fn add_stats_report(&self, stats: &StatsReport);
    fn add_peer_up_event(&self, event: &PeerUpEvent);
}

impl<S: StorageSink + ?Sized> StorageSink for &S {
    fn assign_peer_hash(&self, peer: &mut PeerEntry) {
        (**self).assign_peer_hash(peer)
    }
    fn update_router(&self, router: &RouterEntry) {
        (**self).update_router(router)
    }
    fn add_stats_report(&self, stats: &StatsReport) {
        (**self).add_stats_report(stats)
    }
    fn add_peer_up_event(&self, event: &PeerUpEvent) {
        (**self).add_peer_up_event(event)
    }
}

/// Where the session currently is inside a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    ExpectVersion,
    ExpectCommonHeader,
    ExpectPeerHeader,
    ExpectBody,
    /// Terminal: orderly close, fatal I/O, unsupported version, or a failed
    /// mandatory header read.
    Closed,
}

/// One decoded message, as seen by the caller.
///
/// `RouteMonitoring` and `PeerDown` are envelopes: their BGP PDU stays in
/// the byte source. For v3 messages `remaining` is the PDU size and
/// [`BmpSession::take_body`] (or simply the next
/// [`BmpSession::recv_message`]) consumes it. For v1/v2 messages
/// (`remaining` is `None`) the wire format has no length field and the
/// body frames itself; it must be consumed through
/// [`BmpSession::source_mut`] before the next message can be read.
#[derive(Debug)]
pub enum BmpRecord {
    RouteMonitoring { remaining: Option<u32> },
    PeerDown { remaining: Option<u32> },
    StatsReport(StatsReport),
    PeerUp(PeerUpEvent),
    Initiation,
    Termination,
    /// v3 message type outside the recognized set; its body was drained.
    Unknown { msg_type: u8 },
    /// A recognized message whose body could not be decoded (short peer up
    /// header, oversized initiation/termination); the stream is realigned.
    Malformed { msg_type: u8 },
}

/// Decoder for one monitored-router connection.
pub struct BmpSession<B, S> {
    source: B,
    sink: S,
    router: RouterEntry,
    peer: PeerEntry,
    state: SessionState,
    /// Bytes of the current v3 message left in the source for the caller.
    pending_body: u32,
    /// A v1/v2 body with no length field is sitting in the source; only
    /// the caller can consume it.
    pending_unframed: bool,
}

impl<B: ByteSource, S: StorageSink> BmpSession<B, S> {
    pub fn new(source: B, sink: S, src_addr: impl Into<String>) -> Self {
        BmpSession {
            source,
            sink,
            router: RouterEntry::new(src_addr),
            peer: PeerEntry::default(),
            state: SessionState::ExpectVersion,
            pending_body: 0,
            pending_unframed: false,
        }
    }

    /// The router record for this connection.
    pub fn router(&self) -> &RouterEntry {
        &self.router
    }

    /// The peer record populated by the most recent peer header.
    pub fn peer(&self) -> &PeerEntry {
        &self.peer
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read the undelivered remainder of the current v3 message (the BGP
    /// PDU of a Route Monitoring or Peer Down envelope, or the OPEN PDUs of
    /// a Peer Up). Empty when nothing is pending. Callers that skip this
    /// are still safe: the next [`recv_message`](Self::recv_message) drains
    /// any leftover before reading the next header.
    ///
    /// v1/v2 envelopes declare no length, so their bodies are not reachable
    /// here; consume them from [`source_mut`](Self::source_mut) instead.
    pub fn take_body(&mut self) -> Result<Bytes, ParserBmpError> {
        let n = self.pending_body as usize;
        self.pending_body = 0;
        self.source
            .read_exact(n)
            .map_err(ParserBmpError::into_mid_message)
    }

    /// Direct access to the underlying byte source.
    ///
    /// v1/v2 Route Monitoring, Peer Down and Peer Up messages carry bodies
    /// with no length field, so the session cannot skip them on its own;
    /// the caller must read the self-framed BGP PDUs from the source before
    /// the next [`recv_message`](Self::recv_message). Taking the source
    /// this way tells the session the stream position is being handled;
    /// receiving the next message with such a body still unclaimed is an
    /// error, since framing would be lost silently otherwise.
    pub fn source_mut(&mut self) -> &mut B {
        self.pending_unframed = false;
        &mut self.source
    }

    /// Decode the next message, emitting completed records to the sink.
    ///
    /// Errors are connection-fatal: the session transitions to
    /// [`SessionState::Closed`] and further calls return
    /// [`ParserBmpError::ConnectionClosed`].
    pub fn recv_message(&mut self) -> Result<BmpRecord, ParserBmpError> {
        if self.state == SessionState::Closed {
            return Err(ParserBmpError::ConnectionClosed);
        }
        match self.recv_inner() {
            Ok(record) => Ok(record),
            Err(e) => {
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    fn recv_inner(&mut self) -> Result<BmpRecord, ParserBmpError> {
        if self.pending_unframed {
            warn!(
                "{}: previous message body has no length field and was not consumed, stream position unknown",
                self.router.src_addr
            );
            return Err(ParserBmpError::CorruptedBmpMessage);
        }
        if self.pending_body > 0 {
            let n = self.pending_body as usize;
            self.pending_body = 0;
            self.source.drain(n)?;
        }

        self.state = SessionState::ExpectVersion;
        let version = match self.source.read_exact(1) {
            Ok(mut block) => block.get_u8(),
            Err(e @ ParserBmpError::ConnectionClosed) => {
                debug!("{}: connection closed by monitored router", self.router.src_addr);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        debug!("BMP version = {}", version);

        let result = match version {
            3 => self.recv_v3(),
            1 | 2 => self.recv_v1v2(),
            other => Err(ParserBmpError::UnsupportedVersion(other)),
        };
        // past the version byte, even an orderly close loses framing
        result.map_err(ParserBmpError::into_mid_message)
    }

    fn recv_v3(&mut self) -> Result<BmpRecord, ParserBmpError> {
        self.state = SessionState::ExpectCommonHeader;
        let mut header = self.read_block(BMP_HDRV3_LEN)?;
        let common = parse_v3_common_header(&mut header)?;
        let mut body_len = common.body_len;

        let msg_type = match BmpMsgType::try_from(common.msg_type) {
            Ok(t) => t,
            Err(_) => {
                warn!(
                    "{}: unknown BMP message type {}, skipping {} bytes",
                    self.router.src_addr, common.msg_type, body_len
                );
                self.source.drain(body_len as usize)?;
                return Ok(BmpRecord::Unknown {
                    msg_type: common.msg_type,
                });
            }
        };

        match msg_type {
            BmpMsgType::InitiationMessage => self.recv_initiation(body_len),
            BmpMsgType::TerminationMessage => self.recv_termination(body_len),
            BmpMsgType::RouteMonitoring
            | BmpMsgType::StatisticsReport
            | BmpMsgType::PeerDownNotification
            | BmpMsgType::PeerUpNotification => {
                self.state = SessionState::ExpectPeerHeader;
                if (body_len as usize) < BMP_PEER_HDR_LEN {
                    return Err(ParserBmpError::CorruptedBmpMessage);
                }
                let mut block = self.read_block(BMP_PEER_HDR_LEN)?;
                parse_per_peer_header(&mut block, &mut self.peer)?;
                self.sink.assign_peer_hash(&mut self.peer);
                body_len -= BMP_PEER_HDR_LEN as u32;

                self.state = SessionState::ExpectBody;
                match msg_type {
                    BmpMsgType::RouteMonitoring => {
                        self.pending_body = body_len;
                        Ok(BmpRecord::RouteMonitoring {
                            remaining: Some(body_len),
                        })
                    }
                    BmpMsgType::PeerDownNotification => {
                        self.pending_body = body_len;
                        Ok(BmpRecord::PeerDown {
                            remaining: Some(body_len),
                        })
                    }
                    BmpMsgType::StatisticsReport => {
                        let stats = parse_stats_report(&mut self.source, &self.peer)?;
                        self.sink.add_stats_report(&stats);
                        Ok(BmpRecord::StatsReport(stats))
                    }
                    BmpMsgType::PeerUpNotification => {
                        match parse_peer_up_notification(
                            &mut self.source,
                            &self.peer,
                            Some(body_len),
                        )? {
                            Some(event) => {
                                self.pending_body = body_len - BMP_PEER_UP_FIXED_LEN as u32;
                                self.sink.add_peer_up_event(&event);
                                Ok(BmpRecord::PeerUp(event))
                            }
                            None => Ok(BmpRecord::Malformed {
                                msg_type: common.msg_type,
                            }),
                        }
                    }
                    _ => unreachable!(),
                }
            }
        }
    }

    fn recv_v1v2(&mut self) -> Result<BmpRecord, ParserBmpError> {
        self.state = SessionState::ExpectCommonHeader;
        let mut block = self.read_block(BMP_HDRV1V2_LEN)?;
        let msg_type = parse_v1v2_common_header(&mut block, &mut self.peer)?;
        self.sink.assign_peer_hash(&mut self.peer);
        self.state = SessionState::ExpectBody;

        match msg_type {
            0 => {
                self.pending_unframed = true;
                Ok(BmpRecord::RouteMonitoring { remaining: None })
            }
            1 => {
                let stats = parse_stats_report(&mut self.source, &self.peer)?;
                self.sink.add_stats_report(&stats);
                Ok(BmpRecord::StatsReport(stats))
            }
            2 => {
                self.pending_unframed = true;
                Ok(BmpRecord::PeerDown { remaining: None })
            }
            3 => {
                // no length field, so a short body cannot be skipped over
                match parse_peer_up_notification(&mut self.source, &self.peer, None)? {
                    Some(event) => {
                        self.sink.add_peer_up_event(&event);
                        // the OPEN PDUs after the fixed part are the
                        // caller's to consume
                        self.pending_unframed = true;
                        Ok(BmpRecord::PeerUp(event))
                    }
                    None => Ok(BmpRecord::Malformed { msg_type }),
                }
            }
            other => {
                warn!(
                    "{}: unknown BMP v1/v2 message type {}",
                    self.router.src_addr, other
                );
                self.pending_unframed = true;
                Ok(BmpRecord::Unknown { msg_type: other })
            }
        }
    }

    fn recv_initiation(&mut self, body_len: u32) -> Result<BmpRecord, ParserBmpError> {
        self.state = SessionState::ExpectBody;
        if body_len as usize > INIT_TERM_MAX_LEN {
            warn!(
                "{}: initiation message length of {} is too large to process, must be less than 40K",
                self.router.src_addr, body_len
            );
            self.source.drain(body_len as usize)?;
            return Ok(BmpRecord::Malformed {
                msg_type: BmpMsgType::InitiationMessage.into(),
            });
        }

        let mut body = self.read_block(body_len as usize)?;
        for tlv in parse_initiation_message(&mut body)? {
            tlv.apply(&mut self.router);
            self.sink.update_router(&self.router);
        }
        Ok(BmpRecord::Initiation)
    }

    fn recv_termination(&mut self, body_len: u32) -> Result<BmpRecord, ParserBmpError> {
        self.state = SessionState::ExpectBody;
        if body_len as usize > INIT_TERM_MAX_LEN {
            warn!(
                "{}: termination message length of {} is too large to process, must be less than 40K",
                self.router.src_addr, body_len
            );
            self.source.drain(body_len as usize)?;
            return Ok(BmpRecord::Malformed {
                msg_type: BmpMsgType::TerminationMessage.into(),
            });
        }

        // the router record is updated in place; persisting it after
        // termination is the caller's job
        let mut body = self.read_block(body_len as usize)?;
        for tlv in parse_termination_message(&mut body)? {
            tlv.apply(&mut self.router);
        }
        Ok(BmpRecord::Termination)
    }

    fn read_block(&mut self, n: usize) -> Result<Bytes, ParserBmpError> {
        self.source
            .read_exact(n)
            .map_err(ParserBmpError::into_mid_message)
    }
}
