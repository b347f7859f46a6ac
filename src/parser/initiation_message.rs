use crate::error::ParserBmpError;
use crate::models::RouterEntry;
use crate::parser::utils::ReadUtils;
use bytes::{Buf, Bytes};
use log::{info, warn};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Initiation and Termination bodies above this size are refused (and
/// drained) instead of buffered.
pub const INIT_TERM_MAX_LEN: usize = 40_000;

/// Information TLV types carried by an Initiation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum InitiationTlvType {
    String = 0,
    SysDescr = 1,
    SysName = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiationTlv {
    pub info_type: u16,
    pub info_len: u16,
    pub value: Bytes,
}

impl InitiationTlv {
    /// Store this TLV's value into the router record. Values longer than
    /// the destination field are truncated to its capacity; unrecognized
    /// types are logged and dropped.
    pub fn apply(&self, router: &mut RouterEntry) {
        match InitiationTlvType::try_from(self.info_type) {
            Ok(InitiationTlvType::String) => router.set_initiate_data(&self.value),
            Ok(InitiationTlvType::SysDescr) => router.set_descr(&self.value),
            Ok(InitiationTlvType::SysName) => router.set_name(&self.value),
            Err(_) => warn!(
                "initiation message type {} is unexpected per draft-07",
                self.info_type
            ),
        }
    }
}

/// Walk a buffered Initiation body as a (type, length, value) sequence.
///
/// A TLV whose declared length overruns the body ends the walk; everything
/// decoded before it is kept.
pub fn parse_initiation_message(data: &mut Bytes) -> Result<Vec<InitiationTlv>, ParserBmpError> {
    let mut tlvs = vec![];

    while data.remaining() >= 4 {
        let info_type = data.read_u16()?;
        let info_len = data.read_u16()?;
        if data.remaining() < info_len as usize {
            warn!(
                "initiation TLV type {} length {} overruns the message, stopping",
                info_type, info_len
            );
            break;
        }
        let value = data.split_to(info_len as usize);

        info!(
            "initiation message type {} and length {} parsed",
            info_type, info_len
        );

        tlvs.push(InitiationTlv {
            info_type,
            info_len,
            value,
        });
    }

    Ok(tlvs)
}
