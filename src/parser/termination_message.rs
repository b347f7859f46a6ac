use crate::error::ParserBmpError;
use crate::models::RouterEntry;
use crate::parser::utils::ReadUtils;
use bytes::{Buf, Bytes};
use log::{info, warn};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Information TLV types carried by a Termination message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum TerminationTlvType {
    String = 0,
    Reason = 1,
}

/// Termination reason codes defined by the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum TerminationReason {
    Unspecified = 0,
    AdminClose = 1,
    OutOfResources = 2,
    RedundantConnection = 3,
}

/// Canonical text for a termination reason code.
pub fn termination_reason_text(code: u16) -> String {
    match TerminationReason::try_from(code) {
        Ok(TerminationReason::Unspecified) => "Remote closed with unspecified reason".to_string(),
        Ok(TerminationReason::AdminClose) => {
            "Remote session administratively closed".to_string()
        }
        Ok(TerminationReason::OutOfResources) => "Remote out of resources".to_string(),
        Ok(TerminationReason::RedundantConnection) => {
            "Remote considers connection redundant".to_string()
        }
        Err(_) => format!(
            "Unknown {} termination reason, which is not part of draft.",
            code
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationTlv {
    pub info_type: u16,
    pub info_len: u16,
    pub value: Bytes,
}

impl TerminationTlv {
    /// Store this TLV's content into the router record. Final persistence
    /// after Termination is the caller's responsibility.
    pub fn apply(&self, router: &mut RouterEntry) {
        match TerminationTlvType::try_from(self.info_type) {
            Ok(TerminationTlvType::String) => router.set_term_data(&self.value),
            Ok(TerminationTlvType::Reason) => {
                if self.value.len() < 2 {
                    warn!(
                        "termination reason TLV of length {} is too short",
                        self.value.len()
                    );
                    return;
                }
                let code = u16::from_be_bytes([self.value[0], self.value[1]]);
                router.set_term_reason(code, termination_reason_text(code));
                info!(
                    "{}: BMP session closed by remote: {}",
                    router.src_addr, router.term_reason_text
                );
            }
            Err(_) => warn!(
                "termination message type {} is unexpected per draft",
                self.info_type
            ),
        }
    }
}

/// Walk a buffered Termination body as a (type, length, value) sequence,
/// with the same overrun handling as the Initiation walk.
pub fn parse_termination_message(data: &mut Bytes) -> Result<Vec<TerminationTlv>, ParserBmpError> {
    let mut tlvs = vec![];

    while data.remaining() >= 4 {
        let info_type = data.read_u16()?;
        let info_len = data.read_u16()?;
        if data.remaining() < info_len as usize {
            warn!(
                "termination TLV type {} length {} overruns the message, stopping",
                info_type, info_len
            );
            break;
        }
        let value = data.split_to(info_len as usize);

        info!(
            "termination message type {} and length {} parsed",
            info_type, info_len
        );

        tlvs.push(TerminationTlv {
            info_type,
            info_len,
            value,
        });
    }

    Ok(tlvs)
}
