/*!
Helpers for reading network-order fields out of message buffers and
formatting the address-shaped ones.
*/
use crate::error::ParserBmpError;
use bytes::{Buf, Bytes};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Checked reads over an in-memory message body. All integers arrive in
/// network order and are converted on read.
pub trait ReadUtils {
    fn read_u8(&mut self) -> Result<u8, ParserBmpError>;
    fn read_u16(&mut self) -> Result<u16, ParserBmpError>;
    fn read_u32(&mut self) -> Result<u32, ParserBmpError>;
    fn read_u64(&mut self) -> Result<u64, ParserBmpError>;
    fn read_n_bytes(&mut self, n: usize) -> Result<Bytes, ParserBmpError>;

    fn read_n_bytes_to_string(&mut self, n: usize) -> Result<String, ParserBmpError> {
        let buffer = self.read_n_bytes(n)?;
        Ok(buffer.iter().map(|b| *b as char).collect())
    }

    fn read_ipv4_address(&mut self) -> Result<Ipv4Addr, ParserBmpError> {
        Ok(Ipv4Addr::from(self.read_u32()?))
    }

    fn read_ipv6_address(&mut self) -> Result<Ipv6Addr, ParserBmpError> {
        let mut buffer = [0u8; 16];
        self.read_n_bytes(16)?.copy_to_slice(&mut buffer);
        Ok(Ipv6Addr::from(buffer))
    }
}

impl ReadUtils for Bytes {
    fn read_u8(&mut self) -> Result<u8, ParserBmpError> {
        if self.remaining() < 1 {
            return Err(ParserBmpError::CorruptedBmpMessage);
        }
        Ok(self.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16, ParserBmpError> {
        if self.remaining() < 2 {
            return Err(ParserBmpError::CorruptedBmpMessage);
        }
        Ok(self.get_u16())
    }

    fn read_u32(&mut self) -> Result<u32, ParserBmpError> {
        if self.remaining() < 4 {
            return Err(ParserBmpError::CorruptedBmpMessage);
        }
        Ok(self.get_u32())
    }

    fn read_u64(&mut self) -> Result<u64, ParserBmpError> {
        if self.remaining() < 8 {
            return Err(ParserBmpError::CorruptedBmpMessage);
        }
        Ok(self.get_u64())
    }

    fn read_n_bytes(&mut self, n: usize) -> Result<Bytes, ParserBmpError> {
        if self.remaining() < n {
            return Err(ParserBmpError::CorruptedBmpMessage);
        }
        Ok(self.split_to(n))
    }
}

/// IPv4 address carried in the trailing 4 bytes of a 16-byte peer address
/// field (the layout used when the V flag is 0).
pub fn v4_mapped_suffix(addr: &[u8; 16]) -> Ipv4Addr {
    Ipv4Addr::new(addr[12], addr[13], addr[14], addr[15])
}

/// Format an 8-byte route distinguisher by the type field at its start.
///
/// Type 1 carries an IPv4 administrator and a 2-byte assigned number,
/// type 2 a 4-byte ASN administrator and a 2-byte assigned number. Any
/// other type is rendered as a 2-byte administrator at offset 2 followed
/// by a 4-byte assigned number.
pub fn format_route_distinguisher(rd: &[u8; 8]) -> String {
    let rd_type = u16::from_be_bytes([rd[0], rd[1]]);
    match rd_type {
        1 => format!(
            "{}.{}.{}.{}:{}",
            rd[2],
            rd[3],
            rd[4],
            rd[5],
            u16::from_be_bytes([rd[6], rd[7]])
        ),
        2 => format!(
            "{}:{}",
            u32::from_be_bytes([rd[2], rd[3], rd[4], rd[5]]),
            u16::from_be_bytes([rd[6], rd[7]])
        ),
        _ => format!(
            "{}:{}",
            u16::from_be_bytes([rd[2], rd[3]]),
            u32::from_be_bytes([rd[4], rd[5], rd[6], rd[7]])
        ),
    }
}
