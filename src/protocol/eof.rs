//! EOF packet, sent when `deprecate-EOF` is *not* negotiated. Header `0xFE`, payload
//! strictly shorter than 9 bytes (spec §4.6 driver loop).

use crate::codec::BufExt;
use crate::error::Error;
use crate::protocol::{header_byte, ServerStatus};

#[derive(Debug, Clone, Copy)]
pub struct EofPacket {
    pub warnings: u16,
    pub status: ServerStatus,
}

impl EofPacket {
    /// A packet is treated as a legacy EOF terminator only when its header is `0xFE` *and*
    /// its total length is under 9 bytes — a longer payload starting with `0xFE` is a row
    /// whose first length-encoded field happens to use the 8-byte integer prefix.
    pub fn looks_like_eof(packet: &[u8]) -> bool {
        packet.first() == Some(&header_byte::EOF) && packet.len() < 9
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8_checked("EOF packet header")?;
        if header != header_byte::EOF {
            return Err(Error::ProtocolValueError(format!(
                "expected EOF packet header 0xFE, got {header:#04x}"
            )));
        }
        let warnings = buf.get_u16_le_checked("EOF warnings")?;
        let status = ServerStatus::from_bits_truncate(buf.get_u16_le_checked("EOF status")?);
        Ok(EofPacket { warnings, status })
    }

    pub fn more_results_exist(&self) -> bool {
        self.status.contains(ServerStatus::MORE_RESULTS_EXIST)
    }
}
