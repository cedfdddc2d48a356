//! OK packet (spec §6): header `0x00`, or `0xFE` under `deprecate-EOF` when terminating a
//! resultset (spec GLOSSARY "Deprecate-EOF").

use crate::codec::{get_uint_lenenc, BufExt};
use crate::error::Error;
use crate::protocol::{header_byte, ServerStatus};

#[derive(Debug, Clone)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status: ServerStatus,
    pub warnings: u16,
    pub info: Box<str>,
    pub is_out_params: bool,
}

impl OkPacket {
    pub fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8_checked("OK packet header")?;
        if header != header_byte::OK && header != header_byte::EOF {
            return Err(Error::ProtocolValueError(format!(
                "expected OK packet header 0x00 or 0xFE, got {header:#04x}"
            )));
        }

        let affected_rows = get_uint_lenenc(&mut buf)?.unwrap_or(0);
        let last_insert_id = get_uint_lenenc(&mut buf)?.unwrap_or(0);
        let status = ServerStatus::from_bits_truncate(buf.get_u16_le_checked("OK status")?);
        let warnings = buf.get_u16_le_checked("OK warnings")?;
        // The trailing info string is sent as plain bytes to the end of the packet, not
        // length-encoded, matching the reference client's wire behavior.
        let info = buf.get_str_eop("OK info string")?;

        let is_out_params = status.contains(ServerStatus::PS_OUT_PARAMS);

        Ok(OkPacket {
            affected_rows,
            last_insert_id,
            status,
            warnings,
            info: info.into(),
            is_out_params,
        })
    }

    pub fn more_results_exist(&self) -> bool {
        self.status.contains(ServerStatus::MORE_RESULTS_EXIST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_ok() {
        let buf: &[u8] = b"\x00\x00\x00\x02\x00\x00\x00";
        let ok = OkPacket::decode(buf).unwrap();
        assert_eq!(ok.affected_rows, 0);
        assert_eq!(ok.last_insert_id, 0);
        assert!(ok.status.contains(ServerStatus::AUTOCOMMIT));
        assert!(ok.info.is_empty());
        assert!(!ok.is_out_params);
    }

    #[test]
    fn rejects_bad_header() {
        let buf: &[u8] = b"\x01\x00\x00\x00\x00\x00\x00";
        assert!(OkPacket::decode(buf).is_err());
    }
}
