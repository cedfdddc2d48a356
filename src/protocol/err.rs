//! Err packet (spec §6): header `0xFF`, error code, `#`-prefixed SQLSTATE (when
//! `protocol-41` is negotiated), then a plain message string.

use crate::codec::BufExt;
use crate::error::{Error, MySqlDatabaseError};
use crate::protocol::header_byte;

impl MySqlDatabaseError {
    pub fn decode(mut buf: &[u8], protocol_41: bool) -> Result<Self, Error> {
        let header = buf.get_u8_checked("Err packet header")?;
        if header != header_byte::ERR {
            return Err(Error::ProtocolValueError(format!(
                "expected Err packet header 0xFF, got {header:#04x}"
            )));
        }

        let code = buf.get_u16_le_checked("Err error code")?;

        let sql_state = if protocol_41 {
            let marker = buf.get_u8_checked("Err sqlstate marker")?;
            if marker != b'#' {
                return Err(Error::ProtocolValueError(format!(
                    "expected '#' SQLSTATE marker, got {marker:#04x}"
                )));
            }
            let bytes = buf.checked_take(5, "Err sqlstate")?;
            std::str::from_utf8(bytes)
                .map_err(|e| Error::ProtocolValueError(format!("sqlstate not utf-8: {e}")))?
                .to_string()
        } else {
            String::from("HY000")
        };

        let message = buf.get_str_eop("Err message")?;

        Ok(MySqlDatabaseError {
            code,
            sql_state: sql_state.into_boxed_str(),
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_unknown_database_error() {
        let buf: &[u8] = b"\xff\x19\x04#42000Unknown database 'unknown'";
        let err = MySqlDatabaseError::decode(buf, true).unwrap();
        assert_eq!(err.code, 1049);
        assert_eq!(&*err.sql_state, "42000");
        assert_eq!(&*err.message, "Unknown database 'unknown'");
    }
}
