//! Length-encoded integer codec (spec §4.1, §6, testable property 5).
//!
//! ```text
//! b < 0xFB        -> value = b
//! b == 0xFB       -> NULL (only in contexts that permit it, e.g. row fields)
//! b == 0xFC       -> next 2 bytes LE
//! b == 0xFD       -> next 3 bytes LE
//! b == 0xFE       -> next 8 bytes LE
//! ```

use super::BufExt;
use crate::error::Error;

/// Sentinel prefix byte meaning NULL in the contexts that allow it (row fields).
pub const NULL_LENENC: u8 = 0xFB;

/// Decode a length-encoded integer, treating the `0xFB` prefix as `None` (NULL).
///
/// Used where the surrounding grammar allows a NULL marker (row field prefixes); statement
/// metadata and packet-internal counts should use [`get_int_lenenc`] instead, since `0xFB` is
/// reserved for NULL only "in certain contexts" per spec §4.1.
pub fn get_uint_lenenc(buf: &mut &[u8]) -> Result<Option<u64>, Error> {
    let prefix = buf.get_u8_checked("length-encoded integer prefix")?;
    match prefix {
        0xFB => Ok(None),
        0xFC => Ok(Some(u64::from(buf.get_u16_le_checked("lenenc u16")?))),
        0xFD => Ok(Some(u64::from(buf.get_u24_le_checked("lenenc u24")?))),
        0xFE => Ok(Some(buf.get_u64_le_checked("lenenc u64")?)),
        v => Ok(Some(u64::from(v))),
    }
}

/// Decode a length-encoded integer in a context where NULL is not meaningful (e.g. column
/// counts, string/byte-string length prefixes).
pub fn get_int_lenenc(buf: &mut &[u8]) -> Result<u64, Error> {
    get_uint_lenenc(buf)?
        .ok_or_else(|| Error::ProtocolValueError("unexpected NULL length-encoded integer".into()))
}

/// Encode `v` as a length-encoded integer, choosing the shortest representation.
pub fn put_uint_lenenc(out: &mut Vec<u8>, v: u64) {
    use super::BufMutExt;
    if v < 0xFB {
        out.put_u8(v as u8);
    } else if v <= 0xFFFF {
        out.put_u8(0xFC);
        out.put_u16_le(v as u16);
    } else if v <= 0xFF_FFFF {
        out.put_u8(0xFD);
        out.put_u24_le(v as u32);
    } else {
        out.put_u8(0xFE);
        out.put_u64_le(v);
    }
}

/// Encode `v`, or the NULL marker `0xFB` if `v` is `None`.
pub fn put_int_lenenc(out: &mut Vec<u8>, v: Option<u64>) {
    match v {
        Some(v) => put_uint_lenenc(out, v),
        None => out.push(NULL_LENENC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_boundary_values() {
        for v in [
            0u64,
            0xFA,
            0xFB,
            0xFC,
            0xFFFF,
            0x1_0000,
            0xFF_FFFF,
            0x100_0000,
            u64::MAX,
        ] {
            let mut buf = Vec::new();
            put_uint_lenenc(&mut buf, v);
            let mut slice = buf.as_slice();
            assert_eq!(get_uint_lenenc(&mut slice).unwrap(), Some(v));
            assert!(slice.is_empty());
        }
    }

    #[test]
    fn null_round_trips() {
        let mut buf = Vec::new();
        put_int_lenenc(&mut buf, None);
        assert_eq!(buf, vec![0xFB]);
        let mut slice = buf.as_slice();
        assert_eq!(get_uint_lenenc(&mut slice).unwrap(), None);
    }

    #[test]
    fn short_input_is_incomplete() {
        let mut slice: &[u8] = &[0xFE, 1, 2, 3];
        assert!(matches!(
            get_uint_lenenc(&mut slice),
            Err(Error::IncompleteMessage(_))
        ));
    }
}
