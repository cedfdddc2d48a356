//! Length-encoded string/byte-string codec (spec §4.1).

use super::int::{get_int_lenenc, put_uint_lenenc};
use super::BufExt;
use crate::error::Error;

pub fn get_bytes_lenenc<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], Error> {
    let len = get_int_lenenc(buf)? as usize;
    buf.checked_take(len, "length-encoded byte string")
}

pub fn get_str_lenenc<'a>(buf: &mut &'a [u8]) -> Result<&'a str, Error> {
    let bytes = get_bytes_lenenc(buf)?;
    std::str::from_utf8(bytes)
        .map_err(|e| Error::ProtocolValueError(format!("not valid utf-8: {e}")))
}

pub fn put_bytes_lenenc(out: &mut Vec<u8>, bytes: &[u8]) {
    put_uint_lenenc(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

pub fn put_str_lenenc(out: &mut Vec<u8>, s: &str) {
    put_bytes_lenenc(out, s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_string() {
        let mut buf = Vec::new();
        put_str_lenenc(&mut buf, "hello, world");
        let mut slice = buf.as_slice();
        assert_eq!(get_str_lenenc(&mut slice).unwrap(), "hello, world");
        assert!(slice.is_empty());
    }

    #[test]
    fn round_trips_empty_string() {
        let mut buf = Vec::new();
        put_str_lenenc(&mut buf, "");
        let mut slice = buf.as_slice();
        assert_eq!(get_str_lenenc(&mut slice).unwrap(), "");
    }
}
