//! Codec primitives (spec §4.1, L1): fixed-width integers, length-encoded integers and
//! strings, and the calendar/time wire layouts from spec §6.
//!
//! Every decoder here either returns the decoded value and the number of bytes consumed, or
//! fails with [`Error::IncompleteMessage`] on short input — it never reads past the slice it
//! was given.

mod int;
mod str;
mod temporal;

pub use int::{get_int_lenenc, get_uint_lenenc, put_int_lenenc, put_uint_lenenc, NULL_LENENC};
pub use str::{get_bytes_lenenc, get_str_lenenc, put_bytes_lenenc, put_str_lenenc};
pub use temporal::{MyDate, MyDateTime, MyTime};

use crate::error::Error;

/// Read-cursor helpers over an immutable byte slice, used throughout `protocol::*` decoders.
pub trait BufExt<'a> {
    fn checked_take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], Error>;
    fn get_u8_checked(&mut self, what: &'static str) -> Result<u8, Error>;
    fn get_u16_le_checked(&mut self, what: &'static str) -> Result<u16, Error>;
    fn get_u24_le_checked(&mut self, what: &'static str) -> Result<u32, Error>;
    fn get_u32_le_checked(&mut self, what: &'static str) -> Result<u32, Error>;
    fn get_u64_le_checked(&mut self, what: &'static str) -> Result<u64, Error>;
    fn get_str_nul(&mut self, what: &'static str) -> Result<&'a str, Error>;
    fn get_bytes_nul(&mut self, what: &'static str) -> Result<&'a [u8], Error>;
    fn get_str_eop(&mut self, what: &'static str) -> Result<&'a str, Error>;
}

impl<'a> BufExt<'a> for &'a [u8] {
    fn checked_take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], Error> {
        if self.len() < n {
            return Err(Error::IncompleteMessage(format!(
                "needed {n} byte(s) for {what}, only {} remaining",
                self.len()
            )));
        }
        let (head, tail) = self.split_at(n);
        *self = tail;
        Ok(head)
    }

    fn get_u8_checked(&mut self, what: &'static str) -> Result<u8, Error> {
        Ok(self.checked_take(1, what)?[0])
    }

    fn get_u16_le_checked(&mut self, what: &'static str) -> Result<u16, Error> {
        let b = self.checked_take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn get_u24_le_checked(&mut self, what: &'static str) -> Result<u32, Error> {
        let b = self.checked_take(3, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    fn get_u32_le_checked(&mut self, what: &'static str) -> Result<u32, Error> {
        let b = self.checked_take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn get_u64_le_checked(&mut self, what: &'static str) -> Result<u64, Error> {
        let b = self.checked_take(8, what)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    fn get_str_nul(&mut self, what: &'static str) -> Result<&'a str, Error> {
        let bytes = self.get_bytes_nul(what)?;
        std::str::from_utf8(bytes)
            .map_err(|e| Error::ProtocolValueError(format!("{what} is not valid utf-8: {e}")))
    }

    fn get_bytes_nul(&mut self, what: &'static str) -> Result<&'a [u8], Error> {
        let pos = memchr::memchr(0, self).ok_or_else(|| {
            Error::IncompleteMessage(format!("missing NUL terminator for {what}"))
        })?;
        let (head, tail) = self.split_at(pos);
        *self = &tail[1..];
        Ok(head)
    }

    fn get_str_eop(&mut self, what: &'static str) -> Result<&'a str, Error> {
        let rest = *self;
        *self = &[];
        std::str::from_utf8(rest)
            .map_err(|e| Error::ProtocolValueError(format!("{what} is not valid utf-8: {e}")))
    }
}

/// Mutable-buffer helpers used by `protocol::*` encoders.
pub trait BufMutExt {
    fn put_u8(&mut self, v: u8);
    fn put_u16_le(&mut self, v: u16);
    fn put_u24_le(&mut self, v: u32);
    fn put_u32_le(&mut self, v: u32);
    fn put_u64_le(&mut self, v: u64);
    fn put_str_nul(&mut self, s: &str);
    fn put_bytes_raw(&mut self, b: &[u8]);
}

impl BufMutExt for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }

    fn put_u16_le(&mut self, v: u16) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u24_le(&mut self, v: u32) {
        let b = v.to_le_bytes();
        self.extend_from_slice(&b[..3]);
    }

    fn put_u32_le(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u64_le(&mut self, v: u64) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    fn put_str_nul(&mut self, s: &str) {
        self.extend_from_slice(s.as_bytes());
        self.push(0);
    }

    fn put_bytes_raw(&mut self, b: &[u8]) {
        self.extend_from_slice(b);
    }
}
