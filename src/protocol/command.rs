//! Simple session commands with no payload beyond their header byte (spec §4.7, §4.9).

use crate::codec::BufMutExt;

pub const COM_QUIT: u8 = 0x01;
pub const COM_INIT_DB: u8 = 0x02;
pub const COM_PING: u8 = 0x0E;
pub const COM_RESET_CONNECTION: u8 = 0x1F;
pub const COM_SET_OPTION: u8 = 0x1B;

/// `CLIENT_MULTI_STATEMENTS` toggle values for `COM_SET_OPTION` (spec §4.9).
pub const SET_OPTION_MULTI_STATEMENTS_ON: u16 = 0;
pub const SET_OPTION_MULTI_STATEMENTS_OFF: u16 = 1;

pub struct ComQuit;

impl ComQuit {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_QUIT);
    }
}

pub struct ComPing;

impl ComPing {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_PING);
    }
}

/// `COM_RESET_CONNECTION`: resets session state (variables, temp tables, transactions,
/// prepared statements) while keeping the TCP/TLS connection and authenticated user
/// (spec §4.9 `reset-connection`).
pub struct ComResetConnection;

impl ComResetConnection {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_RESET_CONNECTION);
    }
}

pub struct ComInitDb<'a>(pub &'a str);

impl ComInitDb<'_> {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_INIT_DB);
        out.extend_from_slice(self.0.as_bytes());
    }
}

pub struct ComSetOption {
    pub value: u16,
}

impl ComSetOption {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_SET_OPTION);
        out.put_u16_le(self.value);
    }
}
